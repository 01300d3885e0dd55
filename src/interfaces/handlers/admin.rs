use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    constants::DASHBOARD_RECENT_LIMIT,
    entities::admin::{DashboardData, DashboardResponse, DashboardStats, LoginRequest},
    errors::AppError,
    use_cases::extractors::AdminClaims,
    AppState,
};

#[instrument(skip(state, data))]
pub async fn login(
    state: web::Data<AppState>,
    data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let response = state.auth_handler.login(data.into_inner()).await?;

    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(claims, state))]
pub async fn verify(
    claims: AdminClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    tracing::debug!(admin = claims.username(), "Token verified");

    Ok(HttpResponse::Ok().json(state.auth_handler.verify(&claims.0)))
}

#[instrument(skip(_claims, state))]
pub async fn dashboard(
    _claims: AdminClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let (projects, contacts, recent_projects, recent_contacts) = futures::try_join!(
        state.project_handler.count_projects(),
        state.contact_handler.count_contact_messages(),
        state.project_handler.list_recent_projects(DASHBOARD_RECENT_LIMIT),
        state.contact_handler.list_recent_contact_messages(DASHBOARD_RECENT_LIMIT),
    )?;

    Ok(HttpResponse::Ok().json(DashboardResponse {
        success: true,
        data: DashboardData {
            stats: DashboardStats { projects, contacts },
            recent_projects,
            recent_contacts,
        },
    }))
}
