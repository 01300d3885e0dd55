use actix_web::{web, HttpRequest, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::contact_me::{
        ContactCreatedResponse, ContactListQuery, ContactListResponse, ContactMeForm,
        ContactStatusResponse, ContactStatusUpdate, ContactSummary,
    },
    errors::AppError,
    limiter::rate_limiter::RateDecision,
    use_cases::extractors::AdminClaims,
    utils::get_client_ip::client_key,
    AppState,
};

#[instrument(skip(req, state, form))]
pub async fn create_contact_message(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<ContactMeForm>,
) -> Result<impl Responder, AppError> {
    let client = client_key(&req, state.trust_x_forwarded_for);

    if let RateDecision::Limited { retry_after } = state.contact_limiter.check(&client) {
        tracing::warn!(client = %client, "Contact form rate limit exceeded");
        return Err(AppError::TooManyRequests {
            retry_after_secs: retry_after.as_secs(),
        });
    }

    let contact = state
        .contact_handler
        .create_contact_message(form.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(ContactCreatedResponse {
        success: true,
        message: "Message sent successfully! We will get back to you soon.".to_string(),
        contact: ContactSummary::from(&contact),
    }))
}

#[instrument(skip(_claims, state))]
pub async fn list_contact_messages(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    query: web::Query<ContactListQuery>,
) -> Result<impl Responder, AppError> {
    let page = state.contact_handler.list_contact_messages(&query).await?;

    Ok(HttpResponse::Ok().json(ContactListResponse {
        success: true,
        data: page,
    }))
}

#[instrument(skip(_claims, state, data))]
pub async fn update_contact_status(
    _claims: AdminClaims,
    contact_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<ContactStatusUpdate>,
) -> Result<impl Responder, AppError> {
    let contact = state
        .contact_handler
        .update_contact_status(&contact_id, data.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ContactStatusResponse {
        success: true,
        message: "Status updated successfully".to_string(),
        contact,
    }))
}

#[instrument(skip(_claims, state))]
pub async fn delete_contact_message(
    _claims: AdminClaims,
    contact_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state
        .contact_handler
        .delete_contact_message(&contact_id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Contact message deleted successfully"
    })))
}
