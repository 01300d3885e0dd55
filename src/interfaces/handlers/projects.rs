use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::{http::header, web, Either, HttpRequest, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    constants::FEATURED_PROJECTS_LIMIT,
    entities::{
        image::UploadResult,
        project::{
            FeaturedFlag, ProjectFields, ProjectListResponse, ProjectMutationResponse, ProjectQuery,
            Technologies,
        },
    },
    errors::AppError,
    use_cases::extractors::AdminClaims,
    utils::image_upload::store_image,
    AppState,
};

/// Multipart body for project writes. Field names follow the JSON body.
#[derive(Debug, MultipartForm)]
pub struct ProjectUpload {
    pub image: Option<TempFile>,
    pub title: Option<Text<String>>,
    pub description: Option<Text<String>>,
    pub technologies: Option<Text<String>>,
    #[multipart(rename = "githubUrl")]
    pub github_url: Option<Text<String>>,
    #[multipart(rename = "liveUrl")]
    pub live_url: Option<Text<String>>,
    pub featured: Option<Text<String>>,
}

impl ProjectUpload {
    /// Splits the form into the project fields and the image part, if one was
    /// actually chosen. Browsers send an empty part for an untouched file input.
    fn into_parts(self) -> (ProjectFields, Option<TempFile>) {
        fn text(value: Option<Text<String>>) -> Option<String> {
            value.map(Text::into_inner)
        }

        let image = self
            .image
            .filter(|file| file.size > 0 || file.file_name.as_deref().is_some_and(|n| !n.is_empty()));

        let fields = ProjectFields {
            title: text(self.title),
            description: text(self.description),
            technologies: text(self.technologies).map(Technologies::Csv),
            github_url: text(self.github_url),
            live_url: text(self.live_url),
            featured: text(self.featured).map(FeaturedFlag::Text),
        };

        (fields, image)
    }
}

/// JSON is tried first: `Either` reports only the first extractor's error.
type ProjectInput = Result<Either<web::Json<ProjectFields>, MultipartForm<ProjectUpload>>, actix_web::Error>;

/// `application/json` and the `+json` suffix types accepted by `web::Json`.
fn is_json_body(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|essence| essence.trim().to_ascii_lowercase())
        .is_some_and(|essence| essence == "application/json" || essence.ends_with("+json"))
}

/// Resolves the request body and, for multipart requests carrying an image,
/// stores the image before anything else looks at the fields.
async fn intercept_upload(
    req: &HttpRequest,
    state: &AppState,
    data_input: ProjectInput,
) -> Result<(ProjectFields, Option<UploadResult>), AppError> {
    let either = data_input.map_err(|e| {
        tracing::debug!(error = %e, "Unreadable project body");

        if is_json_body(req) {
            AppError::BadRequest(format!("Invalid JSON: {e}"))
        } else {
            AppError::BadRequest(
                "Request must be either application/json or multipart/form-data".to_string(),
            )
        }
    })?;

    match either {
        Either::Left(json) => Ok((json.into_inner(), None)),
        Either::Right(form) => {
            let (fields, image) = form.into_inner().into_parts();

            let upload = match image {
                Some(file) => Some(
                    store_image(
                        &state.project_handler.asset_store,
                        &file,
                        state.upload_max_bytes,
                    )
                    .await?,
                ),
                None => None,
            };

            Ok((fields, upload))
        }
    }
}

#[instrument(skip(state, query))]
pub async fn list_projects(
    state: web::Data<AppState>,
    query: web::Query<ProjectQuery>,
) -> Result<impl Responder, AppError> {
    let search = query
        .into_inner()
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty());

    let projects = state.project_handler.list_projects(search).await?;

    Ok(HttpResponse::Ok().json(ProjectListResponse::from(projects)))
}

#[instrument(skip(state))]
pub async fn list_featured_projects(
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let projects = state
        .project_handler
        .list_featured_projects(FEATURED_PROJECTS_LIMIT)
        .await?;

    Ok(HttpResponse::Ok().json(ProjectListResponse::from(projects)))
}

#[instrument(skip(state))]
pub async fn get_project_by_id(
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let project = state.project_handler.get_project_by_id(&project_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": project
    })))
}

#[instrument(skip(req, _claims, state, data_input))]
pub async fn create_project(
    req: HttpRequest,
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data_input: ProjectInput,
) -> Result<impl Responder, AppError> {
    let (fields, upload) = intercept_upload(&req, &state, data_input).await?;

    let project = state.project_handler.create_project(fields, upload).await?;

    Ok(HttpResponse::Created().json(ProjectMutationResponse::with_project(
        "Project created successfully",
        project,
    )))
}

#[instrument(skip(req, _claims, state, data_input))]
pub async fn update_project(
    req: HttpRequest,
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
    data_input: ProjectInput,
) -> Result<impl Responder, AppError> {
    let (fields, upload) = intercept_upload(&req, &state, data_input).await?;

    let project = state
        .project_handler
        .update_project(&project_id, fields, upload)
        .await?;

    Ok(HttpResponse::Ok().json(ProjectMutationResponse::with_project(
        "Project updated successfully",
        project,
    )))
}

#[instrument(skip(_claims, state))]
pub async fn delete_project(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.project_handler.delete_project(&project_id).await?;

    Ok(HttpResponse::Ok().json(ProjectMutationResponse::message(
        "Project deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn json_bodies_are_recognised_by_content_type() {
        let req = TestRequest::default()
            .insert_header((header::CONTENT_TYPE, "Application/JSON; charset=utf-8"))
            .to_http_request();
        assert!(is_json_body(&req));

        let req = TestRequest::default()
            .insert_header((header::CONTENT_TYPE, "application/merge-patch+json"))
            .to_http_request();
        assert!(is_json_body(&req));

        let req = TestRequest::default()
            .insert_header((header::CONTENT_TYPE, "multipart/form-data; boundary=x"))
            .to_http_request();
        assert!(!is_json_body(&req));

        assert!(!is_json_body(&TestRequest::default().to_http_request()));
    }
}
