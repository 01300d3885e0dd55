use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::image::{ImageDescriptor, UploadedFileResponse},
    errors::AppError,
    repositories::asset_store::AssetStore,
    use_cases::extractors::AdminClaims,
    utils::image_upload::store_image,
    AppState,
};

#[derive(Debug, MultipartForm)]
pub struct UploadForm {
    pub file: TempFile,
}

/// Stores a single image without attaching it to a project.
#[instrument(skip(_claims, state, form))]
pub async fn upload_file(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    form: MultipartForm<UploadForm>,
) -> Result<impl Responder, AppError> {
    let form = form.into_inner();

    let upload = store_image(
        &state.project_handler.asset_store,
        &form.file,
        state.upload_max_bytes,
    )
    .await?;

    tracing::info!(identifier = %upload.identifier, "Standalone image uploaded");

    Ok(HttpResponse::Ok().json(UploadedFileResponse {
        success: true,
        message: "File uploaded successfully".to_string(),
        file: ImageDescriptor::from(&upload),
    }))
}

/// `public_id` may contain the folder, e.g. `portfolio/abc`.
#[instrument(skip(_claims, state))]
pub async fn delete_file(
    _claims: AdminClaims,
    public_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let public_id = public_id.into_inner();
    if public_id.trim().is_empty() {
        return Err(AppError::BadRequest("Public ID is required".to_string()));
    }

    state
        .project_handler
        .asset_store
        .delete(&public_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound("File not found".to_string()),
            _ => e,
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "File deleted successfully"
    })))
}
