use std::path::Path;

use actix_multipart::form::tempfile::TempFile;
use derive_more::Display;
use tokio::fs;

use crate::{
    constants::ALLOWED_IMAGE_TYPES,
    entities::image::UploadResult,
    errors::AppError,
    repositories::asset_store::AssetStore,
};

/// Errors raised while inspecting an uploaded image, before it reaches the asset store.
#[derive(Debug, Display)]
pub enum ImageFileError {
    #[display("File too large. Maximum size is {}MB.", _0 / (1024 * 1024))]
    TooLarge(usize),

    #[display("Uploaded file is empty")]
    Empty,

    #[display("Only JPEG, PNG, and WebP images are allowed!")]
    UnsupportedType,

    #[display("Could not read uploaded file: {_0}")]
    Io(std::io::Error),
}

impl From<ImageFileError> for AppError {
    fn from(err: ImageFileError) -> Self {
        match err {
            ImageFileError::TooLarge(_) => AppError::PayloadTooLarge(err.to_string()),
            ImageFileError::Io(_) => AppError::InternalError(err.to_string()),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}

/// Sniffs the real content type; the client-declared one is ignored.
pub fn detect_image_type(bytes: &[u8], max_bytes: usize) -> Result<&'static str, ImageFileError> {
    if bytes.is_empty() {
        return Err(ImageFileError::Empty);
    }
    if bytes.len() > max_bytes {
        return Err(ImageFileError::TooLarge(max_bytes));
    }

    let mime = infer::get(bytes)
        .map(|kind| kind.mime_type())
        .ok_or(ImageFileError::UnsupportedType)?;

    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|allowed| **allowed == mime)
        .copied()
        .ok_or(ImageFileError::UnsupportedType)
}

async fn read_image_file(path: &Path, declared_size: usize, max_bytes: usize) -> Result<(Vec<u8>, &'static str), ImageFileError> {
    if declared_size > max_bytes {
        return Err(ImageFileError::TooLarge(max_bytes));
    }

    let bytes = fs::read(path).await.map_err(ImageFileError::Io)?;
    let mime = detect_image_type(&bytes, max_bytes)?;
    Ok((bytes, mime))
}

/// Checks a multipart image and hands it to the asset store. Runs before any
/// project validation, so callers own the compensation if the project is rejected.
pub async fn store_image<A>(
    asset_store: &A,
    file: &TempFile,
    max_bytes: usize,
) -> Result<UploadResult, AppError>
where
    A: AssetStore + ?Sized,
{
    let (bytes, mime) = read_image_file(file.file.path(), file.size, max_bytes).await?;

    tracing::debug!(
        file_name = ?file.file_name,
        size = bytes.len(),
        mime,
        "Uploading image"
    );

    asset_store.upload(bytes, mime).await
}
