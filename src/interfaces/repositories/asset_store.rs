use std::sync::Arc;

use async_trait::async_trait;

use crate::{entities::image::UploadResult, errors::AppError};

/// Remote blob storage for project images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Stores `bytes` and reports where they ended up.
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<UploadResult, AppError>;

    /// Removes a blob. A blob the store does not know yields `AppError::NotFound`.
    async fn delete(&self, identifier: &str) -> Result<(), AppError>;
}

#[async_trait]
impl<T> AssetStore for Arc<T>
where
    T: AssetStore + ?Sized,
{
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<UploadResult, AppError> {
        (**self).upload(bytes, content_type).await
    }

    async fn delete(&self, identifier: &str) -> Result<(), AppError> {
        (**self).delete(identifier).await
    }
}
