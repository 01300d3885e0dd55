use serde::{Deserialize, Serialize};

/// What the asset store reports back after accepting a blob.
///
/// Backends differ in which metadata they return, so everything past the
/// location and identifier is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadResult {
    pub location: String,
    pub identifier: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub encoding: Option<String>,
    pub size_bytes: Option<u64>,
}

/// Image metadata stored on a project record (JSONB column `image`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub url: String,
    pub public_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

impl From<&UploadResult> for ImageDescriptor {
    fn from(upload: &UploadResult) -> Self {
        ImageDescriptor {
            url: upload.location.clone(),
            public_id: upload.identifier.clone(),
            width: upload.width,
            height: upload.height,
            format: upload.encoding.clone(),
            bytes: upload.size_bytes,
        }
    }
}

/// Converts an optional upload into the descriptor stored on a project.
/// No upload means no image.
pub fn resolve_image(upload: Option<&UploadResult>) -> Option<ImageDescriptor> {
    upload.map(ImageDescriptor::from)
}

/// Response body for the standalone upload endpoint.
#[derive(Debug, Serialize)]
pub struct UploadedFileResponse {
    pub success: bool,
    pub message: String,
    pub file: ImageDescriptor,
}
