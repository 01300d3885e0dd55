use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use crate::{
    entities::image::UploadResult,
    errors::AppError,
    repositories::asset_store::AssetStore,
    settings::AssetStoreConfig,
};

const ALLOWED_FORMATS: &str = "jpg,jpeg,png,webp";
const UPLOAD_TRANSFORMATION: &str = "c_scale,w_1200,q_auto";

/// Signed-upload client for the Cloudinary REST API.
pub struct CloudinaryStore {
    client: Client,
    upload_url: String,
    destroy_url: String,
    api_key: String,
    api_secret: Zeroizing<String>,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryUploadResponse {
    public_id: String,
    secure_url: String,
    width: Option<u32>,
    height: Option<u32>,
    format: Option<String>,
    bytes: Option<u64>,
}

impl From<CloudinaryUploadResponse> for UploadResult {
    fn from(res: CloudinaryUploadResponse) -> Self {
        UploadResult {
            location: res.secure_url,
            identifier: res.public_id,
            width: res.width,
            height: res.height,
            encoding: res.format,
            size_bytes: res.bytes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CloudinaryDestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorMessage,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorMessage {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: &AssetStoreConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        let base = format!(
            "{}/{}/image",
            config.api_base_url.trim_end_matches('/'),
            config.cloud_name
        );

        Ok(CloudinaryStore {
            client,
            upload_url: format!("{}/upload", base),
            destroy_url: format!("{}/destroy", base),
            api_key: config.api_key.clone(),
            api_secret: Zeroizing::new(config.api_secret.clone()),
            folder: config.folder.clone(),
        })
    }

    fn signed_form(&self, mut params: Vec<(&'static str, String)>) -> multipart::Form {
        let timestamp = Utc::now().timestamp().to_string();
        params.push(("timestamp", timestamp));

        let signature = sign_params(&params, &self.api_secret);

        params
            .into_iter()
            .fold(multipart::Form::new(), |form, (key, value)| form.text(key, value))
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<CloudinaryErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("media host responded with {}", status),
        }
    }
}

/// Cloudinary request signature: parameters sorted by name, joined as
/// `k=v&k=v`, the API secret appended, then hashed. Empty values are not signed.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut signed: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    signed.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = signed
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn file_name_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "upload.png",
        "image/webp" => "upload.webp",
        _ => "upload.jpg",
    }
}

#[async_trait]
impl AssetStore for CloudinaryStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<UploadResult, AppError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name_for(content_type))
            .mime_str(content_type)
            .map_err(|e| AppError::BadRequest(format!("Invalid content type: {}", e)))?;

        let form = self
            .signed_form(vec![
                ("allowed_formats", ALLOWED_FORMATS.to_string()),
                ("folder", self.folder.clone()),
                ("transformation", UPLOAD_TRANSFORMATION.to_string()),
            ])
            .part("file", part);

        let response = self.client.post(&self.upload_url).multipart(form).send().await?;

        match response.status() {
            status if status.is_success() => {
                let body: CloudinaryUploadResponse = response.json().await?;
                debug!(public_id = %body.public_id, "Image uploaded");
                Ok(body.into())
            }
            StatusCode::BAD_REQUEST => {
                let message = Self::error_message(response).await;
                Err(AppError::BadRequest(format!("Image upload rejected: {}", message)))
            }
            _ => {
                let message = Self::error_message(response).await;
                Err(AppError::UpstreamStore(format!("Image upload failed: {}", message)))
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, identifier: &str) -> Result<(), AppError> {
        let form = self.signed_form(vec![("public_id", identifier.to_string())]);

        let response = self.client.post(&self.destroy_url).multipart(form).send().await?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            return Err(AppError::UpstreamStore(format!("Image delete failed: {}", message)));
        }

        let body: CloudinaryDestroyResponse = response.json().await?;
        match body.result.as_str() {
            "ok" => Ok(()),
            "not found" => Err(AppError::NotFound("Image not found".into())),
            other => Err(AppError::UpstreamStore(format!("Unexpected destroy result: {}", other))),
        }
    }
}
