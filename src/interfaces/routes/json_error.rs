use actix_multipart::{form::MultipartFormConfig, MultipartError};
use actix_web::{
    error::{InternalError, JsonPayloadError, PathError, QueryPayloadError},
    http::StatusCode,
    web, Error, HttpRequest,
};

use crate::handlers::json_error::json_error;

/// Headroom for the text fields sent next to an image.
const MULTIPART_FIELD_ALLOWANCE: usize = 1024 * 1024;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_payload_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error));
}

/// Body limits follow the configured image size; the image itself is checked
/// again with a precise message once the form is parsed. Project writes accept
/// either body type, which buffers the payload first, hence `PayloadConfig`.
pub fn upload_limits(upload_max_bytes: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    let total = upload_max_bytes + MULTIPART_FIELD_ALLOWANCE;

    move |cfg| {
        cfg.app_data(web::PayloadConfig::new(total))
            .app_data(
                MultipartFormConfig::default()
                    .total_limit(total)
                    .memory_limit(MULTIPART_FIELD_ALLOWANCE)
                    .error_handler(multipart_error),
            );
    }
}

fn json_payload_error(err: JsonPayloadError, _req: &HttpRequest) -> Error {
    let (status, message) = match &err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            (StatusCode::PAYLOAD_TOO_LARGE, "Request body is too large".to_string())
        }
        JsonPayloadError::ContentType => (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Content type must be application/json".to_string(),
        ),
        _ => (StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", err)),
    };

    InternalError::from_response(err, json_error(status, &message)).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> Error {
    let message = format!("Invalid query string: {}", err);
    InternalError::from_response(err, json_error(StatusCode::BAD_REQUEST, &message)).into()
}

fn path_error(err: PathError, _req: &HttpRequest) -> Error {
    InternalError::from_response(err, json_error(StatusCode::NOT_FOUND, "Resource not found")).into()
}

fn multipart_error(err: MultipartError, _req: &HttpRequest) -> Error {
    let (status, message) = match &err {
        MultipartError::Payload(_) => (
            StatusCode::PAYLOAD_TOO_LARGE,
            "File too large or upload interrupted".to_string(),
        ),
        _ => (StatusCode::BAD_REQUEST, format!("Invalid multipart form: {}", err)),
    };

    InternalError::from_response(err, json_error(status, &message)).into()
}
