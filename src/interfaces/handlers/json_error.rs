use actix_web::{http::StatusCode, HttpResponse};

/// The `{success: false, message}` body used for every failure the
/// `AppError` type does not produce itself.
pub fn json_error(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "success": false,
        "message": message
    }))
}

pub async fn not_found() -> HttpResponse {
    json_error(StatusCode::NOT_FOUND, "API endpoint not found")
}
