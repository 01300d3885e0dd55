use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Welcome to the Portfolio API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/health",
            "projects": "/api/projects",
            "contact": "/api/contact",
            "admin": "/api/admin"
        }
    }))
}
