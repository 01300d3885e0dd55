use actix_web::web;

use crate::handlers::{home::home, json_error::not_found, system::health_check};

mod admin;
mod contact;
mod json_error;
mod projects;
mod uploads;

pub use json_error::upload_limits;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(json_error::config_routes);

    cfg.service(home);

    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .configure(projects::config_routes)
            .configure(contact::config_routes)
            .configure(admin::config_routes)
            .configure(uploads::config_routes)
    );

    cfg.default_service(web::to(not_found));
}
