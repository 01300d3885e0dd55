use actix_web::web;

use crate::handlers::admin;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(web::resource("/login").route(web::post().to(admin::login)))
            .service(web::resource("/verify").route(web::post().to(admin::verify)))
            .service(web::resource("/dashboard").route(web::get().to(admin::dashboard)))
    );
}
