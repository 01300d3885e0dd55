use actix_web::web;

use crate::handlers::uploads;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/uploads")
            .service(
                web::resource("")
                    .route(web::post().to(uploads::upload_file))
            )
            .service(
                // public ids carry their folder, so match the rest of the path
                web::resource("/{public_id:.+}")
                    .route(web::delete().to(uploads::delete_file))
            )
    );
}
