//! # cm-api
//!
//! The web routing and orchestration layer: HTML pages under `/` and the
//! JSON API under `/api/`.

pub mod api;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;

use actix_web::web;

pub use handlers::AppState;
pub use session::SessionPolicy;

/// Registers every page and API route.
///
/// The main binary adds logging, static files and shared state around this.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(middleware::cors_policy())
            .app_data(api::json_config())
            .route("/", web::get().to(api::api_root))
            .service(
                web::resource("/cars/")
                    .route(web::get().to(api::list_cars))
                    .route(web::post().to(api::create_car)),
            )
            .service(
                web::resource("/cars/{id}/")
                    .route(web::get().to(api::retrieve_car))
                    .route(web::put().to(api::update_car))
                    .route(web::patch().to(api::partial_update_car))
                    .route(web::delete().to(api::destroy_car)),
            )
            .service(
                web::resource("/cars/{car_id}/comments/")
                    .route(web::get().to(api::list_comments))
                    .route(web::post().to(api::create_comment)),
            )
            .service(
                web::resource("/cars/{car_id}/comments/{id}/")
                    .route(web::get().to(api::retrieve_comment))
                    .route(web::put().to(api::update_comment))
                    .route(web::patch().to(api::partial_update_comment))
                    .route(web::delete().to(api::destroy_comment)),
            ),
    );

    // "/car/new/" must come before "/car/{id}/"
    cfg.route("/", web::get().to(handlers::car_list))
        .service(
            web::resource("/car/new/")
                .route(web::get().to(handlers::car_create_form))
                .route(web::post().to(handlers::car_create)),
        )
        .service(
            web::resource("/car/{id}/")
                .route(web::get().to(handlers::car_detail))
                .route(web::post().to(handlers::car_comment)),
        )
        .route("/car/{id}/comment/", web::post().to(handlers::car_comment))
        .service(
            web::resource("/car/{id}/edit/")
                .route(web::get().to(handlers::car_update_form))
                .route(web::post().to(handlers::car_update)),
        )
        .service(
            web::resource("/car/{id}/delete/")
                .route(web::get().to(handlers::car_delete_confirm))
                .route(web::post().to(handlers::car_delete)),
        )
        .service(
            web::resource("/register/")
                .route(web::get().to(handlers::register_form))
                .route(web::post().to(handlers::register)),
        )
        .service(
            web::resource("/login/")
                .route(web::get().to(handlers::login_form))
                .route(web::post().to(handlers::login)),
        )
        .service(
            web::resource("/logout/")
                .route(web::get().to(handlers::logout))
                .route(web::post().to(handlers::logout)),
        );
}
