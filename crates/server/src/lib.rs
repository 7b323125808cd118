//! WebSocket transport and admin HTTP surface for the tournament
//! coordinator.
//!
//! ## Submodules
//!
//! - [`hub`] — [`hub::Hub`], the shared coordinator plus connection registry
//! - [`ws`] — websocket upgrade and per-connection bridge
//! - [`admin`] — `/admin/*` operator routes, gated behind a bearer token
pub mod admin;
pub mod hub;
pub mod ws;

pub use hub::Hub;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpServer;
use actix_web::middleware::Logger;
use actix_web::web;

#[rustfmt::skip]
pub async fn run() -> Result<(), std::io::Error> {
    let hub = web::Data::new(Hub::new());
    let admin_token = std::env::var("ARBITER_ADMIN_TOKEN").ok();
    if admin_token.is_none() {
        log::warn!("ARBITER_ADMIN_TOKEN not set, admin routes disabled");
    }
    log::info!("starting tournament coordinator server");
    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(hub.clone())
            .route("/ws", web::get().to(ws::connect));
        if let Some(token) = admin_token.clone() {
            app = app.service(
                web::scope("/admin")
                    .app_data(web::Data::new(token))
                    .route("/tournaments", web::get().to(admin::list))
                    .route("/tournaments", web::post().to(admin::create))
                    .route("/tournaments/{id}/bots", web::post().to(admin::add_bots))
                    .route("/tournaments/{id}/start", web::post().to(admin::start))
                    .route("/tournaments/{id}/finish", web::post().to(admin::finish))
                    .route("/tournaments/{id}/snapshot", web::get().to(admin::snapshot))
                    .route("/tournaments/restore", web::post().to(admin::restore)),
            );
        }
        app
    })
    .bind(std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8787".to_string()))?
    .run()
    .await
}
