pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

use actix_cors::Cors;
use actix_web::web;

pub use state::AppState;

const ALLOWED_HEADERS: [&str; 5] = [
    "Content-Type",
    "X-Amz-Date",
    "Authorization",
    "X-Api-Key",
    "X-Amz-Security-Token",
];

/// CORS policy for browser clients. A `*` entry allows any origin.
pub fn cors(allowed_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["OPTIONS", "POST", "GET", "DELETE"])
        .allowed_headers(ALLOWED_HEADERS)
        .max_age(3600);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return cors.allow_any_origin();
    }
    allowed_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

/// Registers state, body decoding and routes. Used by `main` and the
/// integration tests alike.
pub fn configure_app(state: web::Data<AppState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let expose_details = state.expose_error_details;
        cfg.app_data(state)
            .app_data(handlers::files::json_config(expose_details));
        handlers::configure(cfg);
    }
}
