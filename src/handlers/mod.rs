pub mod files;

use actix_web::{guard, web, HttpResponse, Responder};
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Registered first with a resource guard so it never shadows the real
    // routes for other methods.
    cfg.service(
        web::resource("/{tail:.*}")
            .guard(guard::Options())
            .to(preflight),
    )
    .route("/health", web::get().to(health))
    .service(
        web::scope("/files")
            .route("", web::get().to(files::list_files))
            .route("/upload", web::post().to(files::request_upload))
            .route("/confirm", web::post().to(files::confirm_upload))
            .route("/{file_id}/download", web::get().to(files::download_file))
            .route("/{file_id}", web::delete().to(files::delete_file)),
    );
}

// CORS headers are added by the middleware.
async fn preflight() -> impl Responder {
    HttpResponse::Ok().finish()
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
