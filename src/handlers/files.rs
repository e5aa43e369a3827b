use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};

use crate::error::{ApiError, AppError};
use crate::models::{ConfirmRequest, UploadRequest};
use crate::state::AppState;

/// Body decoding failures become `INVALID_BODY` responses in the same shape
/// as every other error.
pub fn json_config(expose_details: bool) -> web::JsonConfig {
    web::JsonConfig::default().error_handler(move |err: JsonPayloadError, _req: &HttpRequest| {
        ApiError::new(AppError::InvalidBody(err.to_string()), expose_details).into()
    })
}

pub async fn request_upload(
    state: web::Data<AppState>,
    body: web::Json<UploadRequest>,
) -> Result<HttpResponse, ApiError> {
    let response = state
        .files
        .request_upload(body.into_inner())
        .await
        .map_err(|e| state.reject(e))?;

    Ok(HttpResponse::Ok().json(response))
}

pub async fn confirm_upload(
    state: web::Data<AppState>,
    body: web::Json<ConfirmRequest>,
) -> Result<HttpResponse, ApiError> {
    let response = state
        .files
        .confirm_upload(body.into_inner().file_id)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(HttpResponse::Ok().json(response))
}

pub async fn list_files(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let response = state.files.list_files().await.map_err(|e| state.reject(e))?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn download_file(
    state: web::Data<AppState>,
    file_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let response = state
        .files
        .download_url(&file_id)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(HttpResponse::Ok().json(response))
}

pub async fn delete_file(
    state: web::Data<AppState>,
    file_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let response = state
        .files
        .delete_file(&file_id)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(HttpResponse::Ok().json(response))
}
