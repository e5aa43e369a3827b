mod common;

use actix_web::{http::StatusCode, test};
use nanodrop::models::{
    ConfirmResponse, DeleteResponse, DownloadResponse, FileStatus, ListResponse, UploadResponse,
};
use serde_json::{json, Value};

use common::TestContext;

fn upload_body(name: &str, size: u64) -> Value {
    json!({ "fileName": name, "fileSize": size, "contentType": "text/plain" })
}

#[actix_web::test]
async fn full_upload_lifecycle() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    // request an upload URL
    let req = test::TestRequest::post()
        .uri("/files/upload")
        .set_json(upload_body("a.txt", 10))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let upload: UploadResponse = test::read_body_json(resp).await;
    assert_eq!(upload.expires_in, 300);
    assert!(upload.file_id.ends_with("-a.txt"));

    // client writes the bytes directly to the store
    ctx.objects
        .write_presigned(&upload.presigned_url, b"0123456789")
        .unwrap();
    assert_eq!(
        ctx.objects.content_type(&upload.file_id).as_deref(),
        Some("text/plain")
    );

    let req = test::TestRequest::post()
        .uri("/files/confirm")
        .set_json(json!({ "fileId": upload.file_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let confirm: ConfirmResponse = test::read_body_json(resp).await;
    assert_eq!(confirm.actual_file_size, 10);
    assert_eq!(confirm.message, "Upload confirmed successfully");

    let req = test::TestRequest::get().uri("/files").to_request();
    let list: ListResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list.files.len(), 1);
    assert_eq!(list.files[0].file_id, upload.file_id);
    assert_eq!(list.files[0].status, FileStatus::Completed);
    assert_eq!(list.files[0].actual_file_size, Some(10));

    let req = test::TestRequest::get()
        .uri(&format!("/files/{}/download", upload.file_id))
        .to_request();
    let download: DownloadResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(download.file_name, "a.txt");
    assert!(download
        .presigned_url
        .contains("attachment;_filename=\"a.txt\""));
    assert_eq!(
        ctx.objects.read_presigned(&download.presigned_url).unwrap(),
        Some(b"0123456789".to_vec())
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/files/{}", upload.file_id))
        .to_request();
    let deleted: DeleteResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(deleted.file_id, upload.file_id);
    assert!(!ctx.objects.contains(&upload.file_id));

    let req = test::TestRequest::get().uri("/files").to_request();
    let list: ListResponse = test::call_and_read_body_json(&app, req).await;
    assert!(list.files.is_empty());

    let req = test::TestRequest::get()
        .uri(&format!("/files/{}/download", upload.file_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "FILE_NOT_FOUND");
}

#[actix_web::test]
async fn missing_fields_are_rejected() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::post()
        .uri("/files/upload")
        .set_json(json!({ "fileName": "a.txt" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"],
        "fileName, fileSize, and contentType are required"
    );
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(ctx.metadata.is_empty());
}

#[actix_web::test]
async fn oversized_upload_creates_nothing() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::post()
        .uri("/files/upload")
        .set_json(upload_body("huge.iso", 100 * 1024 * 1024 + 1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "File size exceeds 100MB limit");
    assert!(ctx.metadata.is_empty());
}

#[actix_web::test]
async fn malformed_body_is_a_client_error() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::post()
        .uri("/files/upload")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "INVALID_BODY");

    let req = test::TestRequest::post()
        .uri("/files/upload")
        .set_json(json!({ "fileName": "a.txt", "fileSize": "ten", "contentType": "text/plain" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn confirm_before_upload_leaves_file_hidden() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::post()
        .uri("/files/upload")
        .set_json(upload_body("a.txt", 10))
        .to_request();
    let upload: UploadResponse = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/files/confirm")
        .set_json(json!({ "fileId": upload.file_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "File not uploaded to object store");
    assert_eq!(body["code"], "OBJECT_NOT_UPLOADED");

    let req = test::TestRequest::get().uri("/files").to_request();
    let list: ListResponse = test::call_and_read_body_json(&app, req).await;
    assert!(list.files.is_empty());

    let req = test::TestRequest::get()
        .uri(&format!("/files/{}/download", upload.file_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UPLOAD_NOT_CONFIRMED");
}

#[actix_web::test]
async fn confirm_requires_known_file_id() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::post()
        .uri("/files/confirm")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "fileId is required");

    let req = test::TestRequest::post()
        .uri("/files/confirm")
        .set_json(json!({ "fileId": "01HZZZ-unknown.txt" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "File metadata not found");
}

#[actix_web::test]
async fn confirm_twice_reports_same_size() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::post()
        .uri("/files/upload")
        .set_json(upload_body("twice.txt", 3))
        .to_request();
    let upload: UploadResponse = test::call_and_read_body_json(&app, req).await;
    ctx.objects
        .write_presigned(&upload.presigned_url, b"abc")
        .unwrap();

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/files/confirm")
            .set_json(json!({ "fileId": upload.file_id }))
            .to_request();
        let confirm: ConfirmResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(confirm.actual_file_size, 3);
    }
}

#[actix_web::test]
async fn delete_unknown_file_is_not_found() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::delete()
        .uri("/files/does-not-exist")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "File not found");
}

#[actix_web::test]
async fn store_failures_hide_details_by_default() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;
    ctx.metadata.set_offline(true);

    let req = test::TestRequest::get().uri("/files").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Failed to list files");
    assert_eq!(body["code"], "UPSTREAM_FAILURE");
    assert!(body.get("details").is_none());
}

#[actix_web::test]
async fn store_failures_show_details_in_development() {
    let ctx = TestContext::development();
    let app = test::init_service(ctx.app()).await;
    ctx.objects.set_offline(true);

    let req = test::TestRequest::post()
        .uri("/files/upload")
        .set_json(upload_body("a.txt", 10))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Failed to generate upload URL");
    assert_eq!(body["details"], "store unavailable: object store is offline");
    assert!(ctx.metadata.is_empty());
}

#[actix_web::test]
async fn health_check() {
    let ctx = TestContext::new();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "status": "ok" }));
}
