//! Submission workflow tests: which backend calls happen, and when.

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web::Data, App};
use common::*;
use serial_test::serial;
use std::sync::Arc;
use tipline::app_config::{self, AppConfig};
use tipline::store::StoreHandle;

async fn submit(
    mock: Arc<MockStore>,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> (StatusCode, Option<String>, String) {
    let handle = StoreHandle::fixed(mock);
    let app = test::init_service(
        App::new()
            .app_data(Data::new(handle))
            .configure(tipline::web::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/reports/submit")
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(multipart_body(fields, file))
        .to_request();
    let resp = test::call_service(&app, req).await;

    let status = resp.status();
    let location = resp
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    (status, location, body)
}

const VALID_DESCRIPTION: &str = "There is a deep pothole on Elm Street";

#[actix_rt::test]
#[serial]
async fn test_valid_submission_without_image_creates_once() {
    let mock = Arc::new(MockStore::default());
    let (status, location, _) =
        submit(mock.clone(), &[("description", VALID_DESCRIPTION)], None).await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/reports/submitted"));
    assert_eq!(mock.create_count(), 1);
    assert_eq!(mock.upload_count(), 0, "no image means no upload call");

    let created = mock.created.lock().unwrap();
    assert!(created[0].image_url.is_none());
    assert_eq!(created[0].description, VALID_DESCRIPTION);
}

#[actix_rt::test]
#[serial]
async fn test_short_description_makes_no_backend_call() {
    let mock = Arc::new(MockStore::default());
    let (status, _, body) = submit(mock.clone(), &[("description", "short")], None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("at least 10 characters"));
    assert_eq!(mock.create_count(), 0);
    assert_eq!(mock.upload_count(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_rejected_image_makes_no_upload_call() {
    let mock = Arc::new(MockStore::default());
    let (status, _, body) = submit(
        mock.clone(),
        &[("description", VALID_DESCRIPTION)],
        Some(("scan.pdf", "application/pdf", b"%PDF-1.4")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Only JPEG, PNG, GIF, and WebP images are allowed"));
    assert_eq!(mock.upload_count(), 0);
    assert_eq!(mock.create_count(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_failed_upload_still_creates_report() {
    let mock = Arc::new(MockStore {
        fail_upload: true,
        ..Default::default()
    });
    let (status, location, _) = submit(
        mock.clone(),
        &[("description", VALID_DESCRIPTION)],
        Some(("photo.png", "image/png", b"not-really-a-png")),
    )
    .await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(location.as_deref(), Some("/reports/submitted"));
    assert_eq!(mock.upload_count(), 1);
    assert_eq!(mock.create_count(), 1);

    let created = mock.created.lock().unwrap();
    assert!(
        created[0].image_url.is_none(),
        "report is created without an image when the upload fails"
    );
}

#[actix_rt::test]
#[serial]
async fn test_successful_upload_is_linked_to_report() {
    let mock = Arc::new(MockStore::default());
    let (status, _, _) = submit(
        mock.clone(),
        &[("description", VALID_DESCRIPTION)],
        Some(("photo.png", "image/png", b"not-really-a-png")),
    )
    .await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(mock.upload_count(), 1);
    let created = mock.created.lock().unwrap();
    assert!(created[0].image_url.as_deref().unwrap().starts_with("https://cdn.test/"));
}

#[actix_rt::test]
#[serial]
async fn test_create_failure_rerenders_with_generic_error() {
    let mock = Arc::new(MockStore {
        fail_create: true,
        ..Default::default()
    });
    let (status, _, body) =
        submit(mock.clone(), &[("description", VALID_DESCRIPTION)], None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Please try again later"));
    assert_eq!(mock.create_count(), 1);
}

#[actix_rt::test]
#[serial]
async fn test_missing_table_gets_setup_message() {
    let mock = Arc::new(MockStore {
        missing_table: true,
        ..Default::default()
    });
    let (_, _, body) = submit(mock, &[("description", VALID_DESCRIPTION)], None).await;
    assert!(body.contains("database is not set up"));
}

#[actix_rt::test]
#[serial]
async fn test_entered_values_preserved_on_validation_error() {
    let mock = Arc::new(MockStore::default());
    let (_, _, body) = submit(
        mock,
        &[
            ("description", "short"),
            ("location", "Elm Street corner"),
            ("username", "Jane"),
            ("category", "safety"),
        ],
        None,
    )
    .await;

    assert!(body.contains("Elm Street corner"));
    assert!(body.contains("Jane"));
    assert!(body.contains(r#"value="safety" selected"#));
}

#[actix_rt::test]
#[serial]
async fn test_truncated_multipart_stream_is_rejected() {
    let mock = Arc::new(MockStore::default());
    let app = test::init_service(
        App::new()
            .app_data(Data::new(StoreHandle::fixed(mock.clone())))
            .configure(tipline::web::configure),
    )
    .await;

    // One complete field, then the stream dies mid-header of the next
    // part. The valid field must not be processed as a submission.
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\n{}\r\n",
            BOUNDARY, VALID_DESCRIPTION
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("--{}\r\nContent-Disposition: form-da", BOUNDARY).as_bytes());

    let req = test::TestRequest::post()
        .uri("/reports/submit")
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(mock.create_count(), 0);
    assert_eq!(mock.upload_count(), 0);
}

#[actix_rt::test]
#[serial]
async fn test_unconfigured_backend_shows_admin_contact_message() {
    // Real (unpinned) handle against an empty backend config.
    app_config::replace(AppConfig::default());

    let app = test::init_service(
        App::new()
            .app_data(Data::new(StoreHandle::new()))
            .configure(tipline::web::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/reports/submit")
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(multipart_body(&[("description", VALID_DESCRIPTION)], None))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("not configured"));
}

#[actix_rt::test]
#[serial]
async fn test_home_redirects_to_form() {
    let app = test::init_service(
        App::new()
            .app_data(Data::new(StoreHandle::fixed(Arc::new(MockStore::default()))))
            .configure(tipline::web::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/reports/submit"
    );
}
