//! Shared fixtures for integration tests.

#![allow(dead_code)] // Not every test binary uses every fixture.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use tipline::app_config::{self, AppConfig, StaffAccount};
use tipline::report::{self, Report, ReportStatus};
use tipline::store::{NewReport, ReportStore, StoreError};

pub const STAFF_NAME: &str = "alice";
pub const STAFF_PASSWORD: &str = "correct-horse-battery";
pub const NON_STAFF_NAME: &str = "bob";
pub const NON_STAFF_PASSWORD: &str = "bobs-password";

/// Install a config with one staff and one non-staff account.
pub fn install_staff_config() {
    let config = AppConfig {
        staff: vec![
            StaffAccount {
                name: STAFF_NAME.to_string(),
                password_hash: hash_password(STAFF_PASSWORD),
                is_staff: true,
            },
            StaffAccount {
                name: NON_STAFF_NAME.to_string(),
                password_hash: hash_password(NON_STAFF_PASSWORD),
                is_staff: false,
            },
        ],
        ..Default::default()
    };
    app_config::replace(config);
}

pub fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("Failed to hash password")
        .to_string()
}

pub fn session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::from(&[7; 64]))
        .cookie_secure(false)
        .build()
}

/// Log in as the staff fixture account and return the session cookies to
/// attach to later requests.
pub async fn staff_login(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
) -> Vec<Cookie<'static>> {
    let req = test::TestRequest::post()
        .uri("/admin/login")
        .set_form([("username", STAFF_NAME), ("password", STAFF_PASSWORD)])
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND, "staff login failed");
    resp.response()
        .cookies()
        .map(|c| c.into_owned())
        .collect()
}

pub fn with_cookies(req: test::TestRequest, cookies: &[Cookie<'static>]) -> test::TestRequest {
    cookies.iter().fold(req, |req, c| req.cookie(c.clone()))
}

pub fn report_at(id: &str, created_at: DateTime<Utc>) -> Report {
    Report {
        id: id.to_string(),
        description: "Something worth reporting happened".to_string(),
        category: None,
        location: None,
        username: None,
        image_url: None,
        status: ReportStatus::New,
        created_at,
    }
}

pub fn report(id: &str) -> Report {
    report_at(id, Utc.with_ymd_and_hms(2025, 5, 4, 12, 0, 0).unwrap())
}

/// In-memory store that records every gateway call, so tests can assert
/// exactly which backend operations a workflow performed.
#[derive(Default)]
pub struct MockStore {
    pub reports: Mutex<Vec<Report>>,
    pub uploads: AtomicUsize,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub created: Mutex<Vec<NewReport>>,
    pub fail_upload: bool,
    pub fail_create: bool,
    pub fail_update: bool,
    pub fail_delete: bool,
    pub missing_table: bool,
}

impl MockStore {
    pub fn with_reports(reports: Vec<Report>) -> Self {
        Self {
            reports: Mutex::new(reports),
            ..Default::default()
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportStore for MockStore {
    async fn upload_asset(
        &self,
        _data: Vec<u8>,
        _content_type: &str,
        original_name: &str,
    ) -> Option<String> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload {
            None
        } else {
            Some(format!("https://cdn.test/{}", original_name))
        }
    }

    async fn create_report(&self, new: NewReport) -> Result<Report, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.created.lock().unwrap().push(new.clone());
        if self.missing_table {
            return Err(StoreError::SchemaMissing);
        }
        if self.fail_create {
            return Err(StoreError::Request("mock create failure".to_string()));
        }
        let stored = Report {
            id: format!("mock-{}", self.create_count()),
            description: new.description,
            category: new.category,
            location: new.location,
            username: new.username,
            image_url: new.image_url,
            status: ReportStatus::New,
            created_at: Utc::now(),
        };
        self.reports.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn list_reports(&self) -> Vec<Report> {
        let mut reports = self.reports.lock().unwrap().clone();
        report::sort_newest_first(&mut reports);
        reports
    }

    async fn get_report(&self, id: &str) -> Option<Report> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    async fn update_status(&self, id: &str, status: ReportStatus) -> Option<Report> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_update {
            return None;
        }
        let mut reports = self.reports.lock().unwrap();
        let report = reports.iter_mut().find(|r| r.id == id)?;
        report.status = status;
        Some(report.clone())
    }

    async fn delete_report(&self, id: &str) -> bool {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete {
            return false;
        }
        let mut reports = self.reports.lock().unwrap();
        let before = reports.len();
        reports.retain(|r| r.id != id);
        reports.len() < before
    }
}

pub const BOUNDARY: &str = "----tipline-test-boundary";

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// Build a multipart form body with text fields and an optional file part
/// named `image`.
pub fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
