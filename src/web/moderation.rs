//! Staff moderation panel: listing, detail, status changes, deletion.

use crate::report::{self, Report, ReportStatus};
use crate::session::require_staff;
use crate::store::StoreHandle;
use actix_web::{get, post, web, Error, HttpResponse, Responder};
use askama::Template;
use askama_actix::TemplateToResponse;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_dashboard)
        .service(view_report)
        .service(update_report_status)
        .service(delete_report);
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
struct DashboardTemplate {
    total_count: usize,
    reports: Vec<ReportRow>,
}

/// One listing row, preformatted for the template. Empty strings stand in
/// for absent optionals.
struct ReportRow {
    id: String,
    category: String,
    location: String,
    status: String,
    created_at: String,
    has_image: bool,
}

impl ReportRow {
    fn from_report(report: &Report) -> Self {
        Self {
            id: report.id.clone(),
            category: report
                .category
                .map(|c| c.as_str().to_string())
                .unwrap_or_default(),
            location: report.location.clone().unwrap_or_default(),
            status: report.status.to_string(),
            created_at: report::format_timestamp(&report.created_at),
            has_image: report.image_url.is_some(),
        }
    }
}

#[derive(Template)]
#[template(path = "report_detail.html")]
struct ReportDetailTemplate {
    id: String,
    description: String,
    category: String,
    location: String,
    username: String,
    image_url: String,
    status: String,
    created_at: String,
}

#[derive(Template)]
#[template(path = "backend_error.html")]
pub(super) struct BackendErrorTemplate {}

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate {
    message: String,
}

#[get("/admin/dashboard")]
async fn view_dashboard(
    cookies: actix_session::Session,
    handle: web::Data<StoreHandle>,
) -> Result<impl Responder, Error> {
    require_staff(&cookies)?;

    let store = match handle.get() {
        Ok(store) => store,
        Err(e) => {
            log::error!("view_dashboard: configuration error: {}", e);
            return Ok(BackendErrorTemplate {}.to_response());
        }
    };

    // A failed fetch is logged by the store and renders an empty listing.
    let reports = store.list_reports().await;

    Ok(DashboardTemplate {
        total_count: reports.len(),
        reports: reports.iter().map(ReportRow::from_report).collect(),
    }
    .to_response())
}

#[get("/admin/report/{id}")]
async fn view_report(
    cookies: actix_session::Session,
    handle: web::Data<StoreHandle>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    require_staff(&cookies)?;
    let report_id = path.into_inner();

    let store = match handle.get() {
        Ok(store) => store,
        Err(e) => {
            log::error!("view_report: configuration error: {}", e);
            return Ok(BackendErrorTemplate {}.to_response());
        }
    };

    let report = match store.get_report(&report_id).await {
        Some(report) => report,
        None => {
            let body = NotFoundTemplate {
                message: "Report not found".to_string(),
            }
            .render()
            .map_err(actix_web::error::ErrorInternalServerError)?;
            return Ok(HttpResponse::NotFound()
                .content_type("text/html; charset=utf-8")
                .body(body));
        }
    };

    Ok(ReportDetailTemplate {
        id: report.id,
        description: report.description,
        category: report
            .category
            .map(|c| c.as_str().to_string())
            .unwrap_or_default(),
        location: report.location.unwrap_or_default(),
        username: report.username.unwrap_or_default(),
        image_url: report.image_url.unwrap_or_default(),
        status: report.status.to_string(),
        created_at: report::format_timestamp(&report.created_at),
    }
    .to_response())
}

#[derive(Deserialize)]
struct StatusForm {
    status: String,
}

/// Fire-and-forget endpoint consumed by the dashboard UI; replies with a
/// minimal text body, not a page.
#[post("/admin/report/{id}/status")]
async fn update_report_status(
    cookies: actix_session::Session,
    handle: web::Data<StoreHandle>,
    path: web::Path<String>,
    form: web::Form<StatusForm>,
) -> Result<HttpResponse, Error> {
    let moderator = require_staff(&cookies)?;
    let report_id = path.into_inner();

    let status = match ReportStatus::parse(form.status.trim()) {
        Some(status) => status,
        None => {
            log::warn!("Invalid status update attempt: {}", form.status);
            return Ok(HttpResponse::BadRequest().body("Invalid status"));
        }
    };

    let store = handle.get().map_err(|e| {
        log::error!("update_report_status: configuration error: {}", e);
        actix_web::error::ErrorInternalServerError("Backend not configured")
    })?;

    match store.update_status(&report_id, status).await {
        Some(_) => {
            log::info!(
                "Report {} status updated to {} by {}",
                report_id,
                status,
                moderator
            );
            Ok(HttpResponse::Ok().body("OK"))
        }
        None => {
            log::error!("Failed to update report {} status", report_id);
            Ok(HttpResponse::InternalServerError().body("Failed to update"))
        }
    }
}

#[post("/admin/report/{id}/delete")]
async fn delete_report(
    cookies: actix_session::Session,
    handle: web::Data<StoreHandle>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let moderator = require_staff(&cookies)?;
    let report_id = path.into_inner();

    let store = handle.get().map_err(|e| {
        log::error!("delete_report: configuration error: {}", e);
        actix_web::error::ErrorInternalServerError("Backend not configured")
    })?;

    if store.delete_report(&report_id).await {
        log::info!("Report {} deleted by {}", report_id, moderator);
        Ok(HttpResponse::Ok().body("OK"))
    } else {
        log::error!("Failed to delete report {}", report_id);
        Ok(HttpResponse::InternalServerError().body("Failed to delete"))
    }
}
