//! CSV export endpoint for the moderation panel.

use super::moderation::BackendErrorTemplate;
use crate::export::render_csv;
use crate::session::require_staff;
use crate::store::StoreHandle;
use actix_web::http::header;
use actix_web::{get, web, Error, HttpResponse};
use askama_actix::TemplateToResponse;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(export_csv);
}

#[get("/admin/export/csv")]
async fn export_csv(
    cookies: actix_session::Session,
    handle: web::Data<StoreHandle>,
) -> Result<HttpResponse, Error> {
    let moderator = require_staff(&cookies)?;

    let store = match handle.get() {
        Ok(store) => store,
        Err(e) => {
            log::error!("export_csv: configuration error: {}", e);
            return Ok(BackendErrorTemplate {}.to_response());
        }
    };

    let reports = store.list_reports().await;
    let csv = render_csv(&reports);

    log::info!("CSV export of {} report(s) by {}", reports.len(), moderator);

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"reports.csv\"",
        ))
        .body(csv))
}
