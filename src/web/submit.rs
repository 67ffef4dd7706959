//! Anonymous report submission endpoints.

use crate::store::{NewReport, StoreError, StoreHandle};
use crate::validation::{self, ImageUpload, RawSubmission};
use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama::Template;
use askama_actix::TemplateToResponse;
use futures_util::{StreamExt, TryStreamExt};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_home)
        .service(view_form)
        .service(submit_report)
        .service(view_submitted);
}

const NOT_CONFIGURED_MSG: &str =
    "The reporting system is not configured. Please contact the administrator.";
const NOT_SET_UP_MSG: &str =
    "The reporting system database is not set up. Please contact the administrator.";
const GENERIC_FAILURE_MSG: &str =
    "An error occurred while submitting your report. Please try again later.";

/// Buffer at most one byte past the limit; validation rejects on the
/// streamed size, so the rest of an oversized upload is drained unbuffered.
const IMAGE_BUFFER_CAP: usize = validation::IMAGE_MAX_BYTES + 1;

/// Previously entered non-file values, re-presented alongside errors.
#[derive(Debug, Default, Clone)]
pub struct FormValues {
    pub description: String,
    pub category: String,
    pub username: String,
    pub location: String,
}

impl FormValues {
    fn from_raw(raw: &RawSubmission) -> Self {
        Self {
            description: raw.description.clone(),
            category: raw.category.clone(),
            username: raw.username.clone(),
            location: raw.location.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "report_form.html")]
struct ReportFormTemplate {
    description: String,
    category: String,
    username: String,
    location: String,
    description_error: String,
    category_error: String,
    username_error: String,
    location_error: String,
    image_error: String,
    form_error: String,
}

impl ReportFormTemplate {
    fn empty() -> Self {
        Self::new(FormValues::default(), validation::FieldErrors::default(), "")
    }

    fn new(values: FormValues, errors: validation::FieldErrors, form_error: &str) -> Self {
        Self {
            description: values.description,
            category: values.category,
            username: values.username,
            location: values.location,
            description_error: errors.description.unwrap_or_default(),
            category_error: errors.category.unwrap_or_default(),
            username_error: errors.username.unwrap_or_default(),
            location_error: errors.location.unwrap_or_default(),
            image_error: errors.image.unwrap_or_default(),
            form_error: form_error.to_string(),
        }
    }

    fn with_form_error(values: FormValues, message: &str) -> Self {
        Self::new(values, validation::FieldErrors::default(), message)
    }
}

#[derive(Template)]
#[template(path = "report_submitted.html")]
struct ReportSubmittedTemplate {}

#[get("/")]
async fn view_home() -> impl Responder {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/reports/submit"))
        .finish()
}

#[get("/reports/submit")]
async fn view_form() -> impl Responder {
    ReportFormTemplate::empty().to_response()
}

#[post("/reports/submit")]
async fn submit_report(
    handle: web::Data<StoreHandle>,
    payload: Multipart,
) -> Result<HttpResponse, Error> {
    let raw = read_submission(payload).await?;
    let values = FormValues::from_raw(&raw);

    let submission = match validation::validate(raw) {
        Ok(submission) => submission,
        Err(errors) => {
            return Ok(ReportFormTemplate::new(values, errors, "").to_response());
        }
    };

    let store = match handle.get() {
        Ok(store) => store,
        Err(e) => {
            log::error!("submit_report: configuration error: {}", e);
            return Ok(ReportFormTemplate::with_form_error(values, NOT_CONFIGURED_MSG).to_response());
        }
    };

    // A failed upload is logged by the store and the report is still
    // created without an image.
    let image_url = match submission.image {
        Some(image) => {
            store
                .upload_asset(image.data, &image.content_type, &image.filename)
                .await
        }
        None => None,
    };

    let new_report = NewReport {
        description: submission.description,
        category: submission.category,
        location: submission.location,
        image_url,
        username: submission.username,
    };

    match store.create_report(new_report).await {
        Ok(report) => {
            log::info!("submit_report: created report {}", report.id);
            Ok(HttpResponse::Found()
                .insert_header((header::LOCATION, "/reports/submitted"))
                .finish())
        }
        Err(StoreError::SchemaMissing) => {
            log::error!("submit_report: backend table is missing");
            Ok(ReportFormTemplate::with_form_error(values, NOT_SET_UP_MSG).to_response())
        }
        Err(e) => {
            log::error!("submit_report: create_report: {}", e);
            Ok(ReportFormTemplate::with_form_error(values, GENERIC_FAILURE_MSG).to_response())
        }
    }
}

#[get("/reports/submitted")]
async fn view_submitted() -> impl Responder {
    ReportSubmittedTemplate {}.to_response()
}

/// Read the multipart form into a raw submission.
async fn read_submission(mut payload: Multipart) -> Result<RawSubmission, Error> {
    let mut raw = RawSubmission::default();

    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // A broken stream must reject the request; fields read so far
            // are not a submission.
            Err(e) => {
                log::error!("read_submission: multipart stream error: {}", e);
                return Err(error::ErrorBadRequest("Error interpreting user input."));
            }
        };

        // Pull owned copies out of the disposition before streaming the
        // field body; the borrow and the stream cannot overlap.
        let (name, filename) = {
            let disposition = field.content_disposition();
            (
                disposition.get_name().map(str::to_string),
                disposition.get_filename().map(str::to_string),
            )
        };
        let name = match name {
            Some(name) => name,
            None => continue,
        };

        match name.as_str() {
            "description" => raw.description = read_text(&mut field).await?,
            "category" => raw.category = read_text(&mut field).await?,
            "username" => raw.username = read_text(&mut field).await?,
            "location" => raw.location = read_text(&mut field).await?,
            "image" => {
                let filename = filename.unwrap_or_default();
                let content_type = field
                    .content_type()
                    .map(|m| m.essence_str().to_string())
                    .unwrap_or_default();

                let mut data: Vec<u8> = Vec::new();
                let mut size: usize = 0;
                while let Some(chunk) = field.next().await {
                    let bytes = chunk.map_err(|e| {
                        log::error!("read_submission: multipart read error: {}", e);
                        error::ErrorBadRequest("Error interpreting user input.")
                    })?;
                    size += bytes.len();
                    if data.len() < IMAGE_BUFFER_CAP {
                        data.extend_from_slice(&bytes);
                        data.truncate(IMAGE_BUFFER_CAP);
                    }
                }

                // Browsers send an empty file part when nothing was chosen.
                if !filename.is_empty() || size > 0 {
                    raw.image = Some(ImageUpload {
                        filename,
                        content_type,
                        data,
                        size,
                    });
                }
            }
            _ => {
                // Drain unknown fields so the stream can advance.
                while let Some(chunk) = field.next().await {
                    chunk.map_err(error::ErrorBadRequest)?;
                }
            }
        }
    }

    Ok(raw)
}

async fn read_text(field: &mut actix_multipart::Field) -> Result<String, Error> {
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            log::error!("read_text: multipart read error: {}", e);
            error::ErrorBadRequest("Error interpreting user input.")
        })?;
        buf.extend_from_slice(&bytes);
    }
    String::from_utf8(buf).map_err(|_| error::ErrorBadRequest("Form fields must be UTF-8."))
}
