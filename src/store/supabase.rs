//! Supabase-backed store: PostgREST for rows, the storage API for assets.

use super::{NewReport, ReportStore, StoreError};
use crate::app_config::BackendConfig;
use crate::report::{self, Report, ReportStatus};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header;
use serde::Deserialize;
use uuid::Uuid;

/// Endpoint shipped in example configs. Refusing it at construction keeps
/// a half-configured deployment from making doomed network calls.
pub const PLACEHOLDER_ENDPOINT: &str = "https://example.supabase.co";

/// PostgREST error code for a relation missing from the schema cache.
const MISSING_TABLE_CODE: &str = "PGRST205";

pub struct SupabaseStore {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

#[derive(Deserialize)]
struct BackendErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl SupabaseStore {
    /// Build a client for the configured backend.
    ///
    /// Fails fast with `StoreError::Configuration` when the endpoint,
    /// key, or bucket is missing or still the placeholder value.
    pub fn new(config: &BackendConfig) -> Result<Self, StoreError> {
        if config.url.is_empty() || config.key.is_empty() {
            return Err(StoreError::Configuration(
                "backend url and key are required".to_string(),
            ));
        }
        if config.url == PLACEHOLDER_ENDPOINT {
            return Err(StoreError::Configuration(
                "backend url is still the placeholder value; configure real credentials"
                    .to_string(),
            ));
        }
        if config.bucket.is_empty() {
            return Err(StoreError::Configuration(
                "backend bucket is required".to_string(),
            ));
        }
        url::Url::parse(&config.url)
            .map_err(|e| StoreError::Configuration(format!("bad backend url: {}", e)))?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| StoreError::Configuration(e.to_string()))?;

        log::info!("SupabaseStore initialized for endpoint: {}", config.url);

        Ok(SupabaseStore {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.key.clone(),
            bucket: config.bucket.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/reports", self.base_url)
    }

    fn auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// Map a non-success response to a structured error. The missing-table
    /// case is detected from the backend's error code, not its prose.
    async fn response_error(&self, response: reqwest::Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if let Ok(parsed) = serde_json::from_str::<BackendErrorBody>(&body) {
            if parsed.code == MISSING_TABLE_CODE {
                return StoreError::SchemaMissing;
            }
            if !parsed.message.is_empty() {
                return StoreError::Request(format!("{}: {}", status, parsed.message));
            }
        }
        StoreError::Request(format!("{}: {}", status, body))
    }
}

/// Generate a fresh storage key, preserving the original extension
/// (lowercased) and defaulting to `bin` when there is none.
pub fn storage_key(original_name: &str) -> String {
    let extension = crate::validation::file_extension(original_name);
    let extension: String = extension
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if extension.is_empty() {
        format!("{}.bin", Uuid::new_v4())
    } else {
        format!("{}.{}", Uuid::new_v4(), extension)
    }
}

#[async_trait]
impl ReportStore for SupabaseStore {
    async fn upload_asset(
        &self,
        data: Vec<u8>,
        content_type: &str,
        original_name: &str,
    ) -> Option<String> {
        let key = storage_key(original_name);
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key);

        let result = self
            .auth(self.http.post(&url))
            .header(header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                log::info!("upload_asset: stored {}", key);
                Some(format!(
                    "{}/storage/v1/object/public/{}/{}",
                    self.base_url, self.bucket, key
                ))
            }
            Ok(response) => {
                log::error!("upload_asset: {} responded {}", key, response.status());
                None
            }
            Err(e) => {
                log::error!("upload_asset: {}: {}", key, e);
                None
            }
        }
    }

    async fn create_report(&self, new: NewReport) -> Result<Report, StoreError> {
        let report = Report {
            id: Uuid::new_v4().to_string(),
            description: new.description,
            category: new.category,
            location: new.location,
            username: new.username,
            image_url: new.image_url,
            status: ReportStatus::New,
            created_at: Utc::now(),
        };

        let response = self
            .auth(self.http.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&report)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.response_error(response).await);
        }

        let mut rows: Vec<Report> = response
            .json()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        rows.pop()
            .ok_or_else(|| StoreError::Request("insert returned no rows".to_string()))
    }

    async fn list_reports(&self) -> Vec<Report> {
        let result = self
            .auth(self.http.get(self.table_url()))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await;

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                log::error!("list_reports: backend responded {}", response.status());
                return Vec::new();
            }
            Err(e) => {
                log::error!("list_reports: {}", e);
                return Vec::new();
            }
        };

        match response.json::<Vec<Report>>().await {
            Ok(mut rows) => {
                report::sort_newest_first(&mut rows);
                rows
            }
            Err(e) => {
                log::error!("list_reports: bad response body: {}", e);
                Vec::new()
            }
        }
    }

    async fn get_report(&self, id: &str) -> Option<Report> {
        let filter = format!("eq.{}", id);
        let result = self
            .auth(self.http.get(self.table_url()))
            .query(&[("select", "*"), ("id", filter.as_str())])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<Vec<Report>>().await {
                    Ok(rows) => rows.into_iter().next(),
                    Err(e) => {
                        log::error!("get_report: {}: bad response body: {}", id, e);
                        None
                    }
                }
            }
            Ok(response) => {
                log::error!("get_report: {}: backend responded {}", id, response.status());
                None
            }
            Err(e) => {
                log::error!("get_report: {}: {}", id, e);
                None
            }
        }
    }

    async fn update_status(&self, id: &str, status: ReportStatus) -> Option<Report> {
        let filter = format!("eq.{}", id);
        let result = self
            .auth(self.http.patch(self.table_url()))
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<Vec<Report>>().await {
                    Ok(rows) => rows.into_iter().next(),
                    Err(e) => {
                        log::error!("update_status: {}: bad response body: {}", id, e);
                        None
                    }
                }
            }
            Ok(response) => {
                log::error!(
                    "update_status: {}: backend responded {}",
                    id,
                    response.status()
                );
                None
            }
            Err(e) => {
                log::error!("update_status: {}: {}", id, e);
                None
            }
        }
    }

    async fn delete_report(&self, id: &str) -> bool {
        let filter = format!("eq.{}", id);
        let result = self
            .auth(self.http.delete(self.table_url()))
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=representation")
            .send()
            .await;

        // The backend replies 200 even when nothing matched; the returned
        // rows tell whether anything was actually removed.
        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<Vec<Report>>().await {
                    Ok(rows) => !rows.is_empty(),
                    Err(e) => {
                        log::error!("delete_report: {}: bad response body: {}", id, e);
                        false
                    }
                }
            }
            Ok(response) => {
                log::error!(
                    "delete_report: {}: backend responded {}",
                    id,
                    response.status()
                );
                false
            }
            Err(e) => {
                log::error!("delete_report: {}: {}", id, e);
                false
            }
        }
    }
}
