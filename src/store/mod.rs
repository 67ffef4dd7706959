//! Backend data gateway.
//!
//! All persistence is delegated to a managed Supabase-style service: one
//! `reports` table behind PostgREST and one object-storage bucket. The
//! rest of the application only sees the `ReportStore` trait and the
//! config-keyed `StoreHandle`.

pub mod handle;
pub mod supabase;

pub use handle::StoreHandle;
pub use supabase::SupabaseStore;

use crate::report::{Category, Report, ReportStatus};
use async_trait::async_trait;

/// Store operation errors.
#[derive(Debug)]
pub enum StoreError {
    /// Missing or placeholder credentials. Raised at construction, before
    /// any network traffic.
    Configuration(String),
    /// The backend reports that the reports table does not exist.
    SchemaMissing,
    /// Network or service failure.
    Request(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            StoreError::SchemaMissing => write!(f, "Backend table is missing"),
            StoreError::Request(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Fields of a report about to be created. The store assigns `id`,
/// `status` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub description: String,
    pub category: Option<Category>,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub username: Option<String>,
}

/// Narrow client interface over the external persistence/storage service.
///
/// Every call is a network round trip and may fail independently. Read
/// operations swallow failures (logged, `None`/empty returned) so that
/// moderation views degrade instead of erroring.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Store a binary asset under a fresh collision-resistant key and
    /// return its public URL. Failures are logged and yield `None`; an
    /// upload failure never aborts the surrounding submission.
    async fn upload_asset(
        &self,
        data: Vec<u8>,
        content_type: &str,
        original_name: &str,
    ) -> Option<String>;

    /// Persist a new report with `status = new` and a server-assigned id.
    async fn create_report(&self, new: NewReport) -> Result<Report, StoreError>;

    /// All reports, newest first. Empty on read failure.
    async fn list_reports(&self) -> Vec<Report>;

    /// One report by id. `None` when absent or on error.
    async fn get_report(&self, id: &str) -> Option<Report>;

    /// Update the status of a report. `None` on failure or when no record
    /// matched.
    async fn update_status(&self, id: &str, status: ReportStatus) -> Option<Report>;

    /// Delete a report. `false` on any failure.
    async fn delete_report(&self, id: &str) -> bool;
}
