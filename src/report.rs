//! The report domain entity and its enumerations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Moderation status of a report. Defaults to `New` at creation and is
/// only ever changed by staff action. Transitions are unconstrained among
/// the three values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    New,
    Reviewed,
    Archived,
}

impl ReportStatus {
    /// Parse a form value. Returns `None` for anything outside the
    /// fixed set, leaving the caller to reject the request.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Self::New),
            "reviewed" => Some(Self::Reviewed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reviewed => "reviewed",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed report categories offered on the submission form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Safety,
    Infrastructure,
    Environmental,
    Misconduct,
    Other,
}

impl Category {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "safety" => Some(Self::Safety),
            "infrastructure" => Some(Self::Infrastructure),
            "environmental" => Some(Self::Environmental),
            "misconduct" => Some(Self::Misconduct),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safety => "safety",
            Self::Infrastructure => "infrastructure",
            Self::Environmental => "environmental",
            Self::Misconduct => "misconduct",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single citizen-submitted incident record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Opaque unique identifier, assigned by the store at creation.
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub location: Option<String>,
    /// Informational only, never used for identity.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub status: ReportStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Timestamp (de)serialization for the backend wire format.
///
/// Serialized as RFC 3339. The deserializer also accepts offset-less ISO
/// timestamps, which is what older rows in the backing table carry.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad timestamp: {}", raw)))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Order reports newest first, regardless of how the backend returned them.
pub fn sort_newest_first(reports: &mut [Report]) {
    reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Format a timestamp for moderation views.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}
