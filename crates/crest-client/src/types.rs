//! Wire types for the Crest admin content API.
//!
//! Field names follow the backend's camelCase convention. `content` on a
//! [`Section`] is deliberately an open map — the backend does not enforce a
//! schema per section kind, so the client does not either. Renderers read
//! the keys they know about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A partial field-update map, as sent to the update endpoints.
pub type ContentPatch = Map<String, Value>;

/// A named, independently editable block of landing-page content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Unique identifier assigned by the backend.
    pub id: String,
    /// Logical key selecting a renderer (`hero`, `services`, ...). Unique by
    /// convention only.
    pub section: String,
    /// Open field map: title, subtitle, description, button text, image
    /// reference, visibility flag, display order — all optional.
    #[serde(default)]
    pub content: ContentPatch,
    /// Last-persisted timestamp, set by the backend on every write.
    pub updated_at: DateTime<Utc>,
}

/// A service offering shown on the public site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    /// Whether the service is visible on the public site.
    pub active: bool,
    /// Display order, ascending.
    #[serde(default)]
    pub order: i64,
    pub updated_at: DateTime<Utc>,
}

/// Site-wide settings record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
    /// Social links keyed by platform name.
    #[serde(default)]
    pub social: Map<String, Value>,
    #[serde(default)]
    pub maintenance_mode: bool,
}

/// Result of a successful file upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Public URL of the stored file.
    pub url: String,
    /// Backend identifier for the upload.
    pub id: String,
}

/// Reporting window accepted by the analytics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsPeriod {
    /// Last 7 days.
    Week,
    /// Last 30 days.
    Month,
    /// Last 90 days.
    Quarter,
}

impl AnalyticsPeriod {
    /// The query-string value the backend expects.
    #[must_use]
    pub fn as_query(self) -> &'static str {
        match self {
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
        }
    }
}

impl std::str::FromStr for AnalyticsPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(Self::Week),
            "30d" => Ok(Self::Month),
            "90d" => Ok(Self::Quarter),
            other => Err(format!("unknown analytics period '{other}' (expected 7d, 30d, or 90d)")),
        }
    }
}

impl std::fmt::Display for AnalyticsPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query())
    }
}

// --- Request bodies ---

/// Body for `PUT /admin/landing-page/{id}` — only the changed fields.
#[derive(Debug, Serialize)]
pub(crate) struct UpdateSectionBody<'a> {
    pub content: &'a ContentPatch,
}

/// Body for `POST /admin/landing-page` — a section minus id and timestamp.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSectionBody<'a> {
    pub section: &'a str,
    pub content: &'a ContentPatch,
}

/// Body for `PATCH /admin/services/{id}/toggle`.
#[derive(Debug, Serialize)]
pub(crate) struct ToggleServiceBody {
    pub active: bool,
}
