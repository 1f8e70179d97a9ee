//! Typed client for the Crest CMS admin content API.
//!
//! This crate defines the [`ContentApi`] trait — the full admin surface of
//! the content backend (landing-page sections, services, site settings,
//! analytics, upload, export/import) — and two interchangeable
//! implementations:
//!
//! - [`HttpContentClient`] — production client over reqwest
//! - [`FixtureContentClient`] — in-memory stand-in with realistic latency,
//!   for standalone development and tests
//!
//! The editor controller in `crest-core` only ever sees the trait, so the
//! two can be swapped without touching any caller.

mod error;
mod fixture;
mod http;
mod types;

pub use error::ContentError;
pub use fixture::{FixtureContentClient, FIXTURE_LATENCY};
pub use http::{HttpClientConfig, HttpContentClient};
pub use types::{
    AnalyticsPeriod, ContentPatch, Section, Service, SiteSettings, UploadReceipt,
};

use serde_json::Value;

/// The admin content API, as consumed by the editor and the CLI.
///
/// All operations are async and non-blocking. Implementations must be safe
/// to share across tasks (`Send + Sync`); mutations must not leak shared
/// mutable state to callers — returned records are owned snapshots.
#[async_trait::async_trait]
pub trait ContentApi: Send + Sync + 'static {
    /// Fetch every landing-page section.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::RequestFailed`] on a non-2xx status or
    /// [`ContentError::Transport`] when the request never completes.
    async fn list_sections(&self) -> Result<Vec<Section>, ContentError>;

    /// Apply a partial content update to one section and return the section
    /// as stored by the backend. The patch contains only changed fields —
    /// the full content object is never required.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] (fixture) or
    /// [`ContentError::RequestFailed`] when the section does not exist.
    async fn update_section(
        &self,
        id: &str,
        patch: &ContentPatch,
    ) -> Result<Section, ContentError>;

    /// Create a new section with the given logical key and content.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the request.
    async fn create_section(
        &self,
        section: &str,
        content: &ContentPatch,
    ) -> Result<Section, ContentError>;

    /// Delete a section by id. Idempotent on the HTTP backend; the fixture
    /// reports [`ContentError::NotFound`] for unknown ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the request.
    async fn delete_section(&self, id: &str) -> Result<(), ContentError>;

    /// Fetch every service offering.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn list_services(&self) -> Result<Vec<Service>, ContentError>;

    /// Apply a partial update to one service.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] (fixture) or
    /// [`ContentError::RequestFailed`] when the service does not exist.
    async fn update_service(
        &self,
        id: &str,
        patch: &ContentPatch,
    ) -> Result<Service, ContentError>;

    /// Flip a service's visibility on the public site.
    ///
    /// # Errors
    ///
    /// Returns an error if the service does not exist or the request fails.
    async fn toggle_service(&self, id: &str, active: bool) -> Result<Service, ContentError>;

    /// Fetch the site-wide settings record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn get_settings(&self) -> Result<SiteSettings, ContentError>;

    /// Apply a partial update to the site-wide settings record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn update_settings(&self, patch: &ContentPatch) -> Result<SiteSettings, ContentError>;

    /// Fetch analytics for the given reporting window. The payload shape is
    /// backend-defined; callers treat it as opaque JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn analytics(&self, period: AnalyticsPeriod) -> Result<Value, ContentError>;

    /// Upload a file and return its public URL and id.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::UploadFailed`] on a non-2xx status.
    async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        kind: &str,
    ) -> Result<UploadReceipt, ContentError>;

    /// Export backend data of the given kind as opaque JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn export(&self, kind: &str) -> Result<Value, ContentError>;

    /// Import a previously exported payload. Returns the backend's summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn import(&self, payload: &Value) -> Result<Value, ContentError>;
}
