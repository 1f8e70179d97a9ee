//! HTTP implementation of the content client.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::error;

use crate::error::ContentError;
use crate::types::{
    AnalyticsPeriod, ContentPatch, CreateSectionBody, Section, Service, SiteSettings,
    ToggleServiceBody, UpdateSectionBody, UploadReceipt,
};
use crate::ContentApi;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:4000/api";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`HttpContentClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// API base URL, without a trailing slash. Default:
    /// `http://127.0.0.1:4000/api`.
    pub base_url: String,
    /// Request timeout. Default: 10 seconds.
    pub timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Content client backed by the real admin API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpContentClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpContentClient {
    /// Create a client against the given base URL with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Config` if the base URL is empty.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ContentError> {
        Self::with_config(HttpClientConfig {
            base_url: base_url.into(),
            ..Default::default()
        })
    }

    /// Create a client from environment variables.
    ///
    /// `CREST_API_URL` overrides the default base URL.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Config` if the resolved base URL is empty.
    pub fn from_env() -> Result<Self, ContentError> {
        let base_url =
            std::env::var("CREST_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        Self::with_config(HttpClientConfig {
            base_url,
            ..Default::default()
        })
    }

    /// Create a client with full configuration.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Config` if the base URL is empty.
    pub fn with_config(cfg: HttpClientConfig) -> Result<Self, ContentError> {
        let base_url = cfg.base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(ContentError::Config(
                "missing API base URL — set CREST_API_URL or pass one explicitly".to_owned(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .user_agent(concat!("crest-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ContentError::Transport)?;

        Ok(Self { base_url, client })
    }

    // --- Private ---

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ContentError> {
        let url = format!("{}{path}", self.base_url);

        let mut req = self.client.request(method.clone(), &url);
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await.map_err(|e| {
            error!(%method, path, error = %e, "content request transport failure");
            ContentError::Transport(e)
        })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            error!(%method, path, status = status.as_u16(), "content request failed");
            return Err(ContentError::RequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(Value::Null).map_err(ContentError::Json);
        }

        let text = resp.text().await.map_err(|e| {
            error!(%method, path, error = %e, "failed to read response body");
            ContentError::Transport(e)
        })?;
        // DELETE responses may be empty.
        let text = if text.is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            error!(%method, path, error = %e, "failed to decode response body");
            ContentError::Json(e)
        })
    }
}

#[async_trait::async_trait]
impl ContentApi for HttpContentClient {
    async fn list_sections(&self) -> Result<Vec<Section>, ContentError> {
        self.request(Method::GET, "/admin/landing-page", None).await
    }

    async fn update_section(
        &self,
        id: &str,
        patch: &ContentPatch,
    ) -> Result<Section, ContentError> {
        let body = serde_json::to_value(UpdateSectionBody { content: patch })?;
        self.request(
            Method::PUT,
            &format!("/admin/landing-page/{id}"),
            Some(&body),
        )
        .await
    }

    async fn create_section(
        &self,
        section: &str,
        content: &ContentPatch,
    ) -> Result<Section, ContentError> {
        let body = serde_json::to_value(CreateSectionBody { section, content })?;
        self.request(Method::POST, "/admin/landing-page", Some(&body))
            .await
    }

    async fn delete_section(&self, id: &str) -> Result<(), ContentError> {
        let _: Value = self
            .request(Method::DELETE, &format!("/admin/landing-page/{id}"), None)
            .await?;
        Ok(())
    }

    async fn list_services(&self) -> Result<Vec<Service>, ContentError> {
        self.request(Method::GET, "/admin/services", None).await
    }

    async fn update_service(
        &self,
        id: &str,
        patch: &ContentPatch,
    ) -> Result<Service, ContentError> {
        let body = Value::Object(patch.clone());
        self.request(Method::PUT, &format!("/admin/services/{id}"), Some(&body))
            .await
    }

    async fn toggle_service(&self, id: &str, active: bool) -> Result<Service, ContentError> {
        let body = serde_json::to_value(ToggleServiceBody { active })?;
        self.request(
            Method::PATCH,
            &format!("/admin/services/{id}/toggle"),
            Some(&body),
        )
        .await
    }

    async fn get_settings(&self) -> Result<SiteSettings, ContentError> {
        self.request(Method::GET, "/admin/settings", None).await
    }

    async fn update_settings(&self, patch: &ContentPatch) -> Result<SiteSettings, ContentError> {
        let body = Value::Object(patch.clone());
        self.request(Method::PUT, "/admin/settings", Some(&body))
            .await
    }

    async fn analytics(&self, period: AnalyticsPeriod) -> Result<Value, ContentError> {
        self.request(
            Method::GET,
            &format!("/admin/analytics?period={}", period.as_query()),
            None,
        )
        .await
    }

    async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        kind: &str,
    ) -> Result<UploadReceipt, ContentError> {
        let url = format!("{}/admin/upload", self.base_url);
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_owned());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("type", kind.to_owned());

        let resp = self.client.post(&url).multipart(form).send().await.map_err(|e| {
            error!(filename, error = %e, "upload transport failure");
            ContentError::Transport(e)
        })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            error!(filename, status = status.as_u16(), "upload failed");
            return Err(ContentError::UploadFailed {
                status: status.as_u16(),
                message,
            });
        }

        resp.json().await.map_err(|e| {
            error!(filename, error = %e, "failed to decode upload response");
            ContentError::Transport(e)
        })
    }

    async fn export(&self, kind: &str) -> Result<Value, ContentError> {
        self.request(Method::GET, &format!("/admin/export?type={kind}"), None)
            .await
    }

    async fn import(&self, payload: &Value) -> Result<Value, ContentError> {
        self.request(Method::POST, "/admin/import", Some(payload))
            .await
    }
}
