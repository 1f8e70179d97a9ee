//! In-memory fixture implementation of the content client.
//!
//! Used for standalone development and tests where no backend is running.
//! The store lives behind a `RwLock`; mutations are applied in place and
//! every return value is an owned clone, so callers never observe shared
//! mutable state. Each call sleeps for a fixed latency before touching the
//! store to keep caller-side timing realistic.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::error::ContentError;
use crate::types::{AnalyticsPeriod, ContentPatch, Section, Service, SiteSettings, UploadReceipt};
use crate::ContentApi;

/// Per-call artificial latency of the fixture client.
pub const FIXTURE_LATENCY: Duration = Duration::from_millis(500);

#[derive(Debug)]
struct FixtureStore {
    sections: Vec<Section>,
    services: Vec<Service>,
    settings: SiteSettings,
}

/// Content client backed by an in-memory fixture store.
///
/// Cloning shares the underlying store, mirroring how two handles to the
/// real backend would observe the same data.
#[derive(Debug, Clone)]
pub struct FixtureContentClient {
    store: Arc<RwLock<FixtureStore>>,
    latency: Duration,
}

impl FixtureContentClient {
    /// Create a fixture client seeded with the default landing-page
    /// sections, services, and settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_latency(FIXTURE_LATENCY)
    }

    /// Create a seeded fixture client with a custom per-call latency.
    /// Tests pass `Duration::ZERO` to avoid slow runs.
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            store: Arc::new(RwLock::new(seed_store())),
            latency,
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for FixtureContentClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ContentApi for FixtureContentClient {
    async fn list_sections(&self) -> Result<Vec<Section>, ContentError> {
        self.simulate_latency().await;
        let store = self.store.read().await;
        Ok(store.sections.clone())
    }

    async fn update_section(
        &self,
        id: &str,
        patch: &ContentPatch,
    ) -> Result<Section, ContentError> {
        self.simulate_latency().await;
        let mut store = self.store.write().await;
        let Some(section) = store.sections.iter_mut().find(|s| s.id == id) else {
            error!(id, "fixture update_section: section not found");
            return Err(ContentError::NotFound {
                entity: "section",
                id: id.to_owned(),
            });
        };
        for (field, value) in patch {
            section.content.insert(field.clone(), value.clone());
        }
        section.updated_at = Utc::now();
        debug!(id, fields = patch.len(), "fixture section updated");
        Ok(section.clone())
    }

    async fn create_section(
        &self,
        section: &str,
        content: &ContentPatch,
    ) -> Result<Section, ContentError> {
        self.simulate_latency().await;
        let mut store = self.store.write().await;
        let created = Section {
            id: uuid::Uuid::new_v4().to_string(),
            section: section.to_owned(),
            content: content.clone(),
            updated_at: Utc::now(),
        };
        store.sections.push(created.clone());
        Ok(created)
    }

    async fn delete_section(&self, id: &str) -> Result<(), ContentError> {
        self.simulate_latency().await;
        let mut store = self.store.write().await;
        let before = store.sections.len();
        store.sections.retain(|s| s.id != id);
        if store.sections.len() == before {
            error!(id, "fixture delete_section: section not found");
            return Err(ContentError::NotFound {
                entity: "section",
                id: id.to_owned(),
            });
        }
        Ok(())
    }

    async fn list_services(&self) -> Result<Vec<Service>, ContentError> {
        self.simulate_latency().await;
        let store = self.store.read().await;
        Ok(store.services.clone())
    }

    async fn update_service(
        &self,
        id: &str,
        patch: &ContentPatch,
    ) -> Result<Service, ContentError> {
        self.simulate_latency().await;
        let mut store = self.store.write().await;
        let Some(service) = store.services.iter_mut().find(|s| s.id == id) else {
            error!(id, "fixture update_service: service not found");
            return Err(ContentError::NotFound {
                entity: "service",
                id: id.to_owned(),
            });
        };
        apply_service_patch(service, patch);
        service.updated_at = Utc::now();
        Ok(service.clone())
    }

    async fn toggle_service(&self, id: &str, active: bool) -> Result<Service, ContentError> {
        self.simulate_latency().await;
        let mut store = self.store.write().await;
        let Some(service) = store.services.iter_mut().find(|s| s.id == id) else {
            error!(id, "fixture toggle_service: service not found");
            return Err(ContentError::NotFound {
                entity: "service",
                id: id.to_owned(),
            });
        };
        service.active = active;
        service.updated_at = Utc::now();
        Ok(service.clone())
    }

    async fn get_settings(&self) -> Result<SiteSettings, ContentError> {
        self.simulate_latency().await;
        let store = self.store.read().await;
        Ok(store.settings.clone())
    }

    async fn update_settings(&self, patch: &ContentPatch) -> Result<SiteSettings, ContentError> {
        self.simulate_latency().await;
        let mut store = self.store.write().await;
        for (field, value) in patch {
            match (field.as_str(), value) {
                ("siteName", Value::String(v)) => store.settings.site_name = v.clone(),
                ("contactEmail", Value::String(v)) => store.settings.contact_email = v.clone(),
                ("contactPhone", Value::String(v)) => store.settings.contact_phone = v.clone(),
                ("social", Value::Object(v)) => store.settings.social = v.clone(),
                ("maintenanceMode", Value::Bool(v)) => store.settings.maintenance_mode = *v,
                _ => debug!(field, "fixture update_settings: ignoring unknown field"),
            }
        }
        Ok(store.settings.clone())
    }

    async fn analytics(&self, period: AnalyticsPeriod) -> Result<Value, ContentError> {
        self.simulate_latency().await;
        Ok(json!({
            "period": period.as_query(),
            "visitors": 1280,
            "pageViews": 4312,
            "contactSubmissions": 37,
        }))
    }

    async fn upload(
        &self,
        filename: &str,
        _bytes: Vec<u8>,
        kind: &str,
    ) -> Result<UploadReceipt, ContentError> {
        self.simulate_latency().await;
        let id = uuid::Uuid::new_v4().to_string();
        Ok(UploadReceipt {
            url: format!("https://cdn.example.com/{kind}/{id}/{filename}"),
            id,
        })
    }

    async fn export(&self, kind: &str) -> Result<Value, ContentError> {
        self.simulate_latency().await;
        let store = self.store.read().await;
        let data = match kind {
            "sections" => serde_json::to_value(&store.sections)?,
            "services" => serde_json::to_value(&store.services)?,
            _ => json!({
                "sections": store.sections,
                "services": store.services,
                "settings": store.settings,
            }),
        };
        Ok(json!({ "type": kind, "data": data }))
    }

    async fn import(&self, payload: &Value) -> Result<Value, ContentError> {
        self.simulate_latency().await;
        let mut store = self.store.write().await;
        let mut imported = 0;
        if let Some(sections) = payload.get("data").and_then(|d| d.get("sections")) {
            if let Ok(sections) = serde_json::from_value::<Vec<Section>>(sections.clone()) {
                imported = sections.len();
                store.sections = sections;
            }
        }
        Ok(json!({ "imported": imported }))
    }
}

fn apply_service_patch(service: &mut Service, patch: &Map<String, Value>) {
    for (field, value) in patch {
        match (field.as_str(), value) {
            ("title", Value::String(v)) => service.title = v.clone(),
            ("description", Value::String(v)) => service.description = v.clone(),
            ("icon", Value::String(v)) => service.icon = v.clone(),
            ("active", Value::Bool(v)) => service.active = *v,
            ("order", Value::Number(v)) => {
                if let Some(n) = v.as_i64() {
                    service.order = n;
                }
            }
            _ => debug!(field, "fixture update_service: ignoring unknown field"),
        }
    }
}

fn seed_timestamp() -> DateTime<Utc> {
    // A fixed point well in the past, so any write visibly bumps it.
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now)
}

fn content(pairs: &[(&str, Value)]) -> ContentPatch {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

fn seed_store() -> FixtureStore {
    let ts = seed_timestamp();
    let sections = vec![
        Section {
            id: "1".to_owned(),
            section: "hero".to_owned(),
            content: content(&[
                ("title", json!("Confidence in every decision")),
                ("subtitle", json!("Advisory, planning, and wealth management")),
                ("buttonText", json!("Book a consultation")),
                ("image", json!("/assets/hero.jpg")),
                ("visible", json!(true)),
                ("order", json!(1)),
            ]),
            updated_at: ts,
        },
        Section {
            id: "2".to_owned(),
            section: "services".to_owned(),
            content: content(&[
                ("title", json!("What we do")),
                ("subtitle", json!("Services built around your goals")),
                ("visible", json!(true)),
                ("order", json!(2)),
            ]),
            updated_at: ts,
        },
        Section {
            id: "3".to_owned(),
            section: "testimonials".to_owned(),
            content: content(&[
                ("title", json!("What clients say")),
                ("visible", json!(true)),
                ("order", json!(3)),
            ]),
            updated_at: ts,
        },
        Section {
            id: "4".to_owned(),
            section: "features".to_owned(),
            content: content(&[
                ("title", json!("Why Crest")),
                ("description", json!("Licensed advisors, transparent fees")),
                ("visible", json!(true)),
                ("order", json!(4)),
            ]),
            updated_at: ts,
        },
        Section {
            id: "5".to_owned(),
            section: "contact".to_owned(),
            content: content(&[
                ("title", json!("Talk to us")),
                ("buttonText", json!("Send message")),
                ("visible", json!(true)),
                ("order", json!(5)),
            ]),
            updated_at: ts,
        },
    ];

    let services = vec![
        Service {
            id: "1".to_owned(),
            title: "Financial planning".to_owned(),
            description: "Long-term plans tailored to your life stage".to_owned(),
            icon: "chart".to_owned(),
            active: true,
            order: 1,
            updated_at: ts,
        },
        Service {
            id: "2".to_owned(),
            title: "Investment advisory".to_owned(),
            description: "Portfolio construction and review".to_owned(),
            icon: "trending-up".to_owned(),
            active: true,
            order: 2,
            updated_at: ts,
        },
        Service {
            id: "3".to_owned(),
            title: "Retirement accounts".to_owned(),
            description: "Pension and savings products".to_owned(),
            icon: "shield".to_owned(),
            active: false,
            order: 3,
            updated_at: ts,
        },
    ];

    let settings = SiteSettings {
        site_name: "Crest Financial".to_owned(),
        contact_email: "hello@crest.example".to_owned(),
        contact_phone: "+971 4 000 0000".to_owned(),
        social: Map::new(),
        maintenance_mode: false,
    };

    FixtureStore {
        sections,
        services,
        settings,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn client() -> FixtureContentClient {
        FixtureContentClient::with_latency(Duration::ZERO)
    }

    #[test]
    fn default_client_uses_published_latency() {
        assert_eq!(FixtureContentClient::new().latency, FIXTURE_LATENCY);
    }

    #[tokio::test]
    async fn list_sections_returns_seed_data() {
        let sections = client().list_sections().await.unwrap();
        assert_eq!(sections.len(), 5);
        assert_eq!(sections[0].section, "hero");
    }

    #[tokio::test]
    async fn update_section_merges_patch_and_bumps_timestamp() {
        let c = client();
        let before = c.list_sections().await.unwrap()[0].clone();

        let mut patch = ContentPatch::new();
        patch.insert("title".to_owned(), json!("X"));
        let updated = c.update_section("1", &patch).await.unwrap();

        assert_eq!(updated.content.get("title"), Some(&json!("X")));
        // Untouched fields survive the merge.
        assert_eq!(
            updated.content.get("buttonText"),
            before.content.get("buttonText")
        );
        assert!(updated.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn update_section_unknown_id_is_not_found() {
        let err = client()
            .update_section("999", &ContentPatch::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ContentError::NotFound { entity: "section", .. }
        ));
    }

    #[tokio::test]
    async fn update_service_unknown_id_is_not_found() {
        let mut patch = ContentPatch::new();
        patch.insert("title".to_owned(), json!("New"));
        let err = client().update_service("999", &patch).await.unwrap_err();
        assert!(matches!(
            err,
            ContentError::NotFound { entity: "service", .. }
        ));
    }

    #[tokio::test]
    async fn returned_sections_are_snapshots() {
        let c = client();
        let mut snapshot = c.list_sections().await.unwrap();
        snapshot[0].content.insert("title".to_owned(), json!("mutated"));

        let fresh = c.list_sections().await.unwrap();
        assert_ne!(fresh[0].content.get("title"), Some(&json!("mutated")));
    }

    #[tokio::test]
    async fn create_then_delete_section() {
        let c = client();
        let created = c
            .create_section("faq", &content(&[("title", json!("FAQ"))]))
            .await
            .unwrap();
        assert_eq!(c.list_sections().await.unwrap().len(), 6);

        c.delete_section(&created.id).await.unwrap();
        assert_eq!(c.list_sections().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn delete_unknown_section_is_not_found() {
        let err = client().delete_section("nope").await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { .. }));
    }

    #[tokio::test]
    async fn toggle_service_flips_active() {
        let c = client();
        let toggled = c.toggle_service("3", true).await.unwrap();
        assert!(toggled.active);
        let services = c.list_services().await.unwrap();
        assert!(services.iter().find(|s| s.id == "3").unwrap().active);
    }

    #[tokio::test]
    async fn update_settings_applies_known_fields() {
        let c = client();
        let mut patch = ContentPatch::new();
        patch.insert("siteName".to_owned(), json!("Crest"));
        patch.insert("maintenanceMode".to_owned(), json!(true));
        let settings = c.update_settings(&patch).await.unwrap();
        assert_eq!(settings.site_name, "Crest");
        assert!(settings.maintenance_mode);
    }

    #[tokio::test]
    async fn clone_shares_store() {
        let c = client();
        let clone = c.clone();

        let mut patch = ContentPatch::new();
        patch.insert("title".to_owned(), json!("shared"));
        c.update_section("1", &patch).await.unwrap();

        let seen = clone.list_sections().await.unwrap();
        assert_eq!(seen[0].content.get("title"), Some(&json!("shared")));
    }

    #[tokio::test]
    async fn export_wraps_requested_kind() {
        let exported = client().export("services").await.unwrap();
        assert_eq!(exported["type"], json!("services"));
        assert!(exported["data"].is_array());
    }
}
