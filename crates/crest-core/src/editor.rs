//! Live editor controller.
//!
//! The only component that mutates the edit buffer and the only caller of
//! mutating section operations. Edits accumulate per section and field in
//! a buffer keyed by section id; a save flushes each buffered entry with
//! one sequential `update_section` call, then reloads authoritative server
//! state. Buffer clearing is all-or-nothing: if any call in the sequence
//! fails, the whole buffer (including entries already flushed) stays in
//! place so a retry resends everything rather than silently dropping edits.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crest_client::{ContentApi, ContentError, ContentPatch, Section};

/// Cadence of the auto-save worker. Also the retry cadence after a failed
/// save — there is no separate backoff.
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Result of a [`Editor::save`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Buffered edits were flushed and server state reloaded.
    Saved,
    /// Nothing was dirty; no network calls were made.
    Clean,
    /// Another save sequence is in flight; this call did nothing.
    AlreadySaving,
}

#[derive(Debug, Default)]
struct EditorState {
    sections: Vec<Section>,
    /// Unsaved field overrides keyed by section id. A `BTreeMap` gives the
    /// save sequence a deterministic apply order across sections.
    buffer: BTreeMap<String, ContentPatch>,
    dirty: bool,
    saving: bool,
    loading: bool,
    last_saved: Option<DateTime<Utc>>,
}

/// Controller for the admin live editor.
///
/// Cheap to clone; clones share state, mirroring one editor surface with
/// several entry points (manual save button, auto-save worker).
#[derive(Clone)]
pub struct Editor {
    client: Arc<dyn ContentApi>,
    state: Arc<Mutex<EditorState>>,
}

impl Editor {
    #[must_use]
    pub fn new(client: Arc<dyn ContentApi>) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(EditorState::default())),
        }
    }

    /// Fetch all sections and replace the local list wholesale.
    ///
    /// The edit buffer is untouched. Overlapping loads are not deduplicated;
    /// whichever response resolves last wins. The loading flag is cleared
    /// whether or not the fetch succeeds.
    ///
    /// # Errors
    ///
    /// Returns the client error after logging it. Previously loaded
    /// sections are kept on failure.
    pub async fn load(&self) -> Result<(), ContentError> {
        self.state.lock().await.loading = true;

        let result = self.client.list_sections().await;

        let mut state = self.state.lock().await;
        state.loading = false;
        match result {
            Ok(sections) => {
                debug!(count = sections.len(), "sections loaded");
                state.sections = sections;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to load sections");
                Err(e)
            }
        }
    }

    /// Merge `{field: value}` into the buffer entry for `section_id`,
    /// creating the entry on first edit, and mark the editor dirty.
    pub async fn record_edit(&self, section_id: &str, field: &str, value: serde_json::Value) {
        let mut state = self.state.lock().await;
        state
            .buffer
            .entry(section_id.to_owned())
            .or_default()
            .insert(field.to_owned(), value);
        state.dirty = true;
    }

    /// Shallow merge of a section's server content with its buffered edits.
    ///
    /// Pure with respect to the section: the underlying record is never
    /// mutated, so renderers in edit mode reflect unsaved input without
    /// touching server state.
    pub async fn effective_content(&self, section: &Section) -> ContentPatch {
        let state = self.state.lock().await;
        merge_content(&section.content, state.buffer.get(&section.id))
    }

    /// Flush every buffered edit to the backend, one sequential
    /// `update_section` call per section, then reload.
    ///
    /// No-op when clean; refused while another save is in flight (explicit
    /// boolean guard — the timer and a manual save are not otherwise
    /// mutually excluded). On failure the buffer and dirty flag are left in
    /// their pre-save state so the next save retries everything.
    ///
    /// # Errors
    ///
    /// Returns the first client error in the sequence after logging it.
    pub async fn save(&self) -> Result<SaveOutcome, ContentError> {
        let snapshot = {
            let mut state = self.state.lock().await;
            if !state.dirty {
                return Ok(SaveOutcome::Clean);
            }
            if state.saving {
                debug!("save skipped: already saving");
                return Ok(SaveOutcome::AlreadySaving);
            }
            state.saving = true;
            state.buffer.clone()
        };

        for (section_id, patch) in &snapshot {
            if let Err(e) = self.client.update_section(section_id, patch).await {
                error!(section_id, error = %e, "save abandoned; buffered edits kept for retry");
                self.state.lock().await.saving = false;
                return Err(e);
            }
        }

        {
            let mut state = self.state.lock().await;
            state.buffer.clear();
            state.dirty = false;
            state.last_saved = Some(Utc::now());
            state.saving = false;
        }
        info!(sections = snapshot.len(), "saved");

        // Pull authoritative server state. A failure here is not a save
        // failure — the flush completed — so keep the previous sections
        // and surface it only in the log.
        if let Err(e) = self.load().await {
            warn!(error = %e, "reload after save failed");
        }

        Ok(SaveOutcome::Saved)
    }

    /// Snapshot of the currently loaded sections.
    pub async fn sections(&self) -> Vec<Section> {
        self.state.lock().await.sections.clone()
    }

    /// One loaded section by id, if present.
    pub async fn section(&self, id: &str) -> Option<Section> {
        let state = self.state.lock().await;
        state.sections.iter().find(|s| s.id == id).cloned()
    }

    pub async fn is_dirty(&self) -> bool {
        self.state.lock().await.dirty
    }

    pub async fn is_saving(&self) -> bool {
        self.state.lock().await.saving
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    pub async fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_saved
    }

    /// Number of sections with buffered, unsaved edits.
    pub async fn buffered_sections(&self) -> usize {
        self.state.lock().await.buffer.len()
    }
}

/// Shallow merge of server content with an optional buffered patch.
/// Buffered fields override; everything else passes through unchanged.
#[must_use]
pub fn merge_content(base: &ContentPatch, edits: Option<&ContentPatch>) -> ContentPatch {
    let mut merged = base.clone();
    if let Some(edits) = edits {
        for (field, value) in edits {
            merged.insert(field.clone(), value.clone());
        }
    }
    merged
}

/// Spawn the auto-save worker: every [`AUTOSAVE_INTERVAL`], save if dirty
/// and not already saving. The task ends when `shutdown` flips to `true`
/// or its sender is dropped, tying the worker to the owning scope.
pub fn spawn_autosave(editor: Editor, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(AUTOSAVE_INTERVAL);
        // The first tick completes immediately; consume it so the worker
        // only fires a full interval after spawn.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if editor.is_dirty().await && !editor.is_saving().await {
                        if let Err(e) = editor.save().await {
                            warn!(error = %e, "auto-save failed; will retry next interval");
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("auto-save worker stopping");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::{json, Value};

    use crest_client::{
        AnalyticsPeriod, FixtureContentClient, Service, SiteSettings, UploadReceipt,
    };

    /// Counts update calls and optionally fails the n-th one (1-based).
    struct CountingClient {
        inner: FixtureContentClient,
        update_calls: AtomicUsize,
        list_calls: AtomicUsize,
        fail_update_at: Option<usize>,
    }

    impl CountingClient {
        fn new(fail_update_at: Option<usize>) -> Self {
            Self {
                inner: FixtureContentClient::with_latency(Duration::ZERO),
                update_calls: AtomicUsize::new(0),
                list_calls: AtomicUsize::new(0),
                fail_update_at,
            }
        }
    }

    #[async_trait::async_trait]
    impl ContentApi for CountingClient {
        async fn list_sections(&self) -> Result<Vec<Section>, ContentError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list_sections().await
        }

        async fn update_section(
            &self,
            id: &str,
            patch: &ContentPatch,
        ) -> Result<Section, ContentError> {
            let n = self.update_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_update_at == Some(n) {
                return Err(ContentError::RequestFailed {
                    status: 500,
                    message: "injected failure".to_owned(),
                });
            }
            self.inner.update_section(id, patch).await
        }

        async fn create_section(
            &self,
            section: &str,
            content: &ContentPatch,
        ) -> Result<Section, ContentError> {
            self.inner.create_section(section, content).await
        }

        async fn delete_section(&self, id: &str) -> Result<(), ContentError> {
            self.inner.delete_section(id).await
        }

        async fn list_services(&self) -> Result<Vec<Service>, ContentError> {
            self.inner.list_services().await
        }

        async fn update_service(
            &self,
            id: &str,
            patch: &ContentPatch,
        ) -> Result<Service, ContentError> {
            self.inner.update_service(id, patch).await
        }

        async fn toggle_service(&self, id: &str, active: bool) -> Result<Service, ContentError> {
            self.inner.toggle_service(id, active).await
        }

        async fn get_settings(&self) -> Result<SiteSettings, ContentError> {
            self.inner.get_settings().await
        }

        async fn update_settings(
            &self,
            patch: &ContentPatch,
        ) -> Result<SiteSettings, ContentError> {
            self.inner.update_settings(patch).await
        }

        async fn analytics(&self, period: AnalyticsPeriod) -> Result<Value, ContentError> {
            self.inner.analytics(period).await
        }

        async fn upload(
            &self,
            filename: &str,
            bytes: Vec<u8>,
            kind: &str,
        ) -> Result<UploadReceipt, ContentError> {
            self.inner.upload(filename, bytes, kind).await
        }

        async fn export(&self, kind: &str) -> Result<Value, ContentError> {
            self.inner.export(kind).await
        }

        async fn import(&self, payload: &Value) -> Result<Value, ContentError> {
            self.inner.import(payload).await
        }
    }

    fn editor_with(client: CountingClient) -> (Editor, Arc<CountingClient>) {
        let client = Arc::new(client);
        (Editor::new(Arc::clone(&client) as Arc<dyn ContentApi>), client)
    }

    #[tokio::test]
    async fn effective_content_overrides_without_mutating_section() {
        let (editor, _) = editor_with(CountingClient::new(None));
        editor.load().await.unwrap();

        let section = editor.section("1").await.unwrap();
        let original_title = section.content.get("title").cloned();

        editor.record_edit("1", "title", json!("Edited")).await;
        editor.record_edit("1", "subtitle", json!("Also edited")).await;

        let effective = editor.effective_content(&section).await;
        assert_eq!(effective.get("title"), Some(&json!("Edited")));
        assert_eq!(effective.get("subtitle"), Some(&json!("Also edited")));
        // Fields without edits pass through.
        assert_eq!(effective.get("buttonText"), section.content.get("buttonText"));

        // The section record itself is untouched until a save round-trips.
        let reread = editor.section("1").await.unwrap();
        assert_eq!(reread.content.get("title"), original_title.as_ref());
    }

    #[tokio::test]
    async fn later_edit_to_same_field_overwrites() {
        let (editor, _) = editor_with(CountingClient::new(None));
        editor.load().await.unwrap();

        editor.record_edit("1", "title", json!("first")).await;
        editor.record_edit("1", "title", json!("second")).await;

        let section = editor.section("1").await.unwrap();
        let effective = editor.effective_content(&section).await;
        assert_eq!(effective.get("title"), Some(&json!("second")));
        assert_eq!(editor.buffered_sections().await, 1);
    }

    #[tokio::test]
    async fn save_when_clean_is_a_no_op() {
        let (editor, client) = editor_with(CountingClient::new(None));
        editor.load().await.unwrap();

        let outcome = editor.save().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Clean);
        assert_eq!(client.update_calls.load(Ordering::SeqCst), 0);
        assert_eq!(editor.last_saved().await, None);
    }

    #[tokio::test]
    async fn successful_save_clears_buffer_and_reloads() {
        let (editor, client) = editor_with(CountingClient::new(None));
        editor.load().await.unwrap();
        let loads_before = client.list_calls.load(Ordering::SeqCst);

        editor.record_edit("1", "title", json!("X")).await;
        editor.record_edit("2", "title", json!("Y")).await;

        let outcome = editor.save().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);

        assert!(!editor.is_dirty().await);
        assert_eq!(editor.buffered_sections().await, 0);
        assert!(editor.last_saved().await.is_some());
        // One update per buffered section, then a reload.
        assert_eq!(client.update_calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.list_calls.load(Ordering::SeqCst), loads_before + 1);

        // The reloaded list reflects the flushed edit.
        let section = editor.section("1").await.unwrap();
        assert_eq!(section.content.get("title"), Some(&json!("X")));
    }

    #[tokio::test]
    async fn failed_save_keeps_whole_buffer_and_dirty_flag() {
        // Fail the second of three updates.
        let (editor, client) = editor_with(CountingClient::new(Some(2)));
        editor.load().await.unwrap();
        let loads_before = client.list_calls.load(Ordering::SeqCst);

        editor.record_edit("1", "title", json!("A")).await;
        editor.record_edit("2", "title", json!("B")).await;
        editor.record_edit("3", "title", json!("C")).await;

        let err = editor.save().await.unwrap_err();
        assert!(matches!(err, ContentError::RequestFailed { status: 500, .. }));

        // All three entries survive — including the one already flushed —
        // so a retry cannot silently drop edits.
        assert_eq!(editor.buffered_sections().await, 3);
        assert!(editor.is_dirty().await);
        assert!(!editor.is_saving().await);
        assert_eq!(editor.last_saved().await, None);
        // No reload on failure.
        assert_eq!(client.list_calls.load(Ordering::SeqCst), loads_before);

        // A retry flushes everything again.
        let outcome = editor.save().await.unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);
        assert_eq!(editor.buffered_sections().await, 0);
    }

    #[tokio::test]
    async fn load_failure_keeps_previous_sections() {
        let (editor, _) = editor_with(CountingClient::new(None));
        editor.load().await.unwrap();
        let before = editor.sections().await;
        assert!(!before.is_empty());

        // A client whose list always fails.
        struct FailingList(CountingClient);
        #[async_trait::async_trait]
        impl ContentApi for FailingList {
            async fn list_sections(&self) -> Result<Vec<Section>, ContentError> {
                Err(ContentError::RequestFailed {
                    status: 503,
                    message: "down".to_owned(),
                })
            }
            async fn update_section(
                &self,
                id: &str,
                patch: &ContentPatch,
            ) -> Result<Section, ContentError> {
                self.0.update_section(id, patch).await
            }
            async fn create_section(
                &self,
                section: &str,
                content: &ContentPatch,
            ) -> Result<Section, ContentError> {
                self.0.create_section(section, content).await
            }
            async fn delete_section(&self, id: &str) -> Result<(), ContentError> {
                self.0.delete_section(id).await
            }
            async fn list_services(&self) -> Result<Vec<Service>, ContentError> {
                self.0.list_services().await
            }
            async fn update_service(
                &self,
                id: &str,
                patch: &ContentPatch,
            ) -> Result<Service, ContentError> {
                self.0.update_service(id, patch).await
            }
            async fn toggle_service(
                &self,
                id: &str,
                active: bool,
            ) -> Result<Service, ContentError> {
                self.0.toggle_service(id, active).await
            }
            async fn get_settings(&self) -> Result<SiteSettings, ContentError> {
                self.0.get_settings().await
            }
            async fn update_settings(
                &self,
                patch: &ContentPatch,
            ) -> Result<SiteSettings, ContentError> {
                self.0.update_settings(patch).await
            }
            async fn analytics(&self, period: AnalyticsPeriod) -> Result<Value, ContentError> {
                self.0.analytics(period).await
            }
            async fn upload(
                &self,
                filename: &str,
                bytes: Vec<u8>,
                kind: &str,
            ) -> Result<UploadReceipt, ContentError> {
                self.0.upload(filename, bytes, kind).await
            }
            async fn export(&self, kind: &str) -> Result<Value, ContentError> {
                self.0.export(kind).await
            }
            async fn import(&self, payload: &Value) -> Result<Value, ContentError> {
                self.0.import(payload).await
            }
        }

        let failing = Editor::new(Arc::new(FailingList(CountingClient::new(None))));
        assert!(failing.load().await.is_err());
        assert!(!failing.is_loading().await);
        assert!(failing.sections().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn autosave_fires_only_while_dirty() {
        let (editor, client) = editor_with(CountingClient::new(None));
        editor.load().await.unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_autosave(editor.clone(), shutdown_rx);

        // Clean: a full interval passes with no save.
        tokio::time::sleep(AUTOSAVE_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(client.update_calls.load(Ordering::SeqCst), 0);

        // Dirty: the next tick saves.
        editor.record_edit("1", "title", json!("auto")).await;
        tokio::time::sleep(AUTOSAVE_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(client.update_calls.load(Ordering::SeqCst), 1);
        assert!(!editor.is_dirty().await);

        // Clean again: further ticks stay quiet until a new edit.
        tokio::time::sleep(AUTOSAVE_INTERVAL * 2).await;
        assert_eq!(client.update_calls.load(Ordering::SeqCst), 1);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn merge_content_is_pure() {
        let mut base = ContentPatch::new();
        base.insert("title".to_owned(), json!("base"));
        base.insert("order".to_owned(), json!(1));

        let mut edits = ContentPatch::new();
        edits.insert("title".to_owned(), json!("edited"));

        let merged = merge_content(&base, Some(&edits));
        assert_eq!(merged.get("title"), Some(&json!("edited")));
        assert_eq!(merged.get("order"), Some(&json!(1)));
        assert_eq!(base.get("title"), Some(&json!("base")));

        assert_eq!(merge_content(&base, None), base);
    }
}
