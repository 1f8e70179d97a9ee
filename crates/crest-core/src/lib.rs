//! Core library for the Crest CMS admin toolkit.
//!
//! Contains the live editor controller (load, per-field edit accumulation,
//! dirty tracking, auto-save), the theme/language settings store, and the
//! section-kind registry that renders landing-page sections. This crate
//! consumes the content backend exclusively through the
//! [`ContentApi`](crest_client::ContentApi) trait and knows nothing about
//! HTTP.

pub mod editor;
pub mod error;
pub mod registry;
pub mod settings;

pub use editor::{spawn_autosave, Editor, SaveOutcome, AUTOSAVE_INTERVAL};
pub use error::SettingsError;
pub use registry::{RenderMode, SectionKind};
pub use settings::{
    DocumentAdapter, FilePrefs, Language, MemoryPrefs, NullDocument, PreferenceStore,
    SettingsStore, TextDirection, Theme,
};
