//! Theme and language settings store.
//!
//! Two independent enumerations (theme, language) held in one store,
//! initialized once from persisted preferences or the system preference,
//! and mutated only through [`SettingsStore::set_theme`] /
//! [`SettingsStore::set_language`]. Both setters persist first and apply to
//! the document second, so the persisted value survives even when the
//! rendering environment is unavailable.
//!
//! All environment access goes through two injected traits:
//! [`PreferenceStore`] for the persisted key-value pair and
//! [`DocumentAdapter`] for document-level side effects. That keeps the
//! store fully testable without a real rendering environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::SettingsError;

/// Storage key for the persisted theme preference.
pub const THEME_KEY: &str = "theme";
/// Storage key for the persisted language preference.
pub const LANGUAGE_KEY: &str = "language";

/// Visual theme of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

/// Site locale. Arabic is the primary locale and renders right-to-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Ar,
    En,
}

impl Language {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::En => "en",
        }
    }

    /// Text direction for this locale.
    #[must_use]
    pub fn direction(self) -> TextDirection {
        match self {
            Self::Ar => TextDirection::Rtl,
            Self::En => TextDirection::Ltr,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "ar" => Some(Self::Ar),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

/// Text direction applied to the document root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Rtl,
    Ltr,
}

impl TextDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rtl => "rtl",
            Self::Ltr => "ltr",
        }
    }
}

/// Persisted key-value preference storage.
pub trait PreferenceStore: Send + Sync {
    /// Read a persisted value. `None` means the user never set one.
    fn get(&self, key: &str) -> Option<String>;

    /// Persist a value, overwriting any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] if the backing storage fails.
    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// Document-level side effects of settings changes.
pub trait DocumentAdapter: Send + Sync {
    /// Add or remove the dark class on the document root.
    fn set_dark_class(&self, on: bool);

    /// Set the document language and text direction attributes.
    fn set_language(&self, lang: &str, dir: TextDirection);

    /// Whether the system prefers a dark theme. `None` when the
    /// environment cannot tell.
    fn system_prefers_dark(&self) -> Option<bool>;
}

/// Preference store over an in-memory map. Used in tests and anywhere
/// persistence across runs is not wanted.
#[derive(Debug, Default)]
pub struct MemoryPrefs {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPrefs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPrefs {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_owned(), value.to_owned());
        }
        Ok(())
    }
}

/// Preference store persisted as a small JSON file.
#[derive(Debug)]
pub struct FilePrefs {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FilePrefs {
    /// Open (or create) the preference file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] if the file exists but cannot be read,
    /// or [`SettingsError::Json`] if it holds malformed JSON.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_owned();
        let values = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Open the preference file at the default location:
    /// `CREST_PREFS_PATH` if set, else `<config dir>/crest/prefs.json`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NoPath`] when no config directory exists and
    /// the environment variable is unset.
    pub fn open_default() -> Result<Self, SettingsError> {
        let path = match std::env::var("CREST_PREFS_PATH") {
            Ok(p) => PathBuf::from(p),
            Err(_) => dirs::config_dir()
                .map(|d| d.join("crest").join("prefs.json"))
                .ok_or_else(|| {
                    SettingsError::NoPath(
                        "no config directory — set CREST_PREFS_PATH".to_owned(),
                    )
                })?,
        };
        Self::open(path)
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl PreferenceStore for FilePrefs {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let snapshot = {
            let Ok(mut values) = self.values.lock() else {
                return Ok(());
            };
            values.insert(key.to_owned(), value.to_owned());
            values.clone()
        };
        self.flush(&snapshot)
    }
}

/// Document adapter for environments with no document at all (the CLI).
/// Side effects are logged and otherwise dropped.
#[derive(Debug, Default)]
pub struct NullDocument;

impl DocumentAdapter for NullDocument {
    fn set_dark_class(&self, on: bool) {
        debug!(dark = on, "document dark class (no-op)");
    }

    fn set_language(&self, lang: &str, dir: TextDirection) {
        debug!(lang, dir = dir.as_str(), "document language (no-op)");
    }

    fn system_prefers_dark(&self) -> Option<bool> {
        None
    }
}

/// Theme/language settings with persistence and live document application.
pub struct SettingsStore {
    prefs: Box<dyn PreferenceStore>,
    doc: Box<dyn DocumentAdapter>,
    theme: Theme,
    language: Language,
}

impl SettingsStore {
    /// Initialize from persisted preferences.
    ///
    /// Theme: persisted value if present, else the system preference, else
    /// light. Language: persisted value if present, else Arabic. Both are
    /// applied to the document immediately.
    pub fn init(prefs: Box<dyn PreferenceStore>, doc: Box<dyn DocumentAdapter>) -> Self {
        let theme = prefs
            .get(THEME_KEY)
            .and_then(|v| Theme::parse(&v))
            .unwrap_or_else(|| match doc.system_prefers_dark() {
                Some(true) => Theme::Dark,
                _ => Theme::Light,
            });

        let language = prefs
            .get(LANGUAGE_KEY)
            .and_then(|v| Language::parse(&v))
            .unwrap_or_default();

        doc.set_dark_class(theme == Theme::Dark);
        doc.set_language(language.as_str(), language.direction());

        debug!(theme = theme.as_str(), language = language.as_str(), "settings initialized");

        Self {
            prefs,
            doc,
            theme,
            language,
        }
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Set the theme: persist first, then apply the dark class.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the document is not touched in
    /// that case.
    pub fn set_theme(&mut self, theme: Theme) -> Result<(), SettingsError> {
        self.prefs.set(THEME_KEY, theme.as_str())?;
        self.theme = theme;
        self.doc.set_dark_class(theme == Theme::Dark);
        Ok(())
    }

    /// Set the language: persist first, then apply language and direction.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the document is not touched in
    /// that case.
    pub fn set_language(&mut self, language: Language) -> Result<(), SettingsError> {
        self.prefs.set(LANGUAGE_KEY, language.as_str())?;
        self.language = language;
        self.doc.set_language(language.as_str(), language.direction());
        Ok(())
    }

    /// React to a live system dark-mode preference change.
    ///
    /// Applies only while the user has never explicitly chosen a theme —
    /// the absence of a persisted value is the gate. Does not persist.
    pub fn on_system_theme_change(&mut self, prefers_dark: bool) {
        if self.prefs.get(THEME_KEY).is_some() {
            debug!("system theme change ignored: user preference persisted");
            return;
        }
        let theme = if prefers_dark { Theme::Dark } else { Theme::Light };
        if theme != self.theme {
            warn!(theme = theme.as_str(), "following system theme change");
            self.theme = theme;
            self.doc.set_dark_class(theme == Theme::Dark);
        }
    }
}
