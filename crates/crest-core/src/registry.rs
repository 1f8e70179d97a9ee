//! Section-kind registry and renderers.
//!
//! Maps a section's logical key to a renderer. Dispatch is a closed enum
//! with an `Unknown` catch-all, so adding a section kind is a compile-time
//! exhaustiveness error everywhere a renderer is selected. Unknown keys
//! render a visible placeholder naming the key — content-model drift
//! between backend and client must be diagnosable, never silent.

use std::fmt::Write as _;

use crest_client::{ContentPatch, Section};

/// Logical kind of a landing-page section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
    Hero,
    Services,
    Testimonials,
    Features,
    Contact,
    /// A key this client has no renderer for.
    Unknown(String),
}

impl SectionKind {
    /// Resolve a backend logical key to a kind.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        match key {
            "hero" => Self::Hero,
            "services" => Self::Services,
            "testimonials" => Self::Testimonials,
            "features" => Self::Features,
            "contact" => Self::Contact,
            other => Self::Unknown(other.to_owned()),
        }
    }

    /// The logical key as the backend spells it.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Hero => "hero",
            Self::Services => "services",
            Self::Testimonials => "testimonials",
            Self::Features => "features",
            Self::Contact => "contact",
            Self::Unknown(key) => key,
        }
    }
}

impl From<&Section> for SectionKind {
    fn from(section: &Section) -> Self {
        Self::from_key(&section.section)
    }
}

/// Whether a section is rendered as static copy or as editable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    View,
    Edit,
}

/// Render one section with the given *effective* content — the shallow
/// merge of server content and unsaved edits, as produced by
/// [`Editor::effective_content`](crate::Editor::effective_content).
#[must_use]
pub fn render(section: &Section, effective: &ContentPatch, mode: RenderMode) -> String {
    let kind = SectionKind::from(section);
    match (&kind, mode) {
        (SectionKind::Unknown(key), _) => {
            format!("[no renderer for section kind '{key}' (id {})]\n", section.id)
        }
        (_, RenderMode::Edit) => render_edit(&kind, section, effective),
        (_, RenderMode::View) => render_view(&kind, effective),
    }
}

fn text<'a>(content: &'a ContentPatch, field: &str) -> &'a str {
    content.get(field).and_then(|v| v.as_str()).unwrap_or("")
}

fn render_view(kind: &SectionKind, content: &ContentPatch) -> String {
    let mut out = String::new();
    let title = text(content, "title");
    match kind {
        SectionKind::Hero => {
            let _ = writeln!(out, "== {title} ==");
            let subtitle = text(content, "subtitle");
            if !subtitle.is_empty() {
                let _ = writeln!(out, "{subtitle}");
            }
            let button = text(content, "buttonText");
            if !button.is_empty() {
                let _ = writeln!(out, "[{button}]");
            }
        }
        SectionKind::Services | SectionKind::Testimonials | SectionKind::Features => {
            let _ = writeln!(out, "-- {title} --");
            let description = text(content, "description");
            if !description.is_empty() {
                let _ = writeln!(out, "{description}");
            }
        }
        SectionKind::Contact => {
            let _ = writeln!(out, "-- {title} --");
            let button = text(content, "buttonText");
            if !button.is_empty() {
                let _ = writeln!(out, "[{button}]");
            }
        }
        SectionKind::Unknown(_) => {}
    }
    out
}

fn render_edit(kind: &SectionKind, section: &Section, effective: &ContentPatch) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {} (id {}) — editing", kind.key(), section.id);
    for (field, value) in effective {
        let edited = section.content.get(field) != Some(value);
        let marker = if edited { "*" } else { " " };
        let _ = writeln!(out, "{marker} {field} = {value}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn section(kind: &str, pairs: &[(&str, serde_json::Value)]) -> Section {
        Section {
            id: "1".to_owned(),
            section: kind.to_owned(),
            content: pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), v.clone()))
                .collect(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn known_keys_resolve() {
        assert_eq!(SectionKind::from_key("hero"), SectionKind::Hero);
        assert_eq!(SectionKind::from_key("contact"), SectionKind::Contact);
        assert_eq!(
            SectionKind::from_key("banner"),
            SectionKind::Unknown("banner".to_owned())
        );
    }

    #[test]
    fn unknown_kind_renders_placeholder_naming_the_key() {
        let s = section("banner", &[("title", json!("x"))]);
        let out = render(&s, &s.content, RenderMode::View);
        assert!(out.contains("banner"), "placeholder must name the key: {out}");
        assert!(out.contains("no renderer"));
    }

    #[test]
    fn hero_view_renders_copy() {
        let s = section(
            "hero",
            &[("title", json!("T")), ("buttonText", json!("Go"))],
        );
        let out = render(&s, &s.content, RenderMode::View);
        assert!(out.contains("== T =="));
        assert!(out.contains("[Go]"));
    }

    #[test]
    fn edit_mode_marks_unsaved_fields() {
        let s = section("hero", &[("title", json!("old"))]);
        let mut effective = s.content.clone();
        effective.insert("title".to_owned(), json!("new"));

        let out = render(&s, &effective, RenderMode::Edit);
        assert!(out.contains("* title = \"new\""));
    }
}
