//! Crest CLI — terminal admin surface for the Crest CMS.
//!
//! Talks to the content backend through the `ContentApi` trait, so every
//! command works identically against the real HTTP API (`--api-url`) or the
//! in-memory fixture (`--fixture`). The `edit` command runs the live editor
//! controller with its 30-second auto-save worker.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod session;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use crest_client::{
    AnalyticsPeriod, ContentApi, ContentPatch, FixtureContentClient, HttpContentClient,
};
use crest_core::{
    FilePrefs, Language, NullDocument, SettingsStore, Theme,
};

/// Crest — admin toolkit for the Crest CMS landing page.
#[derive(Parser)]
#[command(
    name = "crest",
    version,
    about = "Crest CLI — manage landing-page sections, services, and site settings",
    long_about = None,
    after_help = "Environment variables:\n  \
         CREST_API_URL      Content API base URL (default: http://127.0.0.1:4000/api)\n  \
         CREST_PREFS_PATH   Theme/language preference file\n  \
         CREST_LOG_LEVEL    Log filter (default: warn)\n\n\
         Examples:\n  \
         crest sections list\n  \
         crest --fixture edit\n  \
         crest services toggle 3 --active\n  \
         crest theme set dark",
)]
struct Cli {
    /// Content API base URL.
    #[arg(long, env = "CREST_API_URL", default_value = "http://127.0.0.1:4000/api")]
    api_url: String,

    /// Use the in-memory fixture backend instead of the HTTP API.
    #[arg(long, default_value = "false")]
    fixture: bool,

    /// Log filter.
    #[arg(long, env = "CREST_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Landing-page section commands.
    Sections {
        #[command(subcommand)]
        action: SectionCommands,
    },
    /// Service offering commands.
    Services {
        #[command(subcommand)]
        action: ServiceCommands,
    },
    /// Site-wide settings commands.
    Settings {
        #[command(subcommand)]
        action: SettingsCommands,
    },
    /// Fetch analytics for a reporting window.
    Analytics {
        /// Reporting window: 7d, 30d, or 90d.
        #[arg(long, default_value = "7d")]
        period: AnalyticsPeriod,
    },
    /// Upload a file to the media store.
    Upload {
        /// Path of the file to upload.
        file: String,
        /// Upload kind (image, document, ...).
        #[arg(long, default_value = "image")]
        kind: String,
    },
    /// Export backend data as JSON.
    Export {
        /// Data kind: sections, services, or all.
        #[arg(long, default_value = "all")]
        kind: String,
    },
    /// Import a previously exported JSON payload.
    Import {
        /// Path of the JSON file to import.
        file: String,
    },
    /// Get or set the admin theme preference.
    Theme {
        #[command(subcommand)]
        action: ThemeCommands,
    },
    /// Get or set the admin language preference.
    Lang {
        #[command(subcommand)]
        action: LangCommands,
    },
    /// Interactive live-editing session with auto-save.
    Edit,
}

#[derive(Subcommand)]
enum SectionCommands {
    /// List all sections.
    List,
    /// Show one section, rendered.
    Show {
        id: String,
        /// Render editable fields instead of static copy.
        #[arg(long, default_value = "false")]
        edit: bool,
    },
    /// Create a section from a JSON content object.
    Create {
        /// Logical key (hero, services, ...).
        section: String,
        /// Content as a JSON object, e.g. '{"title": "Hi"}'.
        #[arg(default_value = "{}")]
        content: String,
    },
    /// Delete a section by id.
    Delete { id: String },
}

#[derive(Subcommand)]
enum ServiceCommands {
    /// List all services.
    List,
    /// Apply a JSON patch to one service.
    Set {
        id: String,
        /// Patch as a JSON object, e.g. '{"title": "Advisory"}'.
        patch: String,
    },
    /// Toggle a service's visibility.
    Toggle {
        id: String,
        /// Make the service visible (omit to hide).
        #[arg(long, default_value = "false")]
        active: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show the site settings record.
    Show,
    /// Apply a JSON patch to the site settings.
    Set {
        /// Patch as a JSON object, e.g. '{"siteName": "Crest"}'.
        patch: String,
    },
}

#[derive(Subcommand)]
enum ThemeCommands {
    /// Print the effective theme.
    Get,
    /// Set and persist the theme.
    Set {
        /// light or dark.
        value: String,
    },
}

#[derive(Subcommand)]
enum LangCommands {
    /// Print the effective language.
    Get,
    /// Set and persist the language.
    Set {
        /// ar or en.
        value: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn make_client(cli: &Cli) -> Result<Arc<dyn ContentApi>> {
    if cli.fixture {
        Ok(Arc::new(FixtureContentClient::new()))
    } else {
        Ok(Arc::new(HttpContentClient::new(cli.api_url.clone())?))
    }
}

fn open_settings() -> Result<SettingsStore> {
    let prefs = FilePrefs::open_default().context("failed to open preference store")?;
    Ok(SettingsStore::init(Box::new(prefs), Box::new(NullDocument)))
}

fn parse_patch(raw: &str) -> Result<ContentPatch> {
    let value: Value = serde_json::from_str(raw).context("patch is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("patch must be a JSON object"),
    }
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Sections { action } => {
            let client = make_client(&cli)?;
            cmd_sections(&*client, action).await
        }
        Commands::Services { action } => {
            let client = make_client(&cli)?;
            cmd_services(&*client, action).await
        }
        Commands::Settings { action } => {
            let client = make_client(&cli)?;
            cmd_settings(&*client, action).await
        }
        Commands::Analytics { period } => {
            let client = make_client(&cli)?;
            let data = client.analytics(*period).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        Commands::Upload { file, kind } => {
            let client = make_client(&cli)?;
            let bytes = std::fs::read(file).with_context(|| format!("failed to read {file}"))?;
            let filename = std::path::Path::new(file)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.clone());
            let receipt = client.upload(&filename, bytes, kind).await?;
            println!("uploaded: {} (id {})", receipt.url, receipt.id);
            Ok(())
        }
        Commands::Export { kind } => {
            let client = make_client(&cli)?;
            let data = client.export(kind).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        Commands::Import { file } => {
            let client = make_client(&cli)?;
            let raw = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read {file}"))?;
            let payload: Value = serde_json::from_str(&raw).context("import file is not JSON")?;
            let summary = client.import(&payload).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Theme { action } => cmd_theme(action),
        Commands::Lang { action } => cmd_lang(action),
        Commands::Edit => {
            let client = make_client(&cli)?;
            session::run_edit_session(client).await
        }
    }
}

async fn cmd_sections(client: &dyn ContentApi, action: &SectionCommands) -> Result<()> {
    match action {
        SectionCommands::List => {
            let sections = client.list_sections().await?;
            println!("{:<6} {:<14} {:<30} updated", "id", "section", "title");
            for s in &sections {
                let title = s
                    .content
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                println!(
                    "{:<6} {:<14} {:<30} {}",
                    s.id,
                    s.section,
                    title,
                    s.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
            Ok(())
        }
        SectionCommands::Show { id, edit } => {
            let sections = client.list_sections().await?;
            let section = sections
                .iter()
                .find(|s| &s.id == id)
                .with_context(|| format!("no section with id {id}"))?;
            let mode = if *edit {
                crest_core::RenderMode::Edit
            } else {
                crest_core::RenderMode::View
            };
            print!("{}", crest_core::registry::render(section, &section.content, mode));
            Ok(())
        }
        SectionCommands::Create { section, content } => {
            let content = parse_patch(content)?;
            let created = client.create_section(section, &content).await?;
            println!("created section {} ({})", created.id, created.section);
            Ok(())
        }
        SectionCommands::Delete { id } => {
            client.delete_section(id).await?;
            println!("deleted section {id}");
            Ok(())
        }
    }
}

async fn cmd_services(client: &dyn ContentApi, action: &ServiceCommands) -> Result<()> {
    match action {
        ServiceCommands::List => {
            let services = client.list_services().await?;
            println!("{:<6} {:<26} {:<8} order", "id", "title", "active");
            for s in &services {
                println!("{:<6} {:<26} {:<8} {}", s.id, s.title, s.active, s.order);
            }
            Ok(())
        }
        ServiceCommands::Set { id, patch } => {
            let patch = parse_patch(patch)?;
            let updated = client.update_service(id, &patch).await?;
            println!("updated service {} ({})", updated.id, updated.title);
            Ok(())
        }
        ServiceCommands::Toggle { id, active } => {
            let updated = client.toggle_service(id, *active).await?;
            println!(
                "service {} is now {}",
                updated.id,
                if updated.active { "active" } else { "hidden" }
            );
            Ok(())
        }
    }
}

async fn cmd_settings(client: &dyn ContentApi, action: &SettingsCommands) -> Result<()> {
    match action {
        SettingsCommands::Show => {
            let settings = client.get_settings().await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        SettingsCommands::Set { patch } => {
            let patch = parse_patch(patch)?;
            let settings = client.update_settings(&patch).await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}

fn cmd_theme(action: &ThemeCommands) -> Result<()> {
    let mut store = open_settings()?;
    match action {
        ThemeCommands::Get => {
            println!("{}", store.theme().as_str());
            Ok(())
        }
        ThemeCommands::Set { value } => {
            let theme = match value.as_str() {
                "light" => Theme::Light,
                "dark" => Theme::Dark,
                other => anyhow::bail!("unknown theme '{other}' (expected light or dark)"),
            };
            store.set_theme(theme)?;
            println!("theme set to {}", theme.as_str());
            Ok(())
        }
    }
}

fn cmd_lang(action: &LangCommands) -> Result<()> {
    let mut store = open_settings()?;
    match action {
        LangCommands::Get => {
            println!("{}", store.language().as_str());
            Ok(())
        }
        LangCommands::Set { value } => {
            let language = match value.as_str() {
                "ar" => Language::Ar,
                "en" => Language::En,
                other => anyhow::bail!("unknown language '{other}' (expected ar or en)"),
            };
            store.set_language(language)?;
            println!(
                "language set to {} ({})",
                language.as_str(),
                language.direction().as_str()
            );
            Ok(())
        }
    }
}
