//! Interactive live-editing session.
//!
//! Runs the editor controller against stdin commands with the auto-save
//! worker ticking alongside. Edits accumulate in the controller's buffer;
//! `save` flushes them manually, and the worker flushes them every 30
//! seconds while dirty.

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use crest_client::ContentApi;
use crest_core::registry::{render, RenderMode};
use crest_core::{spawn_autosave, Editor, SaveOutcome};

const HELP: &str = "commands:\n  \
    show <id>               render a section with unsaved edits applied\n  \
    set <id> <field> <val>  buffer a field edit (val parsed as JSON, else text)\n  \
    save                    flush buffered edits now\n  \
    reload                  refetch sections (buffer kept)\n  \
    status                  dirty flag, buffered sections, last save\n  \
    quit                    end the session";

pub async fn run_edit_session(client: Arc<dyn ContentApi>) -> Result<()> {
    let editor = Editor::new(client);
    editor.load().await?;

    print_sections(&editor).await;
    println!("{HELP}");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let autosave = spawn_autosave(editor.clone(), shutdown_rx);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => {}
            ["quit" | "exit"] => break,
            ["help"] => println!("{HELP}"),
            ["status"] => print_status(&editor).await,
            ["reload"] => {
                if let Err(e) = editor.load().await {
                    println!("reload failed: {e}");
                } else {
                    print_sections(&editor).await;
                }
            }
            ["save"] => match editor.save().await {
                Ok(SaveOutcome::Saved) => println!("saved"),
                Ok(SaveOutcome::Clean) => println!("nothing to save"),
                Ok(SaveOutcome::AlreadySaving) => println!("a save is already in flight"),
                Err(e) => println!("save failed (edits kept): {e}"),
            },
            ["show", id] => match editor.section(id).await {
                Some(section) => {
                    let effective = editor.effective_content(&section).await;
                    print!("{}", render(&section, &effective, RenderMode::Edit));
                }
                None => println!("no section with id {id}"),
            },
            ["set", id, field, rest @ ..] if !rest.is_empty() => {
                if editor.section(id).await.is_none() {
                    println!("no section with id {id}");
                    continue;
                }
                let raw = rest.join(" ");
                let value: Value = serde_json::from_str(&raw)
                    .unwrap_or_else(|_| Value::String(raw.clone()));
                editor.record_edit(id, field, value).await;
                println!("buffered {field} for section {id}");
            }
            _ => println!("unrecognized command — try 'help'"),
        }
    }

    if editor.is_dirty().await {
        println!("warning: unsaved edits discarded");
    }

    let _ = shutdown_tx.send(true);
    let _ = autosave.await;
    Ok(())
}

async fn print_sections(editor: &Editor) {
    println!("{:<6} {:<14} title", "id", "section");
    for s in editor.sections().await {
        let title = s.content.get("title").and_then(|v| v.as_str()).unwrap_or("");
        println!("{:<6} {:<14} {title}", s.id, s.section);
    }
}

async fn print_status(editor: &Editor) {
    let dirty = editor.is_dirty().await;
    let buffered = editor.buffered_sections().await;
    let last = editor
        .last_saved()
        .await
        .map_or_else(|| "never".to_owned(), |t| t.format("%H:%M:%S").to_string());
    println!("dirty: {dirty} | buffered sections: {buffered} | last saved: {last}");
}
