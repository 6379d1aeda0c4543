//! Plain-text export of a note collection.
//!
//! Each note becomes one block:
//!
//! ```text
//! === NOTE 1 ===
//! Title: Groceries
//! Tags: todo, personal
//! Created: 2024-01-01T00:00:00.000Z
//! Updated: 2024-01-02T00:00:00.000Z
//!
//! Content:
//! milk
//!
//! === END NOTE 1 ===
//! ```
//!
//! `Created:`/`Updated:` lines appear only when the timestamp is set. Blocks are
//! joined with a newline.

use std::path::{Path, PathBuf};

use crate::error::StoreResult;
use crate::models::Note;

/// Text written for an empty collection.
pub const EMPTY_EXPORT: &str = "(No notes to export)";

/// Filename used by [`export_to_file`].
pub const EXPORT_FILENAME: &str = "notes-backup.txt";

pub fn format_notes_as_text(notes: &[Note]) -> String {
    if notes.is_empty() {
        return EMPTY_EXPORT.to_string();
    }

    notes
        .iter()
        .enumerate()
        .map(|(i, note)| format_note(i + 1, note))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_note(index: usize, note: &Note) -> String {
    let title = if note.title.is_empty() {
        "Untitled note"
    } else {
        &note.title
    };
    let tags = if note.tags.is_empty() {
        "none".to_string()
    } else {
        note.tags.join(", ")
    };

    let mut lines = vec![
        format!("=== NOTE {index} ==="),
        format!("Title: {title}"),
        format!("Tags: {tags}"),
    ];
    if !note.created_at.is_empty() {
        lines.push(format!("Created: {}", note.created_at));
    }
    if !note.updated_at.is_empty() {
        lines.push(format!("Updated: {}", note.updated_at));
    }
    lines.push(String::new());
    lines.push("Content:".to_string());
    lines.push(if note.content.is_empty() {
        "(empty)".to_string()
    } else {
        note.content.clone()
    });
    lines.push(String::new());
    lines.push(format!("=== END NOTE {index} ==="));
    lines.push(String::new());
    lines.join("\n")
}

/// Write the export into `dir` and return the file path.
pub fn export_to_file(notes: &[Note], dir: &Path) -> StoreResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILENAME);
    std::fs::write(&path, format_notes_as_text(notes))?;
    tracing::info!("exported {} note(s) to {}", notes.len(), path.display());
    Ok(path)
}
