//! Filtering, search and sorting of a note collection.

use std::cmp::Ordering;

use crate::models::Note;

/// Sort orders offered by the note list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    UpdatedDesc,
    UpdatedAsc,
    TitleAsc,
    TitleDesc,
}

impl SortMode {
    /// Parse the list control's value; unknown values sort newest first.
    pub fn parse(s: &str) -> Self {
        match s {
            "updated_asc" => SortMode::UpdatedAsc,
            "title_asc" => SortMode::TitleAsc,
            "title_desc" => SortMode::TitleDesc,
            _ => SortMode::UpdatedDesc,
        }
    }
}

/// Criteria applied by [`NoteQuery::apply`]. Empty fields do not filter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoteQuery {
    /// Exact tag; `None` or `"all"` keeps every note.
    pub tag: Option<String>,
    /// Case-insensitive substring over title, content and tags.
    pub search: String,
    /// `YYYY-MM-DD`; matched against the date part of `createdAt` (or `updatedAt`).
    pub date: Option<String>,
    pub sort: SortMode,
}

impl NoteQuery {
    pub fn apply(&self, notes: &[Note]) -> Vec<Note> {
        let query = self.search.trim().to_lowercase();

        let mut result: Vec<Note> = notes
            .iter()
            .filter(|n| match self.tag.as_deref() {
                None | Some("all") | Some("") => true,
                Some(tag) => n.tags.iter().any(|t| t == tag),
            })
            .filter(|n| query.is_empty() || haystack(n).contains(&query))
            .filter(|n| match self.date.as_deref() {
                None | Some("") => true,
                Some(date) => note_date(n) == Some(date),
            })
            .cloned()
            .collect();

        result.sort_by(|a, b| self.compare(a, b));
        result
    }

    fn compare(&self, a: &Note, b: &Note) -> Ordering {
        match self.sort {
            SortMode::UpdatedDesc => b.updated_at.cmp(&a.updated_at),
            SortMode::UpdatedAsc => a.updated_at.cmp(&b.updated_at),
            SortMode::TitleAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortMode::TitleDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
        }
    }
}

fn haystack(note: &Note) -> String {
    format!("{} {} {}", note.title, note.content, note.tags.join(" ")).to_lowercase()
}

fn note_date(note: &Note) -> Option<&str> {
    let source = if note.created_at.is_empty() {
        &note.updated_at
    } else {
        &note.created_at
    };
    if source.is_empty() {
        return None;
    }
    source.split('T').next()
}
