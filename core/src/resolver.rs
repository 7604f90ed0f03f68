use crate::models::{title_of, Note};
use crate::render::links_in;
use crate::storage::NoteRepository;
use crate::{Error, Result};
use rusqlite::Connection;

/// Body placed under the heading of a note created by following a link.
pub const DEFAULT_LINKED_BODY: &str = "Start writing here...";

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Existing(Note),
    Created(Note),
}

impl Resolution {
    pub fn note(&self) -> &Note {
        match self {
            Resolution::Existing(note) | Resolution::Created(note) => note,
        }
    }

    pub fn into_note(self) -> Note {
        match self {
            Resolution::Existing(note) | Resolution::Created(note) => note,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Resolution::Created(_))
    }
}

/// First note whose derived title equals `title`, ignoring case.
pub fn find_by_title<'a>(notes: &'a [Note], title: &str) -> Option<&'a Note> {
    let wanted = title.trim().to_lowercase();
    notes.iter().find(|n| title_of(n).to_lowercase() == wanted)
}

/// Resolve `title` against `notes`, creating and persisting a new root note if
/// nothing matches. Matching uses each note's current derived title, so a
/// retitled note no longer answers to its old name.
pub fn resolve(conn: &Connection, notes: &[Note], title: &str, body: &str) -> Result<Resolution> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("Link target cannot be empty".to_string()));
    }
    if title.contains(['\n', '\r']) {
        return Err(Error::InvalidInput("Link target must be a single line".to_string()));
    }
    if let Some(found) = find_by_title(notes, title) {
        return Ok(Resolution::Existing(found.clone()));
    }

    let note = Note::new(format!("# {}\n\n{}", title.trim(), body));
    let saved = NoteRepository::save(conn, &note)?;
    log::info!("created note '{}' from link", title.trim());
    Ok(Resolution::Created(saved))
}

/// Notes other than `target` whose content links to its current title.
pub fn backlinks<'a>(notes: &'a [Note], target: &Note) -> Vec<&'a Note> {
    let title = title_of(target).to_lowercase();
    if title.is_empty() {
        return Vec::new();
    }
    notes
        .iter()
        .filter(|n| n.id != target.id)
        .filter(|n| links_in(&n.content).iter().any(|l| l.to_lowercase() == title))
        .collect()
}
