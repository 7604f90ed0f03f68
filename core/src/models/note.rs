use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Create a new root note with a generated id
    pub fn new(content: String) -> Self {
        Self::with_id(super::new_id(), content)
    }

    /// Create a note with a specific ID (for testing or import)
    pub fn with_id(id: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            content,
            folder_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style helper to place the note in a folder
    pub fn in_folder(mut self, folder_id: Option<String>) -> Self {
        self.folder_id = folder_id;
        self
    }

    /// Derived title of the note
    pub fn title(&self) -> &str {
        derive_title(&self.content)
    }

    /// Update the modified timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// The display title of a note: its first content line with a leading `# `
/// heading marker removed, trimmed.
///
/// This is the only place titles are computed; the resolver, search and tree
/// all go through it.
pub fn derive_title(content: &str) -> &str {
    let first_line = content.split('\n').next().unwrap_or_default();
    let stripped = match first_line.strip_prefix('#') {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest,
        _ => first_line,
    };
    stripped.trim()
}

/// Convenience wrapper over [`derive_title`] for a whole note.
pub fn title_of(note: &Note) -> &str {
    derive_title(&note.content)
}
