use std::collections::HashSet;

use crate::models::{title_of, Folder, Note};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    pub id: String,
    pub title: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub id: String,
    pub name: String,
    pub is_expanded: bool,
    pub notes: Vec<NoteEntry>,
}

/// Root notes first, then each folder with its notes, all in collection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeView {
    pub root_notes: Vec<NoteEntry>,
    pub folders: Vec<FolderEntry>,
}

impl TreeView {
    /// Every note entry, root notes first.
    pub fn all_notes(&self) -> impl Iterator<Item = &NoteEntry> {
        self.root_notes
            .iter()
            .chain(self.folders.iter().flat_map(|f| f.notes.iter()))
    }

    pub fn folder(&self, folder_id: &str) -> Option<&FolderEntry> {
        self.folders.iter().find(|f| f.id == folder_id)
    }

    pub fn active_note(&self) -> Option<&NoteEntry> {
        self.all_notes().find(|n| n.is_active)
    }

    pub fn is_empty(&self) -> bool {
        self.root_notes.is_empty() && self.folders.is_empty()
    }
}

/// Inputs shared by [`derive_tree`] and [`filter_tree`].
#[derive(Debug, Clone, Copy)]
pub struct TreeSource<'a> {
    pub notes: &'a [Note],
    pub folders: &'a [Folder],
    pub expanded: &'a HashSet<String>,
    pub active_note: Option<&'a str>,
}

/// Build the full tree. A note whose folder is missing is shown at the root.
pub fn derive_tree(source: TreeSource<'_>) -> TreeView {
    build(source, |_| true, false)
}

/// Build the tree restricted to notes whose title or content contains `term`,
/// ignoring case. Matches stay grouped under their folder; folders without a
/// match are left out and those with one are shown expanded. An empty term
/// yields the full tree.
pub fn filter_tree(source: TreeSource<'_>, term: &str) -> TreeView {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return derive_tree(source);
    }
    build(source, |note| matches_term(note, &term), true)
}

/// Case-insensitive substring match against the derived title or full content.
pub fn matches_term(note: &Note, lowercase_term: &str) -> bool {
    title_of(note).to_lowercase().contains(lowercase_term)
        || note.content.to_lowercase().contains(lowercase_term)
}

fn build(source: TreeSource<'_>, keep: impl Fn(&Note) -> bool, filtering: bool) -> TreeView {
    let folder_ids: HashSet<&str> = source.folders.iter().map(|f| f.id.as_str()).collect();
    let entry = |note: &Note| NoteEntry {
        id: note.id.clone(),
        title: title_of(note).to_string(),
        is_active: source.active_note == Some(note.id.as_str()),
    };

    let root_notes = source
        .notes
        .iter()
        .filter(|n| match n.folder_id.as_deref() {
            Some(id) => !folder_ids.contains(id),
            None => true,
        })
        .filter(|&n| keep(n))
        .map(entry)
        .collect();

    let folders = source
        .folders
        .iter()
        .filter_map(|folder| {
            let notes: Vec<NoteEntry> = source
                .notes
                .iter()
                .filter(|n| n.folder_id.as_deref() == Some(folder.id.as_str()))
                .filter(|&n| keep(n))
                .map(entry)
                .collect();
            if filtering && notes.is_empty() {
                return None;
            }
            Some(FolderEntry {
                id: folder.id.clone(),
                name: folder.name.clone(),
                is_expanded: filtering || source.expanded.contains(&folder.id),
                notes,
            })
        })
        .collect();

    TreeView { root_notes, folders }
}
