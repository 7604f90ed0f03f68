use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::config::Config;
use crate::deferred::DeferredSet;
use crate::editor::EditorSession;
use crate::models::{title_of, Folder, Note, RepoId, SyncSettings, Theme};
use crate::resolver::{self, Resolution};
use crate::storage::{Connection, Database, FolderRepository, NoteRepository, SettingsRepository};
use crate::sync::{BackupSync, SyncGateway, SyncReport};
use crate::tree::{derive_tree, filter_tree, TreeSource, TreeView};
use crate::{Error, Result};

const WELCOME_BODY: &str = "This is your first note. Write in markdown and link notes \
together with [[Note name]]; following a link to a note that does not exist yet creates it.";

const NEW_NOTE_CONTENT: &str = "# Untitled\n\n";

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Moved(Note),
    /// The note already lives in the target folder; nothing was written.
    Unchanged,
    NotFound,
}

/// Owns the note and folder collections, folder expansion and the editor
/// session. A command that fails at the store leaves the in-memory
/// collections exactly as they were.
pub struct Notebook {
    conn: Connection,
    config: Config,
    notes: Vec<Note>,
    folders: Vec<Folder>,
    expanded_folders: HashSet<String>,
    editor: EditorSession,
    hover_expand: DeferredSet<String>,
    search: Option<String>,
    view: TreeView,
    revision: u64,
}

impl Notebook {
    /// Open (or create) the store at `db_path` and load it.
    pub fn open<P: AsRef<Path>>(db_path: P, config: Config) -> Result<Self> {
        let conn = Database::new(db_path).open()?;
        let mut notebook = Self::new(conn, config);
        notebook.load()?;
        Ok(notebook)
    }

    /// Wrap a connection without reading anything yet.
    pub fn new(conn: Connection, config: Config) -> Self {
        let editor = EditorSession::new(config.editor.quiet_period());
        let hover_expand = DeferredSet::new(config.tree.hover_delay());
        Self {
            conn,
            config,
            notes: Vec::new(),
            folders: Vec::new(),
            expanded_folders: HashSet::new(),
            editor,
            hover_expand,
            search: None,
            view: TreeView::default(),
            revision: 0,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == note_id)
    }

    pub fn expanded_folders(&self) -> &HashSet<String> {
        &self.expanded_folders
    }

    pub fn is_expanded(&self, folder_id: &str) -> bool {
        self.expanded_folders.contains(folder_id)
    }

    pub fn editor(&self) -> &EditorSession {
        &self.editor
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// The tree as last derived, filtered when a search is active.
    pub fn view(&self) -> &TreeView {
        &self.view
    }

    /// Bumped every time the view is re-derived.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref()
    }

    // =========================
    // Loading and derivation
    // =========================

    /// Replace the local collections with what the store holds. An empty store
    /// gets a welcome note, which becomes the current note.
    pub fn load(&mut self) -> Result<()> {
        let notes = NoteRepository::get_all(&self.conn)?;
        let folders = FolderRepository::get_all(&self.conn)?;

        self.notes = notes;
        self.folders = folders;
        self.expanded_folders.clear();
        self.hover_expand = DeferredSet::new(self.config.tree.hover_delay());

        if let Some(current) = self.editor.current_id() {
            if !self.notes.iter().any(|n| n.id == current) {
                self.editor.clear();
            }
        }

        if self.notes.is_empty() {
            let welcome = Note::new(format!(
                "# {}\n\n{}",
                self.config.editor.welcome_title, WELCOME_BODY
            ));
            let saved = NoteRepository::save(&self.conn, &welcome)?;
            log::info!("created welcome note {}", saved.id);
            self.notes.push(saved.clone());
            self.editor.load(saved);
        }

        log::debug!("loaded {} notes, {} folders", self.notes.len(), self.folders.len());
        self.rederive();
        Ok(())
    }

    fn source(&self) -> TreeSource<'_> {
        TreeSource {
            notes: &self.notes,
            folders: &self.folders,
            expanded: &self.expanded_folders,
            active_note: self.editor.current_id(),
        }
    }

    /// The full, unfiltered tree for the current collections.
    pub fn derive_tree(&self) -> TreeView {
        derive_tree(self.source())
    }

    /// The tree restricted to notes matching `term` by title or content.
    pub fn filter(&self, term: &str) -> TreeView {
        filter_tree(self.source(), term)
    }

    fn rederive(&mut self) {
        self.view = match self.search.as_deref() {
            Some(term) => filter_tree(self.source(), term),
            None => derive_tree(self.source()),
        };
        self.revision += 1;
        log::debug!("tree re-derived (revision {})", self.revision);
    }

    /// Show only matching notes until [`Notebook::clear_search`].
    pub fn set_search(&mut self, term: &str) {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self.rederive();
    }

    pub fn clear_search(&mut self) {
        if self.search.take().is_some() {
            self.rederive();
        }
    }

    // =========================
    // Folder commands
    // =========================

    pub fn toggle_expansion(&mut self, folder_id: &str) {
        if !self.expanded_folders.remove(folder_id) {
            self.expanded_folders.insert(folder_id.to_string());
        }
        self.rederive();
    }

    /// Create a folder; it starts out expanded.
    pub fn create_folder(&mut self, name: &str) -> Result<Folder> {
        if name.trim().is_empty() {
            log::warn!("rejected folder with empty name");
            return Err(Error::InvalidInput("Folder name cannot be empty".to_string()));
        }

        let folder = FolderRepository::create(&self.conn, name)?;
        self.folders.push(folder.clone());
        self.expanded_folders.insert(folder.id.clone());
        self.rederive();
        Ok(folder)
    }

    /// `Ok(None)` when the folder does not exist.
    pub fn rename_folder(&mut self, folder_id: &str, new_name: &str) -> Result<Option<Folder>> {
        if new_name.trim().is_empty() {
            return Err(Error::InvalidInput("Folder name cannot be empty".to_string()));
        }

        let Some(renamed) = FolderRepository::rename(&self.conn, folder_id, new_name)? else {
            return Ok(None);
        };
        if let Some(local) = self.folders.iter_mut().find(|f| f.id == folder_id) {
            *local = renamed.clone();
        }
        self.rederive();
        Ok(Some(renamed))
    }

    /// Delete a folder. Its notes move to the root; none are deleted.
    pub fn delete_folder(&mut self, folder_id: &str) -> Result<()> {
        FolderRepository::delete(&self.conn, folder_id)?;

        self.folders.retain(|f| f.id != folder_id);
        self.expanded_folders.remove(folder_id);
        self.hover_expand.cancel(&folder_id.to_string());
        for note in self
            .notes
            .iter_mut()
            .filter(|n| n.folder_id.as_deref() == Some(folder_id))
        {
            note.folder_id = None;
            self.editor.refresh_note(note);
        }
        self.rederive();
        Ok(())
    }

    // =========================
    // Note commands
    // =========================

    /// Create an empty note in `folder_id` (or the root) and open it.
    pub fn create_note(&mut self, folder_id: Option<&str>) -> Result<Note> {
        if let Some(id) = folder_id {
            if !self.folders.iter().any(|f| f.id == id) {
                return Err(Error::ConstraintViolation(format!("Folder {} does not exist", id)));
            }
        }
        self.editor.flush(&self.conn)?;

        let note = Note::new(NEW_NOTE_CONTENT.to_string()).in_folder(folder_id.map(str::to_string));
        let saved = NoteRepository::save(&self.conn, &note)?;
        log::info!("created note {}", saved.id);
        self.notes.push(saved.clone());
        self.editor.load(saved.clone());
        self.rederive();
        Ok(saved)
    }

    /// Move a note into `target` (or the root when `None`).
    pub fn move_note(&mut self, note_id: &str, target: Option<&str>) -> Result<MoveOutcome> {
        let Some(local) = self.notes.iter().find(|n| n.id == note_id) else {
            return Ok(MoveOutcome::NotFound);
        };
        if local.folder_id.as_deref() == target {
            return Ok(MoveOutcome::Unchanged);
        }

        let Some(moved) = NoteRepository::move_to_folder(&self.conn, note_id, target)? else {
            return Ok(MoveOutcome::NotFound);
        };
        if let Some(local) = self.notes.iter_mut().find(|n| n.id == note_id) {
            local.folder_id = moved.folder_id.clone();
        }
        self.editor.refresh_note(&moved);
        log::info!("moved note {} to {}", note_id, target.unwrap_or("root"));
        self.rederive();
        Ok(MoveOutcome::Moved(moved))
    }

    /// Delete a note. If it was open, the editor is cleared.
    pub fn delete_note(&mut self, note_id: &str) -> Result<()> {
        NoteRepository::delete(&self.conn, note_id)?;

        self.notes.retain(|n| n.id != note_id);
        if self.editor.current_id() == Some(note_id) {
            self.editor.clear();
        }
        log::info!("deleted note {}", note_id);
        self.rederive();
        Ok(())
    }

    // =========================
    // Editing
    // =========================

    /// Make a note the current one. Pending edits of the previous note are
    /// saved first; if that fails, the switch does not happen.
    pub fn open_note(&mut self, note_id: &str) -> Result<()> {
        let Some(note) = self.note(note_id).cloned() else {
            return Err(Error::NotFound(format!("Note not found: {}", note_id)));
        };
        self.flush()?;
        self.editor.load(note);
        self.rederive();
        Ok(())
    }

    /// Feed the editor's new content. Saving happens in [`Notebook::tick`].
    pub fn edit(&mut self, content: &str, now: Instant) {
        self.editor.on_edit(content, now);
    }

    /// Advance timers: expand hovered folders and autosave a quiet buffer.
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        let due = self.hover_expand.take_due(now);
        let mut expanded_any = false;
        for folder_id in due {
            if self.folders.iter().any(|f| f.id == folder_id) && self.expanded_folders.insert(folder_id) {
                expanded_any = true;
            }
        }
        if expanded_any {
            self.rederive();
        }

        if let Some(saved) = self.editor.tick(&self.conn, now)? {
            self.merge_saved(saved);
        }
        Ok(())
    }

    /// Save pending edits now.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(saved) = self.editor.flush(&self.conn)? {
            self.merge_saved(saved);
        }
        Ok(())
    }

    fn merge_saved(&mut self, saved: Note) {
        match self.notes.iter_mut().find(|n| n.id == saved.id) {
            Some(local) => *local = saved,
            None => self.notes.push(saved),
        }
        self.rederive();
    }

    /// Follow a `[[title]]` link: open the matching note, creating it if needed.
    pub fn follow_link(&mut self, title: &str) -> Result<Note> {
        self.flush()?;
        let resolution = resolver::resolve(
            &self.conn,
            &self.notes,
            title,
            &self.config.editor.new_note_body,
        )?;
        if let Resolution::Created(note) = &resolution {
            self.notes.push(note.clone());
        }
        let note = resolution.into_note();
        self.editor.load(note.clone());
        self.rederive();
        Ok(note)
    }

    /// Notes whose content links to `note_id`'s current title.
    pub fn backlinks(&self, note_id: &str) -> Vec<&Note> {
        match self.note(note_id) {
            Some(target) => resolver::backlinks(&self.notes, target),
            None => Vec::new(),
        }
    }

    // =========================
    // Drag and drop
    // =========================

    /// A dragged note is over `folder_id`. A collapsed folder expands once the
    /// hover has lasted the configured delay; each call restarts the wait.
    pub fn drag_over(&mut self, folder_id: &str, now: Instant) {
        let known = self.folders.iter().any(|f| f.id == folder_id);
        if known && !self.expanded_folders.contains(folder_id) {
            self.hover_expand.schedule(folder_id.to_string(), now);
        }
    }

    /// The drag left `folder_id` before it expanded.
    pub fn drag_leave(&mut self, folder_id: &str) {
        self.hover_expand.cancel(&folder_id.to_string());
    }

    /// The note was dropped on `folder_id`, or on the root when `None`.
    pub fn drop_note(&mut self, note_id: &str, folder_id: Option<&str>) -> Result<MoveOutcome> {
        if let Some(id) = folder_id {
            self.hover_expand.cancel(&id.to_string());
        }
        self.move_note(note_id, folder_id)
    }

    pub fn is_hover_pending(&self, folder_id: &str) -> bool {
        self.hover_expand.is_pending(&folder_id.to_string())
    }

    // =========================
    // Settings and backup
    // =========================

    pub fn theme(&self) -> Result<Theme> {
        SettingsRepository::theme(&self.conn)
    }

    pub fn set_theme(&self, theme: &Theme) -> Result<()> {
        SettingsRepository::set_theme(&self.conn, theme)
    }

    pub fn set_github_auth(&self, token: &str, repo: &str) -> Result<RepoId> {
        SettingsRepository::set_github_auth(&self.conn, token, repo)
    }

    pub fn sync_settings(&self) -> Result<SyncSettings> {
        SettingsRepository::sync_settings(&self.conn)
    }

    /// Push a snapshot of everything to `gateway`, saving pending edits first.
    pub fn sync_backup(&mut self, gateway: &dyn SyncGateway) -> Result<SyncReport> {
        self.flush()?;
        BackupSync::run(&self.conn, gateway, &self.config.sync.backup_path)
    }

    /// Gateway for the configured GitHub repository.
    #[cfg(feature = "github")]
    pub fn github_gateway(&self) -> Result<crate::sync::GitHubGateway> {
        let (token, repo) = self.sync_settings()?.credentials()?;
        Ok(crate::sync::GitHubGateway::new(token, repo, &self.config.sync)?)
    }

    /// Write every note as a markdown file under `dir`, one sub-directory per
    /// folder. Returns the number of files written.
    pub fn export_markdown(&mut self, dir: &Path) -> Result<usize> {
        self.flush()?;
        fs::create_dir_all(dir)?;

        let mut used: HashSet<std::path::PathBuf> = HashSet::new();
        let mut written = 0;
        for note in &self.notes {
            let folder = note
                .folder_id
                .as_deref()
                .and_then(|id| self.folders.iter().find(|f| f.id == id));
            let parent = match folder {
                Some(folder) => dir.join(file_stem(&folder.name, "Folder")),
                None => dir.to_path_buf(),
            };
            fs::create_dir_all(&parent)?;

            let stem = file_stem(title_of(note), "Untitled");
            let mut path = parent.join(format!("{}.md", stem));
            let mut n = 2;
            while used.contains(&path) {
                path = parent.join(format!("{} ({}).md", stem, n));
                n += 1;
            }
            fs::write(&path, &note.content)?;
            used.insert(path);
            written += 1;
        }

        log::info!("exported {} notes to {}", written, dir.display());
        Ok(written)
    }
}

fn file_stem(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('.').trim();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned.to_string()
    }
}
