use chrono::Utc;
use rusqlite::Connection;
use std::time::{Duration, Instant};

use crate::deferred::Deferred;
use crate::models::Note;
use crate::render::render_preview;
use crate::storage::NoteRepository;
use crate::{Error, Result};

pub struct EditorSession {
    current_note: Option<Note>,
    buffer: String,
    preview: String,
    /// Id of the note with an unsaved buffer, at most one at a time.
    pending_save: Deferred<String>,
    last_save_error: Option<String>,
}

impl EditorSession {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            current_note: None,
            buffer: String::new(),
            preview: String::new(),
            pending_save: Deferred::new(quiet_period),
            last_save_error: None,
        }
    }

    pub fn current_note(&self) -> Option<&Note> {
        self.current_note.as_ref()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_note.as_ref().map(|n| n.id.as_str())
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.pending_save.is_pending()
    }

    /// Error text of the most recent failed autosave, cleared by the next success.
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// Make `note` the active note. The caller flushes any pending save first.
    pub fn load(&mut self, note: Note) {
        self.buffer = note.content.clone();
        self.preview = render_preview(&self.buffer);
        self.current_note = Some(note);
        self.pending_save.cancel();
    }

    /// Record a keystroke. The preview follows immediately; the save waits for
    /// the quiet period. Ignored when no note is open.
    pub fn on_edit(&mut self, content: &str, now: Instant) {
        let Some(note) = &self.current_note else {
            return;
        };
        let id = note.id.clone();
        self.buffer = content.to_string();
        self.preview = render_preview(&self.buffer);
        self.pending_save.schedule(id, now);
    }

    /// Persist the buffer if the quiet period has elapsed.
    ///
    /// Returns the stored note when a save happened. On failure the buffer is
    /// kept, the current note is left as it was and the save is re-armed.
    pub fn tick(&mut self, conn: &Connection, now: Instant) -> Result<Option<Note>> {
        match self.pending_save.take_due(now) {
            Some(id) => self.persist_or_rearm(conn, id, now).map(Some),
            None => Ok(None),
        }
    }

    /// Persist right away if anything is pending.
    pub fn flush(&mut self, conn: &Connection) -> Result<Option<Note>> {
        match self.pending_save.cancel() {
            Some(id) => self.persist_or_rearm(conn, id, Instant::now()).map(Some),
            None => Ok(None),
        }
    }

    fn persist_or_rearm(&mut self, conn: &Connection, id: String, now: Instant) -> Result<Note> {
        match self.persist(conn, &id) {
            Ok(saved) => Ok(saved),
            Err(e) => {
                if self.current_id() == Some(id.as_str()) {
                    self.pending_save.schedule(id, now);
                }
                Err(e)
            }
        }
    }

    /// Drop the active note, buffer, preview and any pending save.
    pub fn clear(&mut self) {
        self.current_note = None;
        self.buffer.clear();
        self.preview.clear();
        self.pending_save.cancel();
        self.last_save_error = None;
    }

    /// Replace the active note's record without touching the buffer, e.g. after
    /// it was moved to another folder.
    pub fn refresh_note(&mut self, note: &Note) {
        if let Some(current) = self.current_note.as_mut() {
            if current.id == note.id {
                current.folder_id = note.folder_id.clone();
            }
        }
    }

    fn persist(&mut self, conn: &Connection, id: &str) -> Result<Note> {
        let Some(current) = self.current_note.as_ref().filter(|n| n.id == id) else {
            return Err(Error::NotFound(format!("Note not open: {}", id)));
        };

        let mut candidate = current.clone();
        candidate.content = self.buffer.clone();
        candidate.updated_at = Utc::now();

        match NoteRepository::save(conn, &candidate) {
            Ok(saved) => {
                log::debug!("autosaved note {}", saved.id);
                self.current_note = Some(saved.clone());
                self.last_save_error = None;
                Ok(saved)
            }
            Err(e) => {
                log::warn!("autosave of note {} failed: {}", id, e);
                self.last_save_error = Some(e.user_message());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    const QUIET: Duration = Duration::from_millis(500);

    fn session_with_note(conn: &Connection) -> (EditorSession, Note) {
        let note = Note::new("# Draft".to_string());
        NoteRepository::save(conn, &note).unwrap();
        let mut session = EditorSession::new(QUIET);
        session.load(note.clone());
        (session, note)
    }

    #[test]
    fn test_load_sets_buffer_and_preview() {
        let conn = Database::in_memory().unwrap();
        let (session, note) = session_with_note(&conn);
        assert_eq!(session.buffer(), "# Draft");
        assert_eq!(session.current_id(), Some(note.id.as_str()));
        assert!(session.preview().contains("<h1>Draft</h1>"));
    }

    #[test]
    fn test_edit_previews_immediately_saves_after_quiet_period() {
        let conn = Database::in_memory().unwrap();
        let (mut session, note) = session_with_note(&conn);
        let start = Instant::now();

        session.on_edit("# Draft\n\nmore", start);
        assert!(session.preview().contains("<p>more</p>"));
        assert!(session.tick(&conn, start + Duration::from_millis(100)).unwrap().is_none());
        assert_eq!(NoteRepository::get_by_id(&conn, &note.id).unwrap().content, "# Draft");

        let saved = session.tick(&conn, start + QUIET).unwrap().unwrap();
        assert_eq!(saved.content, "# Draft\n\nmore");
        assert!(saved.updated_at >= note.updated_at);
        assert_eq!(session.current_note().unwrap().content, "# Draft\n\nmore");
        assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn test_new_keystroke_reschedules_save() {
        let conn = Database::in_memory().unwrap();
        let (mut session, note) = session_with_note(&conn);
        let start = Instant::now();

        session.on_edit("# Draft 1", start);
        session.on_edit("# Draft 12", start + Duration::from_millis(400));
        assert!(session.tick(&conn, start + QUIET).unwrap().is_none());

        session.tick(&conn, start + Duration::from_millis(900)).unwrap().unwrap();
        assert_eq!(NoteRepository::get_by_id(&conn, &note.id).unwrap().content, "# Draft 12");
    }

    #[test]
    fn test_failed_save_keeps_buffer() {
        let conn = Database::in_memory().unwrap();
        let (mut session, note) = session_with_note(&conn);
        let start = Instant::now();

        session.on_edit("# Draft\n\nprecious words", start);
        conn.execute_batch("DROP TABLE kv").unwrap();

        assert!(session.tick(&conn, start + QUIET).is_err());
        assert_eq!(session.buffer(), "# Draft\n\nprecious words");
        assert_eq!(session.current_note().unwrap().content, note.content);
        assert!(session.last_save_error().is_some());
        assert!(session.has_unsaved_changes());
    }

    #[test]
    fn test_flush_and_clear() {
        let conn = Database::in_memory().unwrap();
        let (mut session, note) = session_with_note(&conn);

        assert!(session.flush(&conn).unwrap().is_none());
        session.on_edit("# Flushed", Instant::now());
        session.flush(&conn).unwrap().unwrap();
        assert_eq!(NoteRepository::get_by_id(&conn, &note.id).unwrap().title(), "Flushed");

        session.on_edit("# Dropped", Instant::now());
        session.clear();
        assert!(session.current_note().is_none());
        assert_eq!(session.buffer(), "");
        assert_eq!(session.preview(), "");
        assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn test_edit_without_note_is_ignored() {
        let mut session = EditorSession::new(QUIET);
        session.on_edit("stray", Instant::now());
        assert_eq!(session.buffer(), "");
        assert!(!session.has_unsaved_changes());
    }
}
