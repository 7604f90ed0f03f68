use crate::models::{Folder, Note};
use crate::storage::{keys, Store};
use crate::{Error, Result};
use rusqlite::Connection;

pub struct NoteRepository;

impl NoteRepository {
    /// Get all notes in stored order
    pub fn get_all(conn: &Connection) -> Result<Vec<Note>> {
        Store::get_or(conn, keys::NOTES, Vec::new())
    }

    /// Get a note by ID
    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Note> {
        Self::get_all(conn)?
            .into_iter()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::NotFound(format!("Note not found: {}", id)))
    }

    /// Insert or replace a note by id
    pub fn save(conn: &Connection, note: &Note) -> Result<Note> {
        let mut notes = Self::get_all(conn)?;
        if let Some(folder_id) = &note.folder_id {
            let folders: Vec<Folder> = Store::get_or(conn, keys::FOLDERS, Vec::new())?;
            ensure_folder_exists(&folders, folder_id)?;
        }

        match notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => *existing = note.clone(),
            None => notes.push(note.clone()),
        }

        Store::set(conn, keys::NOTES, &notes)?;
        Ok(note.clone())
    }

    /// Delete a note. Deleting an id that is already gone succeeds.
    pub fn delete(conn: &Connection, id: &str) -> Result<()> {
        let mut notes = Self::get_all(conn)?;
        let before = notes.len();
        notes.retain(|n| n.id != id);
        if notes.len() == before {
            log::debug!("delete of unknown note {}", id);
        }

        Store::set(conn, keys::NOTES, &notes)?;
        Ok(())
    }

    /// Set or clear the folder of a note.
    ///
    /// Returns `Ok(None)` without writing when the note does not exist. Moving
    /// into a folder that does not exist is rejected.
    pub fn move_to_folder(
        conn: &Connection,
        id: &str,
        folder_id: Option<&str>,
    ) -> Result<Option<Note>> {
        let mut notes = Self::get_all(conn)?;
        if let Some(folder_id) = folder_id {
            let folders: Vec<Folder> = Store::get_or(conn, keys::FOLDERS, Vec::new())?;
            ensure_folder_exists(&folders, folder_id)?;
        }

        let Some(note) = notes.iter_mut().find(|n| n.id == id) else {
            return Ok(None);
        };
        note.folder_id = folder_id.map(str::to_string);
        let moved = note.clone();

        Store::set(conn, keys::NOTES, &notes)?;
        Ok(Some(moved))
    }

    /// Count total notes
    pub fn count(conn: &Connection) -> Result<usize> {
        Ok(Self::get_all(conn)?.len())
    }
}

fn ensure_folder_exists(folders: &[Folder], folder_id: &str) -> Result<()> {
    if folders.iter().any(|f| f.id == folder_id) {
        Ok(())
    } else {
        Err(Error::ConstraintViolation(format!(
            "Folder {} does not exist",
            folder_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Database, FolderRepository};
    use tempfile::tempdir;

    fn setup_test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::new(&db_path);
        let conn = db.open().unwrap();
        (dir, conn)
    }

    #[test]
    fn test_save_new_note() {
        let (_dir, conn) = setup_test_db();
        let note = Note::new("# Test Note".to_string());

        NoteRepository::save(&conn, &note).unwrap();

        let retrieved = NoteRepository::get_by_id(&conn, &note.id).unwrap();
        assert_eq!(retrieved.title(), "Test Note");
    }

    #[test]
    fn test_save_replaces_in_place() {
        let (_dir, conn) = setup_test_db();
        let first = Note::new("# One".to_string());
        let second = Note::new("# Two".to_string());
        NoteRepository::save(&conn, &first).unwrap();
        NoteRepository::save(&conn, &second).unwrap();

        let mut edited = first.clone();
        edited.content = "# One, edited".to_string();
        edited.touch();
        NoteRepository::save(&conn, &edited).unwrap();

        let notes = NoteRepository::get_all(&conn).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, first.id);
        assert_eq!(notes[0].title(), "One, edited");
        assert_eq!(notes[1].id, second.id);
    }

    #[test]
    fn test_save_round_trip() {
        let (_dir, conn) = setup_test_db();
        let note = Note::new("# Round\n\ntrip".to_string());
        NoteRepository::save(&conn, &note).unwrap();

        let mut loaded = NoteRepository::get_by_id(&conn, &note.id).unwrap();
        let saved_at = loaded.updated_at;
        loaded.touch();
        let saved = NoteRepository::save(&conn, &loaded).unwrap();

        let refetched = NoteRepository::get_by_id(&conn, &note.id).unwrap();
        assert_eq!(refetched, saved);
        assert!(refetched.updated_at >= saved_at);
        assert_eq!(refetched.created_at, note.created_at);
    }

    #[test]
    fn test_save_rejects_dangling_folder() {
        let (_dir, conn) = setup_test_db();
        let note = Note::new("# Orphan".to_string()).in_folder(Some("missing".to_string()));

        let result = NoteRepository::save(&conn, &note);
        assert!(matches!(result, Err(Error::ConstraintViolation(_))));
        assert_eq!(NoteRepository::count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_delete_note() {
        let (_dir, conn) = setup_test_db();
        let note = Note::new("To Delete".to_string());

        NoteRepository::save(&conn, &note).unwrap();
        NoteRepository::delete(&conn, &note.id).unwrap();

        let result = NoteRepository::get_by_id(&conn, &note.id);
        assert!(matches!(result, Err(Error::NotFound(_))));
        // Deleting again is still a success
        NoteRepository::delete(&conn, &note.id).unwrap();
    }

    #[test]
    fn test_move_to_folder_and_back() {
        let (_dir, conn) = setup_test_db();
        let folder = FolderRepository::create(&conn, "Work").unwrap();
        let note = Note::new("# Plan".to_string());
        NoteRepository::save(&conn, &note).unwrap();

        let moved = NoteRepository::move_to_folder(&conn, &note.id, Some(&folder.id))
            .unwrap()
            .unwrap();
        assert_eq!(moved.folder_id.as_deref(), Some(folder.id.as_str()));

        let back = NoteRepository::move_to_folder(&conn, &note.id, None)
            .unwrap()
            .unwrap();
        assert!(back.folder_id.is_none());
        assert!(NoteRepository::get_by_id(&conn, &note.id).unwrap().folder_id.is_none());
    }

    #[test]
    fn test_move_missing_note_is_none() {
        let (_dir, conn) = setup_test_db();
        assert!(NoteRepository::move_to_folder(&conn, "nope", None).unwrap().is_none());
        // No write happened, the key is still unset
        assert!(Store::get::<Vec<Note>>(&conn, keys::NOTES).unwrap().is_none());
    }

    #[test]
    fn test_move_into_missing_folder_rejected() {
        let (_dir, conn) = setup_test_db();
        let note = Note::new("# Plan".to_string());
        NoteRepository::save(&conn, &note).unwrap();

        let result = NoteRepository::move_to_folder(&conn, &note.id, Some("ghost"));
        assert!(matches!(result, Err(Error::ConstraintViolation(_))));
    }

    #[test]
    fn test_count_notes() {
        let (_dir, conn) = setup_test_db();

        assert_eq!(NoteRepository::count(&conn).unwrap(), 0);

        let note = Note::new("Test".to_string());
        NoteRepository::save(&conn, &note).unwrap();

        assert_eq!(NoteRepository::count(&conn).unwrap(), 1);
    }
}
