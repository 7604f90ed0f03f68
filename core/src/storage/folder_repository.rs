use crate::models::{Folder, Note};
use crate::storage::{keys, Store};
use crate::{Error, Result};
use rusqlite::Connection;

pub struct FolderRepository;

impl FolderRepository {
    /// Get all folders in stored order
    pub fn get_all(conn: &Connection) -> Result<Vec<Folder>> {
        Store::get_or(conn, keys::FOLDERS, Vec::new())
    }

    /// Create a folder and append it to the collection
    pub fn create(conn: &Connection, name: &str) -> Result<Folder> {
        let name = validate_name(name)?;
        let mut folders = Self::get_all(conn)?;
        let folder = Folder::new(name);
        folders.push(folder.clone());

        Store::set(conn, keys::FOLDERS, &folders)?;
        log::info!("created folder {} ({})", folder.name, folder.id);
        Ok(folder)
    }

    /// Rename a folder. `Ok(None)` means no such folder; nothing is written.
    pub fn rename(conn: &Connection, id: &str, new_name: &str) -> Result<Option<Folder>> {
        let new_name = validate_name(new_name)?;
        let mut folders = Self::get_all(conn)?;
        let Some(folder) = folders.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        folder.name = new_name;
        let renamed = folder.clone();

        Store::set(conn, keys::FOLDERS, &folders)?;
        Ok(Some(renamed))
    }

    /// Delete a folder and move its notes to the root.
    ///
    /// Both collections are written in one transaction so a note can never be
    /// left pointing at a folder that no longer exists.
    pub fn delete(conn: &Connection, id: &str) -> Result<()> {
        let mut folders = Self::get_all(conn)?;
        let mut notes: Vec<Note> = Store::get_or(conn, keys::NOTES, Vec::new())?;

        folders.retain(|f| f.id != id);
        let mut released = 0;
        for note in notes.iter_mut().filter(|n| n.folder_id.as_deref() == Some(id)) {
            note.folder_id = None;
            released += 1;
        }

        Store::set_many(
            conn,
            &[
                (keys::FOLDERS, serde_json::to_string(&folders)?),
                (keys::NOTES, serde_json::to_string(&notes)?),
            ],
        )?;
        log::info!("deleted folder {}, {} note(s) moved to root", id, released);
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Folder name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}
