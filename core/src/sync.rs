#[cfg(feature = "github")]
mod github;

#[cfg(feature = "github")]
pub use github::GitHubGateway;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use thiserror::Error;

use crate::models::Snapshot;
use crate::storage::{FolderRepository, NoteRepository, SettingsRepository};
use crate::Result;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("authentication rejected")]
    Unauthorized,

    #[error("remote not found: {0}")]
    NotFound(String),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("remote returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("unreadable remote response: {0}")]
    Decode(String),
}

/// Blob storage at a remote path.
pub trait SyncGateway {
    /// Fetch the blob at `path`, `None` if there is none.
    fn read(&self, path: &str) -> std::result::Result<Option<Vec<u8>>, SyncError>;

    /// Create or overwrite the blob at `path`.
    fn upload(&self, path: &str, bytes: &[u8]) -> std::result::Result<(), SyncError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub notes: usize,
    pub folders: usize,
    pub synced_at: DateTime<Utc>,
}

/// One-way backup: the remote copy is overwritten, never pulled back or merged.
pub struct BackupSync;

impl BackupSync {
    /// Snapshot the store, push it to `path` and stamp the last-sync time.
    ///
    /// The snapshot is fully built before the gateway is touched, and the
    /// store is only written after the upload succeeded.
    pub fn run(conn: &Connection, gateway: &dyn SyncGateway, path: &str) -> Result<SyncReport> {
        let synced_at = Utc::now();
        let snapshot = Snapshot::new(
            NoteRepository::get_all(conn)?,
            FolderRepository::get_all(conn)?,
            synced_at,
        );
        let bytes = snapshot.to_bytes()?;

        let outcome = match gateway.read(path)? {
            Some(_) => SyncOutcome::Updated,
            None => SyncOutcome::Created,
        };
        gateway.upload(path, &bytes)?;
        SettingsRepository::set_last_sync(conn, synced_at)?;

        log::info!(
            "backup {:?}: {} notes, {} folders -> {}",
            outcome,
            snapshot.notes.len(),
            snapshot.folders.len(),
            path
        );
        Ok(SyncReport {
            outcome,
            notes: snapshot.notes.len(),
            folders: snapshot.folders.len(),
            synced_at,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryGateway;
    use super::*;
    use crate::models::Note;
    use crate::storage::Database;
    use crate::Error;

    #[test]
    fn test_first_sync_creates_then_updates() {
        let conn = Database::in_memory().unwrap();
        let folder = FolderRepository::create(&conn, "Work").unwrap();
        NoteRepository::save(&conn, &Note::new("# Plan".to_string()).in_folder(Some(folder.id))).unwrap();
        let gateway = MemoryGateway::default();

        let first = BackupSync::run(&conn, &gateway, "backup.json").unwrap();
        assert_eq!(first.outcome, SyncOutcome::Created);
        assert_eq!(first.notes, 1);
        assert_eq!(first.folders, 1);

        let stored = gateway.blobs.borrow().get("backup.json").cloned().unwrap();
        let snapshot: Snapshot = serde_json::from_slice(&stored).unwrap();
        assert_eq!(snapshot.notes[0].title(), "Plan");
        assert_eq!(snapshot.version, 1);

        let second = BackupSync::run(&conn, &gateway, "backup.json").unwrap();
        assert_eq!(second.outcome, SyncOutcome::Updated);
        assert_eq!(*gateway.uploads.borrow(), 2);
        assert_eq!(
            SettingsRepository::sync_settings(&conn).unwrap().last_sync,
            Some(second.synced_at)
        );
    }

    #[test]
    fn test_failure_leaves_last_sync_untouched() {
        let conn = Database::in_memory().unwrap();
        let gateway = MemoryGateway::default();
        *gateway.fail_with.borrow_mut() = Some(SyncError::Unauthorized);

        let result = BackupSync::run(&conn, &gateway, "backup.json");
        assert!(matches!(result, Err(Error::Sync(SyncError::Unauthorized))));
        assert!(SettingsRepository::sync_settings(&conn).unwrap().last_sync.is_none());
        assert_eq!(*gateway.uploads.borrow(), 0);
    }
}
