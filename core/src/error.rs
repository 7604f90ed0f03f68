use thiserror::Error;

use crate::sync::SyncError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Serialization(_) => {
                "Something went wrong while saving. Your changes were not stored.".to_string()
            }
            Self::Io(e) => format!("File error: {e}"),
            Self::Config(msg) => format!("Could not read settings: {msg}"),
            Self::NotFound(what) => format!("{what} no longer exists"),
            Self::InvalidInput(msg) => msg.clone(),
            Self::ConstraintViolation(msg) => msg.clone(),
            Self::Sync(e) => format!("Backup failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_passes_validation_text_through() {
        let e = Error::InvalidInput("Folder name cannot be empty".to_string());
        assert_eq!(e.user_message(), "Folder name cannot be empty");
    }

    #[test]
    fn test_user_message_hides_database_detail() {
        let e = Error::Database(rusqlite::Error::InvalidQuery);
        assert!(e.user_message().contains("not stored"));
    }

    #[test]
    fn test_sync_error_converts() {
        let e: Error = SyncError::Timeout.into();
        assert!(matches!(e, Error::Sync(SyncError::Timeout)));
        assert!(e.user_message().starts_with("Backup failed"));
    }
}
