use crate::models::{RepoId, SyncSettings, Theme};
use crate::storage::{keys, Store};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

pub struct SettingsRepository;

impl SettingsRepository {
    /// Stored theme, or the default one
    pub fn theme(conn: &Connection) -> Result<Theme> {
        Store::get_or(conn, keys::THEME, Theme::default())
    }

    pub fn set_theme(conn: &Connection, theme: &Theme) -> Result<()> {
        Store::set(conn, keys::THEME, theme)
    }

    pub fn sync_settings(conn: &Connection) -> Result<SyncSettings> {
        Ok(SyncSettings {
            token: Store::get(conn, keys::GITHUB_TOKEN)?,
            repo: Store::get(conn, keys::GITHUB_REPO)?,
            last_sync: Store::get_or(conn, keys::GITHUB_LAST_SYNC, None)?,
        })
    }

    /// Store GitHub credentials after validating them
    pub fn set_github_auth(conn: &Connection, token: &str, repo: &str) -> Result<RepoId> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::InvalidInput("GitHub token cannot be empty".to_string()));
        }
        let repo_id = RepoId::parse(repo)?;

        Store::set_many(
            conn,
            &[
                (keys::GITHUB_TOKEN, serde_json::to_string(token)?),
                (keys::GITHUB_REPO, serde_json::to_string(&repo_id.to_string())?),
            ],
        )?;
        Ok(repo_id)
    }

    pub fn set_last_sync(conn: &Connection, at: DateTime<Utc>) -> Result<()> {
        Store::set(conn, keys::GITHUB_LAST_SYNC, &Some(at))
    }
}
