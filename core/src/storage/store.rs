use crate::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Keys of the persisted layout.
pub mod keys {
    pub const THEME: &str = "theme";
    pub const NOTES: &str = "notes";
    pub const FOLDERS: &str = "folders";
    pub const GITHUB_TOKEN: &str = "github.token";
    pub const GITHUB_REPO: &str = "github.repo";
    pub const GITHUB_LAST_SYNC: &str = "github.lastSync";
}

/// Durable key → JSON value mapping.
pub struct Store;

impl Store {
    /// Read a value, `None` if the key was never written
    pub fn get<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Read a value, falling back to `default` when the key is absent
    pub fn get_or<T: DeserializeOwned>(conn: &Connection, key: &str, default: T) -> Result<T> {
        Ok(Self::get(conn, key)?.unwrap_or(default))
    }

    /// Write a single value
    pub fn set<T: Serialize + ?Sized>(conn: &Connection, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        Self::put(conn, key, &json)?;
        log::debug!("store: wrote {} ({} bytes)", key, json.len());
        Ok(())
    }

    /// Write several pre-serialised values atomically
    pub fn set_many(conn: &Connection, entries: &[(&str, String)]) -> Result<()> {
        let tx = conn.unchecked_transaction()?;
        for (key, json) in entries {
            Self::put(&tx, key, json)?;
        }
        tx.commit()?;
        log::debug!("store: wrote {} keys in one transaction", entries.len());
        Ok(())
    }

    fn put(conn: &Connection, key: &str, json: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, json],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn test_get_missing_uses_default() {
        let conn = Database::in_memory().unwrap();
        let value: Vec<String> = Store::get_or(&conn, "absent", vec!["x".to_string()]).unwrap();
        assert_eq!(value, vec!["x".to_string()]);
        assert!(Store::get::<String>(&conn, "absent").unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let conn = Database::in_memory().unwrap();
        Store::set(&conn, "k", &1).unwrap();
        Store::set(&conn, "k", &2).unwrap();
        assert_eq!(Store::get::<i32>(&conn, "k").unwrap(), Some(2));
    }

    #[test]
    fn test_set_many_is_atomic() {
        let conn = Database::in_memory().unwrap();
        Store::set_many(
            &conn,
            &[("a", "1".to_string()), ("b", "2".to_string())],
        )
        .unwrap();
        assert_eq!(Store::get::<i32>(&conn, "a").unwrap(), Some(1));
        assert_eq!(Store::get::<i32>(&conn, "b").unwrap(), Some(2));

        conn.execute_batch("DROP TABLE kv").unwrap();
        assert!(Store::set_many(&conn, &[("a", "3".to_string())]).is_err());
    }
}
