use crate::{Error, Result};
use rusqlite::Connection as SqliteConnection;
use std::fs;
use std::path::{Path, PathBuf};

pub type Connection = SqliteConnection;

/// Newest layout this build knows how to read.
pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = include_str!("../../schema.sql");

pub struct Database {
    file: PathBuf,
}

impl Database {
    pub fn new<P: AsRef<Path>>(file: P) -> Self {
        Self {
            file: file.as_ref().to_path_buf(),
        }
    }

    pub fn exists(&self) -> bool {
        self.file.exists()
    }

    /// Open the store file, creating it (and its directory) on first use.
    pub fn open(&self) -> Result<Connection> {
        let fresh = !self.exists();
        if let Some(dir) = self.file.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let conn = SqliteConnection::open(&self.file)?;
        prepare(&conn)?;
        if fresh {
            log::info!("created store at {}", self.file.display());
        } else {
            log::debug!("opened store at {}", self.file.display());
        }
        Ok(conn)
    }

    /// A store that lives only as long as the returned connection.
    pub fn in_memory() -> Result<Connection> {
        let conn = SqliteConnection::open_in_memory()?;
        prepare(&conn)?;
        Ok(conn)
    }

    pub fn schema_version(conn: &Connection) -> Result<i32> {
        let raw: String = conn.query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )?;
        raw.trim()
            .parse()
            .map_err(|_| Error::Config(format!("unreadable schema version '{}'", raw)))
    }
}

fn prepare(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    let version = Database::schema_version(conn)?;
    if version > SCHEMA_VERSION {
        return Err(Error::Config(format!(
            "store uses schema {} but this build only understands up to {}",
            version, SCHEMA_VERSION
        )));
    }
    Ok(())
}
