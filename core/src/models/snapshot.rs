use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Folder, Note};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything pushed to the remote backup in one piece.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub notes: Vec<Note>,
    pub folders: Vec<Folder>,
    pub last_sync: DateTime<Utc>,
    pub version: u32,
}

impl Snapshot {
    pub fn new(notes: Vec<Note>, folders: Vec<Folder>, taken_at: DateTime<Utc>) -> Self {
        Self {
            notes,
            folders,
            last_sync: taken_at,
            version: SNAPSHOT_VERSION,
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}
