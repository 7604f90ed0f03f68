use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A flat, single-level container for notes. Folders never nest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(name: String) -> Self {
        Self {
            id: super::new_id(),
            name,
            created_at: Utc::now(),
        }
    }
}
