mod folder;
mod note;
mod settings;
mod snapshot;

pub use folder::Folder;
pub use note::{derive_title, title_of, Note};
pub use settings::{RepoId, SyncSettings, Theme};
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};

/// Generate a fresh record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
