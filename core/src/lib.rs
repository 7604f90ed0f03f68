pub mod config;
pub mod deferred;
pub mod editor;
pub mod error;
pub mod models;
pub mod notebook;
pub mod render;
pub mod resolver;
pub mod storage;
pub mod sync;
pub mod tree;

pub use config::{default_data_dir, load_config, Config};
pub use editor::EditorSession;
pub use error::{Error, Result};
pub use models::{Folder, Note, RepoId, Snapshot, SyncSettings, Theme};
pub use notebook::{MoveOutcome, Notebook};
pub use resolver::Resolution;
pub use storage::Database;
pub use sync::{BackupSync, SyncError, SyncGateway, SyncOutcome, SyncReport};
pub use tree::{FolderEntry, NoteEntry, TreeView};

#[cfg(feature = "github")]
pub use sync::GitHubGateway;
