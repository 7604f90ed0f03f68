mod database;
mod folder_repository;
mod note_repository;
mod settings_repository;
mod store;

pub use database::{Connection, Database};
pub use folder_repository::FolderRepository;
pub use note_repository::NoteRepository;
pub use settings_repository::SettingsRepository;
pub use store::{keys, Store};
