//! Daylist core: the task store behind a local to-do organizer.
//!
//! The presentation layer opens a [`TaskStore`] over a data directory,
//! mutates it through commands, and renders the derived views. State is
//! written through to one JSON document after every command.

pub mod logging;
pub mod models;
pub mod recur;
pub mod state;
pub mod storage;
pub mod store;
pub mod views;

pub use models::{
    Frequency, Label, LabelPatch, NewTask, PersistedState, Project, ProjectPatch, Recurrence,
    StateFile, Task, TaskPatch, Timestamp, ViewMode, INBOX_PROJECT_ID,
};
pub use state::AppState;
pub use storage::{Storage, StorageError};
pub use store::{BackupEntry, TaskStore};
