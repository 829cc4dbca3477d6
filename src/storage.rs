use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::StateFile;

/// The fixed storage key: one JSON document holding the whole snapshot.
const DATA_FILE: &str = "daylist.json";
const BACKUP_DIR: &str = "backups";
const BACKUP_LIMIT: usize = 5;

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Io(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        StorageError::Json(value)
    }
}

pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(self.root.join(BACKUP_DIR))?;
        Ok(())
    }

    pub fn load_state(&self) -> Result<StateFile, StorageError> {
        self.load_json(self.root.join(DATA_FILE))
    }

    pub fn save_state(&self, data: &StateFile, with_backup: bool) -> Result<(), StorageError> {
        let path = self.root.join(DATA_FILE);
        if with_backup && path.exists() {
            self.create_backup(&path)?;
        }
        self.write_atomic(path, data)
    }

    fn load_json<T: DeserializeOwned>(&self, path: PathBuf) -> Result<T, StorageError> {
        let mut file = File::open(path)?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        Ok(serde_json::from_str(&buf)?)
    }

    fn write_atomic<T: Serialize>(&self, path: PathBuf, data: &T) -> Result<(), StorageError> {
        let temp_path = path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(data)?;
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(temp_path, path)?;
        Ok(())
    }

    pub fn create_backup(&self, path: &Path) -> Result<(), StorageError> {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        let backup_name = format!("daylist-{timestamp}.json");
        let backup_path = self.root.join(BACKUP_DIR).join(backup_name);
        fs::copy(path, backup_path)?;
        self.trim_backups()?;
        Ok(())
    }

    pub fn list_backups(&self) -> Result<Vec<(String, i64)>, StorageError> {
        let mut entries: Vec<_> = fs::read_dir(self.root.join(BACKUP_DIR))?
            .filter_map(|entry| entry.ok())
            .collect();
        entries.sort_by_key(|entry| entry.metadata().and_then(|m| m.modified()).ok());
        let mut results = Vec::new();
        for entry in entries {
            if let Some(name) = entry.file_name().to_str() {
                let modified = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|time| time.duration_since(std::time::UNIX_EPOCH).ok())
                    .map(|dur| dur.as_secs() as i64)
                    .unwrap_or(0);
                results.push((name.to_string(), modified));
            }
        }
        Ok(results)
    }

    pub fn delete_backup(&self, filename: &str) -> Result<(), StorageError> {
        fs::remove_file(self.root.join(BACKUP_DIR).join(filename))?;
        Ok(())
    }

    pub fn restore_backup(&self, filename: &str) -> Result<StateFile, StorageError> {
        let path = self.root.join(BACKUP_DIR).join(filename);
        let data: StateFile = self.load_json(path)?;
        self.write_atomic(self.root.join(DATA_FILE), &data)?;
        Ok(data)
    }

    pub fn restore_from_path(&self, source: &Path) -> Result<StateFile, StorageError> {
        let data: StateFile = self.load_json(source.to_path_buf())?;
        self.write_atomic(self.root.join(DATA_FILE), &data)?;
        Ok(data)
    }

    fn trim_backups(&self) -> Result<(), StorageError> {
        let mut entries: Vec<_> = fs::read_dir(self.root.join(BACKUP_DIR))?
            .filter_map(|entry| entry.ok())
            .collect();
        entries.sort_by_key(|entry| entry.metadata().and_then(|m| m.modified()).ok());
        let to_remove = entries.len().saturating_sub(BACKUP_LIMIT);
        for entry in entries.into_iter().take(to_remove) {
            let _ = fs::remove_file(entry.path());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PersistedState;

    fn make_file() -> StateFile {
        StateFile {
            schema_version: 1,
            state: PersistedState::initial(1),
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.ensure_dirs().unwrap();

        storage.save_state(&make_file(), false).unwrap();
        assert!(dir.path().join(DATA_FILE).is_file());
        // The temp file used for the atomic write must be gone.
        assert!(!dir.path().join("daylist.tmp").exists());

        let loaded = storage.load_state().unwrap();
        assert_eq!(loaded.schema_version, 1);
        assert_eq!(loaded.state.projects.len(), 3);
    }

    #[test]
    fn load_fails_for_missing_or_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        assert!(matches!(
            storage.load_state(),
            Err(StorageError::Io(_))
        ));

        fs::write(dir.path().join(DATA_FILE), b"not json").unwrap();
        assert!(matches!(
            storage.load_state(),
            Err(StorageError::Json(_))
        ));
    }

    #[test]
    fn save_with_backup_copies_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.ensure_dirs().unwrap();

        // First save has nothing to back up.
        storage.save_state(&make_file(), true).unwrap();
        assert!(storage.list_backups().unwrap().is_empty());

        storage.save_state(&make_file(), true).unwrap();
        let backups = storage.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].0.starts_with("daylist-"));
    }

    #[test]
    fn trim_keeps_at_most_the_backup_limit() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.ensure_dirs().unwrap();

        let backup_dir = dir.path().join(BACKUP_DIR);
        for index in 0..(BACKUP_LIMIT + 3) {
            fs::write(backup_dir.join(format!("daylist-{index}.json")), b"{}").unwrap();
        }
        let data_path = dir.path().join(DATA_FILE);
        fs::write(&data_path, b"{}").unwrap();
        storage.create_backup(&data_path).unwrap();
        assert_eq!(storage.list_backups().unwrap().len(), BACKUP_LIMIT);
    }

    #[test]
    fn restore_backup_rewrites_the_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.ensure_dirs().unwrap();

        let mut file = make_file();
        file.state.selected_label_id = Some("urgent".to_string());
        let json = serde_json::to_vec_pretty(&file).unwrap();
        fs::write(dir.path().join(BACKUP_DIR).join("daylist-x.json"), json).unwrap();

        let restored = storage.restore_backup("daylist-x.json").unwrap();
        assert_eq!(restored.state.selected_label_id.as_deref(), Some("urgent"));

        let loaded = storage.load_state().unwrap();
        assert_eq!(loaded.state.selected_label_id.as_deref(), Some("urgent"));
    }

    #[test]
    fn delete_backup_removes_the_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.ensure_dirs().unwrap();

        let backup_dir = dir.path().join(BACKUP_DIR);
        fs::write(backup_dir.join("daylist-x.json"), b"{}").unwrap();
        storage.delete_backup("daylist-x.json").unwrap();
        assert!(storage.list_backups().unwrap().is_empty());
        assert!(storage.delete_backup("daylist-x.json").is_err());
    }
}
