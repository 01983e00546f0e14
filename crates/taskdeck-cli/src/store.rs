//! Durable backends for the core's storage capabilities.
//!
//! Tasks live in a JSON file under the data directory; credentials live in
//! the OS keyring, one entry per (provider, user) pair.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use taskdeck_core::error::StoreError;
use taskdeck_core::store::{CredentialRecord, CredentialStore, TaskStore, TokenUpdate};
use taskdeck_core::Task;

const KEYRING_SERVICE: &str = "taskdeck";

/// Returns `~/.config/taskdeck[-dev]/` based on TASKDECK_ENV, or the
/// directory named by TASKDECK_DATA_DIR when set.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    if let Ok(dir) = std::env::var("TASKDECK_DATA_DIR") {
        let dir = PathBuf::from(dir);
        fs::create_dir_all(&dir)?;
        return Ok(dir);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TASKDECK_ENV").unwrap_or_else(|_| "production".to_string());
    let dir = if env == "dev" {
        base_dir.join("taskdeck-dev")
    } else {
        base_dir.join("taskdeck")
    };

    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Task records persisted as a single JSON document.
pub struct JsonTaskStore {
    path: PathBuf,
    tasks: Mutex<HashMap<String, Task>>,
}

impl JsonTaskStore {
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let tasks = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            tasks: Mutex::new(tasks),
        })
    }

    fn persist(&self, tasks: &HashMap<String, Task>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(tasks)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl TaskStore for JsonTaskStore {
    fn create(&self, task: Task) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.insert(task.id.clone(), task.clone());
        self.persist(&tasks)?;
        Ok(task)
    }

    fn update(&self, task: Task) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        if !tasks.contains_key(&task.id) {
            return Err(StoreError::TaskNotFound(task.id));
        }
        tasks.insert(task.id.clone(), task.clone());
        self.persist(&tasks)?;
        Ok(task)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        tasks
            .remove(id)
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;
        self.persist(&tasks)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.values().cloned().collect())
    }
}

/// Credentials in the OS keyring, JSON-encoded per entry.
pub struct KeyringCredentialStore;

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self
    }

    fn entry(user_id: &str, provider: &str) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(KEYRING_SERVICE, &format!("{provider}:{user_id}"))
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    /// Store a full credential record, as the auth handshake would.
    pub fn insert(
        &self,
        user_id: &str,
        provider: &str,
        record: &CredentialRecord,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(record)?;
        Self::entry(user_id, provider)?
            .set_password(&raw)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    pub fn remove(&self, user_id: &str, provider: &str) -> Result<(), StoreError> {
        match Self::entry(user_id, provider)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, user_id: &str, provider: &str) -> Result<Option<CredentialRecord>, StoreError> {
        match Self::entry(user_id, provider)?.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }

    fn update(
        &self,
        user_id: &str,
        provider: &str,
        update: TokenUpdate,
    ) -> Result<(), StoreError> {
        let mut record = self.get(user_id, provider)?.ok_or_else(|| {
            StoreError::Backend(format!("no credential record for user {user_id}"))
        })?;
        record.access_token = update.access_token;
        record.expires_at = Some(update.expires_at);
        self.insert(user_id, provider, &record)
    }
}
