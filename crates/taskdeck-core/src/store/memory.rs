//! In-memory store implementations.
//!
//! Used by the test suites and by sessions that do not need durability.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::task::Task;

use super::{CredentialRecord, CredentialStore, TaskStore, TokenUpdate};

/// Credential records held in a process-local map.
#[derive(Default)]
pub struct MemoryCredentialStore {
    records: Mutex<HashMap<(String, String), CredentialRecord>>,
    update_calls: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a credential record, as the out-of-scope auth handshake would.
    pub fn insert(&self, user_id: &str, provider: &str, record: CredentialRecord) {
        self.records
            .lock()
            .unwrap()
            .insert((user_id.to_string(), provider.to_string()), record);
    }

    /// How many times `update` has been called.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, user_id: &str, provider: &str) -> Result<Option<CredentialRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .get(&(user_id.to_string(), provider.to_string()))
            .cloned())
    }

    fn update(
        &self,
        user_id: &str,
        provider: &str,
        update: TokenUpdate,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&(user_id.to_string(), provider.to_string()))
            .ok_or_else(|| {
                StoreError::Backend(format!("no credential record for user {user_id}"))
            })?;
        record.access_token = update.access_token;
        record.expires_at = Some(update.expires_at);
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Task records held in a process-local map.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<HashMap<String, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for MemoryTaskStore {
    fn create(&self, task: Task) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    fn update(&self, task: Task) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        if !tasks.contains_key(&task.id) {
            return Err(StoreError::TaskNotFound(task.id));
        }
        tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        tasks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))
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
