//! Shared construction for CLI commands.

use std::sync::Arc;

use taskdeck_core::{CalendarGateway, ProviderConfig, SyncReconciler, TaskMutator, TokenBroker};

use crate::store::{data_dir, JsonTaskStore, KeyringCredentialStore};

/// Explicit caller identity. Unset means signed out: task writes still work
/// but calendar sync is skipped.
pub fn current_user() -> Option<String> {
    std::env::var("TASKDECK_USER").ok().filter(|u| !u.is_empty())
}

fn provider_config() -> ProviderConfig {
    ProviderConfig::google_from_env()
        .unwrap_or_else(|| ProviderConfig::google(String::new(), String::new()))
}

pub fn mutator() -> Result<TaskMutator, Box<dyn std::error::Error>> {
    let config = provider_config();
    let broker = TokenBroker::new(config.clone(), Arc::new(KeyringCredentialStore::new()));
    let gateway = CalendarGateway::new(&config);
    let tasks = Arc::new(JsonTaskStore::open(data_dir()?.join("tasks.json"))?);
    Ok(TaskMutator::new(tasks, SyncReconciler::new(broker, gateway)))
}
