//! Storage capability traits consumed by the sync core.
//!
//! The core never owns durable storage. Frontends supply implementations of
//! [`TaskStore`] and [`CredentialStore`]; the bundled [`memory`] stores back
//! tests and ephemeral sessions.

pub mod memory;

pub use memory::{MemoryCredentialStore, MemoryTaskStore};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::task::Task;

/// Calendar provider identifier used as the credential-record key.
pub const PROVIDER_GOOGLE: &str = "google";

/// Stored OAuth credentials for one (user, provider) pair.
///
/// A past `expires_at` means `access_token` is invalid and must be refreshed
/// before use. Only the token broker writes this record back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds). Absent means the provider reported no expiry.
    pub expires_at: Option<i64>,
}

/// Fields written back after a successful token refresh.
#[derive(Debug, Clone)]
pub struct TokenUpdate {
    pub access_token: String,
    pub expires_at: i64,
}

/// Per-user credential persistence. At-least-once durability of the latest
/// `update` is assumed.
pub trait CredentialStore: Send + Sync {
    fn get(&self, user_id: &str, provider: &str) -> Result<Option<CredentialRecord>, StoreError>;

    fn update(&self, user_id: &str, provider: &str, update: TokenUpdate)
        -> Result<(), StoreError>;
}

/// Durable task records keyed by task id.
pub trait TaskStore: Send + Sync {
    fn create(&self, task: Task) -> Result<Task, StoreError>;

    /// Replaces the stored record with the same id.
    fn update(&self, task: Task) -> Result<Task, StoreError>;

    fn delete(&self, id: &str) -> Result<(), StoreError>;

    fn find_by_id(&self, id: &str) -> Result<Option<Task>, StoreError>;

    fn list(&self) -> Result<Vec<Task>, StoreError>;
}
