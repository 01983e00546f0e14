//! # Taskdeck Core Library
//!
//! This library provides the core business logic for Taskdeck: task records
//! and the machinery that keeps each task consistent with at most one event
//! in the user's external calendar. All operations are available to any
//! frontend; the bundled CLI binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Task model**: task records with status/priority, input validation,
//!   and the remote-link field tying a task to its calendar event
//! - **Storage**: capability traits for task and credential persistence,
//!   with an in-memory implementation; durable backends live in the frontend
//! - **Sync**: OAuth token lifecycle, the calendar events API client, and
//!   the reconciler that decides which remote operation a mutation needs
//!
//! ## Key Components
//!
//! - [`TaskMutator`]: orchestrates task writes and their calendar side effects
//! - [`SyncReconciler`]: minimal-corrective-action decision core
//! - [`TokenBroker`]: returns a valid access token, refreshing when expired
//! - [`CalendarGateway`]: create/patch/delete of single calendar events

pub mod error;
pub mod store;
pub mod sync;
pub mod task;

pub use error::{CoreError, StoreError, ValidationError};
pub use store::{CredentialRecord, CredentialStore, TaskStore, TokenUpdate};
pub use sync::{
    CalendarGateway, EventDraft, ProviderConfig, SyncAction, SyncIntent, SyncReconciler,
    TokenBroker,
};
pub use task::{
    ChangeNotifier, DailyCount, StatusCounts, Task, TaskChange, TaskDraft, TaskMutator,
    TaskPriority, TaskStatus,
};
