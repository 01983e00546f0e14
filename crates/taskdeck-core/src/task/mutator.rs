//! Task mutation orchestration: validate, reconcile, persist, notify.
//!
//! Identity is explicit: every operation takes `user_id: Option<&str>`
//! instead of reading ambient session state. Signed-out writes skip
//! reconciliation entirely -- zero token lookups, zero gateway calls -- and
//! leave any remote link untouched.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::store::TaskStore;
use crate::sync::{EventDraft, SyncIntent, SyncReconciler};

use super::{DailyCount, StatusCounts, Task, TaskChange, TaskDraft, TaskStatus};

/// Hook fired after every successful mutation so cached views can refresh.
pub trait ChangeNotifier: Send + Sync {
    fn data_changed(&self);
}

struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn data_changed(&self) {}
}

/// Orchestrates task writes and their calendar side effects.
pub struct TaskMutator {
    store: Arc<dyn TaskStore>,
    reconciler: SyncReconciler,
    notifier: Arc<dyn ChangeNotifier>,
}

impl TaskMutator {
    pub fn new(store: Arc<dyn TaskStore>, reconciler: SyncReconciler) -> Self {
        Self {
            store,
            reconciler,
            notifier: Arc::new(NoopNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Create a task, creating a linked calendar event first when the draft
    /// asks for sync and the user is signed in with a usable token.
    pub async fn create_task(&self, user_id: Option<&str>, draft: TaskDraft) -> Result<Task> {
        draft.validate()?;

        let remote_event_id = match user_id {
            Some(uid) => {
                let intent = SyncIntent {
                    desired_sync: draft.sync_to_calendar,
                    current_link: None,
                };
                self.reconciler
                    .reconcile(uid, &draft_event(&draft), intent)
                    .await
            }
            // Tasks created while signed out have no remote link by construction.
            None => None,
        };

        let now = Utc::now();
        let task = self.store.create(Task {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description.unwrap_or_default(),
            status: draft.status,
            priority: draft.priority,
            due_date: draft.due_date,
            remote_event_id,
            user_id: user_id.map(String::from),
            created_at: now,
            updated_at: now,
        })?;

        self.notifier.data_changed();
        Ok(task)
    }

    /// Update a task, converging its calendar event toward the change's
    /// desired sync state.
    pub async fn update_task(
        &self,
        user_id: Option<&str>,
        id: &str,
        change: TaskChange,
    ) -> Result<Task> {
        change.validate()?;

        let mut task = self
            .store
            .find_by_id(id)?
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;

        let remote_event_id = match user_id {
            Some(uid) => {
                let intent = SyncIntent {
                    desired_sync: change.sync_to_calendar,
                    current_link: task.remote_event_id.clone(),
                };
                self.reconciler
                    .reconcile(uid, &change_event(&change), intent)
                    .await
            }
            None => task.remote_event_id.clone(),
        };

        task.title = change.title;
        task.description = change.description;
        task.status = change.status;
        task.priority = change.priority;
        task.due_date = change.due_date;
        task.remote_event_id = remote_event_id;
        task.updated_at = Utc::now();

        let task = self.store.update(task)?;
        self.notifier.data_changed();
        Ok(task)
    }

    /// Delete a task. A linked calendar event is deleted best-effort first;
    /// the local delete proceeds regardless of the remote outcome.
    pub async fn delete_task(&self, user_id: Option<&str>, id: &str) -> Result<()> {
        let task = self
            .store
            .find_by_id(id)?
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;

        if let (Some(uid), Some(event_id)) = (user_id, task.remote_event_id.as_deref()) {
            self.reconciler.cleanup(uid, event_id).await;
        }

        self.store.delete(id)?;
        self.notifier.data_changed();
        Ok(())
    }

    /// All tasks visible to the caller, newest first. Signed-out callers see
    /// every task (local single-user mode); signed-in callers see their own.
    pub fn tasks(&self, user_id: Option<&str>) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .store
            .list()?
            .into_iter()
            .filter(|task| match user_id {
                Some(uid) => task.user_id.as_deref() == Some(uid),
                None => true,
            })
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    pub fn task(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.store.find_by_id(id)?)
    }

    /// Per-status counts for the caller's tasks.
    pub fn count_by_status(&self, user_id: Option<&str>) -> Result<StatusCounts> {
        let mut counts = StatusCounts::default();
        for task in self.tasks(user_id)? {
            match task.status {
                TaskStatus::Starting => counts.starting += 1,
                TaskStatus::Progress => counts.progress += 1,
                TaskStatus::Done => counts.done += 1,
            }
        }
        Ok(counts)
    }

    /// Tasks created per UTC day over the last seven days, zero-filled.
    /// Signed-out callers get the zero-filled frame with no data.
    pub fn created_per_day(&self, user_id: Option<&str>) -> Result<Vec<DailyCount>> {
        let today = Utc::now().date_naive();
        let days: Vec<_> = (0..7i64).rev().map(|i| today - Duration::days(i)).collect();

        let mut frame: Vec<DailyCount> = days
            .iter()
            .map(|day| DailyCount {
                date: day.format("%b %-d").to_string(),
                count: 0,
            })
            .collect();

        let Some(uid) = user_id else {
            return Ok(frame);
        };

        for task in self.tasks(Some(uid))? {
            let created = task.created_at.date_naive();
            if let Some(pos) = days.iter().position(|day| *day == created) {
                frame[pos].count += 1;
            }
        }
        Ok(frame)
    }

    /// Most recently created tasks for the caller; empty when signed out.
    pub fn recent_tasks(&self, user_id: Option<&str>, limit: usize) -> Result<Vec<Task>> {
        let Some(uid) = user_id else {
            return Ok(Vec::new());
        };
        let mut tasks = self.tasks(Some(uid))?;
        tasks.truncate(limit);
        Ok(tasks)
    }
}

fn draft_event(draft: &TaskDraft) -> EventDraft {
    EventDraft {
        title: draft.title.clone(),
        description: draft.description.clone().unwrap_or_default(),
        due_date: draft.due_date,
    }
}

fn change_event(change: &TaskChange) -> EventDraft {
    EventDraft {
        title: change.title.clone(),
        description: change.description.clone(),
        due_date: change.due_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::store::{MemoryCredentialStore, MemoryTaskStore};
    use crate::sync::{CalendarGateway, ProviderConfig, TokenBroker};
    use crate::task::TaskPriority;

    struct CountingNotifier(AtomicUsize);

    impl ChangeNotifier for CountingNotifier {
        fn data_changed(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Mutator wired to empty stores and unreachable endpoints. Signed-out
    /// and sync-disabled paths must never touch either.
    fn offline_mutator() -> (TaskMutator, Arc<MemoryTaskStore>, Arc<CountingNotifier>) {
        let config = ProviderConfig::google("", "")
            .with_token_url("http://127.0.0.1:9/token")
            .with_events_url("http://127.0.0.1:9/events");
        let creds = Arc::new(MemoryCredentialStore::new());
        let broker = TokenBroker::new(config.clone(), creds);
        let gateway = CalendarGateway::new(&config);
        let store = Arc::new(MemoryTaskStore::new());
        let notifier = Arc::new(CountingNotifier(AtomicUsize::new(0)));
        let mutator = TaskMutator::new(
            Arc::clone(&store) as Arc<dyn TaskStore>,
            SyncReconciler::new(broker, gateway),
        )
        .with_notifier(Arc::clone(&notifier) as Arc<dyn ChangeNotifier>);
        (mutator, store, notifier)
    }

    fn draft(title: &str, sync: bool) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: None,
            status: TaskStatus::Starting,
            priority: Some(TaskPriority::Medium),
            due_date: None,
            sync_to_calendar: sync,
        }
    }

    #[tokio::test]
    async fn signed_out_create_has_no_remote_link() {
        let (mutator, _, notifier) = offline_mutator();
        let task = mutator
            .create_task(None, draft("Write launch notes", true))
            .await
            .unwrap();

        assert!(task.remote_event_id.is_none());
        assert!(task.user_id.is_none());
        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sync_disabled_create_plans_nothing() {
        let (mutator, _, _) = offline_mutator();
        // Endpoints are unreachable; reaching them would error into None,
        // but the (no link, no sync) row must not even look up a token.
        let task = mutator
            .create_task(Some("user-1"), draft("Write launch notes", false))
            .await
            .unwrap();
        assert!(task.remote_event_id.is_none());
        assert_eq!(task.user_id.as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected() {
        let (mutator, store, notifier) = offline_mutator();
        let err = mutator
            .create_task(None, draft("abc", false))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::CoreError::Validation(_)));
        assert!(store.list().unwrap().is_empty());
        assert_eq!(notifier.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn signed_out_update_leaves_link_untouched() {
        let (mutator, store, _) = offline_mutator();
        let task = mutator
            .create_task(None, draft("Write launch notes", false))
            .await
            .unwrap();

        // Simulate a link established by an earlier signed-in session.
        let mut linked = store.find_by_id(&task.id).unwrap().unwrap();
        linked.remote_event_id = Some("evt_1".to_string());
        store.update(linked).unwrap();

        let updated = mutator
            .update_task(
                None,
                &task.id,
                TaskChange {
                    title: "Write launch notes".to_string(),
                    description: String::new(),
                    status: TaskStatus::Done,
                    priority: None,
                    due_date: None,
                    sync_to_calendar: false,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.remote_event_id.as_deref(), Some("evt_1"));
        assert_eq!(updated.status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn queries_filter_by_owner() {
        let (mutator, _, _) = offline_mutator();
        mutator
            .create_task(Some("user-1"), draft("Write launch notes", false))
            .await
            .unwrap();
        mutator
            .create_task(Some("user-2"), draft("Review budget sheet", false))
            .await
            .unwrap();
        let mut done = draft("Archive old sprints", false);
        done.status = TaskStatus::Done;
        mutator.create_task(Some("user-1"), done).await.unwrap();

        assert_eq!(mutator.tasks(Some("user-1")).unwrap().len(), 2);
        assert_eq!(mutator.tasks(None).unwrap().len(), 3);

        let counts = mutator.count_by_status(Some("user-1")).unwrap();
        assert_eq!(counts.starting, 1);
        assert_eq!(counts.done, 1);
        assert_eq!(counts.progress, 0);

        assert!(mutator.recent_tasks(None, 8).unwrap().is_empty());
        assert_eq!(mutator.recent_tasks(Some("user-1"), 1).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn created_per_day_is_zero_filled() {
        let (mutator, _, _) = offline_mutator();
        mutator
            .create_task(Some("user-1"), draft("Write launch notes", false))
            .await
            .unwrap();

        let frame = mutator.created_per_day(Some("user-1")).unwrap();
        assert_eq!(frame.len(), 7);
        assert_eq!(frame.iter().map(|d| d.count).sum::<usize>(), 1);
        assert_eq!(frame[6].count, 1);

        // Signed out: same frame, no data.
        let empty = mutator.created_per_day(None).unwrap();
        assert_eq!(empty.len(), 7);
        assert!(empty.iter().all(|d| d.count == 0));
    }

    #[tokio::test]
    async fn delete_missing_task_is_an_error() {
        let (mutator, _, notifier) = offline_mutator();
        let err = mutator.delete_task(None, "nope").await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Store(StoreError::TaskNotFound(_))
        ));
        assert_eq!(notifier.0.load(Ordering::SeqCst), 0);
    }
}
