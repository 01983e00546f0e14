//! Decides which remote calendar operation a task mutation requires.
//!
//! Reconciliation compares the desired sync state against the current
//! remote-link state and issues the minimal corrective operation. The whole
//! state machine is the four-cell table in [`plan`]; replaying an intent
//! against the state a run produced converges instead of drifting.

use tracing::debug;

use super::gateway::{CalendarGateway, EventDraft};
use super::token::TokenBroker;

/// Desired vs. current remote-link state for one task mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncIntent {
    /// Should a remote event exist after this mutation?
    pub desired_sync: bool,
    /// Does one exist now?
    pub current_link: Option<String>,
}

/// The minimal remote operation realizing a [`SyncIntent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Link state already matches the intent.
    None,
    /// No event exists and one should.
    Create,
    /// An event exists and should stay: patch it in place.
    Update(String),
    /// An event exists and should not: delete it and clear the link.
    Delete(String),
}

/// The reconciliation decision table, evaluated once per task write.
pub fn plan(intent: &SyncIntent) -> SyncAction {
    match (&intent.current_link, intent.desired_sync) {
        (None, false) => SyncAction::None,
        (None, true) => SyncAction::Create,
        (Some(id), true) => SyncAction::Update(id.clone()),
        (Some(id), false) => SyncAction::Delete(id.clone()),
    }
}

/// Executes reconciliation decisions against the calendar provider.
pub struct SyncReconciler {
    broker: TokenBroker,
    gateway: CalendarGateway,
}

impl SyncReconciler {
    pub fn new(broker: TokenBroker, gateway: CalendarGateway) -> Self {
        Self { broker, gateway }
    }

    /// Plan and execute the remote operation for one mutation, returning the
    /// remote link the caller must persist.
    ///
    /// Without a valid token the planned action is skipped entirely and the
    /// link is returned unchanged; a later successful mutation converges it.
    /// A failed create yields no link, never a dangling unrecorded event.
    pub async fn reconcile(
        &self,
        user_id: &str,
        draft: &EventDraft,
        intent: SyncIntent,
    ) -> Option<String> {
        let action = plan(&intent);
        if action == SyncAction::None {
            return intent.current_link;
        }

        let Some(token) = self.broker.valid_access_token(user_id).await else {
            debug!(user_id, "sync skipped: no valid access token");
            return intent.current_link;
        };

        match action {
            SyncAction::None => intent.current_link,
            SyncAction::Create => self.gateway.create_event(&token, draft).await,
            SyncAction::Update(event_id) => {
                self.gateway.update_event(&token, &event_id, draft).await;
                Some(event_id)
            }
            SyncAction::Delete(event_id) => {
                self.gateway.delete_event(&token, &event_id).await;
                None
            }
        }
    }

    /// Unconditional cleanup before a task row is removed: best-effort delete
    /// of its linked event. Deletion needs no desired-sync concept.
    pub async fn cleanup(&self, user_id: &str, event_id: &str) {
        let Some(token) = self.broker.valid_access_token(user_id).await else {
            debug!(user_id, "cleanup skipped: no valid access token");
            return;
        };
        self.gateway.delete_event(&token, event_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn intent(desired_sync: bool, current_link: Option<&str>) -> SyncIntent {
        SyncIntent {
            desired_sync,
            current_link: current_link.map(String::from),
        }
    }

    #[test]
    fn decision_table() {
        assert_eq!(plan(&intent(false, None)), SyncAction::None);
        assert_eq!(plan(&intent(true, None)), SyncAction::Create);
        assert_eq!(
            plan(&intent(true, Some("evt_1"))),
            SyncAction::Update("evt_1".to_string())
        );
        assert_eq!(
            plan(&intent(false, Some("evt_1"))),
            SyncAction::Delete("evt_1".to_string())
        );
    }

    /// Apply an action to a link the way a fully successful execution would.
    fn apply(action: &SyncAction, link: Option<String>) -> Option<String> {
        match action {
            SyncAction::None => link,
            SyncAction::Create => Some("evt_new".to_string()),
            SyncAction::Update(id) => Some(id.clone()),
            SyncAction::Delete(_) => None,
        }
    }

    #[test]
    fn delete_then_replay_is_noop() {
        let first = plan(&intent(false, Some("evt_1")));
        let link = apply(&first, Some("evt_1".to_string()));
        assert_eq!(link, None);
        assert_eq!(
            plan(&SyncIntent {
                desired_sync: false,
                current_link: link,
            }),
            SyncAction::None
        );
    }

    proptest! {
        /// Replaying an intent against the state its execution produced never
        /// creates or deletes again: the link is a fixed point.
        #[test]
        fn replanning_converges(desired in any::<bool>(), link in proptest::option::of("[a-z0-9]{8}")) {
            let first = plan(&SyncIntent { desired_sync: desired, current_link: link.clone() });
            let after = apply(&first, link);

            let second = plan(&SyncIntent { desired_sync: desired, current_link: after.clone() });
            let after_replay = apply(&second, after.clone());

            prop_assert_eq!(after_replay, after);
            prop_assert!(!matches!(second, SyncAction::Create | SyncAction::Delete(_)));
        }
    }
}
