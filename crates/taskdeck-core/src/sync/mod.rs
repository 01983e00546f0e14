//! External-calendar synchronization.
//!
//! Keeps each task consistent with at most one remote calendar event.
//! Remote failures never propagate: the token broker and the gateway report
//! neutral outcomes and callers skip sync for that call. Best-effort, no
//! retries, no queue.

pub mod gateway;
pub mod reconciler;
pub mod token;

pub use gateway::{CalendarGateway, EventDraft};
pub use reconciler::{SyncAction, SyncIntent, SyncReconciler};
pub use token::TokenBroker;

/// OAuth client and endpoint configuration for the calendar provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Token-refresh endpoint.
    pub token_url: String,
    /// Events collection endpoint; single events live at `{events_url}/{id}`.
    pub events_url: String,
}

impl ProviderConfig {
    /// Configuration for the Google Calendar API.
    pub fn google(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            events_url: "https://www.googleapis.com/calendar/v3/calendars/primary/events"
                .to_string(),
        }
    }

    /// Read Google client credentials from `GOOGLE_CLIENT_ID` /
    /// `GOOGLE_CLIENT_SECRET`. Returns `None` when either is unset.
    pub fn google_from_env() -> Option<Self> {
        let client_id = std::env::var("GOOGLE_CLIENT_ID").ok()?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET").ok()?;
        Some(Self::google(client_id, client_secret))
    }

    /// Override the token endpoint (tests point this at a local server).
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Override the events endpoint (tests point this at a local server).
    pub fn with_events_url(mut self, url: impl Into<String>) -> Self {
        self.events_url = url.into();
        self
    }
}
