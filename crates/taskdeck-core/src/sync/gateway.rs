//! Calendar events API client: create, patch, delete single events.
//!
//! Every operation is best-effort. Transport faults and non-success statuses
//! are logged and swallowed; `create_event` reports them as `None`. A local
//! task write must never fail because the provider was unreachable.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ProviderConfig;

/// Sync-relevant task fields sent to the calendar provider.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
}

/// Request body for event create/patch calls.
#[derive(Debug, Serialize)]
struct EventBody {
    summary: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<EventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<EventTime>,
}

#[derive(Debug, Serialize)]
struct EventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    #[serde(rename = "timeZone")]
    time_zone: &'static str,
}

impl EventTime {
    /// Date-only, for all-day events. A due date is a date, not an instant.
    fn all_day(date: NaiveDate) -> Self {
        Self {
            date: Some(date.format("%Y-%m-%d").to_string()),
            date_time: None,
            time_zone: "UTC",
        }
    }

    fn at(instant: DateTime<Utc>) -> Self {
        Self {
            date: None,
            date_time: Some(instant.to_rfc3339()),
            time_zone: "UTC",
        }
    }
}

impl EventBody {
    /// Full body for a create call: an all-day event on the due date, or a
    /// one-hour timed event starting now when there is none.
    fn for_create(draft: &EventDraft) -> Self {
        let (start, end) = match draft.due_date {
            Some(date) => (EventTime::all_day(date), EventTime::all_day(date)),
            None => {
                let now = Utc::now();
                (EventTime::at(now), EventTime::at(now + Duration::hours(1)))
            }
        };
        Self {
            summary: draft.title.clone(),
            description: draft.description.clone(),
            start: Some(start),
            end: Some(end),
        }
    }

    /// Partial body for a patch call: summary and description always, date
    /// fields only when the draft carries a due date.
    fn for_patch(draft: &EventDraft) -> Self {
        let times = draft
            .due_date
            .map(|date| (EventTime::all_day(date), EventTime::all_day(date)));
        let (start, end) = match times {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        };
        Self {
            summary: draft.title.clone(),
            description: draft.description.clone(),
            start,
            end,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
}

/// Stateless client for single-event operations, given a valid access token.
pub struct CalendarGateway {
    events_url: String,
    http: Client,
}

impl CalendarGateway {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            events_url: config.events_url.clone(),
            http: Client::new(),
        }
    }

    /// Create an event for the draft. Returns the provider-assigned id, or
    /// `None` on any failure.
    pub async fn create_event(&self, token: &str, draft: &EventDraft) -> Option<String> {
        let body = EventBody::for_create(draft);
        let resp = match self
            .http
            .post(&self.events_url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                warn!(%err, "calendar event create request failed");
                return None;
            }
        };

        if !resp.status().is_success() {
            warn!(status = %resp.status(), "calendar event create rejected");
            return None;
        }

        match resp.json::<CreatedEvent>().await {
            Ok(event) => {
                debug!(event_id = %event.id, "calendar event created");
                Some(event.id)
            }
            Err(err) => {
                warn!(%err, "malformed calendar event create response");
                None
            }
        }
    }

    /// Patch an existing event in place. Failures are swallowed: the local
    /// task write proceeds whether or not the remote patch landed.
    pub async fn update_event(&self, token: &str, event_id: &str, draft: &EventDraft) {
        let body = EventBody::for_patch(draft);
        let url = format!("{}/{event_id}", self.events_url);
        match self.http.patch(&url).bearer_auth(token).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(event_id, "calendar event patched");
            }
            Ok(resp) => {
                warn!(event_id, status = %resp.status(), "calendar event patch rejected");
            }
            Err(err) => {
                warn!(event_id, %err, "calendar event patch request failed");
            }
        }
    }

    /// Delete an event, best-effort. An orphaned remote event is an accepted
    /// degraded outcome; a blocked local delete is not.
    pub async fn delete_event(&self, token: &str, event_id: &str) {
        let url = format!("{}/{event_id}", self.events_url);
        match self.http.delete(&url).bearer_auth(token).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(event_id, "calendar event deleted");
            }
            Ok(resp) => {
                warn!(event_id, status = %resp.status(), "calendar event delete rejected");
            }
            Err(err) => {
                warn!(event_id, %err, "calendar event delete request failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(due_date: Option<NaiveDate>) -> EventDraft {
        EventDraft {
            title: "Write launch notes".to_string(),
            description: "Cover the rollout plan".to_string(),
            due_date,
        }
    }

    fn gateway_for(server_url: &str) -> CalendarGateway {
        let config = ProviderConfig::google("client-id", "client-secret")
            .with_events_url(format!("{server_url}/events"));
        CalendarGateway::new(&config)
    }

    #[test]
    fn create_body_with_due_date_is_all_day() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let body = EventBody::for_create(&draft(Some(date)));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["summary"], "Write launch notes");
        assert_eq!(json["start"]["date"], "2024-06-01");
        assert_eq!(json["end"]["date"], "2024-06-01");
        assert_eq!(json["start"]["timeZone"], "UTC");
        assert!(json["start"].get("dateTime").is_none());
    }

    #[test]
    fn create_body_without_due_date_is_one_hour_timed() {
        let body = EventBody::for_create(&draft(None));
        let json = serde_json::to_value(&body).unwrap();

        let start: DateTime<Utc> = json["start"]["dateTime"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        let end: DateTime<Utc> = json["end"]["dateTime"].as_str().unwrap().parse().unwrap();
        assert_eq!(end - start, Duration::hours(1));
        assert!(json["start"].get("date").is_none());
    }

    #[test]
    fn patch_body_omits_dates_when_no_due_date() {
        let body = EventBody::for_patch(&draft(None));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["summary"], "Write launch notes");
        assert!(json.get("start").is_none());
        assert!(json.get("end").is_none());
    }

    #[tokio::test]
    async fn create_event_returns_provider_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/events")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "start": {"date": "2024-06-01"},
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "evt_123", "status": "confirmed"}"#)
            .expect(1)
            .create_async()
            .await;

        let gateway = gateway_for(&server.url());
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let id = gateway.create_event("token", &draft(Some(date))).await;

        assert_eq!(id.as_deref(), Some("evt_123"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_event_failure_yields_none() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/events")
            .with_status(403)
            .with_body(r#"{"error": {"code": 403}}"#)
            .expect(1)
            .create_async()
            .await;

        let gateway = gateway_for(&server.url());
        let id = gateway.create_event("token", &draft(None)).await;

        assert!(id.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_and_delete_swallow_failures() {
        let mut server = mockito::Server::new_async().await;
        let patch_mock = server
            .mock("PATCH", "/events/evt_1")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let delete_mock = server
            .mock("DELETE", "/events/evt_1")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let gateway = gateway_for(&server.url());
        gateway.update_event("token", "evt_1", &draft(None)).await;
        gateway.delete_event("token", "evt_1").await;

        patch_mock.assert_async().await;
        delete_mock.assert_async().await;
    }
}
