//! Access-token lifecycle for the calendar provider.
//!
//! [`TokenBroker::valid_access_token`] is the only way sync code obtains a
//! token. A stored token that has not expired is returned as-is; an expired
//! one is refreshed against the provider token endpoint and the rotated
//! record is persisted back through the credential store. Every failure
//! collapses to `None` -- callers treat "no token" as "skip sync this call",
//! never as an error of the enclosing task operation.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::store::{CredentialStore, TokenUpdate, PROVIDER_GOOGLE};

use super::ProviderConfig;

/// Tokens are treated as expired this many seconds early, so a token that
/// dies mid-call chain is refreshed up front.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Lifetime assumed when the provider omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// Returns currently-valid access tokens, refreshing transparently.
pub struct TokenBroker {
    config: ProviderConfig,
    store: Arc<dyn CredentialStore>,
    http: Client,
}

impl TokenBroker {
    pub fn new(config: ProviderConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            config,
            store,
            http: Client::new(),
        }
    }

    /// Return a valid access token for `user_id`, or `None` when sync must
    /// be skipped (no linked account, no refresh token, refresh rejected,
    /// network fault, store fault).
    ///
    /// Refresh policy: a token is only refreshed once its stored expiry has
    /// passed (minus the early buffer); a record without an expiry counts as
    /// still valid. Exactly one store update happens per successful refresh.
    pub async fn valid_access_token(&self, user_id: &str) -> Option<String> {
        let record = match self.store.get(user_id, PROVIDER_GOOGLE) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(user_id, "no linked calendar account");
                return None;
            }
            Err(err) => {
                warn!(user_id, %err, "credential lookup failed");
                return None;
            }
        };

        if !is_expired(record.expires_at) {
            return Some(record.access_token);
        }

        let Some(refresh_token) = record.refresh_token.as_deref() else {
            warn!(user_id, "access token expired and no refresh token stored");
            return None;
        };

        let refreshed = self.refresh(refresh_token).await?;
        let expires_at = Utc::now().timestamp()
            + refreshed.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        let update = TokenUpdate {
            access_token: refreshed.access_token.clone(),
            expires_at,
        };
        if let Err(err) = self.store.update(user_id, PROVIDER_GOOGLE, update) {
            warn!(user_id, %err, "failed to persist refreshed token");
            return None;
        }

        debug!(user_id, "access token refreshed");
        Some(refreshed.access_token)
    }

    async fn refresh(&self, refresh_token: &str) -> Option<RefreshResponse> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let resp = match self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                warn!(%err, "token refresh request failed");
                return None;
            }
        };

        if !resp.status().is_success() {
            warn!(status = %resp.status(), "token refresh rejected by provider");
            return None;
        }

        match resp.json::<RefreshResponse>().await {
            Ok(body) => Some(body),
            Err(err) => {
                warn!(%err, "malformed token refresh response");
                None
            }
        }
    }
}

/// Whether a stored expiry requires a refresh before the token is used.
fn is_expired(expires_at: Option<i64>) -> bool {
    match expires_at {
        Some(exp) => Utc::now().timestamp() > exp - EXPIRY_BUFFER_SECS,
        None => false,
    }
}
