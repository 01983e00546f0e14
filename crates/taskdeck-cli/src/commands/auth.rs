//! Credential management for the linked calendar account.
//!
//! The interactive authorization handshake happens outside this tool; `link`
//! stores the tokens it produced so the sync core can use and rotate them.

use chrono::Utc;
use clap::Subcommand;

use taskdeck_core::store::{CredentialStore, PROVIDER_GOOGLE};
use taskdeck_core::CredentialRecord;

use crate::commands::common;
use crate::store::KeyringCredentialStore;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store calendar credentials obtained from the provider
    Link {
        #[arg(long)]
        access_token: String,
        #[arg(long)]
        refresh_token: Option<String>,
        /// Reported token lifetime in seconds
        #[arg(long)]
        expires_in: Option<i64>,
    },
    /// Remove stored credentials
    Unlink,
    /// Show whether a calendar account is linked
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let user = common::current_user().ok_or("TASKDECK_USER is not set")?;
    let store = KeyringCredentialStore::new();

    match action {
        AuthAction::Link {
            access_token,
            refresh_token,
            expires_in,
        } => {
            let record = CredentialRecord {
                access_token,
                refresh_token,
                expires_at: expires_in.map(|secs| Utc::now().timestamp() + secs),
            };
            store.insert(&user, PROVIDER_GOOGLE, &record)?;
            println!("Calendar account linked for {user}");
        }
        AuthAction::Unlink => {
            store.remove(&user, PROVIDER_GOOGLE)?;
            println!("Credentials removed for {user}");
        }
        AuthAction::Status => match store.get(&user, PROVIDER_GOOGLE)? {
            Some(record) => {
                let token_state = match record.expires_at {
                    Some(exp) if exp <= Utc::now().timestamp() => "expired",
                    _ => "valid",
                };
                let refresh = if record.refresh_token.is_some() {
                    "yes"
                } else {
                    "no"
                };
                println!("Linked: access token {token_state}, refresh token: {refresh}");
            }
            None => println!("Not linked"),
        },
    }

    Ok(())
}
