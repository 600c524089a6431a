use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use grammers_client::Client;
use grammers_tl_types as tl;
use thiserror::Error;
use tracing::{error, info};

/// Administrative calls are quick; anything slower than this means the
/// account is in a bad state and the flow must not start.
const SWITCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("cannot resolve bot @{username}: {reason}")]
    Resolve { username: String, reason: String },

    #[error("bot @{0} not found")]
    NotFound(String),

    #[error("failed to connect bot @{username}: {reason}")]
    Update { username: String, reason: String },

    #[error("persona switch timed out after {0:?}")]
    Timeout(Duration),
}

/// Persona switching, behind a trait so the bracketing logic is testable
/// without a live account.
#[async_trait]
pub trait Switcher: Send + Sync {
    /// Attach the seller bot as the account's connected business bot.
    async fn activate(&self) -> Result<(), SwitchError>;
    /// Attach the primary bot back.
    async fn deactivate(&self) -> Result<(), SwitchError>;
}

/// Live switcher: each operation is one `account.updateConnectedBot` call
/// granting the incoming persona reply and read access to every chat.
pub struct PersonaSwitcher {
    client: Client,
    seller_bot: String,
    primary_bot: String,
}

impl PersonaSwitcher {
    pub fn new(client: Client, seller_bot: String, primary_bot: String) -> Self {
        Self { client, seller_bot, primary_bot }
    }

    async fn attach(&self, username: &str) -> Result<(), SwitchError> {
        info!(bot = username, "switching connected business bot");

        let chat = tokio::time::timeout(SWITCH_TIMEOUT, self.client.resolve_username(username))
            .await
            .map_err(|_| SwitchError::Timeout(SWITCH_TIMEOUT))?
            .map_err(|e| SwitchError::Resolve { username: username.into(), reason: e.to_string() })?
            .ok_or_else(|| SwitchError::NotFound(username.into()))?;

        let bot = chat
            .pack()
            .try_to_input_user()
            .ok_or_else(|| SwitchError::Resolve {
                username: username.into(),
                reason: "not a user account".into(),
            })?;

        let request = tl::functions::account::UpdateConnectedBot {
            deleted: false,
            bot,
            recipients: tl::types::InputBusinessBotRecipients {
                existing_chats: true,
                new_chats: true,
                contacts: true,
                non_contacts: true,
                exclude_selected: false,
                users: None,
                exclude_users: None,
            }
            .into(),
            rights: Some(
                tl::types::BusinessBotRights {
                    reply: true,
                    read_messages: true,
                    delete_sent_messages: false,
                    delete_received_messages: false,
                    edit_name: false,
                    edit_bio: false,
                    edit_profile_photo: false,
                    edit_username: false,
                    view_gifts: false,
                    sell_gifts: false,
                    change_gift_settings: false,
                    transfer_and_upgrade_gifts: false,
                    transfer_stars: false,
                    manage_stories: false,
                }
                .into(),
            ),
        };

        tokio::time::timeout(SWITCH_TIMEOUT, self.client.invoke(&request))
            .await
            .map_err(|_| SwitchError::Timeout(SWITCH_TIMEOUT))?
            .map_err(|e| SwitchError::Update { username: username.into(), reason: e.to_string() })?;

        info!(bot = username, "connected business bot switched");
        Ok(())
    }
}

#[async_trait]
impl Switcher for PersonaSwitcher {
    async fn activate(&self) -> Result<(), SwitchError> {
        self.attach(&self.seller_bot).await
    }

    async fn deactivate(&self) -> Result<(), SwitchError> {
        self.attach(&self.primary_bot).await
    }
}

/// Run `body` with the seller persona attached, restoring the primary
/// persona on every exit path. Restoration failures are logged, never
/// surfaced, so they cannot mask the body's own outcome.
pub async fn with_seller_persona<S, F, T, E>(switcher: &S, body: F) -> Result<T, E>
where
    S: Switcher + ?Sized,
    F: Future<Output = Result<T, E>>,
    E: From<SwitchError>,
{
    if let Err(e) = switcher.activate().await {
        // The switch may have half-applied; put the account back anyway.
        restore(switcher).await;
        return Err(e.into());
    }

    let result = body.await;
    restore(switcher).await;
    result
}

async fn restore<S: Switcher + ?Sized>(switcher: &S) {
    if let Err(e) = switcher.deactivate().await {
        error!(error = %e, "failed to restore primary persona");
    }
}
