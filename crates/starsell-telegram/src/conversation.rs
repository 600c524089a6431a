use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use grammers_client::{Client, InputMessage};
use grammers_mtsender::InvocationError;
use grammers_session::PackedChat;
use grammers_tl_types as tl;
use tokio::sync::mpsc;
use tracing::{debug, info};

use starsell_flow::{Exchange, FlowError, StepError};
use starsell_types::reply::BotReply;

/// A live exchange with the seller bot: outgoing actions go straight to the
/// chat, replies arrive through the update router's subscription.
pub struct Conversation {
    client: Client,
    router: crate::UpdateRouter,
    chat: PackedChat,
    subscription: u64,
    rx: mpsc::UnboundedReceiver<BotReply>,
}

impl Conversation {
    pub async fn open(
        client: &Client,
        router: &crate::UpdateRouter,
        bot_username: &str,
    ) -> Result<Self, FlowError> {
        let chat = client
            .resolve_username(bot_username)
            .await
            .map_err(|e| FlowError::SellerBot(e.to_string()))?
            .ok_or_else(|| FlowError::SellerBot(format!("@{bot_username} not found")))?;

        info!(bot = bot_username, chat_id = chat.id(), "conversation opened");
        let chat = chat.pack();
        let (subscription, rx) = router.subscribe(chat.id).await;
        Ok(Self {
            client: client.clone(),
            router: router.clone(),
            chat,
            subscription,
            rx,
        })
    }
}

impl Drop for Conversation {
    fn drop(&mut self) {
        let router = self.router.clone();
        let (chat_id, subscription) = (self.chat.id, self.subscription);
        tokio::spawn(async move {
            router.unsubscribe(chat_id, subscription).await;
        });
    }
}

fn transport(e: impl std::fmt::Display) -> StepError {
    StepError::Telegram(e.to_string())
}

#[async_trait]
impl Exchange for Conversation {
    async fn send_text(&mut self, text: &str) -> Result<(), StepError> {
        self.client.send_message(self.chat, text).await.map_err(transport)?;
        Ok(())
    }

    async fn send_photo(&mut self, photo: &Bytes) -> Result<(), StepError> {
        let mut stream = std::io::Cursor::new(photo.as_ref());
        let uploaded = self
            .client
            .upload_stream(&mut stream, photo.len(), "photo.jpg".to_string())
            .await
            .map_err(transport)?;

        self.client
            .send_message(self.chat, InputMessage::text("").photo(uploaded))
            .await
            .map_err(transport)?;
        Ok(())
    }

    async fn press_button(&mut self, msg_id: i32, data: &[u8]) -> Result<(), StepError> {
        let request = tl::functions::messages::GetBotCallbackAnswer {
            game: false,
            peer: self.chat.to_input_peer(),
            msg_id,
            data: Some(data.to_vec()),
            password: None,
        };

        match self.client.invoke(&request).await {
            Ok(_) => Ok(()),
            // The press is delivered even when the bot never answers the
            // callback query.
            Err(InvocationError::Rpc(rpc)) if rpc.name == "BOT_RESPONSE_TIMEOUT" => {
                debug!(msg_id, "bot did not answer the callback query");
                Ok(())
            }
            Err(e) => Err(transport(e)),
        }
    }

    async fn select_recipient(
        &mut self,
        msg_id: i32,
        button_id: i32,
        username: &str,
    ) -> Result<(), StepError> {
        let user = self
            .client
            .resolve_username(username)
            .await
            .map_err(transport)?
            .ok_or_else(|| StepError::UserNotFound(username.to_string()))?;

        info!(username, user_id = user.id(), "answering peer request");
        let request = tl::functions::messages::SendBotRequestedPeer {
            peer: self.chat.to_input_peer(),
            msg_id,
            button_id,
            requested_peers: vec![user.pack().to_input_peer()],
        };
        self.client.invoke(&request).await.map_err(transport)?;
        Ok(())
    }

    async fn next_reply(&mut self, wait: Duration) -> Result<BotReply, StepError> {
        match tokio::time::timeout(wait, self.rx.recv()).await {
            Ok(Some(reply)) => Ok(reply),
            Ok(None) => Err(StepError::Telegram("update router shut down".into())),
            Err(_) => Err(StepError::Timeout(wait)),
        }
    }
}
