use std::collections::HashMap;
use std::sync::Arc;

use grammers_client::{Client, Update};
use grammers_tl_types as tl;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use starsell_types::reply::{BotReply, Button, ButtonKind};

/// Fans the client's single update stream out to per-chat subscribers.
///
/// The flow driver "waits for the counterpart's next reply"; the client
/// library only exposes one global stream, so one background task drains it
/// and forwards incoming messages to whichever conversation subscribed to
/// that chat. Unmatched updates are dropped.
#[derive(Clone)]
pub struct UpdateRouter {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    /// chat_id -> (subscription id, sender). The id guards against a stale
    /// conversation unsubscribing a newer one on the same chat.
    subscribers: RwLock<HashMap<i64, (u64, mpsc::UnboundedSender<BotReply>)>>,
    next_id: std::sync::atomic::AtomicU64,
}

impl UpdateRouter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RouterInner {
                subscribers: RwLock::new(HashMap::new()),
                next_id: std::sync::atomic::AtomicU64::new(0),
            }),
        }
    }

    /// Subscribe to replies from one chat. A second subscription to the same
    /// chat replaces the first.
    pub async fn subscribe(&self, chat_id: i64) -> (u64, mpsc::UnboundedReceiver<BotReply>) {
        let id = self
            .inner
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.subscribers.write().await.insert(chat_id, (id, tx));
        (id, rx)
    }

    /// Drop the subscription, but only if `id` still owns it.
    pub async fn unsubscribe(&self, chat_id: i64, id: u64) {
        let mut subscribers = self.inner.subscribers.write().await;
        if subscribers.get(&chat_id).is_some_and(|(owner, _)| *owner == id) {
            subscribers.remove(&chat_id);
        }
    }

    /// Deliver a reply to the chat's subscriber, if any.
    pub async fn route(&self, reply: BotReply) {
        let subscribers = self.inner.subscribers.read().await;
        if let Some((_, tx)) = subscribers.get(&reply.chat_id) {
            let _ = tx.send(reply);
        } else {
            debug!(chat_id = reply.chat_id, "no subscriber for incoming message");
        }
    }
}

impl Default for UpdateRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain the update stream for the process lifetime. This task is the only
/// consumer of `next_update`.
pub async fn run_update_loop(client: Client, router: UpdateRouter) {
    loop {
        match client.next_update().await {
            Ok(Update::NewMessage(message)) if !message.outgoing() => {
                router.route(reply_from_message(&message)).await;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "update stream error");
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }
}

fn reply_from_message(message: &grammers_client::types::Message) -> BotReply {
    BotReply {
        chat_id: message.chat().id(),
        msg_id: message.id(),
        text: message.text().to_string(),
        buttons: extract_buttons(message.raw.reply_markup.as_ref()),
    }
}

/// Reduce an inline keyboard to the button model the flow understands.
/// Reply keyboards and the exotic button kinds are never tapped by the flow.
fn extract_buttons(markup: Option<&tl::enums::ReplyMarkup>) -> Vec<Vec<Button>> {
    let Some(tl::enums::ReplyMarkup::ReplyInlineMarkup(markup)) = markup else {
        return Vec::new();
    };

    markup
        .rows
        .iter()
        .map(|row| {
            let tl::enums::KeyboardButtonRow::Row(row) = row;
            row.buttons.iter().map(button_from_tl).collect()
        })
        .collect()
}

fn button_from_tl(button: &tl::enums::KeyboardButton) -> Button {
    use tl::enums::KeyboardButton as Kb;

    match button {
        Kb::Callback(b) => Button {
            label: b.text.clone(),
            kind: ButtonKind::Callback { data: b.data.clone() },
        },
        Kb::RequestPeer(b) => Button {
            label: b.text.clone(),
            kind: ButtonKind::RequestPeer { button_id: b.button_id },
        },
        _ => Button { label: String::new(), kind: ButtonKind::Other },
    }
}
