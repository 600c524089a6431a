use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use starsell_types::reply::{BotReply, Button, ButtonKind};

use crate::error::{FlowError, StepError};
use crate::steps::{FlowStep, StepAction};

/// Step name reported when the post-script confirmation wait fails.
const CONFIRMATION: &str = "confirmation";

/// Transport seam between the script driver and the live conversation.
/// The real implementation lives in starsell-telegram; tests drive the
/// script with a scripted fake.
#[async_trait]
pub trait Exchange {
    async fn send_text(&mut self, text: &str) -> Result<(), StepError>;
    async fn send_photo(&mut self, photo: &bytes::Bytes) -> Result<(), StepError>;
    async fn press_button(&mut self, msg_id: i32, data: &[u8]) -> Result<(), StepError>;
    async fn select_recipient(
        &mut self,
        msg_id: i32,
        button_id: i32,
        username: &str,
    ) -> Result<(), StepError>;
    /// Next reply from the seller bot, or `StepError::Timeout`.
    async fn next_reply(&mut self, wait: Duration) -> Result<BotReply, StepError>;
}

/// Per-reply waits. `confirm` covers the final confirmation, which the
/// seller bot takes noticeably longer to produce than its prompts.
#[derive(Debug, Clone, Copy)]
pub struct FlowTimeouts {
    pub reply: Duration,
    pub confirm: Duration,
}

impl FlowTimeouts {
    pub fn from_reply(reply: Duration) -> Self {
        Self { reply, confirm: reply * 2 }
    }
}

#[derive(Debug, Clone)]
pub struct FlowOutcome {
    pub message: String,
}

/// Run the script in order, aborting on the first failed step. Each step
/// performs its action and then waits for the counterpart's next reply;
/// there are no retries and no branches.
pub async fn run_flow<X: Exchange>(
    exchange: &mut X,
    script: Vec<FlowStep>,
    timeouts: FlowTimeouts,
) -> Result<FlowOutcome, FlowError> {
    let mut last_reply: Option<BotReply> = None;

    for step in &script {
        info!(step = step.name, "running step");
        perform(exchange, step, last_reply.as_ref())
            .await
            .map_err(|e| e.at(step.name))?;

        let reply = exchange
            .next_reply(timeouts.reply)
            .await
            .map_err(|e| e.at(step.name))?;
        if !reply.mentions_any(step.expect) {
            warn!(step = step.name, text = %reply.text, "unexpected reply text");
        }
        last_reply = Some(reply);
    }

    // The script is done; wait for the seller bot to confirm delivery.
    match exchange.next_reply(timeouts.confirm).await {
        Ok(reply) if reply.mentions_any(&["done", "sent"]) => {
            info!("seller bot confirmed delivery");
            Ok(FlowOutcome { message: "PPV sent successfully".into() })
        }
        Ok(reply) => {
            warn!(text = %reply.text, "flow finished without explicit confirmation");
            Ok(FlowOutcome { message: "PPV flow completed".into() })
        }
        Err(StepError::Timeout(_)) => {
            // The bot sometimes goes quiet while the offer is queued; its
            // last prompt tells us whether the submission was accepted.
            if last_reply.is_some_and(|r| r.mentions_any(&["preparing"])) {
                Ok(FlowOutcome { message: "PPV submitted for sending".into() })
            } else {
                Ok(FlowOutcome { message: "PPV flow completed".into() })
            }
        }
        Err(e) => Err(e.at(CONFIRMATION)),
    }
}

async fn perform<X: Exchange>(
    exchange: &mut X,
    step: &FlowStep,
    last_reply: Option<&BotReply>,
) -> Result<(), StepError> {
    match &step.action {
        StepAction::SendText(text) => exchange.send_text(text).await,
        StepAction::SendPhoto(photo) => exchange.send_photo(photo).await,
        StepAction::TapButton { label, fallback_text } => {
            if let Some(reply) = last_reply {
                if let Some(Button { kind: ButtonKind::Callback { data }, .. }) =
                    reply.find_button(label)
                {
                    return exchange.press_button(reply.msg_id, data).await;
                }
            }
            warn!(label, "button not offered, sending fallback text");
            exchange.send_text(fallback_text).await
        }
        StepAction::SelectRecipient(username) => {
            let reply = last_reply.ok_or(StepError::MissingButton("Select User"))?;
            let button_id = reply
                .request_peer_button()
                .ok_or(StepError::MissingButton("Select User"))?;
            exchange.select_recipient(reply.msg_id, button_id, username).await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use bytes::Bytes;

    use super::*;
    use crate::steps::sell_script;

    /// Records every outbound action and serves queued replies.
    struct FakeExchange {
        actions: Vec<String>,
        replies: VecDeque<Result<BotReply, StepError>>,
    }

    impl FakeExchange {
        fn new(replies: Vec<Result<BotReply, StepError>>) -> Self {
            Self { actions: Vec::new(), replies: replies.into() }
        }
    }

    #[async_trait]
    impl Exchange for FakeExchange {
        async fn send_text(&mut self, text: &str) -> Result<(), StepError> {
            self.actions.push(format!("text:{text}"));
            Ok(())
        }

        async fn send_photo(&mut self, photo: &Bytes) -> Result<(), StepError> {
            self.actions.push(format!("photo:{}", photo.len()));
            Ok(())
        }

        async fn press_button(&mut self, msg_id: i32, data: &[u8]) -> Result<(), StepError> {
            self.actions
                .push(format!("press:{msg_id}:{}", String::from_utf8_lossy(data)));
            Ok(())
        }

        async fn select_recipient(
            &mut self,
            msg_id: i32,
            button_id: i32,
            username: &str,
        ) -> Result<(), StepError> {
            self.actions.push(format!("peer:{msg_id}:{button_id}:{username}"));
            Ok(())
        }

        async fn next_reply(&mut self, wait: Duration) -> Result<BotReply, StepError> {
            self.replies.pop_front().unwrap_or(Err(StepError::Timeout(wait)))
        }
    }

    fn reply(msg_id: i32, text: &str, buttons: Vec<Vec<Button>>) -> BotReply {
        BotReply { chat_id: 42, msg_id, text: text.into(), buttons }
    }

    fn callback(label: &str, data: &[u8]) -> Button {
        Button { label: label.into(), kind: ButtonKind::Callback { data: data.to_vec() } }
    }

    fn happy_replies() -> Vec<Result<BotReply, StepError>> {
        vec![
            Ok(reply(1, "Will do. Send a photo or a video to start, boss.", vec![])),
            Ok(reply(2, "Now send a caption for the PPV or tap 'Empty'", vec![vec![
                callback("Empty", b"sell_empty"),
            ]])),
            Ok(reply(3, "How many Stars we gon' take for the PPV?", vec![])),
            Ok(reply(4, "Bet. Who should I send the PPV to, boss?", vec![vec![Button {
                label: "Select User".into(),
                kind: ButtonKind::RequestPeer { button_id: 7 },
            }]])),
            Ok(reply(5, "On it boss, preparing your PPV now.", vec![])),
        ]
    }

    fn timeouts() -> FlowTimeouts {
        FlowTimeouts::from_reply(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn happy_path_runs_all_five_actions_in_order() {
        let mut replies = happy_replies();
        replies.push(Ok(reply(6, "Done deal, PPV sent.", vec![])));
        let mut fake = FakeExchange::new(replies);

        let outcome = run_flow(
            &mut fake,
            sell_script(Bytes::from_static(b"jpeg"), "alice", 200),
            timeouts(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.message, "PPV sent successfully");
        assert_eq!(
            fake.actions,
            vec!["text:/sell", "photo:4", "press:2:sell_empty", "text:200", "peer:4:7:alice"]
        );
    }

    #[tokio::test]
    async fn timeout_aborts_remaining_steps_and_names_the_step() {
        let mut replies = happy_replies();
        replies.truncate(2); // step 3 never gets a reply
        let mut fake = FakeExchange::new(replies);

        let err = run_flow(
            &mut fake,
            sell_script(Bytes::from_static(b"jpeg"), "alice", 200),
            timeouts(),
        )
        .await
        .unwrap_err();

        match err {
            FlowError::Step { step, source: StepError::Timeout(_) } => {
                assert_eq!(step, "skip-caption");
            }
            other => panic!("unexpected error {other:?}"),
        }
        // Steps 4 and 5 never acted.
        assert_eq!(fake.actions.len(), 3);
    }

    #[tokio::test]
    async fn missing_empty_button_falls_back_to_text() {
        let mut replies = happy_replies();
        replies[1] = Ok(reply(2, "Now send a caption for the PPV", vec![]));
        replies.push(Ok(reply(6, "Done deal, PPV sent.", vec![])));
        let mut fake = FakeExchange::new(replies);

        run_flow(
            &mut fake,
            sell_script(Bytes::from_static(b"jpeg"), "alice", 200),
            timeouts(),
        )
        .await
        .unwrap();

        assert_eq!(fake.actions[2], "text:Empty");
    }

    #[tokio::test]
    async fn missing_peer_button_fails_the_recipient_step() {
        let mut replies = happy_replies();
        replies[3] = Ok(reply(4, "Who should I send the PPV to, boss?", vec![]));
        let mut fake = FakeExchange::new(replies);

        let err = run_flow(
            &mut fake,
            sell_script(Bytes::from_static(b"jpeg"), "alice", 200),
            timeouts(),
        )
        .await
        .unwrap_err();

        match err {
            FlowError::Step { step, source: StepError::MissingButton(_) } => {
                assert_eq!(step, "pick-recipient");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(fake.actions.len(), 4);
    }

    #[tokio::test]
    async fn silent_confirmation_after_preparing_counts_as_submitted() {
        // All five steps answered, then the bot goes quiet.
        let mut fake = FakeExchange::new(happy_replies());

        let outcome = run_flow(
            &mut fake,
            sell_script(Bytes::from_static(b"jpeg"), "alice", 200),
            timeouts(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.message, "PPV submitted for sending");
    }

    #[tokio::test]
    async fn recipient_step_surfaces_user_not_found() {
        struct NotFoundExchange {
            inner: FakeExchange,
        }

        #[async_trait]
        impl Exchange for NotFoundExchange {
            async fn send_text(&mut self, text: &str) -> Result<(), StepError> {
                self.inner.send_text(text).await
            }
            async fn send_photo(&mut self, photo: &Bytes) -> Result<(), StepError> {
                self.inner.send_photo(photo).await
            }
            async fn press_button(&mut self, msg_id: i32, data: &[u8]) -> Result<(), StepError> {
                self.inner.press_button(msg_id, data).await
            }
            async fn select_recipient(
                &mut self,
                _msg_id: i32,
                _button_id: i32,
                username: &str,
            ) -> Result<(), StepError> {
                Err(StepError::UserNotFound(username.to_string()))
            }
            async fn next_reply(&mut self, wait: Duration) -> Result<BotReply, StepError> {
                self.inner.next_reply(wait).await
            }
        }

        let mut fake = NotFoundExchange { inner: FakeExchange::new(happy_replies()) };

        let err = run_flow(
            &mut fake,
            sell_script(Bytes::from_static(b"jpeg"), "ghost", 200),
            timeouts(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            FlowError::Step { step: "pick-recipient", source: StepError::UserNotFound(_) }
        ));
    }
}
