use bytes::Bytes;

/// What the driver does at one step of the script.
#[derive(Debug, Clone)]
pub enum StepAction {
    /// Send a plain text message (commands, the price).
    SendText(String),
    /// Upload the downloaded media and send it as a photo.
    SendPhoto(Bytes),
    /// Tap the inline button whose label contains `label`; when the reply
    /// has no such button, send `fallback_text` instead.
    TapButton {
        label: &'static str,
        fallback_text: &'static str,
    },
    /// Answer the reply's peer-request button with the resolved target user.
    SelectRecipient(String),
}

/// One step of the script: an action, plus markers the counterpart's reply
/// is expected to mention. A reply missing all markers is logged, not fatal;
/// the seller bot rewords its prompts now and then.
#[derive(Debug, Clone)]
pub struct FlowStep {
    pub name: &'static str,
    pub action: StepAction,
    pub expect: &'static [&'static str],
}

/// The fixed five-step sell script.
pub fn sell_script(photo: Bytes, username: &str, stars: i64) -> Vec<FlowStep> {
    vec![
        FlowStep {
            name: "sell-command",
            action: StepAction::SendText("/sell".into()),
            // "Will do. Send a photo or a video to start, boss."
            expect: &["send"],
        },
        FlowStep {
            name: "upload-photo",
            action: StepAction::SendPhoto(photo),
            // "Looks good to me. Now send a caption for the PPV or tap 'Empty'"
            expect: &["caption", "empty"],
        },
        FlowStep {
            name: "skip-caption",
            action: StepAction::TapButton { label: "Empty", fallback_text: "Empty" },
            // "How many Stars we gon' take for the PPV?"
            expect: &["stars", "how many"],
        },
        FlowStep {
            name: "set-price",
            action: StepAction::SendText(stars.to_string()),
            // "Bet. Who should I send the PPV to, boss?"
            expect: &["who", "send"],
        },
        FlowStep {
            name: "pick-recipient",
            action: StepAction::SelectRecipient(username.trim_start_matches('@').to_string()),
            // "On it boss, preparing your PPV now."
            expect: &["on it", "preparing"],
        },
    ]
}
