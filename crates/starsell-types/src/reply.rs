/// Incoming messages from the seller bot, reduced to the parts the flow
/// inspects. The telegram crate builds these from raw updates so nothing
/// downstream has to touch TL types.

/// One inline button on a bot reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub label: String,
    pub kind: ButtonKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ButtonKind {
    /// Regular inline button answered via a callback query.
    Callback { data: Vec<u8> },
    /// "Select user" style button answered with a requested peer.
    RequestPeer { button_id: i32 },
    /// Anything else (url, web view, ...); never tapped by the flow.
    Other,
}

/// A single reply from the seller bot.
#[derive(Debug, Clone)]
pub struct BotReply {
    pub chat_id: i64,
    pub msg_id: i32,
    pub text: String,
    /// Inline keyboard rows, empty when the reply has none.
    pub buttons: Vec<Vec<Button>>,
}

impl BotReply {
    /// Find a button whose label contains `label`, case-insensitively.
    /// Matches the seller bot's loose labels ("Empty", "Empty caption", ...).
    pub fn find_button(&self, label: &str) -> Option<&Button> {
        let needle = label.to_lowercase();
        self.buttons
            .iter()
            .flatten()
            .find(|b| b.label.to_lowercase().contains(&needle))
    }

    /// The button id of the first peer-request button, if any.
    pub fn request_peer_button(&self) -> Option<i32> {
        self.buttons.iter().flatten().find_map(|b| match b.kind {
            ButtonKind::RequestPeer { button_id } => Some(button_id),
            _ => None,
        })
    }

    /// Whether the reply text contains any of the given markers,
    /// case-insensitively.
    pub fn mentions_any(&self, markers: &[&str]) -> bool {
        let text = self.text.to_lowercase();
        markers.iter().any(|m| text.contains(&m.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply_with(buttons: Vec<Vec<Button>>) -> BotReply {
        BotReply { chat_id: 1, msg_id: 10, text: "ok".into(), buttons }
    }

    #[test]
    fn find_button_is_case_insensitive_and_partial() {
        let reply = reply_with(vec![vec![
            Button { label: "Cancel".into(), kind: ButtonKind::Callback { data: b"c".to_vec() } },
            Button { label: "Empty caption".into(), kind: ButtonKind::Callback { data: b"e".to_vec() } },
        ]]);

        let found = reply.find_button("empty").unwrap();
        assert_eq!(found.label, "Empty caption");
        assert!(reply.find_button("missing").is_none());
    }

    #[test]
    fn request_peer_button_skips_other_kinds() {
        let reply = reply_with(vec![
            vec![Button { label: "Help".into(), kind: ButtonKind::Other }],
            vec![Button { label: "Select User".into(), kind: ButtonKind::RequestPeer { button_id: 7 } }],
        ]);

        assert_eq!(reply.request_peer_button(), Some(7));
    }

    #[test]
    fn mentions_any_matches_loosely() {
        let reply = BotReply {
            chat_id: 1,
            msg_id: 10,
            text: "Done deal, PPV sent.".into(),
            buttons: vec![],
        };

        assert!(reply.mentions_any(&["done", "sent"]));
        assert!(!reply.mentions_any(&["preparing"]));
    }
}
