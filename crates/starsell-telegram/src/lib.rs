/// Telegram side of the service: the long-lived user-session client, the
/// update router that turns the global update stream into per-chat reply
/// channels, the business-persona switcher, and the conversation handle the
/// flow driver talks through.

pub mod business;
pub mod conversation;
pub mod router;
pub mod session;

pub use business::{PersonaSwitcher, SwitchError, Switcher, with_seller_persona};
pub use conversation::Conversation;
pub use router::{UpdateRouter, run_update_loop};
