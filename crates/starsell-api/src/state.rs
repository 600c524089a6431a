use std::sync::Arc;
use std::time::Duration;

use grammers_client::Client;
use tokio::sync::Semaphore;

use starsell_flow::FlowTimeouts;
use starsell_telegram::{PersonaSwitcher, UpdateRouter};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    /// The one long-lived, already-authorized client. Shared by every
    /// request; never reconnected per request.
    pub client: Client,
    pub router: UpdateRouter,
    pub switcher: PersonaSwitcher,
    /// Username of the seller bot the flow converses with.
    pub seller_bot: String,
    pub timeouts: FlowTimeouts,
    pub download_timeout: Duration,
    /// Single-flight gate: the client cannot run two conversations against
    /// the seller bot at once, so at most one flow (plus its persona
    /// bracket) is in flight. Lives in its own Arc so the permit can move
    /// into the detached flow task.
    pub flow_gate: Arc<Semaphore>,
}
