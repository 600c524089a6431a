use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use grammers_client::{Client, Config, InitParams};
use grammers_session::Session;
use tracing::info;

/// Connect the long-lived user session from a base64 session blob.
///
/// The blob must already be authorized; there is no interactive login path
/// here. An unauthorized or malformed blob is fatal so the process never
/// becomes ready with a client that cannot act.
pub async fn connect(api_id: i32, api_hash: &str, session_b64: &str) -> Result<Client> {
    let blob = BASE64
        .decode(session_b64.trim())
        .context("session blob is not valid base64")?;
    let session = Session::load(&blob).context("session blob is malformed")?;

    let client = Client::connect(Config {
        session,
        api_id,
        api_hash: api_hash.to_string(),
        params: InitParams::default(),
    })
    .await
    .context("failed to connect to Telegram")?;

    if !client.is_authorized().await.context("authorization check failed")? {
        bail!("session is not authorized; regenerate the blob with the login tool");
    }

    info!("telegram client connected and authorized");
    Ok(client)
}

/// Serialize the client's session as the base64 blob the service loads at
/// startup. Used by the login tool after an interactive sign-in.
pub fn export_session(client: &Client) -> String {
    BASE64.encode(client.session().save())
}
