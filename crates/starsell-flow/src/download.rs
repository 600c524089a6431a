use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use tracing::{info, warn};
use url::Url;

use crate::error::FlowError;

/// Fetch the PPV media from its URL (ibb.co style image hosts, redirects
/// followed). The bytes are uploaded to Telegram as-is.
pub async fn download_photo(url: &Url, timeout: Duration) -> Result<Bytes, FlowError> {
    info!(%url, "downloading media");

    let wrap = |source: reqwest::Error| FlowError::Download { url: url.to_string(), source };

    let client = reqwest::Client::builder().timeout(timeout).build().map_err(wrap)?;
    let response = client
        .get(url.clone())
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(wrap)?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !content_type.starts_with("image/") {
        warn!(content_type, "media host returned a non-image content type");
    }

    let bytes = response.bytes().await.map_err(wrap)?;
    info!(len = bytes.len(), content_type, "media downloaded");
    Ok(bytes)
}
