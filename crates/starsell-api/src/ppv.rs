use axum::Json;
use axum::extract::State;
use tracing::{error, info};
use url::Url;

use starsell_flow::{FlowOutcome, download, run_flow, sell_script};
use starsell_telegram::{Conversation, with_seller_persona};
use starsell_types::api::{SendPpvRequest, SendPpvResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /send-ppv: validate, then run the persona-bracketed flow.
///
/// The flow runs in a detached task: if the HTTP caller disconnects mid-way
/// the conversation still finishes (or times out) so the persona switch is
/// never left half-applied.
pub async fn send_ppv(
    State(state): State<AppState>,
    Json(req): Json<SendPpvRequest>,
) -> Result<Json<SendPpvResponse>, ApiError> {
    let url = validate(&req)?;

    let permit = state
        .flow_gate
        .clone()
        .try_acquire_owned()
        .map_err(|_| ApiError::Busy)?;

    info!(photo_url = %url, username = %req.username, stars = req.stars, "PPV request accepted");
    let username = req.username.clone();

    let flow = tokio::spawn(async move {
        let _permit = permit;
        run_ppv(state, url, req).await
    });

    let outcome = flow
        .await
        .map_err(|e| ApiError::Internal(format!("flow task failed: {e}")))??;

    info!(username = %username, "PPV flow succeeded");
    Ok(Json(SendPpvResponse {
        status: "success".into(),
        message: outcome.message,
        username,
    }))
}

/// activate seller persona -> download + scripted exchange -> restore
/// primary persona, on every exit path.
async fn run_ppv(state: AppState, url: Url, req: SendPpvRequest) -> Result<FlowOutcome, ApiError> {
    let result = with_seller_persona(&state.switcher, async {
        let photo = download::download_photo(&url, state.download_timeout).await?;

        let mut conversation =
            Conversation::open(&state.client, &state.router, &state.seller_bot).await?;

        let script = sell_script(photo, &req.username, req.stars);
        run_flow(&mut conversation, script, state.timeouts)
            .await
            .map_err(ApiError::from)
    })
    .await;

    if let Err(e) = &result {
        error!(error = %e, username = %req.username, "PPV flow failed");
    }
    result
}

fn validate(req: &SendPpvRequest) -> Result<Url, ApiError> {
    if req.username.trim().trim_start_matches('@').is_empty() {
        return Err(ApiError::Invalid("username must not be empty".into()));
    }
    if req.stars <= 0 {
        return Err(ApiError::Invalid("stars must be a positive integer".into()));
    }

    let url = Url::parse(req.photo_url.trim())
        .map_err(|_| ApiError::Invalid("photo_url is not a valid URL".into()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::Invalid("photo_url must be an http(s) URL".into()));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(photo_url: &str, username: &str, stars: i64) -> SendPpvRequest {
        SendPpvRequest {
            photo_url: photo_url.into(),
            username: username.into(),
            stars,
        }
    }

    #[test]
    fn accepts_a_well_formed_request() {
        let url = validate(&request("https://i.ibb.co/x/p.jpg", "alice", 200)).unwrap();
        assert_eq!(url.as_str(), "https://i.ibb.co/x/p.jpg");
    }

    #[test]
    fn rejects_non_positive_stars() {
        for stars in [0, -5] {
            let err = validate(&request("https://i.ibb.co/x/p.jpg", "alice", stars)).unwrap_err();
            assert!(matches!(err, ApiError::Invalid(ref m) if m.contains("stars")));
        }
    }

    #[test]
    fn rejects_blank_usernames() {
        for username in ["", "   ", "@"] {
            let err = validate(&request("https://i.ibb.co/x/p.jpg", username, 200)).unwrap_err();
            assert!(matches!(err, ApiError::Invalid(ref m) if m.contains("username")));
        }
    }

    #[test]
    fn rejects_malformed_urls() {
        for photo_url in ["not a url", "ftp://host/p.jpg", "i.ibb.co/x/p.jpg"] {
            let err = validate(&request(photo_url, "alice", 200)).unwrap_err();
            assert!(matches!(err, ApiError::Invalid(ref m) if m.contains("photo_url")));
        }
    }
}
