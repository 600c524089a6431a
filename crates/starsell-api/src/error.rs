use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use starsell_flow::FlowError;
use starsell_telegram::SwitchError;
use starsell_types::api::ErrorResponse;

/// Everything `POST /send-ppv` can fail with, mapped onto the
/// `{"status":"error","message":...}` body every non-2xx response carries.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client-caused: bad field values. Never touches the network.
    #[error("{0}")]
    Invalid(String),

    /// A flow is already in flight on the shared client.
    #[error("another PPV flow is in progress")]
    Busy,

    /// Persona switch failed; the flow never started.
    #[error(transparent)]
    Switch(#[from] SwitchError),

    /// The scripted exchange broke off; the message names the step.
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("unexpected error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Busy => StatusCode::CONFLICT,
            ApiError::Switch(_) | ApiError::Flow(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
