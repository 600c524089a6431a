use serde::{Deserialize, Serialize};

// -- PPV --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendPpvRequest {
    pub photo_url: String,
    pub username: String,
    pub stars: i64,
}

#[derive(Debug, Serialize)]
pub struct SendPpvResponse {
    pub status: String,
    pub message: String,
    pub username: String,
}

// -- Errors --

/// Error body shared by every non-2xx response: `{"status":"error",...}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: "error".into(), message: message.into() }
    }
}

// -- Health --

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: "ok".into() }
    }
}
