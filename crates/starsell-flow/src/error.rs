use std::time::Duration;

use thiserror::Error;

/// Failure of a single conversational step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("seller bot did not reply within {0:?}")]
    Timeout(Duration),

    #[error("reply carries no `{0}` button")]
    MissingButton(&'static str),

    #[error("user @{0} not found")]
    UserNotFound(String),

    #[error("telegram request failed: {0}")]
    Telegram(String),
}

/// Failure of the flow as a whole. Step failures name the furthest-reached
/// step so the operator can see where the script broke off.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("failed to download media from {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot reach the seller bot: {0}")]
    SellerBot(String),

    #[error("step `{step}` failed: {source}")]
    Step {
        step: &'static str,
        source: StepError,
    },
}

impl StepError {
    pub fn at(self, step: &'static str) -> FlowError {
        FlowError::Step { step, source: self }
    }
}
