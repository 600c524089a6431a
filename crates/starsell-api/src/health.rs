use axum::Json;

use starsell_types::api::HealthResponse;

/// Liveness probe. Constant payload, no side effects, succeeds regardless of
/// the Telegram connection's state.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_is_always_ok() {
        let body = serde_json::to_value(&health().await.0).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "ok" }));
    }
}
