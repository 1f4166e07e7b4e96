use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::tts::{TtsService, TtsServiceApi};

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Ready once the provider answers with at least one alignment-capable voice.
pub async fn health_ready(State(tts_service): State<Arc<TtsService>>) -> impl IntoResponse {
    match tts_service.list_voices().await {
        Ok(catalog) if !catalog.standard.is_empty() => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "tts": "available",
                "standard_voices": catalog.standard.len(),
                "high_quality_voices": catalog.high_quality.len()
            })),
        ),
        Ok(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "tts": "no_voices"
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "tts": "unavailable"
                })),
            )
        }
    }
}
