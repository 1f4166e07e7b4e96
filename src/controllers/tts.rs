use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    domain::tts::{TtsRequest, TtsResponse, TtsService, TtsServiceApi, VoiceCatalog, VoiceTier},
    error::{AppError, AppResult},
    infrastructure::repositories::AudioStore,
};

pub const MIN_SPEAKING_RATE: f32 = 0.5;
pub const MAX_SPEAKING_RATE: f32 = 2.0;

/// Accept a JSON number or numeric string and clamp it into the supported
/// range. Absent or null means the normal rate.
pub fn parse_speaking_rate(raw: Option<&Value>) -> Result<f32, AppError> {
    let rate = match raw {
        None | Some(Value::Null) => return Ok(1.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match rate {
        Some(rate) if rate.is_finite() => {
            Ok((rate as f32).clamp(MIN_SPEAKING_RATE, MAX_SPEAKING_RATE))
        }
        _ => Err(AppError::BadRequest("speaking_rate must be numeric".to_string())),
    }
}

pub struct TtsController {
    tts_service: Arc<TtsService>,
    audio_store: Arc<AudioStore>,
}

impl TtsController {
    pub fn new(tts_service: Arc<TtsService>, audio_store: Arc<AudioStore>) -> Self {
        Self {
            tts_service,
            audio_store,
        }
    }

    /// POST /api/tts/synthesize - Convert text to speech with character timings
    pub async fn synthesize(
        State(controller): State<Arc<TtsController>>,
        Json(request): Json<TtsRequest>,
    ) -> AppResult<Json<TtsResponse>> {
        let speaking_rate = parse_speaking_rate(request.speaking_rate.as_ref())?;
        let voice_tier = match request.voice_mode.as_deref() {
            None | Some("") => VoiceTier::Standard,
            Some(mode) => mode.parse::<VoiceTier>().map_err(AppError::BadRequest)?,
        };

        let mut result = match voice_tier {
            VoiceTier::Standard => {
                controller
                    .tts_service
                    .synthesize_aligned(request.text, request.voice_name, speaking_rate)
                    .await?
            }
            VoiceTier::HighQuality => {
                controller
                    .tts_service
                    .synthesize_plain(request.text, request.voice_name)
                    .await?
            }
        };

        let stored = controller
            .audio_store
            .save(std::mem::take(&mut result.audio_data))
            .await;
        tracing::info!(
            audio_id = %stored.audio_id,
            bytes_size = stored.bytes_size,
            voice_mode = %voice_tier,
            sync_mode = ?result.sync_mode,
            "Synthesis stored"
        );

        Ok(Json(TtsResponse::new(result, stored.url)))
    }

    /// GET /api/tts/audio/:audioId - Fetch previously synthesized audio
    pub async fn get_audio(
        State(controller): State<Arc<TtsController>>,
        Path(audio_id): Path<String>,
    ) -> AppResult<Response> {
        let audio = controller
            .audio_store
            .get(&audio_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("audio {}", audio_id)))?;

        Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"))],
            Body::from(audio.as_ref().clone()),
        )
            .into_response())
    }

    /// GET /api/tts/voices - Voices available per tier
    pub async fn list_voices(
        State(controller): State<Arc<TtsController>>,
    ) -> AppResult<Json<VoiceCatalog>> {
        let catalog = controller.tts_service.list_voices().await?;
        Ok(Json(catalog))
    }
}
