use super::aligned::AlignedPipeline;
use super::dto::{SyncMode, SynthesisStats, TtsSynthesisResult};
use super::error::TtsServiceError;
use super::plain::PlainTextPipeline;
use super::settings::SynthesisSettings;
use super::token::{build_tokens, normalize_text, ReadingLookup};
use super::voice::{VoiceCatalog, VoiceTier};
use crate::infrastructure::repositories::TtsRepository;
use async_trait::async_trait;
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub struct TtsService {
    tts_repo: Arc<dyn TtsRepository>,
    readings: Arc<dyn ReadingLookup>,
    settings: SynthesisSettings,
    cache: Option<Cache<String, TtsSynthesisResult>>,
}

impl TtsService {
    pub fn new(
        tts_repo: Arc<dyn TtsRepository>,
        readings: Arc<dyn ReadingLookup>,
        settings: SynthesisSettings,
    ) -> Self {
        let cache = if settings.result_cache_enabled {
            Some(
                Cache::builder()
                    .max_capacity(100)
                    .time_to_idle(Duration::from_secs(30 * 60)) // 30 minutes, refreshes on access
                    .build(),
            )
        } else {
            None
        };

        Self {
            tts_repo,
            readings,
            settings,
            cache,
        }
    }

    pub fn settings(&self) -> &SynthesisSettings {
        &self.settings
    }
}

#[async_trait]
pub trait TtsServiceApi: Send + Sync {
    /// Synthesize with a standard-tier voice, returning per-character timepoints.
    ///
    /// Fails when the text cannot be chunked, when a chunk's timing stays
    /// degraded after the reduced-fidelity retry, or when the provider fails.
    async fn synthesize_aligned(
        &self,
        text: String,
        voice_id: String,
        speaking_rate: f32,
    ) -> Result<TtsSynthesisResult, TtsServiceError>;

    /// Synthesize with a high-quality voice. No timepoints are produced.
    async fn synthesize_plain(
        &self,
        text: String,
        voice_id: String,
    ) -> Result<TtsSynthesisResult, TtsServiceError>;

    async fn list_voices(&self) -> Result<VoiceCatalog, TtsServiceError>;
}

#[async_trait]
impl TtsServiceApi for TtsService {
    async fn synthesize_aligned(
        &self,
        text: String,
        voice_id: String,
        speaking_rate: f32,
    ) -> Result<TtsSynthesisResult, TtsServiceError> {
        let normalized = self.prepare_text(&text)?;
        self.guard_voice(VoiceTier::Standard, &voice_id).await?;

        let cache_key = format!(
            "{}:{}:{:.2}:{}",
            VoiceTier::Standard,
            voice_id,
            speaking_rate,
            normalized
        );
        if let Some(cached) = self.cached(&cache_key).await {
            return Ok(cached);
        }

        let tokens = build_tokens(&normalized, self.readings.as_ref());
        let start_time = std::time::Instant::now();

        let synthesis = AlignedPipeline::new(
            self.tts_repo.as_ref(),
            self.settings.markup_limits,
            self.settings.marker_recovery,
        )
        .run(&tokens, &voice_id, speaking_rate)
        .await?;

        tracing::info!(
            voice = %voice_id,
            characters_count = tokens.len(),
            chunk_count = synthesis.chunk_count,
            total_calls = synthesis.total_calls,
            sync_mode = %synthesis.sync_mode,
            duration_seconds = synthesis.duration_seconds,
            audio_size_bytes = synthesis.audio.len(),
            latency_ms = start_time.elapsed().as_millis(),
            "Aligned TTS synthesis completed"
        );

        let result = TtsSynthesisResult {
            audio_data: synthesis.audio,
            timepoints: synthesis.timepoints,
            tokens,
            mark_to_token: synthesis.mark_to_token,
            sync_mode: synthesis.sync_mode.into(),
            duration_seconds: synthesis.duration_seconds,
            voice_tier: VoiceTier::Standard,
            stats: SynthesisStats {
                chunk_count: synthesis.chunk_count,
                total_calls: synthesis.total_calls,
                split_retries: 0,
            },
        };

        self.store(cache_key, &result).await;
        Ok(result)
    }

    async fn synthesize_plain(
        &self,
        text: String,
        voice_id: String,
    ) -> Result<TtsSynthesisResult, TtsServiceError> {
        let normalized = self.prepare_text(&text)?;
        self.guard_voice(VoiceTier::HighQuality, &voice_id).await?;

        let cache_key = format!("{}:{}:{}", VoiceTier::HighQuality, voice_id, normalized);
        if let Some(cached) = self.cached(&cache_key).await {
            return Ok(cached);
        }

        let tokens = build_tokens(&normalized, self.readings.as_ref());
        let start_time = std::time::Instant::now();

        let synthesis = PlainTextPipeline::new(
            self.tts_repo.as_ref(),
            self.settings.text_limits,
            self.settings.split_budget,
        )
        .run(&tokens, &voice_id)
        .await?;

        tracing::info!(
            voice = %voice_id,
            characters_count = tokens.len(),
            hq_total_calls = synthesis.total_calls,
            hq_split_retries = synthesis.split_retries,
            audio_size_bytes = synthesis.audio.len(),
            latency_ms = start_time.elapsed().as_millis(),
            "High-quality TTS synthesis completed"
        );

        let result = TtsSynthesisResult {
            audio_data: synthesis.audio,
            timepoints: Vec::new(),
            tokens,
            mark_to_token: HashMap::new(),
            sync_mode: SyncMode::None,
            duration_seconds: 0.0,
            voice_tier: VoiceTier::HighQuality,
            stats: SynthesisStats {
                chunk_count: synthesis.chunk_count,
                total_calls: synthesis.total_calls,
                split_retries: synthesis.split_retries,
            },
        };

        self.store(cache_key, &result).await;
        Ok(result)
    }

    async fn list_voices(&self) -> Result<VoiceCatalog, TtsServiceError> {
        Ok(self.tts_repo.voice_catalog().await?)
    }
}

impl TtsService {
    /// Normalize and enforce the input bounds.
    fn prepare_text(&self, text: &str) -> Result<String, TtsServiceError> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Err(TtsServiceError::Invalid("text is required".to_string()));
        }

        let max_chars = self.settings.max_input_chars;
        if normalized.chars().count() > max_chars {
            return Err(TtsServiceError::InputTooLong { max_chars });
        }

        Ok(normalized)
    }

    async fn guard_voice(&self, tier: VoiceTier, voice_id: &str) -> Result<(), TtsServiceError> {
        let catalog = self.tts_repo.voice_catalog().await?;
        if catalog.contains(tier, voice_id) {
            Ok(())
        } else {
            tracing::warn!(voice = voice_id, tier = %tier, "Voice not in catalog for tier");
            Err(TtsServiceError::UnsupportedVoice(voice_id.to_string()))
        }
    }

    async fn cached(&self, key: &str) -> Option<TtsSynthesisResult> {
        let cache = self.cache.as_ref()?;
        let hit = cache.get(key).await?;
        tracing::info!(
            cached_audio_size = hit.audio_data.len(),
            voice_tier = %hit.voice_tier,
            "TTS cache hit - returning cached result"
        );
        Some(hit)
    }

    async fn store(&self, key: String, result: &TtsSynthesisResult) {
        if let Some(cache) = &self.cache {
            cache.insert(key, result.clone()).await;
        }
    }
}
