use super::markup::FidelityMode;
use super::timeline::Timepoint;
use super::token::Token;
use super::voice::VoiceTier;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request for POST /api/tts/synthesize
#[derive(Debug, Serialize, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub voice_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_mode: Option<String>,
    /// Kept loose so non-numeric values can be reported as a bad request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaking_rate: Option<serde_json::Value>,
}

/// How closely the returned timepoints track the characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Full,
    Reduced,
    /// The voice tier cannot report timepoints at all.
    None,
}

impl SyncMode {
    pub fn alignment_supported(&self) -> bool {
        !matches!(self, SyncMode::None)
    }
}

impl From<FidelityMode> for SyncMode {
    fn from(mode: FidelityMode) -> Self {
        match mode {
            FidelityMode::Full => SyncMode::Full,
            FidelityMode::Reduced => SyncMode::Reduced,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisStats {
    pub chunk_count: usize,
    pub total_calls: usize,
    pub split_retries: usize,
}

#[derive(Debug, Clone)]
pub struct TtsSynthesisResult {
    pub audio_data: Vec<u8>,
    pub timepoints: Vec<Timepoint>,
    pub tokens: Vec<Token>,
    pub mark_to_token: HashMap<String, usize>,
    pub sync_mode: SyncMode,
    pub duration_seconds: f64,
    pub voice_tier: VoiceTier,
    pub stats: SynthesisStats,
}

/// Response for POST /api/tts/synthesize
#[derive(Debug, Serialize, Deserialize)]
pub struct TtsResponse {
    pub audio_url: String,
    pub duration_seconds: f64,
    pub timepoints: Vec<Timepoint>,
    pub tokens: Vec<Token>,
    pub mark_to_token: HashMap<String, usize>,
    pub sync_mode: SyncMode,
    pub alignment_supported: bool,
    pub voice_mode: VoiceTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hq_total_calls: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hq_split_retries: Option<usize>,
}

impl TtsResponse {
    pub fn new(result: TtsSynthesisResult, audio_url: String) -> Self {
        let high_quality = result.voice_tier == VoiceTier::HighQuality;
        Self {
            audio_url,
            duration_seconds: result.duration_seconds,
            timepoints: result.timepoints,
            tokens: result.tokens,
            mark_to_token: result.mark_to_token,
            sync_mode: result.sync_mode,
            alignment_supported: result.sync_mode.alignment_supported(),
            voice_mode: result.voice_tier,
            hq_total_calls: high_quality.then_some(result.stats.total_calls),
            hq_split_retries: high_quality.then_some(result.stats.split_retries),
        }
    }
}
