use crate::domain::tts::{Timepoint, VoiceCatalog};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// Audio plus the marker timepoints reported for one markup call.
#[derive(Debug, Clone, Default)]
pub struct MarkupSpeech {
    pub audio: Vec<u8>,
    /// Seconds from the start of this call's audio.
    pub timepoints: Vec<Timepoint>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TtsBackendError {
    #[error("unsupported voice: {0}")]
    UnsupportedVoice(String),
    #[error("sentence too long for this voice tier: {0}")]
    SentenceTooLong(String),
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),
    #[error("provider error: {0}")]
    Provider(String),
}

impl TtsBackendError {
    /// Classify a provider error message by the phrases providers use for
    /// over-long input.
    pub fn classify(message: String) -> Self {
        static TOO_LONG_RE: OnceLock<Regex> = OnceLock::new();
        let too_long = TOO_LONG_RE.get_or_init(|| {
            Regex::new(r"(?i)sentences? that (are|is) too long|TextLengthExceeded").unwrap()
        });

        if too_long.is_match(&message) {
            TtsBackendError::SentenceTooLong(message)
        } else {
            TtsBackendError::Provider(message)
        }
    }
}

/// Repository for TTS synthesis operations.
/// Abstracts the underlying speech provider.
///
/// Implementations bound every call by their own timeout and never retry; the
/// synthesis pipeline decides what is worth another attempt.
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize an SSML payload with `<mark>` tags and return the audio
    /// together with one timepoint per marker the provider reported.
    ///
    /// # Errors
    /// `UnsupportedVoice` when the voice is not in the alignment tier,
    /// `Provider`/`Timeout` for anything else.
    async fn synthesize_markup(
        &self,
        markup: &str,
        voice_id: &str,
        speaking_rate: f32,
    ) -> Result<MarkupSpeech, TtsBackendError>;

    /// Synthesize plain text with a voice that has no marker support.
    ///
    /// # Errors
    /// `SentenceTooLong` when the provider rejects the text as too long for the
    /// tier; the caller may split and retry.
    async fn synthesize_text(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, TtsBackendError>;

    /// Voices available for synthesis, partitioned by tier.
    async fn voice_catalog(&self) -> Result<VoiceCatalog, TtsBackendError>;
}
