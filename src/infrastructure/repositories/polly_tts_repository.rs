use super::tts_repository::{MarkupSpeech, TtsBackendError, TtsRepository};
use super::voice_catalog_cache::CatalogCache;
use crate::domain::shared::Clock;
use crate::domain::tts::markup::apply_speaking_rate;
use crate::domain::tts::{Timepoint, VoiceCatalog, VoiceEntry, VoiceTier};
use async_trait::async_trait;
use aws_sdk_polly::{
    error::{DisplayErrorContext, SdkError},
    operation::synthesize_speech::SynthesizeSpeechError,
    types::{Engine, LanguageCode, OutputFormat, SpeechMarkType, TextType, VoiceId},
    Client as PollyClient,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PollySettings {
    pub language_code: String,
    pub timeout: Duration,
    pub catalog_ttl: chrono::Duration,
}

/// Catalog plus the engine each voice is called with.
#[derive(Debug, Clone, Default)]
struct PollyVoices {
    catalog: VoiceCatalog,
    markup_engines: HashMap<String, Engine>,
}

/// One line of Polly's speech-mark NDJSON output.
#[derive(Debug, Deserialize)]
struct SpeechMark {
    /// Milliseconds from the start of the audio.
    time: u64,
    #[serde(rename = "type")]
    kind: String,
    value: String,
}

/// Parse SSML speech marks into timepoints in seconds. Non-`ssml` marks and
/// unreadable lines are skipped.
pub fn parse_speech_marks(ndjson: &str) -> Vec<Timepoint> {
    ndjson
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<SpeechMark>(line) {
            Ok(mark) => Some(mark),
            Err(e) => {
                tracing::warn!(error = %e, line, "Skipping unreadable speech mark");
                None
            }
        })
        .filter(|mark| mark.kind == "ssml")
        .map(|mark| Timepoint::new(mark.value, mark.time as f64 / 1000.0))
        .collect()
}

fn classify_synthesis_error(
    err: SdkError<SynthesizeSpeechError>,
    voice_id: &str,
) -> TtsBackendError {
    if let Some(service_err) = err.as_service_error() {
        if service_err.is_text_length_exceeded_exception() {
            return TtsBackendError::SentenceTooLong(service_err.to_string());
        }
        if service_err.is_engine_not_supported_exception() {
            return TtsBackendError::UnsupportedVoice(voice_id.to_string());
        }
    }
    TtsBackendError::classify(format!("AWS Polly error: {}", DisplayErrorContext(&err)))
}

/// AWS Polly implementation of TTS repository
pub struct PollyTtsRepository {
    polly_client: Arc<PollyClient>,
    settings: PollySettings,
    voices: CatalogCache<PollyVoices>,
}

impl PollyTtsRepository {
    pub fn new(
        polly_client: Arc<PollyClient>,
        settings: PollySettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let voices = CatalogCache::new(settings.catalog_ttl, clock);
        Self {
            polly_client,
            settings,
            voices,
        }
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, TtsBackendError>>,
    ) -> Result<T, TtsBackendError> {
        match tokio::time::timeout(self.settings.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.settings.timeout.as_secs(),
                    "AWS Polly call timed out"
                );
                Err(TtsBackendError::Timeout(self.settings.timeout))
            }
        }
    }

    async fn polly_voices(&self) -> Result<PollyVoices, TtsBackendError> {
        self.voices.get_or_refresh(|| self.describe_voices()).await
    }

    /// Page through DescribeVoices for the configured language.
    async fn describe_voices(&self) -> Result<PollyVoices, TtsBackendError> {
        let mut voices = PollyVoices::default();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .polly_client
                .describe_voices()
                .language_code(LanguageCode::from(self.settings.language_code.as_str()))
                .include_additional_language_codes(true)
                .set_next_token(next_token.take())
                .send();
            let output = self
                .with_timeout(async {
                    page.await.map_err(|e| {
                        TtsBackendError::Provider(format!(
                            "AWS Polly DescribeVoices error: {}",
                            DisplayErrorContext(&e)
                        ))
                    })
                })
                .await?;

            for voice in output.voices() {
                let Some(id) = voice.id().map(|v| v.as_str().to_string()) else {
                    continue;
                };
                let name = voice.name().unwrap_or(&id).to_string();
                let engines = voice.supported_engines();

                let markup_engine = [Engine::Neural, Engine::Standard]
                    .into_iter()
                    .find(|engine| engines.contains(engine));
                if let Some(engine) = markup_engine {
                    voices.catalog.push(
                        VoiceTier::Standard,
                        VoiceEntry {
                            id: id.clone(),
                            label: format!("{} ({})", name, engine.as_str()),
                        },
                    );
                    voices.markup_engines.insert(id.clone(), engine);
                }
                if engines.contains(&Engine::Generative) {
                    voices.catalog.push(
                        VoiceTier::HighQuality,
                        VoiceEntry {
                            id: id.clone(),
                            label: format!("{} (generative)", name),
                        },
                    );
                }
            }

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        tracing::info!(
            language = %self.settings.language_code,
            standard_voices = voices.catalog.standard.len(),
            high_quality_voices = voices.catalog.high_quality.len(),
            "Voice catalog refreshed from AWS Polly"
        );

        Ok(voices)
    }

    /// Call SynthesizeSpeech once and collect the whole output stream.
    async fn call_polly(
        &self,
        text: &str,
        text_type: TextType,
        voice_id: &str,
        engine: Engine,
        output_format: OutputFormat,
        speech_marks: bool,
    ) -> Result<Vec<u8>, TtsBackendError> {
        let mut request = self
            .polly_client
            .synthesize_speech()
            .text(text)
            .text_type(text_type)
            .voice_id(VoiceId::from(voice_id))
            .engine(engine.clone())
            .output_format(output_format.clone());
        if speech_marks {
            request = request.speech_mark_types(SpeechMarkType::Ssml);
        }

        let result = request.send().await.map_err(|e| {
            let classified = classify_synthesis_error(e, voice_id);
            tracing::error!(
                error = %classified,
                voice_id,
                engine = ?engine,
                output_format = ?output_format,
                text_length = text.len(),
                "AWS Polly synthesize_speech failed"
            );
            classified
        })?;

        let stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            TtsBackendError::Provider(format!("Failed to read audio stream: {}", e))
        })?;

        Ok(stream.into_bytes().to_vec())
    }
}

#[async_trait]
impl TtsRepository for PollyTtsRepository {
    async fn synthesize_markup(
        &self,
        markup: &str,
        voice_id: &str,
        speaking_rate: f32,
    ) -> Result<MarkupSpeech, TtsBackendError> {
        let voices = self.polly_voices().await?;
        let engine = voices
            .markup_engines
            .get(voice_id)
            .cloned()
            .ok_or_else(|| TtsBackendError::UnsupportedVoice(voice_id.to_string()))?;

        let start_time = std::time::Instant::now();
        let ssml = apply_speaking_rate(markup, speaking_rate);

        let (audio, marks) = self
            .with_timeout(async {
                tokio::try_join!(
                    self.call_polly(
                        &ssml,
                        TextType::Ssml,
                        voice_id,
                        engine.clone(),
                        OutputFormat::Mp3,
                        false,
                    ),
                    self.call_polly(
                        &ssml,
                        TextType::Ssml,
                        voice_id,
                        engine.clone(),
                        OutputFormat::Json,
                        true,
                    ),
                )
            })
            .await?;

        let timepoints = parse_speech_marks(&String::from_utf8_lossy(&marks));

        tracing::info!(
            provider = "polly",
            voice = voice_id,
            engine = ?engine,
            latency_ms = start_time.elapsed().as_millis(),
            payload_bytes = ssml.len(),
            audio_size_bytes = audio.len(),
            timepoints = timepoints.len(),
            "Polly markup synthesis completed"
        );

        Ok(MarkupSpeech { audio, timepoints })
    }

    async fn synthesize_text(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Result<Vec<u8>, TtsBackendError> {
        let start_time = std::time::Instant::now();

        let audio = self
            .with_timeout(self.call_polly(
                text,
                TextType::Text,
                voice_id,
                Engine::Generative,
                OutputFormat::Mp3,
                false,
            ))
            .await?;

        tracing::info!(
            provider = "polly",
            voice = voice_id,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.chars().count(),
            audio_size_bytes = audio.len(),
            "Polly text synthesis completed"
        );

        Ok(audio)
    }

    async fn voice_catalog(&self) -> Result<VoiceCatalog, TtsBackendError> {
        Ok(self.polly_voices().await?.catalog)
    }
}
