use super::chunker::{pack_chunks, ChunkLimits};
use super::error::TtsServiceError;
use super::markup::{build_markup_with_sentinel, FidelityMode, MarkupMeasure};
use super::timeline::{AlignedSynthesis, ChunkOutcome, ChunkTiming, Timeline};
use super::token::Token;
use crate::infrastructure::repositories::TtsRepository;

/// Share of expected markers that must come back before a call's timing is
/// trusted. Providers that rewrite the payload silently drop markers.
pub const DEFAULT_MIN_MARKER_RECOVERY: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerRecovery {
    pub min_ratio: f64,
}

impl Default for MarkerRecovery {
    fn default() -> Self {
        Self {
            min_ratio: DEFAULT_MIN_MARKER_RECOVERY,
        }
    }
}

impl MarkerRecovery {
    pub fn new(min_ratio: f64) -> Self {
        Self { min_ratio }
    }

    /// Markers that must come back out of `mark_count`; at least one.
    pub fn required(&self, mark_count: usize) -> usize {
        ((mark_count as f64 * self.min_ratio).floor() as usize).max(1)
    }

    pub fn is_degraded(&self, mark_count: usize, returned: usize) -> bool {
        mark_count > 0 && returned < self.required(mark_count)
    }
}

/// Synthesis with per-character alignment.
///
/// Each chunk is tried in full fidelity, then once in reduced fidelity if too
/// few markers come back; a second degraded answer fails the request. Chunks
/// run in order because each chunk's offset depends on the previous chunk's end.
pub struct AlignedPipeline<'a> {
    tts_repo: &'a dyn TtsRepository,
    limits: ChunkLimits,
    recovery: MarkerRecovery,
}

impl<'a> AlignedPipeline<'a> {
    pub fn new(
        tts_repo: &'a dyn TtsRepository,
        limits: ChunkLimits,
        recovery: MarkerRecovery,
    ) -> Self {
        Self {
            tts_repo,
            limits,
            recovery,
        }
    }

    pub async fn run(
        &self,
        tokens: &[Token],
        voice_id: &str,
        speaking_rate: f32,
    ) -> Result<AlignedSynthesis, TtsServiceError> {
        let measure = MarkupMeasure::new(FidelityMode::Full).with_speaking_rate(speaking_rate);
        let chunks = pack_chunks(tokens, &measure, self.limits)?;
        tracing::info!(
            token_count = tokens.len(),
            chunk_count = chunks.len(),
            voice = voice_id,
            speaking_rate,
            "Synthesizing with alignment"
        );

        let mut timeline = Timeline::default();
        let mut total_calls = 0;

        for (chunk_index, chunk) in chunks.iter().enumerate() {
            let (outcome, calls) = self
                .synthesize_chunk(chunk_index, chunk, voice_id, speaking_rate)
                .await?;
            total_calls += calls;

            tracing::debug!(
                chunk_index,
                fidelity = %outcome.mode,
                markers = outcome.timing.user.len(),
                offset_seconds = timeline.offset(),
                "Chunk merged into timeline"
            );
            timeline.append(outcome);
        }

        Ok(timeline.finish(total_calls))
    }

    /// Returns the accepted attempt and the number of provider calls it took.
    async fn synthesize_chunk(
        &self,
        chunk_index: usize,
        chunk: &[Token],
        voice_id: &str,
        speaking_rate: f32,
    ) -> Result<(ChunkOutcome, usize), TtsServiceError> {
        let mut mode = FidelityMode::Full;
        let mut calls = 0;

        loop {
            let build = build_markup_with_sentinel(chunk, mode);
            let speech = self
                .tts_repo
                .synthesize_markup(&build.markup, voice_id, speaking_rate)
                .await?;
            calls += 1;

            let timing = ChunkTiming::split(speech.timepoints, &build);
            let returned = timing.user.len();
            if !self.recovery.is_degraded(build.mark_count, returned) {
                let outcome = ChunkOutcome {
                    mode,
                    build,
                    timing,
                    audio: speech.audio,
                };
                return Ok((outcome, calls));
            }

            tracing::warn!(
                chunk_index,
                fidelity = %mode,
                expected = build.mark_count,
                returned,
                required = self.recovery.required(build.mark_count),
                "Degraded timepoints from provider"
            );

            mode = match mode.fallback() {
                Some(next) => next,
                None => {
                    return Err(TtsServiceError::DegradedAlignment {
                        chunk_index,
                        returned,
                        expected: build.mark_count,
                    })
                }
            };
        }
    }
}
