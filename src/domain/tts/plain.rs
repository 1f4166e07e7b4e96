use super::chunker::{pack_chunks, ChunkLimits, PlainTextMeasure};
use super::error::TtsServiceError;
use super::script::is_split_break;
use super::token::Token;
use crate::infrastructure::repositories::{TtsBackendError, TtsRepository};

/// How far from the midpoint, in characters, a bisection looks for a break.
const SPLIT_SEARCH_WINDOW: usize = 24;

/// Limits on how hard the pipeline fights "sentence too long" rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitBudget {
    pub max_split_depth: usize,
    pub max_tts_calls: usize,
}

impl Default for SplitBudget {
    fn default() -> Self {
        Self {
            max_split_depth: 8,
            max_tts_calls: 128,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlainSynthesis {
    pub audio: Vec<u8>,
    pub chunk_count: usize,
    pub total_calls: usize,
    pub split_retries: usize,
    pub max_depth_reached: usize,
}

/// Split `text` in two near its middle, preferring to cut right after a break
/// character within [`SPLIT_SEARCH_WINDOW`] of the midpoint. `None` when the
/// text has fewer than two characters.
pub fn bisect_text(text: &str) -> Option<(String, String)> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 2 {
        return None;
    }

    let mid = chars.len() / 2;
    let window = SPLIT_SEARCH_WINDOW.min(mid);
    let is_cut = |idx: usize| idx > 0 && idx < chars.len() && is_split_break(chars[idx - 1]);

    let cut = (0..=window)
        .find_map(|d| [mid + d, mid - d].into_iter().find(|&idx| is_cut(idx)))
        .unwrap_or(mid);

    Some((chars[..cut].iter().collect(), chars[cut..].iter().collect()))
}

/// Synthesis for voices without marker support.
///
/// Tokens are packed by raw byte length. A chunk the provider rejects as too
/// long is bisected and both halves retried, tracked on an explicit stack so
/// that depth and call count stay bounded by [`SplitBudget`].
pub struct PlainTextPipeline<'a> {
    tts_repo: &'a dyn TtsRepository,
    limits: ChunkLimits,
    budget: SplitBudget,
}

impl<'a> PlainTextPipeline<'a> {
    pub fn new(tts_repo: &'a dyn TtsRepository, limits: ChunkLimits, budget: SplitBudget) -> Self {
        Self {
            tts_repo,
            limits,
            budget,
        }
    }

    pub async fn run(
        &self,
        tokens: &[Token],
        voice_id: &str,
    ) -> Result<PlainSynthesis, TtsServiceError> {
        let chunks = pack_chunks(tokens, &PlainTextMeasure, self.limits)?;
        tracing::info!(
            token_count = tokens.len(),
            chunk_count = chunks.len(),
            voice = voice_id,
            "Synthesizing plain text"
        );

        let mut result = PlainSynthesis {
            audio: Vec::new(),
            chunk_count: chunks.len(),
            total_calls: 0,
            split_retries: 0,
            max_depth_reached: 0,
        };

        for chunk in chunks {
            let text: String = chunk.iter().map(|t| t.ch).collect();
            self.synthesize_chunk(text, voice_id, &mut result).await?;
        }

        tracing::info!(
            chunk_count = result.chunk_count,
            total_calls = result.total_calls,
            split_retries = result.split_retries,
            max_depth_reached = result.max_depth_reached,
            audio_size = result.audio.len(),
            "Plain text synthesis completed"
        );

        Ok(result)
    }

    async fn synthesize_chunk(
        &self,
        text: String,
        voice_id: &str,
        result: &mut PlainSynthesis,
    ) -> Result<(), TtsServiceError> {
        // Popped last-in-first-out with the left half pushed last, so audio stays in text order.
        let mut pending = vec![(text, 0usize)];

        while let Some((piece, depth)) = pending.pop() {
            if piece.trim().is_empty() {
                continue;
            }

            if result.total_calls >= self.budget.max_tts_calls {
                return Err(TtsServiceError::CallBudgetExhausted {
                    calls: result.total_calls,
                });
            }
            result.total_calls += 1;
            result.max_depth_reached = result.max_depth_reached.max(depth);

            match self.tts_repo.synthesize_text(&piece, voice_id).await {
                Ok(audio) => result.audio.extend(audio),
                Err(TtsBackendError::SentenceTooLong(message)) => {
                    let halves = if depth < self.budget.max_split_depth {
                        bisect_text(&piece)
                    } else {
                        None
                    };
                    let Some((left, right)) = halves else {
                        tracing::warn!(
                            depth,
                            calls = result.total_calls,
                            piece_chars = piece.chars().count(),
                            "Split depth budget exhausted"
                        );
                        return Err(TtsServiceError::SplitDepthExhausted {
                            depth,
                            calls: result.total_calls,
                        });
                    };

                    tracing::debug!(
                        depth,
                        piece_chars = piece.chars().count(),
                        error = %message,
                        "Provider rejected text as too long, splitting"
                    );
                    result.split_retries += 1;
                    pending.push((right, depth + 1));
                    pending.push((left, depth + 1));
                }
                Err(other) => return Err(other.into()),
            }
        }

        Ok(())
    }
}
