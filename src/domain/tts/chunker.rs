use super::error::TtsServiceError;
use super::segment::segment_bounds;
use super::token::Token;
use std::ops::Range;

/// How many bytes a chunk costs once rendered for the backend.
///
/// The total is additive: a fixed frame that may depend on the chunk's
/// boundaries plus the sum of per-token costs.
pub trait PayloadMeasure {
    fn token_bytes(&self, token: &Token) -> usize;

    fn frame_bytes(&self, chunk: &[Token]) -> usize;

    fn payload_bytes(&self, chunk: &[Token]) -> usize {
        self.frame_bytes(chunk) + chunk.iter().map(|t| self.token_bytes(t)).sum::<usize>()
    }
}

/// Raw UTF-8 length, for voices that take plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextMeasure;

impl PayloadMeasure for PlainTextMeasure {
    fn token_bytes(&self, token: &Token) -> usize {
        token.ch.len_utf8()
    }

    fn frame_bytes(&self, _chunk: &[Token]) -> usize {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    /// Soft limit; packing prefers to stay at or under it.
    pub target_max_bytes: usize,
    /// No chunk may exceed this once rendered.
    pub hard_max_bytes: usize,
}

impl ChunkLimits {
    pub const MARKUP: ChunkLimits = ChunkLimits {
        target_max_bytes: 4200,
        hard_max_bytes: 5000,
    };

    pub const PLAIN_TEXT: ChunkLimits = ChunkLimits {
        target_max_bytes: 350,
        hard_max_bytes: 700,
    };
}

/// Greedily pack `tokens` into contiguous chunks.
///
/// Whole segments are preferred; a segment that cannot fit by itself is split
/// token by token. Fails when some chunk would exceed the hard limit.
pub fn pack_chunks<'a, M>(
    tokens: &'a [Token],
    measure: &M,
    limits: ChunkLimits,
) -> Result<Vec<&'a [Token]>, TtsServiceError>
where
    M: PayloadMeasure + ?Sized,
{
    let ChunkLimits {
        target_max_bytes,
        hard_max_bytes,
    } = limits;

    let size_of = |range: Range<usize>, body: usize| measure.frame_bytes(&tokens[range]) + body;
    let too_large = |size: usize| TtsServiceError::Chunking {
        size,
        hard_max_bytes,
    };

    let mut chunks: Vec<&[Token]> = Vec::new();
    // Current chunk is tokens[start..end]; body is the sum of its token costs.
    let mut start = 0;
    let mut end = 0;
    let mut body = 0;

    for segment in segment_bounds(tokens) {
        let segment_body: usize = tokens[segment.clone()]
            .iter()
            .map(|t| measure.token_bytes(t))
            .sum();

        if size_of(start..segment.end, body + segment_body) <= target_max_bytes {
            end = segment.end;
            body += segment_body;
            continue;
        }

        if end > start {
            chunks.push(&tokens[start..end]);
        }
        start = segment.start;
        end = segment.start;
        body = 0;

        if size_of(segment.clone(), segment_body) <= target_max_bytes {
            end = segment.end;
            body = segment_body;
            continue;
        }

        for idx in segment {
            let cost = measure.token_bytes(&tokens[idx]);
            let size = size_of(start..idx + 1, body + cost);
            if size <= target_max_bytes {
                end = idx + 1;
                body += cost;
                continue;
            }

            if end == start {
                if size > hard_max_bytes {
                    return Err(too_large(size));
                }
                end = idx + 1;
                body = cost;
                continue;
            }

            chunks.push(&tokens[start..end]);
            start = idx;
            end = idx + 1;
            body = cost;

            let size = size_of(start..end, body);
            if size > hard_max_bytes {
                return Err(too_large(size));
            }
        }
    }

    if end > start {
        chunks.push(&tokens[start..end]);
    }

    for chunk in &chunks {
        let size = measure.payload_bytes(chunk);
        if size > hard_max_bytes {
            return Err(too_large(size));
        }
    }

    tracing::debug!(
        token_count = tokens.len(),
        chunk_count = chunks.len(),
        target_max_bytes,
        hard_max_bytes,
        "Tokens packed into chunks"
    );

    Ok(chunks)
}
