use super::script::is_segment_break;
use super::token::Token;
use std::ops::Range;

/// Index ranges of the segments of `tokens`, split after each sentence or
/// clause break. A trailing run without terminal punctuation is its own segment.
pub fn segment_bounds(tokens: &[Token]) -> Vec<Range<usize>> {
    let mut segments = Vec::new();
    let mut start = 0;

    for (idx, token) in tokens.iter().enumerate() {
        if is_segment_break(token.ch) {
            segments.push(start..idx + 1);
            start = idx + 1;
        }
    }

    if start < tokens.len() {
        segments.push(start..tokens.len());
    }

    segments
}
