use super::script::is_cjk;
use serde::{Deserialize, Serialize};

/// One character of normalized input.
///
/// `token_id` equals the character position in the normalized text and is the
/// identity used to map synthesis markers back to displayed characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token_id: usize,
    #[serde(rename = "char")]
    pub ch: char,
    pub raw_index: usize,
    pub jyutping: String,
}

/// Source of best-effort phonetic readings for single characters.
pub trait ReadingLookup: Send + Sync {
    fn reading(&self, ch: char) -> Option<String>;
}

/// Lookup that never knows a reading.
pub struct NoReadings;

impl ReadingLookup for NoReadings {
    fn reading(&self, _ch: char) -> Option<String> {
        None
    }
}

/// Collapse `\r\n` and `\r` into `\n`, then trim surrounding whitespace.
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Build one token per character of already-normalized text.
///
/// Readings are only looked up for CJK ideographs; anything the lookup cannot
/// answer leaves `jyutping` empty.
pub fn build_tokens(text: &str, readings: &dyn ReadingLookup) -> Vec<Token> {
    text.chars()
        .enumerate()
        .map(|(idx, ch)| Token {
            token_id: idx,
            ch,
            raw_index: idx,
            jyutping: if is_cjk(ch) {
                readings.reading(ch).unwrap_or_default()
            } else {
                String::new()
            },
        })
        .collect()
}
