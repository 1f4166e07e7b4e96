use super::chunker::PayloadMeasure;
use super::script::{is_cjk, is_sentence_break};
use super::token::Token;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const SPEAK_OPEN: &str = "<speak>";
const SPEAK_CLOSE: &str = "</speak>";
const PROSODY_CLOSE: &str = "</prosody>";
/// `<mark name="` + `"/>`
const MARK_TAG_OVERHEAD: usize = 15;

pub const MARK_PREFIX: &str = "c_";
pub const SENTINEL_PREFIX: &str = "chunk_end_";

/// Which characters get an alignment marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FidelityMode {
    /// Every non-whitespace character.
    Full,
    /// CJK ideographs and sentence-ending punctuation only.
    Reduced,
}

impl FidelityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FidelityMode::Full => "full",
            FidelityMode::Reduced => "reduced",
        }
    }

    /// The mode to retry with when timing for this mode came back degraded.
    pub fn fallback(self) -> Option<FidelityMode> {
        match self {
            FidelityMode::Full => Some(FidelityMode::Reduced),
            FidelityMode::Reduced => None,
        }
    }

    pub fn should_mark(&self, token: &Token) -> bool {
        if token.ch.is_whitespace() {
            return false;
        }
        match self {
            FidelityMode::Full => true,
            FidelityMode::Reduced => is_cjk(token.ch) || is_sentence_break(token.ch),
        }
    }
}

impl std::fmt::Display for FidelityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rendered SSML for one chunk.
#[derive(Debug, Clone)]
pub struct MarkupBuild {
    pub markup: String,
    pub mark_to_token: HashMap<String, usize>,
    pub mark_count: usize,
    /// Name of the end-of-chunk marker, when one was injected.
    pub sentinel: Option<String>,
}

pub fn mark_name(token_id: usize) -> String {
    format!("{}{}", MARK_PREFIX, token_id)
}

/// Sentinel names derive from the chunk's last token so that the payload of a
/// chunk depends on nothing but its tokens.
pub fn sentinel_name(chunk: &[Token]) -> Option<String> {
    chunk
        .last()
        .map(|token| format!("{}{}", SENTINEL_PREFIX, token.token_id))
}

fn mark_tag(name: &str) -> String {
    format!("<mark name=\"{}\"/>", name)
}

fn escape_char(ch: char) -> Option<&'static str> {
    match ch {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#x27;"),
        _ => None,
    }
}

fn escaped_len(ch: char) -> usize {
    escape_char(ch).map_or_else(|| ch.len_utf8(), str::len)
}

fn decimal_len(mut value: usize) -> usize {
    let mut len = 1;
    while value >= 10 {
        value /= 10;
        len += 1;
    }
    len
}

/// Percent for a `<prosody rate>` wrapper; `None` at the default rate.
fn rate_percent(speaking_rate: f32) -> Option<i32> {
    let percent = (speaking_rate * 100.0).round() as i32;
    (percent != 100).then_some(percent)
}

fn prosody_open(percent: i32) -> String {
    format!("<prosody rate=\"{}%\">", percent)
}

/// Bytes the prosody wrapper adds to a payload at `speaking_rate`.
pub fn speaking_rate_overhead(speaking_rate: f32) -> usize {
    rate_percent(speaking_rate).map_or(0, |percent| {
        prosody_open(percent).len() + PROSODY_CLOSE.len()
    })
}

/// Wrap the body of a `<speak>` document in a prosody rate. A rate of 1.0
/// leaves the payload untouched.
pub fn apply_speaking_rate(markup: &str, speaking_rate: f32) -> String {
    let Some(percent) = rate_percent(speaking_rate) else {
        return markup.to_string();
    };

    match markup
        .strip_prefix(SPEAK_OPEN)
        .and_then(|rest| rest.strip_suffix(SPEAK_CLOSE))
    {
        Some(body) => format!(
            "{}{}{}{}{}",
            SPEAK_OPEN,
            prosody_open(percent),
            body,
            PROSODY_CLOSE,
            SPEAK_CLOSE
        ),
        None => markup.to_string(),
    }
}

/// Render `tokens` with markers chosen by `mode`.
pub fn build_markup(tokens: &[Token], mode: FidelityMode) -> MarkupBuild {
    render(tokens, mode, false)
}

/// Like [`build_markup`], with the chunk's sentinel marker just before `</speak>`.
pub fn build_markup_with_sentinel(tokens: &[Token], mode: FidelityMode) -> MarkupBuild {
    render(tokens, mode, true)
}

fn render(tokens: &[Token], mode: FidelityMode, with_sentinel: bool) -> MarkupBuild {
    let mut markup =
        String::with_capacity(SPEAK_OPEN.len() + SPEAK_CLOSE.len() + tokens.len() * 24);
    let mut mark_to_token = HashMap::new();

    markup.push_str(SPEAK_OPEN);
    for token in tokens {
        if mode.should_mark(token) {
            let name = mark_name(token.token_id);
            markup.push_str(&mark_tag(&name));
            mark_to_token.insert(name, token.token_id);
        }
        match escape_char(token.ch) {
            Some(escaped) => markup.push_str(escaped),
            None => markup.push(token.ch),
        }
    }

    let sentinel = if with_sentinel { sentinel_name(tokens) } else { None };
    if let Some(name) = &sentinel {
        markup.push_str(&mark_tag(name));
    }
    markup.push_str(SPEAK_CLOSE);

    let mark_count = mark_to_token.len();
    MarkupBuild {
        markup,
        mark_to_token,
        mark_count,
        sentinel,
    }
}

/// Byte size of the payload that would actually be sent for a chunk, prosody
/// wrapper included.
///
/// Reduced markup of a chunk is never larger than its full markup, so chunks
/// packed against `Full` also fit when retried in `Reduced`.
#[derive(Debug, Clone, Copy)]
pub struct MarkupMeasure {
    pub mode: FidelityMode,
    pub with_sentinel: bool,
    pub speaking_rate: f32,
}

impl MarkupMeasure {
    pub fn new(mode: FidelityMode) -> Self {
        Self {
            mode,
            with_sentinel: true,
            speaking_rate: 1.0,
        }
    }

    pub fn with_speaking_rate(self, speaking_rate: f32) -> Self {
        Self {
            speaking_rate,
            ..self
        }
    }
}

impl PayloadMeasure for MarkupMeasure {
    fn token_bytes(&self, token: &Token) -> usize {
        let mark = if self.mode.should_mark(token) {
            MARK_TAG_OVERHEAD + MARK_PREFIX.len() + decimal_len(token.token_id)
        } else {
            0
        };
        mark + escaped_len(token.ch)
    }

    fn frame_bytes(&self, chunk: &[Token]) -> usize {
        let sentinel = match chunk.last() {
            Some(last) if self.with_sentinel => {
                MARK_TAG_OVERHEAD + SENTINEL_PREFIX.len() + decimal_len(last.token_id)
            }
            _ => 0,
        };
        SPEAK_OPEN.len()
            + SPEAK_CLOSE.len()
            + sentinel
            + speaking_rate_overhead(self.speaking_rate)
    }

    fn payload_bytes(&self, chunk: &[Token]) -> usize {
        let markup = render(chunk, self.mode, self.with_sentinel).markup;
        apply_speaking_rate(&markup, self.speaking_rate).len()
    }
}
