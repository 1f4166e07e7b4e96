/// Punctuation that ends a sentence. Reduced-fidelity markup still marks these.
pub const SENTENCE_BREAKS: &[char] = &['。', '！', '？', '!', '?'];

/// Punctuation that ends a clause.
pub const CLAUSE_BREAKS: &[char] = &['，', ',', '；', ';', '：', ':'];

/// Characters preferred as cut points when a plain-text piece has to be bisected.
pub const SPLIT_BREAKS: &[char] = &[
    '。', '！', '？', '!', '?', '，', ',', '；', ';', '：', ':', '、', ' ', '\n', '\t',
];

/// CJK unified ideographs: Extension A, the base block, compatibility
/// ideographs, and Extensions B through F.
pub fn is_cjk(ch: char) -> bool {
    matches!(
        ch as u32,
        0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x2CEAF
    )
}

pub fn is_sentence_break(ch: char) -> bool {
    SENTENCE_BREAKS.contains(&ch)
}

pub fn is_segment_break(ch: char) -> bool {
    is_sentence_break(ch) || CLAUSE_BREAKS.contains(&ch)
}

pub fn is_split_break(ch: char) -> bool {
    SPLIT_BREAKS.contains(&ch)
}
