use crate::domain::tts::ReadingLookup;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

fn cc_canto_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<trad>\S+)\s+(?P<simp>\S+)\s+\[[^\]]*\](?:\s+\{(?P<jyutping>[^}]*)\})?\s*/.+/$")
            .expect("valid CC-Canto regex")
    })
}

/// Single-character Jyutping readings.
///
/// Accepts CC-Canto dictionary lines (`TRAD SIMP [pinyin] {jyutping} /defs/`)
/// and `char<TAB>reading` lines. Multi-character terms are ignored and the
/// first reading seen for a character wins.
#[derive(Debug, Default)]
pub struct JyutpingTable {
    readings: HashMap<char, String>,
}

impl JyutpingTable {
    pub fn parse(content: &str) -> Self {
        let mut table = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(caps) = cc_canto_line().captures(line) {
                let Some(reading) = caps.name("jyutping").map(|m| m.as_str().trim()) else {
                    continue;
                };
                table.insert_term(&caps["trad"], reading);
                table.insert_term(&caps["simp"], reading);
            } else if let Some((term, reading)) = line.split_once('\t') {
                table.insert_term(term.trim(), reading.trim());
            }
        }

        table
    }

    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Load `path`, or fall back to an empty table with a warning.
    pub fn load_or_empty(path: Option<&str>) -> Self {
        let Some(path) = path else {
            tracing::info!("No Jyutping table configured, tokens carry no readings");
            return Self::default();
        };

        match Self::load(path) {
            Ok(table) => {
                tracing::info!(path, entries = table.len(), "Jyutping table loaded");
                table
            }
            Err(e) => {
                tracing::warn!(
                    path,
                    error = %e,
                    "Failed to load Jyutping table, continuing without readings"
                );
                Self::default()
            }
        }
    }

    fn insert_term(&mut self, term: &str, reading: &str) {
        let mut chars = term.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return;
        };
        if reading.is_empty() {
            return;
        }
        self.readings.entry(ch).or_insert_with(|| reading.to_string());
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl ReadingLookup for JyutpingTable {
    fn reading(&self, ch: char) -> Option<String> {
        self.readings.get(&ch).cloned()
    }
}
