use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Provider voice tiers. Only `Standard` voices accept alignment markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceTier {
    Standard,
    HighQuality,
}

impl VoiceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceTier::Standard => "standard",
            VoiceTier::HighQuality => "high_quality",
        }
    }
}

impl std::fmt::Display for VoiceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VoiceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(VoiceTier::Standard),
            "high_quality" => Ok(VoiceTier::HighQuality),
            other => Err(format!("Unknown voice_mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceEntry {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceCatalog {
    pub standard: Vec<VoiceEntry>,
    pub high_quality: Vec<VoiceEntry>,
}

impl VoiceCatalog {
    pub fn voices(&self, tier: VoiceTier) -> &[VoiceEntry] {
        match tier {
            VoiceTier::Standard => &self.standard,
            VoiceTier::HighQuality => &self.high_quality,
        }
    }

    pub fn push(&mut self, tier: VoiceTier, entry: VoiceEntry) {
        let voices = match tier {
            VoiceTier::Standard => &mut self.standard,
            VoiceTier::HighQuality => &mut self.high_quality,
        };
        if !voices.iter().any(|v| v.id == entry.id) {
            voices.push(entry);
        }
    }

    pub fn contains(&self, tier: VoiceTier, voice_id: &str) -> bool {
        self.voices(tier).iter().any(|v| v.id == voice_id)
    }

    pub fn len(&self) -> usize {
        self.standard.len() + self.high_quality.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
