use super::markup::{FidelityMode, MarkupBuild};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A marker reported by the provider and the seconds elapsed when it was spoken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timepoint {
    pub mark_name: String,
    pub seconds: f64,
}

impl Timepoint {
    pub fn new(mark_name: impl Into<String>, seconds: f64) -> Self {
        Self {
            mark_name: mark_name.into(),
            seconds,
        }
    }
}

/// One call's timepoints, split into user markers and the sentinel's time.
#[derive(Debug, Clone, Default)]
pub struct ChunkTiming {
    pub user: Vec<Timepoint>,
    pub end_seconds: Option<f64>,
}

impl ChunkTiming {
    /// Keep timepoints of markers `build` emitted; the sentinel's time becomes
    /// `end_seconds`. Unknown names are dropped.
    pub fn split(points: Vec<Timepoint>, build: &MarkupBuild) -> Self {
        let mut timing = ChunkTiming::default();
        for point in points {
            if build.sentinel.as_deref() == Some(point.mark_name.as_str()) {
                timing.end_seconds = Some(point.seconds);
            } else if build.mark_to_token.contains_key(&point.mark_name) {
                timing.user.push(point);
            } else {
                tracing::debug!(mark_name = %point.mark_name, "Ignoring unknown timepoint");
            }
        }
        timing
    }

    pub fn latest_seconds(&self) -> f64 {
        self.user.iter().map(|p| p.seconds).fold(0.0, f64::max)
    }
}

/// The accepted attempt for one chunk.
#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    pub mode: FidelityMode,
    pub build: MarkupBuild,
    pub timing: ChunkTiming,
    pub audio: Vec<u8>,
}

/// Merged result of every chunk, in chunk order.
#[derive(Debug, Clone)]
pub struct AlignedSynthesis {
    pub audio: Vec<u8>,
    pub timepoints: Vec<Timepoint>,
    pub mark_to_token: HashMap<String, usize>,
    pub sync_mode: FidelityMode,
    pub duration_seconds: f64,
    pub chunk_count: usize,
    pub total_calls: usize,
}

/// Accumulates chunk outcomes into one timeline measured from the start of the
/// whole utterance.
#[derive(Debug)]
pub struct Timeline {
    offset: f64,
    audio: Vec<u8>,
    timepoints: Vec<Timepoint>,
    mark_to_token: HashMap<String, usize>,
    sync_mode: FidelityMode,
    chunk_count: usize,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            offset: 0.0,
            audio: Vec::new(),
            timepoints: Vec::new(),
            mark_to_token: HashMap::new(),
            sync_mode: FidelityMode::Full,
            chunk_count: 0,
        }
    }
}

impl Timeline {
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn append(&mut self, outcome: ChunkOutcome) {
        let ChunkOutcome {
            mode,
            build,
            timing,
            audio,
        } = outcome;

        let latest = timing.latest_seconds();
        let chunk_end = match timing.end_seconds {
            // The end never falls before a spoken marker, or the timeline could step back.
            Some(end) => end.max(latest),
            None => {
                tracing::warn!(
                    chunk_index = self.chunk_count,
                    latest_seconds = latest,
                    "Chunk end marker missing, advancing offset by latest marker"
                );
                latest
            }
        };

        let mut user = timing.user;
        user.sort_by(|a, b| a.seconds.total_cmp(&b.seconds));
        for point in user {
            self.timepoints.push(Timepoint {
                mark_name: point.mark_name,
                seconds: point.seconds + self.offset,
            });
        }

        self.offset += chunk_end;
        self.mark_to_token.extend(build.mark_to_token);
        if mode == FidelityMode::Reduced {
            self.sync_mode = FidelityMode::Reduced;
        }
        self.audio.extend(audio);
        self.chunk_count += 1;
    }

    pub fn finish(self, total_calls: usize) -> AlignedSynthesis {
        let duration_seconds = self.timepoints.last().map(|p| p.seconds).unwrap_or(0.0);
        AlignedSynthesis {
            audio: self.audio,
            timepoints: self.timepoints,
            mark_to_token: self.mark_to_token,
            sync_mode: self.sync_mode,
            duration_seconds,
            chunk_count: self.chunk_count,
            total_calls,
        }
    }
}
