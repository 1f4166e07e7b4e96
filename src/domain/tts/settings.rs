use super::aligned::MarkerRecovery;
use super::chunker::ChunkLimits;
use super::plain::SplitBudget;

/// Knobs of the synthesis pipeline, resolved from configuration.
#[derive(Debug, Clone)]
pub struct SynthesisSettings {
    pub max_input_chars: usize,
    pub markup_limits: ChunkLimits,
    pub text_limits: ChunkLimits,
    pub split_budget: SplitBudget,
    pub marker_recovery: MarkerRecovery,
    pub result_cache_enabled: bool,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            max_input_chars: 12000,
            markup_limits: ChunkLimits::MARKUP,
            text_limits: ChunkLimits::PLAIN_TEXT,
            split_budget: SplitBudget::default(),
            marker_recovery: MarkerRecovery::default(),
            result_cache_enabled: false,
        }
    }
}
