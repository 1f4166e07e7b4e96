use crate::error::AppError;
use crate::infrastructure::repositories::TtsBackendError;

#[derive(Debug, thiserror::Error)]
pub enum TtsServiceError {
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("unsupported voice: {0}")]
    UnsupportedVoice(String),
    #[error("input exceeds max length ({max_chars})")]
    InputTooLong { max_chars: usize },
    #[error("chunk of {size} bytes exceeds hard limit of {hard_max_bytes} bytes")]
    Chunking { size: usize, hard_max_bytes: usize },
    #[error("timepoints remained degraded in reduced mode (chunk {chunk_index}: {returned}/{expected} markers)")]
    DegradedAlignment {
        chunk_index: usize,
        returned: usize,
        expected: usize,
    },
    #[error("split depth budget exhausted at depth {depth} after {calls} calls")]
    SplitDepthExhausted { depth: usize, calls: usize },
    #[error("TTS call budget exhausted after {calls} calls")]
    CallBudgetExhausted { calls: usize },
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl From<TtsBackendError> for TtsServiceError {
    fn from(err: TtsBackendError) -> Self {
        match err {
            TtsBackendError::UnsupportedVoice(msg) => TtsServiceError::UnsupportedVoice(msg),
            other => TtsServiceError::Dependency(other.to_string()),
        }
    }
}

impl From<TtsServiceError> for AppError {
    fn from(err: TtsServiceError) -> Self {
        match err {
            TtsServiceError::Invalid(msg) => AppError::BadRequest(msg),
            TtsServiceError::UnsupportedVoice(_) => {
                AppError::BadRequest("Unsupported voice_name".to_string())
            }
            TtsServiceError::InputTooLong { max_chars } => {
                AppError::PayloadTooLarge(format!("Input exceeds max length ({}).", max_chars))
            }
            TtsServiceError::Chunking { .. } => AppError::PayloadTooLarge(
                "Input cannot be chunked within SSML limits.".to_string(),
            ),
            e @ (TtsServiceError::SplitDepthExhausted { .. }
            | TtsServiceError::CallBudgetExhausted { .. }) => {
                AppError::Unprocessable(e.to_string())
            }
            e @ (TtsServiceError::DegradedAlignment { .. } | TtsServiceError::Dependency(_)) => {
                AppError::ExternalService(format!("TTS synthesis failed: {}", e))
            }
        }
    }
}
