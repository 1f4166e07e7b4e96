pub mod aligned;
pub mod chunker;
pub mod dto;
pub mod error;
pub mod markup;
pub mod plain;
pub mod script;
pub mod segment;
pub mod service;
pub mod settings;
pub mod timeline;
pub mod token;
pub mod voice;


pub use aligned::MarkerRecovery;
pub use chunker::ChunkLimits;
pub use dto::{SyncMode, TtsRequest, TtsResponse, TtsSynthesisResult};
pub use error::TtsServiceError;
pub use markup::FidelityMode;
pub use plain::SplitBudget;
pub use service::{TtsService, TtsServiceApi};
pub use settings::SynthesisSettings;
pub use timeline::Timepoint;
pub use token::{ReadingLookup, Token};
pub use voice::{VoiceCatalog, VoiceEntry, VoiceTier};
