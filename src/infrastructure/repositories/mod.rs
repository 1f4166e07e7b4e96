pub mod audio_store;
pub mod jyutping_table;
pub mod polly_tts_repository;
pub mod tts_repository;
pub mod voice_catalog_cache;

pub use audio_store::{AudioStore, AudioStoreLimits, StoredAudio};
pub use jyutping_table::JyutpingTable;
pub use polly_tts_repository::{PollySettings, PollyTtsRepository};
pub use tts_repository::{MarkupSpeech, TtsBackendError, TtsRepository};
pub use voice_catalog_cache::CatalogCache;
