use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioStoreLimits {
    pub ttl: Duration,
    pub max_files: u64,
    pub max_bytes: u64,
}

impl Default for AudioStoreLimits {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(4 * 60 * 60),
            max_files: 120,
            max_bytes: 300 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAudio {
    pub audio_id: String,
    pub url: String,
    pub bytes_size: usize,
}

/// Temporary home for synthesized MP3s until the client fetches them.
///
/// Entries expire after `ttl`. Each entry weighs at least `max_bytes / max_files`,
/// so a single capacity bounds both the total size and the number of entries.
/// Once full, the least recently used entry goes first; a fresh save is never
/// the one dropped.
pub struct AudioStore {
    cache: Cache<String, Arc<Vec<u8>>>,
}

impl AudioStore {
    pub fn new(limits: AudioStoreLimits) -> Self {
        let min_weight = limits.max_bytes / limits.max_files.max(1);
        let cache = Cache::builder()
            .max_capacity(limits.max_bytes)
            .time_to_live(limits.ttl)
            .eviction_policy(EvictionPolicy::lru())
            .weigher(move |_id: &String, audio: &Arc<Vec<u8>>| {
                let weight = (audio.len() as u64).max(min_weight);
                u32::try_from(weight).unwrap_or(u32::MAX)
            })
            .build();

        Self { cache }
    }

    pub async fn save(&self, audio: Vec<u8>) -> StoredAudio {
        let audio_id = Uuid::new_v4().simple().to_string();
        let bytes_size = audio.len();
        self.cache.insert(audio_id.clone(), Arc::new(audio)).await;

        tracing::debug!(
            audio_id = %audio_id,
            bytes_size,
            entries = self.cache.entry_count(),
            "Stored synthesized audio"
        );

        StoredAudio {
            url: format!("/api/tts/audio/{}", audio_id),
            audio_id,
            bytes_size,
        }
    }

    pub async fn get(&self, audio_id: &str) -> Option<Arc<Vec<u8>>> {
        self.cache.get(audio_id).await
    }

    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}
