use crate::domain::tts::{ChunkLimits, MarkerRecovery, SplitBudget, SynthesisSettings};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // AWS Polly
    pub aws_region: String,
    pub polly_language_code: String,
    pub tts_timeout_seconds: u64,
    pub voice_catalog_ttl_seconds: i64,
    // Synthesis limits
    pub max_input_chars: usize,
    pub ssml_target_max_bytes: usize,
    pub ssml_hard_max_bytes: usize,
    pub hq_text_target_max_bytes: usize,
    pub hq_text_hard_max_bytes: usize,
    pub hq_max_split_depth: usize,
    pub hq_max_tts_calls: usize,
    pub min_marker_recovery: f64,
    // Temporary audio
    pub temp_audio_ttl_hours: u64,
    pub max_temp_audio_files: u64,
    pub max_temp_audio_bytes: u64,
    // Readings
    pub jyutping_table_path: Option<String>,
    // TTS Cache
    pub tts_cache_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::Development,
            log_format: LogFormat::Pretty,
            aws_region: "ap-east-1".to_string(),
            polly_language_code: "yue-CN".to_string(),
            tts_timeout_seconds: 20,
            voice_catalog_ttl_seconds: 3600,
            max_input_chars: 12000,
            ssml_target_max_bytes: ChunkLimits::MARKUP.target_max_bytes,
            ssml_hard_max_bytes: ChunkLimits::MARKUP.hard_max_bytes,
            hq_text_target_max_bytes: ChunkLimits::PLAIN_TEXT.target_max_bytes,
            hq_text_hard_max_bytes: ChunkLimits::PLAIN_TEXT.hard_max_bytes,
            hq_max_split_depth: 8,
            hq_max_tts_calls: 128,
            min_marker_recovery: 0.6,
            temp_audio_ttl_hours: 4,
            max_temp_audio_files: 120,
            max_temp_audio_bytes: 300 * 1024 * 1024,
            jyutping_table_path: None,
            tts_cache_enabled: false,
        }
    }
}

/// Read `key`, falling back to `default` when unset.
fn var_or<T>(key: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::error::Error + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("invalid value for {}: {}", key, e).into()),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let config = Config {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: var_or("PORT", defaults.port)?,
            environment: match env::var("ENVIRONMENT").as_deref() {
                Ok("production") => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            aws_region: env::var("AWS_REGION").unwrap_or(defaults.aws_region),
            polly_language_code: env::var("POLLY_LANGUAGE_CODE")
                .unwrap_or(defaults.polly_language_code),
            tts_timeout_seconds: var_or("TTS_TIMEOUT_SECONDS", defaults.tts_timeout_seconds)?,
            voice_catalog_ttl_seconds: var_or(
                "VOICE_CATALOG_TTL_SECONDS",
                defaults.voice_catalog_ttl_seconds,
            )?,
            max_input_chars: var_or("MAX_INPUT_CHARS", defaults.max_input_chars)?,
            ssml_target_max_bytes: var_or("SSML_TARGET_MAX_BYTES", defaults.ssml_target_max_bytes)?,
            ssml_hard_max_bytes: var_or("SSML_HARD_MAX_BYTES", defaults.ssml_hard_max_bytes)?,
            hq_text_target_max_bytes: var_or(
                "HQ_TEXT_TARGET_MAX_BYTES",
                defaults.hq_text_target_max_bytes,
            )?,
            hq_text_hard_max_bytes: var_or(
                "HQ_TEXT_HARD_MAX_BYTES",
                defaults.hq_text_hard_max_bytes,
            )?,
            hq_max_split_depth: var_or("HQ_MAX_SPLIT_DEPTH", defaults.hq_max_split_depth)?,
            hq_max_tts_calls: var_or("HQ_MAX_TTS_CALLS", defaults.hq_max_tts_calls)?,
            min_marker_recovery: var_or("MIN_MARKER_RECOVERY", defaults.min_marker_recovery)?,
            temp_audio_ttl_hours: var_or("TEMP_AUDIO_TTL_HOURS", defaults.temp_audio_ttl_hours)?,
            max_temp_audio_files: var_or("MAX_TEMP_AUDIO_FILES", defaults.max_temp_audio_files)?,
            max_temp_audio_bytes: var_or("MAX_TEMP_AUDIO_BYTES", defaults.max_temp_audio_bytes)?,
            jyutping_table_path: env::var("JYUTPING_TABLE_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            tts_cache_enabled: env::var("TTS_CACHE_ENABLED")
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject limit combinations the pipelines cannot honor.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.ssml_target_max_bytes > self.ssml_hard_max_bytes {
            return Err("SSML_TARGET_MAX_BYTES must not exceed SSML_HARD_MAX_BYTES".into());
        }
        if self.hq_text_target_max_bytes > self.hq_text_hard_max_bytes {
            return Err("HQ_TEXT_TARGET_MAX_BYTES must not exceed HQ_TEXT_HARD_MAX_BYTES".into());
        }
        if !(0.0..=1.0).contains(&self.min_marker_recovery) {
            return Err("MIN_MARKER_RECOVERY must be between 0 and 1".into());
        }
        if self.hq_max_tts_calls == 0 {
            return Err("HQ_MAX_TTS_CALLS must be at least 1".into());
        }
        Ok(())
    }

    pub fn synthesis_settings(&self) -> SynthesisSettings {
        SynthesisSettings {
            max_input_chars: self.max_input_chars,
            markup_limits: ChunkLimits {
                target_max_bytes: self.ssml_target_max_bytes,
                hard_max_bytes: self.ssml_hard_max_bytes,
            },
            text_limits: ChunkLimits {
                target_max_bytes: self.hq_text_target_max_bytes,
                hard_max_bytes: self.hq_text_hard_max_bytes,
            },
            split_budget: SplitBudget {
                max_split_depth: self.hq_max_split_depth,
                max_tts_calls: self.hq_max_tts_calls,
            },
            marker_recovery: MarkerRecovery::new(self.min_marker_recovery),
            result_cache_enabled: self.tts_cache_enabled,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Log filter used when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.is_development() {
            "speakcanto_backend=debug,tower_http=debug"
        } else {
            "speakcanto_backend=info,tower_http=info"
        }
    }
}
