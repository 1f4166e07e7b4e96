use speakcanto_backend::controllers::tts::TtsController;
use speakcanto_backend::domain::shared::SystemClock;
use speakcanto_backend::domain::tts::TtsService;
use speakcanto_backend::infrastructure::config::{Config, LogFormat};
use speakcanto_backend::infrastructure::http::{build_router, start_http_server};
use speakcanto_backend::infrastructure::repositories::{
    AudioStore, AudioStoreLimits, JyutpingTable, PollySettings, PollyTtsRepository,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting SpeakCanto Backend on {}:{}",
        config.host,
        config.port
    );

    // Create AWS Polly client
    tracing::info!("Initializing AWS Polly client with region: {}", config.aws_region);

    let has_access_key = std::env::var("AWS_ACCESS_KEY_ID").is_ok();
    let has_secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").is_ok();
    tracing::info!(
        has_access_key_id = has_access_key,
        has_secret_access_key = has_secret_key,
        "AWS credentials environment check"
    );

    if !has_access_key || !has_secret_key {
        tracing::warn!("AWS credentials not found in environment variables. Will attempt to use other credential providers (instance metadata, etc.)");
    }

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .load()
        .await;

    tracing::info!(
        region = ?aws_config.region(),
        "AWS configuration loaded"
    );

    let polly_client = Arc::new(aws_sdk_polly::Client::new(&aws_config));
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories
    tracing::info!("Instantiating repositories...");
    let tts_repo = Arc::new(PollyTtsRepository::new(
        polly_client,
        PollySettings {
            language_code: config.polly_language_code.clone(),
            timeout: Duration::from_secs(config.tts_timeout_seconds),
            catalog_ttl: chrono::Duration::seconds(config.voice_catalog_ttl_seconds),
        },
        Arc::new(SystemClock),
    ));
    let readings = Arc::new(JyutpingTable::load_or_empty(config.jyutping_table_path.as_deref()));
    let audio_store = Arc::new(AudioStore::new(AudioStoreLimits {
        ttl: Duration::from_secs(config.temp_audio_ttl_hours * 60 * 60),
        max_files: config.max_temp_audio_files,
        max_bytes: config.max_temp_audio_bytes,
    }));

    // 2. Instantiate services
    tracing::info!("Instantiating services...");
    let tts_service = Arc::new(TtsService::new(tts_repo, readings, config.synthesis_settings()));

    // 3. Instantiate controllers
    tracing::info!("Instantiating controllers...");
    let tts_controller = Arc::new(TtsController::new(tts_service.clone(), audio_store));

    // Start HTTP server with all routes
    let app = build_router(tts_service, tts_controller);
    start_http_server(config, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.default_log_filter().into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
