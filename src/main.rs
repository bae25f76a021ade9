use std::sync::Arc;

use genai_gateway::config::AppConfig;
use genai_gateway::AppState;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Configuration - uploads: {}, Gemini model: {}, Veo3 API: {}, poll every {}s up to {} attempts",
        config.uploads_dir.display(),
        config.gemini_model,
        config.veo3_base_url,
        config.video_job.poll_interval.as_secs(),
        config.video_job.max_poll_attempts
    );

    let state = Arc::new(AppState::from_config(config));

    // Uploads directory must exist and start empty
    if let Err(e) = state.artifact_store.ensure_dir().await {
        tracing::error!("Error creating uploads directory: {}", e);
    } else {
        let removed = state.artifact_store.sweep_all().await;
        tracing::info!("Uploads directory ready ({} stale file(s) removed)", removed);
    }
    let _sweeper = state
        .artifact_store
        .spawn_sweeper(state.config.cleanup_interval);

    let app = genai_gateway::app(state.clone());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Server is running on port {}", state.config.port);

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,genai_gateway=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,genai_gateway=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    // JSON output for log aggregation, human-readable otherwise
    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!("🎬 genai_gateway starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );
    tracing::info!("Log level: {}", log_level);

    Ok(())
}
