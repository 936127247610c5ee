use anyhow::{Context, Result};
use clap::Parser;
use snowbrain_voice::audio::gate_for_mode;
use snowbrain_voice::{create_router, AppState, Config, NatsEngineConnector, RestSessionHistory, StaticIdentity};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "snowbrain-voice", about = "Voice tutoring session daemon")]
struct Args {
    /// Config file path (extension optional)
    #[arg(long, default_value = "config/snowbrain")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("SnowBrain voice v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let identity = Arc::new(StaticIdentity::from_config(&cfg.identity));
    if cfg.identity.user_id.is_none() {
        info!("No identity.user_id configured; session history writes will be rejected");
    }

    let history = Arc::new(RestSessionHistory::new(
        &cfg.store.url,
        &cfg.store.table,
        cfg.store.api_key.clone(),
        identity.clone(),
    ));

    let engines = Arc::new(NatsEngineConnector::connect(&cfg.engine.nats_url).await?);
    let permission = gate_for_mode(cfg.permission.mode);

    let state = AppState::new(engines, permission, history, identity)
        .with_history_separator(cfg.history.separator.clone());

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
