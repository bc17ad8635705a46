use anyhow::Context;
use rep_counter::api::create_routes;
use rep_counter::config::AppConfig;
use rep_counter::services::{
    AlertDispatcher, ReplayBackend, SessionManager, SoundAssets, TracingAudioPlayer,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!(
        environment = %config.environment,
        camera = config.pose.camera_index,
        cooldown_secs = config.alerts.cooldown_secs,
        "Configuration loaded"
    );

    let assets = SoundAssets::discover(&config.alerts.audio_dir);
    let player = Arc::new(TracingAudioPlayer::new(assets));
    let (alerts, dispatcher) = AlertDispatcher::spawn(player, config.alerts.queue_capacity);

    let backend = ReplayBackend::from_config(&config.replay)?;
    if !backend.has_recording() {
        warn!("REPLAY_PATH not set; starting an exercise will fail to open the camera");
    }

    let config = Arc::new(config);
    let sessions = Arc::new(SessionManager::new(
        config.clone(),
        Arc::new(backend),
        alerts,
    ));

    // Create the application routes
    let app = create_routes(sessions.clone());

    // Start the server
    let address = config.server_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!("Exercise detection server starting on http://{}", address);
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(exit) = sessions.shutdown().await {
        info!("Active session ended on shutdown: {:?}", exit);
    }
    dispatcher.abort();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
