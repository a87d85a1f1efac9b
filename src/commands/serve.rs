use crate::error::Result;
use crate::models::AppConfig;
use crate::server::{self, AppState};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run(config: AppConfig, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.port);
    println!("🚀 Starting alphaagent server on port {}", port);

    let app_state = AppState::from_config(&config)?;
    println!(
        "📡 Sources: {}",
        app_state
            .aggregator
            .sources()
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    // Warm the snapshot cache so the first request is fast
    let aggregator = Arc::clone(&app_state.aggregator);
    tokio::spawn(async move {
        match aggregator.refresh().await {
            Ok(snapshot) => info!(asset_count = snapshot.assets.len(), "Snapshot cache warmed"),
            Err(e) => warn!("Initial snapshot failed: {}", e),
        }
    });

    server::serve(app_state, port).await
}
