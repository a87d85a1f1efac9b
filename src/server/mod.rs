pub mod api;

use crate::error::{AppError, Result};
use crate::models::AppConfig;
use crate::services::{
    AnalysisService, AssetAggregator, GeminiClient, HttpClient, MarketStatsService,
};
use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub type SharedAggregator = Arc<AssetAggregator>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub aggregator: SharedAggregator,
    pub market: Arc<MarketStatsService>,
    /// `None` when no Gemini key is configured
    pub analysis: Option<Arc<AnalysisService>>,
    pub started_at: Instant,
}

impl FromRef<AppState> for SharedAggregator {
    fn from_ref(app_state: &AppState) -> SharedAggregator {
        app_state.aggregator.clone()
    }
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = HttpClient::new(config.http_timeout, config.http_max_retries)?;

        let analysis = GeminiClient::from_config(config, &client).map(|gemini| {
            Arc::new(AnalysisService::new(
                Arc::new(gemini),
                config.analysis_cache_duration,
            ))
        });
        if analysis.is_none() {
            info!("GEMINI_API_KEY not set, /api/analyze disabled");
        }

        Ok(Self {
            aggregator: Arc::new(AssetAggregator::from_config(config, &client)),
            market: Arc::new(MarketStatsService::new(
                client.clone(),
                &config.coingecko.base_url,
            )),
            analysis,
            started_at: Instant::now(),
        })
    }
}

pub fn router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health_handler))
        .route("/api/tokens", get(api::list_tokens_handler))
        .route("/api/tokens/{id}", get(api::get_token_handler))
        .route("/api/market/stats", get(api::market_stats_handler))
        .route("/api/analyze", post(api::analyze_handler))
        .layer(cors)
        .with_state(app_state)
}

/// Start the axum server
pub async fn serve(app_state: AppState, port: u16) -> Result<()> {
    info!("Registering routes:");
    info!("  GET  /health");
    info!("  GET  /api/tokens?min_score=70&grade=A&sort=score&page=1&limit=50");
    info!("  GET  /api/tokens/{{id}}");
    info!("  GET  /api/market/stats");
    info!("  POST /api/analyze");

    let app = router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Other(format!("server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
