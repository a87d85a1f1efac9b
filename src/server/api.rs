use crate::error::AppError;
use crate::models::{AnalysisRequest, CanonicalAsset, FilterParams, SourceId};
use crate::server::{AppState, SharedAggregator};
use crate::services::orchestrator::SourceFailure;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::Parse(_) => StatusCode::BAD_REQUEST,
            AppError::NoDataAvailable | AppError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self);
        } else {
            warn!(status = status.as_u16(), "Request rejected: {}", self);
        }

        (
            status,
            Json(serde_json::json!({
                "status": "error",
                "message": self.to_string(),
                "timestamp": Utc::now().to_rfc3339(),
            })),
        )
            .into_response()
    }
}

/// Body of `GET /api/tokens`
#[derive(Debug, Serialize)]
pub struct TokenListResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub data: Vec<CanonicalAsset>,
    pub sources: Vec<SourceId>,
    pub failed_sources: Vec<SourceFailure>,
    pub fetch_time_ms: u64,
}

/// GET /health - liveness plus cache counters
#[instrument(skip(app_state))]
pub async fn health_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let analysis_cached = match &app_state.analysis {
        Some(service) => service.cached_items().await,
        None => 0,
    };

    let body = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_secs": app_state.started_at.elapsed().as_secs(),
        "sources": app_state.aggregator.sources(),
        "analysis_enabled": app_state.analysis.is_some(),
        "cache": {
            "snapshot": app_state.aggregator.cached_items().await,
            "market_stats": app_state.market.cached_items().await,
            "analysis": analysis_cached,
        },
    });

    (StatusCode::OK, Json(body))
}

/// GET /api/tokens - filtered, sorted, paginated asset list
///
/// Examples:
/// - /api/tokens
/// - /api/tokens?min_score=70&sort=market_cap
/// - /api/tokens?category=defi&grade=A&page=2&limit=20
/// - /api/tokens?search=sol
#[instrument(skip(aggregator))]
pub async fn list_tokens_handler(
    State(aggregator): State<SharedAggregator>,
    Query(params): Query<FilterParams>,
) -> Result<impl IntoResponse, AppError> {
    let (page, snapshot) = aggregator.list(&params).await?;

    info!(
        total = page.total,
        returned = page.data.len(),
        page = page.page,
        "Returning tokens"
    );

    Ok((
        StatusCode::OK,
        Json(TokenListResponse {
            status: "success",
            timestamp: Utc::now().to_rfc3339(),
            total: page.total,
            page: page.page,
            limit: page.limit,
            data: page.data,
            sources: snapshot.report.succeeded.clone(),
            failed_sources: snapshot.report.failed.clone(),
            fetch_time_ms: snapshot.report.elapsed_ms,
        }),
    ))
}

/// GET /api/tokens/{id} - one asset by id, symbol or name
#[instrument(skip(app_state))]
pub async fn get_token_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let asset = app_state.aggregator.find(&id).await?;
    debug!(symbol = %asset.symbol, score = asset.trust_score, "Token found");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "success",
            "timestamp": Utc::now().to_rfc3339(),
            "data": asset,
        })),
    ))
}

/// GET /api/market/stats - global market statistics
#[instrument(skip(app_state))]
pub async fn market_stats_handler(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.market.current().await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "success",
            "timestamp": Utc::now().to_rfc3339(),
            "data": stats,
        })),
    ))
}

/// POST /api/analyze - AI analysis of one asset, cached per symbol
#[instrument(skip_all)]
pub async fn analyze_handler(
    State(app_state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = app_state
        .analysis
        .as_ref()
        .ok_or_else(|| AppError::Config("AI analysis is not configured".to_string()))?;

    let (report, cached) = service.analyze(&request).await?;
    info!(symbol = %request.symbol, cached, "Returning analysis");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "success",
            "cached": cached,
            "analysis": report.analysis,
            "generated_at": report.generated_at,
        })),
    ))
}
