//! Fetch Orchestrator
//!
//! Runs every registered source fetcher concurrently, one task per source,
//! and fans results in over a bounded channel. A failing, empty or slow
//! source is logged and left out of the result set. The cycle only fails
//! when no source returned data.
//!
//! Cancellation and the cycle deadline are carried by [`FetchContext`]. When
//! either fires, in-flight workers are aborted and whatever already arrived
//! is returned.

use crate::constants::FETCH_CHANNEL_CAPACITY;
use crate::error::{AppError, Result};
use crate::models::{SourceId, SourcePayload, SourceResults};
use crate::services::sources::SharedFetcher;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// Request-scoped deadline and cancellation signal shared by all workers
#[derive(Debug, Clone)]
pub struct FetchContext {
    deadline: Instant,
    cancel: watch::Receiver<bool>,
}

/// Cancels every worker holding the paired [`FetchContext`]
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl FetchContext {
    /// New context expiring after `timeout`, plus its cancel handle
    pub fn new(timeout: Duration) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            deadline: Instant::now() + timeout,
            cancel: rx,
        };
        (ctx, CancelHandle { tx: Arc::new(tx) })
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolves once cancellation is requested. Never resolves if the
    /// handle was dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: SourceId,
    pub reason: String,
}

/// Per-cycle summary of which sources contributed
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchReport {
    pub succeeded: Vec<SourceId>,
    pub failed: Vec<SourceFailure>,
    pub elapsed_ms: u64,
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub payloads: SourceResults,
    pub report: FetchReport,
}

pub struct FetchOrchestrator {
    fetchers: Vec<SharedFetcher>,
}

impl FetchOrchestrator {
    pub fn new(fetchers: Vec<SharedFetcher>) -> Self {
        Self { fetchers }
    }

    pub fn sources(&self) -> Vec<SourceId> {
        self.fetchers.iter().map(|f| f.source()).collect()
    }

    /// Fetch from every source concurrently
    ///
    /// # Returns
    /// * `Ok(FetchOutcome)` - At least one source returned a non-empty payload
    /// * `Err(AppError::NoDataAvailable)` - Every source failed, timed out or was cancelled
    pub async fn fetch_all(&self, ctx: &FetchContext) -> Result<FetchOutcome> {
        let started = std::time::Instant::now();
        let capacity = FETCH_CHANNEL_CAPACITY.max(self.fetchers.len()).max(1);
        let (tx, mut rx) = mpsc::channel::<(SourceId, Result<SourcePayload>)>(capacity);
        let mut workers = JoinSet::new();

        for fetcher in &self.fetchers {
            let fetcher = Arc::clone(fetcher);
            let tx = tx.clone();
            let ctx = ctx.clone();

            workers.spawn(async move {
                let source = fetcher.source();
                let result = tokio::select! {
                    result = fetcher.fetch(&ctx) => result,
                    _ = ctx.cancelled() => Err(AppError::SourceUnavailable {
                        provider: source,
                        reason: "cancelled".to_string(),
                    }),
                    _ = sleep_until(ctx.deadline()) => Err(AppError::SourceUnavailable {
                        provider: source,
                        reason: "timed out".to_string(),
                    }),
                };
                let _ = tx.send((source, result)).await;
            });
        }
        drop(tx);

        let mut payloads = SourceResults::new();
        let mut report = FetchReport::default();

        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some((source, result)) => Self::collect(source, result, &mut payloads, &mut report),
                    None => break,
                },
                _ = ctx.cancelled() => {
                    warn!("Fetch cycle cancelled with {} source(s) collected", payloads.len());
                    break;
                }
                _ = sleep_until(ctx.deadline()) => {
                    warn!("Fetch cycle deadline reached with {} source(s) collected", payloads.len());
                    break;
                }
            }
        }

        // Abandon anything still in flight
        workers.abort_all();

        for source in self.sources() {
            let reported = report.succeeded.contains(&source)
                || report.failed.iter().any(|f| f.source == source);
            if !reported {
                report.failed.push(SourceFailure {
                    source,
                    reason: "abandoned".to_string(),
                });
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;

        if payloads.is_empty() {
            warn!(
                failed = report.failed.len(),
                "Every source failed in this fetch cycle"
            );
            return Err(AppError::NoDataAvailable);
        }

        info!(
            sources = payloads.len(),
            failed = report.failed.len(),
            elapsed_ms = report.elapsed_ms,
            "Fetch cycle completed"
        );

        Ok(FetchOutcome { payloads, report })
    }

    fn collect(
        source: SourceId,
        result: Result<SourcePayload>,
        payloads: &mut SourceResults,
        report: &mut FetchReport,
    ) {
        match result {
            Ok(payload) if payload.is_empty() => {
                warn!(source = %source, "Source returned no data");
                report.failed.push(SourceFailure {
                    source,
                    reason: "empty payload".to_string(),
                });
            }
            Ok(payload) => {
                debug!(source = %source, records = payload.len(), "Source fetched");
                report.succeeded.push(source);
                payloads.insert(source, payload);
            }
            Err(e) => {
                if e.is_source_failure() {
                    warn!(source = %source, "Source failed: {}", e);
                } else {
                    error!(source = %source, "Source failed unexpectedly: {}", e);
                }
                report.failed.push(SourceFailure {
                    source,
                    reason: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payloads::{CoinGeckoMarket, DefiLlamaProtocol};
    use crate::services::sources::SourceFetcher;
    use async_trait::async_trait;

    struct StaticFetcher {
        source: SourceId,
        payload: Option<SourcePayload>,
        delay: Duration,
    }

    #[async_trait]
    impl SourceFetcher for StaticFetcher {
        fn source(&self) -> SourceId {
            self.source
        }

        async fn fetch(&self, _ctx: &FetchContext) -> Result<SourcePayload> {
            tokio::time::sleep(self.delay).await;
            self.payload.clone().ok_or(AppError::SourceUnavailable {
                provider: self.source,
                reason: "boom".to_string(),
            })
        }
    }

    fn gecko() -> SourcePayload {
        SourcePayload::CoinGecko(vec![CoinGeckoMarket {
            id: "bitcoin".into(),
            symbol: "btc".into(),
            name: "Bitcoin".into(),
            ..Default::default()
        }])
    }

    fn fetcher(source: SourceId, payload: Option<SourcePayload>, delay_ms: u64) -> SharedFetcher {
        Arc::new(StaticFetcher {
            source,
            payload,
            delay: Duration::from_millis(delay_ms),
        })
    }

    #[tokio::test]
    async fn test_partial_failure_tolerated() {
        let orchestrator = FetchOrchestrator::new(vec![
            fetcher(SourceId::CoinGecko, Some(gecko()), 0),
            fetcher(SourceId::CoinMarketCap, None, 0),
            fetcher(SourceId::DefiLlama, Some(SourcePayload::DefiLlama(Vec::new())), 0),
        ]);
        let (ctx, _handle) = FetchContext::new(Duration::from_secs(5));

        let outcome = orchestrator.fetch_all(&ctx).await.unwrap();
        assert_eq!(outcome.payloads.len(), 1);
        assert!(outcome.payloads.contains_key(&SourceId::CoinGecko));
        assert_eq!(outcome.report.succeeded, vec![SourceId::CoinGecko]);
        assert_eq!(outcome.report.failed.len(), 2);
    }

    struct MalformedFetcher;

    #[async_trait]
    impl SourceFetcher for MalformedFetcher {
        fn source(&self) -> SourceId {
            SourceId::Messari
        }

        async fn fetch(&self, _ctx: &FetchContext) -> Result<SourcePayload> {
            Err(AppError::MalformedPayload {
                provider: SourceId::Messari,
                reason: "expected value at line 1 column 1".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_malformed_source_tolerated_like_unavailable() {
        let malformed: SharedFetcher = Arc::new(MalformedFetcher);
        let orchestrator = FetchOrchestrator::new(vec![
            Arc::clone(&malformed),
            fetcher(SourceId::CoinGecko, Some(gecko()), 0),
        ]);
        let (ctx, _handle) = FetchContext::new(Duration::from_secs(5));

        let outcome = orchestrator.fetch_all(&ctx).await.unwrap();
        assert_eq!(outcome.report.succeeded, vec![SourceId::CoinGecko]);
        assert!(!outcome.payloads.contains_key(&SourceId::Messari));
        let failure = &outcome.report.failed[0];
        assert_eq!(failure.source, SourceId::Messari);
        assert!(failure.reason.contains("Malformed payload"));

        // Alone, a malformed source is just another failed source
        let alone = FetchOrchestrator::new(vec![malformed]);
        assert!(matches!(
            alone.fetch_all(&ctx).await,
            Err(AppError::NoDataAvailable)
        ));
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_no_data() {
        let orchestrator = FetchOrchestrator::new(vec![
            fetcher(SourceId::CoinGecko, None, 0),
            fetcher(SourceId::Messari, None, 0),
        ]);
        let (ctx, _handle) = FetchContext::new(Duration::from_secs(5));

        let err = orchestrator.fetch_all(&ctx).await.unwrap_err();
        assert!(matches!(err, AppError::NoDataAvailable));
    }

    #[tokio::test]
    async fn test_no_fetchers_is_no_data() {
        let orchestrator = FetchOrchestrator::new(Vec::new());
        let (ctx, _handle) = FetchContext::new(Duration::from_secs(1));
        assert!(matches!(
            orchestrator.fetch_all(&ctx).await,
            Err(AppError::NoDataAvailable)
        ));
    }

    #[tokio::test]
    async fn test_deadline_returns_partial_results() {
        let protocols = SourcePayload::DefiLlama(vec![DefiLlamaProtocol {
            name: "Uniswap".into(),
            symbol: "UNI".into(),
            tvl: Some(1.0),
            ..Default::default()
        }]);
        let orchestrator = FetchOrchestrator::new(vec![
            fetcher(SourceId::DefiLlama, Some(protocols), 0),
            fetcher(SourceId::CoinGecko, Some(gecko()), 10_000),
        ]);
        let (ctx, _handle) = FetchContext::new(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let outcome = orchestrator.fetch_all(&ctx).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(outcome.report.succeeded, vec![SourceId::DefiLlama]);
        assert!(outcome
            .report
            .failed
            .iter()
            .any(|f| f.source == SourceId::CoinGecko));
    }

    #[tokio::test]
    async fn test_cancellation_with_nothing_collected() {
        let orchestrator =
            FetchOrchestrator::new(vec![fetcher(SourceId::CoinGecko, Some(gecko()), 10_000)]);
        let (ctx, handle) = FetchContext::new(Duration::from_secs(30));

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.cancel();
        });

        let err = orchestrator.fetch_all(&ctx).await.unwrap_err();
        assert!(matches!(err, AppError::NoDataAvailable));
        assert!(ctx.is_cancelled());
    }
}
