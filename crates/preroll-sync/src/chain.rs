use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use preroll_core::config::MediaServerConfig;
use preroll_core::{AssetRef, SyncAttemptResult};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::MediaServerClient;
use crate::error::{Result, SyncError};
use crate::strategies::{
    LibrarySectionStrategy, PoolForm, PreferenceStrategy, UploadReferenceStrategy,
    GLOBAL_PREFERENCE_KEYS, URL_PREFERENCE_KEYS,
};
use crate::strategy::{StrategyOutcome, SyncPayload, SyncStrategy};

/// Strategy name used for failures the chain reports on its own behalf.
pub const CHAIN_NAME: &str = "chain";

/// Ranks a failure by how much it tells the operator.
///
/// Auth rejections are the most actionable, then any HTTP answer, then a
/// non-empty message. Transport errors with no status rank lowest.
pub fn informativeness(http_status: Option<u16>, message: &str) -> u8 {
    let mut score = 0;
    if matches!(http_status, Some(401) | Some(403)) {
        score += 4;
    }
    if http_status.is_some() {
        score += 2;
    }
    if !message.trim().is_empty() {
        score += 1;
    }
    score
}

/// Everything one `apply` call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// The winning attempt, or the most informative failure.
    pub result: SyncAttemptResult,
    /// Every non-skipped attempt, in order.
    pub attempts: Vec<SyncAttemptResult>,
}

impl SyncReport {
    pub fn succeeded(&self) -> bool {
        self.result.succeeded
    }

    fn not_attempted(message: impl Into<String>) -> Self {
        Self {
            result: SyncAttemptResult::failure(CHAIN_NAME, None, message),
            attempts: Vec::new(),
        }
    }
}

/// Pushes an asset pool to the remote server.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    async fn apply(&self, assets: &[AssetRef]) -> SyncReport;
}

/// Ordered list of strategies tried until one succeeds.
///
/// Strategies run one at a time, each bounded by `strategy_timeout`. A
/// strategy that reports `Skipped` is neither an attempt nor a failure.
pub struct SyncStrategyChain {
    strategies: Vec<Box<dyn SyncStrategy>>,
    strategy_timeout: Duration,
    disabled_reason: Option<String>,
}

impl SyncStrategyChain {
    pub fn new(strategies: Vec<Box<dyn SyncStrategy>>, strategy_timeout: Duration) -> Self {
        Self {
            strategies,
            strategy_timeout,
            disabled_reason: None,
        }
    }

    /// The six request shapes known to work against real servers, in the
    /// order they are tried.
    pub fn standard(config: &MediaServerConfig, public_url: Option<String>) -> Result<Self> {
        let client = Arc::new(MediaServerClient::new(config)?);
        let configured = client.is_configured();

        let strategies: Vec<Box<dyn SyncStrategy>> = vec![
            Box::new(PreferenceStrategy::new(
                "cinema-trailers-preroll-id",
                client.clone(),
                &["CinemaTrailersPrerollID"],
                PoolForm::Paths,
            )),
            Box::new(PreferenceStrategy::new(
                "preroll-id",
                client.clone(),
                &["PrerollID"],
                PoolForm::Paths,
            )),
            Box::new(LibrarySectionStrategy::new(client.clone())),
            Box::new(PreferenceStrategy::new(
                "global-preference",
                client.clone(),
                GLOBAL_PREFERENCE_KEYS,
                PoolForm::Paths,
            )),
            Box::new(PreferenceStrategy::new(
                "asset-urls",
                client.clone(),
                URL_PREFERENCE_KEYS,
                PoolForm::Urls { public_url },
            )),
            Box::new(UploadReferenceStrategy::new(client)),
        ];

        let mut chain = Self::new(
            strategies,
            Duration::from_secs(config.strategy_timeout_secs.max(1)),
        );
        if !configured {
            chain.disabled_reason = Some("media server token not configured".to_string());
        }
        Ok(chain)
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn apply(&self, assets: &[AssetRef]) -> SyncReport {
        if let Some(reason) = &self.disabled_reason {
            debug!(reason = %reason, "remote sync disabled");
            return SyncReport::not_attempted(reason.clone());
        }
        if assets.is_empty() {
            return SyncReport::not_attempted("no assets to sync");
        }

        let payload = SyncPayload::new(assets);
        let mut attempts = Vec::new();

        for strategy in &self.strategies {
            let name = strategy.name();
            debug!(strategy = %name, assets = assets.len(), "trying sync strategy");

            let outcome =
                match tokio::time::timeout(self.strategy_timeout, strategy.attempt(&payload)).await
                {
                    Ok(outcome) => outcome,
                    Err(_) => StrategyOutcome::failed(&SyncError::Timeout {
                        secs: self.strategy_timeout.as_secs(),
                    }),
                };

            match outcome {
                StrategyOutcome::Succeeded {
                    http_status,
                    detail,
                } => {
                    info!(strategy = %name, status = ?http_status, "remote sync succeeded");
                    let result = SyncAttemptResult::success(name, http_status, detail);
                    attempts.push(result.clone());
                    return SyncReport { result, attempts };
                }
                StrategyOutcome::Failed {
                    http_status,
                    message,
                } => {
                    warn!(strategy = %name, status = ?http_status, err = %message, "sync strategy failed");
                    attempts.push(SyncAttemptResult::failure(name, http_status, message));
                }
                StrategyOutcome::Skipped { reason } => {
                    debug!(strategy = %name, reason = %reason, "sync strategy skipped");
                }
            }
        }

        match most_informative(&attempts) {
            Some(best) => {
                warn!(
                    strategy = %best.strategy_name,
                    attempts = attempts.len(),
                    "all sync strategies failed"
                );
                SyncReport {
                    result: best.clone(),
                    attempts,
                }
            }
            None => SyncReport::not_attempted("every sync strategy was skipped"),
        }
    }
}

#[async_trait]
impl RemoteSync for SyncStrategyChain {
    async fn apply(&self, assets: &[AssetRef]) -> SyncReport {
        SyncStrategyChain::apply(self, assets).await
    }
}

/// Highest-scoring failure; the earliest one wins ties.
fn most_informative(attempts: &[SyncAttemptResult]) -> Option<&SyncAttemptResult> {
    let mut best: Option<(u8, &SyncAttemptResult)> = None;
    for attempt in attempts.iter().filter(|a| !a.succeeded) {
        let score = informativeness(attempt.http_status, &attempt.message);
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, attempt));
        }
    }
    best.map(|(_, a)| a)
}
