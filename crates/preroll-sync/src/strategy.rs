use async_trait::async_trait;
use preroll_core::AssetRef;

use crate::error::SyncError;

/// Separator between entries of a pool handed to the media server.
pub const POOL_SEPARATOR: &str = ";";

/// What one strategy did with the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Succeeded {
        http_status: Option<u16>,
        detail: String,
    },
    Failed {
        http_status: Option<u16>,
        message: String,
    },
    /// Prerequisite missing (no movie section, no public URL...). Not a failure.
    Skipped { reason: String },
}

impl StrategyOutcome {
    pub fn failed(err: &SyncError) -> Self {
        let message = match err {
            SyncError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        };
        StrategyOutcome::Failed {
            http_status: err.http_status(),
            message,
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        StrategyOutcome::Skipped {
            reason: reason.into(),
        }
    }
}

/// The asset list one activation wants pushed, plus its encodings.
#[derive(Debug, Clone)]
pub struct SyncPayload {
    assets: Vec<AssetRef>,
    path_pool: String,
}

impl SyncPayload {
    pub fn new(assets: &[AssetRef]) -> Self {
        let path_pool = assets
            .iter()
            .map(|a| a.absolute_path.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(POOL_SEPARATOR);
        Self {
            assets: assets.to_vec(),
            path_pool,
        }
    }

    pub fn assets(&self) -> &[AssetRef] {
        &self.assets
    }

    pub fn first(&self) -> Option<&AssetRef> {
        self.assets.first()
    }

    /// Absolute paths joined with `;`.
    pub fn path_pool(&self) -> &str {
        &self.path_pool
    }

    /// Category the assets belong to, i.e. the name of their parent directory.
    pub fn category(&self) -> Option<String> {
        self.assets
            .first()?
            .absolute_path
            .parent()?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// `{base}/files/{category}/{file}` for every asset, joined with `;`.
    pub fn url_pool(&self, public_url: &str) -> Option<String> {
        let category = self.category()?;
        let base = public_url.trim_end_matches('/');
        let urls = self
            .assets
            .iter()
            .map(|a| {
                format!(
                    "{}/files/{}/{}",
                    base,
                    urlencoding::encode(&category),
                    urlencoding::encode(&a.file_name)
                )
            })
            .collect::<Vec<_>>();
        Some(urls.join(POOL_SEPARATOR))
    }
}

/// One candidate request shape for telling the server which prerolls to use.
///
/// Implementations must not depend on side effects of other strategies; the
/// chain may run any of them first.
#[async_trait]
pub trait SyncStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn attempt(&self, payload: &SyncPayload) -> StrategyOutcome;
}
