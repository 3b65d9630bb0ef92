use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One eligible video file inside a category directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub absolute_path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Category directory with its count of eligible files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub file_count: usize,
}

/// Outcome of one strategy attempt against the remote control API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAttemptResult {
    pub strategy_name: String,
    pub succeeded: bool,
    pub http_status: Option<u16>,
    pub message: String,
}

impl SyncAttemptResult {
    pub fn success(
        strategy: impl Into<String>,
        http_status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            strategy_name: strategy.into(),
            succeeded: true,
            http_status,
            message: message.into(),
        }
    }

    pub fn failure(
        strategy: impl Into<String>,
        http_status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            strategy_name: strategy.into(),
            succeeded: false,
            http_status,
            message: message.into(),
        }
    }
}

/// Whether an activation reached the remote server as well as the local pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationStatus {
    /// Local pointer updated and a remote strategy succeeded.
    Activated,
    /// Local pointer updated, every remote strategy failed.
    LocalOnly,
}

impl std::fmt::Display for ActivationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivationStatus::Activated => write!(f, "activated"),
            ActivationStatus::LocalOnly => write!(f, "local_only"),
        }
    }
}

/// Composite result of `activate`. Local and remote halves are reported separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationResult {
    pub category: String,
    pub asset_count: usize,
    pub status: ActivationStatus,
    pub local_success: bool,
    pub remote_success: bool,
    pub remote_message: String,
    /// Name of the strategy that succeeded, if any.
    pub remote_strategy: Option<String>,
    /// Every strategy actually attempted, in order.
    pub attempts: Vec<SyncAttemptResult>,
    pub activated_at: DateTime<Utc>,
}

impl ActivationResult {
    /// Error code for the remote half, `None` on full success.
    pub fn remote_code(&self) -> Option<&'static str> {
        match self.status {
            ActivationStatus::Activated => None,
            ActivationStatus::LocalOnly => Some("REMOTE_SYNC_FAILED"),
        }
    }
}

/// The currently selected category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCategory {
    pub category: String,
    pub last_activated: DateTime<Utc>,
}
