//! `preroll-activation`: the single code path that makes a category active.
//!
//! Scheduled firings and operator requests both go through
//! [`ActivationGateway::activate`]. It validates the category, moves the
//! active-category pointer and pushes the asset pool to the media server,
//! reporting the local and remote halves separately.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use preroll_core::{
    ActivationResult, ActivationStatus, ActiveCategory, AssetCatalog, CategoryActivator,
    PrerollError, Result,
};
use preroll_sync::{RemoteSync, SyncReport};
use tokio::sync::Mutex;
use tracing::{info, warn};

pub struct ActivationGateway {
    catalog: AssetCatalog,
    remote: Arc<dyn RemoteSync>,
    /// Held for a whole activation so two callers never interleave.
    activation_lock: Mutex<()>,
    /// Readable without waiting for a sync in flight.
    pointer: RwLock<Option<ActiveCategory>>,
}

impl ActivationGateway {
    pub fn new(catalog: AssetCatalog, remote: Arc<dyn RemoteSync>) -> Self {
        Self {
            catalog,
            remote,
            activation_lock: Mutex::new(()),
            pointer: RwLock::new(None),
        }
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    /// Snapshot of the active-category pointer, `None` before the first activation.
    pub fn active(&self) -> Option<ActiveCategory> {
        self.pointer
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub async fn activate(&self, category: &str) -> Result<ActivationResult> {
        let _guard = self.activation_lock.lock().await;

        let assets = self.catalog.list_files(category)?;
        if assets.is_empty() {
            return Err(PrerollError::CategoryEmpty {
                name: category.to_string(),
            });
        }

        let activated_at = Utc::now();
        *self.pointer.write().unwrap_or_else(|e| e.into_inner()) = Some(ActiveCategory {
            category: category.to_string(),
            last_activated: activated_at,
        });
        info!(category, assets = assets.len(), "category activated locally");

        let report = self.remote.apply(&assets).await;
        let result = build_result(category, assets.len(), activated_at, report);

        match result.status {
            ActivationStatus::Activated => info!(
                category,
                strategy = result.remote_strategy.as_deref().unwrap_or_default(),
                "category activated on media server"
            ),
            ActivationStatus::LocalOnly => warn!(
                category,
                code = result.remote_code().unwrap_or_default(),
                remote = %result.remote_message,
                "remote sync failed, category active locally only"
            ),
        }
        Ok(result)
    }
}

#[async_trait]
impl CategoryActivator for ActivationGateway {
    async fn activate(&self, category: &str) -> Result<ActivationResult> {
        ActivationGateway::activate(self, category).await
    }
}

fn build_result(
    category: &str,
    asset_count: usize,
    activated_at: chrono::DateTime<Utc>,
    report: SyncReport,
) -> ActivationResult {
    let SyncReport { result, attempts } = report;
    let status_text = result
        .http_status
        .map(|s| format!(", HTTP {s}"))
        .unwrap_or_default();

    let (status, remote_message, remote_strategy) = if result.succeeded {
        (
            ActivationStatus::Activated,
            format!("applied via {}: {}", result.strategy_name, result.message),
            Some(result.strategy_name),
        )
    } else {
        (
            ActivationStatus::LocalOnly,
            format!(
                "remote sync failed ({}{}): {}",
                result.strategy_name, status_text, result.message
            ),
            None,
        )
    };

    ActivationResult {
        category: category.to_string(),
        asset_count,
        status,
        local_success: true,
        remote_success: status == ActivationStatus::Activated,
        remote_message,
        remote_strategy,
        attempts,
        activated_at,
    }
}
