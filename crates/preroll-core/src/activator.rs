use async_trait::async_trait;

use crate::error::Result;
use crate::types::ActivationResult;

/// Anything that can make a category the active one.
///
/// The scheduler engine depends on this trait rather than on the concrete
/// gateway, so scheduled and manual activation share one implementation.
#[async_trait]
pub trait CategoryActivator: Send + Sync {
    /// Activate `category`. `CategoryNotFound` / `CategoryEmpty` abort before
    /// any state changes; a failed remote sync is reported inside `Ok`.
    async fn activate(&self, category: &str) -> Result<ActivationResult>;
}
