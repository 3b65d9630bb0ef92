//! `preroll-core`: configuration, error taxonomy and domain types shared by
//! every preroll crate, plus the filesystem asset catalog.

pub mod activator;
pub mod catalog;
pub mod config;
pub mod error;
pub mod types;

pub use activator::CategoryActivator;
pub use catalog::AssetCatalog;
pub use config::PrerollConfig;
pub use error::{PrerollError, Result};
pub use types::{
    ActivationResult, ActivationStatus, ActiveCategory, AssetRef, CategorySummary,
    SyncAttemptResult,
};
