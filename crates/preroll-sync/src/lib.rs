//! Remote sync for the preroll rotator.
//!
//! The media server's control API has accepted different request shapes over
//! time and there is no reliable way to ask which one a given instance takes.
//! [`SyncStrategyChain`] tries a fixed list of [`SyncStrategy`] values in
//! order and reports the first one that works.

pub mod chain;
pub mod client;
pub mod error;
pub mod strategies;
pub mod strategy;
pub mod xml;

pub use chain::{RemoteSync, SyncReport, SyncStrategyChain, CHAIN_NAME};
pub use client::{HttpReply, MediaServerClient};
pub use error::SyncError;
pub use strategy::{StrategyOutcome, SyncPayload, SyncStrategy};
pub use xml::LibrarySection;
