//! `preroll-scheduler`: recurring schedules that activate preroll categories.
//!
//! # Overview
//!
//! Schedules live in a single versioned JSON document managed by
//! [`store::ScheduleStore`]. The [`engine::ScheduleEngine`] evaluates them on
//! a fixed interval, activates the category of every due schedule through a
//! [`preroll_core::CategoryActivator`] and writes the execution bookkeeping
//! back to the store.
//!
//! # Recurrence
//!
//! | Variant   | Due again after                    |
//! |-----------|------------------------------------|
//! | `OneTime` | never (deactivated after firing)   |
//! | `Daily`   | 1 day                              |
//! | `Weekly`  | 7 days                             |
//! | `Monthly` | 1 calendar month, clamped          |
//! | `Yearly`  | 12 calendar months, clamped        |

pub mod engine;
pub mod error;
pub mod legacy;
pub mod recurrence;
pub mod store;
pub mod types;

pub use engine::{ExecutionOutcome, ExecutionStatus, ScheduleEngine};
pub use error::{Result, SchedulerError};
pub use store::ScheduleStore;
pub use types::{Recurrence, Schedule, ScheduleSpec};
