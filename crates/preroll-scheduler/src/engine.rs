use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use preroll_core::{ActivationResult, ActivationStatus, CategoryActivator};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::recurrence::is_due;
use crate::store::ScheduleStore;
use crate::types::Schedule;

/// How one due schedule's firing went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Activated locally and on the media server.
    Activated,
    /// Activated locally; every remote strategy failed.
    LocalOnly,
    /// Activation was refused (unknown or empty category).
    Failed,
}

/// Record of one schedule fired during a tick.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub schedule_id: String,
    pub description: String,
    pub category_name: String,
    pub fired_at: DateTime<Utc>,
    pub status: ExecutionStatus,
    pub activation: Option<ActivationResult>,
    pub error: Option<String>,
    /// False when the execution bookkeeping could not be written back.
    pub bookkeeping_saved: bool,
}

/// Turns wall-clock time into schedule firings.
///
/// `evaluate` does the work for one instant. `tick` wraps it in a run-lock so
/// evaluations never overlap, and `run` drives `tick` from a timer.
pub struct ScheduleEngine {
    store: Arc<ScheduleStore>,
    activator: Arc<dyn CategoryActivator>,
    tick_interval: Duration,
    run_lock: Mutex<()>,
}

impl ScheduleEngine {
    pub fn new(
        store: Arc<ScheduleStore>,
        activator: Arc<dyn CategoryActivator>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            store,
            activator,
            tick_interval,
            run_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<ScheduleStore> {
        &self.store
    }

    /// Fire every schedule due at `now`, one after another.
    ///
    /// A failure in one schedule never stops the others. If the schedule
    /// document itself cannot be read, nothing fires.
    pub async fn evaluate(&self, now: DateTime<Utc>) -> Vec<ExecutionOutcome> {
        let schedules = match self.store.list() {
            Ok(s) => s,
            Err(e) => {
                error!(err = %e, "cannot load schedules, tick abandoned");
                return Vec::new();
            }
        };

        let due = due_schedules(schedules, now);
        if !due.is_empty() {
            info!(count = due.len(), "schedules due");
        }

        let mut outcomes = Vec::with_capacity(due.len());
        for schedule in due {
            outcomes.push(self.fire(schedule, now).await);
        }
        outcomes
    }

    /// `evaluate` under the run-lock. Returns `None` without doing anything
    /// when another evaluation is still in progress.
    pub async fn tick(&self, now: DateTime<Utc>) -> Option<Vec<ExecutionOutcome>> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!("previous evaluation still running, tick skipped");
            return None;
        };
        Some(self.evaluate(now).await)
    }

    /// Main loop. Ticks every `tick_interval` until `shutdown` broadcasts `true`.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.tick_interval.as_secs(), "schedule engine started");

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick(Utc::now()).await;
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        info!("schedule engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn fire(&self, schedule: Schedule, now: DateTime<Utc>) -> ExecutionOutcome {
        info!(
            schedule_id = %schedule.id,
            description = %schedule.description,
            category = %schedule.category_name,
            "executing schedule"
        );

        let (status, activation, error) =
            match self.activator.activate(&schedule.category_name).await {
                Ok(result) => {
                    let status = match result.status {
                        ActivationStatus::Activated => ExecutionStatus::Activated,
                        ActivationStatus::LocalOnly => {
                            warn!(
                                schedule_id = %schedule.id,
                                category = %schedule.category_name,
                                remote = %result.remote_message,
                                "category activated locally only"
                            );
                            ExecutionStatus::LocalOnly
                        }
                    };
                    (status, Some(result), None)
                }
                Err(e) => {
                    warn!(schedule_id = %schedule.id, err = %e, "schedule activation failed");
                    (ExecutionStatus::Failed, None, Some(e.to_string()))
                }
            };

        // The schedule fired even if activation failed; advancing keeps it
        // from retrying every tick.
        let deactivate = !schedule.recurrence.is_recurring();
        let bookkeeping_saved = match self.store.record_execution(&schedule.id, now, deactivate) {
            Ok(_) => true,
            Err(e) => {
                error!(schedule_id = %schedule.id, err = %e, "failed to record execution");
                false
            }
        };

        ExecutionOutcome {
            schedule_id: schedule.id,
            description: schedule.description,
            category_name: schedule.category_name,
            fired_at: now,
            status,
            activation,
            error,
            bookkeeping_saved,
        }
    }
}

/// Due schedules in firing order: start date, then creation date, then id.
pub fn due_schedules(schedules: Vec<Schedule>, now: DateTime<Utc>) -> Vec<Schedule> {
    let mut due: Vec<_> = schedules.into_iter().filter(|s| is_due(s, now)).collect();
    due.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then(a.created_date.cmp(&b.created_date))
            .then(a.id.cmp(&b.id))
    });
    due
}
