use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// How often a schedule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recurrence {
    /// Fire once at `start_date`, then deactivate.
    OneTime,
    Daily,
    Weekly,
    /// One calendar month after the previous firing.
    Monthly,
    /// Twelve calendar months after the previous firing.
    Yearly,
}

impl Recurrence {
    pub const ALL: [Recurrence; 5] = [
        Recurrence::OneTime,
        Recurrence::Daily,
        Recurrence::Weekly,
        Recurrence::Monthly,
        Recurrence::Yearly,
    ];

    pub fn is_recurring(self) -> bool {
        self != Recurrence::OneTime
    }
}

impl std::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Recurrence::OneTime => "OneTime",
            Recurrence::Daily => "Daily",
            Recurrence::Weekly => "Weekly",
            Recurrence::Monthly => "Monthly",
            Recurrence::Yearly => "Yearly",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Recurrence {
    type Err = String;

    /// Case-insensitive; `one_time`, `one-time` and `once` are accepted too.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "onetime" | "once" => Ok(Recurrence::OneTime),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            "yearly" | "annually" => Ok(Recurrence::Yearly),
            _ => Err(format!("unknown recurrence: {s}")),
        }
    }
}

/// A persisted schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// UUID v4 string.
    pub id: String,
    pub description: String,
    pub category_name: String,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub recurrence: Recurrence,
    pub is_active: bool,
    #[serde(default)]
    pub last_executed: Option<DateTime<Utc>>,
    /// Cached; always recomputable from recurrence, start date and last execution.
    #[serde(default)]
    pub next_execution: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
}

/// Caller-supplied fields for `create` and `update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSpec {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_name: String,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Parsed case-insensitively, see [`Recurrence`]'s `FromStr`.
    pub recurrence: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ScheduleSpec {
    pub fn new(
        description: impl Into<String>,
        category_name: impl Into<String>,
        start_date: DateTime<Utc>,
        recurrence: Recurrence,
    ) -> Self {
        Self {
            description: description.into(),
            category_name: category_name.into(),
            start_date,
            end_date: None,
            recurrence: recurrence.to_string(),
            is_active: true,
        }
    }

    /// Check every field and return the parsed recurrence.
    pub fn validate(&self) -> Result<Recurrence> {
        if self.description.trim().is_empty() {
            return Err(SchedulerError::Validation(
                "description must not be empty".into(),
            ));
        }
        if self.category_name.trim().is_empty() {
            return Err(SchedulerError::Validation(
                "category_name must not be empty".into(),
            ));
        }
        let recurrence = self
            .recurrence
            .parse::<Recurrence>()
            .map_err(SchedulerError::Validation)?;
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(SchedulerError::Validation(
                    "end_date must not be before start_date".into(),
                ));
            }
        }
        Ok(recurrence)
    }
}
