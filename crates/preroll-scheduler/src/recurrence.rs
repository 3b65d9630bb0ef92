use chrono::{DateTime, Duration, Months, Utc};

use crate::types::{Recurrence, Schedule};

/// One period after `from`, using calendar arithmetic.
///
/// Month arithmetic clamps to the last valid day, so Jan 31 + 1 month is the
/// last day of February. Returns `None` for `OneTime` and on overflow.
pub fn add_period(recurrence: Recurrence, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match recurrence {
        Recurrence::OneTime => None,
        Recurrence::Daily => from.checked_add_signed(Duration::days(1)),
        Recurrence::Weekly => from.checked_add_signed(Duration::days(7)),
        Recurrence::Monthly => from.checked_add_months(Months::new(1)),
        Recurrence::Yearly => from.checked_add_months(Months::new(12)),
    }
}

/// Earliest instant at which the schedule becomes due again, ignoring
/// `is_active` and the end date.
pub fn next_execution(
    recurrence: Recurrence,
    start_date: DateTime<Utc>,
    last_executed: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match (recurrence, last_executed) {
        (_, None) => Some(start_date),
        (Recurrence::OneTime, Some(last)) if last < start_date => Some(start_date),
        (Recurrence::OneTime, Some(_)) => None,
        (recurring, Some(last)) => add_period(recurring, last).map(|n| n.max(start_date)),
    }
}

/// Whether `schedule` should fire at `now`.
pub fn is_due(schedule: &Schedule, now: DateTime<Utc>) -> bool {
    if !schedule.is_active || schedule.start_date > now {
        return false;
    }
    if schedule.end_date.is_some_and(|end| now > end) {
        return false;
    }

    match (schedule.recurrence, schedule.last_executed) {
        (Recurrence::OneTime, None) => true,
        (Recurrence::OneTime, Some(last)) => last < schedule.start_date,
        (_, None) => true,
        (recurring, Some(last)) => add_period(recurring, last).is_some_and(|next| next <= now),
    }
}
