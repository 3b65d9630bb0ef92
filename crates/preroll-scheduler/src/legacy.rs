//! Import of the older `schedules.json` format: a bare JSON array of
//! PascalCase records whose `Type` may be a name or an integer index, and
//! whose dates may carry no zone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::error::{Result, SchedulerError};
use crate::recurrence;
use crate::types::{Recurrence, Schedule};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LegacySchedule {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category_name: String,
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(rename = "Type", alias = "Recurrence", default)]
    kind: Value,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    last_executed: Option<String>,
    #[serde(default)]
    created_date: Option<String>,
}

/// Convert the whole array or nothing.
///
/// Any record that cannot be read fails the import with `StoreIo` naming its
/// index, so a later write can never drop it from the file.
pub fn import(records: Vec<Value>) -> Result<Vec<Schedule>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            convert(index, value).map_err(|reason| {
                warn!(index, reason = %reason, "unreadable legacy schedule");
                SchedulerError::StoreIo(format!(
                    "legacy schedule #{index} is unreadable ({reason}); \
                     fix or remove it before the document can be migrated"
                ))
            })
        })
        .collect()
}

/// Id for a record that has none. Derived from the record's position and
/// contents so every read of the same file yields the same id.
fn derived_id(index: usize, raw: &Value) -> String {
    let seed = format!("{index}:{raw}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string()
}

fn convert(index: usize, value: Value) -> std::result::Result<Schedule, String> {
    let fallback_id = derived_id(index, &value);
    let legacy: LegacySchedule = serde_json::from_value(value).map_err(|e| e.to_string())?;

    let start_date = legacy
        .start_date
        .as_deref()
        .and_then(parse_date)
        .ok_or("missing or unreadable StartDate")?;
    let recurrence = parse_recurrence(&legacy.kind)?;
    let last_executed = legacy.last_executed.as_deref().and_then(parse_date);

    Ok(Schedule {
        id: legacy
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(fallback_id),
        description: legacy.description,
        category_name: legacy.category_name,
        start_date,
        end_date: legacy.end_date.as_deref().and_then(parse_date),
        recurrence,
        is_active: legacy.is_active.unwrap_or(true),
        last_executed,
        next_execution: recurrence::next_execution(recurrence, start_date, last_executed),
        created_date: legacy
            .created_date
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(start_date),
    })
}

fn parse_recurrence(value: &Value) -> std::result::Result<Recurrence, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|i| Recurrence::ALL.get(i as usize).copied())
            .ok_or_else(|| format!("unknown recurrence index {n}")),
        Value::String(s) => s.parse(),
        Value::Null => Err("missing Type".to_string()),
        other => Err(format!("unreadable Type {other}")),
    }
}

/// RFC 3339, or a zone-less timestamp / date taken as UTC.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
