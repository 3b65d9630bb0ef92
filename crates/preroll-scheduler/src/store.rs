//! Durable schedule storage: one versioned JSON document.
//!
//! Every mutation takes the writer lock, re-reads the document, applies a
//! targeted change and writes the result atomically (temp file in the same
//! directory, then rename). Readers never take the lock; they always see a
//! complete document.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, SchedulerError};
use crate::legacy;
use crate::recurrence;
use crate::types::{Schedule, ScheduleSpec};

/// Current on-disk document version.
pub const DOCUMENT_VERSION: u64 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ScheduleDocument {
    version: u64,
    #[serde(default)]
    schedules: Vec<Schedule>,
}

pub struct ScheduleStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ScheduleStore {
    /// Open the store at `path`, creating its directory if needed. The file
    /// itself is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> Result<Vec<Schedule>> {
        Ok(self.read_document()?.schedules)
    }

    pub fn get(&self, id: &str) -> Result<Schedule> {
        self.list()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| SchedulerError::ScheduleNotFound { id: id.to_string() })
    }

    pub fn create(&self, spec: &ScheduleSpec) -> Result<Schedule> {
        let recurrence = spec.validate()?;
        let schedule = Schedule {
            id: Uuid::new_v4().to_string(),
            description: spec.description.trim().to_string(),
            category_name: spec.category_name.trim().to_string(),
            start_date: spec.start_date,
            end_date: spec.end_date,
            recurrence,
            is_active: spec.is_active,
            last_executed: None,
            next_execution: recurrence::next_execution(recurrence, spec.start_date, None),
            created_date: Utc::now(),
        };

        self.mutate(|doc| {
            doc.schedules.push(schedule.clone());
            Ok(())
        })?;
        info!(schedule_id = %schedule.id, category = %schedule.category_name, "schedule created");
        Ok(schedule)
    }

    /// Replace the user-editable fields. Identity and execution history are kept.
    pub fn update(&self, id: &str, spec: &ScheduleSpec) -> Result<Schedule> {
        let recurrence = spec.validate()?;
        let updated = self.mutate(|doc| {
            let schedule = find_mut(doc, id)?;
            schedule.description = spec.description.trim().to_string();
            schedule.category_name = spec.category_name.trim().to_string();
            schedule.start_date = spec.start_date;
            schedule.end_date = spec.end_date;
            schedule.recurrence = recurrence;
            schedule.is_active = spec.is_active;
            schedule.next_execution =
                recurrence::next_execution(recurrence, spec.start_date, schedule.last_executed);
            Ok(schedule.clone())
        })?;
        info!(schedule_id = %id, "schedule updated");
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.mutate(|doc| {
            let before = doc.schedules.len();
            doc.schedules.retain(|s| s.id != id);
            if doc.schedules.len() == before {
                return Err(SchedulerError::ScheduleNotFound { id: id.to_string() });
            }
            Ok(())
        })?;
        info!(schedule_id = %id, "schedule deleted");
        Ok(())
    }

    /// Engine bookkeeping: touches only `last_executed`, `is_active` and
    /// `next_execution` of one schedule.
    pub fn record_execution(
        &self,
        id: &str,
        at: DateTime<Utc>,
        deactivate: bool,
    ) -> Result<Schedule> {
        self.mutate(|doc| {
            let schedule = find_mut(doc, id)?;
            schedule.last_executed = Some(at);
            if deactivate {
                schedule.is_active = false;
            }
            schedule.next_execution =
                recurrence::next_execution(schedule.recurrence, schedule.start_date, Some(at));
            Ok(schedule.clone())
        })
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut ScheduleDocument) -> Result<T>) -> Result<T> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut doc = self.read_document()?;
        let out = f(&mut doc)?;
        doc.version = DOCUMENT_VERSION;
        self.write_document(&doc)?;
        Ok(out)
    }

    fn read_document(&self) -> Result<ScheduleDocument> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ScheduleDocument {
                    version: DOCUMENT_VERSION,
                    schedules: Vec::new(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(ScheduleDocument {
                version: DOCUMENT_VERSION,
                schedules: Vec::new(),
            });
        }

        match serde_json::from_str::<Value>(&raw)? {
            Value::Array(records) => {
                debug!(path = %self.path.display(), "reading legacy schedule array");
                Ok(ScheduleDocument {
                    version: DOCUMENT_VERSION,
                    schedules: legacy::import(records)?,
                })
            }
            Value::Object(map) => {
                let found = map.get("version").and_then(Value::as_u64).unwrap_or(0);
                if found != DOCUMENT_VERSION {
                    return Err(SchedulerError::UnsupportedVersion { found });
                }
                Ok(serde_json::from_value(Value::Object(map))?)
            }
            _ => Err(SchedulerError::StoreIo(format!(
                "{} is not a schedule document",
                self.path.display()
            ))),
        }
    }

    fn write_document(&self, doc: &ScheduleDocument) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let json = serde_json::to_vec_pretty(doc)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn find_mut<'a>(doc: &'a mut ScheduleDocument, id: &str) -> Result<&'a mut Schedule> {
    doc.schedules
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| SchedulerError::ScheduleNotFound { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Recurrence;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store() -> (TempDir, ScheduleStore) {
        let tmp = TempDir::new().unwrap();
        let store = ScheduleStore::open(tmp.path().join("data").join("schedules.json")).unwrap();
        (tmp, store)
    }

    fn spec(description: &str, recurrence: Recurrence) -> ScheduleSpec {
        ScheduleSpec::new(
            description,
            "Christmas",
            Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(),
            recurrence,
        )
    }

    #[test]
    fn missing_file_lists_nothing() {
        let (_tmp, store) = store();
        assert!(store.list().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn create_persists_versioned_document() {
        let (_tmp, store) = store();
        let created = store.create(&spec("Holidays", Recurrence::Daily)).unwrap();
        assert_eq!(created.next_execution, Some(created.start_date));
        assert!(created.is_active);

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["schedules"][0]["recurrence"], "Daily");

        assert_eq!(store.get(&created.id).unwrap(), created);
    }

    #[test]
    fn invalid_spec_is_never_persisted() {
        let (_tmp, store) = store();
        let mut bad = spec("", Recurrence::Daily);
        assert!(matches!(
            store.create(&bad),
            Err(SchedulerError::Validation(_))
        ));
        bad.description = "ok".into();
        bad.recurrence = "hourly".into();
        assert!(matches!(
            store.create(&bad),
            Err(SchedulerError::Validation(_))
        ));
        assert!(!store.path().exists());
    }

    #[test]
    fn update_keeps_identity_and_history() {
        let (_tmp, store) = store();
        let created = store.create(&spec("Holidays", Recurrence::Daily)).unwrap();
        let fired_at = Utc.with_ymd_and_hms(2025, 12, 2, 9, 0, 0).unwrap();
        store.record_execution(&created.id, fired_at, false).unwrap();

        let mut edit = spec("Holidays (edited)", Recurrence::Weekly);
        edit.category_name = "Winter".into();
        let updated = store.update(&created.id, &edit).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_date, created.created_date);
        assert_eq!(updated.last_executed, Some(fired_at));
        assert_eq!(updated.category_name, "Winter");
        assert_eq!(
            updated.next_execution,
            Some(Utc.with_ymd_and_hms(2025, 12, 9, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn unknown_ids_are_reported() {
        let (_tmp, store) = store();
        let spec = spec("x", Recurrence::Daily);
        assert!(matches!(
            store.update("nope", &spec),
            Err(SchedulerError::ScheduleNotFound { .. })
        ));
        assert!(matches!(
            store.delete("nope"),
            Err(SchedulerError::ScheduleNotFound { .. })
        ));
        assert!(matches!(
            store.record_execution("nope", Utc::now(), true),
            Err(SchedulerError::ScheduleNotFound { .. })
        ));
    }

    #[test]
    fn delete_removes_only_target() {
        let (_tmp, store) = store();
        let a = store.create(&spec("a", Recurrence::Daily)).unwrap();
        let b = store.create(&spec("b", Recurrence::Daily)).unwrap();
        store.delete(&a.id).unwrap();
        let left: Vec<_> = store.list().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(left, vec![b.id]);
    }

    #[test]
    fn record_execution_deactivates_one_time() {
        let (_tmp, store) = store();
        let s = store.create(&spec("launch", Recurrence::OneTime)).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 12, 1, 0, 1, 0).unwrap();
        let after = store.record_execution(&s.id, at, true).unwrap();
        assert!(!after.is_active);
        assert_eq!(after.last_executed, Some(at));
        assert_eq!(after.next_execution, None);
    }

    #[test]
    fn legacy_array_is_migrated_on_write() {
        let (_tmp, store) = store();
        std::fs::write(
            store.path(),
            r#"[
              {"Id": "old-1", "Description": "Old", "CategoryName": "Christmas",
               "StartDate": "2024-12-01T00:00:00", "Type": 3, "IsActive": true,
               "LastExecuted": null, "NextExecution": null,
               "CreatedDate": "2024-11-01T00:00:00Z", "CreatedBy": "System"}
            ]"#,
        )
        .unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].recurrence, Recurrence::Monthly);

        store.create(&spec("New", Recurrence::Daily)).unwrap();
        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["schedules"][0]["id"], "old-1");
        assert_eq!(raw["schedules"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn unreadable_legacy_record_blocks_migration() {
        let (_tmp, store) = store();
        let original = r#"[
          {"Id": "a", "Description": "Readable", "CategoryName": "Christmas",
           "StartDate": "2024-12-01T00:00:00", "Type": 1},
          {"Id": "b", "Description": "Odd date", "CategoryName": "Halloween",
           "StartDate": "12/01/2024 00:00:00", "Type": 1}
        ]"#;
        std::fs::write(store.path(), original).unwrap();

        let err = store.list().unwrap_err();
        assert!(matches!(&err, SchedulerError::StoreIo(msg) if msg.contains("#1")));
        assert_eq!(err.code(), "STORE_IO_ERROR");

        let at = Utc.with_ymd_and_hms(2024, 12, 2, 0, 0, 0).unwrap();
        assert!(store.record_execution("a", at, false).is_err());
        assert!(store.create(&spec("New", Recurrence::Daily)).is_err());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), original);
    }

    #[test]
    fn legacy_record_without_id_keeps_its_id_through_execution() {
        let (_tmp, store) = store();
        std::fs::write(
            store.path(),
            r#"[{"Description": "NoId", "CategoryName": "Christmas",
                 "StartDate": "2024-12-01T00:00:00", "Type": 1}]"#,
        )
        .unwrap();

        let id = store.list().unwrap()[0].id.clone();
        assert_eq!(store.list().unwrap()[0].id, id);

        let at = Utc.with_ymd_and_hms(2024, 12, 2, 8, 0, 0).unwrap();
        let fired = store.record_execution(&id, at, false).unwrap();
        assert_eq!(fired.id, id);

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["schedules"][0]["id"], id.as_str());
        assert_eq!(store.get(&id).unwrap().last_executed, Some(at));
    }

    #[test]
    fn future_versions_are_refused() {
        let (_tmp, store) = store();
        std::fs::write(store.path(), r#"{"version": 2, "schedules": []}"#).unwrap();
        let err = store.list().unwrap_err();
        assert!(matches!(err, SchedulerError::UnsupportedVersion { found: 2 }));
        assert_eq!(err.code(), "STORE_IO_ERROR");
        // and nothing overwrites it
        assert!(store.create(&spec("x", Recurrence::Daily)).is_err());
    }

    #[test]
    fn concurrent_writers_lose_nothing() {
        let (_tmp, store) = store();
        let store = Arc::new(store);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .create(&spec(&format!("s{i}"), Recurrence::Daily))
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.list().unwrap().len(), 8);
    }
}
