use std::sync::Arc;

use chrono::Utc;
use timetable_core::RoutineConfig;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::calendar::SlotCalendar;
use crate::conflict::{audit, check_conflict};
use crate::error::{Result, SchedulerError};
use crate::persist::Persistence;
use crate::store::{EntryStore, StoreTxn};
use crate::types::{
    ConflictPair, ConflictResult, Day, EntryFilter, EntryPatch, NewEntry, ScheduleEntry, TimeSlot,
};

/// The class routine: conflict-checked add / update / delete plus queries.
///
/// Every mutation runs validate → check → mutate → persist → publish under
/// the store's write gate, so two commits never interleave between the
/// conflict scan and the write. Storage is written before the new version is
/// published; when the save fails the routine stays as it was.
pub struct RoutineScheduler {
    calendar: SlotCalendar,
    category: String,
    store: EntryStore,
    persistence: Arc<dyn Persistence>,
}

impl RoutineScheduler {
    /// Load `category` from `persistence` and start serving it.
    ///
    /// Stored entries outside the calendar, or clashing with each other, are
    /// kept but reported at `warn`.
    #[instrument(skip(calendar, persistence))]
    pub fn open(
        calendar: SlotCalendar,
        persistence: Arc<dyn Persistence>,
        category: &str,
    ) -> Result<Self> {
        let entries = persistence.load(category)?;

        for entry in &entries {
            if !calendar.has_day(entry.day) || !calendar.has_slot(entry.time_slot) {
                warn!(
                    entry_id = %entry.id,
                    day = %entry.day,
                    slot = %entry.time_slot,
                    "stored entry lies outside the slot calendar"
                );
            }
        }
        for pair in audit(&entries) {
            warn!(
                first = %pair.first_id,
                second = %pair.second_id,
                day = %pair.day,
                slot = %pair.time_slot,
                "stored routine already contains a clash"
            );
        }
        info!(count = entries.len(), "routine loaded");

        Ok(Self {
            calendar,
            category: category.to_string(),
            store: EntryStore::new(entries),
            persistence,
        })
    }

    pub fn from_config(cfg: &RoutineConfig, persistence: Arc<dyn Persistence>) -> Result<Self> {
        Self::open(SlotCalendar::from_config(cfg)?, persistence, &cfg.category)
    }

    pub fn calendar(&self) -> &SlotCalendar {
        &self.calendar
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Validate, conflict-check and commit a new entry.
    #[instrument(skip(self, draft))]
    pub fn add_entry(&self, draft: NewEntry) -> Result<ScheduleEntry> {
        let entry = self.build_entry(draft, new_entry_id())?;

        let mut txn = self.store.begin();
        if let ConflictResult::Conflict(c) =
            check_conflict(txn.entries(), &entry.as_candidate(), None)
        {
            info!(clash_with = %c.entry_id, day = %entry.day, slot = %entry.time_slot, "entry rejected");
            return Err(c.into());
        }
        txn.insert(entry.clone());
        self.persist_and_commit(txn)?;

        info!(entry_id = %entry.id, day = %entry.day, slot = %entry.time_slot, "entry added");
        Ok(entry)
    }

    /// Merge `patch` over the stored entry and commit it if the merged entry
    /// clashes with nothing but itself.
    #[instrument(skip(self, patch), fields(entry_id = %id))]
    pub fn update_entry(&self, id: &str, patch: EntryPatch) -> Result<ScheduleEntry> {
        let mut txn = self.store.begin();
        let existing = txn.get(id).ok_or_else(|| SchedulerError::NotFound {
            id: id.to_string(),
        })?;
        let merged = self.merge(existing, patch)?;

        if let ConflictResult::Conflict(c) =
            check_conflict(txn.entries(), &merged.as_candidate(), Some(id))
        {
            info!(clash_with = %c.entry_id, "update rejected");
            return Err(c.into());
        }
        txn.replace(merged.clone());
        self.persist_and_commit(txn)?;

        info!(day = %merged.day, slot = %merged.time_slot, "entry updated");
        Ok(merged)
    }

    /// Remove an entry. Removal cannot create a clash, so nothing is checked.
    #[instrument(skip(self), fields(entry_id = %id))]
    pub fn delete_entry(&self, id: &str) -> Result<()> {
        let mut txn = self.store.begin();
        if txn.remove(id).is_none() {
            return Err(SchedulerError::NotFound { id: id.to_string() });
        }
        self.persist_and_commit(txn)?;
        info!("entry deleted");
        Ok(())
    }

    pub fn get_entry(&self, id: &str) -> Result<ScheduleEntry> {
        self.store
            .get(id)
            .ok_or_else(|| SchedulerError::NotFound { id: id.to_string() })
    }

    /// Snapshot of the entries matching `filter`, in commit order.
    pub fn list_entries(&self, filter: &EntryFilter) -> Vec<ScheduleEntry> {
        self.store.query(|e| filter.matches(e))
    }

    /// Dry run of the add (or, with `exclude_id`, update) check. Read-only.
    pub fn check_entry(&self, draft: NewEntry, exclude_id: Option<&str>) -> Result<ConflictResult> {
        let candidate = self.build_entry(draft, String::new())?;
        let snapshot = self.store.snapshot();
        Ok(check_conflict(
            snapshot.iter(),
            &candidate.as_candidate(),
            exclude_id,
        ))
    }

    /// Clashing pairs in the current routine.
    pub fn audit(&self) -> Vec<ConflictPair> {
        audit(&self.store.snapshot())
    }

    // --- private helpers ---------------------------------------------------

    /// Write-ahead: storage first, then publish. A failed save drops `txn`.
    fn persist_and_commit(&self, txn: StoreTxn<'_>) -> Result<()> {
        if let Err(e) = self.persistence.save(&self.category, txn.entries()) {
            warn!(category = %self.category, error = %e, "save failed; routine left unchanged");
            return Err(e.into());
        }
        txn.commit();
        Ok(())
    }

    fn build_entry(&self, draft: NewEntry, id: String) -> Result<ScheduleEntry> {
        let day = draft
            .day
            .ok_or_else(|| SchedulerError::validation("day", "is required"))?;
        let time_slot = draft
            .time_slot
            .ok_or_else(|| SchedulerError::validation("time_slot", "is required"))?;
        self.check_day(day)?;
        self.check_slot(time_slot)?;

        let now = Utc::now().to_rfc3339();
        Ok(ScheduleEntry {
            id,
            day,
            time_slot,
            instructor_id: required("instructor_id", draft.instructor_id)?,
            room_id: required("room_id", draft.room_id)?,
            student_group_id: required("student_group_id", draft.student_group_id)?,
            course_id: optional_text(draft.course_id),
            description: optional_text(draft.description),
            attributes: draft.attributes,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Overlay `patch` on `existing`. Only patched day / slot values are
    /// checked against the calendar, so legacy entries stay editable.
    fn merge(&self, existing: &ScheduleEntry, patch: EntryPatch) -> Result<ScheduleEntry> {
        let mut merged = existing.clone();

        if let Some(day) = patch.day {
            self.check_day(day)?;
            merged.day = day;
        }
        if let Some(slot) = patch.time_slot {
            self.check_slot(slot)?;
            merged.time_slot = slot;
        }
        if let Some(v) = patch.instructor_id {
            merged.instructor_id = non_empty("instructor_id", v)?;
        }
        if let Some(v) = patch.room_id {
            merged.room_id = non_empty("room_id", v)?;
        }
        if let Some(v) = patch.student_group_id {
            merged.student_group_id = non_empty("student_group_id", v)?;
        }
        if let Some(v) = patch.course_id {
            merged.course_id = optional_text(Some(v));
        }
        if let Some(v) = patch.description {
            merged.description = optional_text(Some(v));
        }
        if let Some(attributes) = patch.attributes {
            merged.attributes = attributes;
        }
        merged.updated_at = Utc::now().to_rfc3339();
        Ok(merged)
    }

    fn check_day(&self, day: Day) -> Result<()> {
        if self.calendar.has_day(day) {
            Ok(())
        } else {
            Err(SchedulerError::validation(
                "day",
                format!("'{day}' is not a teaching day"),
            ))
        }
    }

    fn check_slot(&self, slot: TimeSlot) -> Result<()> {
        if self.calendar.has_slot(slot) {
            Ok(())
        } else {
            Err(SchedulerError::validation(
                "time_slot",
                format!("'{slot}' is not in the slot calendar"),
            ))
        }
    }
}

fn new_entry_id() -> String {
    format!("re_{}", Uuid::now_v7().simple())
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    let value = value.ok_or_else(|| SchedulerError::validation(field, "is required"))?;
    non_empty(field, value)
}

fn non_empty(field: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SchedulerError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
