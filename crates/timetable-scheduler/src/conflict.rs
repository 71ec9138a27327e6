//! Double-booking detection.
//!
//! A candidate clashes with a stored entry when both sit in the same day and
//! time slot and share at least one of instructor, room or student group.
//! Distinct resources may freely share a slot.

use std::collections::BTreeMap;

use crate::types::{Candidate, Conflict, ConflictPair, ConflictResult, ScheduleEntry};

/// Check `candidate` against `entries`, skipping the entry whose id is
/// `exclude_id` (the entry's own prior version during an update).
///
/// The first clashing entry ends the scan. Which entry is reported when
/// several clash is unspecified; only the existence of a clash matters.
pub fn check_conflict<'a, I>(
    entries: I,
    candidate: &Candidate<'_>,
    exclude_id: Option<&str>,
) -> ConflictResult
where
    I: IntoIterator<Item = &'a ScheduleEntry>,
{
    for entry in entries {
        if exclude_id == Some(entry.id.as_str()) {
            continue;
        }
        let booked = entry.as_candidate();
        if !candidate.same_slot(&booked) {
            continue;
        }
        let resources = candidate.shared_resources(&booked);
        if !resources.is_empty() {
            return ConflictResult::Conflict(Conflict {
                entry_id: entry.id.clone(),
                resources,
            });
        }
    }
    ConflictResult::NoConflict
}

/// Every pair of entries that violates the no-double-booking invariant.
///
/// Only matters for data written before enforcement (e.g. imported from the
/// legacy dashboard storage); a routine built through the scheduler returns
/// an empty list. Pairs are ordered by day, slot, then commit order.
pub fn audit(entries: &[ScheduleEntry]) -> Vec<ConflictPair> {
    let mut by_slot: BTreeMap<_, Vec<&ScheduleEntry>> = BTreeMap::new();
    for entry in entries {
        by_slot
            .entry((entry.day, entry.time_slot))
            .or_default()
            .push(entry);
    }

    let mut pairs = Vec::new();
    for ((day, time_slot), group) in by_slot {
        for (i, first) in group.iter().enumerate() {
            for second in &group[i + 1..] {
                let resources = first
                    .as_candidate()
                    .shared_resources(&second.as_candidate());
                if !resources.is_empty() {
                    pairs.push(ConflictPair {
                        first_id: first.id.clone(),
                        second_id: second.id.clone(),
                        day,
                        time_slot,
                        resources,
                    });
                }
            }
        }
    }
    pairs
}
