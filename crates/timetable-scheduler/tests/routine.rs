// End-to-end behaviour of the routine scheduler through its public API.

use std::sync::Arc;

use timetable_scheduler::{
    ConflictResult, Day, EntryFilter, EntryPatch, MemoryPersistence, NewEntry, Persistence,
    ResourceKind, RoutineScheduler, ScheduleEntry, SchedulerError, SlotCalendar,
    SqlitePersistence,
};

const CATEGORY: &str = "routineEntries";

fn scheduler_with(persistence: Arc<dyn Persistence>) -> RoutineScheduler {
    RoutineScheduler::open(SlotCalendar::default(), persistence, CATEGORY).unwrap()
}

fn scheduler() -> RoutineScheduler {
    scheduler_with(Arc::new(MemoryPersistence::new()))
}

fn draft(day: Day, slot: &str, instructor: &str, room: &str, group: &str) -> NewEntry {
    NewEntry {
        day: Some(day),
        time_slot: Some(slot.parse().unwrap()),
        instructor_id: Some(instructor.into()),
        room_id: Some(room.into()),
        student_group_id: Some(group.into()),
        ..Default::default()
    }
}

/// Brute-force check of the no-double-booking invariant.
fn assert_no_double_booking(entries: &[ScheduleEntry]) {
    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            if a.day == b.day && a.time_slot == b.time_slot {
                assert_ne!(a.instructor_id, b.instructor_id, "{} / {}", a.id, b.id);
                assert_ne!(a.room_id, b.room_id, "{} / {}", a.id, b.id);
                assert_ne!(a.student_group_id, b.student_group_id, "{} / {}", a.id, b.id);
            }
        }
    }
}

#[test]
fn shared_instructor_in_same_slot_is_rejected() {
    let s = scheduler();
    s.add_entry(draft(Day::Monday, "09:00-10:00", "T1", "R1", "G1"))
        .unwrap();

    let err = s
        .add_entry(draft(Day::Monday, "09:00-10:00", "T1", "R2", "G2"))
        .unwrap_err();
    match err {
        SchedulerError::Conflict { resources, .. } => {
            assert_eq!(resources, vec![ResourceKind::Instructor])
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(s.len(), 1);
}

#[test]
fn entries_in_different_slots_coexist() {
    let s = scheduler();
    s.add_entry(draft(Day::Monday, "09:00-10:00", "T1", "R1", "G1"))
        .unwrap();
    s.add_entry(draft(Day::Monday, "10:00-11:00", "T1", "R1", "G1"))
        .unwrap();
    assert_eq!(s.len(), 2);
}

#[test]
fn conflict_reports_the_rejecting_entry() {
    let s = scheduler();
    let first = s
        .add_entry(draft(Day::Monday, "09:00-10:00", "T1", "R1", "G1"))
        .unwrap();
    match s.add_entry(draft(Day::Monday, "09:00-10:00", "T2", "R1", "G1")) {
        Err(SchedulerError::Conflict {
            entry_id,
            resources,
        }) => {
            assert_eq!(entry_id, first.id);
            assert_eq!(resources, vec![ResourceKind::Room, ResourceKind::StudentGroup]);
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn update_to_unused_room_succeeds() {
    let s = scheduler();
    let e1 = s
        .add_entry(draft(Day::Monday, "09:00-10:00", "T1", "R1", "G1"))
        .unwrap();
    s.add_entry(draft(Day::Monday, "09:00-10:00", "T2", "R2", "G2"))
        .unwrap();

    let patch = EntryPatch {
        room_id: Some("R3".into()),
        ..Default::default()
    };
    let updated = s.update_entry(&e1.id, patch).unwrap();
    assert_eq!(updated.room_id, "R3");
    assert_eq!(s.get_entry(&e1.id).unwrap().room_id, "R3");
}

#[test]
fn delete_unknown_id_is_not_found() {
    let s = scheduler();
    match s.delete_entry("nonexistent") {
        Err(SchedulerError::NotFound { id }) => assert_eq!(id, "nonexistent"),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn update_unknown_id_is_not_found() {
    let s = scheduler();
    let err = s
        .update_entry("nonexistent", EntryPatch::default())
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn delete_removes_and_frees_the_slot() {
    let s = scheduler();
    let e = s
        .add_entry(draft(Day::Friday, "13:00-14:00", "T1", "R1", "G1"))
        .unwrap();
    s.delete_entry(&e.id).unwrap();
    assert!(s.is_empty());
    assert!(s.get_entry(&e.id).is_err());
    s.add_entry(draft(Day::Friday, "13:00-14:00", "T1", "R1", "G1"))
        .unwrap();
}

#[test]
fn updating_description_never_conflicts_with_itself() {
    let s = scheduler();
    let e = s
        .add_entry(draft(Day::Tuesday, "11:00-12:00", "T1", "R1", "G1"))
        .unwrap();

    for text in ["Lab session", "Moved to lab 2", ""] {
        let patch = EntryPatch {
            description: Some(text.into()),
            ..Default::default()
        };
        s.update_entry(&e.id, patch).unwrap();
    }
    assert_eq!(s.len(), 1);
}

#[test]
fn partial_patch_checks_the_merged_entry() {
    let s = scheduler();
    let e1 = s
        .add_entry(draft(Day::Monday, "09:00-10:00", "T1", "R1", "G1"))
        .unwrap();
    let e2 = s
        .add_entry(draft(Day::Monday, "09:00-10:00", "T2", "R2", "G2"))
        .unwrap();
    // Same instructor as e1 but in another slot.
    let e3 = s
        .add_entry(draft(Day::Monday, "10:00-11:00", "T1", "R3", "G3"))
        .unwrap();

    // Moving e3 into e1's slot keeps e3's instructor T1, which clashes.
    let move_slot = EntryPatch {
        time_slot: Some("09:00-10:00".parse().unwrap()),
        ..Default::default()
    };
    match s.update_entry(&e3.id, move_slot) {
        Err(SchedulerError::Conflict {
            entry_id,
            resources,
        }) => {
            assert_eq!(entry_id, e1.id);
            assert_eq!(resources, vec![ResourceKind::Instructor]);
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    // Changing only the room keeps e2's day, slot, instructor and group.
    let steal_room = EntryPatch {
        room_id: Some("R1".into()),
        ..Default::default()
    };
    assert!(matches!(
        s.update_entry(&e2.id, steal_room),
        Err(SchedulerError::Conflict { .. })
    ));

    // Rejected updates leave the store untouched.
    assert_eq!(s.get_entry(&e3.id).unwrap().time_slot, e3.time_slot);
    assert_eq!(s.get_entry(&e2.id).unwrap().room_id, "R2");
}

#[test]
fn list_is_idempotent_without_mutation() {
    let s = scheduler();
    s.add_entry(draft(Day::Monday, "09:00-10:00", "T1", "R1", "G1"))
        .unwrap();
    s.add_entry(draft(Day::Tuesday, "09:00-10:00", "T1", "R1", "G1"))
        .unwrap();

    let filter = EntryFilter::default();
    assert_eq!(s.list_entries(&filter), s.list_entries(&filter));
}

#[test]
fn filters_combine_with_and() {
    let s = scheduler();
    s.add_entry(draft(Day::Monday, "09:00-10:00", "T1", "R1", "G1"))
        .unwrap();
    s.add_entry(draft(Day::Monday, "10:00-11:00", "T1", "R2", "G2"))
        .unwrap();
    s.add_entry(draft(Day::Tuesday, "09:00-10:00", "T1", "R1", "G3"))
        .unwrap();
    s.add_entry(draft(Day::Monday, "09:00-10:00", "T2", "R3", "G2"))
        .unwrap();

    let by_instructor = EntryFilter {
        instructor_id: Some("T1".into()),
        ..Default::default()
    };
    assert_eq!(s.list_entries(&by_instructor).len(), 3);

    let monday_t1 = EntryFilter {
        day: Some(Day::Monday),
        instructor_id: Some("T1".into()),
        ..Default::default()
    };
    assert_eq!(s.list_entries(&monday_t1).len(), 2);

    let slot_and_group = EntryFilter {
        time_slot: Some("09:00-10:00".parse().unwrap()),
        student_group_id: Some("G2".into()),
        ..Default::default()
    };
    let hits = s.list_entries(&slot_and_group);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].instructor_id, "T2");

    let by_room = EntryFilter {
        room_id: Some("R9".into()),
        ..Default::default()
    };
    assert!(s.list_entries(&by_room).is_empty());
}

#[test]
fn invariant_holds_across_many_mutations() {
    let s = scheduler();
    let days = [Day::Monday, Day::Tuesday];
    let slots = ["08:00-09:00", "09:00-10:00"];

    // Small resource pools force frequent clashes.
    let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
    let mut next = |n: u64| {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed % n) as usize
    };

    let mut accepted = 0;
    for _ in 0..400 {
        let d = draft(
            days[next(2)],
            slots[next(2)],
            &format!("T{}", next(4)),
            &format!("R{}", next(4)),
            &format!("G{}", next(4)),
        );
        if s.add_entry(d).is_ok() {
            accepted += 1;
        }

        let current = s.list_entries(&EntryFilter::default());
        if !current.is_empty() {
            let target = &current[next(current.len() as u64)];
            let patch = EntryPatch {
                time_slot: Some(slots[next(2)].parse().unwrap()),
                room_id: Some(format!("R{}", next(4))),
                ..Default::default()
            };
            let _ = s.update_entry(&target.id, patch);
        }
        if next(10) == 0 && !current.is_empty() {
            let _ = s.delete_entry(&current[0].id);
        }

        assert_no_double_booking(&s.list_entries(&EntryFilter::default()));
    }

    assert!(accepted > 0);
    assert!(s.audit().is_empty());
}

#[test]
fn failed_save_leaves_routine_unchanged() {
    let storage = Arc::new(MemoryPersistence::new());
    let s = scheduler_with(storage.clone());
    let e = s
        .add_entry(draft(Day::Monday, "09:00-10:00", "T1", "R1", "G1"))
        .unwrap();

    storage.fail_saves(true);
    let add = s.add_entry(draft(Day::Monday, "10:00-11:00", "T1", "R1", "G1"));
    assert!(matches!(add, Err(SchedulerError::Persistence(_))));

    let patch = EntryPatch {
        room_id: Some("R2".into()),
        ..Default::default()
    };
    assert_eq!(
        s.update_entry(&e.id, patch).unwrap_err().code(),
        "PERSISTENCE_ERROR"
    );
    assert!(s.delete_entry(&e.id).is_err());

    assert_eq!(s.list_entries(&EntryFilter::default()), vec![e.clone()]);
    assert_eq!(storage.load(CATEGORY).unwrap(), vec![e]);

    storage.fail_saves(false);
    s.add_entry(draft(Day::Monday, "10:00-11:00", "T1", "R1", "G1"))
        .unwrap();
    assert_eq!(storage.load(CATEGORY).unwrap().len(), 2);
}

#[test]
fn routine_survives_restart() {
    let storage = Arc::new(MemoryPersistence::new());
    let saved = {
        let s = scheduler_with(storage.clone());
        let e = s
            .add_entry(draft(Day::Wednesday, "14:00-15:00", "T1", "R1", "G1"))
            .unwrap();
        s.add_entry(draft(Day::Thursday, "14:00-15:00", "T1", "R1", "G1"))
            .unwrap();
        s.delete_entry(&e.id).unwrap();
        s.list_entries(&EntryFilter::default())
    };

    let reopened = scheduler_with(storage);
    assert_eq!(reopened.list_entries(&EntryFilter::default()), saved);
    // Loaded entries still take part in clash detection.
    assert!(reopened
        .add_entry(draft(Day::Thursday, "14:00-15:00", "T9", "R1", "G9"))
        .is_err());
}

#[test]
fn sqlite_routine_survives_restart() {
    let path = std::env::temp_dir().join(format!(
        "timetable-{}.db",
        uuid::Uuid::now_v7().simple()
    ));

    let added = {
        let storage = Arc::new(SqlitePersistence::open(&path).unwrap());
        let s = scheduler_with(storage);
        let mut d = draft(Day::Monday, "08:00-09:00", "T1", "R1", "G1");
        d.course_id = Some("MAT-201".into());
        s.add_entry(d).unwrap()
    };

    let storage = Arc::new(SqlitePersistence::open(&path).unwrap());
    let s = scheduler_with(storage);
    assert_eq!(s.get_entry(&added.id).unwrap(), added);

    drop(s);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn legacy_clashes_are_loaded_and_audited() {
    let storage = Arc::new(MemoryPersistence::new());
    {
        let s = scheduler_with(storage.clone());
        s.add_entry(draft(Day::Monday, "09:00-10:00", "T1", "R1", "G1"))
            .unwrap();
    }
    // Simulate data written before clashes were enforced.
    let mut legacy = storage.load(CATEGORY).unwrap();
    let mut dup = legacy[0].clone();
    dup.id = "re_legacy".into();
    dup.instructor_id = "T7".into();
    legacy.push(dup);
    storage.save(CATEGORY, &legacy).unwrap();

    let s = scheduler_with(storage);
    let pairs = s.audit();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].second_id, "re_legacy");
    assert_eq!(
        pairs[0].resources,
        vec![ResourceKind::Room, ResourceKind::StudentGroup]
    );

    // The legacy entry can still be repaired by moving it.
    let fix = EntryPatch {
        room_id: Some("R2".into()),
        student_group_id: Some("G2".into()),
        ..Default::default()
    };
    s.update_entry("re_legacy", fix).unwrap();
    assert!(s.audit().is_empty());
}

#[test]
fn concurrent_clashing_adds_admit_exactly_one() {
    let s = scheduler();
    let results: Vec<bool> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let s = &s;
                scope.spawn(move || {
                    // Every writer books room R1 into the same slot.
                    s.add_entry(draft(
                        Day::Monday,
                        "09:00-10:00",
                        &format!("T{i}"),
                        "R1",
                        &format!("G{i}"),
                    ))
                    .is_ok()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(s.len(), 1);
}

#[test]
fn dry_run_matches_commit_outcome() {
    let s = scheduler();
    s.add_entry(draft(Day::Monday, "09:00-10:00", "T1", "R1", "G1"))
        .unwrap();

    let candidate = draft(Day::Monday, "09:00-10:00", "T1", "R2", "G2");
    let dry = s.check_entry(candidate.clone(), None).unwrap();
    assert!(matches!(dry, ConflictResult::Conflict(ref c) if c.resources == vec![ResourceKind::Instructor]));
    assert!(s.add_entry(candidate).is_err());
}
