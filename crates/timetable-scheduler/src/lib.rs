//! `timetable-scheduler`: class routine with double-booking prevention.
//!
//! # Overview
//!
//! A [`RoutineScheduler`] owns the routine for one planning horizon. Each
//! entry books an instructor, a room and a student group into a day and time
//! slot; none of the three may be booked twice into the same day and slot.
//!
//! | Operation      | Checks                                   | Fails with                |
//! |----------------|------------------------------------------|---------------------------|
//! | `add_entry`    | calendar, required fields, clashes       | `Validation`, `Conflict`  |
//! | `update_entry` | merged entry against all others          | `NotFound`, `Conflict`    |
//! | `delete_entry` | existence only                           | `NotFound`                |
//! | `list_entries` | none (snapshot read)                     | never                     |
//!
//! Any mutation may also fail with `Persistence`, in which case the routine
//! is unchanged.

pub mod calendar;
pub mod conflict;
pub mod db;
pub mod error;
pub mod persist;
pub mod service;
pub mod store;
pub mod types;

pub use calendar::SlotCalendar;
pub use error::{PersistenceError, Result, SchedulerError};
pub use persist::{MemoryPersistence, Persistence, SqlitePersistence};
pub use service::RoutineScheduler;
pub use types::{
    Conflict, ConflictPair, ConflictResult, Day, EntryFilter, EntryPatch, NewEntry, ResourceKind,
    ScheduleEntry, TimeSlot,
};
