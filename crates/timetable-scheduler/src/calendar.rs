use serde::Serialize;
use timetable_core::RoutineConfig;

use crate::error::{Result, SchedulerError};
use crate::types::{Day, TimeSlot};

/// The days and time slots a routine entry may be booked into.
///
/// Slots never overlap, so two entries clash in time exactly when their
/// slots are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotCalendar {
    days: Vec<Day>,
    time_slots: Vec<TimeSlot>,
}

impl SlotCalendar {
    /// Validate and build a calendar.
    ///
    /// Days must be non-empty and unique; slots must be non-empty, ascending
    /// and non-overlapping.
    pub fn new(days: Vec<Day>, time_slots: Vec<TimeSlot>) -> Result<Self> {
        if days.is_empty() {
            return Err(SchedulerError::Calendar("no teaching days configured".into()));
        }
        for (i, day) in days.iter().enumerate() {
            if days[..i].contains(day) {
                return Err(SchedulerError::Calendar(format!("day '{day}' listed twice")));
            }
        }

        if time_slots.is_empty() {
            return Err(SchedulerError::Calendar("no time slots configured".into()));
        }
        for pair in time_slots.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.overlaps(next) {
                return Err(SchedulerError::Calendar(format!(
                    "slot {next} overlaps {prev}"
                )));
            }
            if next < prev {
                return Err(SchedulerError::Calendar(format!(
                    "slot {next} is listed after {prev}"
                )));
            }
        }

        Ok(Self { days, time_slots })
    }

    pub fn from_config(cfg: &RoutineConfig) -> Result<Self> {
        Self::new(cfg.days.clone(), cfg.time_slots.clone())
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn time_slots(&self) -> &[TimeSlot] {
        &self.time_slots
    }

    pub fn has_day(&self, day: Day) -> bool {
        self.days.contains(&day)
    }

    pub fn has_slot(&self, slot: TimeSlot) -> bool {
        self.time_slots.contains(&slot)
    }
}

impl Default for SlotCalendar {
    fn default() -> Self {
        let cfg = RoutineConfig::default();
        Self {
            days: cfg.days,
            time_slots: cfg.time_slots,
        }
    }
}
