//! `timetable-core`: vocabulary and configuration shared by the timetable crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{RoutineConfig, TimetableConfig};
pub use error::{Result, TimetableError};
pub use types::{Day, TimeSlot};
