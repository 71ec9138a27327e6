use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TimetableError};

/// Day of the teaching week.
///
/// Serialised as the lowercase English name (`"monday"`). Parsing is
/// case-insensitive and also accepts three-letter abbreviations (`"Mon"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = TimetableError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        Day::ALL
            .into_iter()
            .find(|day| name == day.as_str() || name == day.as_str()[..3])
            .ok_or_else(|| TimetableError::InvalidDay(s.to_string()))
    }
}

impl TryFrom<String> for Day {
    type Error = TimetableError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Day> for String {
    fn from(day: Day) -> Self {
        day.as_str().to_string()
    }
}

/// A contiguous time range within a day, e.g. `09:00-10:00`.
///
/// The canonical label is the 24-hour `HH:MM-HH:MM` form. Labels in the
/// 12-hour `09:00 AM - 10:00 AM` form are accepted and normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeSlot {
    /// Build a slot from its bounds. `start` must be strictly before `end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(TimetableError::InvalidTimeSlot {
                label: format!("{}-{}", start.format("%H:%M"), end.format("%H:%M")),
                reason: "start must be before end".to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Canonical `HH:MM-HH:MM` label.
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// True when the two ranges share any instant (touching ends do not overlap).
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

impl FromStr for TimeSlot {
    type Err = TimetableError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| TimetableError::InvalidTimeSlot {
            label: s.to_string(),
            reason: reason.to_string(),
        };

        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| invalid("expected 'HH:MM-HH:MM'"))?;
        let start = parse_clock(start).ok_or_else(|| invalid("unreadable start time"))?;
        let end = parse_clock(end).ok_or_else(|| invalid("unreadable end time"))?;

        TimeSlot::new(start, end).map_err(|_| invalid("start must be before end"))
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = TimetableError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.to_string()
    }
}

/// Parse one side of a slot label: `14:00`, `02:00 PM` or `02:00PM`.
fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    ["%H:%M", "%I:%M %p", "%I:%M%p"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}
