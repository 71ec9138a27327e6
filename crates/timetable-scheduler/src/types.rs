use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use timetable_core::{Day, TimeSlot};

/// A resource that cannot be double-booked within one day and slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Instructor,
    Room,
    StudentGroup,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Instructor => "instructor",
            ResourceKind::Room => "room",
            ResourceKind::StudentGroup => "student_group",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled teaching session in the class routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// `re_` + simple UUIDv7, assigned on commit.
    pub id: String,
    pub day: Day,
    pub time_slot: TimeSlot,
    pub instructor_id: String,
    pub room_id: String,
    pub student_group_id: String,
    /// Opaque course reference, carried but never interpreted.
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Free-form payload from the presentation layer.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    /// RFC3339 creation timestamp.
    pub created_at: String,
    /// RFC3339 timestamp of the last committed update.
    pub updated_at: String,
}

impl ScheduleEntry {
    /// The booking footprint the conflict checker compares.
    pub fn as_candidate(&self) -> Candidate<'_> {
        Candidate {
            day: self.day,
            time_slot: self.time_slot,
            instructor_id: &self.instructor_id,
            room_id: &self.room_id,
            student_group_id: &self.student_group_id,
        }
    }
}

/// A day/slot booking of three resources, borrowed from an entry or a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub day: Day,
    pub time_slot: TimeSlot,
    pub instructor_id: &'a str,
    pub room_id: &'a str,
    pub student_group_id: &'a str,
}

impl Candidate<'_> {
    pub fn same_slot(&self, other: &Candidate<'_>) -> bool {
        self.day == other.day && self.time_slot == other.time_slot
    }

    /// Resources booked by both, in instructor, room, group order.
    pub fn shared_resources(&self, other: &Candidate<'_>) -> Vec<ResourceKind> {
        let mut shared = Vec::new();
        if self.instructor_id == other.instructor_id {
            shared.push(ResourceKind::Instructor);
        }
        if self.room_id == other.room_id {
            shared.push(ResourceKind::Room);
        }
        if self.student_group_id == other.student_group_id {
            shared.push(ResourceKind::StudentGroup);
        }
        shared
    }
}

/// Input for `add_entry`.
///
/// Every field is optional so a missing one is reported as a validation
/// error naming that field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEntry {
    pub day: Option<Day>,
    pub time_slot: Option<TimeSlot>,
    pub instructor_id: Option<String>,
    pub room_id: Option<String>,
    pub student_group_id: Option<String>,
    pub course_id: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Partial update for `update_entry`. Absent fields keep their stored value.
///
/// An empty `course_id` or `description` clears it; `attributes`, when
/// present, replaces the stored object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryPatch {
    pub day: Option<Day>,
    pub time_slot: Option<TimeSlot>,
    pub instructor_id: Option<String>,
    pub room_id: Option<String>,
    pub student_group_id: Option<String>,
    pub course_id: Option<String>,
    pub description: Option<String>,
    pub attributes: Option<Map<String, Value>>,
}

/// AND-combined criteria for `list_entries`. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFilter {
    pub day: Option<Day>,
    pub time_slot: Option<TimeSlot>,
    pub instructor_id: Option<String>,
    pub room_id: Option<String>,
    pub student_group_id: Option<String>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &ScheduleEntry) -> bool {
        self.day.map_or(true, |d| entry.day == d)
            && self.time_slot.map_or(true, |s| entry.time_slot == s)
            && self
                .instructor_id
                .as_deref()
                .map_or(true, |id| entry.instructor_id == id)
            && self.room_id.as_deref().map_or(true, |id| entry.room_id == id)
            && self
                .student_group_id
                .as_deref()
                .map_or(true, |id| entry.student_group_id == id)
    }
}

/// The stored entry that rejected a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub entry_id: String,
    /// Every resource the two share, in instructor, room, group order.
    pub resources: Vec<ResourceKind>,
}

/// Outcome of a conflict check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConflictResult {
    NoConflict,
    Conflict(Conflict),
}

impl ConflictResult {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ConflictResult::Conflict(_))
    }
}

/// Two stored entries that violate the no-double-booking invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPair {
    pub first_id: String,
    pub second_id: String,
    pub day: Day,
    pub time_slot: TimeSlot,
    pub resources: Vec<ResourceKind>,
}
