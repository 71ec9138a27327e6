use thiserror::Error;

use crate::types::{Conflict, ResourceKind};

/// Failures reported by the persistence collaborator.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Underlying SQLite / rusqlite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The stored payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend refused the write (e.g. storage offline).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The candidate shares a resource with an entry in the same day and slot.
    #[error("clash with entry {entry_id} on {}", describe(.resources))]
    Conflict {
        entry_id: String,
        resources: Vec<ResourceKind>,
    },

    /// No entry with the given ID exists in the store.
    #[error("routine entry not found: {id}")]
    NotFound { id: String },

    /// A candidate field is missing or outside the slot calendar.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Storage rejected the write; the in-memory routine is unchanged.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// The configured days / time slots are unusable.
    #[error("invalid slot calendar: {0}")]
    Calendar(String),
}

impl SchedulerError {
    /// Short error code string returned to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::Conflict { .. } => "CONFLICT",
            SchedulerError::NotFound { .. } => "NOT_FOUND",
            SchedulerError::Validation { .. } => "VALIDATION_ERROR",
            SchedulerError::Persistence(_) => "PERSISTENCE_ERROR",
            SchedulerError::Calendar(_) => "CALENDAR_ERROR",
        }
    }

    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        SchedulerError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<Conflict> for SchedulerError {
    fn from(c: Conflict) -> Self {
        SchedulerError::Conflict {
            entry_id: c.entry_id,
            resources: c.resources,
        }
    }
}

fn describe(resources: &[ResourceKind]) -> String {
    resources
        .iter()
        .map(ResourceKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
