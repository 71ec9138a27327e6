use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimetableError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid day: {0}")]
    InvalidDay(String),

    #[error("Invalid time slot '{label}': {reason}")]
    InvalidTimeSlot { label: String, reason: String },
}

impl TimetableError {
    /// Short error code string returned to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            TimetableError::Config(_) => "CONFIG_ERROR",
            TimetableError::InvalidDay(_) => "INVALID_DAY",
            TimetableError::InvalidTimeSlot { .. } => "INVALID_TIME_SLOT",
        }
    }
}

pub type Result<T> = std::result::Result<T, TimetableError>;
