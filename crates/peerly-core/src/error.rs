use thiserror::Error;

use crate::booking::{BookingId, BookingStatus};
use crate::tutor::{SlotId, TutorId};
use crate::workflow::AttemptId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Tutor not found: {0}")]
    TutorNotFound(TutorId),

    #[error("Tutor {tutor_id} does not teach subject '{subject}'")]
    InvalidSubject { tutor_id: TutorId, subject: String },

    #[error("Tutor {0} is not accepting students")]
    TutorNotAccepting(TutorId),

    #[error("Slot not found: {0}")]
    SlotNotFound(SlotId),

    #[error("Slot {slot_id} is full ({capacity} seats taken)")]
    SlotFull { slot_id: SlotId, capacity: u32 },

    #[error("Booking attempt is {found}, expected {expected}")]
    AttemptStateMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Booking attempt not found: {0}")]
    AttemptNotFound(AttemptId),

    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    #[error("Cannot {action} a booking that is {status}")]
    InvalidTransition {
        action: &'static str,
        status: BookingStatus,
    },

    #[error("Invalid directory: {0}")]
    InvalidDirectory(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::TutorNotFound(_) => "tutor_not_found",
            Error::InvalidSubject { .. } => "invalid_subject",
            Error::TutorNotAccepting(_) => "tutor_not_accepting",
            Error::SlotNotFound(_) => "slot_not_found",
            Error::SlotFull { .. } => "slot_full",
            Error::AttemptStateMismatch { .. } => "attempt_state_mismatch",
            Error::AttemptNotFound(_) => "attempt_not_found",
            Error::BookingNotFound(_) => "booking_not_found",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::InvalidDirectory(_) => "invalid_directory",
            Error::InvalidValue(_) => "invalid_value",
            Error::Io(_) => "io",
            Error::Serialization(_) => "serialization",
            Error::Other(_) => "other",
        }
    }

    /// Lost a race for the last seat; the caller should offer other slots.
    pub fn is_booking_conflict(&self) -> bool {
        matches!(self, Error::SlotFull { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
