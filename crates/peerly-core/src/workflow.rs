//! Booking attempt state machine
//!
//! ```text
//! SubjectPending --select_subject--> SlotPending --select_slot--> ReviewPending
//!                                                                      |
//!                                                   commit (ledger) ---+--> Committed
//! any pre-commit state --abort--> Aborted
//! ```
//!
//! Each state carries exactly the selections made so far, so a commit can
//! only ever see a chosen subject and slot. Capacity is touched once, at
//! commit; nothing before it has side effects to unwind.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::booking::{BookingId, BookingRecord, BookingStatus};
use crate::ledger::CapacityLedger;
use crate::tutor::{string_id, SlotId, StudentId, TimeSlot, Tutor, TutorId};
use crate::{Error, Result};

string_id!(
    /// Handle a caller keeps for one booking attempt
    AttemptId
);

impl AttemptId {
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttemptState {
    SubjectPending,
    SlotPending {
        subject_code: String,
    },
    ReviewPending {
        subject_code: String,
        slot: TimeSlot,
    },
    Committed {
        booking_id: BookingId,
        status: BookingStatus,
    },
    Aborted,
}

impl AttemptState {
    pub fn name(&self) -> &'static str {
        match self {
            AttemptState::SubjectPending => "subject_pending",
            AttemptState::SlotPending { .. } => "slot_pending",
            AttemptState::ReviewPending { .. } => "review_pending",
            AttemptState::Committed { .. } => "committed",
            AttemptState::Aborted => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptState::Committed { .. } | AttemptState::Aborted)
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One student's walk from picking a tutor to a committed booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingAttempt {
    pub id: AttemptId,
    pub student_id: StudentId,
    pub tutor_id: TutorId,
    pub state: AttemptState,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub updated_at: OffsetDateTime,
}

impl BookingAttempt {
    pub fn new(student_id: StudentId, tutor_id: TutorId) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: AttemptId::generate(),
            student_id,
            tutor_id,
            state: AttemptState::SubjectPending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn subject_code(&self) -> Option<&str> {
        match &self.state {
            AttemptState::SlotPending { subject_code } | AttemptState::ReviewPending { subject_code, .. } => {
                Some(subject_code)
            }
            _ => None,
        }
    }

    pub fn selected_slot(&self) -> Option<&TimeSlot> {
        match &self.state {
            AttemptState::ReviewPending { slot, .. } => Some(slot),
            _ => None,
        }
    }

    /// SubjectPending -> SlotPending.
    ///
    /// On failure the attempt stays in `SubjectPending`.
    pub fn select_subject(&mut self, tutor: &Tutor, subject_code: &str) -> Result<()> {
        if !matches!(self.state, AttemptState::SubjectPending) {
            return Err(self.mismatch("subject_pending"));
        }
        self.check_tutor(tutor)?;

        let subject_code = subject_code.trim();
        if !tutor.accepting_students {
            return Err(Error::TutorNotAccepting(tutor.id.clone()));
        }
        if subject_code.is_empty() || !tutor.teaches(subject_code) {
            return Err(Error::InvalidSubject {
                tutor_id: tutor.id.clone(),
                subject: subject_code.to_string(),
            });
        }

        self.advance(AttemptState::SlotPending {
            subject_code: subject_code.to_string(),
        });
        Ok(())
    }

    /// SlotPending -> ReviewPending.
    ///
    /// Also allowed from `ReviewPending` to pick a different slot before
    /// confirming; no capacity has been taken yet, so this is free.
    pub fn select_slot(&mut self, tutor: &Tutor, slot_id: &SlotId) -> Result<()> {
        let subject_code = match &self.state {
            AttemptState::SlotPending { subject_code } | AttemptState::ReviewPending { subject_code, .. } => {
                subject_code.clone()
            }
            _ => return Err(self.mismatch("slot_pending")),
        };
        self.check_tutor(tutor)?;

        let slot = tutor
            .published_slot(slot_id)
            .ok_or_else(|| Error::SlotNotFound(slot_id.clone()))?;

        self.advance(AttemptState::ReviewPending {
            subject_code,
            slot: slot.clone(),
        });
        Ok(())
    }

    /// ReviewPending -> Committed.
    ///
    /// Takes a seat from the ledger and produces the booking record. When
    /// the slot is full the attempt stays in `ReviewPending` so the student
    /// can pick another slot.
    pub fn commit(&mut self, ledger: &CapacityLedger) -> Result<BookingRecord> {
        let AttemptState::ReviewPending { subject_code, slot } = &self.state else {
            return Err(self.mismatch("review_pending"));
        };

        let reservation = ledger.try_reserve(&slot.id)?;
        let record = BookingRecord::new(
            self.tutor_id.clone(),
            self.student_id.clone(),
            subject_code.clone(),
            slot.id.clone(),
            slot.requires_approval,
        );

        info!(
            attempt = %self.id,
            booking = %record.id,
            slot = %record.slot_id,
            status = %record.status,
            seat = reservation.committed,
            capacity = reservation.capacity,
            "booking committed"
        );

        self.advance(AttemptState::Committed {
            booking_id: record.id.clone(),
            status: record.status,
        });
        Ok(record)
    }

    /// Committed -> ReviewPending, for a commit whose record never reached
    /// the booking store. The seat goes back to the ledger and the attempt
    /// can be committed again.
    pub fn revert_commit(
        &mut self,
        ledger: &CapacityLedger,
        record: &BookingRecord,
        slot: TimeSlot,
    ) -> Result<()> {
        match &self.state {
            AttemptState::Committed { booking_id, .. } if *booking_id == record.id => {}
            _ => return Err(self.mismatch("committed")),
        }
        if slot.id != record.slot_id {
            return Err(Error::SlotNotFound(slot.id));
        }

        let committed = ledger.release(&record.slot_id)?;
        debug!(attempt = %self.id, booking = %record.id, committed, "commit reverted");
        self.advance(AttemptState::ReviewPending {
            subject_code: record.subject_code.clone(),
            slot,
        });
        Ok(())
    }

    /// Any pre-commit state -> Aborted. Never touches the ledger.
    ///
    /// A committed attempt cannot be aborted; its booking is cancelled
    /// through the booking record instead.
    pub fn abort(&mut self) -> Result<()> {
        match self.state {
            AttemptState::Committed { .. } => Err(self.mismatch("a pre-commit state")),
            AttemptState::Aborted => Ok(()),
            _ => {
                self.advance(AttemptState::Aborted);
                Ok(())
            }
        }
    }

    fn check_tutor(&self, tutor: &Tutor) -> Result<()> {
        if tutor.id != self.tutor_id {
            return Err(Error::TutorNotFound(self.tutor_id.clone()));
        }
        Ok(())
    }

    fn advance(&mut self, next: AttemptState) {
        debug!(attempt = %self.id, from = %self.state, to = %next, "attempt transition");
        self.state = next;
        self.updated_at = OffsetDateTime::now_utc();
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::AttemptStateMismatch {
            expected,
            found: self.state.name(),
        }
    }
}
