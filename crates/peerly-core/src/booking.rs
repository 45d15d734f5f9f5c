//! Booking record and notification domain model

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::tutor::{string_id, SlotId, StudentId, TutorId};
use crate::{Error, Result};

string_id!(
    /// Identifier of a committed booking
    BookingId
);

impl BookingId {
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    PendingApproval,
    Declined,
    Cancelled,
}

impl BookingStatus {
    /// Whether a booking in this status occupies a seat in its slot
    pub fn holds_seat(self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::PendingApproval)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::PendingApproval => "pending_approval",
            BookingStatus::Declined => "declined",
            BookingStatus::Cancelled => "cancelled",
        })
    }
}

/// Durable result of a committed booking attempt.
///
/// Records are never deleted; after commit they only move between statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: BookingId,
    pub tutor_id: TutorId,
    pub student_id: StudentId,
    pub subject_code: String,
    pub slot_id: SlotId,
    pub status: BookingStatus,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub updated_at: OffsetDateTime,
}

impl BookingRecord {
    pub fn new(
        tutor_id: TutorId,
        student_id: StudentId,
        subject_code: String,
        slot_id: SlotId,
        requires_approval: bool,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: BookingId::generate(),
            tutor_id,
            student_id,
            subject_code,
            slot_id,
            status: if requires_approval {
                BookingStatus::PendingApproval
            } else {
                BookingStatus::Confirmed
            },
            created_at: now,
            updated_at: now,
        }
    }

    /// Tutor accepts a pending request
    pub fn approve(&mut self) -> Result<()> {
        self.transition("approve", &[BookingStatus::PendingApproval], BookingStatus::Confirmed)
    }

    /// Tutor turns down a pending request; the seat must be released by the caller
    pub fn decline(&mut self) -> Result<()> {
        self.transition("decline", &[BookingStatus::PendingApproval], BookingStatus::Declined)
    }

    /// Either party withdraws; the seat must be released by the caller
    pub fn cancel(&mut self) -> Result<()> {
        self.transition(
            "cancel",
            &[BookingStatus::Confirmed, BookingStatus::PendingApproval],
            BookingStatus::Cancelled,
        )
    }

    pub fn apply(&mut self, action: BookingAction) -> Result<()> {
        match action {
            BookingAction::Approve => self.approve(),
            BookingAction::Decline => self.decline(),
            BookingAction::Cancel => self.cancel(),
        }
    }

    fn transition(
        &mut self,
        action: &'static str,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> Result<()> {
        if !from.contains(&self.status) {
            return Err(Error::InvalidTransition {
                action,
                status: self.status,
            });
        }
        self.status = to;
        self.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

/// Status change requested on an existing booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Approve,
    Decline,
    Cancel,
}

impl BookingAction {
    /// Declined and cancelled bookings give their seat back
    pub fn releases_seat(self) -> bool {
        matches!(self, BookingAction::Decline | BookingAction::Cancel)
    }

    pub fn notification_kind(self) -> NotificationKind {
        match self {
            BookingAction::Approve => NotificationKind::BookingApproved,
            BookingAction::Decline => NotificationKind::BookingDeclined,
            BookingAction::Cancel => NotificationKind::BookingCancelled,
        }
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BookingAction::Approve => "approve",
            BookingAction::Decline => "decline",
            BookingAction::Cancel => "cancel",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingConfirmed,
    ApprovalRequested,
    BookingApproved,
    BookingDeclined,
    BookingCancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Recipient {
    Tutor(TutorId),
    Student(StudentId),
}

/// Event handed to the messaging service after a booking changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub booking_id: BookingId,
    pub slot_id: SlotId,
    pub recipients: Vec<Recipient>,
}

impl Notification {
    /// An approval request only goes to the tutor; everything else reaches
    /// both parties.
    pub fn new(kind: NotificationKind, record: &BookingRecord) -> Self {
        let tutor = Recipient::Tutor(record.tutor_id.clone());
        let recipients = match kind {
            NotificationKind::ApprovalRequested => vec![tutor],
            _ => vec![Recipient::Student(record.student_id.clone()), tutor],
        };

        Self {
            kind,
            booking_id: record.id.clone(),
            slot_id: record.slot_id.clone(),
            recipients,
        }
    }

    /// Event raised right after a commit
    pub fn for_commit(record: &BookingRecord) -> Self {
        let kind = match record.status {
            BookingStatus::PendingApproval => NotificationKind::ApprovalRequested,
            _ => NotificationKind::BookingConfirmed,
        };
        Self::new(kind, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(requires_approval: bool) -> BookingRecord {
        BookingRecord::new(
            TutorId::new("t1"),
            StudentId::new("st1"),
            "MT2013".to_string(),
            SlotId::new("s1"),
            requires_approval,
        )
    }

    #[test]
    fn test_initial_status_follows_approval_flag() {
        assert_eq!(record(false).status, BookingStatus::Confirmed);
        assert_eq!(record(true).status, BookingStatus::PendingApproval);
    }

    #[test]
    fn test_approve_and_decline_only_from_pending() {
        let mut pending = record(true);
        pending.approve().unwrap();
        assert_eq!(pending.status, BookingStatus::Confirmed);

        let err = pending.decline().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                action: "decline",
                status: BookingStatus::Confirmed
            }
        ));

        let mut declined = record(true);
        declined.decline().unwrap();
        assert!(!declined.status.holds_seat());
        assert!(declined.cancel().is_err());
    }

    #[test]
    fn test_cancel_confirmed() {
        let mut confirmed = record(false);
        confirmed.cancel().unwrap();
        assert_eq!(confirmed.status, BookingStatus::Cancelled);
        assert!(confirmed.approve().is_err());
    }

    #[test]
    fn test_notification_recipients() {
        let pending = Notification::for_commit(&record(true));
        assert_eq!(pending.kind, NotificationKind::ApprovalRequested);
        assert_eq!(pending.recipients, vec![Recipient::Tutor(TutorId::new("t1"))]);

        let confirmed = Notification::for_commit(&record(false));
        assert_eq!(confirmed.kind, NotificationKind::BookingConfirmed);
        assert_eq!(confirmed.recipients.len(), 2);
    }

    #[test]
    fn test_apply_action() {
        let mut pending = record(true);
        pending.apply(BookingAction::Decline).unwrap();
        assert_eq!(pending.status, BookingStatus::Declined);
        assert!(BookingAction::Decline.releases_seat());
        assert!(!BookingAction::Approve.releases_seat());

        let approved = Notification::new(BookingAction::Approve.notification_kind(), &pending);
        assert_eq!(approved.kind, NotificationKind::BookingApproved);
        assert_eq!(approved.recipients.len(), 2);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&BookingStatus::PendingApproval).unwrap();
        assert_eq!(json, "\"pending_approval\"");
    }
}
