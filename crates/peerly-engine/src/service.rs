//! Query surface over the directory snapshot, the ledger and the stores

use std::sync::Arc;

use peerly_core::{
    AttemptId, Availability, BookingAction, BookingAttempt, BookingId, BookingRecord,
    CapacityLedger, Error, FilterCriteria, Notification, Result, SlotId, StudentId, TimeSlot, Tutor,
    TutorDirectory, TutorId,
};
use peerly_storage::BookingStore;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::attempts::AttemptRegistry;
use crate::notify::Notifier;

pub struct BookingService {
    directory: RwLock<Arc<TutorDirectory>>,
    ledger: Arc<CapacityLedger>,
    attempts: AttemptRegistry,
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    default_capacity: u32,
}

impl BookingService {
    pub fn new(
        directory: TutorDirectory,
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        default_capacity: u32,
    ) -> Self {
        let ledger = CapacityLedger::from_directory(&directory, default_capacity);
        info!(
            tutors = directory.len(),
            slots = ledger.len(),
            default_capacity,
            "booking service ready"
        );
        Self {
            directory: RwLock::new(Arc::new(directory)),
            ledger: Arc::new(ledger),
            attempts: AttemptRegistry::new(),
            store,
            notifier,
            default_capacity,
        }
    }

    /// Current directory snapshot
    pub async fn directory(&self) -> Arc<TutorDirectory> {
        self.directory.read().await.clone()
    }

    /// Swap in a fresh snapshot. Committed seat counts survive the swap.
    pub async fn replace_directory(&self, directory: TutorDirectory) {
        self.ledger.sync(&directory, self.default_capacity);
        let tutors = directory.len();
        *self.directory.write().await = Arc::new(directory);
        info!(tutors, slots = self.ledger.len(), "directory snapshot replaced");
    }

    pub fn ledger(&self) -> &CapacityLedger {
        &self.ledger
    }

    /// Filter, then order by rating when the criteria ask for it
    pub async fn search(&self, criteria: &FilterCriteria) -> Vec<Arc<Tutor>> {
        let directory = self.directory().await;
        let matches = peerly_core::search(&directory, criteria);
        peerly_core::rank(matches, criteria.use_recommendation)
    }

    pub async fn tutor(&self, tutor_id: &TutorId) -> Result<Arc<Tutor>> {
        let directory = self.directory().await;
        directory.get_tutor(tutor_id).cloned()
    }

    pub fn availability(&self, slot_id: &SlotId) -> Result<Availability> {
        self.ledger.availability(slot_id)
    }

    // ========================================================================
    // Booking attempts
    // ========================================================================

    /// Start an attempt with the subject already chosen.
    ///
    /// Nothing is registered when the subject is rejected, and the
    /// student's existing attempt stays in place. On success that existing
    /// attempt is dropped without being touched.
    pub async fn begin_booking(
        &self,
        student_id: StudentId,
        tutor_id: &TutorId,
        subject_code: &str,
    ) -> Result<BookingAttempt> {
        let tutor = self.tutor(tutor_id).await?;
        let mut attempt = BookingAttempt::new(student_id, tutor_id.clone());
        attempt.select_subject(&tutor, subject_code)?;

        debug!(attempt = %attempt.id, student = %attempt.student_id, tutor = %tutor_id, "attempt started");
        self.attempts.insert(attempt.clone());
        Ok(attempt)
    }

    pub fn attempt(&self, attempt_id: &AttemptId) -> Result<BookingAttempt> {
        self.attempts.get(attempt_id)
    }

    pub async fn select_slot(&self, attempt_id: &AttemptId, slot_id: &SlotId) -> Result<BookingAttempt> {
        let tutor_id = self.attempts.get(attempt_id)?.tutor_id;
        let tutor = self.tutor(&tutor_id).await?;
        self.attempts.update(attempt_id, |attempt| {
            attempt.select_slot(&tutor, slot_id)?;
            Ok(attempt.clone())
        })
    }

    /// Commit the attempt, then persist and notify.
    ///
    /// The chosen slot must still be published in the current directory
    /// snapshot. The seat is taken before anything leaves the process. When
    /// the record cannot be stored the seat is released and the attempt goes
    /// back to `ReviewPending`, so the caller can commit again. A
    /// notification failure is only logged.
    pub async fn commit(&self, attempt_id: &AttemptId) -> Result<BookingRecord> {
        let directory = self.directory().await;
        let (record, slot) = self.attempts.update(attempt_id, |attempt| {
            let slot = attempt.selected_slot().cloned();
            if let Some(slot) = &slot {
                let offered = directory
                    .tutor(&attempt.tutor_id)
                    .is_some_and(|tutor| tutor.published_slot(&slot.id).is_some());
                if !offered {
                    return Err(Error::SlotNotFound(slot.id.clone()));
                }
            }
            let record = attempt.commit(&self.ledger)?;
            Ok((record, slot))
        })?;

        if let Err(e) = self.store.insert(&record).await {
            error!(booking = %record.id, slot = %record.slot_id, "failed to persist booking: {}", e);
            if let Some(slot) = slot {
                self.revert_commit(attempt_id, &record, slot);
            }
            return Err(e.into());
        }

        self.notify(Notification::for_commit(&record)).await;
        Ok(record)
    }

    fn revert_commit(&self, attempt_id: &AttemptId, record: &BookingRecord, slot: TimeSlot) {
        let reverted = self
            .attempts
            .update(attempt_id, |attempt| attempt.revert_commit(&self.ledger, record, slot));
        match reverted {
            Ok(()) => {}
            // Replaced by a newer attempt; the seat still has to go back
            Err(Error::AttemptNotFound(_)) => {
                if let Err(e) = self.ledger.release(&record.slot_id) {
                    warn!(slot = %record.slot_id, "failed to release seat: {}", e);
                }
            }
            Err(e) => warn!(attempt = %attempt_id, "failed to revert commit: {}", e),
        }
    }

    /// Drop a pre-commit attempt. No seat is involved.
    pub fn abort(&self, attempt_id: &AttemptId) -> Result<()> {
        self.attempts.update(attempt_id, |attempt| attempt.abort())?;
        self.attempts.remove(attempt_id)?;
        debug!(attempt = %attempt_id, "attempt aborted");
        Ok(())
    }

    // ========================================================================
    // Booking records
    // ========================================================================

    pub async fn booking(&self, booking_id: &BookingId) -> Result<BookingRecord> {
        Ok(self.store.get(booking_id).await?)
    }

    pub async fn bookings_for_student(&self, student_id: &StudentId) -> Result<Vec<BookingRecord>> {
        Ok(self.store.list_for_student(student_id).await?)
    }

    pub async fn bookings_for_tutor(&self, tutor_id: &TutorId) -> Result<Vec<BookingRecord>> {
        Ok(self.store.list_for_tutor(tutor_id).await?)
    }

    pub async fn approve(&self, booking_id: &BookingId) -> Result<BookingRecord> {
        self.apply(booking_id, BookingAction::Approve).await
    }

    pub async fn decline(&self, booking_id: &BookingId) -> Result<BookingRecord> {
        self.apply(booking_id, BookingAction::Decline).await
    }

    pub async fn cancel(&self, booking_id: &BookingId) -> Result<BookingRecord> {
        self.apply(booking_id, BookingAction::Cancel).await
    }

    async fn apply(&self, booking_id: &BookingId, action: BookingAction) -> Result<BookingRecord> {
        let record = self.store.apply(booking_id, action).await?;
        if action.releases_seat() {
            let committed = self.ledger.release(&record.slot_id)?;
            debug!(slot = %record.slot_id, committed, "seat released");
        }

        info!(booking = %record.id, %action, status = %record.status, "booking updated");
        self.notify(Notification::new(action.notification_kind(), &record)).await;
        Ok(record)
    }

    async fn notify(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!(
                kind = ?notification.kind,
                booking = %notification.booking_id,
                "notification failed: {}", e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::BroadcastNotifier;
    use peerly_core::{AttemptState, BookingStatus, NotificationKind, Recipient};
    use peerly_storage::MemoryBookingStore;

    const FEED: &str = r#"{
        "tutors": [
            {
                "id": "t1",
                "name": "Nguyen Van A",
                "staff_id": "2012345",
                "subjects": ["MT2013", "CO1005"],
                "max_students": 10,
                "current_students": 3,
                "rating": 4.5,
                "slots": [
                    {
                        "id": "s1",
                        "weekday": "Monday",
                        "start": "14:00",
                        "end": "16:00",
                        "mode": "online",
                        "meeting_link": "https://meet.example.edu/t1"
                    },
                    {
                        "id": "s2",
                        "weekday": "Wednesday",
                        "start": "09:00",
                        "end": "11:00",
                        "mode": "offline",
                        "location": "H6-301",
                        "capacity": 2,
                        "requires_approval": true
                    }
                ]
            },
            {
                "id": "t2",
                "name": "Tran Thi B",
                "staff_id": "2054321",
                "subjects": ["MT2013"],
                "accepting_students": false,
                "max_students": 5,
                "current_students": 5,
                "rating": 4.9,
                "slots": []
            }
        ]
    }"#;

    fn service() -> (BookingService, BroadcastNotifier) {
        let directory = TutorDirectory::from_json(FEED).unwrap();
        let notifier = BroadcastNotifier::new(16);
        let service = BookingService::new(
            directory,
            Arc::new(MemoryBookingStore::new()),
            Arc::new(notifier.clone()),
            1,
        );
        (service, notifier)
    }

    #[tokio::test]
    async fn test_search_ranks_when_recommended() {
        let (service, _) = service();
        let plain = service.search(&FilterCriteria::new().with_subject("MT2013")).await;
        let ids: Vec<&str> = plain.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);

        let ranked = service
            .search(&FilterCriteria::new().with_subject("MT2013").with_recommendation(true))
            .await;
        let ids: Vec<&str> = ranked.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t1"]);
    }

    #[tokio::test]
    async fn test_commit_persists_and_notifies() {
        let (service, notifier) = service();
        let mut rx = notifier.subscribe();

        let attempt = service
            .begin_booking(StudentId::new("st1"), &TutorId::new("t1"), "MT2013")
            .await
            .unwrap();
        service.select_slot(&attempt.id, &SlotId::new("s1")).await.unwrap();
        let record = service.commit(&attempt.id).await.unwrap();

        assert_eq!(record.status, BookingStatus::Confirmed);
        assert_eq!(service.booking(&record.id).await.unwrap().id, record.id);
        assert!(matches!(
            service.attempt(&attempt.id).unwrap().state,
            AttemptState::Committed { .. }
        ));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, NotificationKind::BookingConfirmed);
        assert_eq!(event.recipients.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_subject_registers_nothing() {
        let (service, _) = service();
        let err = service
            .begin_booking(StudentId::new("st1"), &TutorId::new("t2"), "MT2013")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TutorNotAccepting(_)));

        let err = service
            .begin_booking(StudentId::new("st1"), &TutorId::new("t1"), "PH1003")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSubject { .. }));

        let err = service
            .begin_booking(StudentId::new("st1"), &TutorId::new("t9"), "MT2013")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TutorNotFound(_)));
        assert!(service.attempts.is_empty());
    }

    #[tokio::test]
    async fn test_approval_flow_releases_on_decline() {
        let (service, notifier) = service();
        let mut rx = notifier.subscribe();
        let slot = SlotId::new("s2");

        let attempt = service
            .begin_booking(StudentId::new("st1"), &TutorId::new("t1"), "CO1005")
            .await
            .unwrap();
        service.select_slot(&attempt.id, &slot).await.unwrap();
        let record = service.commit(&attempt.id).await.unwrap();
        assert_eq!(record.status, BookingStatus::PendingApproval);
        assert_eq!(service.availability(&slot).unwrap().committed, 1);

        let requested = rx.recv().await.unwrap();
        assert_eq!(requested.kind, NotificationKind::ApprovalRequested);
        assert_eq!(requested.recipients, vec![Recipient::Tutor(TutorId::new("t1"))]);

        let declined = service.decline(&record.id).await.unwrap();
        assert_eq!(declined.status, BookingStatus::Declined);
        assert_eq!(service.availability(&slot).unwrap().committed, 0);
        assert_eq!(rx.recv().await.unwrap().kind, NotificationKind::BookingDeclined);

        // declined is final
        let err = service.cancel(&record.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(service.availability(&slot).unwrap().committed, 0);
    }

    #[tokio::test]
    async fn test_abort_removes_attempt() {
        let (service, _) = service();
        let attempt = service
            .begin_booking(StudentId::new("st1"), &TutorId::new("t1"), "MT2013")
            .await
            .unwrap();
        service.select_slot(&attempt.id, &SlotId::new("s1")).await.unwrap();
        service.abort(&attempt.id).unwrap();

        assert!(matches!(service.attempt(&attempt.id), Err(Error::AttemptNotFound(_))));
        assert_eq!(service.availability(&SlotId::new("s1")).unwrap().committed, 0);
    }

    #[tokio::test]
    async fn test_unknown_booking() {
        let (service, _) = service();
        let err = service.approve(&BookingId::new("missing")).await.unwrap_err();
        assert!(matches!(err, Error::BookingNotFound(_)));
    }
}
