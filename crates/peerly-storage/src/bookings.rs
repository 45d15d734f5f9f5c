//! Booking record persistence

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use peerly_core::{BookingAction, BookingId, BookingRecord, StudentId, TutorId};

use crate::{Result, StorageError};

/// Where committed booking records go.
///
/// Implementations must apply a status change atomically per record, so two
/// concurrent declines of one booking cannot both succeed.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persist a freshly committed record
    async fn insert(&self, record: &BookingRecord) -> Result<()>;

    async fn get(&self, id: &BookingId) -> Result<BookingRecord>;

    /// Apply a status change and return the updated record
    async fn apply(&self, id: &BookingId, action: BookingAction) -> Result<BookingRecord>;

    /// Records of one student, oldest first
    async fn list_for_student(&self, student_id: &StudentId) -> Result<Vec<BookingRecord>>;

    /// Records of one tutor, oldest first
    async fn list_for_tutor(&self, tutor_id: &TutorId) -> Result<Vec<BookingRecord>>;
}

/// Process-local store, used by the server and in tests
#[derive(Debug, Default)]
pub struct MemoryBookingStore {
    records: DashMap<BookingId, BookingRecord>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn collect(&self, keep: impl Fn(&BookingRecord) -> bool) -> Vec<BookingRecord> {
        let mut records: Vec<BookingRecord> = self
            .records
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        records
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn insert(&self, record: &BookingRecord) -> Result<()> {
        match self.records.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(StorageError::DuplicateBooking(record.id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: &BookingId) -> Result<BookingRecord> {
        self.records
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::BookingNotFound(id.clone()))
    }

    async fn apply(&self, id: &BookingId, action: BookingAction) -> Result<BookingRecord> {
        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| StorageError::BookingNotFound(id.clone()))?;
        entry.apply(action)?;
        Ok(entry.value().clone())
    }

    async fn list_for_student(&self, student_id: &StudentId) -> Result<Vec<BookingRecord>> {
        Ok(self.collect(|record| &record.student_id == student_id))
    }

    async fn list_for_tutor(&self, tutor_id: &TutorId) -> Result<Vec<BookingRecord>> {
        Ok(self.collect(|record| &record.tutor_id == tutor_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerly_core::{BookingStatus, SlotId};

    fn record(student: &str, tutor: &str, requires_approval: bool) -> BookingRecord {
        BookingRecord::new(
            TutorId::new(tutor),
            StudentId::new(student),
            "MT2013".to_string(),
            SlotId::new("s1"),
            requires_approval,
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryBookingStore::new();
        let record = record("st1", "t1", false);
        store.insert(&record).await.unwrap();

        let loaded = store.get(&record.id).await.unwrap();
        assert_eq!(loaded.status, BookingStatus::Confirmed);
        assert!(matches!(
            store.insert(&record).await,
            Err(StorageError::DuplicateBooking(_))
        ));
        assert!(matches!(
            store.get(&BookingId::new("missing")).await,
            Err(StorageError::BookingNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_apply_transitions() {
        let store = MemoryBookingStore::new();
        let record = record("st1", "t1", true);
        store.insert(&record).await.unwrap();

        let approved = store.apply(&record.id, BookingAction::Approve).await.unwrap();
        assert_eq!(approved.status, BookingStatus::Confirmed);

        let err = store.apply(&record.id, BookingAction::Decline).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Core(peerly_core::Error::InvalidTransition { .. })
        ));
        // failed transition leaves the record as it was
        assert_eq!(store.get(&record.id).await.unwrap().status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_list_by_party() {
        let store = MemoryBookingStore::new();
        store.insert(&record("st1", "t1", false)).await.unwrap();
        store.insert(&record("st1", "t2", false)).await.unwrap();
        store.insert(&record("st2", "t1", true)).await.unwrap();

        assert_eq!(store.list_for_student(&StudentId::new("st1")).await.unwrap().len(), 2);
        assert_eq!(store.list_for_tutor(&TutorId::new("t1")).await.unwrap().len(), 2);
        assert!(store.list_for_tutor(&TutorId::new("t3")).await.unwrap().is_empty());
        assert_eq!(store.len(), 3);
    }
}
