//! Read-only snapshot of the tutor pool

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::tutor::{SlotId, TimeSlot, Tutor, TutorId};
use crate::{Error, Result};

/// Wire format of the availability service feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryFeed {
    #[serde(default)]
    pub tutors: Vec<Tutor>,
}

/// Immutable, validated snapshot of tutors and their weekly slots.
///
/// Tutors keep the order in which the feed declared them; search results
/// without ranking follow that order.
#[derive(Debug, Default)]
pub struct TutorDirectory {
    tutors: Vec<Arc<Tutor>>,
    by_id: HashMap<TutorId, usize>,
    slot_owner: HashMap<SlotId, usize>,
}

impl TutorDirectory {
    /// Build a snapshot, rejecting feeds that break the slot invariants
    pub fn new(tutors: Vec<Tutor>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(tutors.len());
        let mut slot_owner = HashMap::new();

        for (index, tutor) in tutors.iter().enumerate() {
            if by_id.insert(tutor.id.clone(), index).is_some() {
                return Err(Error::InvalidDirectory(format!(
                    "duplicate tutor id {}",
                    tutor.id
                )));
            }
            if let Some(rating) = tutor.rating {
                if !(0.0..=5.0).contains(&rating) {
                    return Err(Error::InvalidDirectory(format!(
                        "tutor {}: rating {} outside 0.0-5.0",
                        tutor.id, rating
                    )));
                }
            }
            for slot in &tutor.slots {
                slot.validate()?;
                if slot_owner.insert(slot.id.clone(), index).is_some() {
                    return Err(Error::InvalidDirectory(format!(
                        "duplicate slot id {}",
                        slot.id
                    )));
                }
            }
        }

        Ok(Self {
            tutors: tutors.into_iter().map(Arc::new).collect(),
            by_id,
            slot_owner,
        })
    }

    pub fn from_feed(feed: DirectoryFeed) -> Result<Self> {
        Self::new(feed.tutors)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let feed: DirectoryFeed = serde_json::from_str(json)?;
        Self::from_feed(feed)
    }

    pub fn tutors(&self) -> &[Arc<Tutor>] {
        &self.tutors
    }

    pub fn len(&self) -> usize {
        self.tutors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tutors.is_empty()
    }

    pub fn tutor(&self, id: &TutorId) -> Option<&Arc<Tutor>> {
        self.by_id.get(id).map(|&index| &self.tutors[index])
    }

    pub fn get_tutor(&self, id: &TutorId) -> Result<&Arc<Tutor>> {
        self.tutor(id).ok_or_else(|| Error::TutorNotFound(id.clone()))
    }

    /// The tutor that owns a slot, published or not
    pub fn slot_owner(&self, slot_id: &SlotId) -> Option<&Arc<Tutor>> {
        self.slot_owner.get(slot_id).map(|&index| &self.tutors[index])
    }

    /// Every slot in the snapshot, published or not
    pub fn slots(&self) -> impl Iterator<Item = &TimeSlot> {
        self.tutors.iter().flat_map(|tutor| tutor.slots.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"{
        "tutors": [
            {
                "id": "t1",
                "name": "Nguyen Van A",
                "staff_id": "GV001",
                "subjects": ["MT2013", "CO1005"],
                "rating": 4.5,
                "slots": [
                    {
                        "id": "s1",
                        "weekday": "Monday",
                        "start": "14:00",
                        "end": "16:00",
                        "mode": "online",
                        "meeting_link": "https://meet.example.edu/t1",
                        "capacity": 1
                    }
                ]
            },
            {
                "id": "t2",
                "name": "Tran Thi B",
                "staff_id": "GV002",
                "subjects": ["PH1003"],
                "accepting_students": false
            }
        ]
    }"#;

    #[test]
    fn test_load_feed() {
        let directory = TutorDirectory::from_json(FEED).unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.tutors()[0].id, TutorId::new("t1"));

        let t2 = directory.get_tutor(&TutorId::new("t2")).unwrap();
        assert!(!t2.accepting_students);
        assert!(t2.rating.is_none());

        let owner = directory.slot_owner(&SlotId::new("s1")).unwrap();
        assert_eq!(owner.id, TutorId::new("t1"));
        assert!(owner.slots[0].published);
        assert!(!owner.slots[0].requires_approval);
    }

    #[test]
    fn test_unknown_tutor() {
        let directory = TutorDirectory::from_json(FEED).unwrap();
        let err = directory.get_tutor(&TutorId::new("missing")).unwrap_err();
        assert!(matches!(err, Error::TutorNotFound(_)));
    }

    #[test]
    fn test_rejects_duplicate_slot_ids() {
        let feed = FEED.replace("\"subjects\": [\"PH1003\"],", "\"subjects\": [\"PH1003\"], \"slots\": [{\"id\": \"s1\", \"weekday\": \"Friday\", \"start\": \"08:00\", \"end\": \"09:00\", \"mode\": \"offline\", \"location\": \"Campus 1\"}],");
        let err = TutorDirectory::from_json(&feed).unwrap_err();
        assert!(matches!(err, Error::InvalidDirectory(_)));
    }

    #[test]
    fn test_rejects_slot_without_link() {
        let feed = FEED.replace("\"meeting_link\": \"https://meet.example.edu/t1\",", "");
        let err = TutorDirectory::from_json(&feed).unwrap_err();
        assert!(err.to_string().contains("meeting link"));
    }

    #[test]
    fn test_rejects_out_of_range_rating() {
        let feed = FEED.replace("4.5", "7.0");
        assert!(TutorDirectory::from_json(&feed).is_err());
    }
}
