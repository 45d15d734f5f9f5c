//! Facet search over a directory snapshot
//!
//! Every facet is an independent predicate over a tutor. A tutor is kept
//! only when it passes all facets present in the criteria. Slot-level
//! facets (campus, weekday, time band, mode) look at published slots only,
//! and each one is satisfied when *any* of the tutor's slots matches.

use std::sync::Arc;

use tracing::debug;

use crate::criteria::{FilterCriteria, TimeBand};
use crate::directory::TutorDirectory;
use crate::tutor::{TimeSlot, Tutor};

/// Return the tutors matching every facet of `criteria`, in directory order.
///
/// No match is a normal outcome and yields an empty vector.
pub fn search(directory: &TutorDirectory, criteria: &FilterCriteria) -> Vec<Arc<Tutor>> {
    let facets = Facets::from_criteria(criteria);
    let matches: Vec<Arc<Tutor>> = directory
        .tutors()
        .iter()
        .filter(|tutor| facets.matches(tutor))
        .cloned()
        .collect();

    debug!(
        facets = criteria.active_facets(),
        candidates = directory.len(),
        matches = matches.len(),
        "tutor search"
    );
    matches
}

/// Criteria normalised once per search
struct Facets<'a> {
    criteria: &'a FilterCriteria,
    subject: Option<&'a str>,
    query: Option<String>,
    campuses: Vec<String>,
}

impl<'a> Facets<'a> {
    fn from_criteria(criteria: &'a FilterCriteria) -> Self {
        Self {
            criteria,
            subject: criteria.subject(),
            query: criteria.text_query(),
            campuses: criteria.campus_tokens(),
        }
    }

    fn matches(&self, tutor: &Tutor) -> bool {
        self.subject_matches(tutor)
            && self.query_matches(tutor)
            && self.rating_matches(tutor)
            && self.any_slot(tutor, !self.campuses.is_empty(), |slot| self.campus_matches(slot))
            && self.any_slot(tutor, !self.criteria.weekdays.is_empty(), |slot| {
                self.criteria.weekdays.contains(&slot.weekday)
            })
            && self.any_slot(tutor, !self.criteria.time_bands.is_empty(), |slot| {
                self.criteria.time_bands.iter().any(|band| band_matches(band, slot))
            })
            && self.any_slot(tutor, !self.criteria.modes.is_empty(), |slot| {
                self.criteria.modes.iter().any(|&mode| slot.mode.satisfies(mode))
            })
    }

    fn any_slot(&self, tutor: &Tutor, active: bool, predicate: impl Fn(&TimeSlot) -> bool) -> bool {
        !active || tutor.published_slots().any(predicate)
    }

    fn subject_matches(&self, tutor: &Tutor) -> bool {
        self.subject.is_none_or(|subject| tutor.teaches(subject))
    }

    fn query_matches(&self, tutor: &Tutor) -> bool {
        self.query.as_deref().is_none_or(|query| {
            tutor.name.to_lowercase().contains(query) || tutor.staff_id.to_lowercase().contains(query)
        })
    }

    // Unrated tutors never satisfy a rating facet
    fn rating_matches(&self, tutor: &Tutor) -> bool {
        let buckets = &self.criteria.rating_buckets;
        if buckets.is_empty() {
            return true;
        }
        match tutor.rating {
            Some(rating) => buckets.iter().any(|&bucket| {
                let floor = f64::from(bucket);
                rating >= floor && rating < floor + 1.0
            }),
            None => false,
        }
    }

    fn campus_matches(&self, slot: &TimeSlot) -> bool {
        let Some(location) = slot.location.as_deref() else {
            return false;
        };
        let location = location.to_lowercase();
        self.campuses.iter().any(|campus| location.contains(campus.as_str()))
    }
}

/// A slot overlaps a band when it starts or ends inside it
fn band_matches(band: &TimeBand, slot: &TimeSlot) -> bool {
    band.contains(slot.start) || band.contains(slot.end)
}
