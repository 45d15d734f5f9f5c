//! Live booking attempts, at most one per student

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use peerly_core::{AttemptId, BookingAttempt, Error, Result, StudentId};
use tracing::debug;

#[derive(Debug, Default)]
pub struct AttemptRegistry {
    attempts: DashMap<AttemptId, BookingAttempt>,
    by_student: DashMap<StudentId, AttemptId>,
}

impl AttemptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new attempt. The student's previous attempt, if any, is
    /// discarded and returned.
    ///
    /// The swap happens under the student's index entry, so concurrent
    /// inserts for one student always leave exactly one live attempt.
    pub fn insert(&self, attempt: BookingAttempt) -> Option<BookingAttempt> {
        let student_id = attempt.student_id.clone();
        let attempt_id = attempt.id.clone();

        let previous = match self.by_student.entry(student_id.clone()) {
            Entry::Occupied(mut entry) => {
                let previous_id = entry.insert(attempt_id.clone());
                self.attempts.insert(attempt_id, attempt);
                self.attempts.remove(&previous_id).map(|(_, previous)| previous)
            }
            Entry::Vacant(entry) => {
                self.attempts.insert(attempt_id.clone(), attempt);
                entry.insert(attempt_id);
                None
            }
        };

        if let Some(previous) = &previous {
            debug!(
                student = %student_id,
                discarded = %previous.id,
                state = %previous.state,
                "previous attempt discarded"
            );
        }
        previous
    }

    /// Snapshot of an attempt
    pub fn get(&self, id: &AttemptId) -> Result<BookingAttempt> {
        self.attempts
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::AttemptNotFound(id.clone()))
    }

    /// Run a transition on the stored attempt.
    ///
    /// The attempt is locked for the duration of `f`, so transitions on one
    /// attempt never interleave. `f` must not block.
    pub fn update<T>(&self, id: &AttemptId, f: impl FnOnce(&mut BookingAttempt) -> Result<T>) -> Result<T> {
        let mut entry = self
            .attempts
            .get_mut(id)
            .ok_or_else(|| Error::AttemptNotFound(id.clone()))?;
        f(entry.value_mut())
    }

    pub fn remove(&self, id: &AttemptId) -> Result<BookingAttempt> {
        let (_, attempt) = self
            .attempts
            .remove(id)
            .ok_or_else(|| Error::AttemptNotFound(id.clone()))?;
        self.by_student.remove_if(&attempt.student_id, |_, current| current == id);
        Ok(attempt)
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}
