//! Core domain models and logic for peerly
//!
//! This crate contains:
//! - Domain models (Tutor, TimeSlot, BookingRecord)
//! - Tutor directory snapshot and facet search
//! - Ranking of search candidates
//! - Booking attempt state machine
//! - Capacity ledger (the only shared mutable state)

pub mod booking;
pub mod criteria;
pub mod directory;
pub mod error;
pub mod filter;
pub mod ledger;
pub mod rank;
pub mod tutor;
pub mod workflow;

pub use booking::{BookingAction, BookingId, BookingRecord, BookingStatus, Notification, NotificationKind, Recipient};
pub use criteria::{FilterCriteria, TimeBand};
pub use directory::{DirectoryFeed, TutorDirectory};
pub use error::{Error, Result};
pub use filter::search;
pub use ledger::{Availability, CapacityLedger, Reservation};
pub use rank::rank;
pub use tutor::{DeliveryMode, SlotId, StudentId, TimeOfDay, TimeSlot, Tutor, TutorId, Weekday};
pub use workflow::{AttemptId, AttemptState, BookingAttempt};
