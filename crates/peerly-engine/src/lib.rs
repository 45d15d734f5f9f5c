//! Booking service for peerly
//!
//! Ties the pure core (search, ranking, attempt state machine, capacity
//! ledger) to the external collaborators: the booking store and the
//! messaging service.

pub mod attempts;
pub mod notify;
pub mod service;

pub use attempts::AttemptRegistry;
pub use notify::{BroadcastNotifier, Notifier};
pub use service::BookingService;
