//! Storage layer for peerly
//!
//! This crate provides:
//! - Directory feed loading (JSON snapshot files)
//! - The booking persistence seam and an in-memory store

pub mod bookings;
pub mod error;
pub mod feed;

pub use bookings::{BookingStore, MemoryBookingStore};
pub use error::{Result, StorageError};
pub use feed::{load_directory, parse_directory};
