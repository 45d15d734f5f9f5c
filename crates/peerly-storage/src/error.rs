//! Error types for peerly-storage

use std::path::PathBuf;

use peerly_core::BookingId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    #[error("Booking already stored: {0}")]
    DuplicateBooking(BookingId),

    #[error(transparent)]
    Core(#[from] peerly_core::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<StorageError> for peerly_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::BookingNotFound(id) => peerly_core::Error::BookingNotFound(id),
            StorageError::Core(core) => core,
            other => peerly_core::Error::Other(anyhow::Error::new(other)),
        }
    }
}
