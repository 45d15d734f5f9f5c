//! Directory feed loading

use std::path::Path;

use peerly_core::TutorDirectory;
use tracing::info;

use crate::{Result, StorageError};

/// Read and validate a directory snapshot written by the availability service
pub async fn load_directory(path: impl AsRef<Path>) -> Result<TutorDirectory> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let directory = parse_directory(&content)?;
    info!(
        path = %path.display(),
        tutors = directory.len(),
        slots = directory.slots().count(),
        "directory loaded"
    );
    Ok(directory)
}

pub fn parse_directory(json: &str) -> Result<TutorDirectory> {
    Ok(TutorDirectory::from_json(json)?)
}
