//! Error types shared by the queue, handle registry and transforms

use thiserror::Error;

use crate::types::{ArtifactSlot, RecordId, RecordStatus};

/// Common error type
#[derive(Error, Debug)]
pub enum Error {
    /// A submitted batch contained no image-typed files
    #[error("Please select image files ({0} file(s) rejected)")]
    InputRejected(usize),

    #[error("Unknown record: {0}")]
    UnknownRecord(RecordId),

    #[error("Record {id} is {status}, cannot {action}")]
    InvalidTransition {
        id: RecordId,
        status: RecordStatus,
        action: &'static str,
    },

    #[error("Record {id} is {status}, its {slot} image cannot be edited")]
    NotEditable {
        id: RecordId,
        slot: ArtifactSlot,
        status: RecordStatus,
    },

    #[error("Record {id} has no {slot} image")]
    MissingArtifact { id: RecordId, slot: ArtifactSlot },

    /// The slot was replaced after the edited bytes were read
    #[error("Record {id} {slot} image changed during the edit, try again")]
    StaleArtifact { id: RecordId, slot: ArtifactSlot },

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Invalid crop rectangle: {0}")]
    InvalidCropRect(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Self::Transform(err.to_string())
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, Error>;
