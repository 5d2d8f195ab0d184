//! nobg common library
//!
//! In-memory image queue, revocable display handles and the local pixel
//! transforms, with no IO and no async runtime.

pub mod error;
pub mod handle;
pub mod naming;
pub mod queue;
pub mod transform;
pub mod types;

pub use error::{Error, Result};
pub use handle::{Handle, HandleRegistry, HandleStats};
pub use naming::{base_name, download_name, edited_name, DEFAULT_DOWNLOAD_PREFIX};
pub use queue::{Artifact, ArtifactVersion, Checkout, ImageRecord, QueueStore};
pub use types::{
    ArtifactSlot, CropRect, Edit, EncodedImage, InputFile, OutputBound, QueueSummary, RecordId,
    RecordStatus, RecordView,
};
