use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Identifier of a queue record, unique for the lifetime of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .trim_start_matches('#')
            .parse::<u64>()
            .map(RecordId)
            .map_err(|_| format!("Invalid record id: {}", s))
    }
}

/// Lifecycle state of a record
///
/// `Ready -> Processing -> {Done, Error}`; `Done` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Ready,
    Processing,
    Done,
    Error,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Ready => write!(f, "ready"),
            RecordStatus::Processing => write!(f, "processing"),
            RecordStatus::Done => write!(f, "done"),
            RecordStatus::Error => write!(f, "error"),
        }
    }
}

/// Which of a record's two artifacts an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactSlot {
    Source,
    Result,
}

impl fmt::Display for ArtifactSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactSlot::Source => write!(f, "source"),
            ArtifactSlot::Result => write!(f, "result"),
        }
    }
}

/// Local edit applied to a source image, used for renaming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Rotated,
    Cropped,
}

impl Edit {
    pub fn suffix(&self) -> &'static str {
        match self {
            Edit::Rotated => "rotated",
            Edit::Cropped => "cropped",
        }
    }
}

/// A file-like input offered to the queue
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Encoded image payload not yet installed in a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(bytes, crate::transform::PNG_MIME)
    }
}

/// Crop rectangle in source pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Parses `x,y,width,height`
impl FromStr for CropRect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidCropRect(format!("{}: {}", s, e)))?;

        match parts.as_slice() {
            [x, y, width, height] if *width > 0 && *height > 0 => {
                Ok(Self::new(*x, *y, *width, *height))
            }
            [_, _, _, _] => Err(Error::InvalidCropRect(format!(
                "{}: width and height must be positive",
                s
            ))),
            _ => Err(Error::InvalidCropRect(format!(
                "{}: expected x,y,width,height",
                s
            ))),
        }
    }
}

/// Largest output a crop may produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBound {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for OutputBound {
    fn default() -> Self {
        Self {
            max_width: 4096,
            max_height: 4096,
        }
    }
}

/// Read-only view of one record for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub id: RecordId,
    pub display_name: String,
    pub status: RecordStatus,
    pub source_url: String,
    pub result_url: Option<String>,
    pub last_error: Option<String>,
    pub download_name: Option<String>,
}

/// Status counts across the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub total: usize,
    pub ready: usize,
    pub processing: usize,
    pub done: usize,
    pub error: usize,
}

impl QueueSummary {
    /// Whether the bulk "process all" action has anything to do
    pub fn can_process_all(&self) -> bool {
        self.ready > 0
    }

    /// Empty queue, as before any upload
    pub fn is_initial(&self) -> bool {
        self.total == 0
    }

    pub fn is_settled(&self) -> bool {
        self.ready == 0 && self.processing == 0
    }
}
