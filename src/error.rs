use thiserror::Error;

use crate::remote::RemoteError;

#[derive(Error, Debug)]
pub enum NobgError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("No images found: {0}")]
    NoImagesFound(String),

    #[error("Remote call failed: {0}")]
    RemoteCall(#[from] RemoteError),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Prompt error: {0}")]
    Interaction(String),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] nobg_common::Error),
}

pub type Result<T> = std::result::Result<T, NobgError>;
