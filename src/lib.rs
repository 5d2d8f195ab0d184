//! nobg: batch background removal with local crop and rotate
//!
//! The queue model and transforms live in `nobg-common`; this crate adds the
//! remote client, the batch dispatcher and the command-line front-ends.

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod editor;
pub mod error;
pub mod export;
pub mod interactive;
pub mod remote;
pub mod scanner;
pub mod session;

pub use dispatcher::{BatchReport, DispatchEvent, Dispatcher, SharedQueue, SubmitOutcome};
pub use error::{NobgError, Result};
pub use remote::{BackgroundRemover, HttpRemover, RemoteError, Upload};
pub use session::{CommandOutcome, QueueCommand, Session};
