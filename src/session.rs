//! Editing session: one queue, one dispatcher, one command handler
//!
//! Front-ends turn user actions into [`QueueCommand`]s and read the queue
//! back through [`Session::snapshot`] after each one.

use nobg_common::{
    ArtifactSlot, CropRect, InputFile, OutputBound, QueueStore, QueueSummary, RecordId, RecordView,
};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::dispatcher::{shared, BatchReport, Dispatcher, SharedQueue, SubmitOutcome};
use crate::error::{NobgError, Result};
use crate::remote::BackgroundRemover;
use crate::{editor, export, scanner};

/// User action on the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueCommand {
    Remove(RecordId),
    Rotate { id: RecordId, slot: ArtifactSlot },
    Crop { id: RecordId, rect: CropRect },
    ProcessSingle(RecordId),
    ProcessAll,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// `false` when the id was unknown
    Removed(bool),
    Edited,
    Submitted(SubmitOutcome),
    Batch(BatchReport),
    Reset,
}

pub struct Session<R> {
    queue: SharedQueue,
    dispatcher: Dispatcher<R>,
    crop_bound: OutputBound,
}

impl<R: BackgroundRemover + Sync> Session<R> {
    pub fn new(remover: R, concurrency: usize, crop_bound: OutputBound) -> Self {
        Self::with_store(QueueStore::new(), remover, concurrency, crop_bound)
    }

    pub fn with_store(
        store: QueueStore,
        remover: R,
        concurrency: usize,
        crop_bound: OutputBound,
    ) -> Self {
        let queue = shared(store);
        let dispatcher = Dispatcher::new(queue.clone(), remover, concurrency);
        Self {
            queue,
            dispatcher,
            crop_bound,
        }
    }

    pub fn queue(&self) -> &SharedQueue {
        &self.queue
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<R> {
        &mut self.dispatcher
    }

    pub async fn add(&self, inputs: Vec<InputFile>) -> Result<Vec<RecordId>> {
        Ok(self.queue.lock().await.add(inputs)?)
    }

    /// Reads files and folders from disk and queues the images among them
    pub async fn add_paths(&self, paths: &[PathBuf]) -> Result<Vec<RecordId>> {
        let inputs = scanner::load_inputs(paths)?;
        if inputs.is_empty() {
            let listed: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
            return Err(NobgError::NoImagesFound(listed.join(", ")));
        }
        self.add(inputs).await
    }

    pub async fn execute(&self, command: QueueCommand) -> Result<CommandOutcome> {
        debug!("Executing {:?}", command);
        let outcome = match command {
            QueueCommand::Remove(id) => CommandOutcome::Removed(self.queue.lock().await.remove(id)),
            QueueCommand::Rotate { id, slot } => {
                editor::rotate(&self.queue, id, slot).await?;
                CommandOutcome::Edited
            }
            QueueCommand::Crop { id, rect } => {
                editor::crop(&self.queue, id, rect, self.crop_bound).await?;
                CommandOutcome::Edited
            }
            QueueCommand::ProcessSingle(id) => {
                CommandOutcome::Submitted(self.dispatcher.process_single(id).await)
            }
            QueueCommand::ProcessAll => CommandOutcome::Batch(self.dispatcher.process_all().await),
            QueueCommand::Reset => {
                self.queue.lock().await.reset();
                CommandOutcome::Reset
            }
        };
        Ok(outcome)
    }

    /// Rotates `turns` quarter turns clockwise, stopping at the first failure
    pub async fn rotate_turns(&self, id: RecordId, slot: ArtifactSlot, turns: u8) -> Result<()> {
        editor::rotate_turns(&self.queue, id, slot, turns).await
    }

    pub async fn snapshot(&self) -> Vec<RecordView> {
        self.queue.lock().await.snapshot()
    }

    pub async fn summary(&self) -> QueueSummary {
        self.queue.lock().await.summary()
    }

    pub async fn save_result(&self, id: RecordId, out_dir: &Path) -> Result<PathBuf> {
        export::save_result(&self.queue, id, out_dir).await
    }

    pub async fn save_all_results(&self, out_dir: &Path) -> Result<Vec<PathBuf>> {
        export::save_all_results(&self.queue, out_dir).await
    }
}
