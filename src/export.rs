//! Saving finished results under their download names

use nobg_common::{ArtifactSlot, Error as QueueError, RecordId, RecordStatus};
use std::path::{Path, PathBuf};

use crate::dispatcher::SharedQueue;
use crate::error::Result;

/// Writes one `done` record's result to `out_dir`
pub async fn save_result(queue: &SharedQueue, id: RecordId, out_dir: &Path) -> Result<PathBuf> {
    let (file_name, bytes) = {
        let store = queue.lock().await;
        let record = store.get(id).ok_or(QueueError::UnknownRecord(id))?;
        let artifact = record.result().ok_or(QueueError::MissingArtifact {
            id,
            slot: ArtifactSlot::Result,
        })?;
        (store.download_name(record), artifact.bytes().clone())
    };

    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(file_name);
    tokio::fs::write(&path, &bytes[..]).await?;
    Ok(path)
}

/// Writes every `done` result; other records are left out
pub async fn save_all_results(queue: &SharedQueue, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let done: Vec<RecordId> = {
        let store = queue.lock().await;
        store
            .records()
            .iter()
            .filter(|r| r.status() == RecordStatus::Done)
            .map(|r| r.id())
            .collect()
    };

    let mut saved = Vec::with_capacity(done.len());
    for id in done {
        saved.push(save_result(queue, id, out_dir).await?);
    }
    Ok(saved)
}
