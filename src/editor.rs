//! Local rotate and crop on queued records
//!
//! The artifact bytes are checked out under the lock, transformed on the
//! blocking pool and installed by the store, which re-checks the record
//! status and the artifact version. A record submitted, removed or edited
//! by someone else in the meantime keeps its current artifact; the
//! transformed image is dropped and the edit returns an error.

use nobg_common::{transform, ArtifactSlot, CropRect, Edit, EncodedImage, OutputBound, RecordId};
use tracing::debug;

use crate::dispatcher::SharedQueue;
use crate::error::{NobgError, Result};

/// Rotates the source (while `ready`) or result (while `done`) 90° clockwise
pub async fn rotate(queue: &SharedQueue, id: RecordId, slot: ArtifactSlot) -> Result<()> {
    let checkout = queue.lock().await.checkout(id, slot)?;
    let bytes = checkout.bytes;
    let image = run_blocking(move || transform::rotate_clockwise(&bytes)).await?;
    queue
        .lock()
        .await
        .replace_artifact(id, slot, checkout.version, image, Edit::Rotated)?;
    debug!("Rotated {} of {}", slot, id);
    Ok(())
}

/// Rotates `turns` quarter turns clockwise
pub async fn rotate_turns(
    queue: &SharedQueue,
    id: RecordId,
    slot: ArtifactSlot,
    turns: u8,
) -> Result<()> {
    for _ in 0..turns % 4 {
        rotate(queue, id, slot).await?;
    }
    Ok(())
}

/// Replaces the source image with the `rect` region, bounded by `bound`
pub async fn crop(
    queue: &SharedQueue,
    id: RecordId,
    rect: CropRect,
    bound: OutputBound,
) -> Result<()> {
    let checkout = queue.lock().await.checkout(id, ArtifactSlot::Source)?;
    let bytes = checkout.bytes;
    let image = run_blocking(move || transform::crop(&bytes, rect, bound)).await?;
    queue.lock().await.replace_artifact(
        id,
        ArtifactSlot::Source,
        checkout.version,
        image,
        Edit::Cropped,
    )?;
    debug!("Cropped {} to {},{} {}x{}", id, rect.x, rect.y, rect.width, rect.height);
    Ok(())
}

async fn run_blocking<F>(work: F) -> Result<EncodedImage>
where
    F: FnOnce() -> nobg_common::Result<EncodedImage> + Send + 'static,
{
    let image = tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| NobgError::Transform(e.to_string()))??;
    Ok(image)
}

