//! Queue store: the single owner of image records and their handles
//!
//! Records are only changed through the named operations below; each one
//! keeps the status machine and the handle accounting intact.

use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::handle::{Handle, HandleRegistry, HandleStats};
use crate::naming;
use crate::types::{
    ArtifactSlot, Edit, EncodedImage, InputFile, QueueSummary, RecordId, RecordStatus, RecordView,
};

/// Image bytes together with the handle that displays them
#[derive(Debug)]
pub struct Artifact {
    bytes: Arc<[u8]>,
    mime: String,
    handle: Handle,
}

impl Artifact {
    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn url(&self) -> String {
        self.handle.url()
    }

    /// Changes whenever the slot holding this artifact is replaced
    pub fn version(&self) -> ArtifactVersion {
        ArtifactVersion(self.handle.key())
    }
}

/// Identity of one artifact installed in a slot
///
/// Handle keys are never reused by a store, so two reads of a slot see the
/// same version only if nothing was installed in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactVersion(u64);

/// Artifact bytes taken out for a local edit
#[derive(Debug, Clone)]
pub struct Checkout {
    pub bytes: Arc<[u8]>,
    pub version: ArtifactVersion,
}

/// One user-submitted image
#[derive(Debug)]
pub struct ImageRecord {
    id: RecordId,
    display_name: String,
    status: RecordStatus,
    source: Artifact,
    result: Option<Artifact>,
    last_error: Option<String>,
}

impl ImageRecord {
    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    pub fn source(&self) -> &Artifact {
        &self.source
    }

    pub fn result(&self) -> Option<&Artifact> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn artifact(&self, slot: ArtifactSlot) -> Option<&Artifact> {
        match slot {
            ArtifactSlot::Source => Some(&self.source),
            ArtifactSlot::Result => self.result.as_ref(),
        }
    }

    /// Number of artifacts (and so live handles) the record holds
    pub fn artifact_count(&self) -> usize {
        1 + usize::from(self.result.is_some())
    }
}

#[derive(Debug)]
pub struct QueueStore {
    records: Vec<ImageRecord>,
    handles: HandleRegistry,
    next_id: u64,
    download_prefix: String,
}

impl Default for QueueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueStore {
    pub fn new() -> Self {
        Self::with_download_prefix(naming::DEFAULT_DOWNLOAD_PREFIX)
    }

    pub fn with_download_prefix(prefix: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            handles: HandleRegistry::new(),
            next_id: 0,
            download_prefix: prefix.into(),
        }
    }

    /// Appends one `ready` record per image-typed input
    ///
    /// Non-image inputs are dropped. If nothing is left the queue is not
    /// touched and `InputRejected` is returned.
    pub fn add(&mut self, inputs: Vec<InputFile>) -> Result<Vec<RecordId>> {
        let offered = inputs.len();
        let images: Vec<InputFile> = inputs.into_iter().filter(InputFile::is_image).collect();
        if images.is_empty() {
            return Err(Error::InputRejected(offered));
        }
        if images.len() < offered {
            debug!("Dropped {} non-image input(s)", offered - images.len());
        }

        let mut ids = Vec::with_capacity(images.len());
        for input in images {
            self.next_id += 1;
            let id = RecordId::new(self.next_id);
            let source = self.install(input.bytes, input.mime);
            self.records.push(ImageRecord {
                id,
                display_name: input.name,
                status: RecordStatus::Ready,
                source,
                result: None,
                last_error: None,
            });
            ids.push(id);
        }
        Ok(ids)
    }

    /// Revokes the record's handles and deletes it; unknown ids are ignored
    ///
    /// Removing the last record resets the store.
    pub fn remove(&mut self, id: RecordId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let record = self.records.remove(index);
        self.retire(record);

        if self.records.is_empty() {
            self.reset();
        }
        true
    }

    /// Revokes every handle and clears the queue
    pub fn reset(&mut self) {
        let records = std::mem::take(&mut self.records);
        let count = records.len();
        for record in records {
            self.retire(record);
        }
        if count > 0 {
            debug!("Reset queue, {} record(s) dropped", count);
        }
    }

    /// `ready -> processing`
    pub fn set_processing(&mut self, id: RecordId) -> Result<()> {
        let record = self.expect_status(id, RecordStatus::Ready, "start processing")?;
        record.status = RecordStatus::Processing;
        Ok(())
    }

    /// `processing -> done`, installing the result artifact
    pub fn set_result(&mut self, id: RecordId, image: EncodedImage) -> Result<()> {
        self.expect_status(id, RecordStatus::Processing, "store a result")?;
        let artifact = self.install(image.bytes, image.mime);
        let record = self.record_mut(id)?;
        let previous = record.result.replace(artifact);
        record.status = RecordStatus::Done;
        record.last_error = None;
        if let Some(previous) = previous {
            self.handles.revoke(previous.handle);
        }
        Ok(())
    }

    /// `processing -> error`, dropping any partial result
    pub fn set_error(&mut self, id: RecordId, message: impl Into<String>) -> Result<()> {
        let record = self.expect_status(id, RecordStatus::Processing, "record an error")?;
        record.status = RecordStatus::Error;
        record.last_error = Some(message.into());
        if let Some(partial) = record.result.take() {
            self.handles.revoke(partial.handle);
        }
        Ok(())
    }

    /// Swaps in a transformed artifact
    ///
    /// The source may be replaced while `ready`, the result while `done`,
    /// and only if the slot still holds the `expected` version. The new
    /// handle is installed before the old one is revoked. Replacing the
    /// source renames the record after `edit`.
    pub fn replace_artifact(
        &mut self,
        id: RecordId,
        slot: ArtifactSlot,
        expected: ArtifactVersion,
        image: EncodedImage,
        edit: Edit,
    ) -> Result<()> {
        let current = self.check_editable(id, slot)?;
        if current != expected {
            return Err(Error::StaleArtifact { id, slot });
        }

        let artifact = self.install(image.bytes, image.mime);
        let record = self.record_mut(id)?;
        let previous = match slot {
            ArtifactSlot::Source => {
                record.display_name = naming::edited_name(&record.display_name, edit);
                Some(std::mem::replace(&mut record.source, artifact))
            }
            ArtifactSlot::Result => record.result.replace(artifact),
        };
        if let Some(previous) = previous {
            self.handles.revoke(previous.handle);
        }
        Ok(())
    }

    /// Bytes and version of an artifact that may currently be edited
    pub fn checkout(&self, id: RecordId, slot: ArtifactSlot) -> Result<Checkout> {
        let version = self.check_editable(id, slot)?;
        let bytes = self
            .get(id)
            .and_then(|r| r.artifact(slot))
            .map(|a| Arc::clone(&a.bytes))
            .ok_or(Error::MissingArtifact { id, slot })?;
        Ok(Checkout { bytes, version })
    }

    pub fn get(&self, id: RecordId) -> Option<&ImageRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    /// Ids of `ready` records in queue order
    pub fn ready_ids(&self) -> Vec<RecordId> {
        self.records
            .iter()
            .filter(|r| r.status == RecordStatus::Ready)
            .map(|r| r.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> QueueSummary {
        let mut summary = QueueSummary {
            total: self.records.len(),
            ..Default::default()
        };
        for record in &self.records {
            match record.status {
                RecordStatus::Ready => summary.ready += 1,
                RecordStatus::Processing => summary.processing += 1,
                RecordStatus::Done => summary.done += 1,
                RecordStatus::Error => summary.error += 1,
            }
        }
        summary
    }

    pub fn snapshot(&self) -> Vec<RecordView> {
        self.records
            .iter()
            .map(|r| RecordView {
                id: r.id,
                display_name: r.display_name.clone(),
                status: r.status,
                source_url: r.source.url(),
                result_url: r.result.as_ref().map(Artifact::url),
                last_error: r.last_error.clone(),
                download_name: r.result.as_ref().map(|_| self.download_name(r)),
            })
            .collect()
    }

    pub fn download_name(&self, record: &ImageRecord) -> String {
        naming::download_name(&self.download_prefix, &record.display_name)
    }

    /// Bytes behind a handle URL, while the handle is live
    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        self.handles.resolve(url)
    }

    pub fn live_handles(&self) -> usize {
        self.handles.live_count()
    }

    pub fn handle_stats(&self) -> HandleStats {
        self.handles.stats()
    }

    fn install(&mut self, bytes: Vec<u8>, mime: String) -> Artifact {
        let bytes: Arc<[u8]> = Arc::from(bytes);
        let handle = self.handles.create(Arc::clone(&bytes));
        Artifact { bytes, mime, handle }
    }

    fn retire(&mut self, record: ImageRecord) {
        self.handles.revoke(record.source.handle);
        if let Some(result) = record.result {
            self.handles.revoke(result.handle);
        }
    }

    fn check_editable(&self, id: RecordId, slot: ArtifactSlot) -> Result<ArtifactVersion> {
        let record = self.get(id).ok_or(Error::UnknownRecord(id))?;
        let allowed = match slot {
            ArtifactSlot::Source => RecordStatus::Ready,
            ArtifactSlot::Result => RecordStatus::Done,
        };
        if record.status != allowed {
            return Err(Error::NotEditable {
                id,
                slot,
                status: record.status,
            });
        }
        record
            .artifact(slot)
            .map(Artifact::version)
            .ok_or(Error::MissingArtifact { id, slot })
    }

    fn expect_status(
        &mut self,
        id: RecordId,
        expected: RecordStatus,
        action: &'static str,
    ) -> Result<&mut ImageRecord> {
        let record = self.record_mut(id)?;
        if record.status != expected {
            return Err(Error::InvalidTransition {
                id,
                status: record.status,
                action,
            });
        }
        Ok(record)
    }

    fn record_mut(&mut self, id: RecordId) -> Result<&mut ImageRecord> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(Error::UnknownRecord(id))
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}
