//! Batch dispatcher
//!
//! Sends `ready` records to the removal service in fixed-size groups. A
//! group's submissions run concurrently on the current task and the next
//! group starts only after all of them have settled, so at most
//! `concurrency` calls are outstanding.

use futures::future::join_all;
use nobg_common::{EncodedImage, Error as QueueError, QueueStore, RecordId, RecordStatus};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::remote::{BackgroundRemover, Upload};

/// Queue store shared between the dispatcher, editor and front-end
pub type SharedQueue = Arc<Mutex<QueueStore>>;

pub fn shared(store: QueueStore) -> SharedQueue {
    Arc::new(Mutex::new(store))
}

/// Progress notification, sent after the store has been updated
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    Submitted { id: RecordId, name: String },
    Completed { id: RecordId, name: String },
    Failed { id: RecordId, name: String, error: String },
    /// The record was removed while its call was in flight
    Discarded { id: RecordId },
}

type Observer = Box<dyn Fn(&DispatchEvent) + Send + Sync>;

/// What happened to a single submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Done,
    Failed(String),
    /// The record was not `ready`; nothing was sent
    Skipped,
    Discarded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub groups: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub discarded: usize,
}

impl BatchReport {
    pub fn submitted(&self) -> usize {
        self.succeeded + self.failed + self.discarded
    }

    fn record(&mut self, outcome: &SubmitOutcome) {
        match outcome {
            SubmitOutcome::Done => self.succeeded += 1,
            SubmitOutcome::Failed(_) => self.failed += 1,
            SubmitOutcome::Skipped => self.skipped += 1,
            SubmitOutcome::Discarded => self.discarded += 1,
        }
    }
}

pub struct Dispatcher<R> {
    queue: SharedQueue,
    remover: R,
    concurrency: usize,
    observer: Option<Observer>,
}

impl<R: BackgroundRemover + Sync> Dispatcher<R> {
    pub fn new(queue: SharedQueue, remover: R, concurrency: usize) -> Self {
        Self {
            queue,
            remover,
            concurrency: concurrency.max(1),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: impl Fn(&DispatchEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn set_observer(&mut self, observer: impl Fn(&DispatchEvent) + Send + Sync + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Submits every record that is `ready` now, group by group
    pub async fn process_all(&self) -> BatchReport {
        let ready = self.queue.lock().await.ready_ids();
        let mut report = BatchReport::default();
        if ready.is_empty() {
            return report;
        }

        let total_groups = ready.len().div_ceil(self.concurrency);
        info!(
            "Processing {} image(s) in {} group(s) of up to {}",
            ready.len(),
            total_groups,
            self.concurrency
        );

        for (group_idx, group) in ready.chunks(self.concurrency).enumerate() {
            debug!("Group {}/{}: {} image(s)", group_idx + 1, total_groups, group.len());

            let outcomes = join_all(group.iter().map(|&id| self.process_single(id))).await;
            for outcome in &outcomes {
                report.record(outcome);
            }
            report.groups += 1;
        }

        if report.failed > 0 {
            warn!(
                "Batch finished with {} failure(s) out of {}",
                report.failed,
                report.submitted()
            );
        } else {
            info!("Batch finished: {} image(s) processed", report.succeeded);
        }
        report
    }

    /// Submits one record if it is `ready`
    ///
    /// Remote failures end up in the record as `error`; they are never
    /// returned to the caller.
    pub async fn process_single(&self, id: RecordId) -> SubmitOutcome {
        let upload = {
            let mut store = self.queue.lock().await;
            let Some(record) = store.get(id) else {
                return SubmitOutcome::Skipped;
            };
            if record.status() != RecordStatus::Ready {
                debug!("{} is {}, not submitting", id, record.status());
                return SubmitOutcome::Skipped;
            }
            let upload = Upload {
                file_name: record.display_name().to_string(),
                mime: record.source().mime().to_string(),
                bytes: Arc::clone(record.source().bytes()),
            };
            if store.set_processing(id).is_err() {
                return SubmitOutcome::Skipped;
            }
            upload
        };

        let name = upload.file_name.clone();
        self.notify(DispatchEvent::Submitted { id, name: name.clone() });

        let response = self.remover.remove_background(upload).await;

        let mut store = self.queue.lock().await;
        let (applied, outcome, event) = match response {
            Ok(bytes) => (
                store.set_result(id, EncodedImage::png(bytes)),
                SubmitOutcome::Done,
                DispatchEvent::Completed { id, name },
            ),
            Err(err) => {
                let message = err.to_string();
                warn!("Removing background from {} failed: {}", name, message);
                (
                    store.set_error(id, message.clone()),
                    SubmitOutcome::Failed(message.clone()),
                    DispatchEvent::Failed { id, name, error: message },
                )
            }
        };
        drop(store);

        match applied {
            Ok(()) => {
                self.notify(event);
                outcome
            }
            Err(err) => {
                // Only this call moves the record out of `processing`, so the
                // store can only answer that the record is gone.
                debug_assert!(matches!(err, QueueError::UnknownRecord(_)), "{err}");
                debug!("{} was removed while processing, result discarded", id);
                self.notify(DispatchEvent::Discarded { id });
                SubmitOutcome::Discarded
            }
        }
    }

    fn notify(&self, event: DispatchEvent) {
        if let Some(observer) = &self.observer {
            observer(&event);
        }
    }
}
