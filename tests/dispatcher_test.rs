//! Batch dispatch: grouping, concurrency bound and failure isolation

mod support;

use nobg::dispatcher::shared;
use nobg::{DispatchEvent, Dispatcher, SubmitOutcome};
use nobg_common::{QueueStore, RecordStatus};
use std::sync::{Arc, Mutex};
use support::{image_input, GateRemover, MockRemover};

fn store_with(names: &[&str]) -> QueueStore {
    let mut store = QueueStore::new();
    store
        .add(names.iter().map(|n| image_input(n, 4, 4)).collect())
        .unwrap();
    store
}

/// B fails, A and C still finish
#[tokio::test]
async fn test_failure_does_not_affect_groupmates() {
    let queue = shared(store_with(&["a.png", "b.png", "c.png"]));
    let remover = MockRemover::new().failing(&["b.png"]);
    let dispatcher = Dispatcher::new(queue.clone(), remover, 2);

    let report = dispatcher.process_all().await;

    assert_eq!(report.groups, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);

    let store = queue.lock().await;
    let records = store.records();
    assert_eq!(records[0].status(), RecordStatus::Done);
    assert_eq!(records[1].status(), RecordStatus::Error);
    assert_eq!(records[1].last_error(), Some("server responded with status 500"));
    assert!(records[1].result().is_none());
    assert_eq!(records[2].status(), RecordStatus::Done);
}

#[tokio::test]
async fn test_groups_bound_concurrency() {
    let queue = shared(store_with(&["1.png", "2.png", "3.png", "4.png", "5.png"]));
    let remover = MockRemover::new();
    let dispatcher = Dispatcher::new(queue.clone(), remover.clone(), 2);

    let report = dispatcher.process_all().await;

    assert_eq!(report.groups, 3);
    assert_eq!(report.succeeded, 5);
    assert_eq!(remover.calls(), 5);
    assert_eq!(remover.peak(), 2);
    assert!(queue.lock().await.summary().is_settled());
}

#[tokio::test]
async fn test_next_group_waits_for_slowest() {
    let queue = shared(store_with(&["a.png", "b.png", "c.png"]));
    let remover = MockRemover::new()
        .failing(&["b.png"])
        .delays(&[("a.png", 60), ("b.png", 5), ("c.png", 5)]);
    let dispatcher = Dispatcher::new(queue.clone(), remover.clone(), 2);

    dispatcher.process_all().await;

    // b settles first but c only starts once a has settled too
    assert!(remover.position("end:b.png") < remover.position("end:a.png"));
    assert!(remover.position("start:c.png") > remover.position("end:a.png"));
}

#[tokio::test]
async fn test_concurrency_one_is_sequential() {
    let queue = shared(store_with(&["a.png", "b.png", "c.png"]));
    let remover = MockRemover::new();
    let dispatcher = Dispatcher::new(queue, remover.clone(), 1);

    let report = dispatcher.process_all().await;

    assert_eq!(report.groups, 3);
    assert_eq!(remover.peak(), 1);
}

#[tokio::test]
async fn test_zero_concurrency_is_normalised() {
    let queue = shared(store_with(&["a.png"]));
    let dispatcher = Dispatcher::new(queue, MockRemover::new(), 0);
    assert_eq!(dispatcher.concurrency(), 1);
    assert_eq!(dispatcher.process_all().await.succeeded, 1);
}

#[tokio::test]
async fn test_process_single_skips_non_ready() {
    let queue = shared(store_with(&["a.png"]));
    let remover = MockRemover::new();
    let dispatcher = Dispatcher::new(queue.clone(), remover.clone(), 2);
    let id = queue.lock().await.ready_ids()[0];

    assert_eq!(dispatcher.process_single(id).await, SubmitOutcome::Done);
    assert_eq!(dispatcher.process_single(id).await, SubmitOutcome::Skipped);
    assert_eq!(remover.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_submissions_of_same_record() {
    let queue = shared(store_with(&["a.png"]));
    let remover = MockRemover::new();
    let dispatcher = Dispatcher::new(queue.clone(), remover.clone(), 2);
    let id = queue.lock().await.ready_ids()[0];

    let (first, second) = tokio::join!(dispatcher.process_single(id), dispatcher.process_single(id));

    let mut outcomes = vec![first, second];
    outcomes.sort_by_key(|o| matches!(o, SubmitOutcome::Skipped));
    assert_eq!(outcomes, vec![SubmitOutcome::Done, SubmitOutcome::Skipped]);
    assert_eq!(remover.calls(), 1);
}

#[tokio::test]
async fn test_process_all_with_nothing_ready() {
    let queue = shared(QueueStore::new());
    let remover = MockRemover::new();
    let dispatcher = Dispatcher::new(queue, remover.clone(), 2);

    let report = dispatcher.process_all().await;

    assert_eq!(report.groups, 0);
    assert_eq!(remover.calls(), 0);
}

/// A record removed mid-flight must not be resurrected by its result
#[tokio::test]
async fn test_result_for_removed_record_is_discarded() {
    let queue = shared(store_with(&["a.png", "b.png"]));
    let remover = GateRemover::default();
    let dispatcher = Dispatcher::new(queue.clone(), remover.clone(), 2);
    let id = queue.lock().await.ready_ids()[0];

    let (outcome, _) = tokio::join!(dispatcher.process_single(id), async {
        remover.started.notified().await;
        assert!(queue.lock().await.remove(id));
        remover.release.notify_one();
    });

    assert_eq!(outcome, SubmitOutcome::Discarded);
    let store = queue.lock().await;
    assert_eq!(store.len(), 1);
    assert!(store.get(id).is_none());
    assert_eq!(store.live_handles(), 1);
    assert_eq!(store.handle_stats().live(), 1);
}

#[tokio::test]
async fn test_result_after_reset_is_discarded() {
    let queue = shared(store_with(&["a.png"]));
    let remover = GateRemover::default();
    let dispatcher = Dispatcher::new(queue.clone(), remover.clone(), 2);
    let id = queue.lock().await.ready_ids()[0];

    let (outcome, _) = tokio::join!(dispatcher.process_single(id), async {
        remover.started.notified().await;
        queue.lock().await.reset();
        remover.release.notify_one();
    });

    assert_eq!(outcome, SubmitOutcome::Discarded);
    assert_eq!(queue.lock().await.live_handles(), 0);
}

#[tokio::test]
async fn test_handles_match_artifacts_after_batch() {
    let queue = shared(store_with(&["a.png", "b.png", "c.png"]));
    let remover = MockRemover::new().failing(&["c.png"]);
    let dispatcher = Dispatcher::new(queue.clone(), remover, 2);

    dispatcher.process_all().await;

    let store = queue.lock().await;
    let artifacts: usize = store.records().iter().map(|r| r.artifact_count()).sum();
    assert_eq!(artifacts, 5);
    assert_eq!(store.live_handles(), artifacts);
    assert_eq!(store.handle_stats().live(), artifacts as u64);
}

#[tokio::test]
async fn test_observer_sees_each_outcome() {
    let queue = shared(store_with(&["a.png", "b.png"]));
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let dispatcher = Dispatcher::new(queue, MockRemover::new().failing(&["b.png"]), 2)
        .with_observer(move |event| sink.lock().unwrap().push(event.clone()));

    dispatcher.process_all().await;

    let events = events.lock().unwrap();
    let submitted = events
        .iter()
        .filter(|e| matches!(e, DispatchEvent::Submitted { .. }))
        .count();
    assert_eq!(submitted, 2);
    assert!(events
        .iter()
        .any(|e| matches!(e, DispatchEvent::Completed { name, .. } if name == "a.png")));
    assert!(events.iter().any(
        |e| matches!(e, DispatchEvent::Failed { name, error, .. } if name == "b.png" && error.contains("500"))
    ));
}
