// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the durable queue module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::queue::*;
use super::store::{FileStore, MemoryStore, Store, QUEUE_BLOB};
use super::test_helpers::{make_test_op, manual_time, start_time};
use tempfile::tempdir;
use yare::parameterized;

fn open(store: &MemoryStore) -> DurableQueue<MemoryStore> {
    DurableQueue::with_time(store.clone(), RetryPolicy::default(), manual_time()).unwrap()
}

#[test]
fn test_queue_starts_empty() {
    let queue = open(&MemoryStore::new());
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
    assert!(queue.peek_ordered().is_empty());
}

#[test]
fn test_enqueue_preserves_insertion_order() {
    let mut queue = open(&MemoryStore::new());

    let a = queue.enqueue(make_test_op("/a")).unwrap();
    let b = queue.enqueue(make_test_op("/b")).unwrap();
    let c = queue.enqueue(make_test_op("/c")).unwrap();

    let ids: Vec<_> = queue.peek_ordered().iter().map(|op| op.id).collect();
    assert_eq!(ids, vec![a, b, c]);
}

#[test]
fn test_enqueue_stamps_time_and_zero_retries() {
    let mut queue = open(&MemoryStore::new());
    let id = queue.enqueue(make_test_op("/a")).unwrap();

    let op = queue.get(id).unwrap();
    assert_eq!(op.enqueued_at, start_time());
    assert_eq!(op.retry_count, 0);
}

#[test]
fn test_enqueue_persists_before_returning() {
    let store = MemoryStore::new();
    let mut queue = open(&store);
    let id = queue.enqueue(make_test_op("/a")).unwrap();

    let reopened = open(&store);
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.peek_ordered()[0].id, id);
}

#[test]
fn test_peek_does_not_mutate() {
    let mut queue = open(&MemoryStore::new());
    queue.enqueue(make_test_op("/a")).unwrap();

    let first = queue.peek_ordered();
    let second = queue.peek_ordered();
    assert_eq!(first, second);
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_ids_are_unique() {
    let mut queue = open(&MemoryStore::new());
    let mut ids = std::collections::HashSet::new();
    for i in 0..50 {
        ids.insert(queue.enqueue(make_test_op(&format!("/op/{i}"))).unwrap());
    }
    assert_eq!(ids.len(), 50);
}

#[test]
fn test_mark_succeeded_removes_entry() {
    let store = MemoryStore::new();
    let mut queue = open(&store);
    let a = queue.enqueue(make_test_op("/a")).unwrap();
    let b = queue.enqueue(make_test_op("/b")).unwrap();

    assert!(queue.mark_succeeded(a).unwrap());
    assert!(!queue.mark_succeeded(a).unwrap());

    let reopened = open(&store);
    let ids: Vec<_> = reopened.peek_ordered().iter().map(|op| op.id).collect();
    assert_eq!(ids, vec![b]);
}

#[test]
fn test_mark_failed_increments_and_persists() {
    let store = MemoryStore::new();
    let mut queue = open(&store);
    let id = queue.enqueue(make_test_op("/a")).unwrap();

    assert_eq!(
        queue.mark_failed(id).unwrap(),
        FailureOutcome::Retrying { retry_count: 1 }
    );
    assert_eq!(
        queue.mark_failed(id).unwrap(),
        FailureOutcome::Retrying { retry_count: 2 }
    );

    let reopened = open(&store);
    assert_eq!(reopened.get(id).unwrap().retry_count, 2);
}

#[test]
fn test_mark_failed_drops_at_max_retries() {
    let mut queue = open(&MemoryStore::new());
    let id = queue.enqueue(make_test_op("/a")).unwrap();

    queue.mark_failed(id).unwrap();
    queue.mark_failed(id).unwrap();
    let outcome = queue.mark_failed(id).unwrap();

    match outcome {
        FailureOutcome::Dropped(op) => {
            assert_eq!(op.id, id);
            assert_eq!(op.retry_count, 3);
        }
        other => panic!("expected drop, got {other:?}"),
    }
    assert!(queue.is_empty());
}

#[parameterized(
    one = { 1, 1 },
    three = { 3, 3 },
    five = { 5, 5 },
)]
fn test_configured_retry_cap(max_retries: u32, failures_to_drop: u32) {
    let store = MemoryStore::new();
    let mut queue =
        DurableQueue::with_time(store, RetryPolicy::new(max_retries), manual_time()).unwrap();
    let id = queue.enqueue(make_test_op("/a")).unwrap();

    for _ in 1..failures_to_drop {
        assert!(matches!(
            queue.mark_failed(id).unwrap(),
            FailureOutcome::Retrying { .. }
        ));
    }
    assert!(matches!(
        queue.mark_failed(id).unwrap(),
        FailureOutcome::Dropped(_)
    ));
}

#[test]
fn test_mark_failed_unknown_id() {
    let mut queue = open(&MemoryStore::new());
    let id = cw_core::OpId::new();
    assert!(matches!(queue.mark_failed(id), Err(QueueError::NotFound(got)) if got == id));
}

#[test]
fn test_failed_save_leaves_memory_unchanged() {
    let store = MemoryStore::new();
    let mut queue = open(&store);
    let id = queue.enqueue(make_test_op("/a")).unwrap();

    store.set_fail_writes(true);
    assert!(queue.enqueue(make_test_op("/b")).is_err());
    assert!(queue.mark_failed(id).is_err());
    assert!(queue.mark_succeeded(id).is_err());

    assert_eq!(queue.len(), 1);
    assert_eq!(queue.get(id).unwrap().retry_count, 0);
}

#[test]
fn test_discard_and_clear() {
    let store = MemoryStore::new();
    let mut queue = open(&store);
    let a = queue.enqueue(make_test_op("/a")).unwrap();
    queue.enqueue(make_test_op("/b")).unwrap();

    let removed = queue.discard(a).unwrap().unwrap();
    assert_eq!(removed.endpoint, "/a");
    assert!(queue.discard(a).unwrap().is_none());

    let cleared = queue.clear().unwrap();
    assert_eq!(cleared.len(), 1);
    assert_eq!(cleared[0].endpoint, "/b");
    assert!(queue.is_empty());
    assert!(open(&store).is_empty());
}

#[test]
fn test_queue_blob_with_blank_lines() {
    let store = MemoryStore::new();
    let mut queue = open(&store);
    queue.enqueue(make_test_op("/a")).unwrap();
    queue.enqueue(make_test_op("/b")).unwrap();

    let mut bytes = store.blob(QUEUE_BLOB).unwrap();
    bytes.extend_from_slice(b"\n   \n");
    store.save(QUEUE_BLOB, &bytes).unwrap();

    assert_eq!(open(&store).len(), 2);
}

#[test]
fn test_corrupt_queue_blob_is_an_error() {
    let store = MemoryStore::new();
    store.save(QUEUE_BLOB, b"{not json}\n").unwrap();

    let result = DurableQueue::open(store, RetryPolicy::default());
    assert!(matches!(result, Err(QueueError::Data(_))));
}

#[test]
fn test_queue_on_disk_is_jsonl() {
    let dir = tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    let mut queue = DurableQueue::open(store, RetryPolicy::default()).unwrap();

    queue.enqueue(make_test_op("/a")).unwrap();
    queue.enqueue(make_test_op("/b")).unwrap();

    let text = std::fs::read_to_string(dir.path().join(QUEUE_BLOB)).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\"/a\""));
    assert!(lines[1].contains("\"/b\""));
}

#[test]
fn test_retry_policy_exhausted() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_retries, DEFAULT_MAX_RETRIES);
    assert!(!policy.exhausted(2));
    assert!(policy.exhausted(3));
}
