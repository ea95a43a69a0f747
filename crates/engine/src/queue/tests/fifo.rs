// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! FIFO receiver: overflow policies, batch operations and backpressure.

use crate::error::Error;
use crate::flow::{Retention, Sender, Sink, Source};
use crate::queue::QueueReceiver;
use ringflow_config::{QueueOnFullPolicy, QueuePolicies};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn policies(capacity: usize, on_full: QueueOnFullPolicy) -> QueuePolicies {
    QueuePolicies {
        capacity,
        on_full,
        block_timeout_ms: None,
    }
}

fn blocking(capacity: usize, timeout_ms: u64) -> QueuePolicies {
    QueuePolicies {
        block_timeout_ms: Some(timeout_ms),
        ..QueuePolicies::with_capacity(capacity)
    }
}

#[test]
fn zero_capacity_is_rejected() {
    let result = QueueReceiver::<u64>::with_capacity(0);
    assert!(matches!(
        result,
        Err(Error::InvalidCapacity {
            component: "queue receiver"
        })
    ));
}

#[test]
fn drop_newest_keeps_the_first_messages() {
    let queue = QueueReceiver::new(&policies(3, QueueOnFullPolicy::DropNewest))
        .expect("valid capacity");
    assert!(queue.drops_latest_on_full());

    for i in 0..5u64 {
        queue.post(i).expect("post never fails");
    }

    assert_eq!(queue.len(), 3);
    assert!(queue.is_full());
    assert_eq!(queue.dropped_count(), 2);
    assert_eq!(queue.receive_many(10), vec![0, 1, 2]);
}

/// Scenario:
/// 1. Given a FIFO queue of capacity 10 evicting the oldest message.
/// 2. When the messages 1 to 20 are posted.
/// 3. Then the queue holds exactly 11 to 20, in order.
#[test]
fn drop_oldest_keeps_the_last_messages() {
    let queue = QueueReceiver::with_capacity(10).expect("valid capacity");
    assert!(!queue.drops_latest_on_full());

    for i in 1..=20u64 {
        queue.post(i).expect("post never fails");
    }

    assert_eq!(queue.len(), 10);
    assert_eq!(queue.dropped_count(), 10);
    assert_eq!(queue.receive_many(usize::MAX), (11..=20).collect::<Vec<_>>());
    assert!(queue.is_empty());
}

#[test]
fn peek_leaves_messages_in_place() {
    let queue = QueueReceiver::with_capacity(4).expect("valid capacity");
    assert_eq!(queue.try_peek(), None);
    for i in [7u64, 8, 9] {
        queue.post(i).expect("post never fails");
    }

    assert_eq!(queue.try_peek(), Some(7));
    assert_eq!(queue.peek_many(2), vec![7, 8]);
    let mut buffer = vec![1];
    assert_eq!(queue.peek_many_into(10, &mut buffer), 3);
    assert_eq!(buffer, vec![1, 7, 8, 9]);
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.try_receive(), Some(7));
}

#[test]
fn receive_many_into_reuses_the_buffer() {
    let queue = QueueReceiver::with_capacity(8).expect("valid capacity");
    let mut buffer = Vec::with_capacity(4);

    for round in 0..3u64 {
        for i in 0..4 {
            queue.post(round * 10 + i).expect("post never fails");
        }
        buffer.clear();
        assert_eq!(queue.receive_many_into(3, &mut buffer), 3);
        assert_eq!(buffer, vec![round * 10, round * 10 + 1, round * 10 + 2]);
        assert_eq!(queue.receive_many_into(3, &mut buffer), 1);
        assert_eq!(buffer.len(), 4);
    }
    assert_eq!(queue.receive_many_into(3, &mut buffer), 0);
}

#[test]
fn wait_handle_tracks_availability() {
    let queue = QueueReceiver::with_capacity(2).expect("valid capacity");
    assert!(!queue.wait_handle().is_set());

    queue.post(1u64).expect("post never fails");
    queue.post(2).expect("post never fails");
    assert!(queue.wait_handle().is_set());

    assert_eq!(queue.try_receive(), Some(1));
    assert!(queue.wait_handle().is_set());
    assert_eq!(queue.try_receive(), Some(2));
    assert!(!queue.wait_handle().is_set());

    queue.post(3).expect("post never fails");
    queue.clear();
    assert!(queue.is_empty());
    assert!(!queue.wait_handle().is_set());
}

#[test]
fn queue_receives_from_a_source() {
    let sender = Sender::<u64>::new();
    let queue = Arc::new(QueueReceiver::with_capacity(4).expect("valid capacity"));
    _ = sender.connect_to(queue.clone(), Retention::Strong);

    sender.post(1).expect("post never fails");
    sender.post_ref(&2).expect("post never fails");

    assert_eq!(queue.receive_many(4), vec![1, 2]);
}

// =========================================================================
// Waiting
// =========================================================================

#[test]
fn receive_timeout_expires_on_empty_queue() {
    let queue = QueueReceiver::<u64>::with_capacity(1).expect("valid capacity");
    let started = Instant::now();

    assert_eq!(queue.receive_timeout(Duration::from_millis(20)), None);
    assert!(started.elapsed() >= Duration::from_millis(20));
}

#[test]
fn receive_timeout_returns_message_posted_by_another_thread() {
    let queue = QueueReceiver::with_capacity(1).expect("valid capacity");

    std::thread::scope(|scope| {
        _ = scope.spawn(|| {
            std::thread::sleep(Duration::from_millis(20));
            queue.post(5u64).expect("post never fails");
        });
        assert_eq!(queue.receive_timeout(Duration::from_secs(5)), Some(5));
    });
}

#[tokio::test(flavor = "current_thread")]
async fn receive_async_waits_for_a_message() {
    let queue = Arc::new(QueueReceiver::with_capacity(1).expect("valid capacity"));
    let producer = queue.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        producer.post_async(6u64).await
    });

    assert_eq!(queue.receive_async(None).await, Some(6));
    handle
        .await
        .expect("producer task should finish")
        .expect("post never fails");
    assert_eq!(
        queue.receive_async(Some(Duration::from_millis(10))).await,
        None
    );
}

// =========================================================================
// Backpressure
// =========================================================================

/// Scenario:
/// 1. Given a full queue of capacity 1 with a generous block timeout.
/// 2. When a consumer thread frees the slot while a producer is blocked.
/// 3. Then the blocked message is admitted without any drop.
#[test]
fn blocked_producer_is_admitted_once_room_is_made() {
    let queue = QueueReceiver::new(&blocking(1, 5_000)).expect("valid capacity");
    queue.post(1u64).expect("post never fails");

    std::thread::scope(|scope| {
        let consumer = scope.spawn(|| {
            std::thread::sleep(Duration::from_millis(20));
            queue.try_receive()
        });
        queue.post(2).expect("post never fails");
        assert_eq!(consumer.join().expect("consumer should not panic"), Some(1));
    });

    assert_eq!(queue.dropped_count(), 0);
    assert_eq!(queue.receive_many(2), vec![2]);
}

#[test]
fn blocked_producer_falls_back_to_policy_on_timeout() {
    let queue = QueueReceiver::new(&blocking(1, 20)).expect("valid capacity");
    queue.post(1u64).expect("post never fails");

    let started = Instant::now();
    queue.post(2).expect("post never fails");

    assert!(started.elapsed() >= Duration::from_millis(20));
    assert_eq!(queue.dropped_count(), 1);
    assert_eq!(queue.try_receive(), Some(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_producer_suspends_until_room_is_made() {
    let queue = Arc::new(QueueReceiver::new(&blocking(1, 5_000)).expect("valid capacity"));
    queue.post_async(1u64).await.expect("post never fails");

    let consumer = queue.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        consumer.try_receive()
    });
    queue.post_async(2).await.expect("post never fails");

    assert_eq!(handle.await.expect("consumer task should finish"), Some(1));
    assert_eq!(queue.dropped_count(), 0);
    assert_eq!(queue.try_receive(), Some(2));
}

#[tokio::test(flavor = "current_thread")]
async fn async_producer_applies_drop_newest_after_timeout() {
    let policies = QueuePolicies {
        on_full: QueueOnFullPolicy::DropNewest,
        ..blocking(1, 10)
    };
    let queue = QueueReceiver::new(&policies).expect("valid capacity");
    queue.post_async(1u64).await.expect("post never fails");

    queue.post_async(2).await.expect("post never fails");

    assert_eq!(queue.dropped_count(), 1);
    assert_eq!(queue.receive_many(2), vec![1]);
}
