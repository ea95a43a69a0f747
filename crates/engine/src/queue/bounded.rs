// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Shared machinery of the bounded queue receivers.
//!
//! # Locking
//!
//! One `parking_lot::Mutex` guards the buffer. Every transition (enqueue,
//! eviction, removal, peek) happens under it, including updates of the
//! availability [`WaitHandle`], so `len`, `is_full` and the handle state never
//! disagree once the lock is released.
//!
//! # Backpressure
//!
//! With a block timeout, a producer facing a full queue waits for a removal
//! before applying the discipline's overflow rule. Blocking producers park on
//! `room` (a condition variable bound to the buffer lock); async producers
//! await `room_notify`. Removals signal both, only when a timeout is
//! configured.

use crate::error::Error;
use crate::flow::{Message, Sink};
use crate::queue::wait_handle::WaitHandle;
use async_trait::async_trait;
use parking_lot::{Condvar, Mutex};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// Storage and ordering policy of a [`BoundedQueue`].
pub trait QueueDiscipline<T>: Send {
    /// Number of stored messages.
    fn len(&self) -> usize;

    /// Whether no message is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores a message. Only called while below capacity.
    fn push(&mut self, msg: T);

    /// Stores a message while at capacity, discarding one message to stay
    /// within it. Returns the discarded message: either `msg` itself or an
    /// evicted resident.
    fn push_when_full(&mut self, msg: T) -> Option<T>;

    /// Removes the next message in removal order.
    fn pop(&mut self) -> Option<T>;

    /// The `n`-th message in removal order, without removing it.
    fn peek(&self, n: usize) -> Option<&T>;

    /// Removes every message.
    fn clear(&mut self);
}

/// A bounded, lock-protected buffer of messages implementing [`Sink`].
pub struct BoundedQueue<T, D> {
    state: Mutex<D>,
    capacity: usize,
    block_timeout: Option<Duration>,
    available: WaitHandle,
    room: Condvar,
    room_notify: Notify,
    dropped: AtomicU64,
    _message: PhantomData<fn(T) -> T>,
}

impl<T: Message, D: QueueDiscipline<T>> BoundedQueue<T, D> {
    pub(super) fn with_discipline(
        component: &'static str,
        discipline: D,
        capacity: usize,
        block_timeout: Option<Duration>,
    ) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity { component });
        }
        Ok(Self {
            state: Mutex::new(discipline),
            capacity,
            block_timeout,
            available: WaitHandle::new(false),
            room: Condvar::new(),
            room_notify: Notify::new(),
            dropped: AtomicU64::new(0),
            _message: PhantomData,
        })
    }

    /// Maximum number of stored messages.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How long producers wait for room before the overflow rule applies.
    #[must_use]
    pub fn block_timeout(&self) -> Option<Duration> {
        self.block_timeout
    }

    /// Number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    /// Whether no message is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }

    /// Whether the queue is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.state.lock().len() >= self.capacity
    }

    /// Signal set while the queue holds at least one message.
    #[must_use]
    pub fn wait_handle(&self) -> &WaitHandle {
        &self.available
    }

    /// Number of messages discarded by the overflow rule so far.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Removes and returns the next message, if any.
    pub fn try_receive(&self) -> Option<T> {
        let mut state = self.state.lock();
        let msg = state.pop()?;
        self.after_removal(&state);
        Some(msg)
    }

    /// Returns a copy of the next message without removing it.
    #[must_use]
    pub fn try_peek(&self) -> Option<T> {
        self.state.lock().peek(0).cloned()
    }

    /// Removes up to `max_items` messages, in removal order.
    #[must_use]
    pub fn receive_many(&self, max_items: usize) -> Vec<T> {
        let mut items = Vec::new();
        _ = self.receive_many_into(max_items, &mut items);
        items
    }

    /// Removes up to `max_items` messages and appends them to `buffer`, so a
    /// consumer can reuse one allocation across calls. Returns how many
    /// messages were appended.
    pub fn receive_many_into(&self, max_items: usize, buffer: &mut Vec<T>) -> usize {
        let mut state = self.state.lock();
        let count = max_items.min(state.len());
        buffer.reserve(count);
        for _ in 0..count {
            if let Some(msg) = state.pop() {
                buffer.push(msg);
            }
        }
        if count > 0 {
            self.after_removal(&state);
        }
        count
    }

    /// Copies up to `max_items` messages, in removal order, without removing
    /// them.
    #[must_use]
    pub fn peek_many(&self, max_items: usize) -> Vec<T> {
        let mut items = Vec::new();
        _ = self.peek_many_into(max_items, &mut items);
        items
    }

    /// Copies up to `max_items` messages into `buffer` without removing
    /// them. Returns how many messages were appended.
    pub fn peek_many_into(&self, max_items: usize, buffer: &mut Vec<T>) -> usize {
        let state = self.state.lock();
        let count = max_items.min(state.len());
        buffer.reserve(count);
        buffer.extend((0..count).filter_map(|n| state.peek(n).cloned()));
        count
    }

    /// Removes the next message, blocking the current thread up to `timeout`
    /// while the queue is empty.
    pub fn receive_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(msg) = self.try_receive() {
                return Some(msg);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !self.available.wait_timeout(remaining) {
                return self.try_receive();
            }
        }
    }

    /// Removes the next message, waiting while the queue is empty. Without a
    /// timeout this waits until a message arrives.
    pub async fn receive_async(&self, timeout: Option<Duration>) -> Option<T> {
        let deadline = timeout.map(|timeout| tokio::time::Instant::now() + timeout);
        loop {
            if let Some(msg) = self.try_receive() {
                return Some(msg);
            }
            match deadline {
                None => self.available.wait().await,
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, self.available.wait())
                        .await
                        .is_err()
                    {
                        return self.try_receive();
                    }
                }
            }
        }
    }

    /// Removes every stored message.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.clear();
        self.after_removal(&state);
    }

    /// Runs `f` against the discipline under the buffer lock.
    pub(super) fn discipline<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        f(&self.state.lock())
    }

    /// Applies the enqueue rule. Called with the buffer lock held.
    fn enqueue(&self, state: &mut D, msg: T) {
        if state.len() < self.capacity {
            state.push(msg);
        } else if let Some(discarded) = state.push_when_full(msg) {
            drop(discarded);
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::trace!(
                capacity = self.capacity,
                dropped_total = total,
                "queue full, message discarded"
            );
        }
        if !state.is_empty() {
            self.available.set();
        }
    }

    /// Enqueues without waiting if there is room; hands the message back
    /// otherwise.
    fn try_enqueue(&self, msg: T) -> Result<(), T> {
        let mut state = self.state.lock();
        if state.len() >= self.capacity {
            return Err(msg);
        }
        self.enqueue(&mut state, msg);
        Ok(())
    }

    /// Called with the buffer lock held after messages were removed.
    fn after_removal(&self, state: &D) {
        if state.is_empty() {
            self.available.reset();
        }
        if self.block_timeout.is_some() {
            _ = self.room.notify_all();
            self.room_notify.notify_waiters();
        }
    }
}

#[async_trait]
impl<T: Message, D: QueueDiscipline<T>> Sink<T> for BoundedQueue<T, D> {
    fn post(&self, msg: T) -> Result<(), Error> {
        let mut state = self.state.lock();
        if let Some(timeout) = self.block_timeout {
            let deadline = Instant::now() + timeout;
            while state.len() >= self.capacity {
                if self.room.wait_until(&mut state, deadline).timed_out() {
                    break;
                }
            }
        }
        self.enqueue(&mut state, msg);
        Ok(())
    }

    async fn post_async(&self, msg: T) -> Result<(), Error> {
        let Some(timeout) = self.block_timeout else {
            let mut state = self.state.lock();
            self.enqueue(&mut state, msg);
            return Ok(());
        };
        let deadline = tokio::time::Instant::now() + timeout;
        let mut msg = msg;
        loop {
            let room = self.room_notify.notified();
            match self.try_enqueue(msg) {
                Ok(()) => return Ok(()),
                Err(rejected) => msg = rejected,
            }
            if tokio::time::timeout_at(deadline, room).await.is_err() {
                break;
            }
        }
        let mut state = self.state.lock();
        self.enqueue(&mut state, msg);
        Ok(())
    }
}
