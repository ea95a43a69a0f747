// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! First-in, first-out discipline.

use crate::error::Error;
use crate::flow::Message;
use crate::queue::bounded::{BoundedQueue, QueueDiscipline};
use ringflow_config::QueuePolicies;
use std::collections::VecDeque;

/// A bounded FIFO queue receiver.
pub type QueueReceiver<T> = BoundedQueue<T, Fifo<T>>;

/// Insertion-ordered storage. On overflow either the incoming message or the
/// oldest stored one is discarded.
pub struct Fifo<T> {
    items: VecDeque<T>,
    drop_latest_on_full: bool,
}

impl<T: Send> QueueDiscipline<T> for Fifo<T> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn push(&mut self, msg: T) {
        self.items.push_back(msg);
    }

    fn push_when_full(&mut self, msg: T) -> Option<T> {
        if self.drop_latest_on_full {
            return Some(msg);
        }
        let evicted = self.items.pop_front();
        self.items.push_back(msg);
        evicted
    }

    fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    fn peek(&self, n: usize) -> Option<&T> {
        self.items.get(n)
    }

    fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Message> BoundedQueue<T, Fifo<T>> {
    /// Creates a FIFO queue receiver.
    ///
    /// Fails with [`Error::InvalidCapacity`] when `policies.capacity` is 0.
    pub fn new(policies: &QueuePolicies) -> Result<Self, Error> {
        let fifo = Fifo {
            items: VecDeque::new(),
            drop_latest_on_full: policies.drop_latest_on_full(),
        };
        Self::with_discipline(
            "queue receiver",
            fifo,
            policies.capacity,
            policies.block_timeout(),
        )
    }

    /// Creates a non-blocking FIFO queue receiver evicting the oldest message
    /// on overflow.
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Self::new(&QueuePolicies::with_capacity(capacity))
    }

    /// Whether the incoming message, rather than the oldest one, is dropped
    /// on overflow.
    #[must_use]
    pub fn drops_latest_on_full(&self) -> bool {
        self.discipline(|fifo| fifo.drop_latest_on_full)
    }
}
