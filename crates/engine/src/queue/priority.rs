// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Priority discipline.
//!
//! Messages are kept sorted from lowest to highest priority in a `VecDeque`:
//! receiving pops the back, overflow evicts the front. An incoming message is
//! inserted in front of every stored message of equal priority, so among
//! equals the oldest sits closest to the back and is received first.

use crate::error::Error;
use crate::flow::Message;
use crate::queue::bounded::{BoundedQueue, QueueDiscipline};
use ringflow_config::PriorityQueuePolicies;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;

/// A bounded priority queue receiver.
pub type PriorityQueueReceiver<T> = BoundedQueue<T, Priority<T>>;

type Comparer<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Comparer-ordered storage, highest priority first, FIFO among equals.
pub struct Priority<T> {
    // Ascending priority; among equals, newest first.
    items: VecDeque<T>,
    compare: Comparer<T>,
}

impl<T: Send> QueueDiscipline<T> for Priority<T> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn push(&mut self, msg: T) {
        let position = self
            .items
            .partition_point(|stored| (self.compare)(stored, &msg) == Ordering::Less);
        self.items.insert(position, msg);
    }

    fn push_when_full(&mut self, msg: T) -> Option<T> {
        let admits = match self.items.front() {
            Some(lowest) => (self.compare)(&msg, lowest) != Ordering::Less,
            None => true,
        };
        if !admits {
            return Some(msg);
        }
        let evicted = self.items.pop_front();
        self.push(msg);
        evicted
    }

    fn pop(&mut self) -> Option<T> {
        self.items.pop_back()
    }

    fn peek(&self, n: usize) -> Option<&T> {
        let index = self.items.len().checked_sub(n + 1)?;
        self.items.get(index)
    }

    fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Message> BoundedQueue<T, Priority<T>> {
    /// Creates a priority queue receiver. `compare` orders messages by
    /// priority: `Greater` means received earlier.
    ///
    /// Fails with [`Error::InvalidCapacity`] when `policies.capacity` is 0.
    pub fn new(
        policies: &PriorityQueuePolicies,
        compare: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    ) -> Result<Self, Error> {
        let priority = Priority {
            items: VecDeque::new(),
            compare: Arc::new(compare),
        };
        Self::with_discipline(
            "priority queue receiver",
            priority,
            policies.capacity,
            policies.block_timeout(),
        )
    }

    /// Creates a priority queue receiver using the messages' natural order.
    pub fn with_natural_order(policies: &PriorityQueuePolicies) -> Result<Self, Error>
    where
        T: Ord,
    {
        Self::new(policies, T::cmp)
    }
}
