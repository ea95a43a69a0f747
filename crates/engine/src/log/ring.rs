// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

use crate::error::Error;

/// Fixed-capacity ring keeping the most recently pushed values.
///
/// Values are stored in `head + offset` slots, wrapping at `capacity`. Once
/// full, every push overwrites the oldest value. Not synchronized: owners
/// wrap it in their own lock.
pub struct CircularBuffer<T> {
    slots: Box<[Option<T>]>,
    index_mask: Option<usize>,
    // Slot of the oldest value.
    head: usize,
    len: usize,
}

impl<T> CircularBuffer<T> {
    /// Creates an empty buffer. Fails with [`Error::InvalidCapacity`] when
    /// `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity {
                component: "circular buffer",
            });
        }
        let index_mask = capacity.is_power_of_two().then(|| capacity - 1);
        Ok(Self {
            slots: (0..capacity).map(|_| None).collect(),
            index_mask,
            head: 0,
            len: 0,
        })
    }

    /// Maximum number of retained values.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of retained values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no value is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the next push evicts a value.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Appends a value, returning the evicted oldest value when full.
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.is_full() {
            let slot = self.slot(self.head);
            let evicted = self.slots[slot].replace(value);
            self.head = self.slot(self.head + 1);
            evicted
        } else {
            let slot = self.slot(self.head + self.len);
            self.slots[slot] = Some(value);
            self.len += 1;
            None
        }
    }

    /// The value at `offset` from the oldest retained one.
    #[must_use]
    pub fn get(&self, offset: usize) -> Option<&T> {
        if offset >= self.len {
            return None;
        }
        self.slots[self.slot(self.head + offset)].as_ref()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |offset| self.get(offset))
    }

    /// Whether an equal value is retained.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|retained| retained == value)
    }

    /// Drops every retained value.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }

    fn slot(&self, position: usize) -> usize {
        match self.index_mask {
            Some(mask) => position & mask,
            None => position % self.slots.len(),
        }
    }
}
