// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! The message log.
//!
//! # IDs
//!
//! The first entry added gets ID 0 and every further entry the next one.
//! With `N` entries added since creation (or the last reset) and capacity
//! `C`, the retained IDs are `max(0, N - C) ..= N - 1`. An empty log reports
//! `-1` for both `latest_id` and `oldest_available_id`.
//!
//! # Locking
//!
//! ID assignment, insertion and eviction happen in one critical section
//! under a `parking_lot::Mutex`. Waiters are woken through a `Notify` after
//! the lock is released.

use crate::error::Error;
use crate::flow::{Message, Sink};
use crate::log::ring::CircularBuffer;
use async_trait::async_trait;
use parking_lot::Mutex;
use ringflow_config::LogPolicies;
use tokio::sync::Notify;
use tokio::sync::futures::Notified;
use tokio_util::sync::CancellationToken;

const EMPTY_ID: i64 = -1;

/// A contiguous run of log entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRange<T> {
    /// Entries, oldest first.
    pub items: Vec<T>,
    /// ID of `items[0]`, or `-1` when nothing matched.
    pub first_id: i64,
    /// ID following the last item, or `-1` when nothing matched.
    pub last_id_exclusive: i64,
}

impl<T> LogRange<T> {
    fn unmatched() -> Self {
        Self {
            items: Vec::new(),
            first_id: EMPTY_ID,
            last_id_exclusive: EMPTY_ID,
        }
    }

    /// Number of entries in the range.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the range holds no entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

struct LogState<T> {
    entries: CircularBuffer<T>,
    latest_id: i64,
    // Bumped by every reset so readers can tell IDs were reused.
    generation: u64,
}

impl<T> LogState<T> {
    fn oldest_id(&self) -> i64 {
        if self.latest_id == EMPTY_ID {
            return EMPTY_ID;
        }
        // `len <= capacity`, which fits an i64 for any allocatable buffer.
        self.latest_id + 1 - self.entries.len() as i64
    }

    fn offset_of(&self, id: i64) -> Option<usize> {
        let oldest = self.oldest_id();
        if id < oldest || id > self.latest_id || oldest == EMPTY_ID {
            return None;
        }
        usize::try_from(id - oldest).ok()
    }
}

/// A bounded, append-only log addressed by monotonically increasing IDs.
pub struct MessageLog<T> {
    state: Mutex<LogState<T>>,
    added: Notify,
}

impl<T: Message> MessageLog<T> {
    /// Creates an empty log retaining up to `capacity` entries.
    ///
    /// Fails with [`Error::InvalidCapacity`] when `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        let entries = CircularBuffer::new(capacity).map_err(|_| Error::InvalidCapacity {
            component: "message log",
        })?;
        Ok(Self {
            state: Mutex::new(LogState {
                entries,
                latest_id: EMPTY_ID,
                generation: 0,
            }),
            added: Notify::new(),
        })
    }

    /// Creates an empty log from its policies.
    pub fn with_policies(policies: &LogPolicies) -> Result<Self, Error> {
        Self::new(policies.capacity)
    }

    /// Maximum number of retained entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.lock().entries.capacity()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the log holds no entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// ID of the newest entry, `-1` when empty.
    #[must_use]
    pub fn latest_id(&self) -> i64 {
        self.state.lock().latest_id
    }

    /// ID of the oldest retained entry, `-1` when empty.
    #[must_use]
    pub fn oldest_available_id(&self) -> i64 {
        self.state.lock().oldest_id()
    }

    /// Appends an entry, evicting the oldest one when full. Returns the new
    /// entry's ID.
    pub fn add(&self, value: T) -> i64 {
        let id = {
            let mut state = self.state.lock();
            let evicted = state.entries.push(value);
            state.latest_id += 1;
            if evicted.is_some() {
                tracing::trace!(
                    latest_id = state.latest_id,
                    oldest_id = state.oldest_id(),
                    "log full, oldest entry evicted"
                );
            }
            state.latest_id
        };
        self.added.notify_waiters();
        id
    }

    /// Appends every value in order under a single lock. Returns the ID of
    /// the last entry, which is the current `latest_id` when `values` is
    /// empty.
    pub fn add_range(&self, values: impl IntoIterator<Item = T>) -> i64 {
        let (latest_id, added) = {
            let mut state = self.state.lock();
            let mut added = 0usize;
            for value in values {
                _ = state.entries.push(value);
                state.latest_id += 1;
                added += 1;
            }
            (state.latest_id, added)
        };
        if added > 0 {
            self.added.notify_waiters();
        }
        latest_id
    }

    /// Copy of the entry with the given ID, if it is still retained.
    #[must_use]
    pub fn try_get_from_id(&self, id: i64) -> Option<T> {
        let state = self.state.lock();
        let offset = state.offset_of(id)?;
        state.entries.get(offset).cloned()
    }

    /// Copies up to `max_items` consecutive entries starting at
    /// `max(from_id, oldest_available_id)`.
    ///
    /// An empty log, or a `from_id` past the latest entry, yields an empty
    /// range with both bounds set to `-1`.
    #[must_use]
    pub fn get_all_available(&self, from_id: i64, max_items: usize) -> LogRange<T> {
        Self::read_range(&self.state.lock(), from_id, max_items)
    }

    /// Copy of the newest entry.
    ///
    /// Fails with [`Error::LogEmpty`] when the log holds no entry.
    pub fn get_latest(&self) -> Result<T, Error> {
        let state = self.state.lock();
        let offset = state.offset_of(state.latest_id).ok_or(Error::LogEmpty)?;
        state.entries.get(offset).cloned().ok_or(Error::LogEmpty)
    }

    /// Completes once an entry with an ID of at least `id` has been added.
    ///
    /// Returns `true` immediately if that is already the case, and `false`
    /// if `cancel` fires first.
    pub async fn wait_for_id(&self, id: i64, cancel: &CancellationToken) -> bool {
        loop {
            // Registered before the check so an `add` in between is not missed.
            let added = self.added.notified();
            if self.latest_id() >= id {
                return true;
            }
            tokio::select! {
                () = added => {}
                () = cancel.cancelled() => return false,
            }
        }
    }

    /// Drops every entry. The next entry added gets ID 0 again.
    pub fn reset(&self) {
        {
            let mut state = self.state.lock();
            state.entries.clear();
            state.latest_id = EMPTY_ID;
            state.generation += 1;
            tracing::debug!(generation = state.generation, "message log reset");
        }
        self.added.notify_waiters();
    }

    /// Like [`MessageLog::get_all_available`], also reporting the reset
    /// generation the range was read from.
    pub(crate) fn read_batch(&self, from_id: i64, max_items: usize) -> (LogRange<T>, u64) {
        let state = self.state.lock();
        (Self::read_range(&state, from_id, max_items), state.generation)
    }

    pub(crate) fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Future completing on the next add or reset.
    pub(crate) fn changed(&self) -> Notified<'_> {
        self.added.notified()
    }

    fn read_range(state: &LogState<T>, from_id: i64, max_items: usize) -> LogRange<T> {
        let oldest = state.oldest_id();
        if oldest == EMPTY_ID || from_id > state.latest_id {
            return LogRange::unmatched();
        }
        let first_id = from_id.max(oldest);
        let Some(start) = state.offset_of(first_id) else {
            return LogRange::unmatched();
        };
        let items: Vec<T> = (start..state.entries.len())
            .take(max_items)
            .filter_map(|offset| state.entries.get(offset).cloned())
            .collect();
        let last_id_exclusive = first_id + items.len() as i64;
        LogRange {
            items,
            first_id,
            last_id_exclusive,
        }
    }
}

#[async_trait]
impl<T: Message> Sink<T> for MessageLog<T> {
    fn post(&self, msg: T) -> Result<(), Error> {
        _ = self.add(msg);
        Ok(())
    }
}
