// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Copy-on-write registry of the sinks connected to one source.
//!
//! # Snapshot
//!
//! Connections live in an immutable `Vec<SinkRef<T>>` published through an
//! `ArcSwap`. Dispatch performs a single atomic load and iterates the
//! snapshot without locking or allocating. Structural changes (connect,
//! disconnect, prune) build a new vector under the `mutation` lock and store
//! it; a snapshot that has been published is never modified.
//!
//! # Weak sinks
//!
//! A weak entry is upgraded at delivery time. Entries whose sink has been
//! dropped are skipped silently. When a dispatch observes one, it compacts the
//! snapshot afterwards if the mutation lock is free; otherwise the next
//! structural change drops it.
//!
//! # Ordering
//!
//! `forward`, `forward_ref` and `forward_async` all visit entries in index
//! order, which is connection order. The async path awaits each sink before
//! moving on, so sinks observe the same order whether or not an earlier sink
//! suspended.

use crate::error::Error;
use crate::flow::contract::{Message, Retention, Sink};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::{Arc, Weak};

enum SinkRef<T: Message> {
    Strong(Arc<dyn Sink<T>>),
    Weak(Weak<dyn Sink<T>>),
}

impl<T: Message> Clone for SinkRef<T> {
    fn clone(&self) -> Self {
        match self {
            SinkRef::Strong(sink) => SinkRef::Strong(Arc::clone(sink)),
            SinkRef::Weak(sink) => SinkRef::Weak(Weak::clone(sink)),
        }
    }
}

impl<T: Message> SinkRef<T> {
    fn new(sink: Arc<dyn Sink<T>>, retention: Retention) -> Self {
        match retention {
            Retention::Strong => SinkRef::Strong(sink),
            Retention::Weak => SinkRef::Weak(Arc::downgrade(&sink)),
        }
    }

    /// Address of the referenced sink, used as its identity.
    fn addr(&self) -> *const () {
        match self {
            SinkRef::Strong(sink) => Arc::as_ptr(sink).cast::<()>(),
            SinkRef::Weak(sink) => sink.as_ptr().cast::<()>(),
        }
    }

    fn is_alive(&self) -> bool {
        match self {
            SinkRef::Strong(_) => true,
            SinkRef::Weak(sink) => sink.strong_count() > 0,
        }
    }

    fn upgrade(&self) -> Option<Arc<dyn Sink<T>>> {
        match self {
            SinkRef::Strong(sink) => Some(Arc::clone(sink)),
            SinkRef::Weak(sink) => sink.upgrade(),
        }
    }

    /// Runs `f` against the sink if it is still alive.
    ///
    /// Strong entries are borrowed directly; weak entries are upgraded for
    /// the duration of the call.
    fn with_live<R>(&self, f: impl FnOnce(&dyn Sink<T>) -> R) -> Option<R> {
        match self {
            SinkRef::Strong(sink) => Some(f(sink.as_ref())),
            SinkRef::Weak(sink) => sink.upgrade().map(|sink| f(sink.as_ref())),
        }
    }
}

fn sink_addr<T: Message>(sink: &dyn Sink<T>) -> *const () {
    (sink as *const dyn Sink<T>).cast::<()>()
}

/// The set of sinks connected to one source, with the forwarding operations.
pub struct ConnectionRegistry<T: Message> {
    snapshot: ArcSwap<Vec<SinkRef<T>>>,
    // Serializes writers; dispatch never takes it.
    mutation: Mutex<()>,
}

impl<T: Message> Default for ConnectionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Message> ConnectionRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Vec::new()),
            mutation: Mutex::new(()),
        }
    }

    /// Connects a sink at the end of the dispatch order.
    ///
    /// Returns `false` without changing anything if the sink is already
    /// connected.
    pub fn connect(&self, sink: Arc<dyn Sink<T>>, retention: Retention) -> bool {
        let addr = Arc::as_ptr(&sink).cast::<()>();
        let _guard = self.mutation.lock();
        let current = self.snapshot.load();
        if current
            .iter()
            .any(|entry| entry.addr() == addr && entry.is_alive())
        {
            return false;
        }
        let mut next = Self::live_entries(&current);
        next.push(SinkRef::new(sink, retention));
        self.snapshot.store(Arc::new(next));
        true
    }

    /// Disconnects a sink. Returns `false` if it was not connected.
    pub fn disconnect(&self, sink: &dyn Sink<T>) -> bool {
        let addr = sink_addr(sink);
        let _guard = self.mutation.lock();
        let current = self.snapshot.load();
        let mut next = Self::live_entries(&current);
        let before = next.len();
        next.retain(|entry| entry.addr() != addr);
        let removed = next.len() != before;
        if removed || next.len() != current.len() {
            self.snapshot.store(Arc::new(next));
        }
        removed
    }

    /// Disconnects every sink.
    pub fn disconnect_all(&self) {
        let _guard = self.mutation.lock();
        self.snapshot.store(Arc::new(Vec::new()));
    }

    /// Live connected sinks, in dispatch order. Dropped weak sinks are never
    /// returned.
    #[must_use]
    pub fn connected_sinks(&self) -> Vec<Arc<dyn Sink<T>>> {
        self.snapshot
            .load()
            .iter()
            .filter_map(SinkRef::upgrade)
            .collect()
    }

    /// Whether the given sink is connected and alive.
    #[must_use]
    pub fn is_connected(&self, sink: &dyn Sink<T>) -> bool {
        let addr = sink_addr(sink);
        self.snapshot
            .load()
            .iter()
            .any(|entry| entry.addr() == addr && entry.is_alive())
    }

    /// Number of live connected sinks.
    #[must_use]
    pub fn count_connected_sinks(&self) -> usize {
        self.snapshot
            .load()
            .iter()
            .filter(|entry| entry.is_alive())
            .count()
    }

    /// Whether no live sink is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count_connected_sinks() == 0
    }

    /// Delivers `msg` to every live sink in connection order.
    ///
    /// The last entry receives the original value, the others a clone. The
    /// first sink error stops the dispatch and is returned as is.
    pub fn forward(&self, msg: T) -> Result<(), Error> {
        let entries = self.snapshot.load();
        let Some((last, rest)) = entries.split_last() else {
            return Ok(());
        };
        let mut saw_dead = false;
        for entry in rest {
            match entry.with_live(|sink| sink.post(msg.clone())) {
                Some(result) => result?,
                None => saw_dead = true,
            }
        }
        match last.with_live(|sink| sink.post(msg)) {
            Some(result) => result?,
            None => saw_dead = true,
        }
        drop(entries);
        if saw_dead {
            self.prune();
        }
        Ok(())
    }

    /// Delivers a reference to `msg` to every live sink in connection order.
    pub fn forward_ref(&self, msg: &T) -> Result<(), Error> {
        let entries = self.snapshot.load();
        let mut saw_dead = false;
        for entry in entries.iter() {
            match entry.with_live(|sink| sink.post_ref(msg)) {
                Some(result) => result?,
                None => saw_dead = true,
            }
        }
        drop(entries);
        if saw_dead {
            self.prune();
        }
        Ok(())
    }

    /// Delivers `msg` to every live sink in connection order through
    /// [`Sink::post_async`], awaiting each sink before the next one.
    ///
    /// The snapshot is taken when this method is called, not when the future
    /// is first polled. Sinks completing synchronously never suspend the
    /// caller.
    pub fn forward_async(&self, msg: T) -> impl Future<Output = Result<(), Error>> + Send + '_ {
        let entries = self.snapshot.load_full();
        async move {
            let count = entries.len();
            let mut msg = Some(msg);
            let mut saw_dead = false;
            for (index, entry) in entries.iter().enumerate() {
                let Some(sink) = entry.upgrade() else {
                    saw_dead = true;
                    continue;
                };
                let value = if index + 1 == count {
                    msg.take()
                } else {
                    msg.clone()
                };
                if let Some(value) = value {
                    sink.post_async(value).await?;
                }
            }
            drop(entries);
            if saw_dead {
                self.prune();
            }
            Ok(())
        }
    }

    /// Drops dead weak entries, unless a writer currently holds the lock.
    fn prune(&self) {
        let Some(_guard) = self.mutation.try_lock() else {
            return;
        };
        let current = self.snapshot.load();
        if current.iter().all(SinkRef::is_alive) {
            return;
        }
        let next = Self::live_entries(&current);
        tracing::trace!(
            pruned = current.len() - next.len(),
            remaining = next.len(),
            "pruned dropped weak sinks"
        );
        self.snapshot.store(Arc::new(next));
    }

    #[cfg(test)]
    pub(crate) fn snapshot_len(&self) -> usize {
        self.snapshot.load().len()
    }

    fn live_entries(entries: &[SinkRef<T>]) -> Vec<SinkRef<T>> {
        entries
            .iter()
            .filter(|entry| entry.is_alive())
            .cloned()
            .collect()
    }
}
