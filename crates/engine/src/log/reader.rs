// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Republishes the entries of a [`MessageLog`] to connected sinks.
//!
//! The reader keeps a cursor (`next_id`) and copies entries out of the log in
//! batches of at most `batch_size`, releasing the log lock before forwarding.
//! Two situations move the cursor other than by one:
//!
//! - the log evicted entries the reader had not forwarded yet: the cursor
//!   jumps to the oldest retained entry;
//! - the log was reset: IDs restart at 0, and so does the cursor.

use crate::error::Error;
use crate::flow::{ConnectionRegistry, Message, Source};
use crate::log::message_log::MessageLog;
use ringflow_config::{ForwardingMethod, ReaderPolicies};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio_util::sync::CancellationToken;

/// Follows a [`MessageLog`] and forwards every entry it reads.
pub struct LogReader<T: Message> {
    log: Arc<MessageLog<T>>,
    forwarding: ForwardingMethod,
    batch_size: usize,
    sinks: ConnectionRegistry<T>,
    running: AtomicBool,
    next_id: AtomicI64,
}

/// Clears the running flag when `run` returns, however it returns.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: Message> LogReader<T> {
    /// Creates a reader over `log`. A `batch_size` of 0 is treated as 1.
    #[must_use]
    pub fn new(log: Arc<MessageLog<T>>, policies: &ReaderPolicies) -> Self {
        Self {
            log,
            forwarding: policies.forwarding,
            batch_size: policies.batch_size.max(1),
            sinks: ConnectionRegistry::new(),
            running: AtomicBool::new(false),
            next_id: AtomicI64::new(-1),
        }
    }

    /// The log being read.
    #[must_use]
    pub fn log(&self) -> &Arc<MessageLog<T>> {
        &self.log
    }

    /// How entries are handed to sinks.
    #[must_use]
    pub fn forwarding(&self) -> ForwardingMethod {
        self.forwarding
    }

    /// Whether `run` is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// ID of the next entry to forward, `-1` before the first run.
    #[must_use]
    pub fn next_id(&self) -> i64 {
        self.next_id.load(Ordering::Acquire)
    }

    /// Forwards entries until `cancel` fires, starting at the oldest entry
    /// available when called.
    ///
    /// Fails with [`Error::ReaderAlreadyRunning`] if this reader is already
    /// running, and with the first sink error encountered otherwise. Returns
    /// `Ok(())` once cancelled.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), Error> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(Error::ReaderAlreadyRunning);
        }
        let _running = RunningGuard(&self.running);

        let mut generation = self.log.generation();
        let mut next_id = self.log.oldest_available_id().max(0);
        self.next_id.store(next_id, Ordering::Release);
        tracing::debug!(next_id, forwarding = ?self.forwarding, "log reader started");

        let mut result = Ok(());
        while !cancel.is_cancelled() {
            let changed = self.log.changed();
            let (range, observed) = self.log.read_batch(next_id, self.batch_size);

            if observed != generation {
                tracing::debug!(skipped_from = next_id, "message log was reset, restarting at 0");
                generation = observed;
                next_id = 0;
                self.next_id.store(next_id, Ordering::Release);
                continue;
            }

            if range.is_empty() {
                tokio::select! {
                    () = changed => continue,
                    () = cancel.cancelled() => break,
                }
            }

            if range.first_id > next_id {
                tracing::debug!(
                    expected = next_id,
                    resumed_at = range.first_id,
                    skipped = range.first_id - next_id,
                    "log reader fell behind, resuming at oldest available entry"
                );
            }
            next_id = range.first_id;
            for item in range.items {
                if let Err(error) = self.forward(item).await {
                    result = Err(error);
                    break;
                }
                next_id += 1;
                self.next_id.store(next_id, Ordering::Release);
            }
            if result.is_err() {
                break;
            }
        }

        tracing::debug!(next_id, failed = result.is_err(), "log reader stopped");
        result
    }

    async fn forward(&self, item: T) -> Result<(), Error> {
        match self.forwarding {
            ForwardingMethod::Synchronous => self.sinks.forward(item),
            ForwardingMethod::SynchronousByRef => self.sinks.forward_ref(&item),
            ForwardingMethod::Asynchronous => self.sinks.forward_async(item).await,
        }
    }
}

impl<T: Message> Source<T> for LogReader<T> {
    fn connection_registry(&self) -> &ConnectionRegistry<T> {
        &self.sinks
    }
}
