// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Manual-reset event usable from threads and tasks.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// A signal that stays set until explicitly reset.
///
/// Queues keep their handle set while they hold at least one message and
/// reset it when they become empty, so any number of consumers can wait on
/// it. Threads block with [`WaitHandle::wait_timeout`]; tasks await
/// [`WaitHandle::wait`].
pub struct WaitHandle {
    set: Mutex<bool>,
    condvar: Condvar,
    notify: Notify,
}

impl WaitHandle {
    pub(crate) fn new(initially_set: bool) -> Self {
        Self {
            set: Mutex::new(initially_set),
            condvar: Condvar::new(),
            notify: Notify::new(),
        }
    }

    /// Whether the handle is currently set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.set.lock()
    }

    pub(crate) fn set(&self) {
        let mut set = self.set.lock();
        if !*set {
            *set = true;
            _ = self.condvar.notify_all();
            self.notify.notify_waiters();
        }
    }

    pub(crate) fn reset(&self) {
        *self.set.lock() = false;
    }

    /// Blocks the current thread until the handle is set or `timeout`
    /// expires. Returns whether the handle was set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut set = self.set.lock();
        while !*set {
            if self.condvar.wait_until(&mut set, deadline).timed_out() {
                return *set;
            }
        }
        true
    }

    /// Completes once the handle is set.
    pub async fn wait(&self) {
        loop {
            // Registered before the check so a `set` in between is not missed.
            let notified = self.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }

    /// Like [`WaitHandle::wait`], giving up after `timeout`. Returns whether
    /// the handle was set.
    pub async fn wait_async_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }
}
