// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Bounded queue receivers.
//!
//! Both receivers are sinks that buffer messages for pull-style consumers.
//! They share one implementation, [`BoundedQueue`], parameterized by a
//! [`QueueDiscipline`] that decides removal order and what to discard when
//! the queue is full:
//!
//! - [`QueueReceiver`]: FIFO, drops either the incoming or the oldest message.
//! - [`PriorityQueueReceiver`]: highest priority first (FIFO among equals),
//!   evicts the lowest-priority message when the incoming one ranks at least
//!   as high, otherwise drops the incoming one.

mod bounded;
mod fifo;
mod priority;
mod wait_handle;

#[cfg(test)]
mod tests;

pub use bounded::{BoundedQueue, QueueDiscipline};
pub use fifo::{Fifo, QueueReceiver};
pub use priority::{Priority, PriorityQueueReceiver};
pub use wait_handle::WaitHandle;
