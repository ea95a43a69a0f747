// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! In-process dataflow engine.
//!
//! Components connect as sources and sinks of typed messages:
//!
//! ```text
//!   Sender / Forwarder / LogReader     (sources, own a ConnectionRegistry)
//!        │ forward / forward_ref / forward_async, index order
//!        ▼
//!   QueueReceiver / PriorityQueueReceiver / MessageLog / any Sink<T>
//! ```
//!
//! - [`flow`]: the sink/source contracts and the copy-on-write connection
//!   registry every source dispatches through.
//! - [`queue`]: bounded FIFO and priority receivers with drop policies and
//!   optional producer backpressure.
//! - [`log`]: a circular, ID-addressed message log and the reader that
//!   republishes it.

pub mod error;
pub mod flow;
pub mod log;
pub mod queue;

pub use error::Error;
pub use flow::{
    ConnectionRegistry, Filter, Forwarder, Message, Retention, Sender, Sink, Source,
};
pub use log::{CircularBuffer, LogRange, LogReader, MessageLog};
pub use queue::{PriorityQueueReceiver, QueueReceiver, WaitHandle};
