// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Flow module: sink/source contracts, connection registry and the basic
//! sources built on it.

mod contract;
mod forwarder;
mod registry;
mod sender;


pub use contract::{Message, Retention, Sink, Source};
pub use forwarder::{Filter, Forwarder};
pub use registry::ConnectionRegistry;
pub use sender::Sender;
