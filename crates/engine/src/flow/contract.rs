// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Typed contracts shared by every component.
//!
//! A [`Sink`] accepts messages. A [`Source`] owns a [`ConnectionRegistry`]
//! and exposes the connection-management half of the contract; the dispatch
//! half (`forward*`) stays on the registry so each source decides when and how
//! it forwards.

use crate::error::Error;
use crate::flow::registry::ConnectionRegistry;
use async_trait::async_trait;
use std::sync::Arc;

/// Bound satisfied by every payload flowing through the engine.
///
/// Fan-out to several sinks hands each one its own copy, hence `Clone`.
/// Large payloads are usually wrapped in an `Arc` by the producer.
pub trait Message: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Message for T {}

/// How a source holds on to a connected sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Retention {
    /// The source keeps the sink alive.
    #[default]
    Strong,
    /// The sink lives independently; once it is dropped the source skips it
    /// and prunes the entry.
    Weak,
}

/// A consumer of messages.
#[async_trait]
pub trait Sink<T: Message>: Send + Sync {
    /// Accepts a message by value.
    fn post(&self, msg: T) -> Result<(), Error>;

    /// Accepts a message by reference. Sinks that only inspect the message
    /// override this to avoid the copy.
    fn post_ref(&self, msg: &T) -> Result<(), Error> {
        self.post(msg.clone())
    }

    /// Accepts a message asynchronously. The default completes synchronously
    /// through [`Sink::post`].
    async fn post_async(&self, msg: T) -> Result<(), Error> {
        self.post(msg)
    }
}

/// A producer managing zero or more connected sinks.
///
/// Implementors only provide access to their registry.
pub trait Source<T: Message> {
    /// The registry holding this source's connections.
    fn connection_registry(&self) -> &ConnectionRegistry<T>;

    /// Connects a sink. Returns `false` if it was already connected.
    fn connect_to(&self, sink: Arc<dyn Sink<T>>, retention: Retention) -> bool {
        self.connection_registry().connect(sink, retention)
    }

    /// Disconnects a sink. Returns `false` if it was not connected.
    fn disconnect_from(&self, sink: &dyn Sink<T>) -> bool {
        self.connection_registry().disconnect(sink)
    }

    /// Disconnects every sink.
    fn disconnect_all(&self) {
        self.connection_registry().disconnect_all();
    }

    /// Live connected sinks, in dispatch order.
    fn connected_sinks(&self) -> Vec<Arc<dyn Sink<T>>> {
        self.connection_registry().connected_sinks()
    }

    /// Whether the given sink is connected and alive.
    fn is_connected(&self, sink: &dyn Sink<T>) -> bool {
        self.connection_registry().is_connected(sink)
    }

    /// Number of live connected sinks.
    fn count_connected_sinks(&self) -> usize {
        self.connection_registry().count_connected_sinks()
    }
}
