// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Pass-through nodes: sinks that are also sources.

use crate::error::Error;
use crate::flow::contract::{Message, Sink, Source};
use crate::flow::registry::ConnectionRegistry;
use async_trait::async_trait;

/// Forwards every accepted message, unchanged, to its own sinks.
///
/// Useful as a stable connection point: producers connect to the forwarder
/// once and consumers come and go behind it.
pub struct Forwarder<T: Message> {
    sinks: ConnectionRegistry<T>,
}

impl<T: Message> Default for Forwarder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Message> Forwarder<T> {
    /// Creates a forwarder with no connected sinks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sinks: ConnectionRegistry::new(),
        }
    }
}

#[async_trait]
impl<T: Message> Sink<T> for Forwarder<T> {
    fn post(&self, msg: T) -> Result<(), Error> {
        self.sinks.forward(msg)
    }

    fn post_ref(&self, msg: &T) -> Result<(), Error> {
        self.sinks.forward_ref(msg)
    }

    async fn post_async(&self, msg: T) -> Result<(), Error> {
        self.sinks.forward_async(msg).await
    }
}

impl<T: Message> Source<T> for Forwarder<T> {
    fn connection_registry(&self) -> &ConnectionRegistry<T> {
        &self.sinks
    }
}

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Forwards only the messages matching a predicate; the others are dropped.
pub struct Filter<T: Message> {
    predicate: Predicate<T>,
    sinks: ConnectionRegistry<T>,
}

impl<T: Message> Filter<T> {
    /// Creates a filter passing messages for which `predicate` returns `true`.
    pub fn new(predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
            sinks: ConnectionRegistry::new(),
        }
    }
}

#[async_trait]
impl<T: Message> Sink<T> for Filter<T> {
    fn post(&self, msg: T) -> Result<(), Error> {
        if (self.predicate)(&msg) {
            self.sinks.forward(msg)
        } else {
            Ok(())
        }
    }

    fn post_ref(&self, msg: &T) -> Result<(), Error> {
        if (self.predicate)(msg) {
            self.sinks.forward_ref(msg)
        } else {
            Ok(())
        }
    }

    async fn post_async(&self, msg: T) -> Result<(), Error> {
        if (self.predicate)(&msg) {
            self.sinks.forward_async(msg).await
        } else {
            Ok(())
        }
    }
}

impl<T: Message> Source<T> for Filter<T> {
    fn connection_registry(&self) -> &ConnectionRegistry<T> {
        &self.sinks
    }
}
