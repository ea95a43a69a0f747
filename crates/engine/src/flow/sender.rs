// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! The simplest producer.

use crate::error::Error;
use crate::flow::contract::{Message, Source};
use crate::flow::registry::ConnectionRegistry;

/// A source that forwards whatever is posted to it.
///
/// `Sender` owns nothing but its registry: it is the entry point application
/// code uses to push messages into a flow.
pub struct Sender<T: Message> {
    sinks: ConnectionRegistry<T>,
}

impl<T: Message> Default for Sender<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Message> Sender<T> {
    /// Creates a sender with no connected sinks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sinks: ConnectionRegistry::new(),
        }
    }

    /// Forwards a message to every connected sink.
    pub fn post(&self, msg: T) -> Result<(), Error> {
        self.sinks.forward(msg)
    }

    /// Forwards a reference to every connected sink.
    pub fn post_ref(&self, msg: &T) -> Result<(), Error> {
        self.sinks.forward_ref(msg)
    }

    /// Forwards a message to every connected sink, awaiting each in order.
    pub async fn post_async(&self, msg: T) -> Result<(), Error> {
        self.sinks.forward_async(msg).await
    }
}

impl<T: Message> Source<T> for Sender<T> {
    fn connection_registry(&self) -> &ConnectionRegistry<T> {
        &self.sinks
    }
}
