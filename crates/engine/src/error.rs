// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors reported by the engine.
//!
//! Expected conditions (full or empty queues, retired log IDs, dropped weak
//! sinks, expired timeouts) never surface here: they are reported through
//! `Option`/`bool` results at the call site. This enum covers caller mistakes
//! and failures raised by sinks.

/// Errors produced by engine components and sinks.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A bounded component was configured with a zero capacity.
    #[error("invalid capacity for {component}: capacity must be greater than 0")]
    InvalidCapacity {
        /// Component that rejected the configuration.
        component: &'static str,
    },
    /// The latest entry of an empty message log was requested.
    #[error("message log is empty")]
    LogEmpty,
    /// `LogReader::run` was called while the same reader was already running.
    #[error("log reader is already running")]
    ReaderAlreadyRunning,
    /// A sink refused a message. Propagated unmodified out of dispatch.
    #[error("sink `{sink}` failed: {reason}")]
    SinkFailed {
        /// Name of the failing sink.
        sink: String,
        /// Failure details.
        reason: String,
    },
}

impl Error {
    /// Builds a [`Error::SinkFailed`] error.
    pub fn sink_failed(sink: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SinkFailed {
            sink: sink.into(),
            reason: reason.into(),
        }
    }
}
