// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Policies for circular message logs and the readers draining them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Policies of a circular message log.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LogPolicies {
    /// Number of entries retained before the oldest one is evicted.
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,
}

impl Default for LogPolicies {
    fn default() -> Self {
        Self {
            capacity: default_log_capacity(),
        }
    }
}

impl LogPolicies {
    /// Returns validation errors for this policy set.
    #[must_use]
    pub fn validation_errors(&self, path_prefix: &str) -> Vec<String> {
        let mut errors = Vec::new();
        if self.capacity == 0 {
            errors.push(format!("{path_prefix}.capacity must be greater than 0"));
        }
        errors
    }
}

/// How a log reader hands entries to its connected sinks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForwardingMethod {
    /// Each sink receives its own value through `post`.
    #[default]
    Synchronous,
    /// Each sink receives a reference through `post_ref`; sinks copy only if
    /// they need to keep the value.
    SynchronousByRef,
    /// Sinks are driven through `post_async`, each one awaited in order.
    Asynchronous,
}

/// Policies of a log reader.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReaderPolicies {
    /// Forwarding strategy used for every entry.
    #[serde(default)]
    pub forwarding: ForwardingMethod,
    /// Maximum number of entries copied out of the log per read.
    #[serde(default = "default_reader_batch_size")]
    pub batch_size: usize,
}

impl Default for ReaderPolicies {
    fn default() -> Self {
        Self {
            forwarding: ForwardingMethod::default(),
            batch_size: default_reader_batch_size(),
        }
    }
}

impl ReaderPolicies {
    /// Policies using the given forwarding method, all other values default.
    #[must_use]
    pub fn with_forwarding(forwarding: ForwardingMethod) -> Self {
        Self {
            forwarding,
            ..Self::default()
        }
    }

    /// Returns validation errors for this policy set.
    #[must_use]
    pub fn validation_errors(&self, path_prefix: &str) -> Vec<String> {
        let mut errors = Vec::new();
        if self.batch_size == 0 {
            errors.push(format!("{path_prefix}.batch_size must be greater than 0"));
        }
        errors
    }
}

const fn default_log_capacity() -> usize {
    1024
}

const fn default_reader_batch_size() -> usize {
    64
}
