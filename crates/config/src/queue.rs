// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Policies for bounded queue receivers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Behavior of a FIFO queue when a message arrives and the queue is full.
///
/// Applied immediately when no block timeout is configured, or once the block
/// timeout has expired.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueOnFullPolicy {
    /// Evict the oldest queued message to admit the incoming one.
    #[default]
    DropOldest,
    /// Drop the incoming message and keep queued messages untouched.
    DropNewest,
}

/// Policies of a bounded FIFO queue receiver.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct QueuePolicies {
    /// Maximum number of queued messages.
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
    /// Behavior when `capacity` is reached.
    #[serde(default)]
    pub on_full: QueueOnFullPolicy,
    /// How long a producer waits for room before `on_full` applies.
    /// Omitted means the policy applies immediately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_timeout_ms: Option<u64>,
}

impl Default for QueuePolicies {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            on_full: QueueOnFullPolicy::default(),
            block_timeout_ms: None,
        }
    }
}

impl QueuePolicies {
    /// Policies for a queue of the given capacity, all other values default.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Returns the producer block timeout, if any.
    #[must_use]
    pub fn block_timeout(&self) -> Option<Duration> {
        self.block_timeout_ms.map(Duration::from_millis)
    }

    /// Returns `true` when the incoming message is the one dropped on overflow.
    #[must_use]
    pub fn drop_latest_on_full(&self) -> bool {
        self.on_full == QueueOnFullPolicy::DropNewest
    }

    /// Returns validation errors for this policy set.
    #[must_use]
    pub fn validation_errors(&self, path_prefix: &str) -> Vec<String> {
        capacity_errors(self.capacity, path_prefix)
    }
}

/// Policies of a bounded priority queue receiver.
///
/// The overflow behavior is fixed: the lowest-priority message is evicted
/// when the incoming one ranks at least as high, otherwise the incoming one
/// is dropped.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PriorityQueuePolicies {
    /// Maximum number of queued messages.
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
    /// How long a producer waits for room before the overflow rule applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_timeout_ms: Option<u64>,
}

impl Default for PriorityQueuePolicies {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            block_timeout_ms: None,
        }
    }
}

impl PriorityQueuePolicies {
    /// Policies for a queue of the given capacity, all other values default.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Returns the producer block timeout, if any.
    #[must_use]
    pub fn block_timeout(&self) -> Option<Duration> {
        self.block_timeout_ms.map(Duration::from_millis)
    }

    /// Returns validation errors for this policy set.
    #[must_use]
    pub fn validation_errors(&self, path_prefix: &str) -> Vec<String> {
        capacity_errors(self.capacity, path_prefix)
    }
}

fn capacity_errors(capacity: usize, path_prefix: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if capacity == 0 {
        errors.push(format!("{path_prefix}.capacity must be greater than 0"));
    }
    errors
}

const fn default_queue_capacity() -> usize {
    1024
}
