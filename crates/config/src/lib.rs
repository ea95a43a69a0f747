// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Policy declarations for ringflow queues, message logs and log readers.
//!
//! Every policy type deserializes with `deny_unknown_fields`, falls back to
//! defaults for omitted fields and exposes `validation_errors(path_prefix)`
//! so the embedding application can report all problems at once.

pub mod log;
pub mod queue;

pub use log::{ForwardingMethod, LogPolicies, ReaderPolicies};
pub use queue::{PriorityQueuePolicies, QueueOnFullPolicy, QueuePolicies};
