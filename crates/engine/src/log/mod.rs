// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Circular, ID-addressed message log and its reader.
//!
//! [`MessageLog`] assigns every added entry the next ID (starting at 0) and
//! keeps the latest `capacity` entries. [`LogReader`] follows a log from its
//! oldest available entry and republishes each entry to the sinks connected
//! to it. A reader that falls behind the eviction front resumes at the oldest
//! entry still retained.

mod message_log;
mod reader;
mod ring;


pub use message_log::{LogRange, MessageLog};
pub use reader::LogReader;
pub use ring::CircularBuffer;
