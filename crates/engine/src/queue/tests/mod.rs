// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Queue receiver tests.

mod fifo;
mod wait_handle;
