// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

//! Criterion benchmarks for the ringflow engine. See `benches/`.
