// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default deadline for one wait in the binary (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: i64 = 30_000;
/// Default number of times the binary runs the request
pub const DEFAULT_ITERATIONS: u32 = 1;
