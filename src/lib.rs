// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // device backends
pub mod config;     // config + runtime builder
pub mod engine;     // pipeline driver + orchestrator
pub mod errors;     // error handling
pub mod observability;
pub mod partition;  // sub-networks + cross-partition blobs
pub mod traits;     // collaborator contracts
