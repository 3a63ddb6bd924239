// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod infer;

pub use config::{ConfigError, ValidationError};
pub use infer::{InferError, StatusCode};
