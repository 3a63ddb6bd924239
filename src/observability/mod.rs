// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! All diagnostic and operational log lines come from message types in
//! [`messages`], one struct per event with a `Display` implementation, so call
//! sites never carry format strings of their own.
//!
//! # Usage
//!
//! ```rust
//! use hetero_orchestrator::observability::messages::backend::LateCompletionIgnored;
//! use hetero_orchestrator::observability::messages::StructuredLog;
//! use hetero_orchestrator::errors::StatusCode;
//!
//! let msg = LateCompletionIgnored {
//!     device: "GPU.0",
//!     status: StatusCode::Ok,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
