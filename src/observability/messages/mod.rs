// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it at its fixed level with structured fields.
//!
//! # Organization
//!
//! * `pipeline` - request lifecycle, stage advancement, drains
//! * `backend` - sub-request execution and completion-handler events
//! * `partition` - cross-partition blob wiring
//! * `validation` - configuration validation
//!
//! # Usage Pattern
//!
//! ```rust
//! use hetero_orchestrator::observability::messages::pipeline::RunStarted;
//! use hetero_orchestrator::observability::messages::StructuredLog;
//!
//! RunStarted { partition_count: 3 }.log();
//! ```

use tracing::Span;

pub mod backend;
pub mod partition;
pub mod pipeline;
pub mod validation;

/// A log message that knows its level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
