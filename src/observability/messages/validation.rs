// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration validation warnings and errors.
//!
//! This module contains message types for logging events related to:
//! * Partition layout validation start and outcome
//! * Individual validation problems

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Configuration validation started.
///
/// # Log Level
/// `debug!`
///
/// # Example
/// ```
/// use hetero_orchestrator::observability::messages::validation::ValidationStarted;
///
/// let msg = ValidationStarted { partition_count: 2 };
/// assert_eq!(msg.to_string(), "Starting configuration validation for 2 partitions");
/// ```
pub struct ValidationStarted {
    pub partition_count: usize,
}

impl Display for ValidationStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting configuration validation for {} partitions",
            self.partition_count
        )
    }
}

impl StructuredLog for ValidationStarted {
    fn log(&self) {
        tracing::debug!(partition_count = self.partition_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::DEBUG,
            "span_name",
            name = name,
            partition_count = self.partition_count,
        )
    }
}

/// One validation problem.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ValidationProblem<'a> {
    pub error: &'a ValidationError,
}

impl Display for ValidationProblem<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Configuration problem: {}", self.error)
    }
}

impl StructuredLog for ValidationProblem<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            error = %self.error,
        )
    }
}

/// Configuration validation completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ValidationCompleted {
    pub partition_count: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Configuration validation completed successfully for {} partitions",
            self.partition_count
        )
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        tracing::info!(partition_count = self.partition_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            partition_count = self.partition_count,
        )
    }
}

/// Configuration validation failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ValidationFailed {
    pub error_count: usize,
}

impl Display for ValidationFailed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Configuration validation failed with {} errors",
            self.error_count
        )
    }
}

impl StructuredLog for ValidationFailed {
    fn log(&self) {
        tracing::error!(error_count = self.error_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            error_count = self.error_count,
        )
    }
}
