// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for sub-request execution and completion-handler events.

use crate::errors::StatusCode;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A local sub-request began executing its kernel.
///
/// # Log Level
/// `debug!` - Per-device detail
pub struct SubRequestExecutionStarted<'a> {
    pub device: &'a str,
    pub kernel: &'a str,
}

impl Display for SubRequestExecutionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Device '{}' executing {} kernel", self.device, self.kernel)
    }
}

impl StructuredLog for SubRequestExecutionStarted<'_> {
    fn log(&self) {
        tracing::debug!(device = self.device, kernel = self.kernel, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "sub_request",
            span_name = name,
            device = self.device,
            kernel = self.kernel,
        )
    }
}

/// A local sub-request finished and is about to fire its handler.
///
/// # Log Level
/// `debug!` - Per-device detail
pub struct SubRequestExecutionCompleted<'a> {
    pub device: &'a str,
    pub status: StatusCode,
    pub duration: Duration,
}

impl Display for SubRequestExecutionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Device '{}' finished with {} in {:?}",
            self.device, self.status, self.duration
        )
    }
}

impl StructuredLog for SubRequestExecutionCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            device = self.device,
            status = %self.status,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "sub_request_completed",
            span_name = name,
            device = self.device,
            status = %self.status,
        )
    }
}

/// `start_async` failed; the stage is completed with the failure's code.
///
/// # Log Level
/// `warn!` - The paired validator will raise
pub struct SubRequestStartFailed<'a> {
    pub device: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for SubRequestStartFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Device '{}' failed to start: {}", self.device, self.error)
    }
}

impl StructuredLog for SubRequestStartFailed<'_> {
    fn log(&self) {
        tracing::warn!(device = self.device, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "start_failed",
            span_name = name,
            device = self.device,
            error = %self.error,
        )
    }
}

/// A completion handler fired after its adapter was torn down.
///
/// # Log Level
/// `warn!` - Ignored, nothing left to notify
pub struct LateCompletionIgnored<'a> {
    pub device: &'a str,
    pub status: StatusCode,
}

impl Display for LateCompletionIgnored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignoring completion ({}) from device '{}': adapter already released",
            self.status, self.device
        )
    }
}

impl StructuredLog for LateCompletionIgnored<'_> {
    fn log(&self) {
        tracing::warn!(device = self.device, status = %self.status, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "late_completion",
            span_name = name,
            device = self.device,
            status = %self.status,
        )
    }
}

/// A completion handler fired with no continuation pending.
///
/// # Log Level
/// `error!` - The backend fired without a matching `run`
pub struct UnsolicitedCompletion<'a> {
    pub device: &'a str,
    pub status: StatusCode,
}

impl Display for UnsolicitedCompletion<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Device '{}' reported completion ({}) with no pending continuation",
            self.device, self.status
        )
    }
}

impl StructuredLog for UnsolicitedCompletion<'_> {
    fn log(&self) {
        tracing::error!(device = self.device, status = %self.status, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "unsolicited_completion",
            span_name = name,
            device = self.device,
            status = %self.status,
        )
    }
}

/// `run` was called while the previous continuation was still pending.
///
/// # Log Level
/// `error!` - Contract violation by the pipeline driver
pub struct ContinuationStillPending<'a> {
    pub device: &'a str,
}

impl Display for ContinuationStillPending<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Device '{}' asked to run while its previous continuation is still pending",
            self.device
        )
    }
}

impl StructuredLog for ContinuationStillPending<'_> {
    fn log(&self) {
        tracing::error!(device = self.device, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("continuation_pending", span_name = name, device = self.device)
    }
}
