// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for request lifecycle and pipeline events.
//!
//! This module contains message types for logging events related to:
//! * Request start, completion, failure and cancellation
//! * Stage-to-stage advancement
//! * Start rejections from the state machine guard
//! * The drain that follows a failed run
//! * Completion callbacks and superseded outcomes

use crate::errors::StatusCode;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A request started running its pipeline.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunStarted {
    pub partition_count: usize,
}

impl Display for RunStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting partitioned request across {} partitions",
            self.partition_count
        )
    }
}

impl StructuredLog for RunStarted {
    fn log(&self) {
        tracing::info!(partition_count = self.partition_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            partition_count = self.partition_count,
        )
    }
}

/// A stage's validator passed and the pipeline moved on.
///
/// # Log Level
/// `debug!` - Per-stage detail
pub struct StageAdvanced {
    pub completed_stage: usize,
    pub next_stage: usize,
}

impl Display for StageAdvanced {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage {} passed validation, advancing to stage {}",
            self.completed_stage, self.next_stage
        )
    }
}

impl StructuredLog for StageAdvanced {
    fn log(&self) {
        tracing::debug!(
            completed_stage = self.completed_stage,
            next_stage = self.next_stage,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stage_advanced",
            span_name = name,
            completed_stage = self.completed_stage,
            next_stage = self.next_stage,
        )
    }
}

/// Every stage passed.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use hetero_orchestrator::observability::messages::pipeline::RunCompleted;
/// use std::time::Duration;
///
/// let msg = RunCompleted {
///     partition_count: 3,
///     duration: Duration::from_millis(12),
/// };
///
/// assert!(msg.to_string().contains("3 partitions"));
/// ```
pub struct RunCompleted {
    pub partition_count: usize,
    pub duration: Duration,
}

impl Display for RunCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Partitioned request completed: {} partitions in {:?}",
            self.partition_count, self.duration
        )
    }
}

impl StructuredLog for RunCompleted {
    fn log(&self) {
        tracing::info!(
            partition_count = self.partition_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            partition_count = self.partition_count,
            duration = ?self.duration,
        )
    }
}

/// A stage's validator raised, ending the run.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct RunFailed<'a> {
    pub stage: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for RunFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Partitioned request failed at stage {}: {}",
            self.stage, self.error
        )
    }
}

impl StructuredLog for RunFailed<'_> {
    fn log(&self) {
        tracing::error!(stage = self.stage, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "run_failed",
            span_name = name,
            stage = self.stage,
            error = %self.error,
        )
    }
}

/// Cancellation was honoured at a stage boundary.
///
/// # Log Level
/// `warn!` - Run ended early on request
pub struct RunCancelled {
    pub completed_stages: usize,
}

impl Display for RunCancelled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Partitioned request cancelled after {} completed stages",
            self.completed_stages
        )
    }
}

impl StructuredLog for RunCancelled {
    fn log(&self) {
        tracing::warn!(completed_stages = self.completed_stages, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "run_cancelled",
            span_name = name,
            completed_stages = self.completed_stages,
        )
    }
}

/// `start` was refused by the state machine guard.
///
/// # Log Level
/// `warn!` - Caller error, request state unchanged
pub struct StartRejected<'a> {
    pub state: &'a str,
}

impl Display for StartRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Start rejected: request is {}", self.state)
    }
}

impl StructuredLog for StartRejected<'_> {
    fn log(&self) {
        tracing::warn!(state = self.state, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("start_rejected", span_name = name, state = self.state)
    }
}

/// A failed wait is draining every sub-request before returning.
///
/// # Log Level
/// `warn!` - Blocking past the caller's timeout
pub struct DrainStarted<'a> {
    pub partition_count: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for DrainStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Draining {} sub-requests after failure: {}",
            self.partition_count, self.error
        )
    }
}

impl StructuredLog for DrainStarted<'_> {
    fn log(&self) {
        tracing::warn!(
            partition_count = self.partition_count,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "drain",
            span_name = name,
            partition_count = self.partition_count,
            error = %self.error,
        )
    }
}

/// All sub-requests reached their terminal ready state.
///
/// # Log Level
/// `info!` - Drain finished
pub struct DrainCompleted {
    pub partition_count: usize,
    pub duration: Duration,
}

impl Display for DrainCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Drained {} sub-requests in {:?}",
            self.partition_count, self.duration
        )
    }
}

impl StructuredLog for DrainCompleted {
    fn log(&self) {
        tracing::info!(
            partition_count = self.partition_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "drain_completed",
            span_name = name,
            partition_count = self.partition_count,
            duration = ?self.duration,
        )
    }
}

/// The user completion callback panicked; waiters see the panic as the run's outcome.
///
/// # Log Level
/// `error!` - Caller bug
pub struct CompletionCallbackPanicked<'a> {
    pub message: &'a str,
}

impl Display for CompletionCallbackPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Completion callback panicked: {}", self.message)
    }
}

impl StructuredLog for CompletionCallbackPanicked<'_> {
    fn log(&self) {
        tracing::error!(panic = self.message, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("callback_panicked", span_name = name)
    }
}

/// A sub-request reported something other than ready while being drained.
///
/// # Log Level
/// `warn!` - The drain carries on with the next partition
pub struct SubRequestUnsettled<'a> {
    pub partition: &'a str,
    pub device: &'a str,
    pub status: StatusCode,
}

impl Display for SubRequestUnsettled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Partition '{}' on device '{}' did not settle cleanly during drain ({})",
            self.partition, self.device, self.status
        )
    }
}

impl StructuredLog for SubRequestUnsettled<'_> {
    fn log(&self) {
        tracing::warn!(
            partition = self.partition,
            device = self.device,
            status = %self.status,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "sub_request_unsettled",
            span_name = name,
            partition = self.partition,
            device = self.device,
        )
    }
}

/// The blocking-pool task running an async drain did not complete.
///
/// # Log Level
/// `error!` - The drain panicked or the runtime is shutting down
pub struct DrainJoinFailed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for DrainJoinFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Drain task did not complete: {}", self.error)
    }
}

impl StructuredLog for DrainJoinFailed<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("drain_join_failed", span_name = name, error = %self.error)
    }
}

/// A run finished after a newer run had already started; its outcome is
/// dropped in favour of the newer one.
///
/// # Log Level
/// `debug!` - Expected when the completion callback restarts the request
pub struct OutcomeSuperseded {
    pub generation: u64,
    pub current_generation: u64,
}

impl Display for OutcomeSuperseded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run {} finished after run {} started; keeping the newer outcome",
            self.generation, self.current_generation
        )
    }
}

impl StructuredLog for OutcomeSuperseded {
    fn log(&self) {
        tracing::debug!(
            generation = self.generation,
            current_generation = self.current_generation,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "outcome_superseded",
            span_name = name,
            generation = self.generation,
        )
    }
}
