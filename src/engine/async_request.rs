// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Start/wait/callback scaffolding shared by every asynchronous request.
//!
//! [`AsyncRequestCore`] owns the request state machine, the pipeline driver
//! that walks a [`Pipeline`] stage by stage, the user completion callback and
//! the stop-and-wait primitive used on teardown.
//!
//! The driver hands stage `i`'s task to stage `i`'s executor. When that task
//! returns, the driver either finishes the run (failure, last stage,
//! cancellation) or hands stage `i + 1` to its executor.
//!
//! Finishing a run happens in two steps. The request first goes back to
//! `Idle`, so the user callback may start it again. Once the callback
//! returns, the outcome is published to waiters and cached until the next
//! start. Every run carries a generation number; an outcome whose run has
//! been superseded by a newer start is dropped instead of published.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::engine::pipeline::Pipeline;
use crate::errors::InferError;
use crate::observability::messages::pipeline::{
    CompletionCallbackPanicked, OutcomeSuperseded, RunCancelled, RunCompleted, RunFailed,
    RunStarted, StageAdvanced, StartRejected,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{TaskExecutor, WaitMode, WaitStatus};

/// User hook invoked with the outcome of every run.
pub type UserCallback = Arc<dyn Fn(Result<(), InferError>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Busy,
    /// Stop requested while a run was in flight.
    Stopping,
    /// No further starts are accepted.
    Stopped,
}

impl RequestState {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Busy => "busy",
            RequestState::Stopping => "stopping",
            RequestState::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    in_flight: bool,
    outcome: Option<Result<(), InferError>>,
}

struct Inner {
    state: RequestState,
    /// The latest run's outcome has not been published yet.
    running: bool,
    generation: u64,
    outcome: Option<Result<(), InferError>>,
    cancel: CancellationToken,
    started_at: Option<Instant>,
}

/// What a stage needs to know about the run it belongs to.
#[derive(Clone)]
struct RunTicket {
    generation: u64,
    cancel: CancellationToken,
}

struct CoreShared {
    pipeline: Pipeline,
    inner: Mutex<Inner>,
    done: Condvar,
    snapshot: watch::Sender<Snapshot>,
    callback: Mutex<Option<UserCallback>>,
    callback_executor: Arc<dyn TaskExecutor>,
}

impl CoreShared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn callback(&self) -> MutexGuard<'_, Option<UserCallback>> {
        self.callback.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Push the current state to async waiters. Called with `inner` held so
    /// snapshots are published in transition order.
    fn publish(&self, inner: &Inner) {
        self.snapshot.send_replace(Snapshot {
            in_flight: inner.running,
            outcome: inner.outcome.clone(),
        });
    }
}

fn wait_status(
    in_flight: bool,
    outcome: &Option<Result<(), InferError>>,
) -> Result<WaitStatus, InferError> {
    if in_flight {
        return Ok(WaitStatus::NotReady);
    }
    match outcome {
        None => Ok(WaitStatus::NotStarted),
        Some(Ok(())) => Ok(WaitStatus::Ready),
        Some(Err(error)) => Err(error.clone()),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

async fn settled(mut rx: watch::Receiver<Snapshot>) -> Result<Snapshot, watch::error::RecvError> {
    let snapshot = rx.wait_for(|s| !s.in_flight).await?;
    Ok(snapshot.clone())
}

/// State machine plus pipeline driver for one asynchronous request.
pub struct AsyncRequestCore {
    shared: Arc<CoreShared>,
}

impl AsyncRequestCore {
    pub fn new(pipeline: Pipeline, callback_executor: Arc<dyn TaskExecutor>) -> Self {
        let (snapshot, _) = watch::channel(Snapshot::default());
        Self {
            shared: Arc::new(CoreShared {
                pipeline,
                inner: Mutex::new(Inner {
                    state: RequestState::Idle,
                    running: false,
                    generation: 0,
                    outcome: None,
                    cancel: CancellationToken::new(),
                    started_at: None,
                }),
                done: Condvar::new(),
                snapshot,
                callback: Mutex::new(None),
                callback_executor,
            }),
        }
    }

    pub fn state(&self) -> RequestState {
        self.shared.lock().state
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.shared.pipeline
    }

    /// Start a run. `prepare` executes after the request has been claimed and
    /// before stage 0 is scheduled; its failure is returned here and leaves
    /// the request as it was.
    pub fn start_with<F>(&self, prepare: F) -> Result<(), InferError>
    where
        F: FnOnce() -> Result<(), InferError>,
    {
        let (ticket, previous) = {
            let mut inner = self.shared.lock();
            match inner.state {
                RequestState::Idle => {}
                RequestState::Busy => {
                    StartRejected {
                        state: inner.state.as_str(),
                    }
                    .log();
                    return Err(InferError::RequestBusy(
                        "Infer request is busy with a previous run".to_string(),
                    ));
                }
                RequestState::Stopping | RequestState::Stopped => {
                    StartRejected {
                        state: inner.state.as_str(),
                    }
                    .log();
                    return Err(InferError::InferCancelled(
                        "Infer request has been stopped".to_string(),
                    ));
                }
            }
            let previous = (inner.generation, inner.running, inner.outcome.take());
            inner.state = RequestState::Busy;
            inner.running = true;
            inner.generation = inner.generation.wrapping_add(1);
            inner.cancel = CancellationToken::new();
            inner.started_at = Some(Instant::now());
            self.shared.publish(&inner);
            let ticket = RunTicket {
                generation: inner.generation,
                cancel: inner.cancel.clone(),
            };
            (ticket, previous)
        };

        if let Err(error) = prepare() {
            let (generation, running, outcome) = previous;
            let mut inner = self.shared.lock();
            inner.state = match inner.state {
                RequestState::Stopping => RequestState::Stopped,
                _ => RequestState::Idle,
            };
            inner.generation = generation;
            inner.running = running;
            inner.outcome = outcome;
            self.shared.publish(&inner);
            drop(inner);
            self.shared.done.notify_all();
            return Err(error);
        }

        RunStarted {
            partition_count: self.shared.pipeline.len(),
        }
        .log();

        if self.shared.pipeline.is_empty() {
            finish(&self.shared, ticket, Ok(()));
        } else {
            run_stage(&self.shared, 0, ticket);
        }
        Ok(())
    }

    /// Block according to `mode` and report the request's status.
    pub fn wait(&self, mode: WaitMode) -> Result<WaitStatus, InferError> {
        let inner = self.shared.lock();
        let inner = match mode {
            WaitMode::ResultReady => self
                .shared
                .done
                .wait_while(inner, |i| i.running)
                .unwrap_or_else(|e| e.into_inner()),
            WaitMode::StatusOnly => inner,
            WaitMode::Timeout(limit) => {
                self.shared
                    .done
                    .wait_timeout_while(inner, limit, |i| i.running)
                    .unwrap_or_else(|e| e.into_inner())
                    .0
            }
        };
        wait_status(inner.running, &inner.outcome)
    }

    /// Async counterpart of [`wait`](Self::wait). `None` waits until the run
    /// settles, `Some(Duration::ZERO)` only reports the current status.
    pub async fn wait_async(&self, timeout: Option<Duration>) -> Result<WaitStatus, InferError> {
        let rx = self.shared.snapshot.subscribe();
        let snapshot = match timeout {
            None => settled(rx).await,
            Some(limit) => match tokio::time::timeout(limit, settled(rx)).await {
                Ok(snapshot) => snapshot,
                Err(_) => return Ok(WaitStatus::NotReady),
            },
        };
        match snapshot {
            Ok(snapshot) => wait_status(snapshot.in_flight, &snapshot.outcome),
            Err(_) => Err(InferError::Unexpected(
                "request state channel closed".to_string(),
            )),
        }
    }

    pub fn set_completion_callback<F>(&self, callback: F)
    where
        F: Fn(Result<(), InferError>) + Send + Sync + 'static,
    {
        *self.shared.callback() = Some(Arc::new(callback));
    }

    /// Ask the in-flight run to stop at the next stage boundary. Returns
    /// whether there was a run to cancel.
    pub fn cancel(&self) -> bool {
        let inner = self.shared.lock();
        if inner.state == RequestState::Busy {
            inner.cancel.cancel();
            true
        } else {
            false
        }
    }

    /// Drop the user callback, refuse further starts and block until any
    /// in-flight run has finished and published its outcome. An in-flight
    /// run is also cancelled, so it ends at its next stage boundary.
    pub fn stop_and_wait(&self) {
        *self.shared.callback() = None;
        let mut inner = self.shared.lock();
        inner.cancel.cancel();
        inner.state = match inner.state {
            RequestState::Idle | RequestState::Stopped => RequestState::Stopped,
            RequestState::Busy | RequestState::Stopping => RequestState::Stopping,
        };
        self.shared.publish(&inner);
        let _inner = self
            .shared
            .done
            .wait_while(inner, |i| i.state == RequestState::Stopping || i.running)
            .unwrap_or_else(|e| e.into_inner());
    }
}

fn run_stage(shared: &Arc<CoreShared>, index: usize, ticket: RunTicket) {
    let Some(stage) = shared.pipeline.stage(index) else {
        finish(shared, ticket, Ok(()));
        return;
    };
    let executor = Arc::clone(&stage.executor);
    let task = Arc::clone(&stage.task);
    let shared = Arc::clone(shared);

    executor.run(Box::new(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(|| task())).unwrap_or_else(|payload| {
            Err(InferError::Unexpected(format!(
                "stage {} panicked: {}",
                index,
                panic_message(payload.as_ref())
            )))
        });

        match result {
            Err(error) => {
                RunFailed {
                    stage: index,
                    error: &error,
                }
                .log();
                finish(&shared, ticket, Err(error));
            }
            Ok(()) if index + 1 >= shared.pipeline.len() => finish(&shared, ticket, Ok(())),
            Ok(()) if ticket.cancel.is_cancelled() => {
                RunCancelled {
                    completed_stages: index + 1,
                }
                .log();
                finish(
                    &shared,
                    ticket,
                    Err(InferError::InferCancelled(format!(
                        "Infer request cancelled after stage {}",
                        index
                    ))),
                );
            }
            Ok(()) => {
                StageAdvanced {
                    completed_stage: index,
                    next_stage: index + 1,
                }
                .log();
                run_stage(&shared, index + 1, ticket);
            }
        }
    }));
}

/// Close the run, hand `outcome` to the user callback, then publish it to
/// waiters. A callback panic replaces the outcome.
fn finish(shared: &Arc<CoreShared>, ticket: RunTicket, outcome: Result<(), InferError>) {
    let executor = Arc::clone(&shared.callback_executor);
    let shared = Arc::clone(shared);

    executor.run(Box::new(move || {
        {
            let mut inner = shared.lock();
            if outcome.is_ok() {
                RunCompleted {
                    partition_count: shared.pipeline.len(),
                    duration: inner.started_at.map(|t| t.elapsed()).unwrap_or_default(),
                }
                .log();
            }
            inner.state = match inner.state {
                RequestState::Stopping | RequestState::Stopped => RequestState::Stopped,
                RequestState::Idle | RequestState::Busy => RequestState::Idle,
            };
        }

        let mut outcome = outcome;
        let callback = shared.callback().clone();
        if let Some(callback) = callback {
            let delivered = outcome.clone();
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(delivered))) {
                let message = panic_message(payload.as_ref());
                CompletionCallbackPanicked { message: &message }.log();
                outcome = Err(InferError::Unexpected(format!(
                    "completion callback panicked: {}",
                    message
                )));
            }
        }

        let mut inner = shared.lock();
        if inner.generation != ticket.generation {
            OutcomeSuperseded {
                generation: ticket.generation,
                current_generation: inner.generation,
            }
            .log();
            return;
        }
        inner.running = false;
        inner.outcome = Some(outcome);
        shared.publish(&inner);
        drop(inner);
        shared.done.notify_all();
    }));
}
