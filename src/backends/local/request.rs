// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;

use crate::backends::local::Kernel;
use crate::errors::{InferError, StatusCode};
use crate::observability::messages::backend::{
    SubRequestExecutionCompleted, SubRequestExecutionStarted,
};
use crate::observability::messages::StructuredLog;
use crate::partition::{Blob, BlobMap};
use crate::traits::{BlobBinding, CompletionCallback, SubRequest, WaitMode};

#[derive(Default)]
struct RunState {
    started: bool,
    running: bool,
    handlers_in_flight: usize,
}

impl RunState {
    fn busy(&self) -> bool {
        self.running || self.handlers_in_flight > 0
    }
}

struct LocalShared {
    device: String,
    kernel: Kernel,
    inputs: Vec<String>,
    outputs: Vec<String>,
    latency: Duration,
    fail_with: Option<StatusCode>,
    blobs: Mutex<BlobMap>,
    callback: Mutex<Option<CompletionCallback>>,
    state: Mutex<RunState>,
    ready: Condvar,
}

impl LocalShared {
    fn state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn execute(&self) -> StatusCode {
        if let Some(code) = self.fail_with {
            return code;
        }
        let blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        let Some(input) = self.inputs.first().and_then(|name| blobs.get(name)) else {
            return StatusCode::NotAllocated;
        };
        let result = self.kernel.apply(&input.read());
        for name in &self.outputs {
            match blobs.get(name) {
                Some(blob) => blob.write(result.clone()),
                None => return StatusCode::NotAllocated,
            }
        }
        StatusCode::Ok
    }
}

/// In-process sub-request bound to a named "device".
///
/// Runs its [`Kernel`] on the blocking pool of a tokio runtime, so the
/// completion handler fires on a runtime-owned thread rather than the caller's.
/// The request stops counting as running before the handler fires, which lets
/// the handler's continuation restart it; `wait` still blocks until the
/// handler has returned.
pub struct LocalRequest {
    shared: Arc<LocalShared>,
    runtime: Handle,
}

impl LocalRequest {
    pub fn new(
        device: impl Into<String>,
        kernel: Kernel,
        inputs: Vec<String>,
        outputs: Vec<String>,
        runtime: Handle,
    ) -> Self {
        Self {
            shared: Arc::new(LocalShared {
                device: device.into(),
                kernel,
                inputs,
                outputs,
                latency: Duration::ZERO,
                fail_with: None,
                blobs: Mutex::new(BlobMap::new()),
                callback: Mutex::new(None),
                state: Mutex::new(RunState::default()),
                ready: Condvar::new(),
            }),
            runtime,
        }
    }

    /// Simulated device latency added to every run.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.latency = latency;
        }
        self
    }

    pub fn inputs(&self) -> &[String] {
        &self.shared.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.shared.outputs
    }

    /// Report `code` from every run instead of executing the kernel.
    pub fn with_failure(mut self, code: StatusCode) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.fail_with = Some(code);
        }
        self
    }
}

impl SubRequest for LocalRequest {
    fn start_async(&self) -> Result<(), InferError> {
        {
            let mut state = self.shared.state();
            if state.running {
                return Err(InferError::RequestBusy(format!(
                    "device '{}' is already running a request",
                    self.shared.device
                )));
            }
            state.started = true;
            state.running = true;
        }

        SubRequestExecutionStarted {
            device: &self.shared.device,
            kernel: self.shared.kernel.name(),
        }
        .log();

        let shared = Arc::clone(&self.shared);
        self.runtime.spawn_blocking(move || {
            let start_time = Instant::now();
            if !shared.latency.is_zero() {
                std::thread::sleep(shared.latency);
            }
            let status = shared.execute();

            SubRequestExecutionCompleted {
                device: &shared.device,
                status,
                duration: start_time.elapsed(),
            }
            .log();

            {
                let mut state = shared.state();
                state.running = false;
                state.handlers_in_flight += 1;
            }
            let callback = shared
                .callback
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            if let Some(callback) = callback {
                callback(status);
            }
            shared.state().handlers_in_flight -= 1;
            shared.ready.notify_all();
        });
        Ok(())
    }

    fn wait(&self, mode: WaitMode) -> StatusCode {
        let state = self.shared.state();
        if !state.started {
            return StatusCode::InferNotStarted;
        }
        let state = match mode {
            WaitMode::ResultReady => self
                .shared
                .ready
                .wait_while(state, |s| s.busy())
                .unwrap_or_else(|e| e.into_inner()),
            WaitMode::StatusOnly => state,
            WaitMode::Timeout(limit) => {
                self.shared
                    .ready
                    .wait_timeout_while(state, limit, |s| s.busy())
                    .unwrap_or_else(|e| e.into_inner())
                    .0
            }
        };
        if state.busy() {
            StatusCode::ResultNotReady
        } else {
            StatusCode::Ok
        }
    }

    fn set_completion_callback(&self, callback: CompletionCallback) {
        *self.shared.callback.lock().unwrap_or_else(|e| e.into_inner()) = Some(callback);
    }

    fn device(&self) -> &str {
        &self.shared.device
    }
}

impl BlobBinding for LocalRequest {
    fn get_blob(&self, name: &str) -> Option<Blob> {
        self.shared
            .blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    fn set_blob(&self, name: &str, blob: Blob) {
        self.shared
            .blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), blob);
    }
}
