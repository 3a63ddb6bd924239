// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use crate::errors::{InferError, StatusCode};
use crate::partition::{Blob, BlobMap};
use crate::traits::{BlobBinding, CompletionCallback, SubRequest, WaitMode};

/// Shared log of `start_async` calls, recorded as device names.
pub type StartLog = Arc<Mutex<Vec<String>>>;

/// Latch a test can hold closed to keep a stub request in flight.
#[derive(Clone)]
pub struct StubGate(Arc<(Mutex<bool>, Condvar)>);

impl StubGate {
    fn open() -> Self {
        Self(Arc::new((Mutex::new(true), Condvar::new())))
    }

    fn close(&self) {
        *self.0 .0.lock().unwrap() = false;
    }

    pub fn release(&self) {
        let (lock, cvar) = &*self.0;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    fn pass(&self) {
        let (lock, cvar) = &*self.0;
        let _open = cvar.wait_while(lock.lock().unwrap(), |open| !*open).unwrap();
    }
}

#[derive(Default)]
struct StubState {
    started: bool,
    running: bool,
    handlers_in_flight: usize,
}

impl StubState {
    fn busy(&self) -> bool {
        self.running || self.handlers_in_flight > 0
    }
}

struct StubShared {
    device: String,
    status: Mutex<StatusCode>,
    start_failure: Mutex<Option<StatusCode>>,
    callback: Mutex<Option<CompletionCallback>>,
    blobs: Mutex<BlobMap>,
    state: Mutex<StubState>,
    ready: Condvar,
    gate: StubGate,
    log: Option<StartLog>,
    start_calls: AtomicUsize,
    wait_calls: AtomicUsize,
    completions: AtomicUsize,
}

/// A scripted sub-request for tests.
///
/// Every `start_async` fires the completion handler with the scripted status
/// from a freshly spawned thread, the way a device driver would. The request
/// stops counting as running before the handler fires, but `wait` only returns
/// once the handler is done. Calls to `start_async` and `wait` are counted so
/// tests can assert on drains.
#[derive(Clone)]
pub struct StubRequest {
    shared: Arc<StubShared>,
}

impl StubRequest {
    pub fn new(device: impl Into<String>, status: StatusCode) -> Self {
        Self::build(device.into(), status, None)
    }

    /// Like `new`, recording each start into `log`.
    pub fn logged(device: impl Into<String>, status: StatusCode, log: StartLog) -> Self {
        Self::build(device.into(), status, Some(log))
    }

    fn build(device: String, status: StatusCode, log: Option<StartLog>) -> Self {
        Self {
            shared: Arc::new(StubShared {
                device,
                status: Mutex::new(status),
                start_failure: Mutex::new(None),
                callback: Mutex::new(None),
                blobs: Mutex::new(BlobMap::new()),
                state: Mutex::new(StubState::default()),
                ready: Condvar::new(),
                gate: StubGate::open(),
                log,
                start_calls: AtomicUsize::new(0),
                wait_calls: AtomicUsize::new(0),
                completions: AtomicUsize::new(0),
            }),
        }
    }

    /// Close the gate: runs started from now on block until
    /// [`StubGate::release`] is called on the returned gate.
    pub fn hold(&self) -> StubGate {
        self.shared.gate.close();
        self.shared.gate.clone()
    }

    pub fn set_status(&self, status: StatusCode) {
        *self.shared.status.lock().unwrap() = status;
    }

    /// Make `start_async` itself fail with `code`.
    pub fn fail_start_with(&self, code: StatusCode) {
        *self.shared.start_failure.lock().unwrap() = Some(code);
    }

    pub fn start_calls(&self) -> usize {
        self.shared.start_calls.load(Ordering::SeqCst)
    }

    pub fn wait_calls(&self) -> usize {
        self.shared.wait_calls.load(Ordering::SeqCst)
    }

    pub fn completions(&self) -> usize {
        self.shared.completions.load(Ordering::SeqCst)
    }

    pub fn is_busy(&self) -> bool {
        self.shared.state.lock().unwrap().busy()
    }
}

impl SubRequest for StubRequest {
    fn start_async(&self) -> Result<(), InferError> {
        let shared = &self.shared;
        shared.start_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &shared.log {
            log.lock().unwrap().push(shared.device.clone());
        }
        if let Some(code) = *shared.start_failure.lock().unwrap() {
            return code.into_result(format!("{} refused to start", shared.device));
        }
        {
            let mut state = shared.state.lock().unwrap();
            if state.running {
                return Err(InferError::RequestBusy(format!("{} is busy", shared.device)));
            }
            state.started = true;
            state.running = true;
        }

        let shared = Arc::clone(&self.shared);
        thread::spawn(move || {
            shared.gate.pass();
            let status = *shared.status.lock().unwrap();
            {
                let mut state = shared.state.lock().unwrap();
                state.running = false;
                state.handlers_in_flight += 1;
            }
            let callback = shared.callback.lock().unwrap().clone();
            if let Some(callback) = callback {
                callback(status);
            }
            shared.completions.fetch_add(1, Ordering::SeqCst);
            shared.state.lock().unwrap().handlers_in_flight -= 1;
            shared.ready.notify_all();
        });
        Ok(())
    }

    fn wait(&self, mode: WaitMode) -> StatusCode {
        let shared = &self.shared;
        shared.wait_calls.fetch_add(1, Ordering::SeqCst);
        let state = shared.state.lock().unwrap();
        if !state.started {
            return StatusCode::InferNotStarted;
        }
        let state = match mode {
            WaitMode::ResultReady => shared.ready.wait_while(state, |s| s.busy()).unwrap(),
            WaitMode::StatusOnly => state,
            WaitMode::Timeout(limit) => {
                shared.ready.wait_timeout_while(state, limit, |s| s.busy()).unwrap().0
            }
        };
        if state.busy() {
            StatusCode::ResultNotReady
        } else {
            StatusCode::Ok
        }
    }

    fn set_completion_callback(&self, callback: CompletionCallback) {
        *self.shared.callback.lock().unwrap() = Some(callback);
    }

    fn device(&self) -> &str {
        &self.shared.device
    }
}

impl BlobBinding for StubRequest {
    fn get_blob(&self, name: &str) -> Option<Blob> {
        self.shared.blobs.lock().unwrap().get(name).cloned()
    }

    fn set_blob(&self, name: &str, blob: Blob) {
        self.shared.blobs.lock().unwrap().insert(name.to_string(), blob);
    }
}
