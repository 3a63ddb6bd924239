// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bridge from a backend's completion callback to a one-shot continuation.
//!
//! A [`SubRequestAdapter`] is a [`TaskExecutor`] whose `run` does not execute
//! the task itself: it parks the task as the pending continuation and starts
//! the bound sub-request. When the backend reports completion, the handler
//! registered at construction records the outcome code, moves the continuation
//! out of the slot and invokes it, on whatever thread the backend fired from.
//!
//! The handler only holds a `Weak` reference to the slot, so a backend that
//! fires after the adapter is gone finds nothing to call into.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::errors::StatusCode;
use crate::observability::messages::backend::{
    ContinuationStillPending, LateCompletionIgnored, SubRequestStartFailed, UnsolicitedCompletion,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{SubRequest, Task, TaskExecutor};

struct SlotState {
    status: StatusCode,
    continuation: Option<Task>,
}

/// Last outcome code of one sub-request and its pending continuation.
///
/// Written by the completion handler, read by the paired validator. The
/// handler records the status before releasing the continuation, so the
/// validator, which runs inside that continuation, always sees it.
pub struct AdapterSlot {
    state: Mutex<SlotState>,
}

impl AdapterSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                status: StatusCode::Ok,
                continuation: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn status(&self) -> StatusCode {
        self.lock().status
    }

    pub fn has_pending_continuation(&self) -> bool {
        self.lock().continuation.is_some()
    }

    /// Record `status` and fire the pending continuation, if any.
    fn complete(&self, device: &str, status: StatusCode) {
        let continuation = {
            let mut state = self.lock();
            state.status = status;
            state.continuation.take()
        };
        match continuation {
            Some(continuation) => continuation(),
            None => UnsolicitedCompletion { device, status }.log(),
        }
    }
}

/// Continuation-acceptor over one backend sub-request.
pub struct SubRequestAdapter {
    request: Arc<dyn SubRequest>,
    slot: Arc<AdapterSlot>,
    device: String,
}

impl SubRequestAdapter {
    /// Bind to `request` and register the completion handler. The handler
    /// stays registered for the adapter's lifetime.
    pub fn new(request: Arc<dyn SubRequest>) -> Self {
        let slot = Arc::new(AdapterSlot::new());
        let device = request.device().to_string();

        let weak: Weak<AdapterSlot> = Arc::downgrade(&slot);
        let handler_device = device.clone();
        request.set_completion_callback(Arc::new(move |status| match weak.upgrade() {
            Some(slot) => slot.complete(&handler_device, status),
            None => LateCompletionIgnored {
                device: &handler_device,
                status,
            }
            .log(),
        }));

        Self {
            request,
            slot,
            device,
        }
    }

    pub fn slot(&self) -> Arc<AdapterSlot> {
        Arc::clone(&self.slot)
    }

    pub fn status(&self) -> StatusCode {
        self.slot.status()
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl TaskExecutor for SubRequestAdapter {
    /// Park `continuation` and start the sub-request.
    ///
    /// A second `run` while a continuation is still pending is rejected: the
    /// new continuation fires immediately with `Unexpected`. A failed
    /// `start_async` completes the stage at once with the failure's code.
    fn run(&self, continuation: Task) {
        {
            let mut state = self.slot.lock();
            if state.continuation.is_some() {
                state.status = StatusCode::Unexpected;
                drop(state);
                ContinuationStillPending {
                    device: &self.device,
                }
                .log();
                continuation();
                return;
            }
            state.continuation = Some(continuation);
        }

        if let Err(error) = self.request.start_async() {
            SubRequestStartFailed {
                device: &self.device,
                error: &error,
            }
            .log();
            self.slot.complete(&self.device, error.status_code());
        }
    }

    fn name(&self) -> &'static str {
        "sub_request_adapter"
    }
}
