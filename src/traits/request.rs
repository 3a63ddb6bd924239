use std::sync::Arc;
use std::time::Duration;

use crate::errors::{InferError, StatusCode};
use crate::partition::Blob;

/// Handler invoked by a sub-request each time an asynchronous run completes.
pub type CompletionCallback = Arc<dyn Fn(StatusCode) + Send + Sync>;

/// How long a `wait` call is allowed to block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Block until the result is ready, however long that takes.
    ResultReady,
    /// Do not block; report the current status.
    StatusOnly,
    /// Block for at most the given duration.
    Timeout(Duration),
}

impl WaitMode {
    /// Interpret a millisecond timeout the way backend APIs usually do:
    /// negative means "until ready", zero means "status only".
    pub fn from_millis(millis: i64) -> Self {
        match millis {
            m if m < 0 => WaitMode::ResultReady,
            0 => WaitMode::StatusOnly,
            m => WaitMode::Timeout(Duration::from_millis(m as u64)),
        }
    }

    /// The deadline an async wait should use: `None` blocks until ready.
    pub fn timeout(self) -> Option<Duration> {
        match self {
            WaitMode::ResultReady => None,
            WaitMode::StatusOnly => Some(Duration::ZERO),
            WaitMode::Timeout(limit) => Some(limit),
        }
    }
}

/// Non-failing result of a `wait` call on an orchestrated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// The run reached its terminal state successfully.
    Ready,
    /// The run is still in flight (timeout elapsed or status-only query).
    NotReady,
    /// The request has never been started.
    NotStarted,
}

/// One backend-bound synchronous inference handle.
///
/// The orchestrator depends on exactly these operations. The completion
/// handler may be invoked from a thread the backend owns.
pub trait SubRequest: Send + Sync {
    /// Begin asynchronous execution. Completion is reported through the
    /// registered callback.
    fn start_async(&self) -> Result<(), InferError>;

    /// Block according to `mode`. Returns `Ok` once the last run finished,
    /// `ResultNotReady` if still running when the wait gave up, and
    /// `InferNotStarted` if the request has never run.
    fn wait(&self, mode: WaitMode) -> StatusCode;

    /// Register the handler invoked with the outcome code of each run.
    /// Replaces any previously registered handler.
    fn set_completion_callback(&self, callback: CompletionCallback);

    /// Name of the device this request is bound to.
    fn device(&self) -> &str;
}

/// Blob access used by the cross-partition marshalling step.
pub trait BlobBinding: Send + Sync {
    fn get_blob(&self, name: &str) -> Option<Blob>;

    fn set_blob(&self, name: &str, blob: Blob);
}

/// A sub-request that also exposes its blob bindings.
pub trait PartitionRequest: SubRequest + BlobBinding {
    /// The same request seen through the orchestrator-facing contract only.
    fn into_sub_request(self: Arc<Self>) -> Arc<dyn SubRequest>;
}

impl<T: SubRequest + BlobBinding + 'static> PartitionRequest for T {
    fn into_sub_request(self: Arc<Self>) -> Arc<dyn SubRequest> {
        self
    }
}
