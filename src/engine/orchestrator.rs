// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engine::async_request::{AsyncRequestCore, RequestState};
use crate::engine::pipeline::PipelineAssembler;
use crate::errors::{InferError, StatusCode};
use crate::observability::messages::pipeline::{
    DrainCompleted, DrainJoinFailed, DrainStarted, SubRequestUnsettled,
};
use crate::observability::messages::StructuredLog;
use crate::partition::{Blob, PartitionSet};
use crate::traits::{SubRequest, TaskExecutor, WaitMode, WaitStatus};

/// One logical inference request executed as an ordered chain of
/// partitions, each on its own device.
///
/// The pipeline is built once here and reused by every run. Dropping the
/// orchestrator stops it and blocks until no sub-request is still running,
/// so no backend completion handler outlives it.
pub struct Orchestrator {
    core: AsyncRequestCore,
    partitions: Arc<PartitionSet>,
}

impl Orchestrator {
    pub fn new(partitions: Arc<PartitionSet>, callback_executor: Arc<dyn TaskExecutor>) -> Self {
        let pipeline = PipelineAssembler::assemble(&partitions);
        Self {
            core: AsyncRequestCore::new(pipeline, callback_executor),
            partitions,
        }
    }

    /// Sync cross-partition blobs, then run the pipeline from stage 0.
    ///
    /// Fails with `RequestBusy` while a run is in flight and with
    /// `InferCancelled` once the request has been stopped.
    pub fn start(&self) -> Result<(), InferError> {
        let partitions = &self.partitions;
        self.core.start_with(|| {
            partitions.update_in_out_if_needed();
            Ok(())
        })
    }

    /// Wait for the current run according to `mode`.
    ///
    /// A failed run is not reported until every sub-request has reached its
    /// terminal state. That drain blocks without regard to `mode`'s timeout:
    /// returning earlier would leave backend handlers running against a
    /// request the caller may already be tearing down.
    pub fn wait(&self, mode: WaitMode) -> Result<WaitStatus, InferError> {
        self.core.wait(mode).map_err(|error| {
            drain(&self.partitions, &error);
            error
        })
    }

    /// Async counterpart of [`wait`](Self::wait). The drain runs on the
    /// blocking pool.
    pub async fn wait_async(&self, timeout: Option<Duration>) -> Result<WaitStatus, InferError> {
        match self.core.wait_async(timeout).await {
            Err(error) => {
                let partitions = Arc::clone(&self.partitions);
                let cause = error.clone();
                if let Err(join_error) =
                    tokio::task::spawn_blocking(move || drain(&partitions, &cause)).await
                {
                    DrainJoinFailed { error: &join_error }.log();
                }
                Err(error)
            }
            status => status,
        }
    }

    /// Start and block until the run settles.
    pub fn infer(&self) -> Result<(), InferError> {
        self.start()?;
        self.wait(WaitMode::ResultReady).map(|_| ())
    }

    /// Stop the in-flight run at its next stage boundary.
    pub fn cancel(&self) -> bool {
        self.core.cancel()
    }

    /// Register the hook invoked with every run's outcome. Runs on the
    /// callback executor, before waiters observe the outcome.
    pub fn set_completion_callback<F>(&self, callback: F)
    where
        F: Fn(Result<(), InferError>) + Send + Sync + 'static,
    {
        self.core.set_completion_callback(callback);
    }

    pub fn state(&self) -> RequestState {
        self.core.state()
    }

    pub fn partitions(&self) -> &PartitionSet {
        &self.partitions
    }

    pub fn pipeline_len(&self) -> usize {
        self.core.pipeline().len()
    }

    pub fn set_blob(&self, name: &str, blob: Blob) -> Result<(), InferError> {
        self.partitions.set_blob(name, blob)
    }

    pub fn get_blob(&self, name: &str) -> Result<Blob, InferError> {
        self.partitions.get_blob(name)
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.core.stop_and_wait();
        for subnetwork in self.partitions.subnetworks() {
            subnetwork.request.wait(WaitMode::ResultReady);
        }
    }
}

/// Block until every sub-request has reached its terminal ready state.
fn drain(partitions: &PartitionSet, error: &InferError) {
    let started = Instant::now();
    let message = DrainStarted {
        partition_count: partitions.len(),
        error,
    };
    message.log();
    let _span = message.span("orchestrator").entered();

    for subnetwork in partitions.subnetworks() {
        let status = subnetwork.request.wait(WaitMode::ResultReady);
        if !matches!(status, StatusCode::Ok | StatusCode::InferNotStarted) {
            SubRequestUnsettled {
                partition: &subnetwork.id,
                device: subnetwork.device(),
                status,
            }
            .log();
        }
    }

    DrainCompleted {
        partition_count: partitions.len(),
        duration: started.elapsed(),
    }
    .log();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{StartLog, StubRequest};
    use crate::engine::executors::ImmediateExecutor;
    use crate::partition::SubNetwork;
    use std::sync::Mutex;
    use std::thread;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// A linear chain `in -> t0 -> t1 -> ... -> out` over the given stubs.
    fn chain(stubs: &[StubRequest]) -> Orchestrator {
        let last = stubs.len() - 1;
        let subnetworks = stubs
            .iter()
            .enumerate()
            .map(|(i, stub)| {
                let input = if i == 0 { "in".to_string() } else { format!("t{}", i - 1) };
                let output = if i == last { "out".to_string() } else { format!("t{}", i) };
                SubNetwork::new(
                    format!("p{}", i),
                    Arc::new(stub.clone()),
                    vec![input],
                    vec![output],
                )
            })
            .collect();
        let partitions = PartitionSet::new(&names(&["in"]), &names(&["out"]), subnetworks).unwrap();
        Orchestrator::new(Arc::new(partitions), Arc::new(ImmediateExecutor))
    }

    fn ok_stubs(devices: &[&str]) -> Vec<StubRequest> {
        devices
            .iter()
            .map(|d| StubRequest::new(*d, StatusCode::Ok))
            .collect()
    }

    #[test]
    fn test_all_partitions_succeed_in_order() {
        let log: StartLog = Arc::new(Mutex::new(Vec::new()));
        let stubs: Vec<StubRequest> = ["CPU", "GPU", "MYRIAD"]
            .iter()
            .map(|d| StubRequest::logged(*d, StatusCode::Ok, log.clone()))
            .collect();
        let orchestrator = chain(&stubs);

        orchestrator.start().unwrap();

        assert_eq!(orchestrator.wait(WaitMode::ResultReady), Ok(WaitStatus::Ready));
        assert_eq!(*log.lock().unwrap(), names(&["CPU", "GPU", "MYRIAD"]));
        assert_eq!(orchestrator.pipeline_len(), 3);
        assert_eq!(orchestrator.state(), RequestState::Idle);
    }

    #[test]
    fn test_middle_failure_skips_later_partitions_and_drains_all() {
        let stubs = vec![
            StubRequest::new("CPU", StatusCode::Ok),
            StubRequest::new("GPU", StatusCode::GeneralError),
            StubRequest::new("MYRIAD", StatusCode::Ok),
        ];
        let orchestrator = chain(&stubs);

        orchestrator.start().unwrap();
        let error = orchestrator.wait(WaitMode::ResultReady).unwrap_err();

        assert!(matches!(error, InferError::GeneralError(_)));
        assert_eq!(stubs[2].start_calls(), 0);
        for stub in &stubs {
            assert!(stub.wait_calls() >= 1);
            assert!(!stub.is_busy());
        }
    }

    #[test]
    fn test_failure_is_replayed_to_every_wait() {
        let stubs = vec![StubRequest::new("GPU", StatusCode::NotAllocated)];
        let orchestrator = chain(&stubs);

        orchestrator.start().unwrap();
        let first = orchestrator.wait(WaitMode::ResultReady).unwrap_err();
        let second = orchestrator.wait(WaitMode::StatusOnly).unwrap_err();

        assert_eq!(first, second);
        assert_eq!(first.status_code(), StatusCode::NotAllocated);
    }

    #[test]
    fn test_start_while_in_flight_is_busy() {
        let stubs = ok_stubs(&["CPU", "GPU"]);
        let gate = stubs[0].hold();
        let orchestrator = chain(&stubs);

        orchestrator.start().unwrap();
        let rejected = orchestrator.start().unwrap_err();
        assert!(matches!(rejected, InferError::RequestBusy(_)));
        assert_eq!(stubs[0].start_calls(), 1);

        gate.release();
        assert_eq!(orchestrator.wait(WaitMode::ResultReady), Ok(WaitStatus::Ready));
    }

    #[test]
    fn test_wait_with_timeout_reports_not_ready_without_side_effects() {
        let stubs = ok_stubs(&["CPU"]);
        let gate = stubs[0].hold();
        let orchestrator = chain(&stubs);

        assert_eq!(
            orchestrator.wait(WaitMode::StatusOnly),
            Ok(WaitStatus::NotStarted)
        );
        orchestrator.start().unwrap();
        assert_eq!(
            orchestrator.wait(WaitMode::Timeout(Duration::from_millis(20))),
            Ok(WaitStatus::NotReady)
        );
        assert_eq!(orchestrator.state(), RequestState::Busy);

        gate.release();
        assert_eq!(orchestrator.wait(WaitMode::ResultReady), Ok(WaitStatus::Ready));
    }

    #[test]
    fn test_restart_reuses_the_pipeline() {
        let stubs = ok_stubs(&["CPU", "GPU"]);
        let orchestrator = chain(&stubs);

        orchestrator.infer().unwrap();
        stubs[1].set_status(StatusCode::OutOfBounds);
        let error = orchestrator.infer().unwrap_err();
        stubs[1].set_status(StatusCode::Ok);
        orchestrator.infer().unwrap();

        assert!(matches!(error, InferError::OutOfBounds(_)));
        assert_eq!(stubs[0].start_calls(), 3);
        assert_eq!(stubs[1].start_calls(), 3);
    }

    #[test]
    fn test_start_failure_surfaces_through_wait() {
        let stubs = ok_stubs(&["CPU", "GPU"]);
        stubs[0].fail_start_with(StatusCode::NetworkNotLoaded);
        let orchestrator = chain(&stubs);

        orchestrator.start().unwrap();
        let error = orchestrator.wait(WaitMode::ResultReady).unwrap_err();

        assert!(matches!(error, InferError::NetworkNotLoaded(_)));
        assert_eq!(stubs[1].start_calls(), 0);
    }

    #[test]
    fn test_cancel_stops_at_stage_boundary() {
        let stubs = ok_stubs(&["CPU", "GPU"]);
        let gate = stubs[0].hold();
        let orchestrator = chain(&stubs);

        orchestrator.start().unwrap();
        assert!(orchestrator.cancel());
        gate.release();

        let error = orchestrator.wait(WaitMode::ResultReady).unwrap_err();
        assert!(matches!(error, InferError::InferCancelled(_)));
        assert_eq!(stubs[1].start_calls(), 0);
    }

    #[test]
    fn test_completion_callback_receives_outcome() {
        let stubs = vec![StubRequest::new("GPU", StatusCode::ParameterMismatch)];
        let orchestrator = chain(&stubs);
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let sink = outcomes.clone();
        orchestrator.set_completion_callback(move |outcome| sink.lock().unwrap().push(outcome));

        orchestrator.start().unwrap();
        let error = orchestrator.wait(WaitMode::ResultReady).unwrap_err();

        assert_eq!(*outcomes.lock().unwrap(), vec![Err(error)]);
    }

    #[test]
    fn test_completion_callback_can_restart_the_request() {
        let stubs = ok_stubs(&["CPU"]);
        let orchestrator = Arc::new(chain(&stubs));
        let restarts = Arc::new(Mutex::new(Vec::new()));
        let sink = restarts.clone();
        let weak = Arc::downgrade(&orchestrator);
        orchestrator.set_completion_callback(move |_| {
            let mut restarts = sink.lock().unwrap();
            if restarts.is_empty() {
                if let Some(orchestrator) = weak.upgrade() {
                    restarts.push(orchestrator.start());
                }
            }
        });

        orchestrator.start().unwrap();

        assert_eq!(orchestrator.wait(WaitMode::ResultReady), Ok(WaitStatus::Ready));
        assert_eq!(stubs[0].wait(WaitMode::ResultReady), StatusCode::Ok);
        assert_eq!(*restarts.lock().unwrap(), vec![Ok(())]);
        assert_eq!(stubs[0].start_calls(), 2);
        assert_eq!(stubs[0].completions(), 2);
    }

    #[test]
    fn test_drop_blocks_until_in_flight_run_settles() {
        let stubs = ok_stubs(&["CPU", "GPU"]);
        let gate = stubs[0].hold();
        let orchestrator = chain(&stubs);
        orchestrator.start().unwrap();

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            gate.release();
        });
        let started = Instant::now();
        drop(orchestrator);

        assert!(started.elapsed() >= Duration::from_millis(90));
        assert_eq!(stubs[0].completions(), 1);
        assert_eq!(stubs[1].start_calls(), 0);
        releaser.join().unwrap();
    }

    #[test]
    fn test_late_completion_after_drop_is_ignored() {
        let stubs = ok_stubs(&["CPU"]);
        drop(chain(&stubs));

        stubs[0].start_async().unwrap();

        assert_eq!(stubs[0].wait(WaitMode::ResultReady), StatusCode::Ok);
        assert_eq!(stubs[0].completions(), 1);
    }

    #[test]
    fn test_network_blobs_are_reachable_by_name() {
        let stubs = ok_stubs(&["CPU"]);
        let orchestrator = chain(&stubs);

        orchestrator
            .set_blob("in", Blob::from_vec(vec![1.0, 2.0]))
            .unwrap();

        assert_eq!(orchestrator.get_blob("in").unwrap().read(), vec![1.0, 2.0]);
        assert!(matches!(
            orchestrator.get_blob("missing"),
            Err(InferError::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_wait_async_drains_on_failure() {
        let stubs = vec![
            StubRequest::new("CPU", StatusCode::Ok),
            StubRequest::new("GPU", StatusCode::Unexpected),
        ];
        let orchestrator = chain(&stubs);

        orchestrator.start().unwrap();
        let error = orchestrator.wait_async(None).await.unwrap_err();

        assert!(matches!(error, InferError::Unexpected(_)));
        assert!(stubs.iter().all(|s| s.wait_calls() >= 1));
    }
}
