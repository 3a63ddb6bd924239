// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::engine::adapter::AdapterSlot;
use crate::errors::InferError;

/// Second half of a stage: turns the paired sub-request's outcome into a
/// typed failure.
///
/// Runs inside the adapter's continuation, so the slot already holds the
/// outcome of the run that just finished.
pub struct StageValidator {
    slot: Arc<AdapterSlot>,
    partition: usize,
    partition_id: String,
    device: String,
}

impl StageValidator {
    pub fn new(
        slot: Arc<AdapterSlot>,
        partition: usize,
        partition_id: impl Into<String>,
        device: impl Into<String>,
    ) -> Self {
        Self {
            slot,
            partition,
            partition_id: partition_id.into(),
            device: device.into(),
        }
    }

    pub fn validate(&self) -> Result<(), InferError> {
        let status = self.slot.status();
        status.into_result(format!(
            "partition {} ('{}') on device '{}' reported {}",
            self.partition, self.partition_id, self.device, status
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubRequest;
    use crate::engine::adapter::SubRequestAdapter;
    use crate::errors::StatusCode;
    use crate::traits::TaskExecutor;
    use std::sync::mpsc;
    use std::time::Duration;

    fn validator_after_run(status: StatusCode) -> StageValidator {
        let stub = Arc::new(StubRequest::new("GPU", status));
        let adapter = SubRequestAdapter::new(stub);
        let (tx, rx) = mpsc::channel();
        adapter.run(Box::new(move || tx.send(()).unwrap()));
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        StageValidator::new(adapter.slot(), 1, "p1", "GPU")
    }

    #[test]
    fn test_success_is_a_no_op() {
        assert_eq!(validator_after_run(StatusCode::Ok).validate(), Ok(()));
    }

    #[test]
    fn test_failure_is_mapped_and_names_the_partition() {
        let error = validator_after_run(StatusCode::GeneralError)
            .validate()
            .unwrap_err();

        assert!(matches!(error, InferError::GeneralError(_)));
        let message = error.to_string();
        assert!(message.contains("partition 1"));
        assert!(message.contains("GPU"));
    }

    #[test]
    fn test_unknown_code_is_unspecified() {
        let error = validator_after_run(StatusCode::Unknown(-99))
            .validate()
            .unwrap_err();
        assert_eq!(error.status_code(), StatusCode::Unknown(-99));
    }
}
