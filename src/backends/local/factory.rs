// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use super::LocalRequest;
use crate::config::PartitionConfig;

/// Factory for creating local (in-process) sub-requests
pub struct LocalRequestFactory;

impl LocalRequestFactory {
    /// Create the sub-request for one configured partition.
    ///
    /// The request runs on `runtime`'s blocking pool. `latency_ms` and
    /// `fail_with` from the configuration simulate a slow or faulty device.
    pub fn create_request(config: &PartitionConfig, runtime: Handle) -> Arc<LocalRequest> {
        let mut request = LocalRequest::new(
            config.device.clone(),
            config.kernel,
            config.inputs.clone(),
            config.outputs.clone(),
            runtime,
        );
        if let Some(latency_ms) = config.latency_ms {
            request = request.with_latency(Duration::from_millis(latency_ms));
        }
        if let Some(code) = config.fail_with {
            request = request.with_failure(code);
        }
        Arc::new(request)
    }
}
