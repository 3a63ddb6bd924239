// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::backends::local::LocalRequestFactory;
use crate::config::{Config, ExecutorKind};
use crate::engine::executors::{ImmediateExecutor, TokioExecutor};
use crate::engine::Orchestrator;
use crate::errors::InferError;
use crate::partition::{PartitionSet, SubNetwork};
use crate::traits::TaskExecutor;

/// Builds a ready-to-run [`Orchestrator`] from configuration.
///
/// Creates one local sub-request per configured partition, wires them into a
/// [`PartitionSet`] and picks the callback executor. Local devices run on
/// `runtime`'s blocking pool.
///
/// # Example
/// ```
/// use hetero_orchestrator::config::{Config, ExecutorKind, PartitionConfig, RuntimeBuilder};
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let config = Config {
///     callback_executor: ExecutorKind::Immediate,
///     wait_timeout_ms: None,
///     iterations: None,
///     inputs: vec!["x".to_string()],
///     outputs: vec!["y".to_string()],
///     partitions: vec![PartitionConfig {
///         id: "only".to_string(),
///         device: "CPU".to_string(),
///         inputs: vec!["x".to_string()],
///         outputs: vec!["y".to_string()],
///         kernel: Default::default(),
///         latency_ms: None,
///         fail_with: None,
///     }],
/// };
///
/// let orchestrator = RuntimeBuilder::from_config(&config, runtime.handle().clone()).unwrap();
/// assert_eq!(orchestrator.pipeline_len(), 1);
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    pub fn from_config(cfg: &Config, runtime: Handle) -> Result<Orchestrator, InferError> {
        let subnetworks = cfg
            .partitions
            .iter()
            .map(|partition| {
                SubNetwork::new(
                    partition.id.clone(),
                    LocalRequestFactory::create_request(partition, runtime.clone()),
                    partition.inputs.clone(),
                    partition.outputs.clone(),
                )
            })
            .collect();
        let partitions = PartitionSet::new(&cfg.inputs, &cfg.outputs, subnetworks)?;

        let callback_executor: Arc<dyn TaskExecutor> = match cfg.callback_executor {
            ExecutorKind::Immediate => Arc::new(ImmediateExecutor),
            ExecutorKind::Tokio => Arc::new(TokioExecutor::new(runtime)),
        };

        Ok(Orchestrator::new(Arc::new(partitions), callback_executor))
    }
}
