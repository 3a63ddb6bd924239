// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::engine::adapter::SubRequestAdapter;
use crate::engine::validator::StageValidator;
use crate::errors::InferError;
use crate::partition::PartitionSet;
use crate::traits::TaskExecutor;

/// Work performed once a stage's executor hands control back.
pub type StageTask = Arc<dyn Fn() -> Result<(), InferError> + Send + Sync>;

/// One `(executor, task)` pair of the pipeline.
#[derive(Clone)]
pub struct Stage {
    pub executor: Arc<dyn TaskExecutor>,
    pub task: StageTask,
}

impl Stage {
    pub fn new(executor: Arc<dyn TaskExecutor>, task: StageTask) -> Self {
        Self { executor, task }
    }
}

/// Ordered stages, built once and reused by every run of the request.
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<[Stage]>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            stages: stages.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }
}

/// Builds the stage chain for a partition set: one adapter and one
/// validator per partition, in partition order.
pub struct PipelineAssembler;

impl PipelineAssembler {
    pub fn assemble(partitions: &PartitionSet) -> Pipeline {
        let stages = partitions
            .subnetworks()
            .iter()
            .enumerate()
            .map(|(index, subnetwork)| {
                let adapter = SubRequestAdapter::new(subnetwork.request.clone().into_sub_request());
                let validator =
                    StageValidator::new(adapter.slot(), index, &subnetwork.id, adapter.device());
                let executor: Arc<dyn TaskExecutor> = Arc::new(adapter);
                let task: StageTask = Arc::new(move || validator.validate());
                Stage::new(executor, task)
            })
            .collect();
        Pipeline::new(stages)
    }
}
