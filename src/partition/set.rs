// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::errors::InferError;
use crate::observability::messages::partition::{BlobsRebound, PartitionsWired};
use crate::observability::messages::StructuredLog;
use crate::partition::{Blob, BlobMap};
use crate::traits::PartitionRequest;

/// One partition of the network: its sub-request plus the tensors it
/// consumes and produces.
pub struct SubNetwork {
    pub id: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub request: Arc<dyn PartitionRequest>,
}

impl SubNetwork {
    pub fn new(
        id: impl Into<String>,
        request: Arc<dyn PartitionRequest>,
        inputs: Vec<String>,
        outputs: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            inputs,
            outputs,
            request,
        }
    }

    pub fn device(&self) -> &str {
        self.request.device()
    }
}

impl fmt::Debug for SubNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubNetwork")
            .field("id", &self.id)
            .field("device", &self.device())
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

/// The ordered collection of partitions behind one logical request.
///
/// Owns the network-level input and output blobs the caller sees and the
/// wiring of intermediate blobs between partitions. Partition order is fixed at
/// construction and is the order the pipeline runs in.
pub struct PartitionSet {
    subnetworks: Vec<SubNetwork>,
    network_inputs: Mutex<BlobMap>,
    network_outputs: Mutex<BlobMap>,
}

impl PartitionSet {
    /// Wire the partitions together.
    ///
    /// Every network input and output gets a fresh blob. A tensor produced by
    /// one partition is bound as the same blob into every later partition that
    /// consumes it. Fails with `NotFound` when a partition consumes a tensor
    /// nothing earlier provides.
    pub fn new(
        network_inputs: &[String],
        network_outputs: &[String],
        subnetworks: Vec<SubNetwork>,
    ) -> Result<Self, InferError> {
        let inputs: BlobMap = network_inputs
            .iter()
            .map(|name| (name.clone(), Blob::new()))
            .collect();
        let outputs: BlobMap = network_outputs
            .iter()
            .map(|name| (name.clone(), Blob::new()))
            .collect();

        let mut available: HashMap<String, Blob> = inputs.clone();
        for subnetwork in &subnetworks {
            for name in &subnetwork.inputs {
                let blob = available.get(name).ok_or_else(|| {
                    InferError::NotFound(format!(
                        "partition '{}' consumes '{}' which no earlier partition produces",
                        subnetwork.id, name
                    ))
                })?;
                subnetwork.request.set_blob(name, blob.clone());
            }
            for name in &subnetwork.outputs {
                let blob = outputs.get(name).cloned().unwrap_or_default();
                subnetwork.request.set_blob(name, blob.clone());
                available.insert(name.clone(), blob);
            }
        }

        PartitionsWired {
            partition_count: subnetworks.len(),
            intermediate_count: available.len() - inputs.len(),
        }
        .log();

        Ok(Self {
            subnetworks,
            network_inputs: Mutex::new(inputs),
            network_outputs: Mutex::new(outputs),
        })
    }

    pub fn subnetworks(&self) -> &[SubNetwork] {
        &self.subnetworks
    }

    pub fn len(&self) -> usize {
        self.subnetworks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subnetworks.is_empty()
    }

    /// Replace a network-level input or output blob.
    ///
    /// The new blob reaches the sub-requests at the next
    /// [`update_in_out_if_needed`](Self::update_in_out_if_needed).
    pub fn set_blob(&self, name: &str, blob: Blob) -> Result<(), InferError> {
        for map in [&self.network_inputs, &self.network_outputs] {
            let mut guard = map.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(slot) = guard.get_mut(name) {
                *slot = blob;
                return Ok(());
            }
        }
        Err(InferError::NotFound(format!(
            "Failed to find input or output with name: '{}'",
            name
        )))
    }

    pub fn get_blob(&self, name: &str) -> Result<Blob, InferError> {
        for map in [&self.network_inputs, &self.network_outputs] {
            let guard = map.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(blob) = guard.get(name) {
                return Ok(blob.clone());
            }
        }
        Err(InferError::NotFound(format!(
            "Failed to find input or output with name: '{}'",
            name
        )))
    }

    /// Push the caller's current network-level blobs into every sub-request
    /// whose binding is stale. Returns the number of bindings replaced.
    pub fn update_in_out_if_needed(&self) -> usize {
        let inputs = self.network_inputs.lock().unwrap_or_else(|e| e.into_inner()).clone();
        let outputs = self.network_outputs.lock().unwrap_or_else(|e| e.into_inner()).clone();

        let mut rebound = 0;
        for subnetwork in &self.subnetworks {
            let names = subnetwork.inputs.iter().chain(subnetwork.outputs.iter());
            for name in names {
                let Some(user_blob) = inputs.get(name).or_else(|| outputs.get(name)) else {
                    continue;
                };
                let current = subnetwork.request.get_blob(name);
                if !current.is_some_and(|blob| Blob::same(&blob, user_blob)) {
                    subnetwork.request.set_blob(name, user_blob.clone());
                    rebound += 1;
                }
            }
        }

        if rebound > 0 {
            BlobsRebound { count: rebound }.log();
        }
        rebound
    }
}

impl fmt::Debug for PartitionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionSet")
            .field("subnetworks", &self.subnetworks)
            .finish()
    }
}
