// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation for partition layouts.
//!
//! A layout is executable when its partitions, run in declaration order, can
//! each find every tensor they consume already produced by a network input or
//! an earlier partition. The checks run in this order:
//!
//! 1. **Non-empty**: at least one partition
//! 2. **Uniqueness**: partition IDs are unique
//! 3. **Single producer**: no tensor is produced twice (network inputs count as producers)
//! 4. **Resolution**: every consumed tensor is produced earlier; a tensor produced
//!    only by a later partition is reported as a forward reference
//! 5. **Coverage**: every network output is produced by some partition
//!
//! All problems are collected, so a user sees the whole list at once.
//!
//! # Example
//! ```rust
//! use hetero_orchestrator::config::{validate_partitions, Config, ExecutorKind, PartitionConfig};
//! use hetero_orchestrator::errors::ValidationError;
//!
//! let config = Config {
//!     callback_executor: ExecutorKind::Immediate,
//!     wait_timeout_ms: None,
//!     iterations: None,
//!     inputs: vec!["x".to_string()],
//!     outputs: vec!["y".to_string()],
//!     partitions: vec![PartitionConfig {
//!         id: "only".to_string(),
//!         device: "CPU".to_string(),
//!         inputs: vec!["x".to_string()],
//!         outputs: vec!["z".to_string()],
//!         kernel: Default::default(),
//!         latency_ms: None,
//!         fail_with: None,
//!     }],
//! };
//!
//! let errors = validate_partitions(&config).unwrap_err();
//! assert_eq!(
//!     errors,
//!     vec![ValidationError::UnproducedOutput { tensor: "y".to_string() }]
//! );
//! ```

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::config::Config;
use crate::errors::ValidationError;
use crate::observability::messages::validation::{
    ValidationCompleted, ValidationFailed, ValidationProblem, ValidationStarted,
};
use crate::observability::messages::StructuredLog;

const NETWORK_INPUTS: &str = "<network inputs>";

/// Who produces a tensor: `None` for the network inputs, else the index of
/// the producing partition.
type Producers<'a> = HashMap<&'a str, (Option<usize>, &'a str)>;

/// Validate a configuration's partition layout.
///
/// # Returns
///
/// * `Ok(())` - Layout is executable in declaration order
/// * `Err(Vec<ValidationError>)` - Every problem found
pub fn validate_partitions(config: &Config) -> Result<(), Vec<ValidationError>> {
    ValidationStarted {
        partition_count: config.partitions.len(),
    }
    .log();

    let errors = collect_errors(config);

    if errors.is_empty() {
        ValidationCompleted {
            partition_count: config.partitions.len(),
        }
        .log();
        Ok(())
    } else {
        for error in &errors {
            ValidationProblem { error }.log();
        }
        ValidationFailed {
            error_count: errors.len(),
        }
        .log();
        Err(errors)
    }
}

fn collect_errors(config: &Config) -> Vec<ValidationError> {
    if config.partitions.is_empty() {
        return vec![ValidationError::EmptyPipeline];
    }

    let mut errors = validate_unique_partition_ids(config);
    let (producers, duplicate_outputs) = index_producers(config);
    errors.extend(duplicate_outputs);
    errors.extend(validate_input_resolution(config, &producers));
    errors.extend(validate_output_coverage(config, &producers));
    errors
}

fn validate_unique_partition_ids(config: &Config) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    config
        .partitions
        .iter()
        .filter(|partition| !seen.insert(partition.id.as_str()))
        .map(|partition| ValidationError::DuplicatePartitionId {
            partition_id: partition.id.clone(),
        })
        .collect()
}

/// Map every tensor to its first producer, reporting any second producer.
fn index_producers(config: &Config) -> (Producers<'_>, Vec<ValidationError>) {
    let mut producers: Producers<'_> = config
        .inputs
        .iter()
        .map(|name| (name.as_str(), (None, NETWORK_INPUTS)))
        .collect();
    let mut errors = Vec::new();

    for (index, partition) in config.partitions.iter().enumerate() {
        for tensor in &partition.outputs {
            match producers.entry(tensor.as_str()) {
                Entry::Occupied(first) => errors.push(ValidationError::OutputProducedTwice {
                    tensor: tensor.clone(),
                    first: first.get().1.to_string(),
                    second: partition.id.clone(),
                }),
                Entry::Vacant(slot) => {
                    slot.insert((Some(index), partition.id.as_str()));
                }
            }
        }
    }
    (producers, errors)
}

fn validate_input_resolution(config: &Config, producers: &Producers<'_>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (index, partition) in config.partitions.iter().enumerate() {
        for tensor in &partition.inputs {
            match producers.get(tensor.as_str()) {
                Some((None, _)) => {}
                Some((Some(producer), _)) if *producer < index => {}
                Some((Some(_), producer_id)) => errors.push(ValidationError::ForwardReference {
                    partition_id: partition.id.clone(),
                    tensor: tensor.clone(),
                    producer_id: producer_id.to_string(),
                }),
                None => errors.push(ValidationError::UnresolvedInput {
                    partition_id: partition.id.clone(),
                    tensor: tensor.clone(),
                }),
            }
        }
    }
    errors
}

fn validate_output_coverage(config: &Config, producers: &Producers<'_>) -> Vec<ValidationError> {
    config
        .outputs
        .iter()
        .filter(|tensor| !matches!(producers.get(tensor.as_str()), Some((Some(_), _))))
        .map(|tensor| ValidationError::UnproducedOutput {
            tensor: tensor.clone(),
        })
        .collect()
}
