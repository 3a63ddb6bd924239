// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors that can occur during partition layout validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The configuration declares no partitions at all
    #[error("Pipeline has no partitions")]
    EmptyPipeline,

    /// Two partitions share an ID
    #[error("Duplicate partition ID: '{partition_id}'")]
    DuplicatePartitionId { partition_id: String },

    /// A partition consumes a tensor that nothing produces
    #[error("Partition '{partition_id}' consumes '{tensor}' which is neither a network input nor produced by an earlier partition")]
    UnresolvedInput {
        partition_id: String,
        tensor: String,
    },

    /// A partition consumes a tensor produced by a partition later in the order
    #[error("Partition '{partition_id}' consumes '{tensor}' which is produced later by '{producer_id}'")]
    ForwardReference {
        partition_id: String,
        tensor: String,
        producer_id: String,
    },

    /// Two partitions (or a partition and the network inputs) produce the same tensor
    #[error("Tensor '{tensor}' is produced by both '{first}' and '{second}'")]
    OutputProducedTwice {
        tensor: String,
        first: String,
        second: String,
    },

    /// A declared network output is never produced
    #[error("Network output '{tensor}' is not produced by any partition")]
    UnproducedOutput { tensor: String },
}

/// Errors raised while loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration validation failed:\n{}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
