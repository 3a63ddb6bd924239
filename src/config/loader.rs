// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::local::Kernel;
use crate::config::consts::{DEFAULT_ITERATIONS, DEFAULT_WAIT_TIMEOUT_MS};
use crate::config::validate_partitions;
use crate::errors::{ConfigError, StatusCode};
use crate::traits::WaitMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure for a partitioned request.
///
/// Describes the network-level tensors and the ordered partitions the request
/// is split into. Partition order is execution order.
///
/// # Fields
/// * `callback_executor` - Where the user completion callback runs (optional, defaults to immediate)
/// * `wait_timeout_ms` - Per-iteration wait for the binary: negative blocks until ready, zero only polls (optional)
/// * `iterations` - How many times the binary runs the request (optional)
/// * `inputs` - Network input tensor names
/// * `outputs` - Network output tensor names
/// * `partitions` - Ordered partition definitions
///
/// # Example
/// ```yaml
/// callback_executor: tokio
/// wait_timeout_ms: 5000
/// inputs: [image]
/// outputs: [scores]
/// partitions:
///   - id: backbone
///     device: GPU.0
///     inputs: [image]
///     outputs: [features]
///     kernel: { kind: affine, scale: 0.5 }
///   - id: head
///     device: CPU
///     inputs: [features]
///     outputs: [scores]
///     kernel: { kind: relu }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub callback_executor: ExecutorKind,
    pub wait_timeout_ms: Option<i64>,
    pub iterations: Option<u32>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub partitions: Vec<PartitionConfig>,
}

impl Config {
    /// How one wait blocks, using the built-in default if not configured.
    pub fn wait_mode(&self) -> WaitMode {
        WaitMode::from_millis(self.wait_timeout_ms.unwrap_or(DEFAULT_WAIT_TIMEOUT_MS))
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.unwrap_or(DEFAULT_ITERATIONS)
    }
}

/// Executor the user completion callback is delivered on.
///
/// # Variants
/// * `Immediate` - Inline, on whichever thread finished the last stage
/// * `Tokio` - On the runtime's blocking pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    #[default]
    Immediate,
    Tokio,
}

/// Configuration for a single partition.
///
/// # Fields
/// * `id` - Unique identifier for this partition
/// * `device` - Device the partition's sub-request is bound to
/// * `inputs` - Tensors consumed (network inputs or outputs of earlier partitions)
/// * `outputs` - Tensors produced
/// * `kernel` - Computation the local device applies (defaults to identity)
/// * `latency_ms` - Simulated device latency (optional)
/// * `fail_with` - Outcome code every run reports instead of executing (optional)
///
/// # Example
/// ```yaml
/// id: head
/// device: MYRIAD
/// inputs: [features]
/// outputs: [scores]
/// latency_ms: 20
/// fail_with: out_of_bounds
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PartitionConfig {
    pub id: String,
    pub device: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub kernel: Kernel,
    pub latency_ms: Option<u64>,
    pub fail_with: Option<StatusCode>,
}

/// Load a config from a YAML file, or TOML when the extension is `.toml`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg: Config = if is_toml {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(cfg)
}

/// Load a config and validate its partition layout.
///
/// All layout problems are reported together in [`ConfigError::Invalid`].
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    validate_partitions(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}
