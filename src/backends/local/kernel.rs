// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// Element-wise computation a local partition applies to its first input.
///
/// # Example
/// ```yaml
/// kernel:
///   kind: affine
///   scale: 2.0
///   bias: 0.5
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Kernel {
    #[default]
    Identity,
    Affine {
        scale: f32,
        #[serde(default)]
        bias: f32,
    },
    Relu,
}

impl Kernel {
    pub fn apply(&self, input: &[f32]) -> Vec<f32> {
        match *self {
            Kernel::Identity => input.to_vec(),
            Kernel::Affine { scale, bias } => input.iter().map(|x| x * scale + bias).collect(),
            Kernel::Relu => input.iter().map(|x| x.max(0.0)).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Identity => "identity",
            Kernel::Affine { .. } => "affine",
            Kernel::Relu => "relu",
        }
    }
}
