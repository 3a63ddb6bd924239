// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for cross-partition blob wiring.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Partitions were wired together at construction.
///
/// # Log Level
/// `debug!`
pub struct PartitionsWired {
    pub partition_count: usize,
    pub intermediate_count: usize,
}

impl Display for PartitionsWired {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Wired {} partitions with {} shared intermediate blobs",
            self.partition_count, self.intermediate_count
        )
    }
}

impl StructuredLog for PartitionsWired {
    fn log(&self) {
        tracing::debug!(
            partition_count = self.partition_count,
            intermediate_count = self.intermediate_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "partitions_wired",
            span_name = name,
            partition_count = self.partition_count,
            intermediate_count = self.intermediate_count,
        )
    }
}

/// Stale network-level blob bindings were replaced before a run.
///
/// # Log Level
/// `debug!`
pub struct BlobsRebound {
    pub count: usize,
}

impl Display for BlobsRebound {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Re-bound {} network input/output blobs", self.count)
    }
}

impl StructuredLog for BlobsRebound {
    fn log(&self) {
        tracing::debug!(count = self.count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("blobs_rebound", span_name = name, count = self.count)
    }
}
