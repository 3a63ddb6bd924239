// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Partition collection and cross-partition data plumbing.
//!
//! A logical request is split into sub-networks, one per device. This module
//! holds them in partition order and keeps the blobs at partition boundaries
//! wired together: an intermediate tensor is one shared [`Blob`] bound into
//! both its producer and its consumers, and the network-level inputs and
//! outputs are re-bound whenever the caller swaps them out.

mod blob;
mod set;

pub use blob::{Blob, BlobMap};
pub use set::{PartitionSet, SubNetwork};
