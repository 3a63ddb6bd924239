// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Device backends that execute one partition of a request.
//!
//! Every backend implements [`SubRequest`](crate::traits::SubRequest) and
//! [`BlobBinding`](crate::traits::BlobBinding). The engine only ever talks to
//! those traits, so a backend is free to fire its completion handler from any
//! thread it owns.
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process "devices" that apply a small element-wise [`Kernel`](local::Kernel):
//! - **Execution**: on a tokio runtime's blocking pool
//! - **Fault injection**: configurable latency and a forced outcome code
//! - **Use Case**: demos, integration tests, exercising the orchestrator end to end
//!
//! ## Stub Backend (Test-Only)
//! Scripted sub-requests for engine tests (only available in test builds):
//! - **StubRequest**: fixed outcome code, call counters, start-order log
//! - **StubGate**: holds a run in flight until released
//! - **Note**: NOT available in production builds
//!
//! # Architecture
//!
//! ```text
//! PartitionConfig → LocalRequestFactory → LocalRequest → SubNetwork → Orchestrator
//! ```
//!
//! # Example
//!
//! ```rust
//! use hetero_orchestrator::backends::local::{Kernel, LocalRequest};
//! use hetero_orchestrator::traits::SubRequest;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let request = LocalRequest::new(
//!     "GPU.0",
//!     Kernel::Relu,
//!     vec!["x".to_string()],
//!     vec!["y".to_string()],
//!     runtime.handle().clone(),
//! );
//!
//! assert_eq!(request.device(), "GPU.0");
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;
