// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution engine for partitioned requests.
//!
//! A request split across devices runs as a [`Pipeline`] of stages, one per
//! partition. Each stage pairs a [`SubRequestAdapter`], which starts the
//! partition's sub-request and resumes the pipeline from the backend's
//! completion handler, with a [`StageValidator`], which turns the outcome
//! code into a typed failure. [`AsyncRequestCore`] drives the stages and owns
//! the start/wait/callback contract; [`Orchestrator`] adds blob
//! synchronisation on start and the drain on failure.
//!
//! ```text
//! start -> sync blobs -> adapter[0] -> (device) -> validator[0]
//!                     -> adapter[1] -> (device) -> validator[1]
//!                     -> ...                    -> user callback -> waiters
//! ```

pub mod adapter;
pub mod async_request;
pub mod executors;
pub mod orchestrator;
pub mod pipeline;
pub mod validator;

pub use adapter::SubRequestAdapter;
pub use async_request::{AsyncRequestCore, RequestState, UserCallback};
pub use executors::{ImmediateExecutor, TokioExecutor};
pub use orchestrator::Orchestrator;
pub use pipeline::{Pipeline, PipelineAssembler, Stage, StageTask};
pub use validator::StageValidator;
