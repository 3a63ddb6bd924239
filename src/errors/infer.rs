// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Backend outcome codes and the failure kinds they map to.
//!
//! Every backend reports the outcome of a finished sub-request as a
//! [`StatusCode`]. The orchestrator never inspects the codes itself; a stage
//! validator turns a non-OK code into an [`InferError`] through
//! [`StatusCode::into_result`], which is the one fixed code-to-kind table shared
//! with every backend. Adding a code means adding both a `StatusCode` variant
//! and the `InferError` variant of the same name.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome code reported by a backend sub-request.
///
/// The raw values are part of the backend contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    Ok,
    GeneralError,
    NotImplemented,
    NetworkNotLoaded,
    ParameterMismatch,
    NotFound,
    OutOfBounds,
    Unexpected,
    RequestBusy,
    ResultNotReady,
    NotAllocated,
    InferNotStarted,
    NetworkNotRead,
    InferCancelled,
    /// A code outside the enumerated set.
    Unknown(i32),
}

impl StatusCode {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => StatusCode::Ok,
            -1 => StatusCode::GeneralError,
            -2 => StatusCode::NotImplemented,
            -3 => StatusCode::NetworkNotLoaded,
            -4 => StatusCode::ParameterMismatch,
            -5 => StatusCode::NotFound,
            -6 => StatusCode::OutOfBounds,
            -7 => StatusCode::Unexpected,
            -8 => StatusCode::RequestBusy,
            -9 => StatusCode::ResultNotReady,
            -10 => StatusCode::NotAllocated,
            -11 => StatusCode::InferNotStarted,
            -12 => StatusCode::NetworkNotRead,
            -13 => StatusCode::InferCancelled,
            other => StatusCode::Unknown(other),
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            StatusCode::Ok => 0,
            StatusCode::GeneralError => -1,
            StatusCode::NotImplemented => -2,
            StatusCode::NetworkNotLoaded => -3,
            StatusCode::ParameterMismatch => -4,
            StatusCode::NotFound => -5,
            StatusCode::OutOfBounds => -6,
            StatusCode::Unexpected => -7,
            StatusCode::RequestBusy => -8,
            StatusCode::ResultNotReady => -9,
            StatusCode::NotAllocated => -10,
            StatusCode::InferNotStarted => -11,
            StatusCode::NetworkNotRead => -12,
            StatusCode::InferCancelled => -13,
            StatusCode::Unknown(raw) => raw,
        }
    }

    pub fn is_ok(self) -> bool {
        self == StatusCode::Ok
    }

    /// Map this code to its failure kind.
    ///
    /// `Ok` yields `Ok(())`. Every enumerated code yields the `InferError`
    /// variant of the same name; codes outside the table yield
    /// [`InferError::Unspecified`]. `context` becomes the error message.
    pub fn into_result(self, context: impl Into<String>) -> Result<(), InferError> {
        let message = context.into();
        let error = match self {
            StatusCode::Ok => return Ok(()),
            StatusCode::GeneralError => InferError::GeneralError(message),
            StatusCode::NotImplemented => InferError::NotImplemented(message),
            StatusCode::NetworkNotLoaded => InferError::NetworkNotLoaded(message),
            StatusCode::ParameterMismatch => InferError::ParameterMismatch(message),
            StatusCode::NotFound => InferError::NotFound(message),
            StatusCode::OutOfBounds => InferError::OutOfBounds(message),
            StatusCode::Unexpected => InferError::Unexpected(message),
            StatusCode::RequestBusy => InferError::RequestBusy(message),
            StatusCode::ResultNotReady => InferError::ResultNotReady(message),
            StatusCode::NotAllocated => InferError::NotAllocated(message),
            StatusCode::InferNotStarted => InferError::InferNotStarted(message),
            StatusCode::NetworkNotRead => InferError::NetworkNotRead(message),
            StatusCode::InferCancelled => InferError::InferCancelled(message),
            StatusCode::Unknown(code) => InferError::Unspecified { code, message },
        };
        Err(error)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusCode::Unknown(raw) => write!(f, "UNKNOWN({})", raw),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Failure raised by a request, one kind per non-OK [`StatusCode`].
///
/// Errors are `Clone` because a terminal failure is replayed to every waiter
/// and to every later `wait` on the same run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferError {
    #[error("[ GENERAL_ERROR ] {0}")]
    GeneralError(String),

    #[error("[ NOT_IMPLEMENTED ] {0}")]
    NotImplemented(String),

    #[error("[ NETWORK_NOT_LOADED ] {0}")]
    NetworkNotLoaded(String),

    #[error("[ PARAMETER_MISMATCH ] {0}")]
    ParameterMismatch(String),

    #[error("[ NOT_FOUND ] {0}")]
    NotFound(String),

    #[error("[ OUT_OF_BOUNDS ] {0}")]
    OutOfBounds(String),

    #[error("[ UNEXPECTED ] {0}")]
    Unexpected(String),

    #[error("[ REQUEST_BUSY ] {0}")]
    RequestBusy(String),

    #[error("[ RESULT_NOT_READY ] {0}")]
    ResultNotReady(String),

    #[error("[ NOT_ALLOCATED ] {0}")]
    NotAllocated(String),

    #[error("[ INFER_NOT_STARTED ] {0}")]
    InferNotStarted(String),

    #[error("[ NETWORK_NOT_READ ] {0}")]
    NetworkNotRead(String),

    #[error("[ INFER_CANCELLED ] {0}")]
    InferCancelled(String),

    /// Backend failure with a code outside the enumerated set.
    #[error("[ UNSPECIFIED({code}) ] {message}")]
    Unspecified { code: i32, message: String },
}

impl InferError {
    /// The outcome code this failure kind corresponds to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            InferError::GeneralError(_) => StatusCode::GeneralError,
            InferError::NotImplemented(_) => StatusCode::NotImplemented,
            InferError::NetworkNotLoaded(_) => StatusCode::NetworkNotLoaded,
            InferError::ParameterMismatch(_) => StatusCode::ParameterMismatch,
            InferError::NotFound(_) => StatusCode::NotFound,
            InferError::OutOfBounds(_) => StatusCode::OutOfBounds,
            InferError::Unexpected(_) => StatusCode::Unexpected,
            InferError::RequestBusy(_) => StatusCode::RequestBusy,
            InferError::ResultNotReady(_) => StatusCode::ResultNotReady,
            InferError::NotAllocated(_) => StatusCode::NotAllocated,
            InferError::InferNotStarted(_) => StatusCode::InferNotStarted,
            InferError::NetworkNotRead(_) => StatusCode::NetworkNotRead,
            InferError::InferCancelled(_) => StatusCode::InferCancelled,
            InferError::Unspecified { code, .. } => StatusCode::Unknown(*code),
        }
    }
}
