//! Error types and error codes for dlock
//!
//! This module defines:
//! - `LockError`: failures surfaced by the lock request handlers
//! - `ErrorCode`: structured error codes for API responses

use serde::{Deserialize, Serialize};

/// Result alias used by the lock request handlers
pub type LockResult<T> = std::result::Result<T, LockError>;

/// Failures returned synchronously by the lock request handlers
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The caller's remembered epoch is not the epoch of this node run
    #[error("epoch mismatch (server may have restarted): expected {expected}, got {actual}")]
    EpochMismatch { expected: String, actual: String },

    #[error("unlock attempted on an unlocked resource: {0}")]
    NotLocked(String),

    #[error("unlock attempted on a read locked resource: {name} ({readers} read locks active)")]
    NotWriteLocked { name: String, readers: usize },

    #[error("read unlock attempted on a write locked resource: {0}")]
    WriteLocked(String),

    #[error("no lock held on {name} for request id: {request_id}")]
    RequestIdNotFound { name: String, request_id: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl LockError {
    /// Structured error code for this failure
    pub fn code(&self) -> ErrorCode<'static> {
        match self {
            LockError::EpochMismatch { .. } => EPOCH_MISMATCH,
            LockError::NotLocked(_) => NOT_LOCKED,
            LockError::NotWriteLocked { .. } => NOT_WRITE_LOCKED,
            LockError::WriteLocked(_) => WRITE_LOCKED,
            LockError::RequestIdNotFound { .. } => REQUEST_ID_NOT_FOUND,
            LockError::InvalidArgument(_) => INVALID_ARGUMENT,
        }
    }
}

/// Error code structure for API responses
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const INVALID_ARGUMENT: ErrorCode<'static> = ErrorCode {
    code: 20001,
    message: "invalid argument",
};

pub const EPOCH_MISMATCH: ErrorCode<'static> = ErrorCode {
    code: 30001,
    message: "epoch mismatch",
};

pub const NOT_LOCKED: ErrorCode<'static> = ErrorCode {
    code: 30002,
    message: "resource not locked",
};

pub const NOT_WRITE_LOCKED: ErrorCode<'static> = ErrorCode {
    code: 30003,
    message: "resource not write locked",
};

pub const WRITE_LOCKED: ErrorCode<'static> = ErrorCode {
    code: 30004,
    message: "resource write locked",
};

pub const REQUEST_ID_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 30005,
    message: "request id not found",
};
