//! HTTP response types for the dlock server
//!
//! Every lock RPC answers with the same `{code, message, data}` envelope.

use actix_web::{HttpResponse, HttpResponseBuilder, http::StatusCode};
use serde::{Deserialize, Serialize};

use dlock_common::{LockError, error::SUCCESS};

/// Generic result wrapper for API responses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Result<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T> Result<T> {
    pub fn new(code: i32, message: String, data: T) -> Self {
        Result::<T> {
            code,
            message,
            data,
        }
    }

    pub fn success(data: T) -> Result<T> {
        Result::<T> {
            code: SUCCESS.code,
            message: SUCCESS.message.to_string(),
            data,
        }
    }

    pub fn http_success(data: impl Serialize) -> HttpResponse {
        HttpResponse::Ok().json(Result::success(data))
    }

    pub fn http_response(
        status: u16,
        code: i32,
        message: String,
        data: impl Serialize,
    ) -> HttpResponse {
        HttpResponseBuilder::new(StatusCode::from_u16(status).unwrap_or_default())
            .json(Result::new(code, message, data))
    }
}

/// HTTP status used for a handler failure
pub fn error_status(err: &LockError) -> StatusCode {
    match err {
        LockError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        LockError::NotLocked(_) | LockError::RequestIdNotFound { .. } => StatusCode::NOT_FOUND,
        LockError::EpochMismatch { .. }
        | LockError::NotWriteLocked { .. }
        | LockError::WriteLocked(_) => StatusCode::CONFLICT,
    }
}

/// Render a handler failure with its error code and message
pub fn error_response(err: &LockError) -> HttpResponse {
    Result::<()>::http_response(
        error_status(err).as_u16(),
        err.code().code,
        err.to_string(),
        (),
    )
}
