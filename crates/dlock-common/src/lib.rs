//! dlock Common - Shared types and constants
//!
//! This crate provides the foundational types used across all dlock components:
//! - Lock error enum and error codes
//! - Route and protocol constants

pub mod error;

// Re-exports for convenience
pub use error::{ErrorCode, LockError, LockResult};

/// Route prefix for the lock RPC surface
pub const API_PREFIX: &str = "/dlock/v1";

/// Default HTTP port of a lock node
pub const DEFAULT_SERVER_PORT: u16 = 9090;
