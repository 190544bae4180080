//! Node-local read/write lock table
//!
//! This module provides:
//! - Lock table data model and invariants
//! - Epoch guard
//! - Request handlers (lock, unlock, rlock, runlock, force unlock, expired)
//! - Lock maintenance with outbound liveness probes
//! - Diagnostics for internal consistency violations

mod diagnostics;
mod epoch;
mod maintenance;
mod model;
mod service;
mod verifier;

pub use diagnostics::*;
pub use epoch::*;
pub use maintenance::*;
pub use model::*;
pub use service::*;
pub use verifier::*;
