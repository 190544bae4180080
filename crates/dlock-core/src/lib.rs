//! dlock Core - single node of a quorum lock service
//!
//! This crate provides:
//! - The in-memory lock table and its request handlers
//! - Epoch validation against node restarts
//! - Lock maintenance that reaps holders whose requester no longer knows them
//! - Metrics for lock activity

pub mod lock;
pub mod metrics;

// Re-export lock types
pub use lock::{
    DiagnosticEvent, Epoch, HeldState, HttpLivenessVerifier, HttpVerifierConfig, LivenessVerifier,
    LockArgs, LockHolder, LockMaintenance, LockObserver, LockServer, LockStats, LongLivedLock,
    MaintenanceReport, ProbeOutcome, TracingObserver,
};
