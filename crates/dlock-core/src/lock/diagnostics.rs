//! Internal consistency diagnostics raised by lock maintenance

use tracing::warn;

/// Conditions that have no caller to report to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// A confirmed-stale writer could not be found under a still-present entry.
    ///
    /// A writer always leaves as a whole entry, so this points at a broken
    /// single-writer invariant.
    WriterReapMissed {
        name: String,
        request_id: String,
        remaining_holders: usize,
    },
}

/// Receives diagnostic events from the lock server
pub trait LockObserver: Send + Sync {
    fn on_event(&self, event: &DiagnosticEvent);
}

/// Default observer that writes events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LockObserver for TracingObserver {
    fn on_event(&self, event: &DiagnosticEvent) {
        match event {
            DiagnosticEvent::WriterReapMissed {
                name,
                request_id,
                remaining_holders,
            } => {
                warn!(
                    name = %name,
                    request_id = %request_id,
                    remaining_holders = *remaining_holders,
                    "Lock maintenance failed to remove entry for write lock"
                );
            }
        }
    }
}
