//! Lock server request handlers
//!
//! `LockServer` owns the node's lock table and epoch. Every handler validates
//! the caller's epoch first, then performs exactly one table operation under
//! the table mutex. No I/O happens while the mutex is held.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;

use dlock_common::{LockError, LockResult};

use super::diagnostics::{DiagnosticEvent, LockObserver, TracingObserver};
use super::epoch::Epoch;
use super::model::{HeldState, LockArgs, LockHolder, LockStats, LockTable, LongLivedLock};
use crate::metrics;

pub struct LockServer {
    epoch: Epoch,
    table: Mutex<LockTable>,
    observer: Arc<dyn LockObserver>,
}

impl Default for LockServer {
    fn default() -> Self {
        Self::new()
    }
}

impl LockServer {
    /// Create a lock server with a fresh epoch
    pub fn new() -> Self {
        Self::with_epoch(Epoch::now())
    }

    pub fn with_epoch(epoch: Epoch) -> Self {
        Self {
            epoch,
            table: Mutex::new(LockTable::new()),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the diagnostics observer
    pub fn with_observer(mut self, observer: Arc<dyn LockObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Acquire a write lock. Denial is immediate; callers retry.
    pub fn lock(&self, args: &LockArgs) -> LockResult<bool> {
        self.epoch.validate(&args.epoch)?;

        let granted = self
            .table
            .lock()
            .insert_writer(&args.resource_name, LockHolder::writer(args));

        debug!(name = %args.resource_name, request_id = %args.request_id, granted, "Write lock requested");
        metrics::record_request("lock", granted);
        Ok(granted)
    }

    /// Release the write lock held by `args.request_id`
    pub fn unlock(&self, args: &LockArgs) -> LockResult<bool> {
        self.epoch.validate(&args.epoch)?;

        let result = {
            let mut table = self.table.lock();
            match table.state(&args.resource_name) {
                None => Err(LockError::NotLocked(args.resource_name.clone())),
                Some(HeldState::Read(readers)) => Err(LockError::NotWriteLocked {
                    name: args.resource_name.clone(),
                    readers,
                }),
                Some(HeldState::Write) => {
                    Self::remove_or_not_found(&mut table, &args.resource_name, &args.request_id)
                }
            }
        };

        metrics::record_request("unlock", result.is_ok());
        result
    }

    /// Acquire a read lock
    pub fn rlock(&self, args: &LockArgs) -> LockResult<bool> {
        self.epoch.validate(&args.epoch)?;

        let granted = self
            .table
            .lock()
            .insert_reader(&args.resource_name, LockHolder::reader(args));

        debug!(name = %args.resource_name, request_id = %args.request_id, granted, "Read lock requested");
        metrics::record_request("rlock", granted);
        Ok(granted)
    }

    /// Release the read lock held by `args.request_id`
    pub fn runlock(&self, args: &LockArgs) -> LockResult<bool> {
        self.epoch.validate(&args.epoch)?;

        let result = {
            let mut table = self.table.lock();
            match table.state(&args.resource_name) {
                None => Err(LockError::NotLocked(args.resource_name.clone())),
                Some(HeldState::Write) => Err(LockError::WriteLocked(args.resource_name.clone())),
                Some(HeldState::Read(_)) => {
                    Self::remove_or_not_found(&mut table, &args.resource_name, &args.request_id)
                }
            }
        };

        metrics::record_request("runlock", result.is_ok());
        result
    }

    /// Clear every holder of a name. Only an empty request id is accepted.
    pub fn force_unlock(&self, args: &LockArgs) -> LockResult<bool> {
        self.epoch.validate(&args.epoch)?;

        if !args.request_id.is_empty() {
            return Err(LockError::InvalidArgument(format!(
                "force unlock called with non-empty request id: {}",
                args.request_id
            )));
        }

        let removed = self.table.lock().remove_entry(&args.resource_name);
        if removed {
            debug!(name = %args.resource_name, "Lock forcibly cleared");
        }
        metrics::record_request("force_unlock", true);
        Ok(true)
    }

    /// Whether `args.request_id` no longer holds `args.resource_name` on this node
    pub fn expired(&self, args: &LockArgs) -> LockResult<bool> {
        self.epoch.validate(&args.epoch)?;

        let live = self
            .table
            .lock()
            .contains_holder(&args.resource_name, &args.request_id);
        Ok(!live)
    }

    pub fn stats(&self) -> LockStats {
        self.table.lock().stats()
    }

    /// Holders currently stored under `name`
    pub fn holders(&self, name: &str) -> Vec<LockHolder> {
        self.table
            .lock()
            .holders(name)
            .map(<[LockHolder]>::to_vec)
            .unwrap_or_default()
    }

    /// Select holders unchecked for at least `interval`, marking them checked now
    pub fn take_long_lived(&self, interval: Duration) -> Vec<LongLivedLock> {
        self.table.lock().take_long_lived(interval, Utc::now())
    }

    /// Remove a confirmed-stale holder if it is still present.
    ///
    /// The holder may have been released by a regular unlock since it was
    /// selected. That is expected for readers; for a writer under a
    /// still-present entry it is reported to the observer.
    pub fn remove_if_present(&self, stale: &LongLivedLock) -> bool {
        let missed = {
            let mut table = self.table.lock();
            let Some(holders) = table.holders(&stale.name) else {
                return false;
            };
            let remaining_holders = holders.len();
            if table.remove_holder(&stale.name, &stale.holder.request_id) {
                return true;
            }
            remaining_holders
        };

        if stale.holder.writer {
            self.observer.on_event(&DiagnosticEvent::WriterReapMissed {
                name: stale.name.clone(),
                request_id: stale.holder.request_id.clone(),
                remaining_holders: missed,
            });
        } else {
            debug!(
                name = %stale.name,
                request_id = %stale.holder.request_id,
                "Stale read lock already released"
            );
        }
        false
    }

    fn remove_or_not_found(table: &mut LockTable, name: &str, request_id: &str) -> LockResult<bool> {
        if !table.remove_holder(name, request_id) {
            return Err(LockError::RequestIdNotFound {
                name: name.to_string(),
                request_id: request_id.to_string(),
            });
        }
        Ok(true)
    }
}
