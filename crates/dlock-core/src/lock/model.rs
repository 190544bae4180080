//! Lock table data model
//!
//! The table maps a resource name to its holders. After every handler call a
//! name is either absent, held by exactly one writer, or held by one or more
//! readers; an empty holder list is never stored.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::epoch::Epoch;

/// Request envelope shared by every lock RPC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockArgs {
    /// Resource name the lock applies to
    pub resource_name: String,
    /// Address of the node that requested the lock
    #[serde(default)]
    pub requester_node: String,
    /// Route on the requester used for liveness callbacks
    #[serde(default)]
    pub callback_path: String,
    /// Token unique to one acquisition attempt; the unit of release
    #[serde(default)]
    pub request_id: String,
    /// Epoch of this node as last observed by the caller
    pub epoch: Epoch,
}

impl LockArgs {
    pub fn new(resource_name: impl Into<String>, request_id: impl Into<String>, epoch: Epoch) -> Self {
        Self {
            resource_name: resource_name.into(),
            requester_node: String::new(),
            callback_path: String::new(),
            request_id: request_id.into(),
            epoch,
        }
    }

    /// Set the requester address and callback route
    pub fn with_requester(mut self, node: impl Into<String>, callback_path: impl Into<String>) -> Self {
        self.requester_node = node.into();
        self.callback_path = callback_path.into();
        self
    }
}

/// One granted claim on a resource name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockHolder {
    pub writer: bool,
    pub requester_node: String,
    pub callback_path: String,
    pub request_id: String,
    pub acquired_at: DateTime<Utc>,
    /// Only touched by lock maintenance
    pub last_checked_at: DateTime<Utc>,
}

impl LockHolder {
    fn from_args(args: &LockArgs, writer: bool) -> Self {
        let now = Utc::now();
        Self {
            writer,
            requester_node: args.requester_node.clone(),
            callback_path: args.callback_path.clone(),
            request_id: args.request_id.clone(),
            acquired_at: now,
            last_checked_at: now,
        }
    }

    pub fn writer(args: &LockArgs) -> Self {
        Self::from_args(args, true)
    }

    pub fn reader(args: &LockArgs) -> Self {
        Self::from_args(args, false)
    }
}

/// How a present resource name is held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeldState {
    Write,
    Read(usize),
}

/// A holder selected by lock maintenance for a liveness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongLivedLock {
    pub name: String,
    pub holder: LockHolder,
}

/// Point-in-time counts of the lock table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockStats {
    /// Resource names currently held
    pub resources: usize,
    /// Names held by a writer
    pub write_locks: usize,
    /// Reader holders across all names
    pub read_locks: usize,
}

/// In-memory table of resource name to holders
#[derive(Debug, Default)]
pub struct LockTable {
    entries: HashMap<String, Vec<LockHolder>>,
}

fn is_write_lock(holders: &[LockHolder]) -> bool {
    holders.len() == 1 && holders[0].writer
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn holders(&self, name: &str) -> Option<&[LockHolder]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn state(&self, name: &str) -> Option<HeldState> {
        self.entries.get(name).map(|holders| {
            if is_write_lock(holders) {
                HeldState::Write
            } else {
                HeldState::Read(holders.len())
            }
        })
    }

    pub fn contains_holder(&self, name: &str, request_id: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|holders| holders.iter().any(|h| h.request_id == request_id))
    }

    /// Claim a write lock; only succeeds when nothing holds `name`
    pub(crate) fn insert_writer(&mut self, name: &str, holder: LockHolder) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name.to_string(), vec![holder]);
        true
    }

    /// Claim a read lock; fails under a writer or when the request id already reads `name`
    pub(crate) fn insert_reader(&mut self, name: &str, holder: LockHolder) -> bool {
        match self.entries.get_mut(name) {
            Some(holders) => {
                if is_write_lock(holders) || holders.iter().any(|h| h.request_id == holder.request_id) {
                    return false;
                }
                holders.push(holder);
                true
            }
            None => {
                self.entries.insert(name.to_string(), vec![holder]);
                true
            }
        }
    }

    /// Remove the holder with `request_id`, dropping the entry when it was the last one.
    ///
    /// Returns `false` when no holder on `name` carries that id.
    pub(crate) fn remove_holder(&mut self, name: &str, request_id: &str) -> bool {
        let Some(holders) = self.entries.get_mut(name) else {
            return false;
        };
        let Some(index) = holders.iter().position(|h| h.request_id == request_id) else {
            return false;
        };
        if holders.len() == 1 {
            self.entries.remove(name);
        } else {
            holders.remove(index);
        }
        true
    }

    /// Drop every holder of `name`, returning whether an entry existed
    pub(crate) fn remove_entry(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Select holders not checked for at least `interval` and stamp them as checked at `now`
    pub(crate) fn take_long_lived(&mut self, interval: Duration, now: DateTime<Utc>) -> Vec<LongLivedLock> {
        let interval = TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX);
        let mut selected = Vec::new();

        for (name, holders) in self.entries.iter_mut() {
            for holder in holders.iter_mut() {
                if now.signed_duration_since(holder.last_checked_at) >= interval {
                    holder.last_checked_at = now;
                    selected.push(LongLivedLock {
                        name: name.clone(),
                        holder: holder.clone(),
                    });
                }
            }
        }

        selected
    }

    pub fn stats(&self) -> LockStats {
        let mut stats = LockStats {
            resources: self.entries.len(),
            ..Default::default()
        };
        for holders in self.entries.values() {
            if is_write_lock(holders) {
                stats.write_locks += 1;
            } else {
                stats.read_locks += holders.len();
            }
        }
        stats
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        for (name, holders) in &self.entries {
            assert!(!holders.is_empty(), "empty holder list stored for {}", name);
            if holders.iter().any(|h| h.writer) {
                assert_eq!(holders.len(), 1, "writer shares {} with other holders", name);
            }
            let mut ids: Vec<&str> = holders.iter().map(|h| h.request_id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), holders.len(), "duplicate request id on {}", name);
        }
    }
}
