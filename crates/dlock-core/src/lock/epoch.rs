//! Node epoch
//!
//! A timestamp fixed when the node starts. Clients remember it and send it with
//! every request; a different value means the node restarted and every grant the
//! client obtained from the previous run is void.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use dlock_common::{LockError, LockResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(DateTime<Utc>);

impl Epoch {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Reject a client epoch that does not belong to this node run
    pub fn validate(&self, client: &Epoch) -> LockResult<()> {
        if self != client {
            return Err(LockError::EpochMismatch {
                expected: self.to_string(),
                actual: client.to_string(),
            });
        }
        Ok(())
    }
}

impl Display for Epoch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }
}
