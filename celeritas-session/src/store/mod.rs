//! Session store capability and backend registry.
//!
//! Every backend implements [`SessionStore`]. Selection is a table lookup
//! from [`StoreType`] to a connector function; a type without a row resolves
//! to the memory connector. Adding a backend means adding a module and a row.

mod memory;
mod mysql_store;
mod pg_store;
mod redis_store;

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{StoreParams, StoreType};
use crate::error::StoreError;

pub use memory::MemoryStore;

/// Upper bound on pooled connections per external store.
pub(crate) const POOL_SIZE: u32 = 16;

// ---------------------------------------------------------------------------
// Records and deadlines
// ---------------------------------------------------------------------------

/// One visitor's session payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Absolute expiry; a record past its deadline is never returned.
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

impl SessionRecord {
    pub fn new(deadline: DateTime<Utc>) -> Self {
        Self {
            deadline,
            values: BTreeMap::new(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Request-scoped deadline, carried as an `http::Request` extension and
/// honoured by store lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(pub Instant);

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    /// Time left, or `None` once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.0
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
    }
}

/// Resolve an optional deadline into the time budget for one store call.
pub(crate) fn time_budget(deadline: Option<Deadline>) -> Result<Option<Duration>, StoreError> {
    match deadline {
        None => Ok(None),
        Some(d) => d.remaining().map(Some).ok_or(StoreError::DeadlineExceeded),
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// A session backing store. Implementations own their own concurrency
/// control and are shared across request threads.
pub trait SessionStore: Send + Sync + fmt::Debug {
    fn kind(&self) -> StoreType;

    /// Fetch the live record for `token`, if any.
    fn find(
        &self,
        token: &str,
        deadline: Option<Deadline>,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Insert or replace the record for `token`.
    fn commit(&self, token: &str, record: &SessionRecord) -> Result<(), StoreError>;

    fn delete(&self, token: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Builds a connected store from its parameters.
pub type Connector = fn(&StoreParams) -> Result<Box<dyn SessionStore>, StoreError>;

const CONNECTORS: &[(StoreType, Connector)] = &[
    (StoreType::Memory, memory::connect as Connector),
    (StoreType::Redis, redis_store::connect as Connector),
    (StoreType::Mysql, mysql_store::connect as Connector),
    (StoreType::Postgres, pg_store::connect as Connector),
];

/// Look up the connector registered for `kind`, defaulting to memory.
pub fn connector_for(kind: StoreType) -> Connector {
    CONNECTORS
        .iter()
        .find(|(registered, _)| *registered == kind)
        .map(|(_, connect)| *connect)
        .unwrap_or(memory::connect)
}
