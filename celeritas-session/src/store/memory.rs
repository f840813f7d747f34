use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use super::{Deadline, SessionRecord, SessionStore};
use crate::config::{StoreParams, StoreType};
use crate::error::StoreError;

/// How often a commit also sweeps every expired record.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// In-process map-backed store. Data lives as long as the process.
///
/// Expired records are dropped when a lookup hits them and by a sweep that
/// runs on commit at most once per [`SWEEP_INTERVAL`].
#[derive(Debug)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, SessionRecord>>,
    last_sweep: Mutex<Instant>,
    sweep_interval: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            last_sweep: Mutex::new(Instant::now()),
            sweep_interval: SWEEP_INTERVAL,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep_if_due(&self, records: &mut HashMap<String, SessionRecord>, now: DateTime<Utc>) {
        let Ok(mut last) = self.last_sweep.lock() else {
            return;
        };
        if last.elapsed() < self.sweep_interval {
            return;
        }
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        *last = Instant::now();
        tracing::debug!(evicted = before - records.len(), "swept expired sessions");
    }
}

pub(crate) fn connect(_params: &StoreParams) -> Result<Box<dyn SessionStore>, StoreError> {
    Ok(Box::new(MemoryStore::new()))
}

impl SessionStore for MemoryStore {
    fn kind(&self) -> StoreType {
        StoreType::Memory
    }

    fn find(
        &self,
        token: &str,
        _deadline: Option<Deadline>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let now = Utc::now();
        {
            let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
            match records.get(token) {
                None => return Ok(None),
                Some(record) if !record.is_expired(now) => return Ok(Some(record.clone())),
                Some(_) => {}
            }
        }
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        if records.get(token).is_some_and(|record| record.is_expired(now)) {
            records.remove(token);
        }
        Ok(None)
    }

    fn commit(&self, token: &str, record: &SessionRecord) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        if record.is_expired(now) {
            records.remove(token);
        } else {
            records.insert(token.to_string(), record.clone());
        }
        self.sweep_if_due(&mut records, now);
        Ok(())
    }

    fn delete(&self, token: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        records.remove(token);
        Ok(())
    }
}
