//! # Value Store
//!
//! Holds the most recent reading of every metric together with the time it
//! was received. The decode pipeline is the only writer; output adapters
//! read owned [`ValueSnapshot`]s, possibly from another task, so a reading
//! and its timestamp are always seen together.

use crate::pps::decode::{MetricId, Reading};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// A reading and the time it was stored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredValue {
    pub reading: Reading,
    pub updated_at: DateTime<Utc>,
}

/// Copy of the store contents at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSnapshot {
    entries: BTreeMap<MetricId, StoredValue>,
}

impl ValueSnapshot {
    pub fn get(&self, metric: MetricId) -> Option<&StoredValue> {
        self.entries.get(&metric)
    }

    pub fn contains(&self, metric: MetricId) -> bool {
        self.entries.contains_key(&metric)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetricId, &StoredValue)> {
        self.entries.iter()
    }

    /// Raw field of a metric, if known
    pub fn raw(&self, metric: MetricId) -> Option<i32> {
        self.get(metric).map(|v| v.reading.raw)
    }
}

/// Latest value per metric, shared between the pipeline and its readers
#[derive(Debug, Default)]
pub struct ValueStore {
    inner: RwLock<ValueSnapshot>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a reading, replacing the previous value of its metric
    pub fn update(&self, reading: Reading) {
        self.update_at(reading, Utc::now());
    }

    /// Store a reading with an explicit timestamp
    pub fn update_at(&self, reading: Reading, updated_at: DateTime<Utc>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard
            .entries
            .insert(reading.metric, StoredValue { reading, updated_at });
    }

    /// Owned copy of the current contents
    pub fn snapshot(&self) -> ValueSnapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, metric: MetricId) -> Option<StoredValue> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(metric)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
