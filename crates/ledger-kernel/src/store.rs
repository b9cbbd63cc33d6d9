//! Keyed record storage
//!
//! The store is never consulted by the batch processor. The environment
//! resolves references into handles before a batch and commits handles after.

use crate::batch::RecordHandle;
use crate::error::{BatchError, InitError};
use crate::types::{Record, RecordKey, RecordRef};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Every record, by key
#[derive(Debug, Default)]
pub struct RecordStore {
    records: HashMap<RecordKey, Record>,
}

impl RecordStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no record exists
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `key`
    pub fn get(&self, key: RecordKey) -> Option<&Record> {
        self.records.get(&key)
    }

    /// Insert a record at a key that must not exist yet
    pub(crate) fn insert_new(&mut self, record: Record) -> Result<(), InitError> {
        match self.records.entry(record.key) {
            Entry::Occupied(_) => Err(InitError::DuplicateRecord { key: record.key }),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// Resolve references into working copies, one handle per position.
    ///
    /// A key referenced twice yields two independent handles; rejecting that
    /// is the processor's job.
    pub fn resolve(&self, refs: &[RecordRef]) -> Result<Vec<RecordHandle>, BatchError> {
        refs.iter()
            .enumerate()
            .map(|(index, r)| {
                self.records
                    .get(&r.key)
                    .map(|record| RecordHandle::new(record.clone(), r.writable))
                    .ok_or(BatchError::UnknownRecord { index, key: r.key })
            })
            .collect()
    }

    /// Write every handle's value back. Callers hold exclusive access, so
    /// each key was resolved from this store and still exists.
    pub fn commit(&mut self, handles: Vec<RecordHandle>) {
        for handle in handles {
            let record = handle.into_record();
            if let Some(slot) = self.records.get_mut(&record.key) {
                slot.value = record.value;
            }
        }
    }
}
