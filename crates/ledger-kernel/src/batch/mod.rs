//! Batch pairing and execution
//!
//! Operations and record handles arrive as two positional sequences. They are
//! zipped into [`BatchEntry`] values once, at the boundary, and every later
//! step works on the pairs.

mod processor;

pub use processor::BatchProcessor;

use crate::error::BatchError;
use crate::operation::Operation;
use crate::types::{Authority, BatchId, Record, RecordKey};
use serde::{Deserialize, Serialize};

/// Resolved, exclusively held working copy of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHandle {
    record: Record,
    writable: bool,
}

impl RecordHandle {
    /// Wrap a resolved record
    pub fn new(record: Record, writable: bool) -> Self {
        Self { record, writable }
    }

    /// Key of the underlying record
    pub fn key(&self) -> RecordKey {
        self.record.key
    }

    /// Current working value
    pub fn value(&self) -> u64 {
        self.record.value
    }

    /// Creator of the record
    pub fn authority(&self) -> Authority {
        self.record.authority
    }

    /// Whether the batch may change this record
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Record carrying the working value
    pub fn into_record(self) -> Record {
        self.record
    }

    pub(crate) fn set_value(&mut self, value: u64) {
        self.record.value = value;
    }
}

/// One position of a batch: the operation and the handle it mutates
#[derive(Debug)]
pub struct BatchEntry<'a> {
    /// Position in the batch
    pub index: usize,
    /// Operation at this position
    pub operation: Operation,
    /// Record mutated at this position
    pub handle: &'a mut RecordHandle,
}

/// Pair operations with handles by position
pub fn pair<'a>(
    operations: &[Operation],
    records: &'a mut [RecordHandle],
) -> Result<Vec<BatchEntry<'a>>, BatchError> {
    if operations.len() != records.len() {
        return Err(BatchError::LengthMismatch {
            operations: operations.len(),
            records: records.len(),
        });
    }

    Ok(operations
        .iter()
        .zip(records.iter_mut())
        .enumerate()
        .map(|(index, (operation, handle))| BatchEntry {
            index,
            operation: *operation,
            handle,
        })
        .collect())
}

/// Outcome of a committed batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    /// Identifier used in logs
    pub batch_id: BatchId,
    /// Authority proven by the credential
    pub authority: Authority,
    /// Number of operations applied
    pub applied: usize,
    /// Digest the credential signed
    pub digest: [u8; 32],
}
