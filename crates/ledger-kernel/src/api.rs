//! Public API traits and version

use crate::authority::AuthorityCredential;
use crate::batch::BatchReceipt;
use crate::error::{BatchError, LedgerError};
use crate::operation::Operation;
use crate::types::{Authority, Record, RecordKey, RecordRef};
use serde::{Deserialize, Serialize};

/// Semantic version of the ledger API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiVersion {
    /// Incompatible changes
    pub major: u16,
    /// Compatible additions
    pub minor: u16,
    /// Fixes
    pub patch: u16,
}

/// Version implemented by this crate
pub const LEDGER_API_VERSION: ApiVersion = ApiVersion {
    major: 1,
    minor: 0,
    patch: 0,
};

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Record lifecycle and read access
pub trait RecordRegistry {
    /// Create a record at a caller-chosen key
    fn create_record(
        &self,
        key: RecordKey,
        initial_value: u64,
        authority: Authority,
    ) -> Result<Record, LedgerError>;

    /// Create a record at a fresh key and return the key
    fn initialize_item(&self, authority: Authority, initial_value: u64)
        -> Result<RecordKey, LedgerError>;

    /// Current value. No side effects.
    fn fetch(&self, key: RecordKey) -> Result<u64, LedgerError>;

    /// Full record, if it exists
    fn record(&self, key: RecordKey) -> Option<Record>;
}

/// Atomic batch submission
pub trait BatchSubmitter {
    /// Apply `operations[i]` to `records[i]` for every `i`, or nothing at all
    fn batch_process(
        &self,
        credential: Option<&AuthorityCredential>,
        operations: &[Operation],
        records: &[RecordRef],
    ) -> Result<BatchReceipt, BatchError>;
}
