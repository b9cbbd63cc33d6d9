//! Error types for the ledger kernel
//!
//! - Batch validation, authorization and arithmetic failures
//! - Record initialization conflicts
//! - Configuration loading
//! - Journal integrity

use crate::operation::OperationKind;
use crate::types::RecordKey;
use std::fmt;

/// Why a batch credential was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityFailure {
    /// No credential was supplied
    Absent,
    /// The signature does not cover this batch under the claimed authority
    InvalidSignature,
}

impl fmt::Display for AuthorityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorityFailure::Absent => write!(f, "no credential supplied"),
            AuthorityFailure::InvalidSignature => write!(f, "signature does not verify"),
        }
    }
}

/// Failure of a batch. Any variant means no record was changed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// Credential absent or invalid
    #[error("authority missing: {reason}")]
    AuthorityMissing { reason: AuthorityFailure },

    /// Record controlled by another authority (only when enforcement is on)
    #[error("record at position {index} is controlled by a different authority")]
    AuthorityMismatch { index: usize },

    /// Operations and records do not pair up
    #[error("{operations} operations but {records} records")]
    LengthMismatch { operations: usize, records: usize },

    /// Batch exceeds the configured resource budget
    #[error("batch of {len} entries exceeds limit of {max}")]
    BatchTooLarge { len: usize, max: usize },

    /// Same record referenced twice
    #[error("record {key} referenced at positions {first} and {second}")]
    DuplicateRecordInBatch {
        key: RecordKey,
        first: usize,
        second: usize,
    },

    /// Handle supplied without write access
    #[error("record at position {index} is not writable")]
    RecordNotWritable { index: usize },

    /// Operation kind not enabled
    #[error("operation {kind:?} at position {index} is not supported")]
    UnsupportedOperation { index: usize, kind: OperationKind },

    /// Addition past `u64::MAX`
    #[error("arithmetic overflow at position {index}")]
    ArithmeticOverflow { index: usize },

    /// Subtraction below zero
    #[error("arithmetic underflow at position {index}")]
    ArithmeticUnderflow { index: usize },

    /// Reference could not be resolved by the environment
    #[error("no record {key} for position {index}")]
    UnknownRecord { index: usize, key: RecordKey },
}

/// Coarse classification of [`BatchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchErrorKind {
    /// Malformed batch
    Validation,
    /// Credential or record control
    Authorization,
    /// Checked arithmetic failed
    Arithmetic,
    /// Reference could not be resolved
    Environment,
}

impl BatchError {
    /// Coarse classification
    #[must_use]
    pub fn kind(&self) -> BatchErrorKind {
        match self {
            BatchError::LengthMismatch { .. }
            | BatchError::BatchTooLarge { .. }
            | BatchError::DuplicateRecordInBatch { .. }
            | BatchError::RecordNotWritable { .. }
            | BatchError::UnsupportedOperation { .. } => BatchErrorKind::Validation,
            BatchError::AuthorityMissing { .. } | BatchError::AuthorityMismatch { .. } => {
                BatchErrorKind::Authorization
            }
            BatchError::ArithmeticOverflow { .. } | BatchError::ArithmeticUnderflow { .. } => {
                BatchErrorKind::Arithmetic
            }
            BatchError::UnknownRecord { .. } => BatchErrorKind::Environment,
        }
    }

    /// Offending batch position, when the failure is tied to one
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            BatchError::AuthorityMismatch { index }
            | BatchError::RecordNotWritable { index }
            | BatchError::UnsupportedOperation { index, .. }
            | BatchError::ArithmeticOverflow { index }
            | BatchError::ArithmeticUnderflow { index }
            | BatchError::UnknownRecord { index, .. } => Some(*index),
            BatchError::DuplicateRecordInBatch { second, .. } => Some(*second),
            BatchError::AuthorityMissing { .. }
            | BatchError::LengthMismatch { .. }
            | BatchError::BatchTooLarge { .. } => None,
        }
    }
}

/// Record creation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    /// Key already taken
    #[error("record {key} already exists")]
    DuplicateRecord { key: RecordKey },
}

/// Errors surfaced by the [`Ledger`](crate::handle::Ledger) handle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Record creation failed
    #[error("initialization failed: {0}")]
    Init(#[from] InitError),

    /// Batch rejected
    #[error("batch failed: {0}")]
    Batch(#[from] BatchError),

    /// No record at this key
    #[error("record {key} not found")]
    RecordNotFound { key: RecordKey },
}

/// Configuration loading and validation
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Not valid TOML for this schema
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed but unusable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Journal verification failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JournalError {
    /// Entry hash or link mismatch
    #[error("journal chain broken at entry {sequence}")]
    IntegrityViolation { sequence: u64 },
}
