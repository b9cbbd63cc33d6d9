//! Ledger Kernel (ledger-kernel)
//!
//! All-or-nothing batch mutation of keyed numeric records:
//! 1. **Validation**: authority, positional correspondence, batch limits and
//!    per-entry preconditions are checked before any write
//! 2. **Application**: every new value is computed into a scratch buffer and
//!    written back only when the whole batch succeeds
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ledger_kernel::prelude::*;
//!
//! let ledger = Ledger::new();
//! let authority = Authority::from(&signing_key);
//! let a = ledger.initialize_item(authority, 0)?;
//! let b = ledger.initialize_item(authority, 0)?;
//!
//! let ops = [Operation::add(10), Operation::add(10)];
//! let credential = AuthorityCredential::sign(&signing_key, &ops, &[a, b]);
//! ledger.batch_process(
//!     Some(&credential),
//!     &ops,
//!     &[RecordRef::writable(a), RecordRef::writable(b)],
//! )?;
//! assert_eq!(ledger.fetch(a)?, 10);
//! ```

// Core modules
pub mod api;
pub mod authority;
pub mod batch;
pub mod config;
pub mod credential_integrity;
pub mod error;
pub mod handle;
pub mod initializer;
pub mod journal;
pub mod operation;
pub mod resource;
pub mod store;
pub mod types;

// Test harness
pub mod test_harness;

// Re-exports
pub use api::*;
pub use error::*;
pub use types::*;

/// Commonly used types in one import
pub mod prelude {
    pub use crate::api::{BatchSubmitter, RecordRegistry};
    pub use crate::authority::AuthorityCredential;
    pub use crate::batch::{BatchProcessor, BatchReceipt, RecordHandle};
    pub use crate::config::LedgerConfig;
    pub use crate::credential_integrity::{CredentialVerifier, Ed25519Verifier};
    pub use crate::error::{AuthorityFailure, BatchError, BatchErrorKind, InitError, LedgerError};
    pub use crate::handle::Ledger;
    pub use crate::operation::{Operation, OperationKind};
    pub use crate::types::{Authority, BatchId, Record, RecordKey, RecordRef};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
