//! Ledger handle

use crate::api::*;
use crate::authority::AuthorityCredential;
use crate::batch::{BatchProcessor, BatchReceipt};
use crate::config::LedgerConfig;
use crate::error::*;
use crate::initializer::RecordInitializer;
use crate::journal::{Journal, JournalAction};
use crate::operation::Operation;
use crate::store::RecordStore;
use crate::types::*;
use parking_lot::RwLock;

/// Execution environment around the batch processor.
///
/// Resolves record references into handles once a batch's credential and
/// limits have been checked, runs it under an exclusive view of the store,
/// and commits the working set only when the processor succeeds. Batches are serialized by the store's write lock;
/// readers never see a partially applied batch.
pub struct Ledger {
    processor: BatchProcessor,
    store: RwLock<RecordStore>,
    journal: Journal,
}

impl Ledger {
    /// Create a new ledger with default configuration
    pub fn new() -> Self {
        Self::with_processor(BatchProcessor::default())
    }

    /// Create a new ledger with custom configuration
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] when `config` fails [`LedgerConfig::validate`].
    pub fn with_config(config: LedgerConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_processor(BatchProcessor::new(config)?))
    }

    /// Create a ledger around an already configured processor
    pub fn with_processor(processor: BatchProcessor) -> Self {
        Self {
            processor,
            store: RwLock::new(RecordStore::new()),
            journal: Journal::default(),
        }
    }

    /// API version this ledger implements
    pub fn api_version(&self) -> ApiVersion {
        LEDGER_API_VERSION
    }

    /// Configuration the processor enforces
    pub fn config(&self) -> &LedgerConfig {
        self.processor.config()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// True when no record exists
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Values of `keys`, read under a single lock so no batch is seen half
    /// applied.
    ///
    /// # Errors
    /// [`LedgerError::RecordNotFound`] for the first unknown key.
    pub fn snapshot(&self, keys: &[RecordKey]) -> Result<Vec<u64>, LedgerError> {
        let store = self.store.read();
        keys.iter()
            .map(|&key| {
                store
                    .get(key)
                    .map(|r| r.value)
                    .ok_or(LedgerError::RecordNotFound { key })
            })
            .collect()
    }

    /// Audit trail of committed changes
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Check the journal hash chain
    pub fn verify_journal(&self) -> Result<(), JournalError> {
        self.journal.verify_integrity()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordRegistry for Ledger {
    fn create_record(
        &self,
        key: RecordKey,
        initial_value: u64,
        authority: Authority,
    ) -> Result<Record, LedgerError> {
        let mut store = self.store.write();
        let record = RecordInitializer::create(&mut store, key, initial_value, authority)?;

        self.journal.record(
            JournalAction::Initialize,
            authority,
            format!("key={key}, value={initial_value}"),
            [0u8; 32],
        );

        Ok(record)
    }

    fn initialize_item(
        &self,
        authority: Authority,
        initial_value: u64,
    ) -> Result<RecordKey, LedgerError> {
        let record = self.create_record(RecordKey::new(), initial_value, authority)?;
        Ok(record.key)
    }

    fn fetch(&self, key: RecordKey) -> Result<u64, LedgerError> {
        self.store
            .read()
            .get(key)
            .map(|r| r.value)
            .ok_or(LedgerError::RecordNotFound { key })
    }

    fn record(&self, key: RecordKey) -> Option<Record> {
        self.store.read().get(key).cloned()
    }
}

impl BatchSubmitter for Ledger {
    fn batch_process(
        &self,
        credential: Option<&AuthorityCredential>,
        operations: &[Operation],
        records: &[RecordRef],
    ) -> Result<BatchReceipt, BatchError> {
        let mut store = self.store.write();

        // Working copies; dropped untouched on any error
        let (receipt, handles) = self
            .processor
            .process_refs(credential, operations, records, |refs| store.resolve(refs))?;
        store.commit(handles);

        self.journal.record(
            JournalAction::Batch,
            receipt.authority,
            format!("batch_id={}, applied={}", receipt.batch_id, receipt.applied),
            receipt.digest,
        );

        Ok(receipt)
    }
}
