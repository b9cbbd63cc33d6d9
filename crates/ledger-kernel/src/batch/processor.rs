//! Batch Processor
//!
//! Validates a batch completely, then applies it. Nothing is written to any
//! handle until every new value has been computed.
//!
//! # Validation order
//!
//! 1. Credential present and valid (once per batch)
//! 2. Operation count equals record count
//! 3. Batch within the configured size limit
//! 4. No record key repeated
//! 5. Every handle writable
//! 6. Record authority matches, when enforcement is configured
//! 7. Every operation kind enabled
//!
//! Steps 1 to 3 need only the record keys. [`BatchProcessor::process_refs`]
//! runs them before the environment resolves any reference, so an unsigned
//! or oversized batch learns nothing about which records exist.
//!
//! Arithmetic failures during application are reported with their position
//! and leave every handle untouched.

use super::{pair, BatchEntry, BatchReceipt, RecordHandle};
use crate::authority::{batch_digest, AuthorityCredential};
use crate::config::LedgerConfig;
use crate::credential_integrity::{CredentialIntegrity, CredentialVerifier, Ed25519Verifier};
use crate::error::{BatchError, ConfigError};
use crate::operation::Operation;
use crate::resource::validate_batch_size;
use crate::types::{Authority, BatchId, RecordKey, RecordRef};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Validates and applies batches under one [`LedgerConfig`]
pub struct BatchProcessor {
    config: LedgerConfig,
    verifier: Arc<dyn CredentialVerifier>,
}

impl BatchProcessor {
    /// Processor with the default ed25519 verifier.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] when `config` fails [`LedgerConfig::validate`].
    pub fn new(config: LedgerConfig) -> Result<Self, ConfigError> {
        Self::with_verifier(config, Arc::new(Ed25519Verifier))
    }

    /// Use the environment's own signature primitive
    pub fn with_verifier(
        config: LedgerConfig,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, verifier })
    }

    /// Configuration this processor enforces
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Process one batch against handles supplied in operation order.
    ///
    /// # Errors
    /// Any [`BatchError`]. On error every handle still holds its input value.
    pub fn process(
        &self,
        credential: Option<&AuthorityCredential>,
        operations: &[Operation],
        records: &mut [RecordHandle],
    ) -> Result<BatchReceipt, BatchError> {
        let batch_id = begin(operations.len(), records.len());
        let keys: Vec<RecordKey> = records.iter().map(RecordHandle::key).collect();

        let result = self
            .admit(credential, operations, &keys)
            .and_then(|authority| self.apply(batch_id, authority, operations, &keys, records));

        match result {
            Ok(receipt) => {
                finished(&receipt);
                Ok(receipt)
            }
            Err(e) => Err(rejected(batch_id, e)),
        }
    }

    /// Process one batch given as record references.
    ///
    /// `resolve` is called only after steps 1 to 3 pass. The returned handles
    /// carry the new values and are meant to be committed by the caller.
    ///
    /// # Errors
    /// Any [`BatchError`], including whatever `resolve` returns.
    pub fn process_refs<F>(
        &self,
        credential: Option<&AuthorityCredential>,
        operations: &[Operation],
        refs: &[RecordRef],
        resolve: F,
    ) -> Result<(BatchReceipt, Vec<RecordHandle>), BatchError>
    where
        F: FnOnce(&[RecordRef]) -> Result<Vec<RecordHandle>, BatchError>,
    {
        let batch_id = begin(operations.len(), refs.len());
        let keys: Vec<RecordKey> = refs.iter().map(|r| r.key).collect();

        let result = self.admit(credential, operations, &keys).and_then(|authority| {
            let mut handles = resolve(refs)?;
            let receipt = self.apply(batch_id, authority, operations, &keys, &mut handles)?;
            Ok((receipt, handles))
        });

        match result {
            Ok((receipt, handles)) => {
                finished(&receipt);
                Ok((receipt, handles))
            }
            Err(e) => Err(rejected(batch_id, e)),
        }
    }

    /// Steps 1 to 3
    fn admit(
        &self,
        credential: Option<&AuthorityCredential>,
        operations: &[Operation],
        keys: &[RecordKey],
    ) -> Result<Authority, BatchError> {
        let authority =
            CredentialIntegrity::verify(credential, self.verifier.as_ref(), operations, keys)?;

        if operations.len() != keys.len() {
            return Err(BatchError::LengthMismatch {
                operations: operations.len(),
                records: keys.len(),
            });
        }
        validate_batch_size(keys.len(), self.config.max_batch_size)?;
        Ok(authority)
    }

    fn apply(
        &self,
        batch_id: BatchId,
        authority: Authority,
        operations: &[Operation],
        keys: &[RecordKey],
        records: &mut [RecordHandle],
    ) -> Result<BatchReceipt, BatchError> {
        let mut entries = pair(operations, records)?;
        self.validate_entries(&entries, authority)?;

        let scratch = self.compute(&entries)?;
        for (entry, value) in entries.iter_mut().zip(scratch) {
            entry.handle.set_value(value);
        }

        Ok(BatchReceipt {
            batch_id,
            authority,
            applied: entries.len(),
            digest: batch_digest(operations, keys),
        })
    }

    /// Steps 4 to 7. Each check runs over the whole batch before the next one
    /// starts, so the reported error follows the documented order.
    fn validate_entries(
        &self,
        entries: &[BatchEntry<'_>],
        authority: Authority,
    ) -> Result<(), BatchError> {
        let mut seen: HashMap<RecordKey, usize> = HashMap::with_capacity(entries.len());
        for entry in entries {
            let key = entry.handle.key();
            if let Some(&first) = seen.get(&key) {
                return Err(BatchError::DuplicateRecordInBatch {
                    key,
                    first,
                    second: entry.index,
                });
            }
            seen.insert(key, entry.index);
        }

        if let Some(entry) = entries.iter().find(|e| !e.handle.is_writable()) {
            return Err(BatchError::RecordNotWritable { index: entry.index });
        }

        if self.config.enforce_record_authority {
            if let Some(entry) = entries.iter().find(|e| e.handle.authority() != authority) {
                return Err(BatchError::AuthorityMismatch { index: entry.index });
            }
        }

        if let Some(entry) = entries
            .iter()
            .find(|e| !self.config.is_enabled(e.operation.kind()))
        {
            return Err(BatchError::UnsupportedOperation {
                index: entry.index,
                kind: entry.operation.kind(),
            });
        }

        Ok(())
    }

    /// Compute every new value into a scratch buffer
    fn compute(&self, entries: &[BatchEntry<'_>]) -> Result<Vec<u64>, BatchError> {
        let interval = self.config.progress_interval.max(1);
        let mut scratch = Vec::with_capacity(entries.len());
        for entry in entries {
            let next = entry
                .operation
                .apply(entry.handle.value())
                .map_err(|fault| fault.at(entry.index))?;
            scratch.push(next);

            if entry.index % interval == 0 {
                debug!(index = entry.index, "Processed operation");
            }
        }
        Ok(scratch)
    }
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self {
            config: LedgerConfig::default(),
            verifier: Arc::new(Ed25519Verifier),
        }
    }
}

fn begin(operations: usize, records: usize) -> BatchId {
    let batch_id = BatchId::new();
    info!(%batch_id, operations, records, "Start batch processing");
    batch_id
}

fn finished(receipt: &BatchReceipt) {
    info!(batch_id = %receipt.batch_id, applied = receipt.applied, "Finished batch processing");
}

fn rejected(batch_id: BatchId, error: BatchError) -> BatchError {
    warn!(%batch_id, %error, "Batch rejected");
    error
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthorityFailure;
    use crate::operation::OperationKind;
    use crate::types::Record;
    use ed25519_dalek::SigningKey;

    fn signer() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    fn handles(values: &[u64]) -> Vec<RecordHandle> {
        let authority = Authority::from(&signer());
        values
            .iter()
            .map(|&value| {
                RecordHandle::new(
                    Record {
                        key: RecordKey::new(),
                        value,
                        authority,
                    },
                    true,
                )
            })
            .collect()
    }

    fn sign(ops: &[Operation], records: &[RecordHandle]) -> AuthorityCredential {
        let keys: Vec<RecordKey> = records.iter().map(RecordHandle::key).collect();
        AuthorityCredential::sign(&signer(), ops, &keys)
    }

    fn values(records: &[RecordHandle]) -> Vec<u64> {
        records.iter().map(RecordHandle::value).collect()
    }

    #[test]
    fn test_applies_every_position() {
        let processor = BatchProcessor::default();
        let mut records = handles(&[0, 5, 100]);
        let ops = [Operation::add(10), Operation::add(1), Operation::subtract(100)];
        let credential = sign(&ops, &records);

        let receipt = processor.process(Some(&credential), &ops, &mut records).unwrap();
        assert_eq!(receipt.applied, 3);
        assert_eq!(receipt.authority, Authority::from(&signer()));
        assert_eq!(values(&records), vec![10, 6, 0]);
    }

    #[test]
    fn test_overflow_leaves_earlier_positions_untouched() {
        let processor = BatchProcessor::default();
        let mut records = handles(&[1, 2, u64::MAX]);
        let ops = [Operation::add(1), Operation::add(1), Operation::add(1)];
        let credential = sign(&ops, &records);

        let err = processor.process(Some(&credential), &ops, &mut records).unwrap_err();
        assert_eq!(err, BatchError::ArithmeticOverflow { index: 2 });
        assert_eq!(values(&records), vec![1, 2, u64::MAX]);
    }

    #[test]
    fn test_authority_checked_before_length() {
        let processor = BatchProcessor::default();
        let mut records = handles(&[0, 0]);
        let ops = [Operation::add(1)];

        let err = processor.process(None, &ops, &mut records).unwrap_err();
        assert_eq!(
            err,
            BatchError::AuthorityMissing {
                reason: AuthorityFailure::Absent
            }
        );
    }

    #[test]
    fn test_length_checked_before_size() {
        let processor =
            BatchProcessor::new(LedgerConfig::default().with_max_batch_size(1)).unwrap();
        let mut records = handles(&[0, 0]);
        let ops = [Operation::add(1), Operation::add(1), Operation::add(1)];
        let credential = sign(&ops, &records);

        let err = processor.process(Some(&credential), &ops, &mut records).unwrap_err();
        assert_eq!(err, BatchError::LengthMismatch { operations: 3, records: 2 });
    }

    #[test]
    fn test_duplicate_reported_before_unsupported() {
        let processor = BatchProcessor::new(
            LedgerConfig::default().with_enabled_operations([OperationKind::Add]),
        )
        .unwrap();
        let mut records = handles(&[0, 0]);
        records[1] = records[0].clone();
        let ops = [Operation::subtract(0), Operation::add(1)];
        let credential = sign(&ops, &records);

        let err = processor.process(Some(&credential), &ops, &mut records).unwrap_err();
        assert!(matches!(
            err,
            BatchError::DuplicateRecordInBatch { first: 0, second: 1, .. }
        ));
    }

    #[test]
    fn test_disabled_kind_is_unsupported() {
        let processor = BatchProcessor::new(
            LedgerConfig::default().with_enabled_operations([OperationKind::Add]),
        )
        .unwrap();
        let mut records = handles(&[5, 5]);
        let ops = [Operation::add(1), Operation::subtract(1)];
        let credential = sign(&ops, &records);

        let err = processor.process(Some(&credential), &ops, &mut records).unwrap_err();
        assert_eq!(
            err,
            BatchError::UnsupportedOperation {
                index: 1,
                kind: OperationKind::Subtract
            }
        );
        assert_eq!(values(&records), vec![5, 5]);
    }

    #[test]
    fn test_readonly_handle_rejected() {
        let processor = BatchProcessor::default();
        let mut records = handles(&[0, 0]);
        records[1] = RecordHandle::new(records[1].clone().into_record(), false);
        let ops = [Operation::add(1), Operation::add(1)];
        let credential = sign(&ops, &records);

        let err = processor.process(Some(&credential), &ops, &mut records).unwrap_err();
        assert_eq!(err, BatchError::RecordNotWritable { index: 1 });
        assert_eq!(values(&records), vec![0, 0]);
    }

    #[test]
    fn test_empty_batch_commits_nothing() {
        let processor = BatchProcessor::default();
        let mut records: Vec<RecordHandle> = Vec::new();
        let credential = sign(&[], &records);

        let receipt = processor.process(Some(&credential), &[], &mut records).unwrap();
        assert_eq!(receipt.applied, 0);
    }

    #[test]
    fn test_invalid_config_refused() {
        assert!(matches!(
            BatchProcessor::new(LedgerConfig::default().with_max_batch_size(0)),
            Err(ConfigError::Invalid(_))
        ));
        let no_kinds = LedgerConfig::default().with_enabled_operations(Vec::<OperationKind>::new());
        assert!(BatchProcessor::new(no_kinds).is_err());
    }

    #[test]
    fn test_refs_not_resolved_before_admission() {
        let processor =
            BatchProcessor::new(LedgerConfig::default().with_max_batch_size(2)).unwrap();
        let refs: Vec<RecordRef> = (0..3).map(|_| RecordRef::writable(RecordKey::new())).collect();
        let ops = [Operation::add(1), Operation::add(1), Operation::add(1)];
        let keys: Vec<RecordKey> = refs.iter().map(|r| r.key).collect();
        let credential = AuthorityCredential::sign(&signer(), &ops, &keys);
        let mut resolved = 0;

        let err = processor
            .process_refs(None, &ops, &refs, |_| {
                resolved += 1;
                Ok(Vec::new())
            })
            .unwrap_err();
        assert_eq!(
            err,
            BatchError::AuthorityMissing {
                reason: AuthorityFailure::Absent
            }
        );

        let err = processor
            .process_refs(Some(&credential), &ops, &refs, |_| {
                resolved += 1;
                Ok(Vec::new())
            })
            .unwrap_err();
        assert_eq!(err, BatchError::BatchTooLarge { len: 3, max: 2 });
        assert_eq!(resolved, 0);
    }

    #[test]
    fn test_refs_resolved_then_applied() {
        let processor = BatchProcessor::default();
        let mut records = handles(&[1, 2]);
        let refs: Vec<RecordRef> = records.iter().map(|h| RecordRef::writable(h.key())).collect();
        let ops = [Operation::add(10), Operation::subtract(2)];
        let credential = sign(&ops, &records);

        let (receipt, updated) = processor
            .process_refs(Some(&credential), &ops, &refs, |_| Ok(std::mem::take(&mut records)))
            .unwrap();
        assert_eq!(receipt.applied, 2);
        assert_eq!(values(&updated), vec![11, 0]);
    }
}
