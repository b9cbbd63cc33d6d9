//! Testing utilities for the ledger workspace
//!
//! Shared fixtures for signing keys, seeded ledgers and signed batches.

#![allow(missing_docs)]

use ed25519_dalek::SigningKey;
use ledger_kernel::prelude::*;

/// Deterministic signing key derived from a single byte
pub fn test_signing_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

pub fn test_authority(seed: u8) -> Authority {
    Authority::from(&test_signing_key(seed))
}

pub fn seeded_ledger(count: usize, initial: u64, signing_key: &SigningKey) -> (Ledger, Vec<RecordKey>) {
    seeded_ledger_with_config(LedgerConfig::default(), count, initial, signing_key)
}

pub fn seeded_ledger_with_config(
    config: LedgerConfig,
    count: usize,
    initial: u64,
    signing_key: &SigningKey,
) -> (Ledger, Vec<RecordKey>) {
    let ledger = Ledger::with_config(config).unwrap();
    let authority = Authority::from(signing_key);
    let keys = (0..count)
        .map(|_| ledger.initialize_item(authority, initial).unwrap())
        .collect();
    (ledger, keys)
}

pub fn add_ops(count: usize, amount: u64) -> Vec<Operation> {
    vec![Operation::add(amount); count]
}

pub fn writable_refs(keys: &[RecordKey]) -> Vec<RecordRef> {
    keys.iter().copied().map(RecordRef::writable).collect()
}

pub fn signed(signing_key: &SigningKey, operations: &[Operation], keys: &[RecordKey]) -> AuthorityCredential {
    AuthorityCredential::sign(signing_key, operations, keys)
}

/// Sign and submit a batch over writable references to `keys`
pub fn submit(
    ledger: &Ledger,
    signing_key: &SigningKey,
    operations: &[Operation],
    keys: &[RecordKey],
) -> Result<BatchReceipt, BatchError> {
    let credential = signed(signing_key, operations, keys);
    ledger.batch_process(Some(&credential), operations, &writable_refs(keys))
}

pub fn values(ledger: &Ledger, keys: &[RecordKey]) -> Vec<u64> {
    keys.iter().map(|k| ledger.fetch(*k).unwrap()).collect()
}
