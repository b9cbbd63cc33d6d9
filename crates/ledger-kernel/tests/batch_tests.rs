//! Batch tests - all-or-nothing application through the ledger handle

use ledger_kernel::prelude::*;
use ledger_test_utils::*;
use pretty_assertions::assert_eq;

#[test]
fn test_scenario_ten_items_add_ten() {
    let key = test_signing_key(1);
    let (ledger, keys) = seeded_ledger(10, 0, &key);

    let receipt = submit(&ledger, &key, &add_ops(10, 10), &keys).unwrap();

    assert_eq!(receipt.applied, 10);
    assert_eq!(receipt.authority, Authority::from(&key));
    assert_eq!(values(&ledger, &keys), vec![10; 10]);
}

#[test]
fn test_scenario_length_mismatch_leaves_values() {
    let key = test_signing_key(1);
    let (ledger, keys) = seeded_ledger(2, 0, &key);
    let ops = add_ops(3, 10);

    let err = submit(&ledger, &key, &ops, &keys).unwrap_err();

    assert_eq!(
        err,
        BatchError::LengthMismatch {
            operations: 3,
            records: 2
        }
    );
    assert_eq!(values(&ledger, &keys), vec![0, 0]);
}

#[test]
fn test_same_batch_twice_accumulates() {
    let key = test_signing_key(1);
    let (ledger, keys) = seeded_ledger(4, 7, &key);
    let ops = add_ops(4, 5);

    submit(&ledger, &key, &ops, &keys).unwrap();
    submit(&ledger, &key, &ops, &keys).unwrap();

    assert_eq!(values(&ledger, &keys), vec![17; 4]);
}

#[test]
fn test_overflow_rejects_whole_batch() {
    let key = test_signing_key(1);
    let ledger = Ledger::new();
    let authority = Authority::from(&key);
    let a = ledger.initialize_item(authority, 1).unwrap();
    let b = ledger.initialize_item(authority, u64::MAX - 1).unwrap();
    let c = ledger.initialize_item(authority, 3).unwrap();
    let keys = [a, b, c];

    let err = submit(&ledger, &key, &add_ops(3, 2), &keys).unwrap_err();

    assert_eq!(err, BatchError::ArithmeticOverflow { index: 1 });
    assert_eq!(err.kind(), BatchErrorKind::Arithmetic);
    // Position 0 precedes the fault and must still be untouched
    assert_eq!(values(&ledger, &keys), vec![1, u64::MAX - 1, 3]);
}

#[test]
fn test_subtract_and_underflow() {
    let key = test_signing_key(1);
    let (ledger, keys) = seeded_ledger(2, 10, &key);

    let ops = [Operation::subtract(4), Operation::add(4)];
    submit(&ledger, &key, &ops, &keys).unwrap();
    assert_eq!(values(&ledger, &keys), vec![6, 14]);

    let ops = [Operation::add(1), Operation::subtract(15)];
    let err = submit(&ledger, &key, &ops, &keys).unwrap_err();
    assert_eq!(err, BatchError::ArithmeticUnderflow { index: 1 });
    assert_eq!(values(&ledger, &keys), vec![6, 14]);
}

#[test]
fn test_duplicate_record_rejected() {
    let key = test_signing_key(1);
    let (ledger, keys) = seeded_ledger(2, 0, &key);
    let batch_keys = [keys[0], keys[1], keys[0]];

    let err = submit(&ledger, &key, &add_ops(3, 1), &batch_keys).unwrap_err();

    assert_eq!(
        err,
        BatchError::DuplicateRecordInBatch {
            key: keys[0],
            first: 0,
            second: 2
        }
    );
    assert_eq!(err.index(), Some(2));
    assert_eq!(values(&ledger, &keys), vec![0, 0]);
}

#[test]
fn test_missing_credential_rejected() {
    let key = test_signing_key(1);
    let (ledger, keys) = seeded_ledger(3, 0, &key);

    let err = ledger
        .batch_process(None, &add_ops(3, 1), &writable_refs(&keys))
        .unwrap_err();

    assert_eq!(
        err,
        BatchError::AuthorityMissing {
            reason: AuthorityFailure::Absent
        }
    );
    assert_eq!(values(&ledger, &keys), vec![0, 0, 0]);
}

#[test]
fn test_credential_for_other_batch_rejected() {
    let key = test_signing_key(1);
    let (ledger, keys) = seeded_ledger(2, 0, &key);
    let credential = signed(&key, &add_ops(2, 1), &keys);

    // Same records, different amounts
    let err = ledger
        .batch_process(Some(&credential), &add_ops(2, 1000), &writable_refs(&keys))
        .unwrap_err();

    assert_eq!(
        err,
        BatchError::AuthorityMissing {
            reason: AuthorityFailure::InvalidSignature
        }
    );
    assert_eq!(values(&ledger, &keys), vec![0, 0]);
}

#[test]
fn test_oversized_batch_not_truncated() {
    let key = test_signing_key(1);
    let config = LedgerConfig::default().with_max_batch_size(4);
    let (ledger, keys) = seeded_ledger_with_config(config, 5, 0, &key);

    let err = submit(&ledger, &key, &add_ops(5, 1), &keys).unwrap_err();

    assert_eq!(err, BatchError::BatchTooLarge { len: 5, max: 4 });
    assert_eq!(values(&ledger, &keys), vec![0; 5]);

    submit(&ledger, &key, &add_ops(4, 1), &keys[..4]).unwrap();
    assert_eq!(values(&ledger, &keys), vec![1, 1, 1, 1, 0]);
}

#[test]
fn test_readonly_reference_rejected() {
    let key = test_signing_key(1);
    let (ledger, keys) = seeded_ledger(2, 0, &key);
    let ops = add_ops(2, 1);
    let credential = signed(&key, &ops, &keys);
    let refs = [RecordRef::writable(keys[0]), RecordRef::readonly(keys[1])];

    let err = ledger.batch_process(Some(&credential), &ops, &refs).unwrap_err();

    assert_eq!(err, BatchError::RecordNotWritable { index: 1 });
    assert_eq!(values(&ledger, &keys), vec![0, 0]);
}

#[test]
fn test_record_authority_enforced_when_configured() {
    let owner = test_signing_key(1);
    let other = test_signing_key(2);
    let config = LedgerConfig::default().with_record_authority(true);
    let ledger = Ledger::with_config(config).unwrap();
    let mine = ledger.initialize_item(Authority::from(&owner), 0).unwrap();
    let theirs = ledger.initialize_item(Authority::from(&other), 0).unwrap();

    let err = submit(&ledger, &owner, &add_ops(2, 1), &[mine, theirs]).unwrap_err();
    assert_eq!(err, BatchError::AuthorityMismatch { index: 1 });
    assert_eq!(err.kind(), BatchErrorKind::Authorization);

    submit(&ledger, &owner, &add_ops(1, 1), &[mine]).unwrap();
    assert_eq!(values(&ledger, &[mine, theirs]), vec![1, 0]);
}

#[test]
fn test_any_authority_accepted_by_default() {
    let owner = test_signing_key(1);
    let other = test_signing_key(2);
    let (ledger, keys) = seeded_ledger(2, 0, &owner);

    submit(&ledger, &other, &add_ops(2, 3), &keys).unwrap();

    assert_eq!(values(&ledger, &keys), vec![3, 3]);
}

#[test]
fn test_disabled_operation_rejected() {
    let key = test_signing_key(1);
    let config = LedgerConfig::default().with_enabled_operations([OperationKind::Add]);
    let (ledger, keys) = seeded_ledger_with_config(config, 2, 5, &key);

    let ops = [Operation::add(1), Operation::subtract(1)];
    let err = submit(&ledger, &key, &ops, &keys).unwrap_err();

    assert_eq!(
        err,
        BatchError::UnsupportedOperation {
            index: 1,
            kind: OperationKind::Subtract
        }
    );
    assert_eq!(values(&ledger, &keys), vec![5, 5]);
}

#[test]
fn test_empty_batch_is_noop() {
    let key = test_signing_key(1);
    let (ledger, keys) = seeded_ledger(1, 9, &key);

    let receipt = submit(&ledger, &key, &[], &[]).unwrap();

    assert_eq!(receipt.applied, 0);
    assert_eq!(values(&ledger, &keys), vec![9]);
}

#[test]
fn test_untouched_records_keep_values() {
    let key = test_signing_key(1);
    let (ledger, keys) = seeded_ledger(4, 2, &key);

    submit(&ledger, &key, &add_ops(2, 8), &keys[1..3]).unwrap();

    assert_eq!(values(&ledger, &keys), vec![2, 10, 10, 2]);
}

#[test]
fn test_create_record_at_existing_key() {
    let key = test_signing_key(1);
    let (ledger, keys) = seeded_ledger(1, 4, &key);

    let err = ledger
        .create_record(keys[0], 100, Authority::from(&key))
        .unwrap_err();

    assert_eq!(err, LedgerError::Init(InitError::DuplicateRecord { key: keys[0] }));
    assert_eq!(ledger.fetch(keys[0]), Ok(4));
    assert_eq!(ledger.len(), 1);
}
