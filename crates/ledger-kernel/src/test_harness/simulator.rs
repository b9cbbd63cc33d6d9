//! Ledger Simulator - Atomicity Testing
//!
//! Drives a [`Ledger`] with randomly generated batches, some of them
//! deliberately malformed, and checks every outcome against an in-memory
//! model of the record values.
//!
//! Key invariants tested:
//! - A committed batch changes exactly its records, by exactly its operations
//! - A rejected batch changes nothing, including positions before the fault
//! - Rejections carry the error the validation order predicts
//! - The journal chain stays intact

use crate::api::{BatchSubmitter, RecordRegistry};
use crate::authority::AuthorityCredential;
use crate::config::LedgerConfig;
use crate::error::{AuthorityFailure, BatchError};
use crate::handle::Ledger;
use crate::operation::Operation;
use crate::types::{Authority, RecordKey, RecordRef};
use ed25519_dalek::SigningKey;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::mem::discriminant;

/// Simulator configuration
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Batches to submit
    pub total_batches: u64,
    /// Records created before the first batch
    pub record_count: usize,
    /// Stop conditions
    pub stop_on_first_violation: bool,
    /// Configuration of the ledger under test
    pub ledger: LedgerConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            total_batches: 1000,
            record_count: 32,
            stop_on_first_violation: true,
            ledger: LedgerConfig::default().with_max_batch_size(16),
        }
    }
}

/// Fault injected into a generated batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InjectedFault {
    /// Well-formed, correctly signed
    None,
    /// No credential
    Unsigned,
    /// Signed by a key other than the claimed authority
    ForgedSignature,
    /// One operation too many or too few
    LengthMismatch,
    /// A key repeated
    DuplicateRecord,
    /// Above the size limit
    Oversized,
}

/// A generated batch, before submission
#[derive(Debug, Clone)]
pub struct SimulatedBatch {
    /// Fault the batch was built with
    pub fault: InjectedFault,
    /// Operations to submit
    pub operations: Vec<Operation>,
    /// Records referenced, in order
    pub keys: Vec<RecordKey>,
}

/// A violation detected during simulation
#[derive(Debug, Clone, Serialize)]
pub enum Violation {
    /// Ledger result differs from the model's prediction
    UnexpectedOutcome {
        batch: u64,
        fault: InjectedFault,
        expected: String,
        actual: String,
    },
    /// A stored value differs from the model after a batch
    ValueDivergence {
        batch: u64,
        key: RecordKey,
        expected: u64,
        actual: u64,
    },
    /// The journal chain no longer verifies
    JournalCorrupted,
    /// The ledger under test could not be built
    InvalidConfig { reason: String },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulatorStats {
    /// Batches submitted
    pub batches_attempted: u64,
    /// Batches the ledger accepted
    pub batches_committed: u64,
    /// Batches the ledger refused
    pub batches_rejected: u64,
    /// Operations in committed batches
    pub operations_applied: u64,
    /// Rejections caused by overflow or underflow
    pub arithmetic_rejections: u64,
}

/// Final report from simulator
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorReport {
    /// Configuration the run used
    pub config: SimulatorConfig,
    /// Counters
    pub stats: SimulatorStats,
    /// Every detected violation
    pub violations: Vec<Violation>,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Ledger Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Records: {}\n", self.config.record_count));
        report.push_str(&format!("Batches Attempted: {}\n", self.stats.batches_attempted));
        report.push_str(&format!("Batches Committed: {}\n", self.stats.batches_committed));
        report.push_str(&format!("Batches Rejected: {}\n", self.stats.batches_rejected));
        report.push_str(&format!(
            "  of which arithmetic: {}\n",
            self.stats.arithmetic_rejections
        ));
        report.push_str(&format!("Operations Applied: {}\n", self.stats.operations_applied));
        report.push_str(&format!("Violations: {}\n", self.violations.len()));

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}\n", i + 1, v));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

/// Run the Ledger Simulator
pub fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let signing_key = SigningKey::generate(&mut rng);
    let forger = SigningKey::generate(&mut rng);
    let authority = Authority::from(&signing_key);

    let ledger = match Ledger::with_config(config.ledger.clone()) {
        Ok(ledger) => ledger,
        Err(e) => {
            return SimulatorReport {
                config,
                stats: SimulatorStats::default(),
                violations: vec![Violation::InvalidConfig {
                    reason: e.to_string(),
                }],
            }
        }
    };
    let mut model: HashMap<RecordKey, u64> = HashMap::new();
    let mut keys = Vec::with_capacity(config.record_count);

    for _ in 0..config.record_count {
        let initial = random_value(&mut rng);
        if let Ok(key) = ledger.initialize_item(authority, initial) {
            model.insert(key, initial);
            keys.push(key);
        }
    }

    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();

    for batch_no in 0..config.total_batches {
        if keys.is_empty() {
            break;
        }

        let batch = generate_batch(&mut rng, &keys, config.ledger.max_batch_size);
        let expected = expected_outcome(&config.ledger, &model, &batch);
        let credential = match batch.fault {
            InjectedFault::Unsigned => None,
            InjectedFault::ForgedSignature => {
                let mut forged = AuthorityCredential::sign(&forger, &batch.operations, &batch.keys);
                forged.authority = authority;
                Some(forged)
            }
            _ => Some(AuthorityCredential::sign(
                &signing_key,
                &batch.operations,
                &batch.keys,
            )),
        };
        let refs: Vec<RecordRef> = batch.keys.iter().copied().map(RecordRef::writable).collect();

        stats.batches_attempted += 1;
        let actual = ledger.batch_process(credential.as_ref(), &batch.operations, &refs);

        let outcome_matches = match (&expected, &actual) {
            (Ok(_), Ok(_)) => true,
            (Err(e), Err(a)) => discriminant(e) == discriminant(a),
            _ => false,
        };
        if !outcome_matches {
            violations.push(Violation::UnexpectedOutcome {
                batch: batch_no,
                fault: batch.fault,
                expected: format!("{expected:?}"),
                actual: format!("{actual:?}"),
            });
        }

        match (&expected, &actual) {
            (Ok(updates), Ok(receipt)) => {
                stats.batches_committed += 1;
                stats.operations_applied += receipt.applied as u64;
                for (key, value) in updates {
                    model.insert(*key, *value);
                }
            }
            (_, Err(e)) => {
                stats.batches_rejected += 1;
                if matches!(
                    e,
                    BatchError::ArithmeticOverflow { .. } | BatchError::ArithmeticUnderflow { .. }
                ) {
                    stats.arithmetic_rejections += 1;
                }
            }
            (Err(_), Ok(_)) => stats.batches_committed += 1,
        }

        // Referenced records must match the model whatever the outcome
        for key in &batch.keys {
            let expected_value = model.get(key).copied().unwrap_or_default();
            let actual_value = ledger.fetch(*key).unwrap_or_default();
            if expected_value != actual_value {
                violations.push(Violation::ValueDivergence {
                    batch: batch_no,
                    key: *key,
                    expected: expected_value,
                    actual: actual_value,
                });
                // Resync so one divergence is reported once
                model.insert(*key, actual_value);
            }
        }

        if config.stop_on_first_violation && !violations.is_empty() {
            break;
        }
    }

    if ledger.verify_journal().is_err() {
        violations.push(Violation::JournalCorrupted);
    }

    SimulatorReport {
        config,
        stats,
        violations,
    }
}

/// Mostly small values, with some close to the top of the range so that
/// additions overflow now and then
fn random_value(rng: &mut StdRng) -> u64 {
    if rng.gen_bool(0.1) {
        u64::MAX - rng.gen_range(0..1_000)
    } else {
        rng.gen_range(0..10_000)
    }
}

fn generate_batch(rng: &mut StdRng, keys: &[RecordKey], max_batch_size: usize) -> SimulatedBatch {
    let fault = match rng.gen_range(0..10) {
        0 => InjectedFault::Unsigned,
        1 => InjectedFault::ForgedSignature,
        2 => InjectedFault::LengthMismatch,
        3 => InjectedFault::DuplicateRecord,
        4 if keys.len() > max_batch_size => InjectedFault::Oversized,
        _ => InjectedFault::None,
    };

    let len = match fault {
        InjectedFault::Oversized => rng.gen_range(max_batch_size + 1..=keys.len()),
        InjectedFault::DuplicateRecord => rng.gen_range(2..=max_batch_size.clamp(2, keys.len().max(2))),
        _ => rng.gen_range(1..=max_batch_size.min(keys.len()).max(1)),
    };

    // Distinct keys, in random order
    let mut pool: Vec<RecordKey> = keys.to_vec();
    let mut selected = Vec::with_capacity(len);
    while selected.len() < len && !pool.is_empty() {
        let i = rng.gen_range(0..pool.len());
        selected.push(pool.swap_remove(i));
    }
    if fault == InjectedFault::DuplicateRecord && selected.len() >= 2 {
        let from = rng.gen_range(0..selected.len() - 1);
        let to = rng.gen_range(from + 1..selected.len());
        selected[to] = selected[from];
    }

    let mut operations: Vec<Operation> = selected
        .iter()
        .map(|_| {
            if rng.gen_bool(0.7) {
                let amount = if rng.gen_bool(0.05) {
                    u64::MAX / 2
                } else {
                    rng.gen_range(0..5_000)
                };
                Operation::add(amount)
            } else {
                Operation::subtract(rng.gen_range(0..500))
            }
        })
        .collect();
    if fault == InjectedFault::LengthMismatch {
        if rng.gen_bool(0.5) || operations.len() == 1 {
            operations.push(Operation::add(1));
        } else {
            operations.pop();
        }
    }

    SimulatedBatch {
        fault,
        operations,
        keys: selected,
    }
}

/// Model of the processor: the error it must report, or the new values
fn expected_outcome(
    config: &LedgerConfig,
    model: &HashMap<RecordKey, u64>,
    batch: &SimulatedBatch,
) -> Result<Vec<(RecordKey, u64)>, BatchError> {
    match batch.fault {
        InjectedFault::Unsigned => {
            return Err(BatchError::AuthorityMissing {
                reason: AuthorityFailure::Absent,
            })
        }
        InjectedFault::ForgedSignature => {
            return Err(BatchError::AuthorityMissing {
                reason: AuthorityFailure::InvalidSignature,
            })
        }
        _ => {}
    }

    if batch.operations.len() != batch.keys.len() {
        return Err(BatchError::LengthMismatch {
            operations: batch.operations.len(),
            records: batch.keys.len(),
        });
    }
    if batch.keys.len() > config.max_batch_size {
        return Err(BatchError::BatchTooLarge {
            len: batch.keys.len(),
            max: config.max_batch_size,
        });
    }

    let mut seen = HashSet::new();
    for (index, key) in batch.keys.iter().enumerate() {
        if !seen.insert(*key) {
            return Err(BatchError::DuplicateRecordInBatch {
                key: *key,
                first: batch.keys.iter().position(|k| k == key).unwrap_or(0),
                second: index,
            });
        }
    }

    for (index, op) in batch.operations.iter().enumerate() {
        if !config.is_enabled(op.kind()) {
            return Err(BatchError::UnsupportedOperation {
                index,
                kind: op.kind(),
            });
        }
    }

    batch
        .operations
        .iter()
        .zip(&batch.keys)
        .enumerate()
        .map(|(index, (op, key))| {
            let current = model.get(key).copied().unwrap_or_default();
            op.apply(current)
                .map(|next| (*key, next))
                .map_err(|fault| fault.at(index))
        })
        .collect()
}
