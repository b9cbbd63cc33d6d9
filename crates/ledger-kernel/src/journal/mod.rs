//! Hash-chained journal of committed changes

use crate::error::JournalError;
use crate::types::{now_timestamp, Authority};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kind of committed change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalAction {
    /// Record created
    Initialize,
    /// Batch committed
    Batch,
}

impl JournalAction {
    fn as_u8(self) -> u8 {
        match self {
            JournalAction::Initialize => 0,
            JournalAction::Batch => 1,
        }
    }
}

/// One committed state change, chained to its predecessor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the journal, from zero
    pub sequence: u64,
    /// Unix seconds
    pub timestamp: u64,
    /// What happened
    pub action: JournalAction,
    /// Who did it
    pub authority: Authority,
    /// Human-readable summary
    pub detail: String,
    /// Batch digest, or zero for initializations
    pub digest: [u8; 32],
    /// Hash of the previous entry, zero for the first
    pub prev_hash: [u8; 32],
    /// Hash of this entry
    pub hash: [u8; 32],
}

/// Append-only audit trail of committed changes. Rejected batches never
/// appear here.
#[derive(Debug, Default)]
pub struct Journal {
    inner: Mutex<Vec<JournalEntry>>,
}

impl Journal {
    /// Append an entry and return its sequence number
    pub fn record(
        &self,
        action: JournalAction,
        authority: Authority,
        detail: String,
        digest: [u8; 32],
    ) -> u64 {
        let mut guard = self.inner.lock();
        let prev_hash = guard.last().map(|e| e.hash).unwrap_or([0u8; 32]);
        let mut entry = JournalEntry {
            sequence: guard.len() as u64,
            timestamp: now_timestamp(),
            action,
            authority,
            detail,
            digest,
            prev_hash,
            hash: [0u8; 32],
        };
        entry.hash = compute_hash(&entry);
        let sequence = entry.sequence;
        guard.push(entry);
        sequence
    }

    /// Copy of every entry
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.inner.lock().clone()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True before the first entry
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Check the whole chain
    pub fn verify_integrity(&self) -> Result<(), JournalError> {
        verify_chain(&self.inner.lock())
    }
}

/// Check that every entry hashes correctly and links to its predecessor
pub fn verify_chain(entries: &[JournalEntry]) -> Result<(), JournalError> {
    let mut prev = [0u8; 32];
    for e in entries {
        if e.prev_hash != prev || e.hash != compute_hash(e) {
            return Err(JournalError::IntegrityViolation {
                sequence: e.sequence,
            });
        }
        prev = e.hash;
    }
    Ok(())
}

fn compute_hash(entry: &JournalEntry) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(entry.sequence.to_le_bytes());
    hasher.update(entry.timestamp.to_le_bytes());
    hasher.update([entry.action.as_u8()]);
    hasher.update(entry.authority.as_bytes());
    hasher.update(entry.detail.as_bytes());
    hasher.update([0]);
    hasher.update(entry.digest);
    hasher.update(entry.prev_hash);
    hasher.finalize().into()
}
