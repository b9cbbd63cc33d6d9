//! Core identifiers and records

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable address of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey(pub Uuid);

impl RecordKey {
    /// Generate a fresh key
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Raw UUID bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for RecordKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier assigned to every batch invocation, used in logs and receipts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    /// Fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity allowed to sign batches. Wraps the ed25519 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Authority(pub VerifyingKey);

impl Authority {
    /// Underlying ed25519 key
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }

    /// Raw public key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl From<&SigningKey> for Authority {
    fn from(signing_key: &SigningKey) -> Self {
        Self(signing_key.verifying_key())
    }
}

impl From<VerifyingKey> for Authority {
    fn from(value: VerifyingKey) -> Self {
        Self(value)
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_bytes()))
    }
}

/// A persisted counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Stable address
    pub key: RecordKey,
    /// Current value
    pub value: u64,
    /// Identity that created the record
    pub authority: Authority,
}

/// Caller-side reference to a record taking part in a batch
///
/// The environment resolves each reference into a
/// [`RecordHandle`](crate::batch::RecordHandle) before the batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    /// Record to resolve
    pub key: RecordKey,
    /// Whether the batch may change it
    pub writable: bool,
}

impl RecordRef {
    /// Reference with write access
    pub fn writable(key: RecordKey) -> Self {
        Self { key, writable: true }
    }

    /// Reference without write access
    pub fn readonly(key: RecordKey) -> Self {
        Self {
            key,
            writable: false,
        }
    }
}

pub(crate) fn now_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
