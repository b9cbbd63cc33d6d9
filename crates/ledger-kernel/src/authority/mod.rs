//! Batch credentials
//!
//! A credential is an ed25519 signature by the authority over the digest of
//! one exact batch.

use crate::operation::Operation;
use crate::types::{Authority, RecordKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const BATCH_DOMAIN: &[u8] = b"ledger-kernel/batch/v1";

/// Proof that `authority` signed one specific batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityCredential {
    /// Identity claimed by the signer
    pub authority: Authority,
    /// Signature over [`batch_digest`]
    pub signature: Signature,
}

impl AuthorityCredential {
    /// Sign the batch formed by `operations` over the records at `keys`
    pub fn sign(signing_key: &SigningKey, operations: &[Operation], keys: &[RecordKey]) -> Self {
        let message = batch_digest(operations, keys);
        let sig: Signature = signing_key.sign(&message);
        Self {
            authority: Authority::from(signing_key),
            signature: sig,
        }
    }

    /// Check the signature against this batch with plain ed25519
    pub fn verify(&self, operations: &[Operation], keys: &[RecordKey]) -> bool {
        let message = batch_digest(operations, keys);
        self.verify_message(&message)
    }

    pub(crate) fn verify_message(&self, message: &[u8]) -> bool {
        self.authority
            .verifying_key()
            .verify(message, &self.signature)
            .is_ok()
    }
}

/// SHA-256 over the canonical batch encoding.
///
/// Both sequences are length-prefixed, so batches whose operation and record
/// counts differ still have a well-defined digest.
pub fn batch_digest(operations: &[Operation], keys: &[RecordKey]) -> [u8; 32] {
    let mut msg = Vec::with_capacity(
        BATCH_DOMAIN.len() + 8 + operations.len() * 9 + 8 + keys.len() * 16,
    );
    msg.extend_from_slice(BATCH_DOMAIN);
    msg.extend_from_slice(&(operations.len() as u64).to_le_bytes());
    for op in operations {
        op.encode_into(&mut msg);
    }
    msg.extend_from_slice(&(keys.len() as u64).to_le_bytes());
    for key in keys {
        msg.extend_from_slice(key.as_bytes());
    }

    let mut hasher = Sha256::new();
    hasher.update(&msg);
    hasher.finalize().into()
}
