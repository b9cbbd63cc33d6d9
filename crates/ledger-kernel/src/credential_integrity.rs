//! Credential Integrity Verification
//!
//! Runtime check that a batch is covered by a valid authority signature.
//! Performed exactly once per batch, before any other validation.
//!
//! Checks performed:
//! - A credential is present
//! - Its signature covers this exact batch (operations, record keys, order)
//!
//! Whether the signer also controls each record is a separate, optional
//! check made by the batch processor.

use crate::authority::{batch_digest, AuthorityCredential};
use crate::error::{AuthorityFailure, BatchError};
use crate::operation::Operation;
use crate::types::{Authority, RecordKey};

/// Signature verification primitive provided by the execution environment
pub trait CredentialVerifier: Send + Sync {
    /// Return `true` when `credential` is a valid signature over `message`
    fn verify(&self, credential: &AuthorityCredential, message: &[u8]) -> bool;
}

/// Default verifier: plain ed25519
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl CredentialVerifier for Ed25519Verifier {
    fn verify(&self, credential: &AuthorityCredential, message: &[u8]) -> bool {
        credential.verify_message(message)
    }
}

/// Once-per-batch credential check
pub struct CredentialIntegrity;

impl CredentialIntegrity {
    /// Verify the credential for a batch and return the proven authority
    pub fn verify(
        credential: Option<&AuthorityCredential>,
        verifier: &dyn CredentialVerifier,
        operations: &[Operation],
        keys: &[RecordKey],
    ) -> Result<Authority, BatchError> {
        let credential = credential.ok_or(BatchError::AuthorityMissing {
            reason: AuthorityFailure::Absent,
        })?;

        let message = batch_digest(operations, keys);
        if verifier.verify(credential, &message) {
            Ok(credential.authority)
        } else {
            Err(BatchError::AuthorityMissing {
                reason: AuthorityFailure::InvalidSignature,
            })
        }
    }
}
