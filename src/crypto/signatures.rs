//! # Account-Layer Signature Operations
//!
//! Free-function wrappers over [`VelaKeypair`] signing and verification.
//!
//! ## Why not just call the methods directly?
//!
//! Internal code often does. The wrappers exist because:
//!
//! 1. They give audits a single place to find every signing operation.
//! 2. `verify_raw` handles the bytes-off-the-wire case without making
//!    callers round-trip through the typed structs.
//! 3. `batch_verify` is the natural seam for a real batched verifier
//!    later, without changing any call site.

use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};
use thiserror::Error;

use super::keys::{VelaKeypair, VelaPublicKey, VelaSignature};

/// Errors during signature operations.
///
/// Intentionally vague — we don't tell attackers why verification failed.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signature verification failed")]
    VerificationFailed,

    #[error("invalid public key")]
    InvalidPublicKey,
}

/// Sign a message using an account-layer keypair.
pub fn sign(keypair: &VelaKeypair, message: &[u8]) -> VelaSignature {
    keypair.sign(message)
}

/// Verify an Ed25519 signature against a public key and message.
///
/// Returns `true` if valid, `false` otherwise — "bad signature" and
/// "wrong key" are deliberately indistinguishable.
pub fn verify(public_key: &VelaPublicKey, message: &[u8], signature: &VelaSignature) -> bool {
    public_key.verify(message, signature)
}

/// Verify a signature from raw byte components.
///
/// The "I got these bytes off the wire and need to check them" variant.
pub fn verify_raw(
    public_key_bytes: &[u8; 32],
    message: &[u8],
    signature_bytes: &[u8; 64],
) -> Result<(), SignatureError> {
    let verifying_key =
        VerifyingKey::from_bytes(public_key_bytes).map_err(|_| SignatureError::InvalidPublicKey)?;
    let signature = DalekSignature::from_bytes(signature_bytes);
    verifying_key
        .verify(message, &signature)
        .map_err(|_| SignatureError::VerificationFailed)
}

/// Verify a set of (key, message, signature) triples.
///
/// All signatures must be valid for this to return `Ok`. If any single one
/// fails, the whole set fails — we don't say which. Callers that need to
/// know the offender (rejection messages name the transaction) verify
/// individually instead.
pub fn batch_verify(
    items: &[(VelaPublicKey, Vec<u8>, VelaSignature)],
) -> Result<(), SignatureError> {
    // Sequential for now. For batch sizes this protocol allows (<= 50 txs)
    // the difference to a randomized-linear-combination verifier is noise.
    for (pubkey, message, signature) in items {
        if !verify(pubkey, message, signature) {
            return Err(SignatureError::VerificationFailed);
        }
    }
    Ok(())
}
