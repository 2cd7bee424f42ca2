//! # Hashing Utilities
//!
//! Two hash functions, two jobs, no exceptions:
//!
//! - **SHA-256** — content digests inside the VELA layer: transaction
//!   hashes and the content-hash form of the batch authorization message.
//! - **Keccak-256** — everything that has to agree with the root chain:
//!   address derivation and personal-message hashing. Note this is the
//!   original Keccak, not the padded FIPS-202 SHA-3 variant; the two
//!   disagree on every input, so mixing them up fails loudly.
//!
//! Anything else that wants a digest should be rethought until it wants
//! one of these two.

use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// Compute the SHA-256 hash of the input data.
///
/// Returns a 32-byte digest as a `Vec<u8>`. Most callers immediately feed
/// the result to `hex::encode` or concatenate it into another buffer, so
/// the heap allocation is noise compared to the hash itself.
///
/// # Example
///
/// ```
/// use vela_protocol::crypto::sha256;
///
/// let digest = sha256(b"VELA protocol");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Compute the SHA-256 hash and return a fixed-size array.
///
/// Same as [`sha256`] but without the allocation, for callers where the
/// array type propagates naturally (transaction hashes, map keys).
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the Keccak-256 hash of the input data.
///
/// Root-chain compatible: this is the digest the root chain uses for
/// address derivation and signed-message hashing.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}
