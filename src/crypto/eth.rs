//! # Root-Chain Keys and Signatures
//!
//! The authorization layer that batches ultimately rest on. Every VELA
//! account is anchored to a root-chain identity: a secp256k1 keypair whose
//! address is the last 20 bytes of the Keccak-256 digest of the
//! uncompressed public key — exactly the derivation the root chain itself
//! uses, so a hardware wallet and this module always agree on who you are.
//!
//! ## Signature layout
//!
//! Root-chain signatures are *recoverable* ECDSA, packed as `r ‖ s ‖ v` in
//! 65 bytes. The recovery byte `v` (27 or 28) lets a verifier reconstruct
//! the signer's public key from the signature alone, which is why the
//! oracle can check a signature against an **address** without any key
//! registry for the root layer.
//!
//! ## Personal-message convention
//!
//! Messages are never signed raw. They are wrapped with the root chain's
//! personal-message prefix and the message byte length, then hashed with
//! Keccak-256. The wrapping is what keeps an authorization message from
//! doubling as a valid raw root-chain transaction.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config;
use crate::crypto::hash::keccak256;

/// Errors from root-chain key and signature operations.
#[derive(Debug, Error)]
pub enum EthKeyError {
    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("invalid address: expected 20 bytes of hex, optionally 0x-prefixed")]
    InvalidAddress,

    #[error("malformed signature: expected 65 bytes r‖s‖v with v in {{27, 28}}")]
    MalformedSignature,

    #[error("signer recovery failed")]
    RecoveryFailed,
}

// ---------------------------------------------------------------------------
// EthAddress
// ---------------------------------------------------------------------------

/// A 20-byte root-chain address.
///
/// Displayed and serialized as lowercase `0x`-prefixed hex. Lowercase is
/// load-bearing: the human-readable authorization message embeds addresses,
/// and a checksummed rendering would change the signed bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EthAddress([u8; 20]);

impl EthAddress {
    /// Create an address from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive the address of a secp256k1 public key: the last 20 bytes of
    /// `keccak256(uncompressed_pubkey_without_the_0x04_tag)`.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let uncompressed = public_key.serialize_uncompressed();
        let digest = keccak256(&uncompressed[1..]);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }

    /// The all-zero address. Fee schedules use it as the "any account"
    /// placeholder in quote requests.
    pub fn zero() -> Self {
        Self([0u8; 20])
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase hex with the `0x` prefix — the canonical rendering used
    /// inside authorization messages.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for EthAddress {
    type Err = EthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| EthKeyError::InvalidAddress)?;
        if bytes.len() != config::ETH_ADDRESS_LENGTH {
            return Err(EthKeyError::InvalidAddress);
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthAddress({})", self.to_hex())
    }
}

impl Serialize for EthAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EthAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(DeError::custom)
    }
}

// ---------------------------------------------------------------------------
// EthSignature
// ---------------------------------------------------------------------------

/// A packed 65-byte recoverable root-chain signature, `r ‖ s ‖ v`.
///
/// Carries no validity on its own: it only means something once matched
/// against a message and the address it is supposed to authorize.
#[derive(Clone, PartialEq, Eq)]
pub struct EthSignature([u8; 65]);

impl EthSignature {
    /// Wrap raw packed bytes. No validation happens here — an all-zero
    /// signature is representable on purpose, it just never verifies.
    pub fn from_bytes(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }

    /// A zero-filled signature of the correct packed length. Syntactically
    /// a signature, cryptographically garbage. Exists so rejection paths
    /// can be exercised end to end.
    pub fn placeholder() -> Self {
        Self([0u8; 65])
    }

    /// Raw packed bytes.
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// Hex-encoded signature, 130 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hex-encoded packed signature.
    pub fn from_hex(s: &str) -> Result<Self, EthKeyError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| EthKeyError::MalformedSignature)?;
        if bytes.len() != config::ETH_SIGNATURE_LENGTH {
            return Err(EthKeyError::MalformedSignature);
        }
        let mut arr = [0u8; 65];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for EthSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        write!(f, "EthSignature({}...{})", &hex_str[..8], &hex_str[122..])
    }
}

impl Serialize for EthSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EthSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(DeError::custom)
    }
}

// ---------------------------------------------------------------------------
// EthSigner
// ---------------------------------------------------------------------------

/// A root-chain keypair capable of producing packed recoverable signatures.
///
/// This is the key that authorizes batches. In production it lives in a
/// hardware wallet or a remote signer behind the
/// [`EthMessageSigner`](crate::batch::collector::EthMessageSigner) trait;
/// this in-process implementation backs tests, the demo, and devnets.
#[derive(Clone)]
pub struct EthSigner {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl EthSigner {
    /// Generate a fresh random signer.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Build a signer from an existing secret key.
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Build a signer from a hex-encoded private key.
    pub fn from_hex(hex_key: &str) -> Result<Self, EthKeyError> {
        let stripped = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let bytes = hex::decode(stripped).map_err(|_| EthKeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| EthKeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// The root-chain address controlled by this signer.
    pub fn address(&self) -> EthAddress {
        EthAddress::from_public_key(&self.public_key)
    }

    /// Sign an authorization message under the personal-message convention.
    ///
    /// The message is prefix-wrapped, Keccak-hashed, and signed with
    /// recoverable ECDSA. The recovery id lands in the final byte as
    /// `27 + recid`.
    pub fn sign_message(&self, message: &[u8]) -> EthSignature {
        let secp = Secp256k1::new();
        let digest = personal_message_hash(message);
        let msg = Message::from_digest(digest);
        let recoverable = secp.sign_ecdsa_recoverable(&msg, &self.secret_key);
        let (recovery_id, compact) = recoverable.serialize_compact();

        let mut packed = [0u8; 65];
        packed[..64].copy_from_slice(&compact);
        packed[64] = 27 + recovery_id.to_i32() as u8;
        EthSignature(packed)
    }
}

impl fmt::Debug for EthSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthSigner({})", self.address())
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Hash a message under the root chain's personal-message convention:
/// `keccak256(PREFIX ‖ decimal_byte_length ‖ message)`.
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut wrapped =
        Vec::with_capacity(config::PERSONAL_MESSAGE_PREFIX.len() + 20 + message.len());
    wrapped.extend_from_slice(config::PERSONAL_MESSAGE_PREFIX.as_bytes());
    wrapped.extend_from_slice(message.len().to_string().as_bytes());
    wrapped.extend_from_slice(message);
    keccak256(&wrapped)
}

/// Recover the address that signed `message` from a packed signature.
///
/// Fails on a malformed recovery byte, an out-of-range scalar (the all-zero
/// placeholder lands here), or a digest/signature pair that recovers to no
/// valid curve point.
pub fn recover_signer(message: &[u8], signature: &EthSignature) -> Result<EthAddress, EthKeyError> {
    let bytes = signature.as_bytes();
    let v = bytes[64];
    if v != 27 && v != 28 {
        return Err(EthKeyError::MalformedSignature);
    }
    let recovery_id =
        RecoveryId::from_i32((v - 27) as i32).map_err(|_| EthKeyError::MalformedSignature)?;
    let recoverable = RecoverableSignature::from_compact(&bytes[..64], recovery_id)
        .map_err(|_| EthKeyError::MalformedSignature)?;

    let secp = Secp256k1::new();
    let digest = personal_message_hash(message);
    let msg = Message::from_digest(digest);
    let public_key = secp
        .recover_ecdsa(&msg, &recoverable)
        .map_err(|_| EthKeyError::RecoveryFailed)?;

    Ok(EthAddress::from_public_key(&public_key))
}

/// Check a packed signature against the address it is supposed to
/// authorize. Any recovery failure is simply `false` — the caller never
/// needs to know which way it was wrong.
pub fn verify_eth_signature(
    message: &[u8],
    signature: &EthSignature,
    expected: &EthAddress,
) -> bool {
    matches!(recover_signer(message, signature), Ok(addr) if addr == *expected)
}
