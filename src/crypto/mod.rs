//! # Cryptographic Primitives
//!
//! Everything security-related in the protocol bottoms out here. Two key
//! layers, two hash functions, zero hand-rolled math:
//!
//! - **keys / signatures** — the Ed25519 account layer. One keypair per
//!   VELA account; signs individual transactions.
//! - **eth** — the secp256k1 root-chain layer. One keypair per root-chain
//!   identity; authorizes whole batches via recoverable signatures.
//! - **hash** — SHA-256 for protocol-internal digests, Keccak-256 for
//!   anything that must agree with the root chain.
//!
//! The split matters: compromising an account-layer key lets an attacker
//! move funds already on VELA, but batch authorization still requires the
//! root-chain key. Keep them apart.

pub mod eth;
pub mod hash;
pub mod keys;
pub mod signatures;

pub use eth::{
    personal_message_hash, recover_signer, verify_eth_signature, EthAddress, EthSignature,
    EthSigner,
};
pub use hash::{keccak256, sha256, sha256_array};
pub use keys::{KeyError, VelaKeypair, VelaPublicKey, VelaSignature};
pub use signatures::{batch_verify, sign, verify, verify_raw, SignatureError};
