//! # Protocol Configuration & Constants
//!
//! Every magic number in VELA lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Several of these values are wire contracts shared with the verification
//! oracle and with every deployed client version. Changing them breaks
//! signature verification for batches that are already in flight, so they
//! are frozen for the lifetime of a protocol major version.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Major version — bump on changes that break canonical message encoding.
pub const PROTOCOL_VERSION_MAJOR: u16 = 0;

/// Minor version — bump on backward-compatible additions.
pub const PROTOCOL_VERSION_MINOR: u16 = 1;

/// The full version string, assembled by hand so we don't allocate for
/// something this trivial at runtime.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// The VELA account layer signs with Ed25519. Deterministic, compact,
/// and the verification cost is low enough to check every transaction
/// in a batch without thinking about it.
pub const L2_SIGNING_ALGORITHM: &str = "Ed25519";

/// Ed25519 signature length. Always 64 bytes.
pub const L2_SIGNATURE_LENGTH: usize = 64;

/// Root-chain signatures are recoverable secp256k1 ECDSA in the packed
/// `r ‖ s ‖ v` layout, 65 bytes. The recovery byte is what lets the oracle
/// check a signature against an address instead of a public key.
pub const ETH_SIGNATURE_LENGTH: usize = 65;

/// Root-chain addresses are the last 20 bytes of the Keccak-256 digest of
/// the uncompressed public key.
pub const ETH_ADDRESS_LENGTH: usize = 20;

/// All digests in the protocol are 32 bytes (SHA-256 and Keccak-256 alike).
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Prefix prepended (with the message byte length) before hashing a
/// root-chain authorization message. Identical to the root chain's
/// personal-message convention so hardware signers display it verbatim.
pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

// ---------------------------------------------------------------------------
// Canonical Message Encoding
// ---------------------------------------------------------------------------

/// Separator between human-readable authorization blocks. One blank line,
/// exactly. Two transactions, one blank line, no trailing separator.
pub const AUTH_BLOCK_SEPARATOR: &str = "\n\n";

/// Rejection text the oracle returns when any required root-chain signature
/// fails verification. This string is a wire contract: clients match on it,
/// so it must never be reworded.
pub const ETH_SIGNATURE_REJECTION: &str = "Eth signature is incorrect";

// ---------------------------------------------------------------------------
// Validity Windows
// ---------------------------------------------------------------------------

/// Sentinel for "valid forever". A transaction built without an explicit
/// deadline gets this as its `valid_until`.
pub const MAX_VALID_UNTIL: u64 = u64::MAX;

/// Default `valid_from`. Zero means "valid since the beginning of time",
/// which is what almost every transaction wants.
pub const MIN_VALID_FROM: u64 = 0;

// ---------------------------------------------------------------------------
// Fee Parameters
// ---------------------------------------------------------------------------

/// Fees travel the wire in a reduced-precision encoding: an 11-bit mantissa
/// and a 5-bit base-10 exponent. 11 bits of mantissa keeps fee granularity
/// well under 0.1% while shaving bytes off every transaction.
pub const FEE_MANTISSA_BITS: u32 = 11;

/// Exponent width for the packed fee encoding.
pub const FEE_EXPONENT_BITS: u32 = 5;

/// The packed fee exponent is a power of ten, not two. Fees are quoted in
/// decimal by everything upstream of us; a binary exponent would force
/// rounding on nearly every value.
pub const FEE_EXPONENT_BASE: u128 = 10;

/// Safety multiplier applied to oracle fee quotes by the wallet layer.
/// Quotes go stale between the query and the submission; paying 3x the
/// floor guarantees the batch clears without a re-quote round trip.
pub const FEE_FACTOR: u64 = 3;

// ---------------------------------------------------------------------------
// Batch Limits
// ---------------------------------------------------------------------------

/// A batch must involve at least this many distinct accounts. A single
/// account batching with itself is just a transaction list — use the
/// plain submission path for that.
pub const MIN_BATCH_PARTICIPANTS: usize = 2;

/// Upper bound on transactions per batch. Keeps the legacy human-readable
/// message small enough to display on a signing device.
pub const MAX_BATCH_TRANSACTIONS: usize = 50;

// ---------------------------------------------------------------------------
// Receipt Timing
// ---------------------------------------------------------------------------

/// How long the in-process ledger waits before marking an accepted
/// transaction as committed. Small on purpose — integration tests await
/// full confirmation thousands of times.
pub const COMMIT_LATENCY: Duration = Duration::from_millis(5);

/// Additional delay between the committed and finalized receipt stages.
pub const FINALITY_LATENCY: Duration = Duration::from_millis(10);
