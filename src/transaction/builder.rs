//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] enforces a disciplined construction flow:
//! set the semantic fields, call `.build()`, and get back an unsigned
//! [`Transaction`] whose canonical byte forms are already determined.
//!
//! The builder does not sign — that happens in [`super::signing`]. This
//! separation keeps construction testable without key material.

use serde::{Deserialize, Serialize};

use crate::crypto::eth::EthAddress;
use crate::crypto::hash::sha256_array;
use crate::crypto::keys::VelaSignature;
use crate::token::TokenId;

use super::types::{AccountId, TimeRange, TxKind};

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A VELA account-layer transaction.
///
/// Immutable once signed: every byte that follows from these fields is
/// fixed the moment the account-layer signature lands, because both the
/// content-hash authorization message and the oracle's independent
/// recomputation of it serialize the transaction verbatim.
///
/// # Canonical Byte Forms
///
/// Two serializations, two jobs:
///
/// - [`Transaction::signable_bytes`] — every field *except* the signature.
///   Input to account-layer signing and to [`Transaction::tx_hash`].
/// - [`Transaction::wire_bytes`] — `signable_bytes` plus the signature.
///   The submission payload, and the exact bytes the content-hash batch
///   encoding digests.
///
/// Amount and fee are serialized as ASCII decimal strings rather than
/// fixed-width integers. The wire format predates 128-bit amounts and a
/// decimal string was the one encoding every client language agreed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The operation this transaction performs.
    #[serde(rename = "type")]
    pub kind: TxKind,

    /// Origin account's index in the VELA state tree.
    #[serde(rename = "accountId")]
    pub account_id: AccountId,

    /// Origin address.
    pub from: EthAddress,

    /// Destination: another VELA account for transfers, a root-chain
    /// address for withdrawals. Same 20-byte shape either way.
    pub to: EthAddress,

    /// Token being moved.
    pub token: TokenId,

    /// Amount in the token's minor unit.
    #[serde(with = "decimal_string")]
    pub amount: u128,

    /// Fee in the same unit as `amount`. Zero for every transaction in a
    /// batch except the designated payer's.
    #[serde(with = "decimal_string")]
    pub fee: u128,

    /// Per-account sequence number, consumed exactly once.
    pub nonce: u32,

    /// Execution validity window.
    #[serde(rename = "validFrom")]
    pub valid_from: u64,

    /// See `valid_from`.
    #[serde(rename = "validUntil")]
    pub valid_until: u64,

    /// Account-layer signature over [`Transaction::signable_bytes`].
    /// `None` for unsigned transactions fresh from the builder.
    pub signature: Option<VelaSignature>,
}

impl Transaction {
    /// Returns the canonical byte representation used for account-layer
    /// signing and hashing.
    ///
    /// Deterministic concatenation: display-form tag strings and decimal
    /// amounts are null-terminated, fixed-width integers are little-endian,
    /// addresses are their raw 20 bytes. serde is intentionally not
    /// involved — field order in a serialization format is not a contract
    /// we want to depend on for signed bytes.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128);

        buf.extend_from_slice(self.kind.to_string().as_bytes());
        buf.push(0x00);

        buf.extend_from_slice(&self.account_id.0.to_le_bytes());
        buf.extend_from_slice(self.from.as_bytes());
        buf.extend_from_slice(self.to.as_bytes());
        buf.extend_from_slice(&self.token.0.to_le_bytes());

        buf.extend_from_slice(self.amount.to_string().as_bytes());
        buf.push(0x00);
        buf.extend_from_slice(self.fee.to_string().as_bytes());
        buf.push(0x00);

        buf.extend_from_slice(&self.nonce.to_le_bytes());
        buf.extend_from_slice(&self.valid_from.to_le_bytes());
        buf.extend_from_slice(&self.valid_until.to_le_bytes());

        buf
    }

    /// Returns the full wire serialization: signable bytes followed by a
    /// presence flag and the 64-byte account-layer signature.
    ///
    /// This is the per-transaction input to the content-hash batch
    /// encoding, so its layout is as frozen as the signature scheme itself.
    pub fn wire_bytes(&self) -> Vec<u8> {
        let mut buf = self.signable_bytes();
        match &self.signature {
            Some(sig) => {
                buf.push(0x01);
                buf.extend_from_slice(sig.as_bytes());
            }
            None => buf.push(0x00),
        }
        buf
    }

    /// Transaction hash: SHA-256 over the signable bytes, hex-encoded.
    /// Stable across signing — compute it before or after, same answer.
    pub fn tx_hash(&self) -> String {
        hex::encode(sha256_array(&self.signable_bytes()))
    }

    /// Returns the validity window as a [`TimeRange`].
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.valid_from, self.valid_until)
    }

    /// Returns `true` if the transaction carries an account-layer signature.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`Transaction`] values.
///
/// ```
/// use vela_protocol::transaction::{TransactionBuilder, TxKind, AccountId};
/// use vela_protocol::token::TokenId;
/// use vela_protocol::crypto::EthAddress;
///
/// let tx = TransactionBuilder::new(TxKind::Transfer)
///     .account_id(AccountId(7))
///     .from(EthAddress::zero())
///     .to(EthAddress::zero())
///     .token(TokenId(1))
///     .amount(1_500_000)
///     .fee(0)
///     .nonce(3)
///     .build();
/// assert!(!tx.is_signed());
/// ```
///
/// The validity window defaults to the open window; override with
/// [`TransactionBuilder::valid_between`] or [`TransactionBuilder::deadline`].
pub struct TransactionBuilder {
    kind: TxKind,
    account_id: AccountId,
    from: EthAddress,
    to: EthAddress,
    token: TokenId,
    amount: u128,
    fee: u128,
    nonce: u32,
    time_range: TimeRange,
}

impl TransactionBuilder {
    /// Creates a new builder for the given transaction kind.
    pub fn new(kind: TxKind) -> Self {
        Self {
            kind,
            account_id: AccountId::default(),
            from: EthAddress::zero(),
            to: EthAddress::zero(),
            token: TokenId::default(),
            amount: 0,
            fee: 0,
            nonce: 0,
            time_range: TimeRange::open(),
        }
    }

    /// Sets the origin account index.
    pub fn account_id(mut self, account_id: AccountId) -> Self {
        self.account_id = account_id;
        self
    }

    /// Sets the origin address.
    pub fn from(mut self, from: EthAddress) -> Self {
        self.from = from;
        self
    }

    /// Sets the destination address.
    pub fn to(mut self, to: EthAddress) -> Self {
        self.to = to;
        self
    }

    /// Sets the token being moved.
    pub fn token(mut self, token: TokenId) -> Self {
        self.token = token;
        self
    }

    /// Sets the amount, in minor units.
    pub fn amount(mut self, amount: u128) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the fee, in minor units.
    pub fn fee(mut self, fee: u128) -> Self {
        self.fee = fee;
        self
    }

    /// Sets the origin account's nonce.
    pub fn nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }

    /// Sets an explicit validity window.
    pub fn valid_between(mut self, valid_from: u64, valid_until: u64) -> Self {
        self.time_range = TimeRange::new(valid_from, valid_until);
        self
    }

    /// Sets only the deadline, keeping `valid_from` at zero.
    pub fn deadline(mut self, valid_until: u64) -> Self {
        self.time_range = TimeRange::until(valid_until);
        self
    }

    /// Consumes the builder and produces an unsigned [`Transaction`].
    pub fn build(self) -> Transaction {
        Transaction {
            kind: self.kind,
            account_id: self.account_id,
            from: self.from,
            to: self.to,
            token: self.token,
            amount: self.amount,
            fee: self.fee,
            nonce: self.nonce,
            valid_from: self.time_range.valid_from,
            valid_until: self.time_range.valid_until,
            signature: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde helper: u128 as decimal string
// ---------------------------------------------------------------------------

/// JSON serialization of minor-unit amounts as decimal strings.
///
/// Not every consumer of the RPC payload has a 128-bit integer type, and
/// the ones that do don't agree on how to put one in JSON. Strings it is.
mod decimal_string {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<u128>().map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
