//! Error types for the batch authorization flow.
//!
//! One enum, exhaustive over the failure modes of assembly, collection,
//! submission, and oracle-side verification. The split that matters is
//! local versus oracle-reported: `Configuration` is always raised before
//! any network interaction, everything else is a rejection of a submission
//! that already left the building.

use thiserror::Error;

use crate::token::TokenError;
use crate::transaction::types::AccountId;

/// Errors that can occur during the batch authorization flow.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Malformed batch construction: insufficient participants, a fee on a
    /// non-designated account, a mismatched signer set. Local and fatal to
    /// the attempt; never sent to the oracle.
    #[error("batch configuration error: {reason}")]
    Configuration {
        /// What exactly was wrong with the batch.
        reason: String,
    },

    /// A required root-chain signature failed verification. The whole
    /// batch is rejected; no transaction executes. Carries the oracle's
    /// message text verbatim.
    #[error("{message}")]
    SignatureMismatch {
        /// The oracle's rejection text.
        message: String,
    },

    /// Execution time fell outside a transaction's validity window.
    #[error("transaction {tx_hash} expired: valid until {valid_until}, now {now}")]
    ValidityExpired {
        /// Hash of the offending transaction.
        tx_hash: String,
        /// The transaction's deadline.
        valid_until: u64,
        /// The oracle's clock at rejection time.
        now: u64,
    },

    /// A transaction's nonce does not match the account's expected next
    /// value. The nonce is burned either way — retry means rebuild.
    #[error("nonce conflict for account {account}: expected {expected}, got {got}")]
    NonceConflict {
        /// The account whose sequence was violated.
        account: AccountId,
        /// The nonce the oracle expected next.
        expected: u32,
        /// The nonce the transaction carried.
        got: u32,
    },

    /// A transaction's account-layer signature is missing or does not
    /// verify against the origin account's registered key.
    #[error("account signature invalid for transaction {tx_hash}")]
    AccountSignatureInvalid {
        /// Hash of the offending transaction.
        tx_hash: String,
    },

    /// An origin or destination account is not registered with the oracle.
    #[error("unknown account: {address}")]
    UnknownAccount {
        /// The unrecognized address, in canonical hex.
        address: String,
    },

    /// An origin account cannot cover its debits.
    #[error(
        "insufficient funds for account {account}: required {required}, available {available}"
    )]
    InsufficientFunds {
        /// The underfunded account.
        account: AccountId,
        /// Total debit the batch asked of it.
        required: u128,
        /// What it actually holds.
        available: u128,
    },

    /// Token metadata resolution failed while rendering the authorization
    /// message.
    #[error("token resolution failed: {0}")]
    Token(#[from] TokenError),

    /// The submission call itself failed: connection loss, a closed
    /// receipt channel, an oracle that went away mid-await.
    #[error("transport error: {reason}")]
    Transport {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl BatchError {
    /// Shorthand for a [`BatchError::Configuration`].
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors raised locally before any network
    /// interaction.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Token(_))
    }
}
