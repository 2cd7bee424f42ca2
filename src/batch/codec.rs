//! Canonical authorization message encoding.
//!
//! Every batch is authorized by signing one exact byte sequence — the
//! canonical message. Two encodings of it are in force at once:
//!
//! - **Legacy** — human-readable text assembled from per-transaction
//!   blocks. This is what a signing device displays, so every character
//!   is part of the contract: lowercase addresses, canonical decimal
//!   amounts, one blank line between blocks, nothing trailing.
//! - **Content-hash** — the lowercase hex digest (SHA-256, no prefix) of
//!   the concatenated wire bytes of every transaction, signed as ASCII.
//!   Compact, display-unfriendly, and independent of token metadata.
//!
//! Both are deterministic and order-sensitive: reorder the transactions
//! and you have a different message, and every previously collected
//! signature is garbage. That is a feature — a batch *is* its order.
//!
//! The verifier accepts either encoding for any given signature (see
//! [`crate::oracle::verify`]), which is what lets old clients and new
//! clients coexist on one network.

use serde::{Deserialize, Serialize};

use crate::crypto::eth::EthAddress;
use crate::crypto::hash::sha256_array;
use crate::token::TokenRegistry;
use crate::transaction::builder::Transaction;
use crate::config;

use super::assembler::Batch;
use super::error::BatchError;

// ---------------------------------------------------------------------------
// SigningScheme / AuthMessage
// ---------------------------------------------------------------------------

/// Which canonical encoding a message was produced under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningScheme {
    /// Human-readable per-transaction text blocks.
    Legacy,
    /// Hex digest over concatenated transaction wire bytes.
    ContentHash,
}

/// The exact bytes every required signer signs to authorize a batch.
///
/// Tagged with its scheme so downstream code never has to guess what it
/// is holding. The bytes are final: no re-encoding, no normalization,
/// signers sign them verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthMessage {
    /// The encoding this message was produced under.
    pub scheme: SigningScheme,
    bytes: Vec<u8>,
}

impl AuthMessage {
    /// The raw message bytes to be signed.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The message as text. Both encodings happen to be valid UTF-8 —
    /// legacy is prose, content-hash is hex — so this is mainly for
    /// logging and signing-device display.
    pub fn as_text(&self) -> &str {
        // Constructed only from String/hex in this module.
        std::str::from_utf8(&self.bytes).unwrap_or("<non-utf8 message>")
    }
}

// ---------------------------------------------------------------------------
// MessageCodec
// ---------------------------------------------------------------------------

/// Derives canonical authorization messages for batches.
///
/// Owns a [`TokenRegistry`] handle because the legacy encoding renders
/// amounts in display units — token metadata is the one external input
/// the message depends on.
#[derive(Clone, Debug)]
pub struct MessageCodec {
    registry: TokenRegistry,
}

impl MessageCodec {
    /// A codec resolving token metadata through the given registry.
    pub fn new(registry: TokenRegistry) -> Self {
        Self { registry }
    }

    /// Access to the underlying registry.
    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    /// Encode the canonical authorization message for a batch.
    ///
    /// Under [`SigningScheme::Legacy`], a batch spanning multiple signer
    /// accounts produces the shared combined message that *every* signer
    /// signs in full; a single-signer batch produces that signer's own
    /// block sequence. Under [`SigningScheme::ContentHash`], every signer
    /// signs the same hex digest regardless of batch shape.
    pub fn encode(&self, batch: &Batch, scheme: SigningScheme) -> Result<AuthMessage, BatchError> {
        let bytes = match scheme {
            SigningScheme::Legacy => {
                if batch.required_signers().len() > 1 {
                    self.shared_legacy_message(batch)?.into_bytes()
                } else {
                    // Sole signer: required_signers is never empty for a
                    // constructed Batch.
                    self.signer_message(batch, &batch.required_signers()[0])?
                        .into_bytes()
                }
            }
            SigningScheme::ContentHash => Self::content_hash_hex(batch).into_bytes(),
        };
        tracing::debug!(
            scheme = ?scheme,
            transactions = batch.len(),
            message_len = bytes.len(),
            "encoded batch authorization message"
        );
        Ok(AuthMessage { scheme, bytes })
    }

    /// The shared legacy message: one `From:`-headed block per transaction
    /// in batch order, joined by a blank line. Used whenever a batch spans
    /// independent accounts and all of them co-sign the same text.
    pub fn shared_legacy_message(&self, batch: &Batch) -> Result<String, BatchError> {
        let blocks = batch
            .transactions()
            .iter()
            .map(|tx| {
                Ok(format!(
                    "From: {}\n{}\nNonce: {}",
                    tx.from.to_hex(),
                    self.tx_description(tx)?,
                    tx.nonce
                ))
            })
            .collect::<Result<Vec<_>, BatchError>>()?;
        Ok(blocks.join(config::AUTH_BLOCK_SEPARATOR))
    }

    /// The legacy per-signer message: the full template blocks of only
    /// that signer's transactions, in batch order. This is the text a
    /// single-account client has always signed, and the verifier still
    /// honors it for compatibility.
    pub fn signer_message(&self, batch: &Batch, signer: &EthAddress) -> Result<String, BatchError> {
        let blocks = batch
            .transactions()
            .iter()
            .filter(|tx| tx.from == *signer)
            .map(|tx| self.tx_block(tx))
            .collect::<Result<Vec<_>, BatchError>>()?;
        if blocks.is_empty() {
            return Err(BatchError::configuration(format!(
                "{} originates no transaction in this batch",
                signer
            )));
        }
        Ok(blocks.join(config::AUTH_BLOCK_SEPARATOR))
    }

    /// The content-hash message text: lowercase hex of the SHA-256 digest
    /// over every transaction's wire bytes, concatenated in batch order.
    /// No `sha256:` prefix, no `0x` — the bare 64 hex characters are the
    /// message.
    pub fn content_hash_hex(batch: &Batch) -> String {
        hex::encode(sha256_array(&batch.wire_bytes()))
    }

    /// Full per-transaction template, nonce inline — the block format of
    /// the per-signer legacy message.
    fn tx_block(&self, tx: &Transaction) -> Result<String, BatchError> {
        let info = self.registry.resolve(tx.token)?;
        let amount = crate::token::format_units(tx.amount, info.decimals);
        let fee = crate::token::format_units(tx.fee, info.decimals);
        Ok(format!(
            "{kind} {amount} {symbol}\nTo: {to}\nNonce: {nonce}\nFee: {fee} {symbol}\nAccount Id: {account}",
            kind = tx.kind,
            amount = amount,
            symbol = info.symbol,
            to = tx.to.to_hex(),
            nonce = tx.nonce,
            fee = fee,
            account = tx.account_id,
        ))
    }

    /// Kind-specific description without the nonce line — the middle of a
    /// shared-message block, where the nonce is appended by the wrapper.
    fn tx_description(&self, tx: &Transaction) -> Result<String, BatchError> {
        let info = self.registry.resolve(tx.token)?;
        let amount = crate::token::format_units(tx.amount, info.decimals);
        let fee = crate::token::format_units(tx.fee, info.decimals);
        Ok(format!(
            "{kind} {amount} {symbol}\nTo: {to}\nFee: {fee} {symbol}\nAccount Id: {account}",
            kind = tx.kind,
            amount = amount,
            symbol = info.symbol,
            to = tx.to.to_hex(),
            fee = fee,
            account = tx.account_id,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
