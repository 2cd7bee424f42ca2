//! Batch assembly: intents in, an ordered authorization unit out.
//!
//! The assembler answers two questions the rest of the flow depends on:
//! *who must sign* (every distinct origin account, and nobody else) and
//! *who pays* (exactly one designated account carries the whole batch fee,
//! everyone else rides at fee zero). It also owns the ordering: batches
//! are sequences, not sets, because both canonical message encodings are
//! order-sensitive.
//!
//! The flow is two-phase. [`BatchAssembler`] works on unsigned
//! [`TransferIntent`]s and allocates fees; the caller then builds and
//! signs one transaction per intent and seals them into a [`Batch`].

use serde::{Deserialize, Serialize};

use crate::config;
use crate::crypto::eth::EthAddress;
use crate::token::TokenId;
use crate::transaction::builder::Transaction;
use crate::transaction::types::TxKind;

use super::error::BatchError;

// ---------------------------------------------------------------------------
// TransferIntent
// ---------------------------------------------------------------------------

/// One not-yet-built entry of a batch: the semantic fields of a transfer
/// or withdrawal, before nonces, windows, and signatures exist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    /// What kind of transaction this intent becomes.
    pub kind: TxKind,
    /// Origin address.
    pub from: EthAddress,
    /// Destination address (a VELA account, or a root-chain address for
    /// withdrawals).
    pub to: EthAddress,
    /// Token being moved.
    pub token: TokenId,
    /// Amount in minor units.
    pub amount: u128,
    /// Fee in minor units. Zero until [`BatchAssembler::allocate`] runs.
    pub fee: u128,
}

// ---------------------------------------------------------------------------
// BatchAssembler
// ---------------------------------------------------------------------------

/// Accumulates intents in submission order and allocates the batch fee.
///
/// ```
/// use vela_protocol::batch::BatchAssembler;
/// use vela_protocol::crypto::EthSigner;
/// use vela_protocol::token::TokenId;
///
/// let a = EthSigner::generate().address();
/// let b = EthSigner::generate().address();
///
/// let intents = BatchAssembler::with_payer(a)
///     .transfer(a, b, TokenId(1), 1_000_000)
///     .allocate(25_000)
///     .unwrap();
/// assert_eq!(intents[0].fee, 25_000);
/// ```
pub struct BatchAssembler {
    intents: Vec<TransferIntent>,
    payer: Option<EthAddress>,
}

impl BatchAssembler {
    /// An empty assembler with no designated payer yet.
    pub fn new() -> Self {
        Self {
            intents: Vec::new(),
            payer: None,
        }
    }

    /// An empty assembler with the fee payer already designated.
    pub fn with_payer(payer: EthAddress) -> Self {
        Self {
            intents: Vec::new(),
            payer: Some(payer),
        }
    }

    /// Designate the account that carries the whole batch fee.
    pub fn payer(mut self, payer: EthAddress) -> Self {
        self.payer = Some(payer);
        self
    }

    /// Append a transfer intent. Order is preserved through allocation,
    /// message encoding, and execution.
    pub fn transfer(mut self, from: EthAddress, to: EthAddress, token: TokenId, amount: u128) -> Self {
        self.intents.push(TransferIntent {
            kind: TxKind::Transfer,
            from,
            to,
            token,
            amount,
            fee: 0,
        });
        self
    }

    /// Append a withdrawal intent.
    pub fn withdraw(mut self, from: EthAddress, to: EthAddress, token: TokenId, amount: u128) -> Self {
        self.intents.push(TransferIntent {
            kind: TxKind::Withdraw,
            from,
            to,
            token,
            amount,
            fee: 0,
        });
        self
    }

    /// Append a full transfer ring over the given accounts: each account
    /// sends `amount` to the next, the last closes back to the first.
    /// Value is conserved around the cycle; only the fee leaves it.
    ///
    /// An empty account list appends nothing; `allocate` will reject the
    /// batch downstream if nothing else was added.
    pub fn ring(mut self, accounts: &[EthAddress], token: TokenId, amount: u128) -> Self {
        if accounts.is_empty() {
            return self;
        }
        for (i, from) in accounts.iter().enumerate() {
            let to = accounts[(i + 1) % accounts.len()];
            self = self.transfer(*from, to, token, amount);
        }
        self
    }

    /// Allocate the externally-quoted total fee and finalize the intent
    /// list.
    ///
    /// The designated payer's *first* intent carries the entire fee; every
    /// other intent stays at zero. The quote comes from the oracle's fee
    /// schedule and is treated as opaque here.
    ///
    /// # Errors
    ///
    /// [`BatchError::Configuration`] when the batch is empty or oversized,
    /// when fewer than two distinct accounts participate, when no payer
    /// was designated, or when the payer originates none of the intents.
    pub fn allocate(mut self, total_fee: u128) -> Result<Vec<TransferIntent>, BatchError> {
        if self.intents.is_empty() {
            return Err(BatchError::configuration("batch has no transactions"));
        }
        if self.intents.len() > config::MAX_BATCH_TRANSACTIONS {
            return Err(BatchError::configuration(format!(
                "batch has {} transactions, limit is {}",
                self.intents.len(),
                config::MAX_BATCH_TRANSACTIONS
            )));
        }
        if participant_count(&self.intents) < config::MIN_BATCH_PARTICIPANTS {
            return Err(BatchError::configuration(format!(
                "batch needs at least {} participating accounts",
                config::MIN_BATCH_PARTICIPANTS
            )));
        }

        let payer = self
            .payer
            .ok_or_else(|| BatchError::configuration("no fee payer designated"))?;
        let payer_slot = self
            .intents
            .iter()
            .position(|intent| intent.from == payer)
            .ok_or_else(|| {
                BatchError::configuration(format!(
                    "designated payer {} originates no transaction in this batch",
                    payer
                ))
            })?;

        self.intents[payer_slot].fee = total_fee;
        Ok(self.intents)
    }
}

impl Default for BatchAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Count the distinct addresses taking part in the batch, origins and
/// destinations alike.
fn participant_count(intents: &[TransferIntent]) -> usize {
    let mut seen: Vec<EthAddress> = Vec::new();
    for intent in intents {
        for addr in [intent.from, intent.to] {
            if !seen.contains(&addr) {
                seen.push(addr);
            }
        }
    }
    seen.len()
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// An ordered sequence of signed transactions plus the derived set of
/// accounts whose root-chain signatures authorize it.
///
/// The signer set is exactly the distinct origin accounts, in order of
/// first appearance — the same order the signature list is matched against
/// positionally at verification time.
#[derive(Clone, Debug)]
pub struct Batch {
    transactions: Vec<Transaction>,
    required_signers: Vec<EthAddress>,
}

impl Batch {
    /// Seal a list of signed transactions into a batch.
    ///
    /// # Errors
    ///
    /// [`BatchError::Configuration`] when the list is empty or oversized,
    /// when any transaction is missing its account-layer signature, when
    /// fewer than two distinct accounts participate, or when more than one
    /// transaction carries a nonzero fee (only the designated payer pays).
    pub fn new(transactions: Vec<Transaction>) -> Result<Self, BatchError> {
        if transactions.is_empty() {
            return Err(BatchError::configuration("batch has no transactions"));
        }
        if transactions.len() > config::MAX_BATCH_TRANSACTIONS {
            return Err(BatchError::configuration(format!(
                "batch has {} transactions, limit is {}",
                transactions.len(),
                config::MAX_BATCH_TRANSACTIONS
            )));
        }
        if let Some(unsigned) = transactions.iter().find(|tx| !tx.is_signed()) {
            return Err(BatchError::configuration(format!(
                "transaction {} is missing its account-layer signature",
                unsigned.tx_hash()
            )));
        }

        let mut participants: Vec<EthAddress> = Vec::new();
        for tx in &transactions {
            for addr in [tx.from, tx.to] {
                if !participants.contains(&addr) {
                    participants.push(addr);
                }
            }
        }
        if participants.len() < config::MIN_BATCH_PARTICIPANTS {
            return Err(BatchError::configuration(format!(
                "batch needs at least {} participating accounts",
                config::MIN_BATCH_PARTICIPANTS
            )));
        }

        let fee_carriers = transactions.iter().filter(|tx| tx.fee > 0).count();
        if fee_carriers > 1 {
            return Err(BatchError::configuration(format!(
                "{} transactions carry a fee; only the designated payer may",
                fee_carriers
            )));
        }

        let mut required_signers: Vec<EthAddress> = Vec::new();
        for tx in &transactions {
            if !required_signers.contains(&tx.from) {
                required_signers.push(tx.from);
            }
        }

        Ok(Self {
            transactions,
            required_signers,
        })
    }

    /// The transactions, in submission order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The accounts whose root-chain signatures this batch requires,
    /// in order of first appearance.
    pub fn required_signers(&self) -> &[EthAddress] {
        &self.required_signers
    }

    /// Concatenated wire bytes of every transaction, in order — the input
    /// to the content-hash encoding.
    pub fn wire_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for tx in &self.transactions {
            buf.extend_from_slice(&tx.wire_bytes());
        }
        buf
    }

    /// Number of transactions in the batch.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Always `false` — empty batches cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
