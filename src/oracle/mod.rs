//! # Verification Oracle Interface
//!
//! The oracle is the external collaborator that accepts a batch,
//! independently recomputes its canonical authorization message, checks
//! every root-chain signature, and executes all transactions or none.
//! This crate talks to it exclusively through the [`Oracle`] trait — the
//! production implementation is a network client owned by the deployment,
//! not by this library.
//!
//! Two things *are* implemented here, because their behavior is part of
//! the protocol rather than of any particular deployment:
//!
//! - [`verify`] — the signature verification rule itself, shared by any
//!   oracle implementation that wants to verify batches the way the
//!   network does, including the exact rejection message.
//! - [`ledger`] — [`LocalLedger`], an in-process oracle with real balances
//!   and nonces. It backs the integration tests, the demo, and devnet
//!   tooling, and doubles as the executable definition of oracle-side
//!   semantics.

pub mod ledger;
pub mod verify;

use async_trait::async_trait;

use crate::batch::{BatchError, ReceiptStage, SubmitHandle};
use crate::crypto::eth::{EthAddress, EthSignature};
use crate::token::TokenId;
use crate::transaction::builder::Transaction;
use crate::transaction::types::{AccountId, TxKind};

pub use ledger::{LedgerConfig, LocalLedger};
pub use verify::verify_batch_signatures;

/// The verification oracle, seen from the client side.
///
/// Submission is atomic: `submit_batch` either returns one handle per
/// transaction (all of which will eventually confirm) or a single
/// [`BatchError`] (and nothing executed). There is no partial outcome to
/// represent, so there is no API surface for one.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Submit a batch of signed transactions with its root-chain
    /// signature list, positionally ordered by required signer.
    async fn submit_batch(
        &self,
        transactions: Vec<Transaction>,
        eth_signatures: Vec<EthSignature>,
    ) -> Result<Vec<SubmitHandle>, BatchError>;

    /// The state-tree index of a registered account.
    async fn account_id(&self, address: EthAddress) -> Result<AccountId, BatchError>;

    /// The next nonce the oracle expects from an account. Read this
    /// immediately before signing — a stale read is a burned batch.
    async fn account_nonce(&self, address: EthAddress) -> Result<u32, BatchError>;

    /// An account's balance of a token at the given confirmation stage.
    async fn balance(
        &self,
        address: EthAddress,
        token: TokenId,
        stage: ReceiptStage,
    ) -> Result<u128, BatchError>;

    /// Quote the total fee for a batch of the given transaction kinds
    /// over the given accounts, denominated in `token`. The quote is
    /// opaque to the client: it goes straight into fee allocation.
    async fn tx_fee(
        &self,
        kinds: Vec<TxKind>,
        addresses: Vec<EthAddress>,
        token: TokenId,
    ) -> Result<u128, BatchError>;
}
