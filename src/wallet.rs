//! # Wallet
//!
//! The client-side face of one VELA account: both of its keys, its cached
//! nonce, and the oracle connection, wrapped into the handful of
//! operations batch flows actually need.
//!
//! ## Nonce discipline
//!
//! The wallet caches the account nonce in an [`AtomicU32`] and hands out
//! consecutive values with [`Wallet::pending_nonce`], so several
//! transactions can be built back-to-back without a round trip between
//! them. The cache goes stale the moment anything else submits for this
//! account — call [`Wallet::refresh_nonce`] immediately before a signing
//! session, not at some earlier convenient moment. A stale nonce is not
//! recoverable after rejection; the batch must be rebuilt and re-signed.
//!
//! Nonce allocation is per-account, so wallets for distinct accounts can
//! sign concurrently with no coordination at all.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::batch::{BatchError, ReceiptStage};
use crate::config;
use crate::crypto::eth::{EthAddress, EthSigner};
use crate::crypto::keys::VelaKeypair;
use crate::oracle::Oracle;
use crate::token::TokenId;
use crate::transaction::builder::{Transaction, TransactionBuilder};
use crate::transaction::fee::closest_packable_fee;
use crate::transaction::signing::sign_transaction;
use crate::transaction::types::{AccountId, TxKind};

/// One account's client-side state and signing capability.
pub struct Wallet {
    oracle: Arc<dyn Oracle>,
    eth_signer: EthSigner,
    keypair: VelaKeypair,
    account_id: AccountId,
    token: TokenId,
    nonce: AtomicU32,
}

impl Wallet {
    /// Open a wallet against a registered account, fetching its id and
    /// current nonce from the oracle.
    pub async fn open(
        oracle: Arc<dyn Oracle>,
        eth_signer: EthSigner,
        keypair: VelaKeypair,
        token: TokenId,
    ) -> Result<Self, BatchError> {
        let address = eth_signer.address();
        let account_id = oracle.account_id(address).await?;
        let nonce = oracle.account_nonce(address).await?;
        Ok(Self {
            oracle,
            eth_signer,
            keypair,
            account_id,
            token,
            nonce: AtomicU32::new(nonce),
        })
    }

    /// The root-chain address of this account.
    pub fn address(&self) -> EthAddress {
        self.eth_signer.address()
    }

    /// The account's state-tree index.
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// The token this wallet operates in.
    pub fn token(&self) -> TokenId {
        self.token
    }

    /// The root-chain signer, for batch signature collection.
    pub fn eth_signer(&self) -> &EthSigner {
        &self.eth_signer
    }

    /// Re-read the nonce from the oracle, discarding the local cache.
    ///
    /// This is the fix for "nonce conflict" rejections: refresh, rebuild,
    /// re-sign.
    pub async fn refresh_nonce(&self) -> Result<(), BatchError> {
        let nonce = self.oracle.account_nonce(self.address()).await?;
        self.nonce.store(nonce, Ordering::SeqCst);
        Ok(())
    }

    /// The next nonce for a new transaction, consuming it from the cache.
    pub fn pending_nonce(&self) -> u32 {
        self.nonce.fetch_add(1, Ordering::SeqCst)
    }

    /// A fee that comfortably clears this wallet's transactions: the
    /// oracle quote for one transfer, multiplied by the safety factor and
    /// rounded down to the closest packable amount.
    pub async fn sufficient_fee(&self) -> Result<u128, BatchError> {
        let quote = self
            .oracle
            .tx_fee(vec![TxKind::Transfer], vec![EthAddress::zero()], self.token)
            .await?;
        Ok(closest_packable_fee(quote * config::FEE_FACTOR as u128))
    }

    /// The account's balance of this wallet's token at the given stage.
    pub async fn balance(&self, stage: ReceiptStage) -> Result<u128, BatchError> {
        self.oracle.balance(self.address(), self.token, stage).await
    }

    /// Build and sign a transfer to the given address.
    ///
    /// Consumes one nonce from the cache. The transaction is fully signed
    /// at the account layer and ready for batch assembly.
    pub fn sign_transfer(
        &self,
        to: EthAddress,
        amount: u128,
        fee: u128,
    ) -> Result<Transaction, BatchError> {
        self.sign(TxKind::Transfer, to, amount, fee)
    }

    /// Build and sign a withdrawal to this account's own root-chain
    /// address — the common case of pulling your own funds out.
    pub fn sign_withdraw(&self, amount: u128, fee: u128) -> Result<Transaction, BatchError> {
        self.sign(TxKind::Withdraw, self.address(), amount, fee)
    }

    /// Build and sign a withdrawal to an arbitrary root-chain address.
    pub fn sign_withdraw_to(
        &self,
        to: EthAddress,
        amount: u128,
        fee: u128,
    ) -> Result<Transaction, BatchError> {
        self.sign(TxKind::Withdraw, to, amount, fee)
    }

    fn sign(
        &self,
        kind: TxKind,
        to: EthAddress,
        amount: u128,
        fee: u128,
    ) -> Result<Transaction, BatchError> {
        if !crate::transaction::fee::is_packable_fee(fee) {
            return Err(BatchError::configuration(format!(
                "fee {} does not survive the packed wire encoding; \
                 round it with closest_packable_fee first",
                fee
            )));
        }
        let mut tx = TransactionBuilder::new(kind)
            .account_id(self.account_id)
            .from(self.address())
            .to(to)
            .token(self.token)
            .amount(amount)
            .fee(fee)
            .nonce(self.pending_nonce())
            .build();
        sign_transaction(&mut tx, &self.keypair);
        tracing::debug!(kind = %kind, hash = %tx.tx_hash(), nonce = tx.nonce, "transaction signed");
        Ok(tx)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("account_id", &self.account_id)
            .field("token", &self.token)
            .field("nonce", &self.nonce.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::LocalLedger;
    use crate::token::TokenRegistry;

    async fn setup_wallet(ledger: &LocalLedger) -> Wallet {
        let eth_signer = EthSigner::generate();
        let keypair = VelaKeypair::generate();
        ledger.register_account(eth_signer.address(), keypair.public_key());
        ledger
            .fund(&eth_signer.address(), TokenId(1), 10_000_000)
            .unwrap();
        Wallet::open(
            Arc::new(ledger.clone()),
            eth_signer,
            keypair,
            TokenId(1),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn open_fetches_id_and_nonce() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let wallet = setup_wallet(&ledger).await;
        assert_eq!(wallet.account_id(), AccountId(0));
        assert_eq!(wallet.pending_nonce(), 0);
    }

    #[tokio::test]
    async fn pending_nonce_increments() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let wallet = setup_wallet(&ledger).await;
        assert_eq!(wallet.pending_nonce(), 0);
        assert_eq!(wallet.pending_nonce(), 1);
        assert_eq!(wallet.pending_nonce(), 2);
    }

    #[tokio::test]
    async fn refresh_discards_local_drift() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let wallet = setup_wallet(&ledger).await;
        wallet.pending_nonce();
        wallet.pending_nonce();
        // Nothing was actually submitted, so the ledger still says 0.
        wallet.refresh_nonce().await.unwrap();
        assert_eq!(wallet.pending_nonce(), 0);
    }

    #[tokio::test]
    async fn signed_transfer_carries_consecutive_nonces() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let wallet = setup_wallet(&ledger).await;
        let to = EthSigner::generate().address();

        let tx1 = wallet.sign_transfer(to, 100, 0).unwrap();
        let tx2 = wallet.sign_transfer(to, 100, 0).unwrap();
        assert_eq!(tx1.nonce, 0);
        assert_eq!(tx2.nonce, 1);
        assert!(tx1.is_signed() && tx2.is_signed());
    }

    #[tokio::test]
    async fn sufficient_fee_is_packable_and_padded() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let wallet = setup_wallet(&ledger).await;

        let fee = wallet.sufficient_fee().await.unwrap();
        assert!(crate::transaction::fee::is_packable_fee(fee));
        // Default transfer quote is 25_000; the factor is 3.
        assert_eq!(fee, 75_000);
    }

    #[tokio::test]
    async fn unpackable_fee_rejected_before_signing() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let wallet = setup_wallet(&ledger).await;
        let to = EthSigner::generate().address();

        let err = wallet.sign_transfer(to, 100, 123_456_789).unwrap_err();
        assert!(err.is_local());
        // The check runs before a nonce is consumed, so the cache is intact.
        assert_eq!(wallet.pending_nonce(), 0);
    }

    #[tokio::test]
    async fn withdraw_defaults_to_own_address() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let wallet = setup_wallet(&ledger).await;
        let tx = wallet.sign_withdraw(500, 0).unwrap();
        assert_eq!(tx.to, wallet.address());
        assert_eq!(tx.kind, TxKind::Withdraw);
    }

    #[tokio::test]
    async fn balance_reads_through_oracle() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let wallet = setup_wallet(&ledger).await;
        assert_eq!(
            wallet.balance(ReceiptStage::Committed).await.unwrap(),
            10_000_000
        );
    }
}
