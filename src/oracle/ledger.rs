//! In-process reference oracle with real balances and nonces.
//!
//! [`LocalLedger`] is the executable definition of oracle-side semantics:
//! registered accounts, per-token balances, strict nonce sequencing, both
//! canonical message encodings at verification, and atomic all-or-nothing
//! batch execution. Integration tests run the whole authorization flow
//! against it; devnet tooling uses it as a stand-in network.
//!
//! ## Validation order
//!
//! `submit_batch` checks, in order: batch shape, validity windows,
//! account existence, account-layer signatures, nonce sequence,
//! root-chain signatures, then balance coverage. The order is
//! cheapest-first, and it is observable — a batch that is both expired
//! and unsigned reports the expiry.
//!
//! ## Execution model
//!
//! Transactions execute sequentially in batch order against a scratch
//! copy of the involved balances; the scratch is committed only if every
//! debit is covered. Sequential matters for rings: account 2 can forward
//! value it received from account 1 earlier in the same batch.
//!
//! Fees accumulate in a per-token pool — the ledger's fee sink. Withdrawn
//! amounts leave the layer-2 supply entirely.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::batch::{Batch, BatchError, MessageCodec, ReceiptStage, SubmitHandle};
use crate::config;
use crate::crypto::eth::{EthAddress, EthSignature};
use crate::crypto::keys::VelaPublicKey;
use crate::token::{TokenId, TokenRegistry};
use crate::transaction::builder::Transaction;
use crate::transaction::signing::verify_transaction_signature;
use crate::transaction::types::{AccountId, TxKind};

use super::verify::verify_batch_signatures;
use super::Oracle;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Flat per-kind fee schedule for the in-process ledger.
///
/// Real deployments price fees from gas markets and token rates; the
/// reference ledger only needs *a* schedule, quoted through the same
/// [`Oracle::tx_fee`] interface clients use in production.
#[derive(Clone, Copy, Debug)]
pub struct LedgerConfig {
    /// Fee per transfer, in minor units of the quoted token.
    pub transfer_fee: u128,
    /// Fee per withdrawal. Higher than transfers — withdrawals cost a
    /// root-chain interaction.
    pub withdraw_fee: u128,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            transfer_fee: 25_000,
            withdraw_fee: 40_000,
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// One registered account's ledger-side record.
#[derive(Clone, Debug)]
struct AccountRecord {
    id: AccountId,
    pubkey: VelaPublicKey,
    nonce: u32,
    balances: HashMap<TokenId, u128>,
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<EthAddress, AccountRecord>,
    next_account_id: u32,
    fee_pool: HashMap<TokenId, u128>,
}

/// The in-process verification oracle.
///
/// Cheap to clone — all clones share one ledger state.
#[derive(Clone)]
pub struct LocalLedger {
    state: Arc<RwLock<LedgerState>>,
    codec: MessageCodec,
    fees: LedgerConfig,
}

impl LocalLedger {
    /// A ledger resolving token metadata through the given registry,
    /// with the default fee schedule.
    pub fn new(registry: TokenRegistry) -> Self {
        Self::with_fees(registry, LedgerConfig::default())
    }

    /// A ledger with an explicit fee schedule.
    pub fn with_fees(registry: TokenRegistry, fees: LedgerConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::default())),
            codec: MessageCodec::new(registry),
            fees,
        }
    }

    /// Register an account: its root-chain address and its account-layer
    /// public key. Returns the assigned state-tree index.
    pub fn register_account(&self, address: EthAddress, pubkey: VelaPublicKey) -> AccountId {
        let mut state = self.state.write();
        let id = AccountId(state.next_account_id);
        state.next_account_id += 1;
        state.accounts.insert(
            address,
            AccountRecord {
                id,
                pubkey,
                nonce: 0,
                balances: HashMap::new(),
            },
        );
        tracing::info!(address = %address, id = %id, "account registered");
        id
    }

    /// Credit an account out of thin air. Devnet faucet; tests use it to
    /// set up starting balances.
    pub fn fund(&self, address: &EthAddress, token: TokenId, amount: u128) -> Result<(), BatchError> {
        let mut state = self.state.write();
        let record = state
            .accounts
            .get_mut(address)
            .ok_or_else(|| BatchError::UnknownAccount {
                address: address.to_hex(),
            })?;
        *record.balances.entry(token).or_insert(0) += amount;
        Ok(())
    }

    /// Total fees collected in the given token — the fee sink.
    pub fn fee_pool(&self, token: TokenId) -> u128 {
        *self.state.read().fee_pool.get(&token).unwrap_or(&0)
    }

    /// Total supply of a token on the ledger: all account balances plus
    /// the fee pool. Withdrawn amounts have left this figure — they live
    /// on the root chain now.
    pub fn total_supply(&self, token: TokenId) -> u128 {
        let state = self.state.read();
        let held: u128 = state
            .accounts
            .values()
            .map(|record| record.balances.get(&token).copied().unwrap_or(0))
            .sum();
        held + state.fee_pool.get(&token).copied().unwrap_or(0)
    }

    /// The message codec this ledger verifies with.
    pub fn codec(&self) -> &MessageCodec {
        &self.codec
    }

    fn now() -> u64 {
        Utc::now().timestamp() as u64
    }

    /// Validate and execute a batch under the write lock. Returns the
    /// transaction hashes on success; receipt channels are set up by the
    /// caller outside the lock.
    fn execute(
        &self,
        transactions: Vec<Transaction>,
        eth_signatures: Vec<EthSignature>,
    ) -> Result<Vec<String>, BatchError> {
        let batch = Batch::new(transactions)?;

        let now = Self::now();
        for tx in batch.transactions() {
            if !tx.time_range().contains(now) {
                return Err(BatchError::ValidityExpired {
                    tx_hash: tx.tx_hash(),
                    valid_until: tx.valid_until,
                    now,
                });
            }
        }

        let mut state = self.state.write();

        // Account existence, id consistency, account-layer signatures.
        for tx in batch.transactions() {
            let record = state
                .accounts
                .get(&tx.from)
                .ok_or_else(|| BatchError::UnknownAccount {
                    address: tx.from.to_hex(),
                })?;
            if tx.account_id != record.id {
                return Err(BatchError::configuration(format!(
                    "transaction {} claims account id {}, ledger has {}",
                    tx.tx_hash(),
                    tx.account_id,
                    record.id
                )));
            }
            if !verify_transaction_signature(tx, &record.pubkey) {
                return Err(BatchError::AccountSignatureInvalid {
                    tx_hash: tx.tx_hash(),
                });
            }
        }

        // Nonce sequence: strictly consecutive per account, starting at
        // the ledger's expected next value.
        let mut expected_nonces: HashMap<EthAddress, u32> = HashMap::new();
        for tx in batch.transactions() {
            let record = &state.accounts[&tx.from];
            let expected = *expected_nonces.entry(tx.from).or_insert(record.nonce);
            if tx.nonce != expected {
                return Err(BatchError::NonceConflict {
                    account: record.id,
                    expected,
                    got: tx.nonce,
                });
            }
            expected_nonces.insert(tx.from, expected + 1);
        }

        // Root-chain authorization — the heart of the matter.
        verify_batch_signatures(&self.codec, &batch, &eth_signatures)?;

        // Stage all balance movement on a scratch copy, sequentially in
        // batch order. Nothing is committed until everything clears.
        let mut scratch: HashMap<(EthAddress, TokenId), u128> = HashMap::new();
        let mut fee_deltas: HashMap<TokenId, u128> = HashMap::new();
        {
            let read_balance = |state: &LedgerState, addr: &EthAddress, token: TokenId| {
                state
                    .accounts
                    .get(addr)
                    .and_then(|r| r.balances.get(&token).copied())
                    .unwrap_or(0)
            };

            for tx in batch.transactions() {
                let debit_key = (tx.from, tx.token);
                let available = *scratch
                    .entry(debit_key)
                    .or_insert_with(|| read_balance(&state, &tx.from, tx.token));
                let required = tx.amount + tx.fee;
                if available < required {
                    let record = &state.accounts[&tx.from];
                    return Err(BatchError::InsufficientFunds {
                        account: record.id,
                        required,
                        available,
                    });
                }
                scratch.insert(debit_key, available - required);

                match tx.kind {
                    TxKind::Transfer => {
                        if !state.accounts.contains_key(&tx.to) {
                            return Err(BatchError::UnknownAccount {
                                address: tx.to.to_hex(),
                            });
                        }
                        let credit_key = (tx.to, tx.token);
                        let entry = scratch
                            .entry(credit_key)
                            .or_insert_with(|| read_balance(&state, &tx.to, tx.token));
                        *entry += tx.amount;
                    }
                    TxKind::Withdraw => {
                        // The amount exits the layer-2 supply; only the
                        // fee stays behind, in the pool.
                    }
                }
                *fee_deltas.entry(tx.token).or_insert(0) += tx.fee;
            }
        }

        // Commit point. Everything below is infallible.
        for ((address, token), balance) in scratch {
            if let Some(record) = state.accounts.get_mut(&address) {
                record.balances.insert(token, balance);
            }
        }
        for (address, nonce) in expected_nonces {
            if let Some(record) = state.accounts.get_mut(&address) {
                record.nonce = nonce;
            }
        }
        for (token, delta) in fee_deltas {
            *state.fee_pool.entry(token).or_insert(0) += delta;
        }

        let hashes: Vec<String> = batch.transactions().iter().map(|tx| tx.tx_hash()).collect();
        tracing::info!(transactions = hashes.len(), "batch executed");
        Ok(hashes)
    }
}

// ---------------------------------------------------------------------------
// Oracle implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl Oracle for LocalLedger {
    async fn submit_batch(
        &self,
        transactions: Vec<Transaction>,
        eth_signatures: Vec<EthSignature>,
    ) -> Result<Vec<SubmitHandle>, BatchError> {
        let hashes = self.execute(transactions, eth_signatures)?;

        // Receipts progress on their own schedule after the atomic commit.
        let mut handles = Vec::with_capacity(hashes.len());
        for hash in hashes {
            let (stage_tx, handle) = SubmitHandle::channel(hash);
            tokio::spawn(async move {
                tokio::time::sleep(config::COMMIT_LATENCY).await;
                let _ = stage_tx.send(ReceiptStage::Committed);
                tokio::time::sleep(config::FINALITY_LATENCY).await;
                let _ = stage_tx.send(ReceiptStage::Finalized);
            });
            handles.push(handle);
        }
        Ok(handles)
    }

    async fn account_id(&self, address: EthAddress) -> Result<AccountId, BatchError> {
        self.state
            .read()
            .accounts
            .get(&address)
            .map(|record| record.id)
            .ok_or_else(|| BatchError::UnknownAccount {
                address: address.to_hex(),
            })
    }

    async fn account_nonce(&self, address: EthAddress) -> Result<u32, BatchError> {
        self.state
            .read()
            .accounts
            .get(&address)
            .map(|record| record.nonce)
            .ok_or_else(|| BatchError::UnknownAccount {
                address: address.to_hex(),
            })
    }

    async fn balance(
        &self,
        address: EthAddress,
        token: TokenId,
        _stage: ReceiptStage,
    ) -> Result<u128, BatchError> {
        // The in-process ledger commits and finalizes in one step, so the
        // stage distinction collapses; the parameter exists for interface
        // fidelity with networked oracles.
        self.state
            .read()
            .accounts
            .get(&address)
            .map(|record| record.balances.get(&token).copied().unwrap_or(0))
            .ok_or_else(|| BatchError::UnknownAccount {
                address: address.to_hex(),
            })
    }

    async fn tx_fee(
        &self,
        kinds: Vec<TxKind>,
        _addresses: Vec<EthAddress>,
        _token: TokenId,
    ) -> Result<u128, BatchError> {
        Ok(kinds
            .iter()
            .map(|kind| match kind {
                TxKind::Transfer => self.fees.transfer_fee,
                TxKind::Withdraw => self.fees.withdraw_fee,
            })
            .sum())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::eth::EthSigner;
    use crate::crypto::keys::VelaKeypair;
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::signing::sign_transaction;

    struct TestAccount {
        signer: EthSigner,
        keypair: VelaKeypair,
        id: AccountId,
    }

    fn setup_two_accounts(ledger: &LocalLedger, balance: u128) -> (TestAccount, TestAccount) {
        let mut accounts = Vec::new();
        for _ in 0..2 {
            let signer = EthSigner::generate();
            let keypair = VelaKeypair::generate();
            let id = ledger.register_account(signer.address(), keypair.public_key());
            ledger.fund(&signer.address(), TokenId(1), balance).unwrap();
            accounts.push(TestAccount { signer, keypair, id });
        }
        let b = accounts.pop().unwrap();
        let a = accounts.pop().unwrap();
        (a, b)
    }

    fn build_signed(
        account: &TestAccount,
        to: EthAddress,
        amount: u128,
        fee: u128,
        nonce: u32,
    ) -> Transaction {
        let mut tx = TransactionBuilder::new(TxKind::Transfer)
            .account_id(account.id)
            .from(account.signer.address())
            .to(to)
            .token(TokenId(1))
            .amount(amount)
            .fee(fee)
            .nonce(nonce)
            .build();
        sign_transaction(&mut tx, &account.keypair);
        tx
    }

    fn content_hash_sigs(txs: &[Transaction], signers: &[&EthSigner]) -> Vec<EthSignature> {
        let batch = Batch::new(txs.to_vec()).unwrap();
        let msg = MessageCodec::content_hash_hex(&batch);
        signers.iter().map(|s| s.sign_message(msg.as_bytes())).collect()
    }

    #[tokio::test]
    async fn accepted_batch_moves_balances() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let (a, b) = setup_two_accounts(&ledger, 1_000_000);

        let tx = build_signed(&a, b.signer.address(), 100_000, 25_000, 0);
        let sigs = content_hash_sigs(&[tx.clone()], &[&a.signer]);

        let handles = ledger.submit_batch(vec![tx], sigs).await.unwrap();
        assert_eq!(handles.len(), 1);

        assert_eq!(
            ledger
                .balance(a.signer.address(), TokenId(1), ReceiptStage::Committed)
                .await
                .unwrap(),
            875_000
        );
        assert_eq!(
            ledger
                .balance(b.signer.address(), TokenId(1), ReceiptStage::Committed)
                .await
                .unwrap(),
            1_100_000
        );
        assert_eq!(ledger.fee_pool(TokenId(1)), 25_000);
    }

    #[tokio::test]
    async fn rejected_batch_changes_nothing() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let (a, b) = setup_two_accounts(&ledger, 1_000_000);

        let tx = build_signed(&a, b.signer.address(), 100_000, 0, 0);
        let err = ledger
            .submit_batch(vec![tx], vec![EthSignature::placeholder()])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Eth signature is incorrect");

        // Balance and nonce untouched.
        assert_eq!(
            ledger
                .balance(a.signer.address(), TokenId(1), ReceiptStage::Committed)
                .await
                .unwrap(),
            1_000_000
        );
        assert_eq!(ledger.account_nonce(a.signer.address()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn nonce_conflict_detected() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let (a, b) = setup_two_accounts(&ledger, 1_000_000);

        let tx = build_signed(&a, b.signer.address(), 100, 0, 5); // expected 0
        let sigs = content_hash_sigs(&[tx.clone()], &[&a.signer]);
        let err = ledger.submit_batch(vec![tx], sigs).await.unwrap_err();
        assert!(matches!(
            err,
            BatchError::NonceConflict { expected: 0, got: 5, .. }
        ));
    }

    #[tokio::test]
    async fn expired_window_detected() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let (a, b) = setup_two_accounts(&ledger, 1_000_000);

        let mut tx = TransactionBuilder::new(TxKind::Transfer)
            .account_id(a.id)
            .from(a.signer.address())
            .to(b.signer.address())
            .token(TokenId(1))
            .amount(100)
            .nonce(0)
            .deadline(1) // 1970 called, it wants its deadline back
            .build();
        sign_transaction(&mut tx, &a.keypair);

        let sigs = content_hash_sigs(&[tx.clone()], &[&a.signer]);
        let err = ledger.submit_batch(vec![tx], sigs).await.unwrap_err();
        assert!(matches!(err, BatchError::ValidityExpired { .. }));
    }

    #[tokio::test]
    async fn insufficient_funds_detected_and_atomic() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let (a, b) = setup_two_accounts(&ledger, 50);

        // Two transactions; the second overdraws. Neither may execute.
        let tx1 = build_signed(&a, b.signer.address(), 30, 0, 0);
        let tx2 = build_signed(&a, b.signer.address(), 40, 0, 1);
        let txs = vec![tx1, tx2];
        let sigs = content_hash_sigs(&txs, &[&a.signer]);

        let err = ledger.submit_batch(txs, sigs).await.unwrap_err();
        assert!(matches!(err, BatchError::InsufficientFunds { .. }));
        assert_eq!(
            ledger
                .balance(a.signer.address(), TokenId(1), ReceiptStage::Committed)
                .await
                .unwrap(),
            50
        );
    }

    #[tokio::test]
    async fn withdrawal_leaves_supply() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let (a, _b) = setup_two_accounts(&ledger, 1_000_000);

        let mut tx = TransactionBuilder::new(TxKind::Withdraw)
            .account_id(a.id)
            .from(a.signer.address())
            .to(a.signer.address())
            .token(TokenId(1))
            .amount(400_000)
            .fee(40_000)
            .nonce(0)
            .build();
        sign_transaction(&mut tx, &a.keypair);
        let sigs = content_hash_sigs(&[tx.clone()], &[&a.signer]);

        let supply_before = ledger.total_supply(TokenId(1));
        ledger.submit_batch(vec![tx], sigs).await.unwrap();

        // The withdrawn amount is gone; the fee moved to the pool.
        assert_eq!(ledger.total_supply(TokenId(1)), supply_before - 400_000);
        assert_eq!(ledger.fee_pool(TokenId(1)), 40_000);
    }

    #[tokio::test]
    async fn fee_quote_sums_per_kind() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let quote = ledger
            .tx_fee(
                vec![TxKind::Transfer, TxKind::Transfer, TxKind::Withdraw],
                vec![EthAddress::zero()],
                TokenId(1),
            )
            .await
            .unwrap();
        assert_eq!(quote, 25_000 + 25_000 + 40_000);
    }

    #[tokio::test]
    async fn unknown_origin_rejected() {
        let ledger = LocalLedger::new(TokenRegistry::devnet());
        let (_a, b) = setup_two_accounts(&ledger, 1_000);

        let stranger_eth = EthSigner::generate();
        let stranger_kp = VelaKeypair::generate();
        let mut tx = TransactionBuilder::new(TxKind::Transfer)
            .account_id(AccountId(99))
            .from(stranger_eth.address())
            .to(b.signer.address())
            .token(TokenId(1))
            .amount(10)
            .nonce(0)
            .build();
        sign_transaction(&mut tx, &stranger_kp);
        let sigs = content_hash_sigs(&[tx.clone()], &[&stranger_eth]);

        let err = ledger.submit_batch(vec![tx], sigs).await.unwrap_err();
        assert!(matches!(err, BatchError::UnknownAccount { .. }));
    }
}
