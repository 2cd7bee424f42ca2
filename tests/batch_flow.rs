//! End-to-end tests for the batch authorization flow.
//!
//! These run the full pipeline — wallet signing, assembly, canonical
//! message encoding, signature collection, submission, receipt awaiting —
//! against the in-process ledger, and check the money actually moved (or
//! provably didn't). Each test stands alone with its own ledger; no
//! shared state, no ordering dependencies.

use std::sync::Arc;

use vela_protocol::batch::{
    await_committed, await_finalized, Batch, BatchError, BatchSignatures, BatchSubmitter,
    EthMessageSigner, MessageCodec, ReceiptStage, SignatureCollector, SigningScheme,
};
use vela_protocol::crypto::eth::{EthSignature, EthSigner};
use vela_protocol::crypto::keys::VelaKeypair;
use vela_protocol::oracle::{LocalLedger, Oracle};
use vela_protocol::token::{TokenId, TokenRegistry};
use vela_protocol::wallet::Wallet;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const TOKEN: TokenId = TokenId(1); // VUSD, 6 decimals
const FUNDING: u128 = 10_000_000;

/// Registers and funds one account, returning its wallet.
async fn new_wallet(ledger: &LocalLedger) -> Wallet {
    let eth_signer = EthSigner::generate();
    let keypair = VelaKeypair::generate();
    ledger.register_account(eth_signer.address(), keypair.public_key());
    ledger.fund(&eth_signer.address(), TOKEN, FUNDING).unwrap();
    Wallet::open(Arc::new(ledger.clone()), eth_signer, keypair, TOKEN)
        .await
        .unwrap()
}

fn codec() -> MessageCodec {
    MessageCodec::new(TokenRegistry::devnet())
}

fn signers_of(wallets: &[&Wallet]) -> Vec<Arc<dyn EthMessageSigner>> {
    wallets
        .iter()
        .map(|w| Arc::new(w.eth_signer().clone()) as Arc<dyn EthMessageSigner>)
        .collect()
}

async fn committed_balance(wallet: &Wallet) -> u128 {
    wallet.balance(ReceiptStage::Committed).await.unwrap()
}

/// Runs encode → collect → submit → await-finalized for a batch under the
/// given scheme, signed by the given wallets.
async fn authorize_and_submit(
    ledger: &LocalLedger,
    batch: &Batch,
    scheme: SigningScheme,
    wallets: &[&Wallet],
) -> Result<(), BatchError> {
    let message = codec().encode(batch, scheme)?;
    let signatures = SignatureCollector::collect(&message, batch, &signers_of(wallets)).await?;
    let submitter = BatchSubmitter::new(Arc::new(ledger.clone()));
    let handles = submitter.submit(batch, &signatures).await?;
    await_finalized(handles).await
}

// ---------------------------------------------------------------------------
// 1. Single-signer transfer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_signer_transfer_moves_exact_amounts() {
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let alice = new_wallet(&ledger).await;
    let bob = new_wallet(&ledger).await;

    let amount = 1_000_000;
    let fee = alice.sufficient_fee().await.unwrap();
    let tx = alice.sign_transfer(bob.address(), amount, fee).unwrap();
    let batch = Batch::new(vec![tx]).unwrap();
    assert_eq!(batch.required_signers(), &[alice.address()]);

    authorize_and_submit(&ledger, &batch, SigningScheme::ContentHash, &[&alice])
        .await
        .unwrap();

    assert_eq!(committed_balance(&alice).await, FUNDING - amount - fee);
    assert_eq!(committed_balance(&bob).await, FUNDING + amount);
    assert_eq!(ledger.fee_pool(TOKEN), fee);
}

#[tokio::test]
async fn single_signer_transfer_under_legacy_scheme() {
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let alice = new_wallet(&ledger).await;
    let bob = new_wallet(&ledger).await;

    let tx = alice.sign_transfer(bob.address(), 250_000, 25_000).unwrap();
    let batch = Batch::new(vec![tx]).unwrap();

    authorize_and_submit(&ledger, &batch, SigningScheme::Legacy, &[&alice])
        .await
        .unwrap();

    assert_eq!(committed_balance(&bob).await, FUNDING + 250_000);
}

// ---------------------------------------------------------------------------
// 2. Ring topology
// ---------------------------------------------------------------------------

#[tokio::test]
async fn three_account_ring_nets_to_fee_only() {
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let w1 = new_wallet(&ledger).await;
    let w2 = new_wallet(&ledger).await;
    let w3 = new_wallet(&ledger).await;

    let amount = 2_000_000;
    let fee = ledger
        .tx_fee(
            vec![
                vela_protocol::transaction::TxKind::Transfer;
                3
            ],
            vec![w1.address(), w2.address(), w3.address()],
            TOKEN,
        )
        .await
        .unwrap();

    // 1 → 2 → 3 → 1, account 1 pays the whole batch fee.
    let supply_before = ledger.total_supply(TOKEN);
    let txs = vec![
        w1.sign_transfer(w2.address(), amount, fee).unwrap(),
        w2.sign_transfer(w3.address(), amount, 0).unwrap(),
        w3.sign_transfer(w1.address(), amount, 0).unwrap(),
    ];
    let batch = Batch::new(txs).unwrap();
    assert_eq!(
        batch.required_signers(),
        &[w1.address(), w2.address(), w3.address()]
    );

    authorize_and_submit(&ledger, &batch, SigningScheme::ContentHash, &[&w1, &w2, &w3])
        .await
        .unwrap();

    // Payer nets exactly -fee; everyone else nets zero.
    assert_eq!(committed_balance(&w1).await, FUNDING - fee);
    assert_eq!(committed_balance(&w2).await, FUNDING);
    assert_eq!(committed_balance(&w3).await, FUNDING);

    // Supply is conserved; the fee just moved into the sink.
    assert_eq!(ledger.total_supply(TOKEN), supply_before);
    assert_eq!(ledger.fee_pool(TOKEN), fee);
}

#[tokio::test]
async fn ring_under_shared_legacy_message() {
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let w1 = new_wallet(&ledger).await;
    let w2 = new_wallet(&ledger).await;
    let w3 = new_wallet(&ledger).await;

    let txs = vec![
        w1.sign_transfer(w2.address(), 100_000, 75_000).unwrap(),
        w2.sign_transfer(w3.address(), 100_000, 0).unwrap(),
        w3.sign_transfer(w1.address(), 100_000, 0).unwrap(),
    ];
    let batch = Batch::new(txs).unwrap();

    authorize_and_submit(&ledger, &batch, SigningScheme::Legacy, &[&w1, &w2, &w3])
        .await
        .unwrap();

    assert_eq!(committed_balance(&w1).await, FUNDING - 75_000);
    assert_eq!(committed_balance(&w2).await, FUNDING);
    assert_eq!(committed_balance(&w3).await, FUNDING);
}

#[tokio::test]
async fn assembler_driven_ring_flow() {
    // The same ring, but built the way client code does it: intents into
    // the assembler, fee allocation, then one signed transaction per
    // intent from the owning wallet.
    use vela_protocol::batch::BatchAssembler;

    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let w1 = new_wallet(&ledger).await;
    let w2 = new_wallet(&ledger).await;
    let w3 = new_wallet(&ledger).await;
    let wallets = [&w1, &w2, &w3];

    let intents = BatchAssembler::with_payer(w1.address())
        .ring(
            &[w1.address(), w2.address(), w3.address()],
            TOKEN,
            500_000,
        )
        .allocate(75_000)
        .unwrap();

    let txs = intents
        .iter()
        .map(|intent| {
            let wallet = wallets
                .iter()
                .find(|w| w.address() == intent.from)
                .expect("every intent origin has a wallet");
            wallet
                .sign_transfer(intent.to, intent.amount, intent.fee)
                .unwrap()
        })
        .collect::<Vec<_>>();
    let batch = Batch::new(txs).unwrap();

    authorize_and_submit(&ledger, &batch, SigningScheme::ContentHash, &wallets)
        .await
        .unwrap();

    assert_eq!(committed_balance(&w1).await, FUNDING - 75_000);
    assert_eq!(committed_balance(&w2).await, FUNDING);
    assert_eq!(committed_balance(&w3).await, FUNDING);
}

// ---------------------------------------------------------------------------
// 3. Placeholder signature rejection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn zero_placeholder_signature_rejects_whole_batch() {
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let alice = new_wallet(&ledger).await;
    let bob = new_wallet(&ledger).await;

    let tx = alice.sign_transfer(bob.address(), 500_000, 25_000).unwrap();
    let batch = Batch::new(vec![tx]).unwrap();

    // Correct byte length, correct association shape, garbage content.
    let signatures = BatchSignatures::new(vec![(alice.address(), EthSignature::placeholder())]);
    let submitter = BatchSubmitter::new(Arc::new(ledger.clone()));
    let err = submitter.submit(&batch, &signatures).await.unwrap_err();
    assert_eq!(err.to_string(), "Eth signature is incorrect");

    // Atomicity: nothing moved, no nonce burned ledger-side.
    assert_eq!(committed_balance(&alice).await, FUNDING);
    assert_eq!(committed_balance(&bob).await, FUNDING);
    assert_eq!(ledger.fee_pool(TOKEN), 0);
    assert_eq!(
        ledger.account_nonce(alice.address()).await.unwrap(),
        0
    );
}

// ---------------------------------------------------------------------------
// 4. Mixed transfer + withdrawal, backward-compatible encoding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transfer_plus_withdrawal_two_signers_content_hash() {
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let alice = new_wallet(&ledger).await;
    let bob = new_wallet(&ledger).await;

    // A transfer from Alice paired with a withdrawal from Bob — two
    // independent accounts co-authorizing one batch. The batch fee rides
    // on Alice's transfer.
    let txs = vec![
        alice.sign_transfer(bob.address(), 300_000, 65_000).unwrap(),
        bob.sign_withdraw(400_000, 0).unwrap(),
    ];
    let batch = Batch::new(txs).unwrap();
    assert_eq!(batch.required_signers().len(), 2);

    let supply_before = ledger.total_supply(TOKEN);
    authorize_and_submit(&ledger, &batch, SigningScheme::ContentHash, &[&alice, &bob])
        .await
        .unwrap();

    assert_eq!(committed_balance(&alice).await, FUNDING - 300_000 - 65_000);
    assert_eq!(committed_balance(&bob).await, FUNDING + 300_000 - 400_000);
    // The withdrawn amount left the layer entirely.
    assert_eq!(ledger.total_supply(TOKEN), supply_before - 400_000);
}

#[tokio::test]
async fn legacy_and_content_hash_both_verify_independently() {
    // Same shape of batch, authorized once under each scheme (fresh
    // nonces each round — a rejected or executed nonce is spent).
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let alice = new_wallet(&ledger).await;
    let bob = new_wallet(&ledger).await;

    for scheme in [SigningScheme::Legacy, SigningScheme::ContentHash] {
        let txs = vec![
            alice.sign_transfer(bob.address(), 100_000, 25_000).unwrap(),
            bob.sign_transfer(alice.address(), 50_000, 0).unwrap(),
        ];
        let batch = Batch::new(txs).unwrap();
        authorize_and_submit(&ledger, &batch, scheme, &[&alice, &bob])
            .await
            .unwrap_or_else(|e| panic!("scheme {:?} failed: {}", scheme, e));
    }
}

// ---------------------------------------------------------------------------
// 5. Incomplete signature sets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_signature_is_caught_locally_before_submission() {
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let alice = new_wallet(&ledger).await;
    let bob = new_wallet(&ledger).await;

    let txs = vec![
        alice.sign_transfer(bob.address(), 100_000, 25_000).unwrap(),
        bob.sign_transfer(alice.address(), 100_000, 0).unwrap(),
    ];
    let batch = Batch::new(txs).unwrap();

    let message = codec().encode(&batch, SigningScheme::ContentHash).unwrap();
    let full = SignatureCollector::collect(&message, &batch, &signers_of(&[&alice, &bob]))
        .await
        .unwrap();
    let partial = full.without_signer(&bob.address());

    let submitter = BatchSubmitter::new(Arc::new(ledger.clone()));
    let err = submitter.submit(&batch, &partial).await.unwrap_err();
    assert!(err.is_local(), "precondition failures must not reach the oracle");
    assert_eq!(committed_balance(&alice).await, FUNDING);
}

#[tokio::test]
async fn forced_partial_submission_is_rejected_by_oracle() {
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let alice = new_wallet(&ledger).await;
    let bob = new_wallet(&ledger).await;

    let txs = vec![
        alice.sign_transfer(bob.address(), 100_000, 25_000).unwrap(),
        bob.sign_transfer(alice.address(), 100_000, 0).unwrap(),
    ];
    let batch = Batch::new(txs).unwrap();

    let message = codec().encode(&batch, SigningScheme::ContentHash).unwrap();
    let full = SignatureCollector::collect(&message, &batch, &signers_of(&[&alice, &bob]))
        .await
        .unwrap();
    let partial = full.without_signer(&bob.address());

    // Bypass the local check to observe the oracle-side verdict.
    let submitter = BatchSubmitter::new(Arc::new(ledger.clone()));
    let err = submitter.submit_unchecked(&batch, &partial).await.unwrap_err();
    assert_eq!(err.to_string(), "Eth signature is incorrect");

    // No partial execution.
    assert_eq!(committed_balance(&alice).await, FUNDING);
    assert_eq!(committed_balance(&bob).await, FUNDING);
}

// ---------------------------------------------------------------------------
// 6. Order sensitivity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reordering_invalidates_collected_signatures() {
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let alice = new_wallet(&ledger).await;
    let bob = new_wallet(&ledger).await;

    let tx_a = alice.sign_transfer(bob.address(), 100_000, 25_000).unwrap();
    let tx_b = bob.sign_transfer(alice.address(), 100_000, 0).unwrap();

    let original = Batch::new(vec![tx_a.clone(), tx_b.clone()]).unwrap();
    let message = codec().encode(&original, SigningScheme::ContentHash).unwrap();
    let signatures =
        SignatureCollector::collect(&message, &original, &signers_of(&[&alice, &bob]))
            .await
            .unwrap();

    // Same transactions, swapped order, same signatures (re-associated to
    // the reordered signer set to get past the local shape check).
    let reordered = Batch::new(vec![tx_b, tx_a]).unwrap();
    let reassociated = BatchSignatures::new(
        reordered
            .required_signers()
            .iter()
            .map(|addr| {
                let sig = signatures
                    .entries()
                    .iter()
                    .find(|(a, _)| a == addr)
                    .map(|(_, s)| s.clone())
                    .unwrap();
                (*addr, sig)
            })
            .collect(),
    );

    let submitter = BatchSubmitter::new(Arc::new(ledger.clone()));
    let err = submitter.submit(&reordered, &reassociated).await.unwrap_err();
    assert_eq!(err.to_string(), "Eth signature is incorrect");
}

// ---------------------------------------------------------------------------
// 7. Receipt handles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn handles_progress_through_both_stages() {
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let alice = new_wallet(&ledger).await;
    let bob = new_wallet(&ledger).await;

    let tx = alice.sign_transfer(bob.address(), 100_000, 25_000).unwrap();
    let batch = Batch::new(vec![tx]).unwrap();

    let message = codec().encode(&batch, SigningScheme::ContentHash).unwrap();
    let signatures = SignatureCollector::collect(&message, &batch, &signers_of(&[&alice]))
        .await
        .unwrap();
    let submitter = BatchSubmitter::new(Arc::new(ledger.clone()));

    let mut handles = submitter.submit(&batch, &signatures).await.unwrap();
    assert_eq!(handles.len(), 1);

    let handle = &mut handles[0];
    handle.wait_committed().await.unwrap();
    assert!(handle.current_stage() >= ReceiptStage::Committed);
    handle.wait_finalized().await.unwrap();
    assert_eq!(handle.current_stage(), ReceiptStage::Finalized);
}

#[tokio::test]
async fn batch_handles_await_in_parallel() {
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let w1 = new_wallet(&ledger).await;
    let w2 = new_wallet(&ledger).await;
    let w3 = new_wallet(&ledger).await;

    let txs = vec![
        w1.sign_transfer(w2.address(), 10_000, 75_000).unwrap(),
        w2.sign_transfer(w3.address(), 10_000, 0).unwrap(),
        w3.sign_transfer(w1.address(), 10_000, 0).unwrap(),
    ];
    let batch = Batch::new(txs).unwrap();

    let message = codec().encode(&batch, SigningScheme::ContentHash).unwrap();
    let signatures =
        SignatureCollector::collect(&message, &batch, &signers_of(&[&w1, &w2, &w3]))
            .await
            .unwrap();
    let submitter = BatchSubmitter::new(Arc::new(ledger.clone()));

    let handles = submitter.submit(&batch, &signatures).await.unwrap();
    assert_eq!(handles.len(), 3);
    await_committed(handles).await.unwrap();
}

// ---------------------------------------------------------------------------
// 8. Nonce lifecycle across batches
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sequential_batches_consume_sequential_nonces() {
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let alice = new_wallet(&ledger).await;
    let bob = new_wallet(&ledger).await;

    for round in 0..3u32 {
        let tx = alice.sign_transfer(bob.address(), 10_000, 25_000).unwrap();
        assert_eq!(tx.nonce, round);
        let batch = Batch::new(vec![tx]).unwrap();
        authorize_and_submit(&ledger, &batch, SigningScheme::ContentHash, &[&alice])
            .await
            .unwrap();
    }
    assert_eq!(ledger.account_nonce(alice.address()).await.unwrap(), 3);
}

#[tokio::test]
async fn rejected_batch_requires_fresh_signatures_not_fresh_nonces() {
    // A rejection leaves ledger nonces untouched, so the same transactions
    // can be re-authorized correctly and then succeed.
    let ledger = LocalLedger::new(TokenRegistry::devnet());
    let alice = new_wallet(&ledger).await;
    let bob = new_wallet(&ledger).await;

    let tx = alice.sign_transfer(bob.address(), 100_000, 25_000).unwrap();
    let batch = Batch::new(vec![tx]).unwrap();

    // First attempt: garbage signature, rejected, nothing spent.
    let bad = BatchSignatures::new(vec![(alice.address(), EthSignature::placeholder())]);
    let submitter = BatchSubmitter::new(Arc::new(ledger.clone()));
    submitter.submit(&batch, &bad).await.unwrap_err();

    // Second attempt: proper authorization of the same batch succeeds.
    authorize_and_submit(&ledger, &batch, SigningScheme::ContentHash, &[&alice])
        .await
        .unwrap();
    assert_eq!(committed_balance(&bob).await, FUNDING + 100_000);
}
