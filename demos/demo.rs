//! Runnable walkthrough of the batch authorization flow.
//!
//! Spins up the in-process ledger, opens three funded wallets, runs a
//! transfer ring with a designated fee payer, and then demonstrates the
//! rejection path with a deliberately corrupted signature.
//!
//! ```text
//! cargo run --example demo
//! ```

use std::sync::Arc;

use vela_protocol::batch::{
    await_finalized, Batch, BatchSignatures, BatchSubmitter, EthMessageSigner, MessageCodec,
    ReceiptStage, SignatureCollector, SigningScheme,
};
use vela_protocol::crypto::eth::{EthSignature, EthSigner};
use vela_protocol::crypto::keys::VelaKeypair;
use vela_protocol::oracle::LocalLedger;
use vela_protocol::token::{TokenId, TokenRegistry};
use vela_protocol::wallet::Wallet;

const TOKEN: TokenId = TokenId(1); // VUSD

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let ledger = LocalLedger::new(TokenRegistry::devnet());

    // Three accounts, each funded with 10 VUSD.
    let mut wallets = Vec::new();
    for _ in 0..3 {
        let eth_signer = EthSigner::generate();
        let keypair = VelaKeypair::generate();
        ledger.register_account(eth_signer.address(), keypair.public_key());
        ledger.fund(&eth_signer.address(), TOKEN, 10_000_000)?;
        wallets.push(Wallet::open(Arc::new(ledger.clone()), eth_signer, keypair, TOKEN).await?);
    }
    let (w1, w2, w3) = (&wallets[0], &wallets[1], &wallets[2]);

    // A transfer ring: 1 → 2 → 3 → 1, wallet 1 pays the whole batch fee.
    let fee = w1.sufficient_fee().await?;
    println!("batch fee (quoted, padded, packable): {}", fee);

    let txs = vec![
        w1.sign_transfer(w2.address(), 2_000_000, fee)?,
        w2.sign_transfer(w3.address(), 2_000_000, 0)?,
        w3.sign_transfer(w1.address(), 2_000_000, 0)?,
    ];
    let batch = Batch::new(txs)?;

    let codec = MessageCodec::new(TokenRegistry::devnet());
    let message = codec.encode(&batch, SigningScheme::Legacy)?;
    println!("--- canonical authorization message ---");
    println!("{}", message.as_text());
    println!("---------------------------------------");

    let signers: Vec<Arc<dyn EthMessageSigner>> = wallets
        .iter()
        .map(|w| Arc::new(w.eth_signer().clone()) as Arc<dyn EthMessageSigner>)
        .collect();
    let signatures = SignatureCollector::collect(&message, &batch, &signers).await?;

    let submitter = BatchSubmitter::new(Arc::new(ledger.clone()));
    let handles = submitter.submit(&batch, &signatures).await?;
    await_finalized(handles).await?;

    for (label, wallet) in [("w1 (payer)", w1), ("w2", w2), ("w3", w3)] {
        println!(
            "{}: {} minor units",
            label,
            wallet.balance(ReceiptStage::Finalized).await?
        );
    }
    println!("fee pool: {}", ledger.fee_pool(TOKEN));

    // And the failure mode: one placeholder signature sinks everything.
    let txs = vec![
        w1.sign_transfer(w2.address(), 1_000_000, fee)?,
        w2.sign_transfer(w1.address(), 1_000_000, 0)?,
    ];
    let batch = Batch::new(txs)?;
    let message = codec.encode(&batch, SigningScheme::ContentHash)?;
    let signatures = SignatureCollector::collect(&message, &batch, &signers[..2]).await?;
    let corrupted = signatures.with_replaced(&w2.address(), EthSignature::placeholder());

    match submitter.submit(&batch, &corrupted).await {
        Err(err) => println!("rejection, as designed: {}", err),
        Ok(_) => unreachable!("a corrupted signature must never pass"),
    }

    Ok(())
}
