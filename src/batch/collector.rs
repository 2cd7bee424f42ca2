//! Root-chain signature collection.
//!
//! Once the canonical message exists, every required signer must produce
//! exactly one root-chain signature over it. Signers are independent —
//! a hardware wallet here, a remote signing service there — and none of
//! them can see or alter the others' contributions, so collection fans
//! out concurrently and the only coordination point is the final
//! positional association: signer *i* in the required-signer order owns
//! signature *i*.
//!
//! An incomplete or mismatched association is a **local** failure. It is
//! caught here or in the submitter, never shipped to the oracle — except
//! deliberately, through the unchecked submission path tests use to
//! exercise oracle-side rejection.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

use crate::crypto::eth::{EthAddress, EthSignature, EthSigner};

use super::assembler::Batch;
use super::codec::AuthMessage;
use super::error::BatchError;

// ---------------------------------------------------------------------------
// EthMessageSigner
// ---------------------------------------------------------------------------

/// A source of root-chain signatures for one address.
///
/// The seam between the protocol flow and key custody. The in-process
/// [`EthSigner`] implements it for tests and devnets; production wires a
/// hardware wallet or remote signer behind the same trait.
#[async_trait]
pub trait EthMessageSigner: Send + Sync {
    /// The address this signer controls.
    fn address(&self) -> EthAddress;

    /// Sign an authorization message under the personal-message
    /// convention.
    async fn sign_message(&self, message: &[u8]) -> Result<EthSignature, BatchError>;
}

#[async_trait]
impl EthMessageSigner for EthSigner {
    fn address(&self) -> EthAddress {
        EthSigner::address(self)
    }

    async fn sign_message(&self, message: &[u8]) -> Result<EthSignature, BatchError> {
        Ok(EthSigner::sign_message(self, message))
    }
}

// ---------------------------------------------------------------------------
// BatchSignatures
// ---------------------------------------------------------------------------

/// The positional association of required signers to their signatures.
///
/// Ordered exactly like [`Batch::required_signers`]. The wire submission
/// carries only the signature column; the oracle re-derives the signer
/// column from the transactions and matches by position.
#[derive(Clone, Debug)]
pub struct BatchSignatures {
    entries: Vec<(EthAddress, EthSignature)>,
}

impl BatchSignatures {
    /// Build an association directly. Test fixtures and custom collection
    /// flows use this; [`SignatureCollector::collect`] is the normal path.
    pub fn new(entries: Vec<(EthAddress, EthSignature)>) -> Self {
        Self { entries }
    }

    /// The (signer, signature) pairs in positional order.
    pub fn entries(&self) -> &[(EthAddress, EthSignature)] {
        &self.entries
    }

    /// Just the signature column, in positional order — the shape the
    /// submission call wants.
    pub fn signatures(&self) -> Vec<EthSignature> {
        self.entries.iter().map(|(_, sig)| sig.clone()).collect()
    }

    /// Number of collected signatures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no signatures have been collected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks the association against a batch's required signer set:
    /// every required signer present exactly once, in order, nobody else.
    pub fn check_complete(&self, batch: &Batch) -> Result<(), BatchError> {
        let required = batch.required_signers();
        if self.entries.len() != required.len() {
            return Err(BatchError::configuration(format!(
                "batch requires {} signatures, association holds {}",
                required.len(),
                self.entries.len()
            )));
        }
        for (slot, (addr, _)) in self.entries.iter().enumerate() {
            if *addr != required[slot] {
                return Err(BatchError::configuration(format!(
                    "signature slot {} belongs to {}, expected {}",
                    slot, addr, required[slot]
                )));
            }
        }
        Ok(())
    }

    /// Drop one signer's entry. Shrinks the association below the
    /// required set — useful only for provoking rejection.
    pub fn without_signer(mut self, signer: &EthAddress) -> Self {
        self.entries.retain(|(addr, _)| addr != signer);
        self
    }

    /// Replace one signer's signature in place, keeping the association
    /// shape intact. The usual payload is [`EthSignature::placeholder`].
    pub fn with_replaced(mut self, signer: &EthAddress, signature: EthSignature) -> Self {
        for entry in &mut self.entries {
            if entry.0 == *signer {
                entry.1 = signature.clone();
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// SignatureCollector
// ---------------------------------------------------------------------------

/// Obtains one signature per required signer over a canonical message.
pub struct SignatureCollector;

impl SignatureCollector {
    /// Collect signatures from the given signer implementations.
    ///
    /// The signer list must cover the batch's required signer set exactly:
    /// a missing signer means the batch cannot be authorized, a surplus
    /// signer means someone is trying to sign for an origin they do not
    /// control. Both are [`BatchError::Configuration`], raised before a
    /// single signing call is made.
    ///
    /// Signing itself runs concurrently; completion order does not matter
    /// because results land in required-signer order by construction.
    pub async fn collect(
        message: &AuthMessage,
        batch: &Batch,
        signers: &[Arc<dyn EthMessageSigner>],
    ) -> Result<BatchSignatures, BatchError> {
        let required = batch.required_signers();

        for signer in signers {
            if !required.contains(&signer.address()) {
                return Err(BatchError::configuration(format!(
                    "signer {} does not control any origin account in this batch",
                    signer.address()
                )));
            }
        }

        let mut ordered: Vec<&Arc<dyn EthMessageSigner>> = Vec::with_capacity(required.len());
        for addr in required {
            let signer = signers
                .iter()
                .find(|s| s.address() == *addr)
                .ok_or_else(|| {
                    BatchError::configuration(format!("no signer available for {}", addr))
                })?;
            ordered.push(signer);
        }

        let signatures = join_all(
            ordered
                .iter()
                .map(|signer| signer.sign_message(message.as_bytes())),
        )
        .await;

        let mut entries = Vec::with_capacity(required.len());
        for (addr, signature) in required.iter().zip(signatures) {
            entries.push((*addr, signature?));
        }

        tracing::debug!(signers = entries.len(), "collected batch signatures");
        Ok(BatchSignatures { entries })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::codec::{MessageCodec, SigningScheme};
    use crate::crypto::eth::verify_eth_signature;
    use crate::crypto::keys::VelaKeypair;
    use crate::token::{TokenId, TokenRegistry};
    use crate::transaction::builder::{Transaction, TransactionBuilder};
    use crate::transaction::signing::sign_transaction;
    use crate::transaction::types::{AccountId, TxKind};

    fn signed_tx(from: EthAddress, to: EthAddress, nonce: u32) -> Transaction {
        let kp = VelaKeypair::generate();
        let mut tx = TransactionBuilder::new(TxKind::Transfer)
            .account_id(AccountId(1))
            .from(from)
            .to(to)
            .token(TokenId(1))
            .amount(100)
            .nonce(nonce)
            .build();
        sign_transaction(&mut tx, &kp);
        tx
    }

    fn setup() -> (Batch, AuthMessage, EthSigner, EthSigner) {
        let signer_a = EthSigner::generate();
        let signer_b = EthSigner::generate();
        let batch = Batch::new(vec![
            signed_tx(signer_a.address(), signer_b.address(), 0),
            signed_tx(signer_b.address(), signer_a.address(), 0),
        ])
        .unwrap();
        let codec = MessageCodec::new(TokenRegistry::devnet());
        let message = codec.encode(&batch, SigningScheme::ContentHash).unwrap();
        (batch, message, signer_a, signer_b)
    }

    #[tokio::test]
    async fn collects_one_signature_per_required_signer() {
        let (batch, message, signer_a, signer_b) = setup();
        let signers: Vec<Arc<dyn EthMessageSigner>> =
            vec![Arc::new(signer_a.clone()), Arc::new(signer_b.clone())];

        let collected = SignatureCollector::collect(&message, &batch, &signers)
            .await
            .unwrap();

        assert_eq!(collected.len(), 2);
        collected.check_complete(&batch).unwrap();
        for (addr, sig) in collected.entries() {
            assert!(verify_eth_signature(message.as_bytes(), sig, addr));
        }
    }

    #[tokio::test]
    async fn signer_order_follows_required_set_not_input_order() {
        let (batch, message, signer_a, signer_b) = setup();
        // Input order reversed relative to the required-signer order.
        let signers: Vec<Arc<dyn EthMessageSigner>> =
            vec![Arc::new(signer_b), Arc::new(signer_a.clone())];

        let collected = SignatureCollector::collect(&message, &batch, &signers)
            .await
            .unwrap();
        assert_eq!(collected.entries()[0].0, signer_a.address());
    }

    #[tokio::test]
    async fn missing_signer_is_local_error() {
        let (batch, message, signer_a, _) = setup();
        let signers: Vec<Arc<dyn EthMessageSigner>> = vec![Arc::new(signer_a)];

        let err = SignatureCollector::collect(&message, &batch, &signers)
            .await
            .unwrap_err();
        assert!(err.is_local());
    }

    #[tokio::test]
    async fn foreign_signer_is_local_error() {
        let (batch, message, signer_a, signer_b) = setup();
        let stranger = EthSigner::generate();
        let signers: Vec<Arc<dyn EthMessageSigner>> = vec![
            Arc::new(signer_a),
            Arc::new(signer_b),
            Arc::new(stranger),
        ];

        let err = SignatureCollector::collect(&message, &batch, &signers)
            .await
            .unwrap_err();
        assert!(matches!(err, BatchError::Configuration { .. }));
    }

    #[tokio::test]
    async fn dropped_signer_fails_completeness_check() {
        let (batch, message, signer_a, signer_b) = setup();
        let signers: Vec<Arc<dyn EthMessageSigner>> =
            vec![Arc::new(signer_a.clone()), Arc::new(signer_b)];

        let collected = SignatureCollector::collect(&message, &batch, &signers)
            .await
            .unwrap();
        let partial = collected.without_signer(&signer_a.address());
        assert!(partial.check_complete(&batch).is_err());
    }

    #[tokio::test]
    async fn replaced_signature_keeps_shape_but_not_validity() {
        let (batch, message, signer_a, signer_b) = setup();
        let signers: Vec<Arc<dyn EthMessageSigner>> =
            vec![Arc::new(signer_a.clone()), Arc::new(signer_b)];

        let collected = SignatureCollector::collect(&message, &batch, &signers)
            .await
            .unwrap();
        let corrupted =
            collected.with_replaced(&signer_a.address(), EthSignature::placeholder());

        // The association is still structurally complete...
        corrupted.check_complete(&batch).unwrap();
        // ...but the replaced signature no longer verifies.
        let (addr, sig) = &corrupted.entries()[0];
        assert!(!verify_eth_signature(message.as_bytes(), sig, addr));
    }
}
