//! Oracle-side batch signature verification.
//!
//! One entry point, both encodings, no version negotiation. The submission
//! payload does not say which canonical encoding the signers used, and
//! both are in force at once across deployed client generations — so the
//! verifier recomputes every candidate message itself and lets each
//! signature pick its scheme by verifying against one of them:
//!
//! 1. the **shared legacy** message (all blocks, co-signed),
//! 2. that signer's **per-signer legacy** message (own blocks only —
//!    what single-account clients have always signed),
//! 3. the **content-hash** message.
//!
//! A signature that matches none of the candidates sinks the entire
//! batch with the exact rejection text clients match on. No partial
//! acceptance, no hint about which candidate came closest.

use crate::batch::{Batch, BatchError, MessageCodec};
use crate::config;
use crate::crypto::eth::{verify_eth_signature, EthSignature};

/// Verify a batch's root-chain signature list.
///
/// `eth_signatures` is matched positionally against
/// [`Batch::required_signers`]: slot *i* must authorize signer *i*.
/// A missing signature is indistinguishable from a wrong one by design —
/// both produce the same [`BatchError::SignatureMismatch`].
pub fn verify_batch_signatures(
    codec: &MessageCodec,
    batch: &Batch,
    eth_signatures: &[EthSignature],
) -> Result<(), BatchError> {
    let required = batch.required_signers();
    if eth_signatures.len() != required.len() {
        tracing::warn!(
            required = required.len(),
            provided = eth_signatures.len(),
            "signature count mismatch"
        );
        return Err(rejection());
    }

    // Scheme-independent candidates, computed once per batch. The legacy
    // text needs token metadata; if that fails to resolve, no legacy
    // client could have produced the message either, so the candidate is
    // simply absent rather than an error.
    let shared_legacy = codec.shared_legacy_message(batch).ok();
    let content_hash = MessageCodec::content_hash_hex(batch);

    for (signer, signature) in required.iter().zip(eth_signatures) {
        let own_legacy = codec.signer_message(batch, signer).ok();

        let verified = verify_eth_signature(content_hash.as_bytes(), signature, signer)
            || shared_legacy
                .as_deref()
                .is_some_and(|msg| verify_eth_signature(msg.as_bytes(), signature, signer))
            || own_legacy
                .as_deref()
                .is_some_and(|msg| verify_eth_signature(msg.as_bytes(), signature, signer));

        if !verified {
            tracing::warn!(signer = %signer, "root-chain signature failed all candidates");
            return Err(rejection());
        }
        tracing::debug!(signer = %signer, "root-chain signature verified");
    }

    Ok(())
}

/// The one and only signature rejection. Single constructor so the text
/// cannot fork between code paths.
fn rejection() -> BatchError {
    BatchError::SignatureMismatch {
        message: config::ETH_SIGNATURE_REJECTION.to_string(),
    }
}
