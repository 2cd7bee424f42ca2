//! Account-layer transaction signing.
//!
//! Signing is a separate step from building because the keypair may not be
//! available at construction time (remote signer, hardware custody). The
//! signed data is the canonical [`Transaction::signable_bytes`] output,
//! which deterministically excludes the signature field itself.

use super::builder::Transaction;
use crate::crypto::keys::{VelaKeypair, VelaPublicKey};
use crate::crypto::signatures;

/// Signs a transaction in place with the origin account's keypair.
///
/// The caller is responsible for the keypair actually belonging to
/// `tx.from` — the oracle will check, this function will not. Returns a
/// reference to the now-signed transaction for chaining convenience.
pub fn sign_transaction<'a>(tx: &'a mut Transaction, keypair: &VelaKeypair) -> &'a Transaction {
    let signable = tx.signable_bytes();
    tx.signature = Some(signatures::sign(keypair, &signable));
    tx
}

/// Checks a transaction's account-layer signature against a public key.
///
/// Unsigned transactions simply fail — absence of a signature is not an
/// error shape here, it's a `false`.
pub fn verify_transaction_signature(tx: &Transaction, public_key: &VelaPublicKey) -> bool {
    match &tx.signature {
        Some(sig) => signatures::verify(public_key, &tx.signable_bytes(), sig),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::eth::EthAddress;
    use crate::token::TokenId;
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::types::{AccountId, TxKind};

    fn unsigned_tx() -> Transaction {
        TransactionBuilder::new(TxKind::Transfer)
            .account_id(AccountId(1))
            .from(EthAddress::from_bytes([0xAA; 20]))
            .to(EthAddress::from_bytes([0xBB; 20]))
            .token(TokenId(1))
            .amount(500)
            .nonce(1)
            .build()
    }

    #[test]
    fn sign_sets_signature() {
        let kp = VelaKeypair::generate();
        let mut tx = unsigned_tx();
        assert!(!tx.is_signed());
        sign_transaction(&mut tx, &kp);
        assert!(tx.is_signed());
    }

    #[test]
    fn signed_tx_verifies_against_signer() {
        let kp = VelaKeypair::generate();
        let mut tx = unsigned_tx();
        sign_transaction(&mut tx, &kp);
        assert!(verify_transaction_signature(&tx, &kp.public_key()));
    }

    #[test]
    fn wrong_key_fails() {
        let kp = VelaKeypair::generate();
        let other = VelaKeypair::generate();
        let mut tx = unsigned_tx();
        sign_transaction(&mut tx, &kp);
        assert!(!verify_transaction_signature(&tx, &other.public_key()));
    }

    #[test]
    fn unsigned_tx_fails_verification() {
        let kp = VelaKeypair::generate();
        assert!(!verify_transaction_signature(&unsigned_tx(), &kp.public_key()));
    }

    #[test]
    fn signing_does_not_change_hash() {
        let kp = VelaKeypair::generate();
        let mut tx = unsigned_tx();
        let hash_before = tx.tx_hash();
        sign_transaction(&mut tx, &kp);
        assert_eq!(tx.tx_hash(), hash_before);
    }

    #[test]
    fn tampering_after_signing_breaks_verification() {
        let kp = VelaKeypair::generate();
        let mut tx = unsigned_tx();
        sign_transaction(&mut tx, &kp);
        tx.amount += 1;
        assert!(!verify_transaction_signature(&tx, &kp.public_key()));
    }
}
