//! # Transaction Module
//!
//! Construction, signing, and wire encoding of VELA account-layer
//! transactions. Everything a batch is made of starts here.
//!
//! ## Architecture
//!
//! ```text
//! types.rs   — Core value types (TxKind, AccountId, TimeRange)
//! builder.rs — Fluent TransactionBuilder; canonical byte forms
//! signing.rs — Account-layer signing and verification
//! fee.rs     — Reduced-precision packed fee encoding
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Build** — assemble the semantic fields with [`TransactionBuilder`].
//! 2. **Sign** — attach the account-layer signature via [`sign_transaction`].
//! 3. **Batch** — hand the signed transaction to [`crate::batch`]; from
//!    here on its bytes are frozen.
//!
//! ## Design decisions
//!
//! - Amounts are `u128` minor units internally and decimal strings on the
//!   wire. No floating point anywhere near money.
//! - A transaction's validity window is its cancellation mechanism; there
//!   is no explicit revoke operation anywhere in the protocol.
//! - Fees must be packable (see [`fee`]) before signing, because the
//!   packed form is what the wire carries and an unpackable fee would be
//!   silently rewritten by the serializer — exactly the kind of surprise
//!   a signature is supposed to rule out.

pub mod builder;
pub mod fee;
pub mod signing;
pub mod types;

pub use builder::{Transaction, TransactionBuilder};
pub use fee::{closest_packable_fee, is_packable_fee, pack_fee, unpack_fee};
pub use signing::{sign_transaction, verify_transaction_signature};
pub use types::{AccountId, TimeRange, TxKind};
