//! # Batch Authorization Module
//!
//! The core of the protocol: turning a set of independently-originated
//! transactions into one atomically-authorized, atomically-executed unit.
//!
//! ## The Five Steps
//!
//! ```text
//!   ┌───────────┐    ┌───────────┐    ┌───────────┐
//!   │  Wallet A │    │  Wallet B │    │  Wallet C │   signed transactions
//!   └─────┬─────┘    └─────┬─────┘    └─────┬─────┘
//!         └───────────┬────┴───────────────┘
//!                     ▼
//!            1. BatchAssembler        order, signer set, fee payer
//!                     ▼
//!            2. MessageCodec          canonical message (legacy | hash)
//!                     ▼
//!            3. SignatureCollector    one root-chain signature per signer
//!                     ▼
//!            4. BatchSubmitter ───────► Verification Oracle
//!                     ▼                      │ all-or-nothing
//!            5. SubmitHandle × N ◄───────────┘
//!               await committed / finalized
//! ```
//!
//! ### Step 1 — Assembly (`assembler.rs`)
//! Intents are ordered, the designated payer absorbs the whole batch fee,
//! and the required signer set is derived: exactly the distinct origin
//! accounts, nothing more, nothing less.
//!
//! ### Step 2 — Encoding (`codec.rs`)
//! The batch is rendered into the canonical authorization message, in
//! whichever of the two supported encodings the client speaks.
//!
//! ### Step 3 — Collection (`collector.rs`)
//! Every required signer signs the message independently and concurrently;
//! the result is a positional signer → signature association.
//!
//! ### Step 4 — Submission (`submitter.rs`)
//! One network call. The oracle re-derives the message on its own and
//! verifies every signature; a single mismatch rejects everything.
//!
//! ### Step 5 — Confirmation (`submitter.rs`)
//! One handle per transaction, awaited fan-out/fan-in.
//!
//! ## Atomicity
//!
//! There is no partial success anywhere in this flow. Assembly fails
//! before signing, collection fails before submission, and the oracle
//! executes all transactions or none. A rejected batch burns nothing but
//! time — and nonces, which is why retries mean rebuilding.

pub mod assembler;
pub mod codec;
pub mod collector;
pub mod submitter;

mod error;

pub use assembler::{Batch, BatchAssembler, TransferIntent};
pub use codec::{AuthMessage, MessageCodec, SigningScheme};
pub use collector::{BatchSignatures, EthMessageSigner, SignatureCollector};
pub use error::BatchError;
pub use submitter::{
    await_committed, await_finalized, await_stage, BatchSubmitter, ReceiptStage, SubmitHandle,
};
