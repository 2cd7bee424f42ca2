// Copyright (c) 2026 VELA Labs. MIT License.
// See LICENSE for details.

//! # VELA Protocol — Batch Authorization Library
//!
//! VELA is a payment layer-2 anchored to an Ethereum-style root chain.
//! This crate implements the client side of its defining operation:
//! assembling transactions from independent accounts into one batch,
//! authorizing it with one root-chain signature per participating signer,
//! and submitting it for atomic execution. All of it or none of it — a
//! single wrong signature rejects the entire batch.
//!
//! ## Architecture
//!
//! The modules mirror the steps of the flow:
//!
//! - **crypto** — Two key layers: Ed25519 for per-transaction account
//!   signatures, recoverable secp256k1 for batch authorization. Don't
//!   roll your own.
//! - **token** — The token metadata resolver; the legacy message encoding
//!   renders amounts through it.
//! - **transaction** — Construction, signing, wire encoding, packed fees.
//! - **batch** — Assembly, canonical message encoding (both schemes),
//!   signature collection, submission, confirmation handles.
//! - **oracle** — The verification oracle interface, the shared signature
//!   verification rule, and an in-process reference ledger.
//! - **wallet** — One account's keys, nonce cache, and signing shortcuts.
//! - **config** — Protocol constants and wire contracts.
//!
//! ## The short version
//!
//! ```no_run
//! # async fn flow() -> Result<(), vela_protocol::batch::BatchError> {
//! use std::sync::Arc;
//! use vela_protocol::batch::{
//!     await_finalized, Batch, BatchSubmitter, EthMessageSigner, MessageCodec,
//!     SignatureCollector, SigningScheme,
//! };
//! use vela_protocol::oracle::LocalLedger;
//! use vela_protocol::token::TokenRegistry;
//! # let ledger = LocalLedger::new(TokenRegistry::devnet());
//! # let transactions = vec![];
//! # let signers: Vec<Arc<dyn EthMessageSigner>> = vec![];
//!
//! let codec = MessageCodec::new(TokenRegistry::devnet());
//! let batch = Batch::new(transactions)?;
//! let message = codec.encode(&batch, SigningScheme::ContentHash)?;
//! let signatures = SignatureCollector::collect(&message, &batch, &signers).await?;
//! let submitter = BatchSubmitter::new(Arc::new(ledger));
//! let handles = submitter.submit(&batch, &signatures).await?;
//! await_finalized(handles).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Design stance
//!
//! 1. Correctness over cleverness; every byte of a signed message is a
//!    frozen contract.
//! 2. Integer minor units everywhere. No floating point near money.
//! 3. If it touches authorization, it has tests. Plural.

pub mod batch;
pub mod config;
pub mod crypto;
pub mod oracle;
pub mod token;
pub mod transaction;
pub mod wallet;
