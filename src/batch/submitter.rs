//! Batch submission and confirmation tracking.
//!
//! Submission is one network call: the whole batch either enters the
//! ledger atomically or is rejected with a single error. What remains
//! asynchronous is *confirmation* — each transaction's receipt progresses
//! through stages on its own schedule after acceptance, and callers await
//! them independently.
//!
//! The await model is explicit fan-out/fan-in: one task per handle,
//! join them all, surface the first failure. No implicit chains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use crate::oracle::Oracle;

use super::assembler::Batch;
use super::collector::BatchSignatures;
use super::error::BatchError;

// ---------------------------------------------------------------------------
// ReceiptStage
// ---------------------------------------------------------------------------

/// Confirmation stages a transaction's receipt moves through after the
/// batch is accepted. Strictly increasing; a receipt never moves backward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReceiptStage {
    /// Accepted into the batch, not yet in a committed block.
    Pending,
    /// Included in a committed block; balances reflect it.
    Committed,
    /// The containing block is finalized on the root chain.
    Finalized,
}

impl fmt::Display for ReceiptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Committed => write!(f, "committed"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

// ---------------------------------------------------------------------------
// SubmitHandle
// ---------------------------------------------------------------------------

/// An asynchronous view of one transaction's confirmation progress.
///
/// Returned by submission, one per transaction in batch order. Handles
/// are independent: await them in any order, in parallel, or not at all.
#[derive(Debug)]
pub struct SubmitHandle {
    tx_hash: String,
    stage_rx: watch::Receiver<ReceiptStage>,
}

impl SubmitHandle {
    /// Create a handle and the sender that drives it. The oracle side
    /// keeps the sender and pushes stage transitions into it.
    pub fn channel(tx_hash: String) -> (watch::Sender<ReceiptStage>, Self) {
        let (tx, rx) = watch::channel(ReceiptStage::Pending);
        (
            tx,
            Self {
                tx_hash,
                stage_rx: rx,
            },
        )
    }

    /// Hash of the transaction this handle tracks.
    pub fn tx_hash(&self) -> &str {
        &self.tx_hash
    }

    /// The stage the receipt has reached so far.
    pub fn current_stage(&self) -> ReceiptStage {
        *self.stage_rx.borrow()
    }

    /// Wait until the receipt reaches at least the given stage.
    ///
    /// Errors with [`BatchError::Transport`] if the oracle side goes away
    /// before the stage is reached — a dropped receipt stream is a
    /// connection problem, not a rejection.
    pub async fn wait_for(&mut self, stage: ReceiptStage) -> Result<(), BatchError> {
        loop {
            if *self.stage_rx.borrow() >= stage {
                return Ok(());
            }
            self.stage_rx.changed().await.map_err(|_| BatchError::Transport {
                reason: format!(
                    "receipt stream for {} closed before {}",
                    self.tx_hash, stage
                ),
            })?;
        }
    }

    /// Wait for block inclusion.
    pub async fn wait_committed(&mut self) -> Result<(), BatchError> {
        self.wait_for(ReceiptStage::Committed).await
    }

    /// Wait for root-chain finality.
    pub async fn wait_finalized(&mut self) -> Result<(), BatchError> {
        self.wait_for(ReceiptStage::Finalized).await
    }
}

/// Await every handle up to the given stage, in parallel.
///
/// Spawns one task per handle and joins them all; the first failure in
/// batch order is propagated. Confirmations of distinct transactions have
/// no ordering dependency once the batch is accepted, so there is nothing
/// to gain from awaiting sequentially except latency.
pub async fn await_stage(
    handles: Vec<SubmitHandle>,
    stage: ReceiptStage,
) -> Result<(), BatchError> {
    let tasks: Vec<_> = handles
        .into_iter()
        .map(|mut handle| tokio::spawn(async move { handle.wait_for(stage).await }))
        .collect();

    for task in tasks {
        task.await.map_err(|e| BatchError::Transport {
            reason: format!("receipt await task failed: {}", e),
        })??;
    }
    Ok(())
}

/// [`await_stage`] at [`ReceiptStage::Committed`].
pub async fn await_committed(handles: Vec<SubmitHandle>) -> Result<(), BatchError> {
    await_stage(handles, ReceiptStage::Committed).await
}

/// [`await_stage`] at [`ReceiptStage::Finalized`].
pub async fn await_finalized(handles: Vec<SubmitHandle>) -> Result<(), BatchError> {
    await_stage(handles, ReceiptStage::Finalized).await
}

// ---------------------------------------------------------------------------
// BatchSubmitter
// ---------------------------------------------------------------------------

/// Sends authorized batches to the verification oracle.
pub struct BatchSubmitter {
    oracle: Arc<dyn Oracle>,
}

impl BatchSubmitter {
    /// A submitter talking to the given oracle.
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Submit a batch with its collected signatures.
    ///
    /// The signature association is checked for completeness *before* the
    /// network call — an incomplete set is a local precondition failure
    /// the oracle never sees. On acceptance, returns one handle per
    /// transaction in batch order. On rejection, the whole batch failed
    /// and nothing executed.
    pub async fn submit(
        &self,
        batch: &Batch,
        signatures: &BatchSignatures,
    ) -> Result<Vec<SubmitHandle>, BatchError> {
        signatures.check_complete(batch)?;
        self.submit_unchecked(batch, signatures).await
    }

    /// Submit without the local completeness check.
    ///
    /// Exists so rejection paths can be exercised end to end: a subset of
    /// the required signatures, or a corrupted one, goes straight to the
    /// oracle and comes back as its rejection. Production flows have no
    /// reason to call this.
    pub async fn submit_unchecked(
        &self,
        batch: &Batch,
        signatures: &BatchSignatures,
    ) -> Result<Vec<SubmitHandle>, BatchError> {
        tracing::info!(
            transactions = batch.len(),
            signatures = signatures.len(),
            "submitting batch"
        );
        let result = self
            .oracle
            .submit_batch(batch.transactions().to_vec(), signatures.signatures())
            .await;

        match &result {
            Ok(handles) => tracing::info!(handles = handles.len(), "batch accepted"),
            Err(err) => tracing::warn!(error = %err, "batch rejected"),
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
