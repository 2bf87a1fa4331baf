use std::sync::Arc;

use backend::{BackendClient, CreateTransactionRequest};
use pharmatrade_core::models::Transaction;
use pharmatrade_core::validation::{self, TransactionDraft};
use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::Mutex;

use crate::error::StoreError;

#[derive(Default)]
struct TransactionState {
    transactions: Vec<Transaction>,
    error_message: Option<String>,
    /// Sequence numbers for full-replace fetches. A response is applied
    /// only when its sequence is newer than the last applied one, so a
    /// slow stale fetch can never overwrite fresher data.
    next_fetch: u64,
    applied_fetch: u64,
}

/// Canonical list of the current pharmacist's transactions.
///
/// Mutations are remote-first. Confirm/reject do not touch the local
/// collection or linked notifications; dependent views refresh through
/// their own fetch paths (the notification store's offer flow does this
/// for the feed).
pub struct TransactionStore {
    client: Arc<dyn BackendClient>,
    state: Mutex<TransactionState>,
}

impl TransactionStore {
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self {
            client,
            state: Mutex::new(TransactionState::default()),
        }
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().await.transactions.clone()
    }

    /// Message of the most recent failed operation, if the failure was
    /// not superseded by a later success.
    pub async fn error_message(&self) -> Option<String> {
        self.state.lock().await.error_message.clone()
    }

    /// Validate, compute the total, and submit a draft. The server's
    /// returned transaction (with its canonical id, timestamps, and
    /// `pending` status) is appended to the local collection.
    pub async fn create(&self, draft: TransactionDraft) -> Result<Transaction, StoreError> {
        if let Err(errs) = validation::validate_draft(&draft) {
            return Err(self.fail(StoreError::Validation(errs.join("; "))).await);
        }

        let request = CreateTransactionRequest {
            kind: draft.kind,
            total_amount: validation::compute_total(&draft.items),
            transaction_id: transaction_hint(),
            seller: draft.seller,
            buyer: draft.buyer,
            items: draft.items,
            payment_method: draft.payment_method,
            notes: draft.notes,
        };

        match self.client.create_transaction(&request).await {
            Ok(transaction) => {
                let mut state = self.state.lock().await;
                state.transactions.push(transaction.clone());
                state.error_message = None;
                tracing::info!(id = %transaction.id, "transaction created");
                Ok(transaction)
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    pub async fn confirm(&self, id: &str, note: Option<&str>) -> Result<(), StoreError> {
        match self.client.confirm_transaction(id, note).await {
            Ok(()) => {
                self.state.lock().await.error_message = None;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    /// Reject a pending transaction. `reason` is required; an empty or
    /// whitespace reason fails locally with zero network calls.
    pub async fn reject(&self, id: &str, reason: &str) -> Result<(), StoreError> {
        if reason.trim().is_empty() {
            return Err(self
                .fail(StoreError::Validation("a rejection reason is required".into()))
                .await);
        }
        match self.client.reject_transaction(id, reason).await {
            Ok(()) => {
                self.state.lock().await.error_message = None;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    /// Full replace: the local collection becomes exactly the server's
    /// current view. Stale responses (superseded by a newer applied
    /// fetch) are discarded.
    pub async fn fetch(&self) -> Result<(), StoreError> {
        let seq = {
            let mut state = self.state.lock().await;
            state.next_fetch += 1;
            state.next_fetch
        };

        match self.client.list_transactions().await {
            Ok(transactions) => {
                let mut state = self.state.lock().await;
                if seq > state.applied_fetch {
                    state.applied_fetch = seq;
                    state.transactions = transactions;
                    state.error_message = None;
                } else {
                    tracing::debug!(seq, applied = state.applied_fetch, "discarding stale transaction fetch");
                }
                Ok(())
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    async fn fail(&self, err: StoreError) -> StoreError {
        self.state.lock().await.error_message = Some(err.to_string());
        err
    }
}

/// Client-side idempotency hint in the server's id format. The server's
/// returned id is canonical; this value only helps it de-duplicate.
fn transaction_hint() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("TXN-{}", suffix.to_uppercase())
}
