//! In-memory backend used by store tests and offline runs. Holds its own
//! "server-side" notification and transaction sets, records every call,
//! and can be told to fail the next call with a chosen error.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pharmatrade_core::models::{Notification, Transaction, TransactionStatus};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{ApiError, ApiResult};
use crate::types::{
    CreateTransactionRequest, LoginRequest, LoginResponse, NotificationPage, NotificationQuery,
    NotificationStats, Pagination, UserProfile,
};
use crate::BackendClient;

#[derive(Default)]
struct MockState {
    notifications: Vec<Notification>,
    transactions: Vec<Transaction>,
    fail_next: Option<ApiError>,
    delay_next: Option<std::time::Duration>,
    calls: Vec<String>,
    next_transaction: u32,
}

#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replace the server-side notification set.
    pub async fn seed_notifications(&self, notifications: Vec<Notification>) {
        self.state.lock().await.notifications = notifications;
    }

    /// Replace the server-side transaction set.
    pub async fn seed_transactions(&self, transactions: Vec<Transaction>) {
        self.state.lock().await.transactions = transactions;
    }

    /// Fail the next call (whatever it is) with `err`, then recover.
    pub async fn fail_next(&self, err: ApiError) {
        self.state.lock().await.fail_next = Some(err);
    }

    /// Delay the next list response after its snapshot is taken. Lets
    /// tests stage a stale response arriving after a fresher one.
    pub async fn delay_next_response(&self, delay: std::time::Duration) {
        self.state.lock().await.delay_next = Some(delay);
    }

    /// Names of the trait methods invoked so far, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    /// Current server-side notifications, for asserting on mirror state.
    pub async fn server_notifications(&self) -> Vec<Notification> {
        self.state.lock().await.notifications.clone()
    }

    pub async fn server_transactions(&self) -> Vec<Transaction> {
        self.state.lock().await.transactions.clone()
    }

    async fn begin(&self, call: &str) -> ApiResult<MutexGuard<'_, MockState>> {
        let mut state = self.state.lock().await;
        state.calls.push(call.to_string());
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        Ok(state)
    }

    /// Server-side behavior shared by confirm and reject: move the
    /// transaction and refresh the status mirrored on any notification
    /// that references it.
    fn transition(
        state: &mut MockState,
        id: &str,
        status: TransactionStatus,
    ) -> ApiResult<()> {
        let transaction = state
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ApiError::Server {
                code: 404,
                message: format!("transaction {id} not found"),
            })?;
        if transaction.status != TransactionStatus::Pending {
            return Err(ApiError::Server {
                code: 409,
                message: format!("transaction {id} is not pending"),
            });
        }
        transaction.status = status;
        transaction.updated_at = Utc::now();

        for notification in &mut state.notifications {
            if let Some(data) = notification.data.as_mut() {
                if let Some(txn) = data.transaction.as_mut() {
                    if txn.id == id {
                        txn.status = Some(status);
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn login(&self, req: &LoginRequest) -> ApiResult<LoginResponse> {
        self.begin("login").await?;
        Ok(LoginResponse {
            message: Some("welcome".into()),
            token: "mock-token".into(),
            user: UserProfile {
                id: format!("user-{}", req.pharmacist_id),
                pharmacist_id: req.pharmacist_id.clone(),
                name: "Mock Pharmacist".into(),
                email: format!("{}@example.test", req.pharmacist_id),
                role: "pharmacist".into(),
            },
        })
    }

    async fn list_notifications(&self, query: &NotificationQuery) -> ApiResult<NotificationPage> {
        let mut state = self.begin("list_notifications").await?;
        let delay = state.delay_next.take();

        let unread_total = state
            .notifications
            .iter()
            .filter(|n| !n.is_read)
            .count() as u64;

        let mut matching: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| query.is_read.map_or(true, |read| n.is_read == read))
            .filter(|n| query.kind.map_or(true, |kind| n.kind == kind))
            .cloned()
            .collect();
        let total_items = matching.len() as u64;
        if let Some(limit) = query.limit {
            matching.truncate(limit as usize);
        }

        let page = NotificationPage {
            pagination: Some(Pagination {
                current: query.page.unwrap_or(1),
                total: 1,
                count: matching.len() as u32,
                total_items,
                unread_count: Some(unread_total),
            }),
            notifications: matching,
        };
        drop(state);

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(page)
    }

    async fn mark_notification_read(&self, id: &str) -> ApiResult<()> {
        let mut state = self.begin("mark_notification_read").await?;
        let notification = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| ApiError::Server {
                code: 404,
                message: format!("notification {id} not found"),
            })?;
        notification.is_read = true;
        Ok(())
    }

    async fn mark_all_notifications_read(&self) -> ApiResult<()> {
        let mut state = self.begin("mark_all_notifications_read").await?;
        for notification in &mut state.notifications {
            notification.is_read = true;
        }
        Ok(())
    }

    async fn delete_notification(&self, id: &str) -> ApiResult<()> {
        let mut state = self.begin("delete_notification").await?;
        let before = state.notifications.len();
        state.notifications.retain(|n| n.id != id);
        if state.notifications.len() == before {
            return Err(ApiError::Server {
                code: 404,
                message: format!("notification {id} not found"),
            });
        }
        Ok(())
    }

    async fn delete_notifications(&self, ids: &[String]) -> ApiResult<()> {
        let mut state = self.begin("delete_notifications").await?;
        state.notifications.retain(|n| !ids.contains(&n.id));
        Ok(())
    }

    async fn notification_stats(&self) -> ApiResult<NotificationStats> {
        let state = self.begin("notification_stats").await?;
        let total = state.notifications.len() as u64;
        let unread = state.notifications.iter().filter(|n| !n.is_read).count() as u64;
        Ok(NotificationStats {
            total,
            unread,
            read: total - unread,
        })
    }

    async fn create_transaction(&self, req: &CreateTransactionRequest) -> ApiResult<Transaction> {
        let mut state = self.begin("create_transaction").await?;
        state.next_transaction += 1;
        let now = Utc::now();
        let transaction = Transaction {
            id: format!("TXN-MOCK{:04}", state.next_transaction),
            kind: req.kind,
            seller_pharmacy_id: req.seller.pharmacy_id.clone(),
            seller_user_id: req.seller.user_id.clone(),
            buyer_pharmacy_id: req.buyer.pharmacy_id.clone(),
            buyer_user_id: req.buyer.user_id.clone(),
            items: req.items.clone(),
            payment_method: req.payment_method,
            total_amount: req.total_amount.clone(),
            status: TransactionStatus::Pending,
            notes: req.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        state.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn confirm_transaction(&self, id: &str, _note: Option<&str>) -> ApiResult<()> {
        let mut state = self.begin("confirm_transaction").await?;
        Self::transition(&mut state, id, TransactionStatus::Confirmed)
    }

    async fn reject_transaction(&self, id: &str, _reason: &str) -> ApiResult<()> {
        let mut state = self.begin("reject_transaction").await?;
        Self::transition(&mut state, id, TransactionStatus::Rejected)
    }

    async fn list_transactions(&self) -> ApiResult<Vec<Transaction>> {
        let mut state = self.begin("list_transactions").await?;
        let delay = state.delay_next.take();
        let transactions = state.transactions.clone();
        drop(state);

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(transactions)
    }
}
