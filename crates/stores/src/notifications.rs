use std::sync::Arc;

use backend::{BackendClient, NotificationQuery, NotificationStats};
use pharmatrade_core::models::Notification;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::transactions::TransactionStore;

/// Page size for the unread convenience fetch and the poller.
const UNREAD_FETCH_LIMIT: u32 = 50;

#[derive(Default)]
struct NotificationState {
    notifications: Vec<Notification>,
    unread_count: u64,
    error_message: Option<String>,
    next_fetch: u64,
    applied_fetch: u64,
}

/// The notification feed and its derived unread count.
///
/// Fetches are full replaces; mutations follow confirm-then-mutate: the
/// local entry changes only after the server accepted the call, so a
/// failure leaves collection and count exactly as they were.
pub struct NotificationStore {
    client: Arc<dyn BackendClient>,
    state: Mutex<NotificationState>,
}

impl NotificationStore {
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self {
            client,
            state: Mutex::new(NotificationState::default()),
        }
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.lock().await.notifications.clone()
    }

    /// Unread total. Server-supplied when the last fetch carried one,
    /// otherwise maintained locally.
    pub async fn unread_count(&self) -> u64 {
        self.state.lock().await.unread_count
    }

    pub async fn error_message(&self) -> Option<String> {
        self.state.lock().await.error_message.clone()
    }

    /// Full replace of the feed with the server's current view. The
    /// unread count prefers the server's `unreadCount` over a local
    /// recount; stale responses are discarded by sequence number.
    pub async fn fetch(&self, query: NotificationQuery) -> Result<(), StoreError> {
        let seq = {
            let mut state = self.state.lock().await;
            state.next_fetch += 1;
            state.next_fetch
        };

        match self.client.list_notifications(&query).await {
            Ok(page) => {
                let mut state = self.state.lock().await;
                if seq > state.applied_fetch {
                    state.applied_fetch = seq;
                    let server_unread = page.pagination.as_ref().and_then(|p| p.unread_count);
                    state.unread_count = server_unread.unwrap_or_else(|| {
                        page.notifications.iter().filter(|n| !n.is_read).count() as u64
                    });
                    state.notifications = page.notifications;
                    state.error_message = None;
                    tracing::debug!(
                        count = state.notifications.len(),
                        unread = state.unread_count,
                        "notification feed replaced"
                    );
                } else {
                    tracing::debug!(seq, applied = state.applied_fetch, "discarding stale notification fetch");
                }
                Ok(())
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    /// The refresh both manual pulls and the poller use.
    pub async fn fetch_unread(&self) -> Result<(), StoreError> {
        self.fetch(NotificationQuery::unread(UNREAD_FETCH_LIMIT)).await
    }

    /// Mark one notification read. The unread count drops by one only
    /// when the local entry actually flips, so repeating the call never
    /// double-decrements.
    pub async fn mark_read(&self, id: &str) -> Result<(), StoreError> {
        match self.client.mark_notification_read(id).await {
            Ok(()) => {
                let mut state = self.state.lock().await;
                if let Some(notification) =
                    state.notifications.iter_mut().find(|n| n.id == id)
                {
                    if !notification.is_read {
                        notification.is_read = true;
                        state.unread_count = state.unread_count.saturating_sub(1);
                    }
                }
                state.error_message = None;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    pub async fn mark_all_read(&self) -> Result<(), StoreError> {
        match self.client.mark_all_notifications_read().await {
            Ok(()) => {
                let mut state = self.state.lock().await;
                for notification in &mut state.notifications {
                    notification.is_read = true;
                }
                state.unread_count = 0;
                state.error_message = None;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        match self.client.delete_notification(id).await {
            Ok(()) => {
                let mut state = self.state.lock().await;
                let removed_unread = state
                    .notifications
                    .iter()
                    .filter(|n| n.id == id && !n.is_read)
                    .count() as u64;
                state.notifications.retain(|n| n.id != id);
                state.unread_count = state.unread_count.saturating_sub(removed_unread);
                state.error_message = None;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    pub async fn delete_many(&self, ids: &[String]) -> Result<(), StoreError> {
        match self.client.delete_notifications(ids).await {
            Ok(()) => {
                let mut state = self.state.lock().await;
                let removed_unread = state
                    .notifications
                    .iter()
                    .filter(|n| ids.contains(&n.id) && !n.is_read)
                    .count() as u64;
                state.notifications.retain(|n| !ids.contains(&n.id));
                state.unread_count = state.unread_count.saturating_sub(removed_unread);
                state.error_message = None;
                Ok(())
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    /// One-shot stats fetch; nothing is cached.
    pub async fn stats(&self) -> Result<NotificationStats, StoreError> {
        match self.client.notification_stats().await {
            Ok(stats) => {
                self.state.lock().await.error_message = None;
                Ok(stats)
            }
            Err(err) => Err(self.fail(err.into()).await),
        }
    }

    /// Accept the offer behind a notification: confirm the linked
    /// transaction, then re-fetch the feed so the mirrored status shows
    /// whatever the server now reports. The refresh (rather than a local
    /// patch) keeps the server the only owner of transaction state.
    pub async fn approve_offer(
        &self,
        notification_id: &str,
        transactions: &TransactionStore,
    ) -> Result<(), StoreError> {
        let transaction_id = self.actionable_transaction(notification_id).await?;
        transactions.confirm(&transaction_id, None).await?;
        tracing::info!(notification_id, transaction_id = %transaction_id, "offer approved");
        self.fetch_unread().await
    }

    /// Decline the offer behind a notification. Same flow as approval;
    /// the reason is validated by the transaction store before any
    /// network call.
    pub async fn decline_offer(
        &self,
        notification_id: &str,
        reason: &str,
        transactions: &TransactionStore,
    ) -> Result<(), StoreError> {
        let transaction_id = self.actionable_transaction(notification_id).await?;
        transactions.reject(&transaction_id, reason).await?;
        tracing::info!(notification_id, transaction_id = %transaction_id, "offer declined");
        self.fetch_unread().await
    }

    /// Resolve a notification to its linked transaction id, enforcing
    /// the actionability rule: offers only, and only while the mirrored
    /// status is still `pending` (or absent).
    async fn actionable_transaction(&self, notification_id: &str) -> Result<String, StoreError> {
        let state = self.state.lock().await;
        let notification = state
            .notifications
            .iter()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| {
                StoreError::Validation(format!("unknown notification {notification_id}"))
            })?;
        if !notification.is_actionable() {
            return Err(StoreError::Validation(format!(
                "notification {notification_id} is no longer actionable"
            )));
        }
        notification
            .transaction_id()
            .map(str::to_string)
            .ok_or_else(|| {
                StoreError::Validation(format!(
                    "notification {notification_id} has no linked transaction"
                ))
            })
    }

    async fn fail(&self, err: StoreError) -> StoreError {
        self.state.lock().await.error_message = Some(err.to_string());
        err
    }
}
