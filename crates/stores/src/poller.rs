use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::notifications::NotificationStore;

/// Recurring unread-notification refresh, standing in for push delivery.
///
/// The poller owns exactly one task and aborts only that task on stop, so
/// stopping it can never cancel an unrelated in-flight store call. Ticks
/// are delayed rather than bursted when a poll runs long; there is never
/// more than one timer-driven poll in flight.
pub struct NotificationPoller {
    store: Arc<NotificationStore>,
    period: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationPoller {
    pub fn new(store: Arc<NotificationStore>, period: Duration) -> Self {
        Self {
            store,
            period,
            handle: Mutex::new(None),
        }
    }

    /// Begin polling. Idempotent: a no-op while a live task exists.
    pub async fn start(&self) {
        let mut handle = self.handle.lock().await;
        if let Some(task) = handle.as_ref() {
            if !task.is_finished() {
                tracing::debug!("notification poller already running");
                return;
            }
        }

        let store = Arc::clone(&self.store);
        let period = self.period;
        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = store.fetch_unread().await {
                    tracing::warn!(error = %err, "unread notification poll failed");
                }
            }
        }));
        tracing::info!(period_secs = self.period.as_secs(), "notification poller started");
    }

    /// Stop polling. Aborts the poller's own task and nothing else.
    pub async fn stop(&self) {
        if let Some(task) = self.handle.lock().await.take() {
            task.abort();
            tracing::info!("notification poller stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}
