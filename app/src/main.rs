use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail};
use backend::{http::HttpBackendClient, mock::MockBackend, BackendClient, LoginRequest};
use config::{AppConfig, Session};
use stores::{NotificationPoller, NotificationStore, TransactionStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the backend for the configured kind. The HTTP path ends with a
/// usable identity: either a fresh login from env credentials (persisted
/// to config + keychain) or the previously persisted session.
async fn create_backend_client(cfg: &mut AppConfig) -> anyhow::Result<Arc<dyn BackendClient>> {
    match cfg.backend.kind.as_str() {
        "http" => {
            let base_url = cfg
                .backend
                .base_url
                .clone()
                .ok_or_else(|| anyhow!("backend base_url not configured"))?;
            let client = HttpBackendClient::new(
                base_url,
                Duration::from_secs(cfg.backend.request_timeout_secs),
            )?;

            let env_credentials = (
                std::env::var("PHARMATRADE_PHARMACIST_ID"),
                std::env::var("PHARMATRADE_PASSWORD"),
            );
            if let (Ok(pharmacist_id), Ok(password)) = env_credentials {
                let login = client
                    .login(&LoginRequest {
                        pharmacist_id,
                        password,
                    })
                    .await?;
                client
                    .set_identity(Some(login.user.pharmacist_id.clone()))
                    .await;
                config::save_session(
                    cfg,
                    Session {
                        pharmacist_id: Some(login.user.pharmacist_id),
                        user_id: Some(login.user.id),
                        pharmacy_id: cfg.session.pharmacy_id.clone(),
                        logged_in: true,
                    },
                    &login.token,
                )?;
                tracing::info!("session persisted from fresh login");
            } else if config::is_logged_in(cfg) {
                client.set_identity(cfg.session.pharmacist_id.clone()).await;
                tracing::info!("restored persisted session");
            } else {
                bail!("not logged in: set PHARMATRADE_PHARMACIST_ID and PHARMATRADE_PASSWORD");
            }
            Ok(client as Arc<dyn BackendClient>)
        }
        _ => {
            tracing::info!("using mock backend");
            Ok(MockBackend::new() as Arc<dyn BackendClient>)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut cfg = config::load().unwrap_or_default();
    let client = create_backend_client(&mut cfg).await?;

    let transactions = TransactionStore::new(Arc::clone(&client));
    let notifications = Arc::new(NotificationStore::new(Arc::clone(&client)));

    transactions.fetch().await?;
    notifications.fetch_unread().await?;
    tracing::info!(
        transactions = transactions.transactions().await.len(),
        unread = notifications.unread_count().await,
        "initial sync complete"
    );

    let poller = NotificationPoller::new(
        Arc::clone(&notifications),
        Duration::from_secs(cfg.backend.poll_interval_secs),
    );
    poller.start().await;

    tokio::signal::ctrl_c().await?;
    poller.stop().await;
    Ok(())
}
