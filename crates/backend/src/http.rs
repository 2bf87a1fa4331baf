use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pharmatrade_core::models::{Notification, Transaction};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{ApiError, ApiResult};
use crate::types::{
    BulkDeleteRequest, ConfirmTransactionRequest, CreateTransactionRequest, Envelope, ErrorBody,
    LoginRequest, LoginResponse, NotificationPage, NotificationQuery, NotificationStats,
    RejectTransactionRequest,
};
use crate::BackendClient;

/// Name of the identity header every authenticated call carries. The
/// backend scopes queries by this plain pharmacist identifier; there is
/// no bearer-token scheme.
pub const IDENTITY_HEADER: &str = "pharmacistid";

const API_PREFIX: &str = "/api";

/// Production transport over reqwest.
///
/// Stateless apart from the current pharmacist identity, which is set
/// after login (or restored from the persisted session) and attached as
/// the `pharmacistid` header on authenticated calls.
#[derive(Clone)]
pub struct HttpBackendClient {
    base_url: String,
    http_client: reqwest::Client,
    pharmacist_id: Arc<RwLock<Option<String>>>,
}

impl HttpBackendClient {
    pub fn new(base_url: String, timeout: Duration) -> ApiResult<Arc<Self>> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Arc::new(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            pharmacist_id: Arc::new(RwLock::new(None)),
        }))
    }

    /// Set or clear the identity used for authenticated calls.
    pub async fn set_identity(&self, pharmacist_id: Option<String>) {
        let mut guard = self.pharmacist_id.write().await;
        *guard = pharmacist_id;
    }

    fn build_url(&self, path: &str, query: &[(String, String)]) -> ApiResult<Url> {
        let mut url = Url::parse(&format!("{}{}{}", self.base_url, API_PREFIX, path))
            .map_err(|e| ApiError::BadUrl(format!("{}{}: {e}", API_PREFIX, path)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Single entry point for every backend call. Builds the request,
    /// attaches the identity header when required, and decodes the
    /// response: envelope first, bare payload as fallback, typed error
    /// otherwise.
    async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&B>,
        requires_auth: bool,
    ) -> ApiResult<Envelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.build_url(path, query)?;
        let mut request = self.http_client.request(method, url);

        if requires_auth {
            let identity = self.pharmacist_id.read().await.clone().ok_or_else(|| {
                ApiError::BadRequestBody("no pharmacist identity set for authenticated call".into())
            })?;
            request = request.header(IDENTITY_HEADER, identity);
        }

        if let Some(body) = body {
            let value = serde_json::to_value(body)
                .map_err(|e| ApiError::BadRequestBody(e.to_string()))?;
            request = request.json(&value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if status.as_u16() >= 400 {
            return Err(ApiError::Server {
                code: status.as_u16(),
                message: server_message(status.as_u16(), &text),
            });
        }

        decode_envelope(&text)
    }
}

/// Best-effort extraction of a structured error message; falls back to a
/// generic `HTTP <code>` when the body does not parse.
fn server_message(code: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message {
            return message;
        }
        if let Some(errors) = parsed.errors {
            if !errors.is_empty() {
                return errors.join("; ");
            }
        }
    }
    format!("HTTP {code}")
}

fn decode_envelope<T: DeserializeOwned>(text: &str) -> ApiResult<Envelope<T>> {
    if let Ok(envelope) = serde_json::from_str::<Envelope<T>>(text) {
        return Ok(envelope);
    }
    if let Ok(bare) = serde_json::from_str::<T>(text) {
        return Ok(Envelope::bare(bare));
    }
    Err(ApiError::Decode(
        "response matched neither the envelope nor the expected payload".into(),
    ))
}

/// Reject envelopes the server itself marked unsuccessful.
fn ensure_success<T>(envelope: Envelope<T>) -> ApiResult<Envelope<T>> {
    if envelope.success {
        Ok(envelope)
    } else {
        Err(ApiError::Server {
            code: 200,
            message: envelope
                .message
                .unwrap_or_else(|| "request reported as unsuccessful".into()),
        })
    }
}

fn require_data<T>(envelope: Envelope<T>) -> ApiResult<T> {
    ensure_success(envelope)?
        .data
        .ok_or_else(|| ApiError::Decode("expected data field is missing".into()))
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn login(&self, req: &LoginRequest) -> ApiResult<LoginResponse> {
        let envelope: Envelope<LoginResponse> = self
            .request(Method::POST, "/auth/login", &[], Some(req), false)
            .await?;
        let login = require_data(envelope)?;
        tracing::info!(pharmacist_id = %login.user.pharmacist_id, "login succeeded");
        Ok(login)
    }

    async fn list_notifications(&self, query: &NotificationQuery) -> ApiResult<NotificationPage> {
        let envelope = self
            .request(Method::GET, "/notifications", &query.to_pairs(), None::<&()>, true)
            .await?;
        let envelope = ensure_success(envelope)?;
        let notifications: Vec<Notification> = envelope.data.unwrap_or_default();
        tracing::debug!(count = notifications.len(), "fetched notifications");
        Ok(NotificationPage {
            notifications,
            pagination: envelope.pagination,
        })
    }

    async fn mark_notification_read(&self, id: &str) -> ApiResult<()> {
        let path = format!("/notifications/{id}/read");
        let envelope: Envelope<serde_json::Value> = self
            .request(Method::PATCH, &path, &[], None::<&()>, true)
            .await?;
        ensure_success(envelope)?;
        Ok(())
    }

    async fn mark_all_notifications_read(&self) -> ApiResult<()> {
        let envelope: Envelope<serde_json::Value> = self
            .request(Method::PATCH, "/notifications/read-all", &[], None::<&()>, true)
            .await?;
        ensure_success(envelope)?;
        Ok(())
    }

    async fn delete_notification(&self, id: &str) -> ApiResult<()> {
        let path = format!("/notifications/{id}");
        let envelope: Envelope<serde_json::Value> = self
            .request(Method::DELETE, &path, &[], None::<&()>, true)
            .await?;
        ensure_success(envelope)?;
        Ok(())
    }

    async fn delete_notifications(&self, ids: &[String]) -> ApiResult<()> {
        let body = BulkDeleteRequest {
            notification_ids: ids.to_vec(),
        };
        let envelope: Envelope<serde_json::Value> = self
            .request(Method::DELETE, "/notifications", &[], Some(&body), true)
            .await?;
        ensure_success(envelope)?;
        Ok(())
    }

    async fn notification_stats(&self) -> ApiResult<NotificationStats> {
        let envelope = self
            .request(Method::GET, "/notifications/stats", &[], None::<&()>, true)
            .await?;
        require_data(envelope)
    }

    async fn create_transaction(&self, req: &CreateTransactionRequest) -> ApiResult<Transaction> {
        let envelope = self
            .request(Method::POST, "/transactions", &[], Some(req), true)
            .await?;
        let transaction: Transaction = require_data(envelope)?;
        tracing::info!(id = %transaction.id, "transaction created");
        Ok(transaction)
    }

    async fn confirm_transaction(&self, id: &str, note: Option<&str>) -> ApiResult<()> {
        let path = format!("/transactions/{id}/confirm");
        let body = ConfirmTransactionRequest {
            note: note.map(str::to_string),
        };
        let envelope: Envelope<serde_json::Value> = self
            .request(Method::POST, &path, &[], Some(&body), true)
            .await?;
        ensure_success(envelope)?;
        tracing::info!(id, "transaction confirmed");
        Ok(())
    }

    async fn reject_transaction(&self, id: &str, reason: &str) -> ApiResult<()> {
        let path = format!("/transactions/{id}/reject");
        let body = RejectTransactionRequest {
            reason: reason.to_string(),
        };
        let envelope: Envelope<serde_json::Value> = self
            .request(Method::POST, &path, &[], Some(&body), true)
            .await?;
        ensure_success(envelope)?;
        tracing::info!(id, reason, "transaction rejected");
        Ok(())
    }

    async fn list_transactions(&self) -> ApiResult<Vec<Transaction>> {
        let envelope = self
            .request(Method::GET, "/transactions", &[], None::<&()>, true)
            .await?;
        let envelope = ensure_success(envelope)?;
        Ok(envelope.data.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn client_for(server: &mockito::ServerGuard) -> Arc<HttpBackendClient> {
        let client =
            HttpBackendClient::new(server.url(), Duration::from_secs(5)).unwrap();
        client.set_identity(Some("PH-001".to_string())).await;
        client
    }

    #[tokio::test]
    async fn attaches_identity_header_and_decodes_envelope() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/notifications")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("limit".into(), "50".into()),
                mockito::Matcher::UrlEncoded("isRead".into(), "false".into()),
            ]))
            .match_header(IDENTITY_HEADER, "PH-001")
            .with_status(200)
            .with_body(
                r#"{
                    "success": true,
                    "data": [{
                        "id": "n-1",
                        "title": "Offer received",
                        "message": "Trade proposal",
                        "type": "offer",
                        "isRead": false,
                        "date": "2025-03-14T09:26:53.589+0000",
                        "data": {"transactionId": {"id": "TXN-AB12CD34", "status": "pending"}}
                    }],
                    "pagination": {"current": 1, "total": 1, "count": 1, "totalItems": 1, "unreadCount": 4}
                }"#,
            )
            .create_async()
            .await;

        let client = client_for(&server).await;
        let page = client
            .list_notifications(&NotificationQuery::unread(50))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.notifications.len(), 1);
        assert_eq!(page.notifications[0].id, "n-1");
        assert_eq!(page.pagination.unwrap().unread_count, Some(4));
    }

    #[tokio::test]
    async fn wraps_bare_payload_as_successful_envelope() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/auth/login")
            .with_status(200)
            .with_body(
                r#"{
                    "message": "welcome",
                    "token": "opaque-token",
                    "user": {
                        "id": "u-1",
                        "pharmacistId": "PH-001",
                        "name": "A. Ozols",
                        "email": "a.ozols@example.lv",
                        "role": "pharmacist"
                    }
                }"#,
            )
            .create_async()
            .await;

        let client = client_for(&server).await;
        let login = client
            .login(&LoginRequest {
                pharmacist_id: "PH-001".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();

        assert_eq!(login.token, "opaque-token");
        assert_eq!(login.user.pharmacist_id, "PH-001");
    }

    #[tokio::test]
    async fn surfaces_structured_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/transactions/TXN-X/confirm")
            .with_status(422)
            .with_body(r#"{"message": "transaction already confirmed"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client
            .confirm_transaction("TXN-X", None)
            .await
            .unwrap_err();

        match err {
            ApiError::Server { code, message } => {
                assert_eq!(code, 422);
                assert_eq!(message, "transaction already confirmed");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn falls_back_to_generic_message_for_unparseable_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/transactions")
            .with_status(500)
            .with_body("<html>internal error</html>")
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client.list_transactions().await.unwrap_err();

        match err {
            ApiError::Server { code, message } => {
                assert_eq!(code, 500);
                assert_eq!(message, "HTTP 500");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unrecognized_success_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/transactions")
            .with_status(200)
            .with_body("plainly not json")
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client.list_transactions().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_a_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PATCH", "/api/notifications/n-9/read")
            .with_status(200)
            .with_body(r#"{"success": false, "message": "notification not found"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client.mark_notification_read("n-9").await.unwrap_err();
        match err {
            ApiError::Server { message, .. } => {
                assert_eq!(message, "notification not found");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[test]
    fn envelope_decodes_without_default_payload_types() {
        // LoginResponse has no Default impl; a dataless envelope must
        // still decode generically.
        let envelope: Envelope<LoginResponse> =
            decode_envelope(r#"{"success": true, "message": "accepted"}"#).unwrap();
        assert!(envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.message.as_deref(), Some("accepted"));
    }

    #[tokio::test]
    async fn authenticated_call_without_identity_fails_locally() {
        let server = mockito::Server::new_async().await;
        let client =
            HttpBackendClient::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = client.list_transactions().await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequestBody(_)));
    }
}
