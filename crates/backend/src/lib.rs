use async_trait::async_trait;
use pharmatrade_core::models::Transaction;

mod error;
pub mod http;
pub mod mock;
mod types;

pub use error::{ApiError, ApiResult};
pub use types::{
    BulkDeleteRequest, ConfirmTransactionRequest, CreateTransactionRequest, Envelope,
    LoginRequest, LoginResponse, NotificationPage, NotificationQuery, NotificationStats,
    Pagination, RejectTransactionRequest, UserProfile,
};

/// One method per backend endpoint. Implemented over HTTP for production
/// and in memory for tests and offline runs; stores only ever see this
/// trait.
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn login(&self, req: &LoginRequest) -> ApiResult<LoginResponse>;

    async fn list_notifications(&self, query: &NotificationQuery) -> ApiResult<NotificationPage>;
    async fn mark_notification_read(&self, id: &str) -> ApiResult<()>;
    async fn mark_all_notifications_read(&self) -> ApiResult<()>;
    async fn delete_notification(&self, id: &str) -> ApiResult<()>;
    async fn delete_notifications(&self, ids: &[String]) -> ApiResult<()>;
    async fn notification_stats(&self) -> ApiResult<NotificationStats>;

    async fn create_transaction(&self, req: &CreateTransactionRequest) -> ApiResult<Transaction>;
    async fn confirm_transaction(&self, id: &str, note: Option<&str>) -> ApiResult<()>;
    async fn reject_transaction(&self, id: &str, reason: &str) -> ApiResult<()>;
    async fn list_transactions(&self) -> ApiResult<Vec<Transaction>>;
}
