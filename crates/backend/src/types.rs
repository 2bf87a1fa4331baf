//! Typed request and response schemas, one per endpoint. The backend
//! wraps most responses in a common envelope; a handful of endpoints
//! (login among them) return the payload bare, which the transport
//! tolerates by falling back to a direct decode.

use pharmatrade_core::models::{
    Money, Notification, NotificationKind, PaymentMethod, TransactionItem, TransactionKind,
    TransactionParty,
};
use serde::{Deserialize, Serialize};

/// Common response wrapper: `{success, data?, message?, pagination?}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> Envelope<T> {
    /// Wrap a bare payload as a successful envelope.
    pub fn bare(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current: u32,
    pub total: u32,
    pub count: u32,
    pub total_items: u64,
    /// Unread total across all pages. When present it outranks any
    /// locally recomputed count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u64>,
}

/// Structured error body the backend sends with HTTP >= 400.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub pharmacist_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub pharmacist_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub token: String,
    pub user: UserProfile,
}

/// Filter parameters for `GET /notifications`.
#[derive(Debug, Clone, Default)]
pub struct NotificationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub is_read: Option<bool>,
    pub kind: Option<NotificationKind>,
}

impl NotificationQuery {
    /// The convenience filter the unread poll uses.
    pub fn unread(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            is_read: Some(false),
            ..Self::default()
        }
    }

    pub(crate) fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(is_read) = self.is_read {
            pairs.push(("isRead".to_string(), is_read.to_string()));
        }
        if let Some(kind) = self.kind {
            pairs.push(("type".to_string(), kind_param(kind).to_string()));
        }
        pairs
    }
}

fn kind_param(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Offer => "offer",
        NotificationKind::Purchase => "purchase",
        NotificationKind::System => "system",
        NotificationKind::Expiry => "expiry",
        NotificationKind::Other => "other",
    }
}

/// One page of notifications plus the server's pagination block.
#[derive(Debug, Clone)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    pub total: u64,
    pub unread: u64,
    pub read: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub seller: TransactionParty,
    pub buyer: TransactionParty,
    pub items: Vec<TransactionItem>,
    pub payment_method: PaymentMethod,
    /// Client-generated idempotency hint (`TXN-` + 8 random chars). The
    /// server's returned id is canonical regardless.
    pub transaction_id: String,
    pub total_amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmTransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectTransactionRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    pub notification_ids: Vec<String>,
}
