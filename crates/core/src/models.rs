use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::wire;

/// A currency-tagged amount. Arithmetic is exact (`rust_decimal`), never
/// floating point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub currency: String,
    pub amount: Decimal,
}

impl Money {
    pub fn new(currency: &str, amount: Decimal) -> Self {
        Self {
            currency: currency.to_string(),
            amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Sale,
    Trade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Credit,
}

/// Transaction lifecycle. The client writes only the `pending` →
/// `confirmed`/`rejected` edge (through explicit confirm/reject calls);
/// every other state is server-driven and read-only here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Rejected,
    InTransit,
    Delivered,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    pub medicine_id: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub batch_number: String,
    pub expiry_date: String,
}

impl TransactionItem {
    /// Line subtotal: unit price × quantity.
    pub fn subtotal(&self) -> Decimal {
        self.unit_price.amount * Decimal::from(self.quantity)
    }
}

/// One party to a trade, as the create endpoint expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParty {
    pub pharmacy_id: String,
    pub user_id: String,
}

/// A medication trade as the server reports it. `id`, `status` and the
/// timestamps are server-assigned and authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub seller_pharmacy_id: String,
    pub seller_user_id: String,
    pub buyer_pharmacy_id: String,
    pub buyer_user_id: String,
    pub items: Vec<TransactionItem>,
    pub payment_method: PaymentMethod,
    pub total_amount: Money,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "wire::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "wire::timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Offer,
    Purchase,
    System,
    Expiry,
    #[serde(other)]
    Other,
}

/// Reference from an offer notification to its transaction, with the
/// transaction's lifecycle status mirrored at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(default, rename = "transactionId", skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub is_read: bool,
    #[serde(with = "wire::timestamp")]
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NotificationData>,
}

impl Notification {
    /// Whether approve/reject may be offered for this notification.
    ///
    /// True only for an offer with a linked transaction whose mirrored
    /// status is still `pending` (or not yet mirrored). Once the
    /// transaction has left `pending`, the notification is a read-only
    /// status display.
    pub fn is_actionable(&self) -> bool {
        if self.kind != NotificationKind::Offer {
            return false;
        }
        match self.data.as_ref().and_then(|d| d.transaction.as_ref()) {
            Some(txn) => matches!(txn.status, None | Some(TransactionStatus::Pending)),
            None => false,
        }
    }

    /// Id of the linked transaction, when present.
    pub fn transaction_id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.transaction.as_ref())
            .map(|t| t.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn offer(status: Option<TransactionStatus>) -> Notification {
        Notification {
            id: "n-1".into(),
            title: "New offer".into(),
            message: "PharmaOne offered a trade".into(),
            kind: NotificationKind::Offer,
            is_read: false,
            date: wire::parse_timestamp("2025-03-14T09:26:53.589+0000").unwrap(),
            data: Some(NotificationData {
                transaction: Some(TransactionRef {
                    id: "TXN-AB12CD34".into(),
                    status,
                }),
            }),
        }
    }

    #[test]
    fn offer_with_pending_mirror_is_actionable() {
        assert!(offer(Some(TransactionStatus::Pending)).is_actionable());
    }

    #[test]
    fn offer_without_mirrored_status_is_actionable() {
        assert!(offer(None).is_actionable());
    }

    #[test]
    fn offer_past_pending_is_not_actionable() {
        for status in [
            TransactionStatus::Confirmed,
            TransactionStatus::Rejected,
            TransactionStatus::InTransit,
            TransactionStatus::Delivered,
            TransactionStatus::Cancelled,
            TransactionStatus::Completed,
        ] {
            assert!(!offer(Some(status)).is_actionable(), "{status:?}");
        }
    }

    #[test]
    fn offer_without_transaction_ref_is_not_actionable() {
        let mut n = offer(None);
        n.data = None;
        assert!(!n.is_actionable());
        assert_eq!(n.transaction_id(), None);
    }

    #[test]
    fn non_offer_kinds_are_never_actionable() {
        let mut n = offer(Some(TransactionStatus::Pending));
        n.kind = NotificationKind::Expiry;
        assert!(!n.is_actionable());
    }

    #[test]
    fn notification_decodes_from_wire_json() {
        let json = r#"{
            "id": "n-42",
            "title": "Offer received",
            "message": "Trade proposal for amoxicillin",
            "type": "offer",
            "isRead": false,
            "date": "2025-03-14T09:26:53.589+0000",
            "data": {
                "transactionId": { "id": "TXN-9KQ2XY7P", "status": "pending" }
            }
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.kind, NotificationKind::Offer);
        assert_eq!(n.transaction_id(), Some("TXN-9KQ2XY7P"));
        assert!(n.is_actionable());
    }

    #[test]
    fn unknown_notification_kind_decodes_as_other() {
        let json = r#"{
            "id": "n-7",
            "title": "t",
            "message": "m",
            "type": "recall_alert",
            "isRead": true,
            "date": "2025-03-14T09:26:53.589+0000"
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.kind, NotificationKind::Other);
        assert!(!n.is_actionable());
    }

    #[test]
    fn item_subtotal_is_exact() {
        let item = TransactionItem {
            medicine_id: "med-1".into(),
            quantity: 3,
            unit_price: Money::new("EUR", dec!(2.95)),
            batch_number: "B-100".into(),
            expiry_date: "2026-01-31".into(),
        };
        assert_eq!(item.subtotal(), dec!(8.85));
    }
}
