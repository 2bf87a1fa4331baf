//! Shared builders for store tests.

use chrono::Utc;
use pharmatrade_core::models::{
    Money, Notification, NotificationData, NotificationKind, PaymentMethod, Transaction,
    TransactionItem, TransactionKind, TransactionParty, TransactionRef, TransactionStatus,
};
use pharmatrade_core::validation::TransactionDraft;
use rust_decimal::Decimal;

pub fn item(medicine: &str, quantity: u32, price: Decimal) -> TransactionItem {
    TransactionItem {
        medicine_id: medicine.to_string(),
        quantity,
        unit_price: Money::new("EUR", price),
        batch_number: "B-1".into(),
        expiry_date: "2026-06-30".into(),
    }
}

pub fn draft_with_items(items: Vec<TransactionItem>) -> TransactionDraft {
    TransactionDraft {
        kind: TransactionKind::Trade,
        seller: TransactionParty {
            pharmacy_id: "ph-seller".into(),
            user_id: "u-seller".into(),
        },
        buyer: TransactionParty {
            pharmacy_id: "ph-buyer".into(),
            user_id: "u-buyer".into(),
        },
        items,
        payment_method: PaymentMethod::BankTransfer,
        notes: None,
    }
}

pub fn pending_transaction(id: &str) -> Transaction {
    let now = Utc::now();
    Transaction {
        id: id.to_string(),
        kind: TransactionKind::Trade,
        seller_pharmacy_id: "ph-seller".into(),
        seller_user_id: "u-seller".into(),
        buyer_pharmacy_id: "ph-buyer".into(),
        buyer_user_id: "u-buyer".into(),
        items: vec![item("med-1", 1, Decimal::ONE)],
        payment_method: PaymentMethod::BankTransfer,
        total_amount: Money::new("EUR", Decimal::ONE),
        status: TransactionStatus::Pending,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn notification(id: &str, kind: NotificationKind, is_read: bool) -> Notification {
    Notification {
        id: id.to_string(),
        title: "title".into(),
        message: "message".into(),
        kind,
        is_read,
        date: Utc::now(),
        data: None,
    }
}

/// An unread offer notification linked to `transaction_id` with a
/// `pending` mirrored status.
pub fn offer_notification(id: &str, transaction_id: &str) -> Notification {
    let mut n = notification(id, NotificationKind::Offer, false);
    n.data = Some(NotificationData {
        transaction: Some(TransactionRef {
            id: transaction_id.to_string(),
            status: Some(TransactionStatus::Pending),
        }),
    });
    n
}
