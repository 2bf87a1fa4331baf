//! Client-side checks applied before a draft transaction is submitted.
//! The server re-validates everything; these rules exist so malformed
//! input never costs a network round trip.

use rust_decimal::Decimal;

use crate::models::{Money, PaymentMethod, TransactionItem, TransactionKind, TransactionParty};

/// Input to `TransactionStore::create`. Everything the create endpoint
/// needs except the server-assigned fields.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    pub seller: TransactionParty,
    pub buyer: TransactionParty,
    pub items: Vec<TransactionItem>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

pub fn validate_draft(draft: &TransactionDraft) -> Result<(), Vec<String>> {
    let mut errs = Vec::new();

    if draft.items.is_empty() {
        errs.push("transaction must contain at least one item".to_string());
    }

    for (i, item) in draft.items.iter().enumerate() {
        if item.medicine_id.trim().is_empty() {
            errs.push(format!("item {}: medicine id is empty", i));
        }
        if item.quantity == 0 {
            errs.push(format!("item {}: quantity must be positive", i));
        }
        if item.unit_price.amount < Decimal::ZERO {
            errs.push(format!("item {}: unit price must not be negative", i));
        }
        if item.unit_price.currency.trim().is_empty() {
            errs.push(format!("item {}: currency is empty", i));
        }
    }

    if let Some(first) = draft.items.first() {
        let currency = &first.unit_price.currency;
        if draft
            .items
            .iter()
            .any(|item| &item.unit_price.currency != currency)
        {
            errs.push("all items must share one currency".to_string());
        }
    }

    if draft.seller.pharmacy_id.trim().is_empty() || draft.seller.user_id.trim().is_empty() {
        errs.push("seller identifiers are incomplete".to_string());
    }
    if draft.buyer.pharmacy_id.trim().is_empty() || draft.buyer.user_id.trim().is_empty() {
        errs.push("buyer identifiers are incomplete".to_string());
    }

    if errs.is_empty() {
        Ok(())
    } else {
        Err(errs)
    }
}

/// Sum of line subtotals, rounded to the currency's minor unit.
///
/// Call only on a validated draft: items must be non-empty and share one
/// currency.
pub fn compute_total(items: &[TransactionItem]) -> Money {
    let currency = items
        .first()
        .map(|i| i.unit_price.currency.clone())
        .unwrap_or_default();
    let amount: Decimal = items.iter().map(TransactionItem::subtotal).sum();
    Money {
        currency,
        amount: amount.round_dp(2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(medicine: &str, quantity: u32, price: Decimal) -> TransactionItem {
        TransactionItem {
            medicine_id: medicine.to_string(),
            quantity,
            unit_price: Money::new("EUR", price),
            batch_number: "B-1".into(),
            expiry_date: "2026-06-30".into(),
        }
    }

    fn draft(items: Vec<TransactionItem>) -> TransactionDraft {
        TransactionDraft {
            kind: TransactionKind::Trade,
            seller: TransactionParty {
                pharmacy_id: "ph-1".into(),
                user_id: "u-1".into(),
            },
            buyer: TransactionParty {
                pharmacy_id: "ph-2".into(),
                user_id: "u-2".into(),
            },
            items,
            payment_method: PaymentMethod::BankTransfer,
            notes: None,
        }
    }

    #[test]
    fn accepts_well_formed_draft() {
        let d = draft(vec![item("med-1", 2, dec!(1.50)), item("med-2", 1, dec!(4.05))]);
        assert!(validate_draft(&d).is_ok());
    }

    #[test]
    fn rejects_empty_item_list() {
        let errs = validate_draft(&draft(vec![])).unwrap_err();
        assert!(errs.iter().any(|e| e.contains("at least one item")));
    }

    #[test]
    fn rejects_zero_quantity() {
        let errs = validate_draft(&draft(vec![item("med-1", 0, dec!(1.00))])).unwrap_err();
        assert!(errs.iter().any(|e| e.contains("quantity")));
    }

    #[test]
    fn rejects_negative_price_and_mixed_currency() {
        let mut bad = item("med-2", 1, dec!(-0.01));
        bad.unit_price.currency = "USD".into();
        let errs = validate_draft(&draft(vec![item("med-1", 1, dec!(1.00)), bad])).unwrap_err();
        assert!(errs.iter().any(|e| e.contains("negative")));
        assert!(errs.iter().any(|e| e.contains("one currency")));
    }

    #[test]
    fn total_is_sum_of_subtotals_at_minor_unit_precision() {
        let total = compute_total(&[item("med-1", 3, dec!(2.95)), item("med-2", 2, dec!(0.05))]);
        assert_eq!(total, Money::new("EUR", dec!(8.95)));
    }
}
