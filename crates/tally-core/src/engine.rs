//! # Transaction Pipeline
//!
//! Wires the stages together in their only valid order:
//!
//! ```text
//! raw record ─► receipt::aggregate ─► vat::discount_ratio / vat_buckets
//!            ─► change::reconcile  ─► rounded TransactionTotals
//! ```
//!
//! The document-only display pass ([`crate::display`]) is not part of this
//! pipeline.

use crate::change::{self, ChangeInputs};
use crate::receipt;
use crate::settings::EngineSettings;
use crate::types::{Transaction, TransactionTotals};
use crate::vat;

/// Derives every computed field of `tx` in place.
///
/// Also derives `overallReceiptDiscount` from a legacy `totalDiscount`
/// when only the latter is present. Running it twice on an unchanged record
/// yields the same record.
///
/// ## Example
/// ```rust
/// use tally_core::engine::calculate;
/// use tally_core::money::Money;
/// use tally_core::payment::{PaymentBreakdown, PaymentMethod};
/// use tally_core::settings::EngineSettings;
/// use tally_core::types::{ReceiptLineItem, Transaction, TransactionType};
/// use rust_decimal::Decimal;
///
/// let mut tx = Transaction::new("t-1", TransactionType::Sale)
///     .with_item(ReceiptLineItem::barcode("A", 1, Money::from_cents(2002), Decimal::from(21)))
///     .with_payments(PaymentBreakdown::new().with(PaymentMethod::Cash, Money::from_cents(2500)));
///
/// calculate(&mut tx, &EngineSettings::default());
/// assert_eq!(tx.totals.change, Money::from_cents(500));
/// assert_eq!(tx.totals.difference, Money::from_cents(-2));
/// ```
pub fn calculate(tx: &mut Transaction, settings: &EngineSettings) {
    let sums = receipt::aggregate(tx);
    if let Some(derived) = receipt::legacy_receipt_discount(tx, &sums) {
        tx.overall_receipt_discount = Some(derived);
    }

    let total_discount_coupon = sums.total_discount_coupon();
    let total_coupon = sums.total_coupon();
    let receipt_discount = tx.receipt_discount();

    let ratio = vat::discount_ratio(
        receipt_discount,
        total_discount_coupon,
        vat::discountable_amount(tx),
    );
    let buckets = vat::vat_buckets(tx, &settings.vat, ratio);

    let reconciliation = change::reconcile(
        tx,
        &ChangeInputs {
            total_paid: sums.total_paid,
            total_coupon,
            total_discount_coupon,
            receipt_discount,
            total_amount: sums.total_amount,
        },
        settings,
    );

    tx.totals = TransactionTotals {
        total_amount: sums.total_amount.rounded(),
        total_paid: sums.total_paid.rounded(),
        total_coupon: total_coupon.rounded(),
        total_discount_coupon: total_discount_coupon.rounded(),
        total_number: sums.total_number,
        total_return: sums.total_return,
        total_store_credit_paid: sums.total_store_credit_paid.rounded(),
        change: reconciliation.change.rounded(),
        difference: reconciliation.difference.rounded(),
        vat: buckets.rounded(),
    };
}

/// Consuming variant of [`calculate`].
pub fn calculated(mut tx: Transaction, settings: &EngineSettings) -> Transaction {
    calculate(&mut tx, settings);
    tx
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::payment::{PaymentBreakdown, PaymentMethod};
    use crate::types::{CouponType, ReceiptLineItem, TransactionType};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_full_sale_with_discount_and_coupons() {
        // 2 × 60.50 (21%) + 1 × 21.80 (9%), 12.28 receipt discount, a 2.00 flat
        // coupon and a 10.00 gift voucher, paid with pin.
        let mut tx = Transaction::new("t", TransactionType::Sale)
            .with_item(ReceiptLineItem::barcode("A", 2, Money::from_cents(6050), dec!(21)))
            .with_item(ReceiptLineItem::barcode("B", 1, Money::from_cents(2180), dec!(9)))
            .with_item(
                ReceiptLineItem::coupon(CouponType::C, 1, Money::ZERO)
                    .with_value(Money::from_cents(200)),
            )
            .with_item(ReceiptLineItem::coupon(CouponType::U, 1, Money::from_cents(1000)))
            .with_receipt_discount(Money::from_cents(1228))
            .with_payments(
                PaymentBreakdown::new().with(PaymentMethod::Pin, Money::from_cents(12252)),
            );

        calculate(&mut tx, &EngineSettings::default());

        let t = &tx.totals;
        assert_eq!(t.total_amount, Money::from_cents(14280));
        assert_eq!(t.total_paid, Money::from_cents(12252));
        assert_eq!(t.total_coupon, Money::from_cents(1000));
        assert_eq!(t.total_discount_coupon, Money::from_cents(200));
        assert_eq!(t.total_number, 3);
        // 122.52 + 10 + 2 + 12.28 - 142.80 = 4.00, card payment so unrounded
        assert_eq!(t.change, Money::from_cents(400));
        assert_eq!(t.difference, Money::ZERO);
        // ratio = 14.28 / 142.80 = 0.1
        assert_eq!(t.vat.hightotal, Money::from_cents(10890));
        assert_eq!(t.vat.highamount, Money::from_cents(1890));
        assert_eq!(t.vat.lowtotal, Money::from_cents(1962));
        assert_eq!(t.vat.lowamount, Money::from_cents(162));
    }

    #[test]
    fn test_legacy_total_discount_is_derived_once() {
        let mut tx = Transaction::new("t", TransactionType::Sale)
            .with_item(ReceiptLineItem::barcode("A", 1, Money::from_cents(1000), dec!(21)))
            .with_item(
                ReceiptLineItem::coupon(CouponType::Blank, 1, Money::ZERO)
                    .with_value(Money::from_cents(100)),
            )
            .with_payments(PaymentBreakdown::new().with(PaymentMethod::Cash, Money::from_cents(700)));
        tx.total_discount = Some(Money::from_cents(300));

        calculate(&mut tx, &EngineSettings::default());
        assert_eq!(tx.overall_receipt_discount, Some(Money::from_cents(200)));
        assert_eq!(tx.totals.change, Money::ZERO);

        let first = tx.clone();
        calculate(&mut tx, &EngineSettings::default());
        assert_eq!(tx, first);
    }

    #[test]
    fn test_consignment_has_no_change() {
        let mut tx = Transaction::new("c", TransactionType::Consignment)
            .with_item(ReceiptLineItem::barcode("A", 1, Money::from_cents(4999), dec!(21)));
        calculate(&mut tx, &EngineSettings::default());
        assert_eq!(tx.totals.total_amount, Money::from_cents(4999));
        assert_eq!(tx.totals.change, Money::ZERO);
        assert_eq!(tx.totals.difference, Money::ZERO);
    }

    #[test]
    fn test_return_line_negative_totals() {
        let mut tx = Transaction::new("t", TransactionType::Sale)
            .with_item(ReceiptLineItem::barcode("A", -1, Money::from_cents(1210), dec!(21)))
            .with_payments(PaymentBreakdown::new().with(PaymentMethod::Cash, Money::from_cents(-1210)));
        calculate(&mut tx, &EngineSettings::default());
        assert_eq!(tx.totals.total_amount, Money::from_cents(-1210));
        assert_eq!(tx.totals.total_return, 1);
        assert_eq!(tx.totals.vat.highamount, Money::from_cents(-210));
        assert_eq!(tx.totals.change, Money::ZERO);
    }

    proptest! {
        #[test]
        fn prop_calculate_is_idempotent(
            lines in prop::collection::vec((-3i64..=3, 1i64..10_000, 0usize..3), 1..8),
            discount in 0i64..500,
            cash in 0i64..50_000,
        ) {
            let rates = [dec!(0), dec!(9), dec!(21)];
            let mut tx = Transaction::new("t", TransactionType::Sale)
                .with_receipt_discount(Money::from_cents(discount))
                .with_payments(PaymentBreakdown::new().with(PaymentMethod::Cash, Money::from_cents(cash)));
            for (qty, cents, rate) in &lines {
                tx.receipt.push(ReceiptLineItem::barcode("X", *qty, Money::from_cents(*cents), rates[*rate]));
            }
            let once = calculated(tx, &EngineSettings::default());
            let twice = calculated(once.clone(), &EngineSettings::default());
            prop_assert_eq!(once, twice);
        }
    }
}
