//! # Receipt Aggregator
//!
//! Single pass over a transaction's lines producing category-bucketed sums.
//!
//! ## What Goes Where
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line category      accumulates into                                    │
//! │  ─────────────────  ──────────────────────────────────────────────────  │
//! │  barcode            total_amount += qty*price                           │
//! │                     total_number / total_return (by sign of qty)        │
//! │  storecredit        same as barcode, plus store_credit_paid             │
//! │  coupon             coupon bucket[type] += value (C, space)             │
//! │                                          or price (A, U, I, T, O)       │
//! │                     quantity is NOT applied to coupon buckets           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Coupon buckets ignore `qty` here, while the legacy-ERP events in
//! [`crate::erp`] multiply it in. Both behaviours are kept as they are.

use std::collections::HashMap;

use crate::money::Money;
use crate::payment::PaymentMethod;
use crate::types::{CouponType, Transaction};

/// Sums produced by [`aggregate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptSums {
    pub total_amount: Money,
    pub total_paid: Money,
    pub total_number: i64,
    pub total_return: i64,
    pub total_store_credit_paid: Money,
    coupons: HashMap<CouponType, Money>,
}

impl ReceiptSums {
    /// Accumulated amount for one coupon type.
    #[inline]
    pub fn coupon_bucket(&self, coupon_type: CouponType) -> Money {
        self.coupons.get(&coupon_type).copied().unwrap_or(Money::ZERO)
    }

    /// `bucket[space] + bucket[C]`
    pub fn total_discount_coupon(&self) -> Money {
        self.coupon_bucket(CouponType::Blank) + self.coupon_bucket(CouponType::C)
    }

    /// `bucket[A] + bucket[U] + bucket[T] - bucket[I]`
    pub fn total_coupon(&self) -> Money {
        self.coupon_bucket(CouponType::A) + self.coupon_bucket(CouponType::U)
            + self.coupon_bucket(CouponType::T)
            - self.coupon_bucket(CouponType::I)
    }
}

/// Aggregates a transaction's receipt lines and payments.
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::receipt::aggregate;
/// use tally_core::types::{ReceiptLineItem, Transaction, TransactionType};
/// use rust_decimal::Decimal;
///
/// let tx = Transaction::new("t-1", TransactionType::Sale)
///     .with_item(ReceiptLineItem::barcode("A1", 2, Money::from_cents(500), Decimal::from(21)))
///     .with_item(ReceiptLineItem::barcode("A2", -1, Money::from_cents(300), Decimal::from(21)));
///
/// let sums = aggregate(&tx);
/// assert_eq!(sums.total_amount, Money::from_cents(700));
/// assert_eq!(sums.total_number, 2);
/// assert_eq!(sums.total_return, 1);
/// ```
pub fn aggregate(tx: &Transaction) -> ReceiptSums {
    let mut sums = ReceiptSums::default();

    for item in &tx.receipt {
        if item.is_coupon() {
            let kind = item.coupon_kind();
            let amount = if kind.is_flat_discount() {
                item.face_value()
            } else {
                item.price
            };
            *sums.coupons.entry(kind).or_insert(Money::ZERO) += amount;
            continue;
        }

        // barcode and storecredit
        let amount = item.line_amount();
        sums.total_amount += amount;
        if item.qty > 0 {
            sums.total_number += item.qty;
        } else if item.qty < 0 {
            sums.total_return -= item.qty;
        }
        if item.is_store_credit() {
            sums.total_store_credit_paid += amount;
        }
    }

    sums.total_paid = tx.payments.sum_of(&PaymentMethod::PAID);
    sums
}

/// Legacy receipt-discount derivation.
///
/// Records written before `overallReceiptDiscount` existed carry only
/// `totalDiscount`, which includes flat coupons. Returns the derived
/// receipt discount, or `None` when the record needs no derivation.
pub fn legacy_receipt_discount(tx: &Transaction, sums: &ReceiptSums) -> Option<Money> {
    match (tx.overall_receipt_discount, tx.total_discount) {
        (None, Some(total_discount)) => Some(total_discount - sums.total_discount_coupon()),
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentBreakdown;
    use crate::types::{ReceiptLineItem, TransactionType};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn sale() -> Transaction {
        Transaction::new("t-1", TransactionType::Sale)
    }

    #[test]
    fn test_barcode_and_store_credit_totals() {
        let tx = sale()
            .with_item(ReceiptLineItem::barcode("A", 3, Money::from_cents(250), dec!(21)))
            .with_item(ReceiptLineItem::store_credit(1, Money::from_cents(1000)));

        let sums = aggregate(&tx);
        assert_eq!(sums.total_amount, Money::from_cents(1750));
        assert_eq!(sums.total_number, 4);
        assert_eq!(sums.total_return, 0);
        assert_eq!(sums.total_store_credit_paid, Money::from_cents(1000));
    }

    #[test]
    fn test_coupon_buckets_ignore_quantity() {
        let tx = sale()
            .with_item(ReceiptLineItem::coupon(CouponType::A, 3, Money::from_cents(500)))
            .with_item(ReceiptLineItem::coupon(CouponType::U, 2, Money::from_cents(1000)))
            .with_item(ReceiptLineItem::coupon(CouponType::I, 1, Money::from_cents(250)))
            .with_item(
                ReceiptLineItem::coupon(CouponType::C, 4, Money::ZERO)
                    .with_value(Money::from_cents(200)),
            )
            .with_item(
                ReceiptLineItem::coupon(CouponType::Blank, 1, Money::from_cents(999))
                    .with_value(Money::from_cents(100)),
            );

        let sums = aggregate(&tx);
        assert_eq!(sums.coupon_bucket(CouponType::A), Money::from_cents(500));
        assert_eq!(sums.coupon_bucket(CouponType::U), Money::from_cents(1000));
        // C and space use `value`, not `price`
        assert_eq!(sums.total_discount_coupon(), Money::from_cents(300));
        // A + U + T - I
        assert_eq!(sums.total_coupon(), Money::from_cents(1250));
        // coupons never reach total_amount
        assert_eq!(sums.total_amount, Money::ZERO);
        assert_eq!(sums.total_number, 0);
    }

    #[test]
    fn test_untyped_coupon_is_flat_discount() {
        let mut item = ReceiptLineItem::coupon(CouponType::Blank, 1, Money::ZERO)
            .with_value(Money::from_cents(150));
        item.coupon_type = None;
        let sums = aggregate(&sale().with_item(item));
        assert_eq!(sums.total_discount_coupon(), Money::from_cents(150));
    }

    #[test]
    fn test_total_paid_excludes_withdrawal_and_coupons() {
        let payments = PaymentBreakdown::new()
            .with(PaymentMethod::Cash, Money::from_cents(1000))
            .with(PaymentMethod::Webshop, Money::from_cents(500))
            .with(PaymentMethod::Consignment, Money::from_cents(100))
            .with(PaymentMethod::Withdrawel, Money::from_cents(5000))
            .with(PaymentMethod::Couponin, Money::from_cents(700))
            .with(PaymentMethod::Couponout, Money::from_cents(800))
            .with(PaymentMethod::Change, Money::from_cents(50));
        let sums = aggregate(&sale().with_payments(payments));
        assert_eq!(sums.total_paid, Money::from_cents(1600));
    }

    #[test]
    fn test_legacy_discount_derivation() {
        let mut tx = sale().with_item(
            ReceiptLineItem::coupon(CouponType::C, 1, Money::ZERO)
                .with_value(Money::from_cents(200)),
        );
        tx.total_discount = Some(Money::from_cents(700));
        let sums = aggregate(&tx);
        assert_eq!(
            legacy_receipt_discount(&tx, &sums),
            Some(Money::from_cents(500))
        );

        tx.overall_receipt_discount = Some(Money::from_cents(100));
        assert_eq!(legacy_receipt_discount(&tx, &sums), None);
    }

    proptest! {
        #[test]
        fn prop_unit_counts_match_net_barcode_quantity(
            lines in prop::collection::vec((-5i64..=5, 0i64..5000), 0..12)
        ) {
            let mut tx = sale();
            for (qty, cents) in &lines {
                tx.receipt.push(ReceiptLineItem::barcode("X", *qty, Money::from_cents(*cents), dec!(21)));
            }
            let sums = aggregate(&tx);
            let net: i64 = lines.iter().map(|(q, _)| *q).sum();
            prop_assert_eq!(sums.total_number - sums.total_return, net);
        }

        #[test]
        fn prop_aggregate_is_pure(
            lines in prop::collection::vec((-5i64..=5, 0i64..5000), 0..12),
            cash in 0i64..100_000,
        ) {
            let mut tx = sale().with_payments(
                PaymentBreakdown::new().with(PaymentMethod::Cash, Money::from_cents(cash)),
            );
            for (qty, cents) in &lines {
                tx.receipt.push(ReceiptLineItem::barcode("X", *qty, Money::from_cents(*cents), dec!(9)));
            }
            prop_assert_eq!(aggregate(&tx), aggregate(&tx));
        }
    }
}
