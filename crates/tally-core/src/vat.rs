//! # Discount & VAT Engine
//!
//! Computes the proportional discount ratio and buckets barcode and
//! "A"-coupon amounts into VAT tiers.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  discountable = round(Σ barcode price*qty, 3)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ratio = (receipt discount + flat coupons) / discountable   (0 if /0)   │
//! │  retained = 1 - ratio                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  per barcode line with vat == configured tier:                          │
//! │       total  = retained * price * qty                                   │
//! │       amount = total / (vat + 100) * vat                                │
//! │       tier.total += total, tier.amount += amount                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  per "A" coupon (high tier only, if configured):                        │
//! │       total = retained * price * qty                                    │
//! │       high.total -= total, high.amount -= total / (high + 100) * high   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Buckets are returned unrounded; the pipeline rounds them once.

use rust_decimal::Decimal;
use tracing::debug;

use crate::money::Money;
use crate::settings::{VatTier, VatTiers};
use crate::types::{CouponType, Transaction, VatBuckets};

/// `round(Σ barcode price*qty, 3)`
pub fn discountable_amount(tx: &Transaction) -> Money {
    tx.barcode_items()
        .map(|item| item.line_amount())
        .sum::<Money>()
        .round_dp(3)
}

/// Fraction of gross barcode value removed by receipt-level and flat-coupon
/// discounts. Zero when there is nothing discountable.
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::vat::discount_ratio;
/// use rust_decimal::Decimal;
///
/// let ratio = discount_ratio(Money::from_cents(499), Money::ZERO, Money::from_cents(2000));
/// assert_eq!(ratio, Decimal::new(2495, 4));
/// assert_eq!(discount_ratio(Money::from_cents(100), Money::ZERO, Money::ZERO), Decimal::ZERO);
/// ```
pub fn discount_ratio(
    receipt_discount: Money,
    discount_coupons: Money,
    discountable: Money,
) -> Decimal {
    (receipt_discount + discount_coupons).ratio_to(discountable)
}

/// Back-calculates the VAT contained in a VAT-inclusive total.
#[inline]
fn vat_share(total: Money, rate: Decimal) -> Money {
    let divisor = rate + Decimal::ONE_HUNDRED;
    Money::from_decimal(total.ratio_to(Money::from_decimal(divisor)) * rate)
}

fn bucket_mut(buckets: &mut VatBuckets, tier: VatTier) -> (&mut Money, &mut Money) {
    match tier {
        VatTier::Zero => (&mut buckets.zerototal, &mut buckets.zeroamount),
        VatTier::Low => (&mut buckets.lowtotal, &mut buckets.lowamount),
        VatTier::High => (&mut buckets.hightotal, &mut buckets.highamount),
    }
}

/// Buckets the transaction's barcode lines and A-coupons into VAT tiers.
///
/// `ratio` is the value from [`discount_ratio`]. Barcode lines whose VAT
/// matches no configured tier are left out (their money still counts
/// towards `totalAmount`).
pub fn vat_buckets(tx: &Transaction, tiers: &VatTiers, ratio: Decimal) -> VatBuckets {
    let retained = Decimal::ONE - ratio;
    let mut buckets = VatBuckets::default();

    for (index, item) in tx.receipt.iter().enumerate() {
        if item.is_barcode() {
            let Some(vat) = item.vat else {
                debug!(tx = %tx.id, index, "barcode line without vat, skipped from VAT buckets");
                continue;
            };
            let Some(tier) = tiers.tier_for(vat) else {
                debug!(tx = %tx.id, index, %vat, "vat not configured, skipped from VAT buckets");
                continue;
            };
            let total = item.line_amount().scale(retained);
            let amount = vat_share(total, vat);
            let (tier_total, tier_amount) = bucket_mut(&mut buckets, tier);
            *tier_total += total;
            *tier_amount += amount;
        } else if item.is_coupon() && item.coupon_kind() == CouponType::A {
            let Some(high) = tiers.high else {
                continue;
            };
            let total = item.line_amount().scale(retained);
            buckets.hightotal -= total;
            buckets.highamount -= vat_share(total, high);
        }
    }

    buckets
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EngineSettings;
    use crate::types::{ReceiptLineItem, TransactionType};
    use rust_decimal_macros::dec;

    fn tiers() -> VatTiers {
        EngineSettings::default().vat
    }

    #[test]
    fn test_discountable_amount_rounds_to_three_places() {
        let tx = Transaction::new("t", TransactionType::Sale)
            .with_item(ReceiptLineItem::barcode("A", 3, Money::from(dec!(3.3333)), dec!(21)))
            .with_item(ReceiptLineItem::coupon(CouponType::A, 1, Money::from_cents(500)));
        assert_eq!(discountable_amount(&tx), Money::from(dec!(10.000)));
    }

    #[test]
    fn test_no_discount_buckets() {
        let tx = Transaction::new("t", TransactionType::Sale)
            .with_item(ReceiptLineItem::barcode("A", 1, Money::from_cents(12100), dec!(21)))
            .with_item(ReceiptLineItem::barcode("B", 2, Money::from_cents(1090), dec!(9)))
            .with_item(ReceiptLineItem::barcode("C", 1, Money::from_cents(500), dec!(0)));

        let buckets = vat_buckets(&tx, &tiers(), Decimal::ZERO).rounded();
        assert_eq!(buckets.hightotal, Money::from_cents(12100));
        assert_eq!(buckets.highamount, Money::from_cents(2100));
        assert_eq!(buckets.lowtotal, Money::from_cents(2180));
        assert_eq!(buckets.lowamount, Money::from_cents(180));
        assert_eq!(buckets.zerototal, Money::from_cents(500));
        assert_eq!(buckets.zeroamount, Money::ZERO);
    }

    #[test]
    fn test_discount_is_spread_proportionally() {
        let tx = Transaction::new("t", TransactionType::Sale)
            .with_item(ReceiptLineItem::barcode("A", 1, Money::from_cents(12100), dec!(21)))
            .with_receipt_discount(Money::from_cents(1210));
        let ratio = discount_ratio(tx.receipt_discount(), Money::ZERO, discountable_amount(&tx));
        assert_eq!(ratio, dec!(0.1));

        let buckets = vat_buckets(&tx, &tiers(), ratio).rounded();
        assert_eq!(buckets.hightotal, Money::from_cents(10890));
        assert_eq!(buckets.highamount, Money::from_cents(1890));
    }

    #[test]
    fn test_unconfigured_vat_is_excluded() {
        let tx = Transaction::new("t", TransactionType::Sale)
            .with_item(ReceiptLineItem::barcode("A", 1, Money::from_cents(1000), dec!(19)))
            .with_item(ReceiptLineItem::barcode("B", 1, Money::from_cents(1210), dec!(21.0)));
        let buckets = vat_buckets(&tx, &tiers(), Decimal::ZERO).rounded();
        assert_eq!(buckets.hightotal, Money::from_cents(1210));
        assert_eq!(buckets.highamount, Money::from_cents(210));
        assert_eq!(buckets.lowtotal, Money::ZERO);
        assert_eq!(buckets.zerototal, Money::ZERO);
    }

    #[test]
    fn test_a_coupon_deducts_from_high_tier() {
        let tx = Transaction::new("t", TransactionType::Sale)
            .with_item(ReceiptLineItem::barcode("A", 1, Money::from_cents(12100), dec!(21)))
            .with_item(ReceiptLineItem::coupon(CouponType::A, 1, Money::from_cents(1210)));
        let buckets = vat_buckets(&tx, &tiers(), Decimal::ZERO).rounded();
        assert_eq!(buckets.hightotal, Money::from_cents(10890));
        assert_eq!(buckets.highamount, Money::from_cents(1890));
    }

    #[test]
    fn test_a_coupon_deduction_keeps_discount_share() {
        // 121.00 @21% with 12.10 receipt discount, ratio 0.10
        let tx = Transaction::new("t", TransactionType::Sale)
            .with_item(ReceiptLineItem::barcode("A", 1, Money::from_cents(12100), dec!(21)))
            .with_item(ReceiptLineItem::coupon(CouponType::A, 1, Money::from_cents(1210)))
            .with_receipt_discount(Money::from_cents(1210));
        let ratio = discount_ratio(tx.receipt_discount(), Money::ZERO, discountable_amount(&tx));
        assert_eq!(ratio, dec!(0.1));

        let buckets = vat_buckets(&tx, &tiers(), ratio).rounded();
        // 108.90 - 10.89
        assert_eq!(buckets.hightotal, Money::from_cents(9801));
        // 18.90 - 1.89
        assert_eq!(buckets.highamount, Money::from_cents(1701));
    }

    #[test]
    fn test_a_coupon_skipped_without_high_tier() {
        let vat = VatTiers {
            zero: Some(dec!(0)),
            low: Some(dec!(9)),
            high: None,
        };
        let tx = Transaction::new("t", TransactionType::Sale)
            .with_item(ReceiptLineItem::coupon(CouponType::A, 1, Money::from_cents(1210)));
        assert_eq!(vat_buckets(&tx, &vat, Decimal::ZERO), VatBuckets::default());
    }

    #[test]
    fn test_flat_coupons_have_no_vat_effect() {
        let tx = Transaction::new("t", TransactionType::Sale)
            .with_item(
                ReceiptLineItem::coupon(CouponType::C, 1, Money::from_cents(500))
                    .with_value(Money::from_cents(500)),
            )
            .with_item(ReceiptLineItem::coupon(CouponType::U, 1, Money::from_cents(500)));
        assert_eq!(vat_buckets(&tx, &tiers(), Decimal::ZERO), VatBuckets::default());
    }
}
