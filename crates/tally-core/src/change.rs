//! # Change / Difference Reconciler
//!
//! Combines the aggregator and discount outputs with the payment breakdown
//! to compute the change due and the unexplained difference.
//!
//! ## User Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Customer pays 25.00 cash for 20.02 of goods                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  change = paid + coupons + flat coupons + receipt discount − amount     │
//! │         = 25.00 + 0 + 0 + 0 − 20.02 = 4.98                              │
//! │       │                                                                 │
//! │       ├── withdrawal or consignment? → change = 0, difference = 0       │
//! │       │                                                                 │
//! │       ├── cash-only and rounding enabled?                               │
//! │       │      change     = 5.00   (nearest 0.05, half-even)              │
//! │       │      difference = 4.98 − 5.00 = −0.02                           │
//! │       │                                                                 │
//! │       └── otherwise: change = 4.98, difference = 0                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::money::Money;
use crate::payment::PaymentMethod;
use crate::settings::EngineSettings;
use crate::types::{Transaction, TransactionType};

/// Inputs to change reconciliation, taken from the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeInputs {
    pub total_paid: Money,
    pub total_coupon: Money,
    pub total_discount_coupon: Money,
    pub receipt_discount: Money,
    pub total_amount: Money,
}

/// Change due and the unexplained difference from cash rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub change: Money,
    pub difference: Money,
}

/// Whether no card, credit-receipt or store-credit money was tendered.
pub fn is_cash_only(tx: &Transaction) -> bool {
    PaymentMethod::NON_CASH
        .iter()
        .all(|method| tx.payments.get(*method).is_zero())
}

/// Reconciles change for a transaction.
///
/// Withdrawals and consignments carry no change at all.
pub fn reconcile(
    tx: &Transaction,
    inputs: &ChangeInputs,
    settings: &EngineSettings,
) -> Reconciliation {
    if !tx.payments.get(PaymentMethod::Withdrawel).is_zero()
        || tx.kind == TransactionType::Consignment
    {
        return Reconciliation::default();
    }

    let change = inputs.total_paid + inputs.total_coupon + inputs.total_discount_coupon
        + inputs.receipt_discount
        - inputs.total_amount;

    if !change.is_zero() && is_cash_only(tx) && settings.cash_rounding {
        let rounded = change.round_to_step(settings.rounding_step);
        return Reconciliation {
            change: rounded,
            difference: change - rounded,
        };
    }

    Reconciliation {
        change,
        difference: Money::ZERO,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentBreakdown;

    fn inputs(paid: i64, amount: i64) -> ChangeInputs {
        ChangeInputs {
            total_paid: Money::from_cents(paid),
            total_coupon: Money::ZERO,
            total_discount_coupon: Money::ZERO,
            receipt_discount: Money::ZERO,
            total_amount: Money::from_cents(amount),
        }
    }

    fn cash_sale(cash: i64) -> Transaction {
        Transaction::new("t", TransactionType::Sale).with_payments(
            PaymentBreakdown::new().with(PaymentMethod::Cash, Money::from_cents(cash)),
        )
    }

    #[test]
    fn test_cash_rounding_scenario() {
        let tx = cash_sale(2500);
        let result = reconcile(&tx, &inputs(2500, 2002), &EngineSettings::default());
        assert_eq!(result.change, Money::from_cents(500));
        assert_eq!(result.difference, Money::from_cents(-2));
    }

    #[test]
    fn test_rounding_disabled() {
        let tx = cash_sale(2500);
        let settings = EngineSettings::default().with_cash_rounding(false);
        let result = reconcile(&tx, &inputs(2500, 2002), &settings);
        assert_eq!(result.change, Money::from_cents(498));
        assert_eq!(result.difference, Money::ZERO);
    }

    #[test]
    fn test_card_payment_is_not_rounded() {
        let tx = Transaction::new("t", TransactionType::Sale).with_payments(
            PaymentBreakdown::new()
                .with(PaymentMethod::Cash, Money::from_cents(1000))
                .with(PaymentMethod::Pin, Money::from_cents(1500)),
        );
        let result = reconcile(&tx, &inputs(2500, 2002), &EngineSettings::default());
        assert_eq!(result.change, Money::from_cents(498));
        assert_eq!(result.difference, Money::ZERO);
    }

    #[test]
    fn test_exact_payment_has_no_difference() {
        let tx = cash_sale(2002);
        let result = reconcile(&tx, &inputs(2002, 2002), &EngineSettings::default());
        assert_eq!(result, Reconciliation::default());
    }

    #[test]
    fn test_discounts_and_coupons_count_as_tendered() {
        let tx = cash_sale(1000);
        let inputs = ChangeInputs {
            total_paid: Money::from_cents(1000),
            total_coupon: Money::from_cents(500),
            total_discount_coupon: Money::from_cents(250),
            receipt_discount: Money::from_cents(250),
            total_amount: Money::from_cents(2000),
        };
        let result = reconcile(&tx, &inputs, &EngineSettings::default());
        assert_eq!(result.change, Money::ZERO);
    }

    #[test]
    fn test_withdrawal_skips_reconciliation() {
        let tx = Transaction::new("t", TransactionType::Sale).with_payments(
            PaymentBreakdown::new().with(PaymentMethod::Withdrawel, Money::from_cents(5000)),
        );
        let result = reconcile(&tx, &inputs(0, 0), &EngineSettings::default());
        assert_eq!(result, Reconciliation::default());
    }

    #[test]
    fn test_consignment_skips_reconciliation() {
        let tx = Transaction::new("c", TransactionType::Consignment);
        let result = reconcile(&tx, &inputs(0, 4999), &EngineSettings::default());
        assert_eq!(result, Reconciliation::default());
    }
}
