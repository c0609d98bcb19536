//! # EOS Settlement Aggregator
//!
//! Applies the payment classifier to a shift's payment snapshots.
//!
//! ## Shift Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  shift start         shift close                    correction          │
//! │  ───────────         ───────────                    ──────────          │
//! │  generated  ──────►  settle + complete  ──────►     rectify (new record)│
//! │                      periodEnd ?= now               periodEnd = start   │
//! │                      VAT = Σ settled same-shift                         │
//! │                          transactions                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Turnover vs Difference
//! ```text
//! turnover   = Σ direction(final[k])                    keys in final
//! difference = Σ direction(final[k] − original[k])      keys in both
//!            + (totalCashInDrawer − expectedCashInDrawer)  if both set
//! ```
//! Unknown keys are skipped by both. Both results are rounded to 2 decimals.

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::payment::{FamilySet, PaymentBreakdown, PaymentFamily, PaymentMethod};
use crate::types::{EosRecord, EosStatus, VatAmounts};

/// Net classified turnover of a payment snapshot.
///
/// `families` restricts the sum to methods of those families; `None` is
/// unfiltered.
///
/// ## Example
/// ```rust
/// use tally_core::eos::turnover;
/// use tally_core::money::Money;
/// use tally_core::payment::{PaymentBreakdown, PaymentFamily, PaymentMethod};
///
/// let snapshot = PaymentBreakdown::new()
///     .with(PaymentMethod::Cash, Money::from_cents(10000))
///     .with(PaymentMethod::Change, Money::from_cents(1500))
///     .with(PaymentMethod::Pin, Money::from_cents(4000));
///
/// assert_eq!(turnover(&snapshot, None), Money::from_cents(12500));
/// assert_eq!(turnover(&snapshot, Some(PaymentFamily::Cash.into())), Money::from_cents(8500));
/// ```
pub fn turnover(snapshot: &PaymentBreakdown, families: Option<FamilySet>) -> Money {
    let families = families.unwrap_or(FamilySet::all());
    snapshot
        .classified()
        .filter_map(|(method, amount)| {
            let class = method.classification();
            families
                .contains(class.family)
                .then(|| class.direction.apply(amount))
        })
        .sum::<Money>()
        .rounded()
}

/// Unexplained difference between the counted and originally generated
/// snapshots, plus the drawer mismatch.
pub fn difference(record: &EosRecord) -> Money {
    let mut diff: Money = record
        .final_
        .classified()
        .filter(|(method, _)| record.original.has(*method))
        .map(|(method, counted)| {
            let delta = counted - record.original.get(method);
            method.classification().direction.apply(delta)
        })
        .sum();

    if let (Some(counted), Some(expected)) =
        (record.total_cash_in_drawer, record.expected_cash_in_drawer)
    {
        diff += counted - expected;
    }

    diff.rounded()
}

/// `openingBalance + final.cash − final.change`
///
/// Only the cash and change movements count, whatever the turnover family
/// filter elsewhere. A missing opening balance counts as zero.
pub fn expected_cash_in_drawer(record: &EosRecord) -> Money {
    let opening = record.opening_balance.unwrap_or(Money::ZERO);
    let movement: Money = [PaymentMethod::Cash, PaymentMethod::Change]
        .into_iter()
        .map(|method| {
            method
                .classification()
                .direction
                .apply(record.final_.get(method))
        })
        .sum();
    (opening + movement).rounded()
}

/// Fills the derived turnover, difference and expected-cash fields.
///
/// An `expectedCashInDrawer` already on the record is kept.
pub fn settle(record: &mut EosRecord) {
    if record.expected_cash_in_drawer.is_none() {
        record.expected_cash_in_drawer = Some(expected_cash_in_drawer(record));
    }
    let snapshot = &record.final_;
    record.totals.turnover = turnover(snapshot, None);
    record.totals.cash_turnover = turnover(snapshot, Some(PaymentFamily::Cash.into()));
    record.totals.electronic_turnover =
        turnover(snapshot, Some(PaymentFamily::Electronic.into()));
    record.totals.other_turnover = turnover(snapshot, Some(PaymentFamily::Other.into()));
    record.totals.difference = difference(record);
}

/// Transition to `completed`.
///
/// `vat_sum` is the VAT summed over the shift's settled transactions;
/// `None` (no such transactions) leaves all amounts at zero.
pub fn complete(record: &mut EosRecord, now: DateTime<Utc>, vat_sum: Option<VatAmounts>) {
    record.status = EosStatus::Completed;
    record.period_end.get_or_insert(now);
    record.totals.vat = vat_sum.map(rounded_amounts).unwrap_or_default();
}

/// Marks a correction record; its period collapses onto its start.
pub fn rectify(record: &mut EosRecord) {
    record.status = EosStatus::Rectification;
    record.period_end = Some(record.period_start);
}

fn rounded_amounts(vat: VatAmounts) -> VatAmounts {
    VatAmounts {
        zeroamount: vat.zeroamount.rounded(),
        lowamount: vat.lowamount.rounded(),
        highamount: vat.highamount.rounded(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Every recognised method with a distinct power-of-two amount, plus an
    /// unknown key.
    fn final_snapshot() -> PaymentBreakdown {
        let mut snapshot = PaymentBreakdown::new();
        let entries = [
            (PaymentMethod::Cash, 1),
            (PaymentMethod::Change, 2),
            (PaymentMethod::Consignment, 4),
            (PaymentMethod::Creditcard, 8),
            (PaymentMethod::Creditreceipt, 16),
            (PaymentMethod::Creditreceiptin, 32),
            (PaymentMethod::Couponin, 64),
            (PaymentMethod::Couponout, 128),
            (PaymentMethod::Deposit, 256),
            (PaymentMethod::Pin, 512),
            (PaymentMethod::Storecredit, 1024),
            (PaymentMethod::Storecreditin, 2048),
            (PaymentMethod::Withdrawel, 4096),
        ];
        for (method, cents) in entries {
            snapshot.set(method, Money::from_cents(cents));
        }
        snapshot.insert("invalid", Money::from_cents(8192));
        snapshot
    }

    fn shift_record() -> EosRecord {
        let start = Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap();
        let mut record = EosRecord::generated("e-1", "shift-1", start);
        record.final_ = final_snapshot();
        record
    }

    #[test]
    fn test_turnover_scenario() {
        let snapshot = final_snapshot();
        assert_eq!(turnover(&snapshot, None), Money::from_cents(3575));
        assert_eq!(
            turnover(&snapshot, Some(PaymentFamily::Cash.into())),
            Money::from_cents(3839)
        );
        assert_eq!(
            turnover(&snapshot, Some(PaymentFamily::Electronic.into())),
            Money::from_cents(520)
        );
        assert_eq!(
            turnover(&snapshot, Some(PaymentFamily::Other.into())),
            Money::from_cents(-784)
        );
    }

    #[test]
    fn test_turnover_family_sets() {
        let snapshot = final_snapshot();
        let cash_and_electronic: FamilySet = [PaymentFamily::Cash, PaymentFamily::Electronic]
            .into_iter()
            .collect();
        assert_eq!(turnover(&snapshot, Some(cash_and_electronic)), Money::from_cents(4359));
        assert_eq!(turnover(&snapshot, Some(FamilySet::empty())), Money::ZERO);
        assert_eq!(turnover(&snapshot, Some(FamilySet::all())), Money::from_cents(3575));
    }

    #[test]
    fn test_difference_scenario() {
        let mut record = shift_record();
        for method in PaymentMethod::ALL {
            record.original.set(method, Money::ZERO);
        }
        record.original.insert("invalid", Money::ZERO);
        assert_eq!(difference(&record), Money::from_cents(3575));
    }

    #[test]
    fn test_difference_only_counts_shared_keys() {
        let mut record = shift_record();
        record.original.set(PaymentMethod::Cash, Money::ZERO);
        record.original.set(PaymentMethod::Change, Money::from_cents(5));
        // cash: 0.01 - 0, change (decrease): 0.05 - 0.02
        assert_eq!(difference(&record), Money::from_cents(4));
    }

    #[test]
    fn test_difference_adds_drawer_mismatch() {
        let mut record = shift_record();
        record.total_cash_in_drawer = Some(Money::from_cents(10_000));
        record.expected_cash_in_drawer = Some(Money::from_cents(10_250));
        assert_eq!(difference(&record), Money::from_cents(-250));

        record.expected_cash_in_drawer = None;
        assert_eq!(difference(&record), Money::ZERO);
    }

    #[test]
    fn test_expected_cash_ignores_other_cash_family_methods() {
        let mut record = shift_record();
        record.opening_balance = Some(Money::from_cents(15_000));
        // 150.00 + 0.01 - 0.02; deposit and withdrawel are not drawer movements here
        assert_eq!(expected_cash_in_drawer(&record), Money::from_cents(14_999));

        record.opening_balance = None;
        assert_eq!(expected_cash_in_drawer(&record), Money::from_cents(-1));
    }

    #[test]
    fn test_settle_fills_totals() {
        let mut record = shift_record();
        record.opening_balance = Some(Money::from_cents(10_000));
        record.total_cash_in_drawer = Some(Money::from_cents(10_000));
        settle(&mut record);

        assert_eq!(record.totals.turnover, Money::from_cents(3575));
        assert_eq!(record.totals.cash_turnover, Money::from_cents(3839));
        assert_eq!(record.totals.electronic_turnover, Money::from_cents(520));
        assert_eq!(record.totals.other_turnover, Money::from_cents(-784));
        assert_eq!(record.expected_cash_in_drawer, Some(Money::from_cents(9_999)));
        // original is empty, so only the drawer mismatch counts
        assert_eq!(record.totals.difference, Money::from_cents(1));
    }

    #[test]
    fn test_complete_defaults_period_end_and_vat() {
        let mut record = shift_record();
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 18, 0, 0).unwrap();
        complete(&mut record, now, None);
        assert_eq!(record.status, EosStatus::Completed);
        assert_eq!(record.period_end, Some(now));
        assert_eq!(record.totals.vat, VatAmounts::default());

        let earlier = Utc.with_ymd_and_hms(2026, 10, 14, 17, 0, 0).unwrap();
        let mut record = shift_record();
        record.period_end = Some(earlier);
        let vat = VatAmounts {
            zeroamount: Money::ZERO,
            lowamount: Money::from_cents(90),
            highamount: Money::from_cents(2100),
        };
        complete(&mut record, now, Some(vat));
        assert_eq!(record.period_end, Some(earlier));
        assert_eq!(record.totals.vat, vat);
    }

    #[test]
    fn test_rectify_collapses_period() {
        let mut record = shift_record();
        record.period_end = Some(Utc.with_ymd_and_hms(2026, 10, 14, 18, 0, 0).unwrap());
        rectify(&mut record);
        assert_eq!(record.status, EosStatus::Rectification);
        assert_eq!(record.period_end, Some(record.period_start));
    }
}
