//! # Receipt Display Reconciler
//!
//! Document-prep pass producing per-line discount/total values for printed
//! receipts. Runs on an already calculated record and never feeds back
//! into it; the result is a decorated copy handed to the renderer.
//!
//! ## Rounding Drift
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  2 × 10.00 (qty 1), receipt discount 4.99                               │
//! │                                                                         │
//! │  factor      = 4.99 / 20.00          = 0.2495                           │
//! │  per line    = round(0.2495 × 10.00) = 2.50   (half-even)               │
//! │  Σ rounded   = 5.00                                                     │
//! │  display     = 4.99                                                     │
//! │  discrepancy = 0.01                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  first qty==1 barcode line absorbs it:                                  │
//! │       discount 2.50 → 2.49    total 7.50 → 7.51                         │
//! │                                                                         │
//! │  no qty==1 line? the drift stays and is only logged at debug            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The discount factor here is computed from the record's stored
//! `totalDiscountCoupon` and `overallReceiptDiscount` rather than reusing
//! [`crate::vat::discount_ratio`]'s output. The two passes are kept apart.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::money::Money;
use crate::payment::PaymentMethod;
use crate::types::{CouponType, Transaction};

/// Display values for one receipt line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayLine {
    /// Position in `Transaction::receipt`.
    pub index: usize,
    /// Per-unit discount (barcode lines only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Money>,
    pub total: Money,
}

/// One row of the size/colour matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeColorRow {
    /// Description, falling back to the barcode.
    pub article: String,
    pub color: String,
    /// Summed quantity per size.
    pub sizes: BTreeMap<String, i64>,
    pub total: i64,
}

/// Decorated, never-persisted copy of a transaction for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptDocument {
    #[serde(flatten)]
    pub record: Transaction,
    pub display_discount: Money,
    /// `Σ round(discount × qty, 2)` after any drift correction.
    pub total_rounded_discount: Money,
    pub lines: Vec<DisplayLine>,
    pub size_color_table: Vec<SizeColorRow>,
    pub net_cash: Money,
}

impl ReceiptDocument {
    /// Display values for a receipt index, if that line is shown.
    pub fn line(&self, index: usize) -> Option<&DisplayLine> {
        self.lines.iter().find(|line| line.index == index)
    }
}

/// `(totalDiscountCoupon + overallReceiptDiscount) / discountable`, 0 on /0.
fn discount_factor(tx: &Transaction) -> rust_decimal::Decimal {
    let discountable = tx
        .barcode_items()
        .map(|item| item.line_amount())
        .sum::<Money>()
        .round_dp(3);
    (tx.totals.total_discount_coupon + tx.receipt_discount()).ratio_to(discountable)
}

/// `Σ barcode qty*(nett−price) + totalDiscountCoupon + overallReceiptDiscount`
pub fn display_discount(tx: &Transaction) -> Money {
    let markdown: Money = tx
        .barcode_items()
        .map(|item| (item.effective_nett_price() - item.price).multiply_quantity(item.qty))
        .sum();
    markdown + tx.totals.total_discount_coupon + tx.receipt_discount()
}

/// Builds the decorated document for a calculated transaction.
///
/// ## Example
/// ```rust
/// use tally_core::display::reconcile;
/// use tally_core::engine::calculated;
/// use tally_core::money::Money;
/// use tally_core::settings::EngineSettings;
/// use tally_core::types::{ReceiptLineItem, Transaction, TransactionType};
/// use rust_decimal::Decimal;
///
/// let tx = Transaction::new("t-1", TransactionType::Sale)
///     .with_item(ReceiptLineItem::barcode("A", 1, Money::from_cents(1000), Decimal::from(21)))
///     .with_item(ReceiptLineItem::barcode("B", 1, Money::from_cents(1000), Decimal::from(21)))
///     .with_receipt_discount(Money::from_cents(499));
///
/// let doc = reconcile(calculated(tx, &EngineSettings::default()));
/// assert_eq!(doc.lines[0].discount, Some(Money::from_cents(249)));
/// assert_eq!(doc.lines[0].total, Money::from_cents(751));
/// assert_eq!(doc.total_rounded_discount, doc.display_discount);
/// ```
pub fn reconcile(record: Transaction) -> ReceiptDocument {
    let factor = discount_factor(&record);
    let display_discount = display_discount(&record);

    let mut lines = Vec::with_capacity(record.receipt.len());
    for (index, item) in record.receipt.iter().enumerate() {
        if item.is_barcode() {
            let nett = item.effective_nett_price();
            let discount = ((nett - item.price) + item.price.scale(factor)).rounded();
            lines.push(DisplayLine {
                index,
                discount: Some(discount),
                total: (nett - discount).multiply_quantity(item.qty),
            });
        } else if item.is_coupon() {
            let kind = item.coupon_kind();
            if kind.is_flat_discount() {
                continue;
            }
            let total = item.line_amount();
            let total = match kind {
                CouponType::A | CouponType::T | CouponType::U => -total,
                _ => total,
            };
            lines.push(DisplayLine {
                index,
                discount: None,
                total,
            });
        } else {
            lines.push(DisplayLine {
                index,
                discount: None,
                total: item.line_amount(),
            });
        }
    }

    let mut total_rounded_discount = rounded_discount_sum(&record, &lines);
    let discrepancy = (total_rounded_discount - display_discount).rounded();
    if !discrepancy.is_zero() {
        let target = lines.iter_mut().find(|line| {
            line.discount.is_some() && record.receipt[line.index].qty == 1
        });
        match target {
            Some(line) => {
                line.discount = line.discount.map(|d| d - discrepancy);
                line.total += discrepancy;
                total_rounded_discount = rounded_discount_sum(&record, &lines);
            }
            None => {
                debug!(tx = %record.id, %discrepancy, "no single-unit line to absorb display discount drift");
            }
        }
    }

    let size_color_table = size_color_table(&record);
    let net_cash = record.payments.get(PaymentMethod::Cash) - record.totals.change;

    ReceiptDocument {
        record,
        display_discount,
        total_rounded_discount,
        lines,
        size_color_table,
        net_cash,
    }
}

fn rounded_discount_sum(record: &Transaction, lines: &[DisplayLine]) -> Money {
    lines
        .iter()
        .filter_map(|line| {
            line.discount
                .map(|d| d.multiply_quantity(record.receipt[line.index].qty).rounded())
        })
        .sum()
}

/// Size/colour matrix over barcode lines that carry a size or colour.
///
/// Rows are keyed by article and colour and keep first-seen order.
pub fn size_color_table(tx: &Transaction) -> Vec<SizeColorRow> {
    let mut rows: Vec<SizeColorRow> = Vec::new();

    for item in tx.barcode_items() {
        if item.size.is_none() && item.color.is_none() {
            continue;
        }
        let article = item
            .description
            .clone()
            .or_else(|| item.barcode.clone())
            .unwrap_or_default();
        let color = item.color.clone().unwrap_or_default();
        let size = item.size.clone().unwrap_or_default();

        let row = match rows
            .iter()
            .position(|r| r.article == article && r.color == color)
        {
            Some(pos) => &mut rows[pos],
            None => {
                rows.push(SizeColorRow {
                    article,
                    color,
                    sizes: BTreeMap::new(),
                    total: 0,
                });
                let last = rows.len() - 1;
                &mut rows[last]
            }
        };
        *row.sizes.entry(size).or_insert(0) += item.qty;
        row.total += item.qty;
    }

    rows
}

// =============================================================================
// Unit Tests
// =============================================================================
