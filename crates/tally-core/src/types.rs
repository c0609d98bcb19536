//! # Domain Types
//!
//! Record shapes consumed and produced by the engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  Transaction    │   │ ReceiptLineItem │   │   EosRecord     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  _id, nr, type  │◄──│  category, qty  │   │  cycleID        │       │
//! │  │  receipt[]      │   │  price, vat     │   │  original/final │       │
//! │  │  payments       │   │  nettPrice      │   │  drawer counts  │       │
//! │  │  link           │   │  type, value    │   │  status         │       │
//! │  │  totals (flat)  │   └─────────────────┘   │  totals (flat)  │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  Records arrive structurally valid; the engine only derives the        │
//! │  computed fields (`totals`) and never rejects input.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! Records are camelCase JSON documents. The identifier is `_id`, the
//! line-item coupon type is `type`, the EOS snapshot is `final` and the
//! shift correlation key is `cycleID`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::payment::PaymentBreakdown;

// =============================================================================
// Line Items
// =============================================================================

/// Category of a receipt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    /// A scanned article.
    Barcode,
    /// A coupon or voucher line (see [`CouponType`]).
    Coupon,
    /// A store-credit line.
    Storecredit,
}

/// Coupon sub-type.
///
/// ## Semantics
/// ```text
/// A      redeemed discount coupon   reduces the high-VAT base
/// U      gift voucher redeemed      counts as payment
/// I      gift voucher issued        negative of U
/// T      credit receipt redeemed    counts as payment
/// C, " " flat discount coupon       pure discount, no VAT effect
/// O      store-credit payoff        only on storecredit lines
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CouponType {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "U")]
    U,
    #[serde(rename = "I")]
    I,
    #[serde(rename = "T")]
    T,
    #[serde(rename = "C")]
    C,
    #[default]
    #[serde(rename = " ", alias = "")]
    Blank,
    #[serde(rename = "O")]
    O,
}

impl CouponType {
    /// C and space coupons: flat discounts valued by `value`.
    #[inline]
    pub const fn is_flat_discount(&self) -> bool {
        matches!(self, CouponType::C | CouponType::Blank)
    }

    /// Single-character record code.
    pub const fn code(&self) -> &'static str {
        match self {
            CouponType::A => "A",
            CouponType::U => "U",
            CouponType::I => "I",
            CouponType::T => "T",
            CouponType::C => "C",
            CouponType::Blank => " ",
            CouponType::O => "O",
        }
    }
}

impl std::str::FromStr for CouponType {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(CouponType::A),
            "U" => Ok(CouponType::U),
            "I" => Ok(CouponType::I),
            "T" => Ok(CouponType::T),
            "C" => Ok(CouponType::C),
            " " | "" => Ok(CouponType::Blank),
            "O" => Ok(CouponType::O),
            other => Err(crate::error::CoreError::UnknownCouponType(other.to_string())),
        }
    }
}

/// One line of a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLineItem {
    pub category: ItemCategory,

    /// Article barcode, voucher or store-credit code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Signed quantity; negative lines are returns.
    pub qty: i64,

    /// Effective per-unit price.
    pub price: Money,

    /// Pre-discount per-unit price (barcode only). Defaults to `price`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nett_price: Option<Money>,

    /// VAT percentage (barcode only), e.g. `21`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat: Option<Decimal>,

    /// Coupon sub-type, or `O` for a store-credit payoff.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub coupon_type: Option<CouponType>,

    /// Face value of C/space coupons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ReceiptLineItem {
    fn new(category: ItemCategory, qty: i64, price: Money) -> Self {
        ReceiptLineItem {
            category,
            barcode: None,
            description: None,
            qty,
            price,
            nett_price: None,
            vat: None,
            coupon_type: None,
            value: None,
            size: None,
            color: None,
        }
    }

    /// A barcode line at a VAT percentage.
    pub fn barcode(code: impl Into<String>, qty: i64, price: Money, vat: Decimal) -> Self {
        let mut item = ReceiptLineItem::new(ItemCategory::Barcode, qty, price);
        item.barcode = Some(code.into());
        item.vat = Some(vat);
        item
    }

    /// A coupon line of the given sub-type.
    pub fn coupon(coupon_type: CouponType, qty: i64, price: Money) -> Self {
        let mut item = ReceiptLineItem::new(ItemCategory::Coupon, qty, price);
        item.coupon_type = Some(coupon_type);
        item
    }

    /// A store-credit line.
    pub fn store_credit(qty: i64, price: Money) -> Self {
        ReceiptLineItem::new(ItemCategory::Storecredit, qty, price)
    }

    pub fn with_nett_price(mut self, nett_price: Money) -> Self {
        self.nett_price = Some(nett_price);
        self
    }

    pub fn with_value(mut self, value: Money) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.barcode = Some(code.into());
        self
    }

    pub fn with_coupon_type(mut self, coupon_type: CouponType) -> Self {
        self.coupon_type = Some(coupon_type);
        self
    }

    pub fn with_variant(
        mut self,
        description: impl Into<String>,
        size: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        self.description = Some(description.into());
        self.size = Some(size.into());
        self.color = Some(color.into());
        self
    }

    #[inline]
    pub fn is_barcode(&self) -> bool {
        self.category == ItemCategory::Barcode
    }

    #[inline]
    pub fn is_coupon(&self) -> bool {
        self.category == ItemCategory::Coupon
    }

    #[inline]
    pub fn is_store_credit(&self) -> bool {
        self.category == ItemCategory::Storecredit
    }

    /// Pre-discount price with the `nettPrice := price` default applied.
    #[inline]
    pub fn effective_nett_price(&self) -> Money {
        self.nett_price.unwrap_or(self.price)
    }

    /// Coupon sub-type with the space default applied.
    #[inline]
    pub fn coupon_kind(&self) -> CouponType {
        self.coupon_type.unwrap_or_default()
    }

    /// `qty * price`.
    #[inline]
    pub fn line_amount(&self) -> Money {
        self.price.multiply_quantity(self.qty)
    }

    /// Per-unit face value of a flat coupon, falling back to `price`.
    #[inline]
    pub fn face_value(&self) -> Money {
        self.value.unwrap_or(self.price)
    }
}

// =============================================================================
// Transaction Links
// =============================================================================

/// Kind of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Sale,
    /// Inter-store transit.
    Transit,
    /// Goods lent without immediate sale.
    Consignment,
}

impl TransactionType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Transit => "transit",
            TransactionType::Consignment => "consignment",
        }
    }
}

/// Settlement state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Counted towards shift settlement.
    #[default]
    Settled,
    /// An open consignment.
    Open,
    /// A consignment closed by a later transaction.
    Closed,
}

impl TransactionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Settled => "settled",
            TransactionStatus::Open => "open",
            TransactionStatus::Closed => "closed",
        }
    }
}

/// Kind of a link reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Sale,
    Consignment,
    Return,
}

impl From<TransactionType> for LinkType {
    /// The link type a transaction writes onto a consignment it closes.
    ///
    /// A transit closing a consignment is recorded as a sale.
    fn from(kind: TransactionType) -> Self {
        match kind {
            TransactionType::Consignment => LinkType::Consignment,
            TransactionType::Sale | TransactionType::Transit => LinkType::Sale,
        }
    }
}

/// An explicit id reference between two transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRelation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LinkType,
    #[serde(default)]
    pub comment: String,
}

// =============================================================================
// Computed Totals
// =============================================================================

/// VAT tier totals (VAT-inclusive `total`, back-calculated `amount`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VatBuckets {
    pub zerototal: Money,
    pub zeroamount: Money,
    pub lowtotal: Money,
    pub lowamount: Money,
    pub hightotal: Money,
    pub highamount: Money,
}

impl VatBuckets {
    /// Rounds every bucket to 2 decimals.
    pub fn rounded(self) -> Self {
        VatBuckets {
            zerototal: self.zerototal.rounded(),
            zeroamount: self.zeroamount.rounded(),
            lowtotal: self.lowtotal.rounded(),
            lowamount: self.lowamount.rounded(),
            hightotal: self.hightotal.rounded(),
            highamount: self.highamount.rounded(),
        }
    }

    /// The tax amounts only.
    pub fn amounts(&self) -> VatAmounts {
        VatAmounts {
            zeroamount: self.zeroamount,
            lowamount: self.lowamount,
            highamount: self.highamount,
        }
    }
}

/// VAT tax amounts per tier, as carried on EOS records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VatAmounts {
    pub zeroamount: Money,
    pub lowamount: Money,
    pub highamount: Money,
}

impl std::ops::Add for VatAmounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        VatAmounts {
            zeroamount: self.zeroamount + other.zeroamount,
            lowamount: self.lowamount + other.lowamount,
            highamount: self.highamount + other.highamount,
        }
    }
}

impl std::iter::Sum for VatAmounts {
    fn sum<I: Iterator<Item = VatAmounts>>(iter: I) -> Self {
        iter.fold(VatAmounts::default(), std::ops::Add::add)
    }
}

/// Fields derived by the transaction pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransactionTotals {
    pub total_amount: Money,
    pub total_paid: Money,
    pub total_coupon: Money,
    pub total_discount_coupon: Money,
    pub total_number: i64,
    pub total_return: i64,
    pub total_store_credit_paid: Money,
    pub change: Money,
    pub difference: Money,
    #[serde(flatten)]
    pub vat: VatBuckets,
}

// =============================================================================
// Transaction
// =============================================================================

/// A sale, transit or consignment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,

    /// Receipt number, allocated by the store on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nr: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: TransactionType,

    #[serde(default)]
    pub status: TransactionStatus,

    /// Correlates to `EosRecord::cycle_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,

    /// Ordered receipt lines.
    #[serde(default)]
    pub receipt: Vec<ReceiptLineItem>,

    #[serde(default)]
    pub payments: PaymentBreakdown,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_receipt_discount: Option<Money>,

    /// Legacy combined discount (receipt discount + flat coupons).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_discount: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkRelation>,

    #[serde(flatten)]
    pub totals: TransactionTotals,
}

impl Transaction {
    /// Creates an empty transaction of the given kind.
    ///
    /// Consignments start `Open`; everything else starts `Settled`.
    pub fn new(id: impl Into<String>, kind: TransactionType) -> Self {
        Transaction {
            id: id.into(),
            nr: None,
            kind,
            status: match kind {
                TransactionType::Consignment => TransactionStatus::Open,
                _ => TransactionStatus::Settled,
            },
            shift: None,
            device: None,
            date: None,
            receipt: Vec::new(),
            payments: PaymentBreakdown::new(),
            overall_receipt_discount: None,
            total_discount: None,
            link: None,
            totals: TransactionTotals::default(),
        }
    }

    pub fn with_item(mut self, item: ReceiptLineItem) -> Self {
        self.receipt.push(item);
        self
    }

    pub fn with_payments(mut self, payments: PaymentBreakdown) -> Self {
        self.payments = payments;
        self
    }

    pub fn with_receipt_discount(mut self, discount: Money) -> Self {
        self.overall_receipt_discount = Some(discount);
        self
    }

    /// Receipt discount with absent treated as zero.
    #[inline]
    pub fn receipt_discount(&self) -> Money {
        self.overall_receipt_discount.unwrap_or(Money::ZERO)
    }

    pub fn barcode_items(&self) -> impl Iterator<Item = &ReceiptLineItem> {
        self.receipt.iter().filter(|i| i.is_barcode())
    }
}

// =============================================================================
// End-of-Shift Record
// =============================================================================

/// Lifecycle state of an EOS record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EosStatus {
    /// Created at shift start.
    #[default]
    Generated,
    /// Closed and settled.
    Completed,
    /// A correction record (`periodEnd == periodStart`).
    Rectification,
}

impl EosStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EosStatus::Generated => "generated",
            EosStatus::Completed => "completed",
            EosStatus::Rectification => "rectification",
        }
    }
}

/// Fields derived by the EOS aggregator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EosTotals {
    pub turnover: Money,
    pub cash_turnover: Money,
    pub electronic_turnover: Money,
    pub other_turnover: Money,
    pub difference: Money,
    #[serde(flatten)]
    pub vat: VatAmounts,
}

/// End-of-shift settlement record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EosRecord {
    #[serde(rename = "_id")]
    pub id: String,

    pub period_start: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_end: Option<DateTime<Utc>>,

    /// Shift key; matches `Transaction::shift`.
    #[serde(rename = "cycleID")]
    pub cycle_id: String,

    /// Payment snapshot as first generated.
    #[serde(default)]
    pub original: PaymentBreakdown,

    /// Payment snapshot as counted at close.
    #[serde(rename = "final", default)]
    pub final_: PaymentBreakdown,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cash_in_drawer: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_cash_in_drawer: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_balance: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_balance: Option<Money>,

    /// Cash moved to the bank at close.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit: Option<Money>,

    #[serde(default)]
    pub status: EosStatus,

    #[serde(flatten)]
    pub totals: EosTotals,
}

impl EosRecord {
    /// Creates a `generated` record for a shift.
    pub fn generated(
        id: impl Into<String>,
        cycle_id: impl Into<String>,
        period_start: DateTime<Utc>,
    ) -> Self {
        EosRecord {
            id: id.into(),
            period_start,
            period_end: None,
            cycle_id: cycle_id.into(),
            original: PaymentBreakdown::new(),
            final_: PaymentBreakdown::new(),
            total_cash_in_drawer: None,
            expected_cash_in_drawer: None,
            opening_balance: None,
            end_balance: None,
            deposit: None,
            status: EosStatus::Generated,
            totals: EosTotals::default(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
