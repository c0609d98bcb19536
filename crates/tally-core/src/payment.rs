//! # Payment Classifier
//!
//! Static classification of every payment-method name into a turnover
//! direction and a family. Shared by the transaction engine and the EOS
//! engine.
//!
//! ## Classification Table
//! ```text
//! ┌──────────────────┬────────────┬────────────┐
//! │ method           │ direction  │ family     │
//! ├──────────────────┼────────────┼────────────┤
//! │ cash             │ increase   │ cash       │
//! │ change           │ decrease   │ cash       │
//! │ deposit          │ decrease   │ cash       │
//! │ withdrawel       │ increase   │ cash       │
//! │ pin              │ increase   │ electronic │
//! │ creditcard       │ increase   │ electronic │
//! │ webshop          │ increase   │ electronic │
//! │ consignment      │ ignored    │ other      │
//! │ creditreceipt    │ increase   │ other      │
//! │ creditreceiptin  │ increase   │ other      │
//! │ couponin         │ increase   │ other      │
//! │ couponout        │ increase   │ other      │
//! │ storecredit      │ increase   │ other      │
//! │ storecreditin    │ decrease   │ other      │
//! └──────────────────┴────────────┴────────────┘
//! ```
//!
//! The table is a `const fn` match on [`PaymentMethod`]: process-wide,
//! immutable, and exhaustive by construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

/// Every payment-method key the engine recognises.
///
/// `Withdrawel` keeps the legacy spelling used by the stored records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Change,
    Consignment,
    Creditcard,
    Creditreceipt,
    Creditreceiptin,
    Couponin,
    Couponout,
    Deposit,
    Pin,
    Storecredit,
    Storecreditin,
    Withdrawel,
    Webshop,
}

impl PaymentMethod {
    /// All recognised methods, in canonical (event emission) order.
    pub const ALL: [PaymentMethod; 14] = [
        PaymentMethod::Cash,
        PaymentMethod::Change,
        PaymentMethod::Consignment,
        PaymentMethod::Creditcard,
        PaymentMethod::Creditreceipt,
        PaymentMethod::Creditreceiptin,
        PaymentMethod::Couponin,
        PaymentMethod::Couponout,
        PaymentMethod::Deposit,
        PaymentMethod::Pin,
        PaymentMethod::Storecredit,
        PaymentMethod::Storecreditin,
        PaymentMethod::Withdrawel,
        PaymentMethod::Webshop,
    ];

    /// Methods that count towards `totalPaid` on a transaction.
    ///
    /// Withdrawal and coupon-in/out are deliberately absent.
    pub const PAID: [PaymentMethod; 7] = [
        PaymentMethod::Cash,
        PaymentMethod::Pin,
        PaymentMethod::Creditcard,
        PaymentMethod::Creditreceipt,
        PaymentMethod::Storecredit,
        PaymentMethod::Consignment,
        PaymentMethod::Webshop,
    ];

    /// Methods whose presence makes a transaction "not cash-only".
    pub const NON_CASH: [PaymentMethod; 4] = [
        PaymentMethod::Pin,
        PaymentMethod::Creditcard,
        PaymentMethod::Creditreceipt,
        PaymentMethod::Storecredit,
    ];

    /// Record key for this method.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Change => "change",
            PaymentMethod::Consignment => "consignment",
            PaymentMethod::Creditcard => "creditcard",
            PaymentMethod::Creditreceipt => "creditreceipt",
            PaymentMethod::Creditreceiptin => "creditreceiptin",
            PaymentMethod::Couponin => "couponin",
            PaymentMethod::Couponout => "couponout",
            PaymentMethod::Deposit => "deposit",
            PaymentMethod::Pin => "pin",
            PaymentMethod::Storecredit => "storecredit",
            PaymentMethod::Storecreditin => "storecreditin",
            PaymentMethod::Withdrawel => "withdrawel",
            PaymentMethod::Webshop => "webshop",
        }
    }

    /// Looks up the classifier entry for this method.
    pub const fn classification(&self) -> Classification {
        use PaymentFamily::{Cash, Electronic, Other};
        use TurnoverDirection::{Decrease, Ignored, Increase};

        let (direction, family) = match self {
            PaymentMethod::Cash => (Increase, Cash),
            PaymentMethod::Change => (Decrease, Cash),
            PaymentMethod::Deposit => (Decrease, Cash),
            PaymentMethod::Withdrawel => (Increase, Cash),
            PaymentMethod::Pin => (Increase, Electronic),
            PaymentMethod::Creditcard => (Increase, Electronic),
            PaymentMethod::Webshop => (Increase, Electronic),
            PaymentMethod::Consignment => (Ignored, Other),
            PaymentMethod::Creditreceipt => (Increase, Other),
            PaymentMethod::Creditreceiptin => (Increase, Other),
            PaymentMethod::Couponin => (Increase, Other),
            PaymentMethod::Couponout => (Increase, Other),
            PaymentMethod::Storecredit => (Increase, Other),
            PaymentMethod::Storecreditin => (Decrease, Other),
        };
        Classification { direction, family }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| CoreError::UnknownPaymentMethod(s.to_string()))
    }
}

// =============================================================================
// Classification
// =============================================================================

/// How a method moves turnover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnoverDirection {
    Increase,
    Decrease,
    Ignored,
}

impl TurnoverDirection {
    /// Signed contribution of `amount` under this direction.
    #[inline]
    pub fn apply(&self, amount: Money) -> Money {
        match self {
            TurnoverDirection::Increase => amount,
            TurnoverDirection::Decrease => -amount,
            TurnoverDirection::Ignored => Money::ZERO,
        }
    }
}

/// Payment family for turnover filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentFamily {
    Cash,
    Electronic,
    Other,
}

impl PaymentFamily {
    const fn bit(&self) -> u8 {
        match self {
            PaymentFamily::Cash => 0b001,
            PaymentFamily::Electronic => 0b010,
            PaymentFamily::Other => 0b100,
        }
    }
}

/// One classifier entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub direction: TurnoverDirection,
    pub family: PaymentFamily,
}

// =============================================================================
// Family Set
// =============================================================================

/// A set of payment families, used as the turnover filter predicate.
///
/// ## Example
/// ```rust
/// use tally_core::payment::{FamilySet, PaymentFamily};
///
/// let cash: FamilySet = PaymentFamily::Cash.into();
/// assert!(cash.contains(PaymentFamily::Cash));
///
/// let both: FamilySet = [PaymentFamily::Cash, PaymentFamily::Electronic].into_iter().collect();
/// assert!(!both.contains(PaymentFamily::Other));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FamilySet(u8);

impl FamilySet {
    /// The empty set (matches nothing).
    pub const fn empty() -> Self {
        FamilySet(0)
    }

    /// Every family (the unfiltered case).
    pub const fn all() -> Self {
        FamilySet(0b111)
    }

    /// Adds a family to the set.
    pub const fn with(self, family: PaymentFamily) -> Self {
        FamilySet(self.0 | family.bit())
    }

    /// Checks membership.
    #[inline]
    pub const fn contains(&self, family: PaymentFamily) -> bool {
        self.0 & family.bit() != 0
    }
}

impl From<PaymentFamily> for FamilySet {
    fn from(family: PaymentFamily) -> Self {
        FamilySet::empty().with(family)
    }
}

impl FromIterator<PaymentFamily> for FamilySet {
    fn from_iter<I: IntoIterator<Item = PaymentFamily>>(iter: I) -> Self {
        iter.into_iter().fold(FamilySet::empty(), FamilySet::with)
    }
}

// =============================================================================
// Payment Breakdown
// =============================================================================

/// Mapping from payment-method name to a signed amount.
///
/// Keys are kept as strings so unknown methods survive a load/store
/// round trip; they are simply never classified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentBreakdown(BTreeMap<String, Money>);

impl PaymentBreakdown {
    /// Creates an empty breakdown.
    pub fn new() -> Self {
        PaymentBreakdown::default()
    }

    /// Amount for a recognised method, zero when absent.
    #[inline]
    pub fn get(&self, method: PaymentMethod) -> Money {
        self.0.get(method.as_str()).copied().unwrap_or(Money::ZERO)
    }

    /// Whether the method is present in the breakdown at all.
    #[inline]
    pub fn has(&self, method: PaymentMethod) -> bool {
        self.0.contains_key(method.as_str())
    }

    /// Sets a recognised method's amount.
    pub fn set(&mut self, method: PaymentMethod, amount: Money) {
        self.0.insert(method.as_str().to_string(), amount);
    }

    /// Sets an arbitrary key (including unknown ones).
    pub fn insert(&mut self, key: impl Into<String>, amount: Money) {
        self.0.insert(key.into(), amount);
    }

    /// Builder-style `set`.
    pub fn with(mut self, method: PaymentMethod, amount: Money) -> Self {
        self.set(method, amount);
        self
    }

    /// Sum of the given methods.
    pub fn sum_of(&self, methods: &[PaymentMethod]) -> Money {
        methods.iter().map(|m| self.get(*m)).sum()
    }

    /// All entries in key order, unknown keys included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Money)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Entries whose key is a recognised method.
    pub fn classified(&self) -> impl Iterator<Item = (PaymentMethod, Money)> + '_ {
        self.0
            .iter()
            .filter_map(|(k, v)| k.parse::<PaymentMethod>().ok().map(|m| (m, *v)))
    }

    /// A copy with every amount negated (unknown keys included).
    pub fn negated(&self) -> Self {
        PaymentBreakdown(self.0.iter().map(|(k, v)| (k.clone(), -*v)).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(PaymentMethod, Money)> for PaymentBreakdown {
    fn from_iter<I: IntoIterator<Item = (PaymentMethod, Money)>>(iter: I) -> Self {
        PaymentBreakdown(
            iter.into_iter()
                .map(|(m, v)| (m.as_str().to_string(), v))
                .collect(),
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
