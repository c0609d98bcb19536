//! # Transaction Linker
//!
//! Forward/backward references between sale, consignment and return
//! transactions, and derivation of a cancellation record.
//!
//! ## Link Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Consignment A (open)                                                   │
//! │       ▲                                                                 │
//! │       │ link {id: A, type: consignment}                                 │
//! │  Sale B is recorded                                                     │
//! │       │                                                                 │
//! │       ▼  closing_link(B) → rewrite A                                    │
//! │  A.link   = {id: B, comment: "closed", type: sale}                      │
//! │  A.status = closed                                                      │
//! │                                                                         │
//! │  cancel(B) → C                                                          │
//! │  C.qty, C.payments negated                                              │
//! │  C.link = {id: B, comment: B.nr, type: return}  (never rewritten)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure. Loading and saving the older record is the
//! store's job (`tally_db::service::TransactionService`).

use crate::types::{LinkRelation, LinkType, Transaction, TransactionStatus};

/// Comment written onto a consignment closed by a later transaction.
pub const CLOSED_COMMENT: &str = "closed";

/// A pending forward rewrite of an older consignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkClose {
    /// Id of the consignment to close.
    pub target_id: String,
    /// Link to write onto it.
    pub link: LinkRelation,
}

/// Result of applying a [`LinkClose`] to the loaded target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The target was rewritten and must be saved.
    Closed,
    /// The target already carries this exact close; nothing to save.
    AlreadyClosed,
    /// The target is a return, whose backward link is immutable.
    RefusedReturn,
}

/// The rewrite `new` requires on the consignment it references, if any.
pub fn closing_link(new: &Transaction) -> Option<LinkClose> {
    let link = new.link.as_ref()?;
    if link.kind != LinkType::Consignment {
        return None;
    }
    Some(LinkClose {
        target_id: link.id.clone(),
        link: LinkRelation {
            id: new.id.clone(),
            kind: LinkType::from(new.kind),
            comment: CLOSED_COMMENT.to_string(),
        },
    })
}

/// Rewrites `older` to point forward and marks it closed.
///
/// Applying the same close twice is a no-op the second time.
pub fn apply_close(older: &mut Transaction, close: &LinkClose) -> CloseOutcome {
    match &older.link {
        Some(link) if link.kind == LinkType::Return => return CloseOutcome::RefusedReturn,
        Some(link) if *link == close.link && older.status == TransactionStatus::Closed => {
            return CloseOutcome::AlreadyClosed;
        }
        _ => {}
    }
    older.link = Some(close.link.clone());
    older.status = TransactionStatus::Closed;
    CloseOutcome::Closed
}

/// Derives the compensating return record for `original`.
///
/// Quantities, payments and receipt-level discounts are negated and the
/// computed totals are reset, so the result has to go through
/// [`crate::engine::calculate`] before it is stored. `nr` is cleared for
/// fresh allocation.
///
/// ## Example
/// ```rust
/// use tally_core::linker::cancel;
/// use tally_core::money::Money;
/// use tally_core::types::{LinkType, ReceiptLineItem, Transaction, TransactionType};
/// use rust_decimal::Decimal;
///
/// let mut sale = Transaction::new("t-1", TransactionType::Sale)
///     .with_item(ReceiptLineItem::barcode("A", 2, Money::from_cents(500), Decimal::from(21)));
/// sale.nr = Some("000042".to_string());
///
/// let ret = cancel(&sale, "t-2");
/// assert_eq!(ret.receipt[0].qty, -2);
/// let link = ret.link.unwrap();
/// assert_eq!((link.id.as_str(), link.kind, link.comment.as_str()), ("t-1", LinkType::Return, "000042"));
/// ```
pub fn cancel(original: &Transaction, new_id: impl Into<String>) -> Transaction {
    let mut ret = original.clone();
    ret.id = new_id.into();
    ret.nr = None;
    ret.status = TransactionStatus::Settled;
    ret.date = None;
    for item in &mut ret.receipt {
        item.qty = -item.qty;
    }
    ret.payments = original.payments.negated();
    ret.overall_receipt_discount = original.overall_receipt_discount.map(|d| -d);
    ret.total_discount = original.total_discount.map(|d| -d);
    ret.totals = Default::default();
    ret.link = Some(LinkRelation {
        id: original.id.clone(),
        kind: LinkType::Return,
        comment: original.nr.clone().unwrap_or_default(),
    });
    ret
}

// =============================================================================
// Unit Tests
// =============================================================================
