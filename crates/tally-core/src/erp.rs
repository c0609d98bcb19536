//! # Legacy-ERP Events
//!
//! Builds the ordered `(event, fields)` tuples the legacy order-processing
//! system consumes. Encoding them onto the wire happens elsewhere.
//!
//! ## Field Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  money      → Int(amount × 100, half-even)                              │
//! │  quantity   → Int(qty)                                                  │
//! │  text       → Text(..)                                                  │
//! │                                                                         │
//! │  a scalar field is emitted only when non-zero / non-empty               │
//! │  barcode/qty/price triples always follow the scalars, in receipt order  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Coupon amounts here are `price × qty`, unlike the aggregator buckets in
//! [`crate::receipt`] which ignore quantity.

use serde::Serialize;

use crate::money::Money;
use crate::payment::{PaymentBreakdown, PaymentMethod};
use crate::types::{CouponType, EosRecord, EosStatus, Transaction};

pub const SEND_ORDER: &str = "sendorder";
pub const PAY_STORE_CREDIT: &str = "paystorecredit";
pub const REDEEM_COUPON: &str = "redeemcoupon";
pub const ADD_COUPON: &str = "addcoupon";
pub const SET_EOD: &str = "seteod";
pub const RESET_EOD: &str = "reseteod";

/// A single event field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErpValue {
    Int(i64),
    Text(String),
}

/// One event with its ordered fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErpEvent {
    pub name: &'static str,
    pub fields: Vec<(String, ErpValue)>,
}

impl ErpEvent {
    fn new(name: &'static str) -> Self {
        ErpEvent {
            name,
            fields: Vec::new(),
        }
    }

    /// First value for a field name.
    pub fn field(&self, key: &str) -> Option<&ErpValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn push(&mut self, key: &str, value: ErpValue) {
        self.fields.push((key.to_string(), value));
    }

    fn money(&mut self, key: &str, amount: Money) {
        let scaled = amount.percent_scaled();
        if scaled != 0 {
            self.push(key, ErpValue::Int(scaled));
        }
    }

    fn optional_money(&mut self, key: &str, amount: Option<Money>) {
        if let Some(amount) = amount {
            self.money(key, amount);
        }
    }

    fn text(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.push(key, ErpValue::Text(value.to_string()));
        }
    }

    fn payments(&mut self, payments: &PaymentBreakdown) {
        for method in PaymentMethod::ALL {
            self.money(method.as_str(), payments.get(method));
        }
    }
}

/// Events for a recorded transaction: `sendorder` first, then one event per
/// voucher and store-credit payoff line.
pub fn transaction_events(tx: &Transaction) -> Vec<ErpEvent> {
    let mut order = ErpEvent::new(SEND_ORDER);
    order.text("nr", tx.nr.as_deref());
    order.text("type", Some(tx.kind.as_str()));
    order.text("shift", tx.shift.as_deref());
    order.money("totalamount", tx.totals.total_amount);
    order.money("totalpaid", tx.totals.total_paid);
    order.money("change", tx.totals.change);
    order.money("difference", tx.totals.difference);
    order.money("discount", tx.receipt_discount());

    let mut coupon = Money::ZERO;
    let mut discount_coupon = Money::ZERO;
    for item in tx.receipt.iter().filter(|i| i.is_coupon()) {
        match item.coupon_kind() {
            CouponType::A => coupon += item.line_amount(),
            kind if kind.is_flat_discount() => {
                discount_coupon += item.face_value().multiply_quantity(item.qty)
            }
            _ => {}
        }
    }
    order.money("coupon", coupon);
    order.money("discountcoupon", discount_coupon);

    order.payments(&tx.payments);

    let vat = &tx.totals.vat;
    order.money("zerototal", vat.zerototal);
    order.money("zeroamount", vat.zeroamount);
    order.money("lowtotal", vat.lowtotal);
    order.money("lowamount", vat.lowamount);
    order.money("hightotal", vat.hightotal);
    order.money("highamount", vat.highamount);

    for item in tx.barcode_items() {
        order.push(
            "barcode",
            ErpValue::Text(item.barcode.clone().unwrap_or_default()),
        );
        order.push("qty", ErpValue::Int(item.qty));
        order.push("price", ErpValue::Int(item.price.percent_scaled()));
    }

    let mut events = vec![order];

    for item in &tx.receipt {
        let name = if item.is_coupon() {
            match item.coupon_kind() {
                CouponType::U | CouponType::T => REDEEM_COUPON,
                CouponType::I => ADD_COUPON,
                _ => continue,
            }
        } else if item.is_store_credit() && item.coupon_type == Some(CouponType::O) {
            PAY_STORE_CREDIT
        } else {
            continue;
        };
        let mut event = ErpEvent::new(name);
        event.text("code", item.barcode.as_deref());
        event.money("amount", item.line_amount());
        events.push(event);
    }

    events
}

/// `seteod` for a completed shift, `reseteod` for a rectification, nothing
/// otherwise.
pub fn eos_events(record: &EosRecord) -> Vec<ErpEvent> {
    let name = match record.status {
        EosStatus::Completed => SET_EOD,
        EosStatus::Rectification => RESET_EOD,
        EosStatus::Generated => return Vec::new(),
    };

    let mut event = ErpEvent::new(name);
    event.text("cycle", Some(record.cycle_id.as_str()));
    event.money("turnover", record.totals.turnover);
    event.money("cashturnover", record.totals.cash_turnover);
    event.money("electronicturnover", record.totals.electronic_turnover);
    event.money("otherturnover", record.totals.other_turnover);
    event.money("difference", record.totals.difference);
    event.optional_money("totalcashindrawer", record.total_cash_in_drawer);
    event.optional_money("expectedcashindrawer", record.expected_cash_in_drawer);
    event.optional_money("openingbalance", record.opening_balance);
    event.optional_money("endbalance", record.end_balance);
    event.optional_money("deposit", record.deposit);
    event.money("zeroamount", record.totals.vat.zeroamount);
    event.money("lowamount", record.totals.vat.lowamount);
    event.money("highamount", record.totals.vat.highamount);
    event.payments(&record.final_);

    vec![event]
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calculated;
    use crate::eos;
    use crate::settings::EngineSettings;
    use crate::types::{ReceiptLineItem, TransactionType};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn keys(event: &ErpEvent) -> Vec<&str> {
        event.fields.iter().map(|(k, _)| k.as_str()).collect()
    }

    fn sale() -> Transaction {
        let mut tx = Transaction::new("t", TransactionType::Sale)
            .with_item(ReceiptLineItem::barcode("111", 2, Money::from_cents(1210), dec!(21)))
            .with_item(ReceiptLineItem::coupon(CouponType::A, 2, Money::from_cents(100)))
            .with_item(
                ReceiptLineItem::coupon(CouponType::C, 3, Money::ZERO)
                    .with_value(Money::from_cents(50)),
            )
            .with_item(ReceiptLineItem::coupon(CouponType::U, 1, Money::from_cents(500)).with_code("GV-1"))
            .with_item(ReceiptLineItem::coupon(CouponType::I, 1, Money::from_cents(250)).with_code("GV-2"))
            .with_item(
                ReceiptLineItem::store_credit(1, Money::from_cents(300))
                    .with_code("SC-9")
                    .with_coupon_type(CouponType::O),
            )
            .with_item(ReceiptLineItem::barcode("222", -1, Money::from_cents(500), dec!(9)))
            .with_payments(PaymentBreakdown::new().with(PaymentMethod::Cash, Money::from_cents(2000)));
        tx.nr = Some("000007".to_string());
        tx.shift = Some("shift-1".to_string());
        calculated(tx, &EngineSettings::default())
    }

    #[test]
    fn test_sendorder_layout() {
        let events = transaction_events(&sale());
        let order = &events[0];
        assert_eq!(order.name, SEND_ORDER);
        assert_eq!(order.field("nr"), Some(&ErpValue::Text("000007".into())));
        assert_eq!(order.field("type"), Some(&ErpValue::Text("sale".into())));
        assert_eq!(order.field("cash"), Some(&ErpValue::Int(2000)));
        // A coupons and flat coupons multiply quantity in
        assert_eq!(order.field("coupon"), Some(&ErpValue::Int(200)));
        assert_eq!(order.field("discountcoupon"), Some(&ErpValue::Int(150)));
        // zero-valued fields are omitted
        assert_eq!(order.field("pin"), None);
        assert_eq!(order.field("discount"), None);

        let k = keys(order);
        let tail = &k[k.len() - 6..];
        assert_eq!(tail, ["barcode", "qty", "price", "barcode", "qty", "price"]);
        let triple_start = order.fields.len() - 6;
        assert_eq!(order.fields[triple_start + 4].1, ErpValue::Int(-1));
        assert_eq!(order.fields[triple_start + 5].1, ErpValue::Int(500));
    }

    #[test]
    fn test_voucher_and_store_credit_events() {
        let events = transaction_events(&sale());
        let names: Vec<_> = events.iter().map(|e| e.name).collect();
        assert_eq!(names, [SEND_ORDER, REDEEM_COUPON, ADD_COUPON, PAY_STORE_CREDIT]);
        assert_eq!(events[1].field("code"), Some(&ErpValue::Text("GV-1".into())));
        assert_eq!(events[1].field("amount"), Some(&ErpValue::Int(500)));
        assert_eq!(events[3].field("amount"), Some(&ErpValue::Int(300)));
    }

    #[test]
    fn test_eos_events_by_status() {
        let start = Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap();
        let mut record = EosRecord::generated("e", "shift-1", start);
        record.final_ = PaymentBreakdown::new()
            .with(PaymentMethod::Cash, Money::from_cents(12_000))
            .with(PaymentMethod::Pin, Money::from_cents(3_050));
        assert!(eos_events(&record).is_empty());

        eos::settle(&mut record);
        eos::complete(&mut record, start, None);
        let events = eos_events(&record);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, SET_EOD);
        assert_eq!(events[0].field("cycle"), Some(&ErpValue::Text("shift-1".into())));
        assert_eq!(events[0].field("turnover"), Some(&ErpValue::Int(15_050)));
        assert_eq!(events[0].field("pin"), Some(&ErpValue::Int(3_050)));
        assert_eq!(events[0].field("highamount"), None);

        eos::rectify(&mut record);
        assert_eq!(eos_events(&record)[0].name, RESET_EOD);
    }
}
