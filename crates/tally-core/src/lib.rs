//! # tally-core: Pure Calculation Engine for Tally
//!
//! This crate is the **heart** of Tally. It derives every money total,
//! VAT bucket, change amount and shift turnover as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              tally CLI / store-backed services                  │   │
//! │  │    record sale ──► close consignment ──► close shift            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  payment  │  │  receipt  │  │    vat    │  │  change   │  │   │
//! │  │   │ classifier│─►│ aggregate │─►│  buckets  │─►│ rounding  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  display  │  │  linker   │  │    eos    │  │    erp    │  │   │
//! │  │   │ documents │  │  returns  │  │ turnover  │  │  events   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Store Layer)                       │   │
//! │  │     SQLite documents, receipt numbers, link rewrites, config    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Decimal money with half-even rounding
//! - [`payment`] - Payment classifier and breakdowns
//! - [`types`] - Transaction and EOS record shapes
//! - [`settings`] - Per-tenant VAT tiers and cash rounding
//! - [`receipt`], [`vat`], [`change`] - The transaction pipeline stages
//! - [`engine`] - The stages wired together
//! - [`display`] - Per-line values for printed documents
//! - [`linker`] - Consignment closing and cancellations
//! - [`eos`] - Shift turnover and settlement
//! - [`erp`] - Legacy-ERP event tuples
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same record and settings in, same fields out
//! 2. **No I/O**: the store collaborator lives in tally-db
//! 3. **Decimal Money**: no floating point anywhere in the arithmetic
//! 4. **Total Functions**: calculations never fail; only parsing does
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::{calculate, EngineSettings, Money, PaymentBreakdown, PaymentMethod};
//! use tally_core::types::{ReceiptLineItem, Transaction, TransactionType};
//! use rust_decimal::Decimal;
//!
//! let mut tx = Transaction::new("t-1", TransactionType::Sale)
//!     .with_item(ReceiptLineItem::barcode("8710000000011", 1, Money::from_cents(1210), Decimal::from(21)))
//!     .with_payments(PaymentBreakdown::new().with(PaymentMethod::Pin, Money::from_cents(1210)));
//!
//! calculate(&mut tx, &EngineSettings::default());
//! assert_eq!(tx.totals.vat.highamount, Money::from_cents(210));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod change;
pub mod display;
pub mod engine;
pub mod eos;
pub mod erp;
pub mod error;
pub mod linker;
pub mod money;
pub mod payment;
pub mod receipt;
pub mod settings;
pub mod types;
pub mod vat;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use engine::{calculate, calculated};
pub use error::{CoreError, CoreResult};
pub use money::Money;
pub use payment::{FamilySet, PaymentBreakdown, PaymentFamily, PaymentMethod};
pub use settings::{EngineSettings, VatTiers};
pub use types::{EosRecord, Transaction};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tenant used when no tenant is configured.
///
/// Records never carry their tenant; the store scopes every query with it.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";
