//! # Repository Module
//!
//! Tenant-scoped document repositories for Tally.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Document Store Access                                │
//! │                                                                         │
//! │  TransactionService / EosService                                       │
//! │       │                                                                 │
//! │       │  db.transactions(tenant).find_by_shift("shift-7", 0)           │
//! │       ▼                                                                 │
//! │  TransactionRepository          EosRepository                          │
//! │  ├── find_by_id / get           ├── find_by_id / get                   │
//! │  ├── find_by_shift (windowed)   ├── find_by_cycle (windowed)           │
//! │  ├── insert / insert_numbered   ├── insert                             │
//! │  ├── update                     └── update                             │
//! │  ├── close_consignment                                                 │
//! │  └── settled_vat_for_shift                                             │
//! │       │                                                                 │
//! │       │  SQL (every filter carries tenant_id)                          │
//! │       ▼                                                                 │
//! │  SQLite: body column holds the JSON document                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`TransactionRepository`] - Transactions, receipt numbers, consignment links
//! - [`EosRepository`] - End-of-shift records

pub mod eos;
pub mod transaction;

pub use eos::EosRepository;
pub use transaction::TransactionRepository;

/// Largest number of documents one find call returns.
pub const FIND_WINDOW: i64 = 500;
