//! # tally-db: Store Layer for Tally
//!
//! This crate is the document-store collaborator for the Tally engine.
//! It uses SQLite for storage with sqlx for async operations, and hosts
//! the write paths that need both the engine and the store.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Data Flow                                  │
//! │                                                                         │
//! │  tally CLI (record / close-shift)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Services    │    │  Repositories │    │   Database   │  │   │
//! │  │   │ (service.rs)  │    │ (tenant-bound)│    │  (pool.rs)   │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ Transaction   │───►│ Transaction   │───►│ SqlitePool   │  │   │
//! │  │   │ Eos           │    │ Eos           │    │ Migrations   │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │           ▼ tally-core (calculate, linker, eos)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   transactions / eos_records, JSON document per row             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store error types
//! - [`repository`] - Tenant-scoped repositories
//! - [`service`] - Recording, cancelling and shift completion
//! - [`config`] - TOML + environment configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, TallyConfig, TransactionService};
//!
//! let config = TallyConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let service = TransactionService::new(&db, config.tenant_id(), config.engine_settings());
//! let stored = service.record(tx).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::TallyConfig;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::{EosService, TransactionService};

// Repository re-exports for convenience
pub use repository::eos::EosRepository;
pub use repository::transaction::TransactionRepository;
