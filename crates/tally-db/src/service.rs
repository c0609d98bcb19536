//! # Store-Backed Services
//!
//! The write paths that need both the engine and the store.
//!
//! ## Recording a Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TransactionService::record(tx)                                         │
//! │       │                                                                 │
//! │       ├── id / date defaults                                            │
//! │       ├── engine::calculate(tx, settings)                               │
//! │       │                                                                 │
//! │       ├── link.type == consignment?                                     │
//! │       │        └── close_consignment(target)  ── fails? nothing stored  │
//! │       │                                                                 │
//! │       └── insert_numbered(tx)  ── nr allocated per device               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Closing a Shift
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EosService::close(id, now)                                              │
//! │       │                                                                 │
//! │       ├── eos::settle(record)        turnover, difference, expected     │
//! │       ├── settled_vat_for_shift      Σ VAT of settled non-consignments  │
//! │       ├── eos::complete(record)      status, periodEnd, VAT             │
//! │       └── update                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::{EosRepository, TransactionRepository};
use tally_core::engine;
use tally_core::eos;
use tally_core::linker;
use tally_core::settings::EngineSettings;
use tally_core::types::{
    EosRecord, EosStatus, Transaction, TransactionStatus, TransactionType,
};

// =============================================================================
// Transactions
// =============================================================================

/// Records sales, transits and consignments for one tenant.
#[derive(Debug, Clone)]
pub struct TransactionService {
    transactions: TransactionRepository,
    settings: EngineSettings,
}

impl TransactionService {
    pub fn new(db: &Database, tenant_id: impl Into<String>, settings: EngineSettings) -> Self {
        TransactionService {
            transactions: db.transactions(tenant_id),
            settings,
        }
    }

    pub fn repository(&self) -> &TransactionRepository {
        &self.transactions
    }

    /// Calculates and stores a new transaction.
    ///
    /// If the transaction closes a consignment, the consignment is rewritten
    /// first. A missing or immutable target aborts the whole call.
    pub async fn record(&self, mut tx: Transaction) -> DbResult<Transaction> {
        if tx.id.is_empty() {
            tx.id = Uuid::new_v4().to_string();
        }
        if tx.date.is_none() {
            tx.date = Some(Utc::now());
        }
        if tx.kind == TransactionType::Consignment && tx.status == TransactionStatus::Settled {
            tx.status = TransactionStatus::Open;
        }

        engine::calculate(&mut tx, &self.settings);

        if let Some(close) = linker::closing_link(&tx) {
            self.transactions.close_consignment(&close).await?;
        }

        let nr = self.transactions.insert_numbered(&mut tx).await?;
        info!(
            id = %tx.id,
            %nr,
            kind = tx.kind.as_str(),
            total = %tx.totals.total_amount,
            "Transaction recorded"
        );

        Ok(tx)
    }

    /// Stores the compensating return for transaction `id`.
    ///
    /// `shift` moves the return onto the current shift; `None` keeps the
    /// original's.
    pub async fn cancel(&self, id: &str, shift: Option<String>) -> DbResult<Transaction> {
        let original = self.transactions.get(id).await?;

        let mut ret = linker::cancel(&original, Uuid::new_v4().to_string());
        if shift.is_some() {
            ret.shift = shift;
        }
        ret.date = Some(Utc::now());
        engine::calculate(&mut ret, &self.settings);

        let nr = self.transactions.insert_numbered(&mut ret).await?;
        info!(original = %id, id = %ret.id, %nr, "Transaction cancelled");

        Ok(ret)
    }
}

// =============================================================================
// End of Shift
// =============================================================================

/// Opens, completes and rectifies EOS records for one tenant.
#[derive(Debug, Clone)]
pub struct EosService {
    records: EosRepository,
    transactions: TransactionRepository,
}

impl EosService {
    pub fn new(db: &Database, tenant_id: impl Into<String>) -> Self {
        let tenant_id = tenant_id.into();
        EosService {
            records: db.eos(tenant_id.clone()),
            transactions: db.transactions(tenant_id),
        }
    }

    pub fn repository(&self) -> &EosRepository {
        &self.records
    }

    /// Stores the `generated` record at shift start.
    pub async fn open(&self, mut record: EosRecord) -> DbResult<EosRecord> {
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }
        record.status = EosStatus::Generated;
        self.records.insert(&record).await?;
        Ok(record)
    }

    /// Settles and completes the record, pulling VAT from the shift's
    /// settled transactions.
    pub async fn close(&self, id: &str, now: DateTime<Utc>) -> DbResult<EosRecord> {
        let mut record = self.records.get(id).await?;

        eos::settle(&mut record);
        let vat = self.transactions.settled_vat_for_shift(&record.cycle_id).await?;
        eos::complete(&mut record, now, vat);
        self.records.update(&record).await?;

        info!(
            id = %record.id,
            cycle = %record.cycle_id,
            turnover = %record.totals.turnover,
            difference = %record.totals.difference,
            "Shift completed"
        );

        Ok(record)
    }

    /// Stores a correction record for a shift.
    pub async fn rectify(&self, mut record: EosRecord) -> DbResult<EosRecord> {
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }
        eos::settle(&mut record);
        eos::rectify(&mut record);
        self.records.insert(&record).await?;

        info!(id = %record.id, cycle = %record.cycle_id, "Rectification recorded");
        Ok(record)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
