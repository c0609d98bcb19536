//! # Transaction Repository
//!
//! Tenant-scoped document operations for transactions.
//!
//! ## Receipt Number Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert_numbered(tx)                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  nr = MAX(nr) + 1 for (tenant, device), zero-padded to 6 digits         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT ──► UNIQUE (tenant_id, device, nr) violated?                    │
//! │       │          │                                                      │
//! │       │          └── yes: a concurrent insert took nr, allocate again   │
//! │       │               (up to 5 attempts, then ReceiptNumberExhausted)   │
//! │       ▼                                                                 │
//! │  stored                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consignment Closing
//! `close_consignment` reads, rewrites and saves the older record inside
//! one SQLite transaction, so two closers cannot interleave.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::future::Future;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::FIND_WINDOW;
use tally_core::linker::{self, CloseOutcome, LinkClose};
use tally_core::types::{Transaction, TransactionStatus, TransactionType, VatAmounts};

/// Width of a zero-padded receipt number.
pub const RECEIPT_NR_WIDTH: usize = 6;

/// Insert attempts before giving up on a receipt number.
pub const MAX_RECEIPT_NR_ATTEMPTS: u32 = 5;

/// Repository for transaction documents of one tenant.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository bound to a tenant.
    pub fn new(pool: SqlitePool, tenant_id: impl Into<String>) -> Self {
        TransactionRepository {
            pool,
            tenant_id: tenant_id.into(),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Gets a transaction by ID.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM transactions WHERE tenant_id = ?1 AND id = ?2",
        )
        .bind(&self.tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        body.map(|b| serde_json::from_str(&b).map_err(DbError::from))
            .transpose()
    }

    /// Gets a transaction by ID, failing when it doesn't exist.
    pub async fn get(&self, id: &str) -> DbResult<Transaction> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))
    }

    /// One window of a shift's transactions, oldest first.
    ///
    /// At most [`FIND_WINDOW`] rows are returned; pass the next `offset` to
    /// page through the rest.
    pub async fn find_by_shift(&self, shift: &str, offset: i64) -> DbResult<Vec<Transaction>> {
        let bodies: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT body FROM transactions
            WHERE tenant_id = ?1 AND shift = ?2
            ORDER BY created_at, id
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(&self.tenant_id)
        .bind(shift)
        .bind(FIND_WINDOW)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(DbError::from))
            .collect()
    }

    /// Inserts a transaction as-is (its `nr`, if any, is kept).
    pub async fn insert(&self, tx: &Transaction) -> DbResult<()> {
        debug!(tenant = %self.tenant_id, id = %tx.id, nr = ?tx.nr, "Inserting transaction");

        let body = serde_json::to_string(tx)?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO transactions (
                tenant_id, id, nr, device, shift,
                type, status, body, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?9
            )
            "#,
        )
        .bind(&self.tenant_id)
        .bind(&tx.id)
        .bind(&tx.nr)
        .bind(tx.device.as_deref().unwrap_or(""))
        .bind(&tx.shift)
        .bind(tx.kind.as_str())
        .bind(tx.status.as_str())
        .bind(body)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Next free receipt number for a device.
    pub async fn next_receipt_number(&self, device: &str) -> DbResult<String> {
        let max: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(CAST(nr AS INTEGER)) FROM transactions
            WHERE tenant_id = ?1 AND device = ?2 AND nr IS NOT NULL
            "#,
        )
        .bind(&self.tenant_id)
        .bind(device)
        .fetch_one(&self.pool)
        .await?;

        Ok(format!(
            "{:0width$}",
            max.unwrap_or(0) + 1,
            width = RECEIPT_NR_WIDTH
        ))
    }

    /// Allocates a receipt number, writes it onto `tx` and inserts it.
    ///
    /// Returns the allocated number.
    pub async fn insert_numbered(&self, tx: &mut Transaction) -> DbResult<String> {
        self.insert_numbered_with(tx, |device| {
            let repo = self.clone();
            async move { repo.next_receipt_number(&device).await }
        })
        .await
    }

    /// Insert loop behind [`Self::insert_numbered`]; `allocate` yields the
    /// candidate number for a device on each attempt.
    async fn insert_numbered_with<F, Fut>(
        &self,
        tx: &mut Transaction,
        mut allocate: F,
    ) -> DbResult<String>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = DbResult<String>>,
    {
        let device = tx.device.clone().unwrap_or_default();

        for attempt in 1..=MAX_RECEIPT_NR_ATTEMPTS {
            let nr = allocate(device.clone()).await?;
            tx.nr = Some(nr.clone());

            match self.insert(tx).await {
                Ok(()) => return Ok(nr),
                Err(DbError::UniqueViolation { field, .. }) if field.ends_with(".nr") => {
                    warn!(%device, %nr, attempt, "Receipt number taken, retrying");
                }
                Err(e) => {
                    tx.nr = None;
                    return Err(e);
                }
            }
        }

        tx.nr = None;
        Err(DbError::ReceiptNumberExhausted {
            device,
            attempts: MAX_RECEIPT_NR_ATTEMPTS,
        })
    }

    /// Rewrites a stored transaction.
    pub async fn update(&self, tx: &Transaction) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        self.update_on(&mut conn, tx).await
    }

    async fn update_on(&self, conn: &mut SqliteConnection, tx: &Transaction) -> DbResult<()> {
        debug!(tenant = %self.tenant_id, id = %tx.id, status = tx.status.as_str(), "Updating transaction");

        let body = serde_json::to_string(tx)?;

        let result = sqlx::query(
            r#"
            UPDATE transactions SET
                nr = ?3,
                shift = ?4,
                status = ?5,
                body = ?6,
                updated_at = ?7
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(&tx.id)
        .bind(&tx.nr)
        .bind(&tx.shift)
        .bind(tx.status.as_str())
        .bind(body)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", &tx.id));
        }

        Ok(())
    }

    /// Applies a consignment close to its target atomically.
    ///
    /// ## Errors
    /// - `LinkTargetMissing` when the target doesn't exist
    /// - `ReturnLinkImmutable` when the target is a return
    ///
    /// A target already carrying this close is left untouched.
    pub async fn close_consignment(&self, close: &LinkClose) -> DbResult<CloseOutcome> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM transactions WHERE tenant_id = ?1 AND id = ?2",
        )
        .bind(&self.tenant_id)
        .bind(&close.target_id)
        .fetch_optional(&mut *db_tx)
        .await?;

        let Some(body) = body else {
            return Err(DbError::LinkTargetMissing {
                id: close.target_id.clone(),
            });
        };
        let mut older: Transaction = serde_json::from_str(&body)?;

        let outcome = linker::apply_close(&mut older, close);
        match outcome {
            CloseOutcome::RefusedReturn => {
                return Err(DbError::ReturnLinkImmutable {
                    id: close.target_id.clone(),
                });
            }
            CloseOutcome::AlreadyClosed => {
                debug!(target = %close.target_id, by = %close.link.id, "Consignment already closed");
            }
            CloseOutcome::Closed => {
                self.update_on(&mut db_tx, &older).await?;
                db_tx
                    .commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                info!(target = %close.target_id, by = %close.link.id, "Consignment closed");
            }
        }

        Ok(outcome)
    }

    /// Sums the VAT amounts of a shift's settled, non-consignment
    /// transactions. `None` when the shift has none.
    pub async fn settled_vat_for_shift(&self, shift: &str) -> DbResult<Option<VatAmounts>> {
        let mut offset = 0;
        let mut total: Option<VatAmounts> = None;

        loop {
            let window = self.find_by_shift(shift, offset).await?;
            let fetched = window.len() as i64;

            for tx in window.iter().filter(|tx| {
                tx.status == TransactionStatus::Settled && tx.kind != TransactionType::Consignment
            }) {
                let amounts = tx.totals.vat.amounts();
                total = Some(total.map_or(amounts, |sum| sum + amounts));
            }

            if fetched < FIND_WINDOW {
                break;
            }
            offset += fetched;
        }

        Ok(total)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
