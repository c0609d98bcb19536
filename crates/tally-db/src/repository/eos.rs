//! # EOS Repository
//!
//! Tenant-scoped storage for end-of-shift records.
//!
//! A shift (`cycle_id`) normally has one `generated` record that is later
//! completed, plus any number of rectification records.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::FIND_WINDOW;
use tally_core::types::EosRecord;

/// Repository for EOS records of one tenant.
#[derive(Debug, Clone)]
pub struct EosRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl EosRepository {
    /// Creates a new EosRepository bound to a tenant.
    pub fn new(pool: SqlitePool, tenant_id: impl Into<String>) -> Self {
        EosRepository {
            pool,
            tenant_id: tenant_id.into(),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<EosRecord>> {
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM eos_records WHERE tenant_id = ?1 AND id = ?2",
        )
        .bind(&self.tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        body.map(|b| serde_json::from_str(&b).map_err(DbError::from))
            .transpose()
    }

    pub async fn get(&self, id: &str) -> DbResult<EosRecord> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("EosRecord", id))
    }

    /// Records of one shift ordered by period start, at most
    /// [`FIND_WINDOW`] per call.
    pub async fn find_by_cycle(&self, cycle_id: &str, offset: i64) -> DbResult<Vec<EosRecord>> {
        let bodies: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT body FROM eos_records
            WHERE tenant_id = ?1 AND cycle_id = ?2
            ORDER BY period_start, created_at
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(&self.tenant_id)
        .bind(cycle_id)
        .bind(FIND_WINDOW)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(DbError::from))
            .collect()
    }

    pub async fn insert(&self, record: &EosRecord) -> DbResult<()> {
        debug!(
            tenant = %self.tenant_id,
            id = %record.id,
            cycle = %record.cycle_id,
            status = record.status.as_str(),
            "Inserting EOS record"
        );

        let body = serde_json::to_string(record)?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO eos_records (
                tenant_id, id, cycle_id, status, period_start,
                body, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(&self.tenant_id)
        .bind(&record.id)
        .bind(&record.cycle_id)
        .bind(record.status.as_str())
        .bind(record.period_start)
        .bind(body)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update(&self, record: &EosRecord) -> DbResult<()> {
        debug!(tenant = %self.tenant_id, id = %record.id, status = record.status.as_str(), "Updating EOS record");

        let body = serde_json::to_string(record)?;

        let result = sqlx::query(
            r#"
            UPDATE eos_records SET
                status = ?3,
                body = ?4,
                updated_at = ?5
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(&record.id)
        .bind(record.status.as_str())
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("EosRecord", &record.id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use tally_core::money::Money;
    use tally_core::types::EosStatus;
    use tally_core::DEFAULT_TENANT_ID;

    #[tokio::test]
    async fn test_insert_update_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.eos(DEFAULT_TENANT_ID);

        let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let mut record = EosRecord::generated("eos-1", "shift-1", start);
        record.opening_balance = Some(Money::from_cents(10_000));
        repo.insert(&record).await.unwrap();

        record.status = EosStatus::Completed;
        record.period_end = Some(start + Duration::hours(8));
        repo.update(&record).await.unwrap();

        let stored = repo.get("eos-1").await.unwrap();
        assert_eq!(stored, record);
        assert!(matches!(
            repo.get("eos-2").await,
            Err(DbError::NotFound { .. })
        ));

        // update of an unknown record is reported, not silently dropped
        let ghost = EosRecord::generated("ghost", "shift-1", start);
        assert!(repo.update(&ghost).await.is_err());
    }

    #[tokio::test]
    async fn test_find_by_cycle_is_ordered_and_scoped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.eos(DEFAULT_TENANT_ID);
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

        repo.insert(&EosRecord::generated("late", "shift-1", start + Duration::hours(1)))
            .await
            .unwrap();
        repo.insert(&EosRecord::generated("early", "shift-1", start))
            .await
            .unwrap();
        repo.insert(&EosRecord::generated("other", "shift-2", start))
            .await
            .unwrap();
        db.eos("another-tenant")
            .insert(&EosRecord::generated("foreign", "shift-1", start))
            .await
            .unwrap();

        let ids: Vec<String> = repo
            .find_by_cycle("shift-1", 0)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["early", "late"]);
    }
}
