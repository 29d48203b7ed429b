//! Operations on the `parking_records` table.
//!
//! One row per accepted occupancy update. Rows are only ever inserted and
//! read; there is no update or delete path.

use chrono::{DateTime, Utc};
use parkwatch_types::HistoryRecord;
use sqlx::PgPool;

use crate::error::DbError;

/// Operations on the `parking_records` table.
#[derive(Debug, Clone, Copy)]
pub struct HistoryStore<'a> {
    pool: &'a PgPool,
}

impl<'a> HistoryStore<'a> {
    /// Create a history store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append one record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, record: &HistoryRecord) -> Result<(), DbError> {
        sqlx::query(
            r#"INSERT INTO parking_records ("timestamp", total, occupied, available)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(record.timestamp)
        .bind(i64::from(record.total))
        .bind(i64::from(record.occupied))
        .bind(i64::from(record.available))
        .execute(self.pool)
        .await?;

        tracing::debug!(
            total = record.total,
            occupied = record.occupied,
            "Inserted parking record"
        );
        Ok(())
    }

    /// Up to `limit` records with `timestamp >= since`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::InvalidRow`] if a stored row is out of range.
    pub async fn recent(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"SELECT id, "timestamp", total, occupied, available
               FROM parking_records
               WHERE "timestamp" >= $1
               ORDER BY "timestamp" DESC, id DESC
               LIMIT $2"#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(HistoryRecord::try_from).collect()
    }

    /// Total number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn count(&self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parking_records")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// A row from the `parking_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HistoryRow {
    /// Auto-incremented row ID.
    pub id: i64,
    /// When the update was accepted.
    pub timestamp: DateTime<Utc>,
    /// Facility capacity.
    pub total: i64,
    /// Occupied spots.
    pub occupied: i64,
    /// Free spots.
    pub available: i64,
}

impl TryFrom<HistoryRow> for HistoryRecord {
    type Error = DbError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let field = |name: &str, value: i64| {
            u32::try_from(value).map_err(|e| DbError::InvalidRow {
                id: row.id,
                message: format!("{name} = {value}: {e}"),
            })
        };
        Ok(Self {
            timestamp: row.timestamp,
            total: field("total", row.total)?,
            occupied: field("occupied", row.occupied)?,
            available: field("available", row.available)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(total: i64, occupied: i64) -> HistoryRow {
        HistoryRow {
            id: 7,
            timestamp: Utc::now(),
            total,
            occupied,
            available: total - occupied,
        }
    }

    #[test]
    fn row_converts_to_record() {
        let record = HistoryRecord::try_from(row(10, 4));
        assert_eq!(record.as_ref().map(|r| r.available).ok(), Some(6));
        assert_eq!(record.map(|r| r.total).ok(), Some(10));
    }

    #[test]
    fn negative_row_is_rejected() {
        let result = HistoryRecord::try_from(row(-1, -1));
        assert!(matches!(result, Err(DbError::InvalidRow { id: 7, .. })));
    }
}
