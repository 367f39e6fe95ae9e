use crate::DbError;
use chrono::NaiveDate;
use core_types::SalesRecord;
use sqlx::Row;
use sqlx::postgres::PgPool;

/// The `SalesRepository` provides a high-level, application-specific
/// interface to the `daily_sales` table. It encapsulates all SQL queries
/// and data access logic.
#[derive(Debug, Clone)]
pub struct SalesRepository {
    pool: PgPool,
}

impl SalesRepository {
    /// Creates a new `SalesRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches every stored record, in insertion order.
    pub async fn fetch_all(&self) -> Result<Vec<SalesRecord>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT sale_date, section, visitor_count, revenue, transaction_count,
                   item_count, average_transaction_value, items_per_transaction,
                   conversion_rate, year_label
            FROM daily_sales
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .into_iter()
            .map(|row| SalesRecord {
                date: row.get("sale_date"),
                section: row.get("section"),
                visitor_count: row.get("visitor_count"),
                revenue: row.get("revenue"),
                transaction_count: row.get("transaction_count"),
                item_count: row.get("item_count"),
                average_transaction_value: row.get("average_transaction_value"),
                items_per_transaction: row.get("items_per_transaction"),
                conversion_rate: row.get("conversion_rate"),
                year: row.get("year_label"),
            })
            .collect();

        Ok(records)
    }

    /// Appends a batch of records inside one transaction, so a failed upload
    /// leaves the archive untouched.
    pub async fn append_batch(&self, records: &[SalesRecord]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO daily_sales (
                    sale_date, section, visitor_count, revenue, transaction_count,
                    item_count, average_transaction_value, items_per_transaction,
                    conversion_rate, year_label
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(record.date)
            .bind(&record.section)
            .bind(record.visitor_count)
            .bind(record.revenue)
            .bind(record.transaction_count)
            .bind(record.item_count)
            .bind(record.average_transaction_value)
            .bind(record.items_per_transaction)
            .bind(record.conversion_rate)
            .bind(record.year)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(rows = records.len(), "appended sales batch");
        Ok(())
    }

    /// The administrative reset: deletes every stored record and returns how
    /// many were removed.
    pub async fn clear(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM daily_sales")
            .execute(&self.pool)
            .await?;
        tracing::warn!(rows = result.rows_affected(), "cleared the sales archive");
        Ok(result.rows_affected())
    }

    /// The year labels present in the archive, most recent first.
    pub async fn distinct_years(&self) -> Result<Vec<i32>, DbError> {
        let rows =
            sqlx::query("SELECT DISTINCT year_label FROM daily_sales ORDER BY year_label DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|row| row.get("year_label")).collect())
    }

    /// The section labels present in the archive, alphabetical.
    pub async fn distinct_sections(&self) -> Result<Vec<String>, DbError> {
        let rows = sqlx::query("SELECT DISTINCT section FROM daily_sales ORDER BY section ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|row| row.get("section")).collect())
    }

    /// The earliest and latest dates on record, or `None` for an empty
    /// archive. Used to default the comparison range.
    pub async fn date_bounds(&self) -> Result<Option<(NaiveDate, NaiveDate)>, DbError> {
        let row = sqlx::query(
            "SELECT MIN(sale_date) AS min_date, MAX(sale_date) AS max_date FROM daily_sales",
        )
        .fetch_one(&self.pool)
        .await?;

        let min: Option<NaiveDate> = row.get("min_date");
        let max: Option<NaiveDate> = row.get("max_date");
        Ok(min.zip(max))
    }
}
