use anyhow::Result;
use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::domain::ConsumptionRecord;
use crate::schema;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct YearlyTotal {
    pub year: String,
    pub total_kwh: f64,
}

/// Fetch a time-ordered load profile for a single meter.
pub async fn load_profile(
    pool: &SqlitePool,
    meter_id: &str,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<Vec<ConsumptionRecord>> {
    let sql = format!(
        "SELECT {cols} FROM {table} \
         WHERE meterid = ? AND date >= ? AND date < ? \
         ORDER BY date",
        cols = schema::CONSUMPTION_COLUMNS,
        table = schema::CONSUMPTION_TABLE,
    );

    let rows = sqlx::query_as::<_, ConsumptionRecord>(&sql)
        .bind(meter_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Known meter ids, for presentation-layer pickers.
pub async fn distinct_meters(pool: &SqlitePool) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT meterid FROM {} ORDER BY meterid",
        schema::CONSUMPTION_TABLE,
    );
    let rows = sqlx::query_scalar::<_, String>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Years with at least one stored reading, ascending.
///
/// Timestamps are stored as ISO-8601 text, so the year is the leading
/// four characters regardless of the exact offset suffix.
pub async fn distinct_years(pool: &SqlitePool) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT substr(date, 1, 4) AS year FROM {} ORDER BY year",
        schema::CONSUMPTION_TABLE,
    );
    let rows = sqlx::query_scalar::<_, String>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Aggregate kWh per calendar year for one meter.
pub async fn yearly_totals(pool: &SqlitePool, meter_id: &str) -> Result<Vec<YearlyTotal>> {
    let sql = format!(
        "SELECT substr(date, 1, 4) AS year, SUM(kwh) AS total_kwh \
         FROM {} WHERE meterid = ? \
         GROUP BY year ORDER BY year",
        schema::CONSUMPTION_TABLE,
    );

    let rows = sqlx::query_as::<_, YearlyTotal>(&sql)
        .bind(meter_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
