//! Write side of the embedded SQLite store.
//!
//! Every operation opens a fresh connection, executes, and closes; no
//! transaction is held across operations. A crash between a drop and the
//! following bulk load can leave a freshly created empty table — an
//! accepted limitation of the non-atomic bulk-load model.

use std::path::PathBuf;

use eloverblik_client::schema;
use eloverblik_client::{ConsumptionRecord, MeterInfo, TariffRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection, QueryBuilder, Sqlite};
use time::OffsetDateTime;

use crate::error::Result;

pub struct Store {
    path: PathBuf,
    batch_size: usize,
}

impl Store {
    pub fn new(path: PathBuf, batch_size: usize) -> Self {
        Self { path, batch_size }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(sqlx::Error::Io)?;
            }
        }
        let conn = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .connect()
            .await?;
        Ok(conn)
    }

    async fn ensure_consumption(conn: &mut SqliteConnection) -> Result<()> {
        let ddl = schema::CONSUMPTION_DDL.replacen("CREATE TABLE", "CREATE TABLE IF NOT EXISTS", 1);
        sqlx::query(&ddl).execute(&mut *conn).await?;
        Ok(())
    }

    /// Drop and recreate `meterinfo`, then bulk-load the listing.
    pub async fn replace_meter_info(&self, rows: &[MeterInfo]) -> Result<()> {
        let mut conn = self.connect().await?;
        sqlx::query(&format!(
            "DROP TABLE IF EXISTS {}",
            schema::METER_INFO_TABLE
        ))
        .execute(&mut conn)
        .await?;
        sqlx::query(schema::METER_INFO_DDL).execute(&mut conn).await?;

        for chunk in rows.chunks(self.batch_size.max(1)) {
            let mut builder = QueryBuilder::<Sqlite>::new(format!(
                "INSERT INTO {} ({}) ",
                schema::METER_INFO_TABLE,
                schema::METER_INFO_COLUMNS,
            ));
            builder.push_values(chunk, |mut b, m| {
                b.push_bind(&m.metering_point_id)
                    .push_bind(&m.type_of_mp)
                    .push_bind(&m.street_name)
                    .push_bind(&m.building_number)
                    .push_bind(&m.floor_id)
                    .push_bind(&m.room_id)
                    .push_bind(&m.postcode)
                    .push_bind(&m.city_name)
                    .push_bind(m.consumer_start_date);
            });
            builder.build().execute(&mut conn).await?;
        }

        conn.close().await?;
        Ok(())
    }

    /// Drop and recreate the consumption table. Used by full backfills;
    /// per-meter rows are appended afterwards, one commit per meter.
    pub async fn recreate_consumption(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        sqlx::query(&format!(
            "DROP TABLE IF EXISTS {}",
            schema::CONSUMPTION_TABLE
        ))
        .execute(&mut conn)
        .await?;
        sqlx::query(schema::CONSUMPTION_DDL)
            .execute(&mut conn)
            .await?;
        conn.close().await?;
        Ok(())
    }

    /// Append consumption rows. Rows are batched to stay under SQLite's
    /// bind limit; one calendar year of hourly data is ~8760 rows.
    pub async fn append_consumption(&self, rows: &[ConsumptionRecord]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connect().await?;
        Self::ensure_consumption(&mut conn).await?;

        for chunk in rows.chunks(self.batch_size.max(1)) {
            let mut builder = QueryBuilder::<Sqlite>::new(format!(
                "INSERT INTO {} ({}) ",
                schema::CONSUMPTION_TABLE,
                schema::CONSUMPTION_COLUMNS,
            ));
            builder.push_values(chunk, |mut b, r| {
                b.push_bind(&r.meter_id).push_bind(r.ts).push_bind(r.kwh);
            });
            builder.build().execute(&mut conn).await?;
        }

        conn.close().await?;
        Ok(rows.len())
    }

    /// Replace the current-tariffs snapshot wholesale. No history kept.
    pub async fn replace_tariffs(&self, rows: &[TariffRecord]) -> Result<()> {
        let mut conn = self.connect().await?;
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", schema::TARIFFS_TABLE))
            .execute(&mut conn)
            .await?;
        sqlx::query(schema::TARIFFS_DDL).execute(&mut conn).await?;

        for chunk in rows.chunks(self.batch_size.max(1)) {
            let mut builder = QueryBuilder::<Sqlite>::new(format!(
                "INSERT INTO {} ({}) ",
                schema::TARIFFS_TABLE,
                schema::TARIFFS_COLUMNS,
            ));
            builder.push_values(chunk, |mut b, t| {
                b.push_bind(&t.meter_id)
                    .push_bind(&t.name)
                    .push_bind(&t.description)
                    .push_bind(&t.owner)
                    .push_bind(&t.period_type)
                    .push_bind(t.position)
                    .push_bind(t.price);
            });
            builder.build().execute(&mut conn).await?;
        }

        conn.close().await?;
        Ok(())
    }

    /// Latest stored timestamp for a meter — the sync watermark. `None`
    /// means the meter has no data yet (including a brand-new store).
    pub async fn max_timestamp(&self, meter_id: &str) -> Result<Option<OffsetDateTime>> {
        let mut conn = self.connect().await?;
        Self::ensure_consumption(&mut conn).await?;

        let ts = sqlx::query_scalar::<_, OffsetDateTime>(&format!(
            "SELECT date FROM {} WHERE meterid = ? ORDER BY date DESC LIMIT 1",
            schema::CONSUMPTION_TABLE,
        ))
        .bind(meter_id)
        .fetch_optional(&mut conn)
        .await?;

        conn.close().await?;
        Ok(ts)
    }

    /// Meter ids present in the consumption table. Presentation only;
    /// correctness never depends on this.
    pub async fn distinct_meters(&self) -> Result<Vec<String>> {
        let mut conn = self.connect().await?;
        Self::ensure_consumption(&mut conn).await?;

        let ids = sqlx::query_scalar::<_, String>(&format!(
            "SELECT DISTINCT meterid FROM {} ORDER BY meterid",
            schema::CONSUMPTION_TABLE,
        ))
        .fetch_all(&mut conn)
        .await?;

        conn.close().await?;
        Ok(ids)
    }

    /// Years with stored readings, ascending. Presentation only.
    pub async fn distinct_years(&self) -> Result<Vec<String>> {
        let mut conn = self.connect().await?;
        Self::ensure_consumption(&mut conn).await?;

        let years = sqlx::query_scalar::<_, String>(&format!(
            "SELECT DISTINCT substr(date, 1, 4) AS year FROM {} ORDER BY year",
            schema::CONSUMPTION_TABLE,
        ))
        .fetch_all(&mut conn)
        .await?;

        conn.close().await?;
        Ok(years)
    }

    /// Row count for one meter; test and reporting helper.
    pub async fn count_rows(&self, meter_id: &str) -> Result<i64> {
        let mut conn = self.connect().await?;
        Self::ensure_consumption(&mut conn).await?;

        let n = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {} WHERE meterid = ?",
            schema::CONSUMPTION_TABLE,
        ))
        .bind(meter_id)
        .fetch_one(&mut conn)
        .await?;

        conn.close().await?;
        Ok(n)
    }
}
