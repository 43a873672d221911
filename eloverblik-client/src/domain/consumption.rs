use time::OffsetDateTime;

/// One hourly consumption reading for one metering point.
///
/// `(meter_id, ts)` is the composite key; rows are append-only and
/// hour-aligned (minutes and seconds are always zero).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConsumptionRecord {
    #[sqlx(rename = "meterid")]
    pub meter_id: String,
    #[sqlx(rename = "date")]
    pub ts: OffsetDateTime,
    pub kwh: f64,
}
