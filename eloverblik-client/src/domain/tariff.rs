/// One flattened (tariff, price position) row for a metering point.
///
/// Snapshot of the *current* charges only; the table is replaced
/// wholesale on every sync and no history is kept.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TariffRecord {
    #[sqlx(rename = "meterid")]
    pub meter_id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    #[sqlx(rename = "periodType")]
    pub period_type: Option<String>,
    /// 1-based position within the tariff's price list (e.g. hour of
    /// day for time-of-use tariffs).
    pub position: i64,
    pub price: f64,
}
