//! End-to-end engine tests against an in-memory fake of the remote API
//! and a temporary SQLite store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use eloverblik_client::{db, ConsumptionRecord, MeterInfo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sync_service::api::types::{
    ChargesEnvelope, MarketDocument, Period, Point, TimeInterval, TimeSeries, TimeSeriesEnvelope,
    TimeSeriesResult,
};
use sync_service::api::{EnergyDataApi, Granularity};
use sync_service::chunk::{DateRange, DATE_FMT};
use sync_service::error::{Result, SyncError};
use sync_service::store::Store;
use sync_service::sync::{MeterOutcome, SyncEngine};
use time::macros::{date, datetime};
use time::{Date, Duration};

fn meter(id: &str, start: Date) -> MeterInfo {
    MeterInfo {
        metering_point_id: id.to_string(),
        type_of_mp: Some("E17".to_string()),
        street_name: Some("Testvej".to_string()),
        building_number: Some("1".to_string()),
        floor_id: None,
        room_id: None,
        postcode: Some("8000".to_string()),
        city_name: Some("Aarhus".to_string()),
        consumer_start_date: start,
    }
}

/// One period per day with 24 hourly points, matching the offset
/// convention (period end date + position hours).
fn synthetic_series(range: DateRange) -> TimeSeriesEnvelope {
    let mut periods = Vec::new();
    let mut day = range.from;
    while day < range.to {
        let points = (0..24)
            .map(|h| Point {
                position: h.to_string(),
                quantity: format!("{:.2}", 0.25 + h as f64 * 0.01),
                quality: Some("A04".to_string()),
            })
            .collect();
        periods.push(Period {
            time_interval: TimeInterval {
                start: (day - Duration::days(1)).format(DATE_FMT).unwrap(),
                end: day.format(DATE_FMT).unwrap(),
            },
            points,
        });
        day += Duration::days(1);
    }

    TimeSeriesEnvelope {
        result: vec![TimeSeriesResult {
            document: Some(MarketDocument {
                time_series: vec![TimeSeries { periods }],
            }),
        }],
    }
}

fn charges_fixture() -> ChargesEnvelope {
    serde_json::from_str(
        r#"{
            "result": [{
                "result": {
                    "tariffs": [{
                        "name": "Nettarif C",
                        "owner": "N1 A/S",
                        "periodType": "PT1H",
                        "prices": [
                            { "position": "1", "price": 0.3003 },
                            { "position": "2", "price": 0.1501 }
                        ]
                    }]
                }
            }]
        }"#,
    )
    .unwrap()
}

struct FakeApi {
    meters: Vec<MeterInfo>,
    failing: HashSet<String>,
    consumption_requests: Mutex<Vec<(String, DateRange)>>,
}

impl FakeApi {
    fn new(meters: Vec<MeterInfo>) -> Self {
        Self {
            meters,
            failing: HashSet::new(),
            consumption_requests: Mutex::new(Vec::new()),
        }
    }

    fn failing_for(mut self, meter_id: &str) -> Self {
        self.failing.insert(meter_id.to_string());
        self
    }

    fn requests(&self) -> Vec<(String, DateRange)> {
        self.consumption_requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl EnergyDataApi for FakeApi {
    async fn list_metering_points(&self) -> Result<Vec<MeterInfo>> {
        Ok(self.meters.clone())
    }

    async fn get_charges(&self, _meter_id: &str) -> Result<ChargesEnvelope> {
        Ok(charges_fixture())
    }

    async fn get_consumption(
        &self,
        meter_id: &str,
        range: DateRange,
        _granularity: Granularity,
    ) -> Result<TimeSeriesEnvelope> {
        self.consumption_requests
            .lock()
            .unwrap()
            .push((meter_id.to_string(), range));

        if self.failing.contains(meter_id) {
            return Err(SyncError::Remote {
                status: 503,
                body: "simulated outage".to_string(),
            });
        }
        Ok(synthetic_series(range))
    }
}

fn temp_store(dir: &tempfile::TempDir) -> Store {
    Store::new(dir.path().join("eldata.db"), 500)
}

#[tokio::test]
async fn backfill_commits_and_second_update_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::new(vec![meter("571313", date!(2023 - 01 - 05))]));
    let today = date!(2023 - 01 - 10);

    let engine = SyncEngine::with_today(api.clone(), temp_store(&dir), today);
    let report = engine.backfill().await.unwrap();

    assert_eq!(report.meters.len(), 1);
    assert!(matches!(
        report.meters[0].outcome,
        MeterOutcome::Synced { rows: 120 }
    ));
    assert_eq!(engine.store().count_rows("571313").await.unwrap(), 120);
    assert_eq!(report.tariff_rows, 2);

    // Second pass with no new remote data: the no-op path triggers and
    // no consumption fetch is issued.
    let requests_before = api.requests().len();
    let update_report = engine.update().await.unwrap();
    assert!(matches!(
        update_report.meters[0].outcome,
        MeterOutcome::Skipped
    ));
    assert_eq!(engine.store().count_rows("571313").await.unwrap(), 120);
    assert_eq!(api.requests().len(), requests_before);
}

#[tokio::test]
async fn multi_year_backfill_is_contiguous_across_chunk_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::new(vec![meter("571313", date!(2021 - 11 - 28))]));
    let today = date!(2024 - 01 - 03);

    let engine = SyncEngine::with_today(api.clone(), temp_store(&dir), today);
    let report = engine.backfill().await.unwrap();
    let expected_days = (today - date!(2021 - 11 - 28)).whole_days() as usize;
    assert_eq!(report.total_rows(), expected_days * 24);

    // Four chronological chunks: 2021, 2022, 2023, and the 2024 stub.
    let requests = api.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests.windows(2).all(|w| w[0].1.to == w[1].1.from));

    // Every consecutive stored timestamp is exactly one hour apart,
    // including across the year boundaries.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(SqliteConnectOptions::new().filename(dir.path().join("eldata.db")))
        .await
        .unwrap();
    let rows: Vec<ConsumptionRecord> = db::load_profile(
        &pool,
        "571313",
        datetime!(2021-11-28 00:00:00 UTC),
        datetime!(2024-01-03 00:00:00 UTC),
    )
    .await
    .unwrap();

    assert_eq!(rows.len(), expected_days * 24);
    assert_eq!(rows[0].ts, datetime!(2021-11-28 00:00:00 UTC));
    assert_eq!(rows.last().unwrap().ts, datetime!(2024-01-02 23:00:00 UTC));
    assert!(rows
        .windows(2)
        .all(|w| w[1].ts - w[0].ts == Duration::hours(1)));
}

#[tokio::test]
async fn update_resumes_from_the_day_after_the_watermark() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    // Seed readings up to 2024-06-10T23:00 directly.
    let seeded: Vec<ConsumptionRecord> = (0..24)
        .map(|h| ConsumptionRecord {
            meter_id: "571313".to_string(),
            ts: datetime!(2024-06-10 00:00:00 UTC) + Duration::hours(h),
            kwh: 1.0,
        })
        .collect();
    store.append_consumption(&seeded).await.unwrap();

    let api = Arc::new(FakeApi::new(vec![meter("571313", date!(2019 - 01 - 01))]));
    let engine = SyncEngine::with_today(api.clone(), store, date!(2024 - 06 - 20));
    let report = engine.update().await.unwrap();

    assert!(matches!(
        report.meters[0].outcome,
        MeterOutcome::Synced { rows: 216 }
    ));

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1.from, date!(2024 - 06 - 11));
    assert_eq!(requests[0].1.to, date!(2024 - 06 - 20));

    let wm = engine.store().max_timestamp("571313").await.unwrap();
    assert_eq!(wm, Some(datetime!(2024-06-19 23:00:00 UTC)));
}

#[tokio::test]
async fn empty_store_update_bootstraps_from_clamped_service_start() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    assert_eq!(store.max_timestamp("571313").await.unwrap(), None);

    // Service start predates the API's earliest supported date.
    let api = Arc::new(FakeApi::new(vec![meter("571313", date!(2017 - 03 - 01))]));
    let engine = SyncEngine::with_today(api.clone(), store, date!(2019 - 01 - 03));
    let report = engine.update().await.unwrap();

    assert!(matches!(
        report.meters[0].outcome,
        MeterOutcome::Synced { rows: 48 }
    ));
    let requests = api.requests();
    assert_eq!(requests[0].1.from, date!(2019 - 01 - 01));
}

#[tokio::test]
async fn one_failing_meter_does_not_disturb_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(
        FakeApi::new(vec![
            meter("aaa111", date!(2023 - 01 - 05)),
            meter("bbb222", date!(2023 - 01 - 05)),
        ])
        .failing_for("bbb222"),
    );

    let engine = SyncEngine::with_today(api, temp_store(&dir), date!(2023 - 01 - 10));
    let report = engine.backfill().await.unwrap();

    assert!(report.has_failures());
    assert!(matches!(
        report.meters[0].outcome,
        MeterOutcome::Synced { rows: 120 }
    ));
    assert!(matches!(
        report.meters[1].outcome,
        MeterOutcome::Failed(SyncError::Remote { status: 503, .. })
    ));

    // Meter A committed; meter B left with no partial rows.
    assert_eq!(engine.store().count_rows("aaa111").await.unwrap(), 120);
    assert_eq!(engine.store().count_rows("bbb222").await.unwrap(), 0);
}

#[tokio::test]
async fn update_on_stale_meter_appends_only_new_rows() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::new(vec![meter("571313", date!(2023 - 01 - 05))]));

    let engine = SyncEngine::with_today(api.clone(), temp_store(&dir), date!(2023 - 01 - 10));
    engine.backfill().await.unwrap();
    assert_eq!(engine.store().count_rows("571313").await.unwrap(), 120);

    // Days pass; the same store is updated with a later "today".
    let engine = SyncEngine::with_today(
        api.clone(),
        Store::new(dir.path().join("eldata.db"), 500),
        date!(2023 - 01 - 14),
    );
    let report = engine.update().await.unwrap();
    assert!(matches!(
        report.meters[0].outcome,
        MeterOutcome::Synced { rows: 96 }
    ));
    assert_eq!(engine.store().count_rows("571313").await.unwrap(), 216);
}
