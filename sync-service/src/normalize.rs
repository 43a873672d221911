//! Converts a raw time-series envelope into a canonical ordered
//! sequence of hour-aligned `(timestamp, kWh)` points.

use eloverblik_client::TariffRecord;
use time::{Duration, OffsetDateTime};

use crate::api::types::{ChargesEnvelope, Period, Point, TimeSeriesEnvelope};
use crate::error::{Result, SyncError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    pub ts: OffsetDateTime,
    pub kwh: f64,
}

/// Extract all points from the envelope, reconstruct absolute
/// timestamps as `date(timeInterval.end) + position hours`, and return
/// them in ascending timestamp order.
///
/// Quality flags are dropped without filtering. Fails with
/// `MalformedPayload` when the nested document is absent or a point
/// cannot be resolved.
pub fn normalize(envelope: &TimeSeriesEnvelope) -> Result<Vec<NormalizedPoint>> {
    let document = envelope
        .result
        .first()
        .and_then(|r| r.document.as_ref())
        .ok_or_else(|| {
            SyncError::MalformedPayload("response carries no MyEnergyData_MarketDocument".into())
        })?;

    if document.time_series.is_empty() {
        return Err(SyncError::MalformedPayload(
            "market document carries no TimeSeries".into(),
        ));
    }

    let mut points = Vec::new();
    for series in &document.time_series {
        for period in &series.periods {
            normalize_period(period, &mut points)?;
        }
    }

    points.sort_by_key(|p| p.ts);
    Ok(points)
}

fn normalize_period(period: &Period, out: &mut Vec<NormalizedPoint>) -> Result<()> {
    let base = crate::api::types::parse_payload_date(&period.time_interval.end)?
        .midnight()
        .assume_utc();

    for point in &period.points {
        let offset = parse_offset(point)?;
        let kwh = parse_quantity(point)?;
        out.push(NormalizedPoint {
            ts: base + Duration::hours(offset),
            kwh,
        });
    }
    Ok(())
}

fn parse_offset(point: &Point) -> Result<i64> {
    point.position.trim().parse::<i64>().map_err(|_| {
        tracing::error!(point = ?point, "point lacks a resolvable hour offset");
        SyncError::MalformedPayload(format!("unparseable point position {:?}", point.position))
    })
}

fn parse_quantity(point: &Point) -> Result<f64> {
    point.quantity.trim().parse::<f64>().map_err(|_| {
        tracing::error!(point = ?point, "point lacks a parseable quantity");
        SyncError::MalformedPayload(format!("unparseable point quantity {:?}", point.quantity))
    })
}

/// Sanity window applied before commit; timestamps outside it indicate a
/// corrupt payload rather than real consumption data.
pub fn validate_points(points: &[NormalizedPoint]) -> Result<()> {
    use time::macros::datetime;

    let min_ts = datetime!(2000-01-01 00:00:00 UTC);
    let max_ts = datetime!(2100-01-01 00:00:00 UTC);

    for p in points {
        if p.kwh < 0.0 {
            return Err(SyncError::MalformedPayload(format!(
                "negative kWh {} at {}",
                p.kwh, p.ts
            )));
        }
        if p.ts < min_ts || p.ts > max_ts {
            return Err(SyncError::MalformedPayload(format!(
                "timestamp {} outside the allowed range",
                p.ts
            )));
        }
    }
    Ok(())
}

/// Flatten a charges payload into one row per (tariff, price position),
/// tagged with the meter id.
pub fn flatten_tariffs(meter_id: &str, envelope: &ChargesEnvelope) -> Result<Vec<TariffRecord>> {
    let body = envelope
        .result
        .first()
        .and_then(|r| r.result.as_ref())
        .ok_or_else(|| {
            SyncError::MalformedPayload("charges response carries no result body".into())
        })?;

    let mut rows = Vec::new();
    for tariff in &body.tariffs {
        for price in &tariff.prices {
            let position = price.position.trim().parse::<i64>().map_err(|_| {
                SyncError::MalformedPayload(format!(
                    "unparseable tariff position {:?}",
                    price.position
                ))
            })?;
            rows.push(TariffRecord {
                meter_id: meter_id.to_string(),
                name: tariff.name.clone(),
                description: tariff.description.clone(),
                owner: tariff.owner.clone(),
                period_type: tariff.period_type.clone(),
                position,
                price: price.price,
            });
        }
    }
    Ok(rows)
}
