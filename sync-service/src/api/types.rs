//! Wire types for the eloverblik customer API.
//!
//! Field names follow the remote JSON exactly (camelCase, dotted
//! `out_Quantity.*` keys); quantities and positions arrive as strings
//! and are parsed during normalization.

use eloverblik_client::MeterInfo;
use serde::Deserialize;
use time::Date;

use crate::chunk::DATE_FMT;
use crate::error::{Result, SyncError};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeteringPointDto {
    pub metering_point_id: String,
    #[serde(default)]
    pub type_of_mp: Option<String>,
    #[serde(default)]
    pub street_name: Option<String>,
    #[serde(default)]
    pub building_number: Option<String>,
    #[serde(default)]
    pub floor_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub city_name: Option<String>,
    /// `2019-05-01T22:00:00.000Z`-style; only the date part matters.
    pub consumer_start_date: String,
}

impl MeteringPointDto {
    pub fn into_meter_info(self) -> Result<MeterInfo> {
        let consumer_start_date = parse_payload_date(&self.consumer_start_date)?;
        Ok(MeterInfo {
            metering_point_id: self.metering_point_id,
            type_of_mp: self.type_of_mp,
            street_name: self.street_name,
            building_number: self.building_number,
            floor_id: self.floor_id,
            room_id: self.room_id,
            postcode: self.postcode,
            city_name: self.city_name,
            consumer_start_date,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeteringPointsEnvelope {
    #[serde(default)]
    pub result: Vec<MeteringPointDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeriesEnvelope {
    #[serde(default)]
    pub result: Vec<TimeSeriesResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeriesResult {
    #[serde(rename = "MyEnergyData_MarketDocument")]
    pub document: Option<MarketDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketDocument {
    #[serde(rename = "TimeSeries", default)]
    pub time_series: Vec<TimeSeries>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeries {
    #[serde(rename = "Period", default)]
    pub periods: Vec<Period>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Period {
    #[serde(rename = "timeInterval")]
    pub time_interval: TimeInterval,
    #[serde(rename = "Point", default)]
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeInterval {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Point {
    /// 0-based hour offset within the period, as a string.
    pub position: String,
    #[serde(rename = "out_Quantity.quantity")]
    pub quantity: String,
    /// Quality flag, carried but never filtered on.
    #[serde(rename = "out_Quantity.quality", default)]
    pub quality: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChargesEnvelope {
    #[serde(default)]
    pub result: Vec<ChargesResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChargesResult {
    pub result: Option<ChargesBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChargesBody {
    #[serde(default)]
    pub tariffs: Vec<TariffDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffDto {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub period_type: Option<String>,
    #[serde(default)]
    pub prices: Vec<TariffPriceDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TariffPriceDto {
    pub position: String,
    pub price: f64,
}

/// Parse the date part of a payload timestamp such as
/// `2023-02-01T23:00:00.000Z` or a bare `2023-02-01`.
pub fn parse_payload_date(s: &str) -> Result<Date> {
    let date_part = s.get(..10).ok_or_else(|| {
        SyncError::MalformedPayload(format!("timestamp too short to hold a date: {s:?}"))
    })?;
    Date::parse(date_part, DATE_FMT)
        .map_err(|e| SyncError::MalformedPayload(format!("unparseable date {date_part:?}: {e}")))
}
