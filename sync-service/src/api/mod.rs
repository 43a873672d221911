pub mod types;

use std::time::Duration;

use eloverblik_client::MeterInfo;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;

use crate::auth::TokenProvider;
use crate::chunk::{DateRange, DATE_FMT};
use crate::error::{Result, SyncError};

pub use types::{ChargesEnvelope, TimeSeriesEnvelope};

/// Time resolution requested from the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    #[default]
    Hour,
    Day,
    Month,
    Year,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Hour => "Hour",
            Granularity::Day => "Day",
            Granularity::Month => "Month",
            Granularity::Year => "Year",
        }
    }
}

/// The three remote operations the sync engine needs. Implemented by the
/// real HTTP client below and by in-memory fakes in tests.
///
/// No retry happens at this layer; retry policy, such as it is, lives in
/// the sync engine.
#[async_trait::async_trait]
pub trait EnergyDataApi: Send + Sync {
    /// All metering points on the account. The first element is the
    /// default when a caller has no explicit meter selection.
    async fn list_metering_points(&self) -> Result<Vec<MeterInfo>>;

    /// Current tariff/charge structure for one meter.
    async fn get_charges(&self, meter_id: &str) -> Result<ChargesEnvelope>;

    /// One contiguous time-series range. Callers must keep ranges within
    /// a single calendar year; see `chunk::plan_chunks`.
    async fn get_consumption(
        &self,
        meter_id: &str,
        range: DateRange,
        granularity: Granularity,
    ) -> Result<TimeSeriesEnvelope>;
}

/// reqwest-backed client for the eloverblik customer API.
pub struct EloverblikClient {
    base_url: String,
    http: reqwest::Client,
    tokens: TokenProvider,
}

impl EloverblikClient {
    pub fn new(base_url: String, timeout: Duration, tokens: TokenProvider) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            http,
            tokens,
        })
    }

    fn meter_body(meter_id: &str) -> serde_json::Value {
        json!({ "meteringPoints": { "meteringPoint": [meter_id] } })
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        tracing::error!(status, body = %body, "remote API returned an error");
        Err(SyncError::Remote { status, body })
    }
}

#[async_trait::async_trait]
impl EnergyDataApi for EloverblikClient {
    async fn list_metering_points(&self) -> Result<Vec<MeterInfo>> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/api/meteringpoints/meteringpoints", self.base_url);

        let resp = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let resp = Self::check(resp).await?;

        let envelope: types::MeteringPointsEnvelope = resp.json().await?;
        envelope
            .result
            .into_iter()
            .map(types::MeteringPointDto::into_meter_info)
            .collect()
    }

    async fn get_charges(&self, meter_id: &str) -> Result<ChargesEnvelope> {
        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/api/meteringpoints/meteringpoint/getcharges",
            self.base_url
        );

        let resp = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&Self::meter_body(meter_id))
            .send()
            .await?;
        let resp = Self::check(resp).await?;

        Ok(resp.json().await?)
    }

    async fn get_consumption(
        &self,
        meter_id: &str,
        range: DateRange,
        granularity: Granularity,
    ) -> Result<TimeSeriesEnvelope> {
        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/api/meterdata/gettimeseries/{}/{}/{}",
            self.base_url,
            range.from.format(DATE_FMT)?,
            range.to.format(DATE_FMT)?,
            granularity.as_str(),
        );

        tracing::debug!(meter_id, %url, "fetching time series chunk");
        let resp = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&Self::meter_body(meter_id))
            .send()
            .await?;
        let resp = Self::check(resp).await?;

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granularity_matches_api_path_segments() {
        assert_eq!(Granularity::default().as_str(), "Hour");
        assert_eq!(Granularity::Day.as_str(), "Day");
    }

    #[test]
    fn meter_body_wraps_the_id_in_the_documented_envelope() {
        let body = EloverblikClient::meter_body("571313");
        assert_eq!(
            body.to_string(),
            r#"{"meteringPoints":{"meteringPoint":["571313"]}}"#
        );
    }
}
