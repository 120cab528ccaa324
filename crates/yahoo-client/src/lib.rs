//! Yahoo Finance chart client
//!
//! Serves daily bars for exchange-suffixed symbols (`CBA.AX`, `VOD.L`) that
//! Polygon does not list, plus the few fundamentals the chart metadata carries.

use analysis_core::{
    AnalysisError, Bar, FundamentalsProvider, PriceHistoryProvider, PriceSeries, RawFundamentals,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use fundamental_analysis::ratios;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SHORT_VOLUME_WINDOW: usize = 10;
const LONG_VOLUME_WINDOW: usize = 63;
/// Window fetched when only the chart metadata is needed.
const META_LOOKBACK_DAYS: i64 = 5;

/// Yahoo exchange suffixes for markets outside the US.
pub const EXCHANGE_SUFFIXES: &[&str] = &[
    "AX", "NZ", "L", "TO", "V", "NE", "HK", "T", "SI", "KS", "KQ", "TW", "SS", "SZ", "NS", "BO",
    "DE", "F", "PA", "AS", "BR", "SW", "MI", "MC", "LS", "ST", "OL", "CO", "HE", "IR", "VI",
    "SA", "MX", "JO",
];

/// Whether `symbol` carries a non-US exchange suffix, e.g. `BHP.AX`.
/// US share classes such as `BRK.B` do not match.
pub fn is_international(symbol: &str) -> bool {
    match symbol.trim().rsplit_once('.') {
        Some((base, suffix)) if !base.is_empty() => {
            let suffix = suffix.to_ascii_uppercase();
            EXCHANGE_SUFFIXES.contains(&suffix.as_str())
        }
        _ => false,
    }
}

// Response structures
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

/// Quote metadata returned alongside the bars.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub symbol: String,
    pub currency: Option<String>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub regular_market_price: Option<f64>,
}

/// Daily bars (oldest first) and metadata for one symbol.
#[derive(Debug, Clone, Default)]
pub struct Chart {
    pub meta: ChartMeta,
    pub bars: Vec<Bar>,
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten().filter(|v| v.is_finite())
}

/// `Ok(None)` when Yahoo does not know the symbol. Rows without a close are
/// skipped; missing open/high/low fall back to the close.
fn into_chart(response: ChartResponse) -> Result<Option<Chart>, AnalysisError> {
    if let Some(err) = response.chart.error {
        if err.code == "Not Found" {
            return Ok(None);
        }
        return Err(AnalysisError::ApiError(format!(
            "Yahoo chart error {}: {}",
            err.code, err.description
        )));
    }

    let Some(data) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(None);
    };
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

    let bars = data
        .timestamp
        .unwrap_or_default()
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = value_at(&quote.close, i)?;
            Some(Bar {
                timestamp: DateTime::from_timestamp(ts, 0)?,
                open: value_at(&quote.open, i).unwrap_or(close),
                high: value_at(&quote.high, i).unwrap_or(close),
                low: value_at(&quote.low, i).unwrap_or(close),
                close,
                volume: value_at(&quote.volume, i).unwrap_or(0.0),
            })
        })
        .collect();

    Ok(Some(Chart { meta: data.meta, bars }))
}

/// Raw fundamentals available from the chart: names, 52-week range (from the
/// metadata, else from `bars`) and average volumes.
pub fn chart_fundamentals(meta: &ChartMeta, bars: &[Bar]) -> RawFundamentals {
    let mut raw = RawFundamentals::new();

    for (key, name) in [("longName", &meta.long_name), ("shortName", &meta.short_name)] {
        if let Some(name) = name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            raw.insert(key, name.to_string());
        }
    }

    let history_high = bars.iter().map(|b| b.high).reduce(f64::max);
    let history_low = bars.iter().map(|b| b.low).reduce(f64::min);
    raw.insert_opt("fiftyTwoWeekHigh", meta.fifty_two_week_high.or(history_high));
    raw.insert_opt("fiftyTwoWeekLow", meta.fifty_two_week_low.or(history_low));

    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    raw.insert_opt("averageVolume10days", ratios::trailing_average(&volumes, SHORT_VOLUME_WINDOW));
    raw.insert_opt("averageVolume", ratios::trailing_average(&volumes, LONG_VOLUME_WINDOW));

    raw
}

/// Client for the public Yahoo Finance chart endpoint.
pub struct YahooClient {
    client: Client,
    base_url: String,
    /// Metadata from the last history fetch per symbol, consumed by
    /// `fundamentals` so a dashboard needs one chart request.
    recent_meta: Mutex<HashMap<String, ChartMeta>>,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: BASE_URL.to_string(),
            recent_meta: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Daily chart between `from` and `to`.
    pub async fn get_chart(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Chart>, AnalysisError> {
        let url = format!("{}/{}", self.base_url, symbol);

        let response = self
            .client
            .get(&url)
            .header(header::USER_AGENT, USER_AGENT)
            .query(&[
                ("period1", from.timestamp().to_string()),
                ("period2", to.timestamp().to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AnalysisError::ApiError(format!(
                "Yahoo chart HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(format!("Yahoo chart: {}", e)))?;
        into_chart(body)
    }
}

#[async_trait]
impl PriceHistoryProvider for YahooClient {
    async fn daily_history(&self, symbol: &str, lookback_days: i64) -> Result<Option<PriceSeries>, AnalysisError> {
        let to = Utc::now();
        let from = to - ChronoDuration::days(lookback_days.max(1));

        let Some(chart) = self.get_chart(symbol, from, to).await? else {
            tracing::info!("Yahoo has no chart for {}", symbol);
            return Ok(None);
        };

        self.recent_meta
            .lock()
            .await
            .insert(symbol.to_string(), chart.meta);

        if chart.bars.is_empty() {
            return Ok(None);
        }
        Ok(Some(PriceSeries::new(chart.bars)))
    }
}

#[async_trait]
impl FundamentalsProvider for YahooClient {
    async fn fundamentals(&self, symbol: &str, history: &PriceSeries) -> Result<RawFundamentals, AnalysisError> {
        let cached = self.recent_meta.lock().await.remove(symbol);
        let meta = match cached {
            Some(meta) => meta,
            None => {
                let to = Utc::now();
                let from = to - ChronoDuration::days(META_LOOKBACK_DAYS);
                self.get_chart(symbol, from, to)
                    .await?
                    .map(|chart| chart.meta)
                    .unwrap_or_default()
            }
        };

        Ok(chart_fundamentals(&meta, history.bars()))
    }
}
