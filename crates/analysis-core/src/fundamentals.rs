use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::ParseError;

/// Sentinel shown for any fundamental that could not be sourced
pub const NOT_AVAILABLE: &str = "N/A";

/// The canonical fundamentals shown alongside the technical signals.
///
/// Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FundamentalMetric {
    MarketCap,
    TrailingPe,
    ForwardPe,
    PegRatio,
    PriceToSales,
    PriceToBook,
    EvToEbitda,
    TrailingEps,
    ForwardEps,
    DividendYield,
    Beta,
    FiftyTwoWeekHigh,
    FiftyTwoWeekLow,
    AverageVolume,
    ProfitMargin,
    ReturnOnEquity,
}

impl FundamentalMetric {
    pub const ALL: [FundamentalMetric; 16] = [
        FundamentalMetric::MarketCap,
        FundamentalMetric::TrailingPe,
        FundamentalMetric::ForwardPe,
        FundamentalMetric::PegRatio,
        FundamentalMetric::PriceToSales,
        FundamentalMetric::PriceToBook,
        FundamentalMetric::EvToEbitda,
        FundamentalMetric::TrailingEps,
        FundamentalMetric::ForwardEps,
        FundamentalMetric::DividendYield,
        FundamentalMetric::Beta,
        FundamentalMetric::FiftyTwoWeekHigh,
        FundamentalMetric::FiftyTwoWeekLow,
        FundamentalMetric::AverageVolume,
        FundamentalMetric::ProfitMargin,
        FundamentalMetric::ReturnOnEquity,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FundamentalMetric::MarketCap => "Market Cap",
            FundamentalMetric::TrailingPe => "Trailing P/E",
            FundamentalMetric::ForwardPe => "Forward P/E",
            FundamentalMetric::PegRatio => "PEG Ratio",
            FundamentalMetric::PriceToSales => "Price to Sales (TTM)",
            FundamentalMetric::PriceToBook => "Price to Book",
            FundamentalMetric::EvToEbitda => "Enterprise Value to EBITDA",
            FundamentalMetric::TrailingEps => "Trailing EPS",
            FundamentalMetric::ForwardEps => "Forward EPS",
            FundamentalMetric::DividendYield => "Dividend Yield",
            FundamentalMetric::Beta => "Beta",
            FundamentalMetric::FiftyTwoWeekHigh => "52 Week High",
            FundamentalMetric::FiftyTwoWeekLow => "52 Week Low",
            FundamentalMetric::AverageVolume => "Average Volume (10 day)",
            FundamentalMetric::ProfitMargin => "Profit Margins",
            FundamentalMetric::ReturnOnEquity => "Return on Equity (ROE)",
        }
    }
}

/// Human-readable fundamentals for one ticker. Every metric is always
/// present, either as a formatted value or as [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalsSnapshot {
    values: BTreeMap<FundamentalMetric, String>,
}

impl Default for FundamentalsSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl FundamentalsSnapshot {
    /// Snapshot with every metric set to "N/A".
    pub fn empty() -> Self {
        let values = FundamentalMetric::ALL
            .iter()
            .map(|m| (*m, NOT_AVAILABLE.to_string()))
            .collect();
        Self { values }
    }

    pub fn with(mut self, metric: FundamentalMetric, value: impl Into<String>) -> Self {
        self.set(metric, value);
        self
    }

    pub fn set(&mut self, metric: FundamentalMetric, value: impl Into<String>) {
        self.values.insert(metric, value.into());
    }

    pub fn get(&self, metric: FundamentalMetric) -> &str {
        self.values
            .get(&metric)
            .map(String::as_str)
            .unwrap_or(NOT_AVAILABLE)
    }

    /// Read a plain numeric value (ratios such as P/E or PEG) back out of the
    /// snapshot.
    pub fn parse_number(&self, metric: FundamentalMetric) -> Result<f64, ParseError> {
        let raw = self.get(metric).trim();
        if raw == NOT_AVAILABLE {
            return Err(ParseError::NotAvailable);
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(ParseError::Invalid(raw.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FundamentalMetric, &str)> {
        self.values.iter().map(|(m, v)| (*m, v.as_str()))
    }
}

impl Serialize for FundamentalsSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (metric, value) in &self.values {
            map.serialize_entry(metric.label(), value)?;
        }
        map.end()
    }
}

/// Flat fundamentals payload as delivered by a provider. Any field may be
/// missing or hold a non-numeric value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFundamentals(pub Map<String, Value>);

impl RawFundamentals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Insert only when a value is present.
    pub fn insert_opt(&mut self, key: &str, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.0.insert(key.to_string(), Value::from(v));
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Finite JSON number stored under `key`. Strings, booleans and nulls
    /// are treated as absent.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key) {
            Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl From<Value> for RawFundamentals {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => RawFundamentals(map),
            _ => RawFundamentals::default(),
        }
    }
}
