use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Daily bars for one symbol, ordered oldest to newest.
///
/// The series is read-only once built: calculators borrow it and copy the
/// closes they need, so one fetched series can feed every indicator of a
/// single request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    /// Convenience constructor for close-only data (one bar per trading day).
    pub fn from_closes(closes: &[f64]) -> Self {
        let start = DateTime::<Utc>::default();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
            })
            .collect();
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Close of the bar before the latest one; falls back to the latest close
    /// for single-bar series.
    pub fn previous_close(&self) -> Option<f64> {
        match self.bars.len() {
            0 => None,
            1 => Some(self.bars[0].close),
            n => Some(self.bars[n - 2].close),
        }
    }
}

/// Discrete signal emitted by an indicator calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKey {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
    NoData,
    Error,
}

impl SignalKey {
    /// Integer score used by the aggregator. `None` for signals that do not
    /// take part in aggregation.
    pub fn base_score(&self) -> Option<i32> {
        match self {
            SignalKey::StrongBuy => Some(2),
            SignalKey::Buy => Some(1),
            SignalKey::Neutral => Some(0),
            SignalKey::Sell => Some(-1),
            SignalKey::StrongSell => Some(-2),
            SignalKey::NoData | SignalKey::Error => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKey::StrongBuy => "STRONG_BUY",
            SignalKey::Buy => "BUY",
            SignalKey::Neutral => "NEUTRAL",
            SignalKey::Sell => "SELL",
            SignalKey::StrongSell => "STRONG_SELL",
            SignalKey::NoData => "NO_DATA",
            SignalKey::Error => "ERROR",
        }
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which calculator produced a result. Aggregation weights and confluence
/// rules dispatch on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Sma,
    Rsi,
    Macd,
    /// Externally supplied indicator with no dedicated weight
    Other,
}

impl IndicatorKind {
    pub fn weight(&self) -> f64 {
        match self {
            IndicatorKind::Sma => 1.5,
            IndicatorKind::Macd => 1.2,
            IndicatorKind::Rsi => 1.0,
            IndicatorKind::Other => 1.0,
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            IndicatorKind::Sma => "SMA",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::Other => "OTHER",
        }
    }
}

/// Supporting detail for an indicator result: labelled numeric strings, or a
/// single diagnostic when the calculator could not produce values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorDetails {
    Values(BTreeMap<String, String>),
    Message(String),
}

impl IndicatorDetails {
    pub fn value(&self, label: &str) -> Option<&str> {
        match self {
            IndicatorDetails::Values(map) => map.get(label).map(String::as_str),
            IndicatorDetails::Message(_) => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            IndicatorDetails::Message(msg) => Some(msg),
            IndicatorDetails::Values(_) => None,
        }
    }
}

/// Output of one indicator calculator invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorResult {
    pub kind: IndicatorKind,
    pub name: String,
    pub signal_key: SignalKey,
    pub signal_text: String,
    pub details: IndicatorDetails,
    pub explanation: String,
}

/// Final recommendation label derived from the aggregate score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecommendationTier {
    StrongBuy,
    Buy,
    LeaningBuy,
    NeutralMixed,
    LeaningSell,
    Sell,
    StrongSell,
    NotEnoughData,
}

impl RecommendationTier {
    pub fn label(&self) -> &'static str {
        match self {
            RecommendationTier::StrongBuy => "Strong Buy Candidate",
            RecommendationTier::Buy => "Buy Candidate",
            RecommendationTier::LeaningBuy => "Leaning Towards Buy",
            RecommendationTier::NeutralMixed => "Neutral / Hold - Mixed Signals",
            RecommendationTier::LeaningSell => "Leaning Towards Sell",
            RecommendationTier::Sell => "Sell Candidate",
            RecommendationTier::StrongSell => "Strong Sell Candidate",
            RecommendationTier::NotEnoughData => "Not Enough Data for Recommendation",
        }
    }
}

impl fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for RecommendationTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Headline as returned by a news provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub url: String,
}

impl NewsItem {
    /// Placeholder entry used when no real headlines can be shown.
    pub fn placeholder(title: impl Into<String>, source: &str) -> Self {
        Self {
            title: title.into(),
            source: source.to_string(),
            url: "#".to_string(),
        }
    }
}

/// Coarse sentiment bucket for a scored headline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn from_score(score: f64) -> Self {
        if score > 0.05 {
            SentimentLabel::Positive
        } else if score < -0.05 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// News headline annotated with its sentiment score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub source: String,
    pub url: String,
    pub sentiment: f64,
    pub sentiment_label: SentimentLabel,
}
