use analysis_core::{FundamentalMetric, FundamentalsSnapshot, RawFundamentals};

pub mod ratios;

/// How a raw provider number is rendered in the snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    /// `12.34`
    Ratio,
    /// fraction scaled by 100, `3.40%`
    Percent,
    /// `$187.20`
    Price,
}

/// Provider field behind each directly formatted metric. Market cap and
/// average volume have their own rules.
const FIELD_TABLE: &[(FundamentalMetric, &str, Format)] = &[
    (FundamentalMetric::TrailingPe, "trailingPE", Format::Ratio),
    (FundamentalMetric::ForwardPe, "forwardPE", Format::Ratio),
    (FundamentalMetric::PegRatio, "pegRatio", Format::Ratio),
    (FundamentalMetric::PriceToSales, "priceToSalesTrailing12Months", Format::Ratio),
    (FundamentalMetric::PriceToBook, "priceToBook", Format::Ratio),
    (FundamentalMetric::EvToEbitda, "enterpriseToEbitda", Format::Ratio),
    (FundamentalMetric::TrailingEps, "trailingEps", Format::Price),
    (FundamentalMetric::ForwardEps, "forwardEps", Format::Price),
    (FundamentalMetric::DividendYield, "dividendYield", Format::Percent),
    (FundamentalMetric::Beta, "beta", Format::Ratio),
    (FundamentalMetric::FiftyTwoWeekHigh, "fiftyTwoWeekHigh", Format::Price),
    (FundamentalMetric::FiftyTwoWeekLow, "fiftyTwoWeekLow", Format::Price),
    (FundamentalMetric::ProfitMargin, "profitMargins", Format::Percent),
    (FundamentalMetric::ReturnOnEquity, "returnOnEquity", Format::Percent),
];

pub const MARKET_CAP_FIELD: &str = "marketCap";
pub const AVG_VOLUME_10D_FIELD: &str = "averageVolume10days";
pub const AVG_VOLUME_FIELD: &str = "averageVolume";

/// Provider key for a metric, where one exists.
pub fn provider_field(metric: FundamentalMetric) -> Option<&'static str> {
    match metric {
        FundamentalMetric::MarketCap => Some(MARKET_CAP_FIELD),
        FundamentalMetric::AverageVolume => Some(AVG_VOLUME_10D_FIELD),
        _ => FIELD_TABLE
            .iter()
            .find(|(m, _, _)| *m == metric)
            .map(|(_, key, _)| *key),
    }
}

/// Integer rendering with `,` thousands separators.
pub fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value);
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}", sign, grouped)
}

pub fn format_market_cap(value: f64) -> String {
    if value >= 1_000_000_000_000.0 {
        format!("${:.2}T", value / 1_000_000_000_000.0)
    } else if value >= 1_000_000_000.0 {
        format!("${:.2}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("${:.2}M", value / 1_000_000.0)
    } else {
        format!("${}", group_thousands(value))
    }
}

fn format_value(value: f64, format: Format) -> String {
    match format {
        Format::Ratio => format!("{:.2}", value),
        Format::Percent => format!("{:.2}%", value * 100.0),
        Format::Price => format!("${:.2}", value),
    }
}

/// Maps raw provider fundamentals onto the canonical snapshot.
pub struct FundamentalAnalysisEngine;

impl FundamentalAnalysisEngine {
    pub fn new() -> Self {
        Self
    }

    /// Build the snapshot. Missing or non-numeric fields become "N/A"; this
    /// never fails.
    pub fn normalize(&self, raw: &RawFundamentals) -> FundamentalsSnapshot {
        let mut snapshot = FundamentalsSnapshot::empty();

        if let Some(cap) = self.number(raw, MARKET_CAP_FIELD) {
            snapshot.set(FundamentalMetric::MarketCap, format_market_cap(cap));
        }

        for (metric, key, format) in FIELD_TABLE {
            if let Some(value) = self.number(raw, key) {
                snapshot.set(*metric, format_value(value, *format));
            }
        }

        let avg_volume = if raw.contains(AVG_VOLUME_10D_FIELD) {
            self.number(raw, AVG_VOLUME_10D_FIELD)
        } else {
            self.number(raw, AVG_VOLUME_FIELD)
        };
        if let Some(volume) = avg_volume {
            snapshot.set(FundamentalMetric::AverageVolume, group_thousands(volume));
        }

        snapshot
    }

    fn number(&self, raw: &RawFundamentals, key: &str) -> Option<f64> {
        let value = raw.number(key);
        if value.is_none() && raw.contains(key) {
            tracing::debug!("Ignoring non-numeric fundamentals field {}: {:?}", key, raw.0.get(key));
        }
        value
    }

    /// Display name for the ticker: long name, then short name, then the
    /// upper-cased symbol.
    pub fn display_name(&self, raw: &RawFundamentals, symbol: &str) -> String {
        raw.text("longName")
            .or_else(|| raw.text("shortName"))
            .map(str::to_string)
            .unwrap_or_else(|| symbol.to_uppercase())
    }
}

impl Default for FundamentalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
