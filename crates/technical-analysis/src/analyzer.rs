use analysis_core::{
    AnalysisError, IndicatorDetails, IndicatorKind, IndicatorResult, PriceSeries, SignalKey,
};
use std::collections::BTreeMap;

use crate::indicators::*;

const SMA_NAME: &str = "Simple Moving Averages (SMA)";
const RSI_NAME: &str = "Relative Strength Index (RSI)";
const MACD_NAME: &str = "MACD (Moving Average Convergence Divergence)";

/// SMA crossover windows
#[derive(Debug, Clone, Copy)]
pub struct SmaConfig {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for SmaConfig {
    fn default() -> Self {
        Self { short_window: 20, long_window: 50 }
    }
}

/// RSI window and classification thresholds
#[derive(Debug, Clone, Copy)]
pub struct RsiConfig {
    pub window: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self { window: 14, oversold: 30.0, overbought: 70.0 }
    }
}

/// MACD fast/slow/signal windows
#[derive(Debug, Clone, Copy)]
pub struct MacdConfig {
    pub fast_window: usize,
    pub slow_window: usize,
    pub signal_window: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self { fast_window: 12, slow_window: 26, signal_window: 9 }
    }
}

/// Signal classification produced by a successful calculation
struct Classification {
    signal_key: SignalKey,
    signal_text: &'static str,
    details: BTreeMap<String, String>,
}

fn fmt2(v: f64) -> String {
    format!("{:.2}", v)
}

/// Copy the closes out of the series, rejecting values no indicator can use.
fn checked_closes(series: &PriceSeries) -> Result<Vec<f64>, AnalysisError> {
    let closes = series.closes();
    if let Some(i) = closes.iter().position(|c| !c.is_finite()) {
        return Err(AnalysisError::InvalidData(format!(
            "close price at bar {} is not a finite number",
            i
        )));
    }
    Ok(closes)
}

fn ensure_finite(label: &str, values: &[f64]) -> Result<(), AnalysisError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(AnalysisError::CalculationError(format!("{} produced a non-finite value", label)))
    }
}

fn result(
    kind: IndicatorKind,
    name: &str,
    explanation: String,
    outcome: Result<Classification, AnalysisError>,
) -> IndicatorResult {
    match outcome {
        Ok(c) => IndicatorResult {
            kind,
            name: name.to_string(),
            signal_key: c.signal_key,
            signal_text: c.signal_text.to_string(),
            details: IndicatorDetails::Values(c.details),
            explanation,
        },
        Err(e) => {
            tracing::warn!("{} analysis failed: {}", kind.short_name(), e);
            IndicatorResult {
                kind,
                name: name.to_string(),
                signal_key: SignalKey::Error,
                signal_text: "Error".to_string(),
                details: IndicatorDetails::Message(format!(
                    "Error during {} analysis: {}",
                    kind.short_name(),
                    e
                )),
                explanation,
            }
        }
    }
}

fn no_data(kind: IndicatorKind, name: &str, explanation: String) -> IndicatorResult {
    IndicatorResult {
        kind,
        name: name.to_string(),
        signal_key: SignalKey::NoData,
        signal_text: "Not enough data".to_string(),
        details: IndicatorDetails::Message(format!(
            "Insufficient historical data for {} calculation.",
            kind.short_name()
        )),
        explanation,
    }
}

fn sma_explanation(config: &SmaConfig) -> String {
    format!(
        "Simple moving averages smooth daily closes to expose the trend. When the {}-day average \
         crosses above the {}-day average (a golden cross) momentum is turning up; a cross below \
         (a death cross) is bearish. Price trading above both averages supports an uptrend, below \
         both a downtrend.",
        config.short_window, config.long_window
    )
}

fn rsi_explanation(config: &RsiConfig) -> String {
    format!(
        "RSI compares the size of recent gains with recent losses on a 0 to 100 scale. Readings \
         below {} suggest the stock is oversold (a possible buy), readings above {} suggest it is \
         overbought (a possible sell).",
        config.oversold, config.overbought
    )
}

fn macd_explanation() -> String {
    "MACD tracks the gap between a fast and a slow exponential moving average. The signal line \
     is a smoothed MACD and the histogram is their difference. MACD crossing above its signal \
     line is bullish, crossing below is bearish."
        .to_string()
}

fn classify_sma(closes: &[f64], config: &SmaConfig) -> Result<Classification, AnalysisError> {
    if config.short_window == 0 || config.short_window >= config.long_window {
        return Err(AnalysisError::InvalidData(format!(
            "short window {} must be positive and below long window {}",
            config.short_window, config.long_window
        )));
    }

    let sma_short = sma(closes, config.short_window);
    let sma_long = sma(closes, config.long_window);
    ensure_finite("short SMA", &sma_short)?;
    ensure_finite("long SMA", &sma_long)?;

    let (prev_short, last_short) = last_two(&sma_short)
        .ok_or_else(|| AnalysisError::CalculationError("empty short SMA".to_string()))?;
    let (prev_long, last_long) = last_two(&sma_long)
        .ok_or_else(|| AnalysisError::CalculationError("empty long SMA".to_string()))?;
    let last_price = closes[closes.len() - 1];

    let mut details = BTreeMap::new();
    details.insert("Current Price".to_string(), fmt2(last_price));
    details.insert(format!("SMA {}-day", config.short_window), fmt2(last_short));
    details.insert(format!("SMA {}-day", config.long_window), fmt2(last_long));

    let golden_cross = prev_short <= prev_long && last_short > last_long;
    let death_cross = prev_short >= prev_long && last_short < last_long;

    let (signal_key, signal_text) = if golden_cross && last_price > last_short {
        (SignalKey::StrongBuy, "Strong Buy (Golden Cross & Price Confirmation)")
    } else if death_cross && last_price < last_short {
        (SignalKey::StrongSell, "Strong Sell (Death Cross & Price Confirmation)")
    } else if last_short > last_long && last_price > last_short {
        (SignalKey::Buy, "Buy (Uptrend)")
    } else if last_short < last_long && last_price < last_short {
        (SignalKey::Sell, "Sell (Downtrend)")
    } else {
        (SignalKey::Neutral, "Neutral / Hold")
    };

    Ok(Classification { signal_key, signal_text, details })
}

fn classify_rsi(closes: &[f64], config: &RsiConfig) -> Result<Classification, AnalysisError> {
    if config.window == 0 {
        return Err(AnalysisError::InvalidData("RSI window must be positive".to_string()));
    }

    let rsi_values = rsi(closes, config.window);
    ensure_finite("RSI", &rsi_values)?;
    let last_rsi = *rsi_values
        .last()
        .ok_or_else(|| AnalysisError::CalculationError("empty RSI series".to_string()))?;

    let mut details = BTreeMap::new();
    details.insert(format!("Current RSI ({}-day)", config.window), fmt2(last_rsi));

    let (signal_key, signal_text) = if last_rsi < config.oversold {
        (SignalKey::Buy, "Buy (Oversold)")
    } else if last_rsi > config.overbought {
        (SignalKey::Sell, "Sell (Overbought)")
    } else {
        (SignalKey::Neutral, "Neutral / Hold")
    };

    Ok(Classification { signal_key, signal_text, details })
}

fn classify_macd(closes: &[f64], config: &MacdConfig) -> Result<Classification, AnalysisError> {
    if config.fast_window == 0 || config.signal_window == 0 || config.fast_window >= config.slow_window {
        return Err(AnalysisError::InvalidData(format!(
            "MACD windows {}/{}/{} are invalid",
            config.fast_window, config.slow_window, config.signal_window
        )));
    }

    let result = macd(closes, config.fast_window, config.slow_window, config.signal_window);
    ensure_finite("MACD line", &result.macd_line)?;
    ensure_finite("MACD signal", &result.signal_line)?;

    let (prev_line, last_line) = last_two(&result.macd_line)
        .ok_or_else(|| AnalysisError::CalculationError("empty MACD line".to_string()))?;
    let (prev_signal, last_signal) = last_two(&result.signal_line)
        .ok_or_else(|| AnalysisError::CalculationError("empty MACD signal".to_string()))?;
    let last_hist = *result
        .histogram
        .last()
        .ok_or_else(|| AnalysisError::CalculationError("empty MACD histogram".to_string()))?;

    let mut details = BTreeMap::new();
    details.insert("MACD Line".to_string(), fmt2(last_line));
    details.insert("Signal Line".to_string(), fmt2(last_signal));
    details.insert("Histogram".to_string(), fmt2(last_hist));

    let bullish_crossover = prev_line <= prev_signal && last_line > last_signal;
    let bearish_crossover = prev_line >= prev_signal && last_line < last_signal;

    let (signal_key, signal_text) = if bullish_crossover {
        if last_hist > 0.0 {
            (SignalKey::StrongBuy, "Strong Buy (MACD Bullish Crossover & Positive Histogram)")
        } else {
            (SignalKey::Buy, "Buy (MACD Bullish Crossover)")
        }
    } else if bearish_crossover {
        if last_hist < 0.0 {
            (SignalKey::StrongSell, "Strong Sell (MACD Bearish Crossover & Negative Histogram)")
        } else {
            (SignalKey::Sell, "Sell (MACD Bearish Crossover)")
        }
    } else if last_line > last_signal && last_line > 0.0 {
        (SignalKey::Neutral, "Hold (MACD Bullish Stance)")
    } else if last_line < last_signal && last_line < 0.0 {
        (SignalKey::Neutral, "Hold (MACD Bearish Stance)")
    } else {
        (SignalKey::Neutral, "Neutral / Hold")
    };

    Ok(Classification { signal_key, signal_text, details })
}

/// SMA crossover signal. Needs at least `long_window` bars.
pub fn analyze_sma(series: &PriceSeries, config: &SmaConfig) -> IndicatorResult {
    let explanation = sma_explanation(config);
    if series.len() < config.long_window {
        return no_data(IndicatorKind::Sma, SMA_NAME, explanation);
    }
    let outcome = checked_closes(series).and_then(|closes| classify_sma(&closes, config));
    result(IndicatorKind::Sma, SMA_NAME, explanation, outcome)
}

/// RSI overbought/oversold signal. Needs at least `window + 1` bars.
pub fn analyze_rsi(series: &PriceSeries, config: &RsiConfig) -> IndicatorResult {
    let explanation = rsi_explanation(config);
    if series.len() < config.window + 1 {
        return no_data(IndicatorKind::Rsi, RSI_NAME, explanation);
    }
    let outcome = checked_closes(series).and_then(|closes| classify_rsi(&closes, config));
    result(IndicatorKind::Rsi, RSI_NAME, explanation, outcome)
}

/// MACD crossover signal. Needs at least `slow_window + signal_window` bars.
pub fn analyze_macd(series: &PriceSeries, config: &MacdConfig) -> IndicatorResult {
    let explanation = macd_explanation();
    if series.len() < config.slow_window + config.signal_window {
        return no_data(IndicatorKind::Macd, MACD_NAME, explanation);
    }
    let outcome = checked_closes(series).and_then(|closes| classify_macd(&closes, config));
    result(IndicatorKind::Macd, MACD_NAME, explanation, outcome)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TechnicalAnalysisEngine {
    pub sma: SmaConfig,
    pub rsi: RsiConfig,
    pub macd: MacdConfig,
}

impl TechnicalAnalysisEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configs(sma: SmaConfig, rsi: RsiConfig, macd: MacdConfig) -> Self {
        Self { sma, rsi, macd }
    }

    /// Run every calculator over the series, in SMA, RSI, MACD order.
    pub fn analyze_all(&self, series: &PriceSeries) -> Vec<IndicatorResult> {
        vec![
            analyze_sma(series, &self.sma),
            analyze_rsi(series, &self.rsi),
            analyze_macd(series, &self.macd),
        ]
    }
}
