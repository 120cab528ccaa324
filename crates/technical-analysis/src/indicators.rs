//! Series math behind the indicator calculators.
//!
//! Every function returns one value per input element (or an empty vector
//! when the input cannot support the requested window), so callers can index
//! the latest and previous bar directly.

/// Replace leading undefined values with the first defined one.
fn back_fill(values: Vec<Option<f64>>) -> Vec<f64> {
    let first = match values.iter().flatten().next() {
        Some(&v) => v,
        None => return vec![],
    };
    values.into_iter().map(|v| v.unwrap_or(first)).collect()
}

/// Simple Moving Average
///
/// Bars before the window fills carry the first full-window average.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result: Vec<Option<f64>> = vec![None; period - 1];
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(Some(sum / period as f64));
    }
    back_fill(result)
}

/// Exponential Moving Average
///
/// Recursive form with `alpha = 2 / (period + 1)`, seeded with the first
/// value so that every bar has an average.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.is_empty() {
        return vec![];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len());
    result.push(data[0]);

    for i in 1..data.len() {
        let ema_val = (data[i] - result[i - 1]) * multiplier + result[i - 1];
        result.push(ema_val);
    }

    result
}

/// Relative Strength Index with Wilder smoothing.
///
/// Gains and losses are averaged recursively with `alpha = 1 / period`,
/// starting from zero on the first bar (which has no prior close). Every bar
/// therefore has a value. A zero average loss yields exactly 100.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let rsi_from = |avg_gain: f64, avg_loss: f64| {
        if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        }
    };

    let alpha = 1.0 / period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    let mut rsi_values = Vec::with_capacity(data.len());
    rsi_values.push(rsi_from(avg_gain, avg_loss));

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        let (gain, loss) = if change > 0.0 { (change, 0.0) } else { (0.0, -change) };
        avg_gain += (gain - avg_gain) * alpha;
        avg_loss += (loss - avg_loss) * alpha;
        rsi_values.push(rsi_from(avg_gain, avg_loss));
    }

    rsi_values
}

/// MACD (Moving Average Convergence Divergence)
#[derive(Debug, Clone, Default)]
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdResult {
    pub fn is_empty(&self) -> bool {
        self.macd_line.is_empty()
    }
}

pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    if fast_period == 0 || signal_period == 0 || slow_period <= fast_period || data.is_empty() {
        return MacdResult::default();
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(fast, slow)| fast - slow)
        .collect();

    let signal_line = ema(&macd_line, signal_period);

    let histogram = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(line, signal)| line - signal)
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Latest and previous value of a series; a single-element series reports
/// the same value twice.
pub fn last_two(values: &[f64]) -> Option<(f64, f64)> {
    let last = *values.last()?;
    let prev = if values.len() > 1 { values[values.len() - 2] } else { last };
    Some((prev, last))
}
