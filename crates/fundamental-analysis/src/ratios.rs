//! Valuation and profitability ratios derived from reported financials.
//!
//! All helpers return `None` when a denominator is non-positive or an input is
//! missing, so callers can leave the corresponding field out of the raw
//! payload. Percent-style ratios are returned as fractions (0.25, not 25.0);
//! the normalizer applies the ×100.

/// Sum of the values that are present; `None` when every value is missing.
pub fn sum_ttm(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().filter_map(|v| *v).collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum())
    }
}

/// Mean of the last `window` values (fewer when the slice is shorter).
pub fn trailing_average(values: &[f64], window: usize) -> Option<f64> {
    let start = values.len().saturating_sub(window);
    let tail = &values[start..];
    if tail.is_empty() {
        None
    } else {
        Some(tail.iter().sum::<f64>() / tail.len() as f64)
    }
}

pub fn pe_ratio(price: f64, eps: f64) -> Option<f64> {
    if eps > 0.0 && price > 0.0 {
        Some(price / eps)
    } else {
        None
    }
}

/// Price-to-earnings divided by earnings growth in percent.
pub fn peg_ratio(pe: f64, growth_pct: f64) -> Option<f64> {
    if pe > 0.0 && growth_pct > 0.0 {
        Some(pe / growth_pct)
    } else {
        None
    }
}

/// Growth of `current` over `prior`, in percent.
pub fn growth_pct(current: f64, prior: f64) -> Option<f64> {
    if prior > 0.0 {
        Some((current - prior) / prior * 100.0)
    } else {
        None
    }
}

pub fn price_to_sales(market_cap: f64, revenue: f64) -> Option<f64> {
    if revenue > 0.0 {
        Some(market_cap / revenue)
    } else {
        None
    }
}

pub fn price_to_book(market_cap: f64, equity: f64) -> Option<f64> {
    if equity > 0.0 {
        Some(market_cap / equity)
    } else {
        None
    }
}

pub fn return_on_equity(net_income: f64, equity: f64) -> Option<f64> {
    if equity > 0.0 {
        Some(net_income / equity)
    } else {
        None
    }
}

pub fn profit_margin(net_income: f64, revenue: f64) -> Option<f64> {
    if revenue > 0.0 {
        Some(net_income / revenue)
    } else {
        None
    }
}

pub fn dividend_yield(annual_dividends: f64, price: f64) -> Option<f64> {
    if price > 0.0 && annual_dividends >= 0.0 {
        Some(annual_dividends / price)
    } else {
        None
    }
}

/// Simple close-to-close returns.
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Beta of `asset` against `benchmark` returns, aligned on their most recent
/// common tail. Needs at least 20 paired observations.
pub fn beta(asset: &[f64], benchmark: &[f64]) -> Option<f64> {
    let n = asset.len().min(benchmark.len());
    if n < 20 {
        return None;
    }
    let a = &asset[asset.len() - n..];
    let b = &benchmark[benchmark.len() - n..];

    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let covariance: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / (n - 1) as f64;
    let variance: f64 = b.iter().map(|y| (y - mean_b).powi(2)).sum::<f64>() / (n - 1) as f64;

    if variance > 0.0 {
        Some(covariance / variance)
    } else {
        None
    }
}
