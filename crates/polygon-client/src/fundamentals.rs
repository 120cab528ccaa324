//! Builds the flat fundamentals payload from individual Polygon responses.
//!
//! Polygon has no single "quote summary" endpoint, so the Yahoo-style fields
//! the normalizer understands are derived here from ticker details, quarterly
//! financials, a year of daily bars, dividends and benchmark bars. Anything
//! that cannot be derived is left out of the payload.
//!
//! The daily bars are normally the series the dashboard already fetched; only
//! bars inside the trailing year are used.

use analysis_core::{Bar, RawFundamentals};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use fundamental_analysis::ratios;
use std::collections::HashMap;

use crate::{DividendInfo, TickerDetails};

/// Bars used for the short average volume.
const SHORT_VOLUME_WINDOW: usize = 10;
/// Roughly three months of trading days.
const LONG_VOLUME_WINDOW: usize = 63;
/// Calendar days in the 52-week window.
pub const TRAILING_YEAR_DAYS: i64 = 365;
/// A series starting this close to the window edge still counts as a full
/// year (weekends and holidays).
const COVERAGE_SLACK_DAYS: i64 = 7;

/// One quarter of reported financials, newest first when in a list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuarterlyFinancials {
    pub fiscal_period: String,
    pub fiscal_year: i32,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub eps: Option<f64>,
    pub shareholders_equity: Option<f64>,
}

/// Everything fetched for one symbol. Failed sub-requests leave their part
/// empty.
#[derive(Debug, Clone, Default)]
pub struct FundamentalInputs {
    pub details: Option<TickerDetails>,
    /// Newest quarter first
    pub financials: Vec<QuarterlyFinancials>,
    /// Oldest bar first
    pub bars: Vec<Bar>,
    pub dividends: Vec<DividendInfo>,
    /// Benchmark (SPY) bars, oldest first
    pub benchmark_bars: Vec<Bar>,
}

fn average_volume(bars: &[Bar], window: usize) -> Option<f64> {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    ratios::trailing_average(&volumes, window)
}

/// Bars inside the 52 weeks ending at `as_of`. `bars` must be oldest first.
fn trailing_year(bars: &[Bar], as_of: DateTime<Utc>) -> &[Bar] {
    let cutoff = as_of - Duration::days(TRAILING_YEAR_DAYS);
    let start = bars.partition_point(|b| b.timestamp <= cutoff);
    &bars[start..]
}

/// Whether `bars` reach back far enough to stand in for a year of history.
pub fn covers_trailing_year(bars: &[Bar], as_of: DateTime<Utc>) -> bool {
    bars.first()
        .map(|b| b.timestamp <= as_of - Duration::days(TRAILING_YEAR_DAYS - COVERAGE_SLACK_DAYS))
        .unwrap_or(false)
}

fn market_cap(details: Option<&TickerDetails>, price: Option<f64>) -> Option<f64> {
    let details = details?;
    if let Some(cap) = details.market_cap.filter(|c| *c > 0.0) {
        return Some(cap);
    }
    let shares = details
        .weighted_shares_outstanding
        .or(details.share_class_shares_outstanding)?;
    price.map(|p| p * shares).filter(|c| *c > 0.0)
}

fn ttm<F>(quarters: &[QuarterlyFinancials], accessor: F) -> Option<f64>
where
    F: Fn(&QuarterlyFinancials) -> Option<f64>,
{
    if quarters.len() < 4 {
        return None;
    }
    let values: Vec<Option<f64>> = quarters.iter().take(4).map(accessor).collect();
    ratios::sum_ttm(&values)
}

/// Trailing-year cash dividends, counted by ex-dividend date.
fn trailing_dividends(dividends: &[DividendInfo], as_of: DateTime<Utc>) -> Option<f64> {
    if dividends.is_empty() {
        return None;
    }
    let cutoff = (as_of - Duration::days(365)).date_naive();
    let total: f64 = dividends
        .iter()
        .filter(|d| {
            d.ex_dividend_date
                .as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .map(|date| date > cutoff && date <= as_of.date_naive())
                .unwrap_or(false)
        })
        .filter_map(|d| d.cash_amount)
        .sum();
    Some(total)
}

/// Beta from closes paired on matching trading days.
fn beta_against(bars: &[Bar], benchmark: &[Bar]) -> Option<f64> {
    let benchmark_by_day: HashMap<NaiveDate, f64> = benchmark
        .iter()
        .map(|b| (b.timestamp.date_naive(), b.close))
        .collect();

    let (asset_closes, benchmark_closes): (Vec<f64>, Vec<f64>) = bars
        .iter()
        .filter_map(|b| {
            benchmark_by_day
                .get(&b.timestamp.date_naive())
                .map(|bench| (b.close, *bench))
        })
        .unzip();

    ratios::beta(
        &ratios::daily_returns(&asset_closes),
        &ratios::daily_returns(&benchmark_closes),
    )
}

/// Assemble the raw payload as of `as_of`.
pub fn assemble_raw_fundamentals(inputs: &FundamentalInputs, as_of: DateTime<Utc>) -> RawFundamentals {
    let mut raw = RawFundamentals::new();

    let year = trailing_year(&inputs.bars, as_of);
    let price = year.last().map(|b| b.close).filter(|p| *p > 0.0);
    let cap = market_cap(inputs.details.as_ref(), price);
    raw.insert_opt("marketCap", cap);

    if let Some(details) = &inputs.details {
        if !details.name.trim().is_empty() {
            raw.insert("longName", details.name.clone());
        }
    }

    let quarters = &inputs.financials;
    let ttm_eps = ttm(quarters, |q| q.eps);
    let ttm_revenue = ttm(quarters, |q| q.revenue);
    let ttm_net_income = ttm(quarters, |q| q.net_income);
    let equity = quarters.first().and_then(|q| q.shareholders_equity);

    raw.insert_opt("trailingEps", ttm_eps);

    let trailing_pe = match (price, ttm_eps) {
        (Some(p), Some(eps)) => ratios::pe_ratio(p, eps),
        _ => None,
    };
    raw.insert_opt("trailingPE", trailing_pe);

    if quarters.len() >= 8 {
        let prior_eps = ttm(&quarters[4..], |q| q.eps);
        let peg = match (trailing_pe, ttm_eps, prior_eps) {
            (Some(pe), Some(current), Some(prior)) => {
                ratios::growth_pct(current, prior).and_then(|growth| ratios::peg_ratio(pe, growth))
            }
            _ => None,
        };
        raw.insert_opt("pegRatio", peg);
    }

    if let Some(cap) = cap {
        raw.insert_opt(
            "priceToSalesTrailing12Months",
            ttm_revenue.and_then(|rev| ratios::price_to_sales(cap, rev)),
        );
        raw.insert_opt("priceToBook", equity.and_then(|eq| ratios::price_to_book(cap, eq)));
    }

    if let Some(net_income) = ttm_net_income {
        raw.insert_opt("profitMargins", ttm_revenue.and_then(|rev| ratios::profit_margin(net_income, rev)));
        raw.insert_opt("returnOnEquity", equity.and_then(|eq| ratios::return_on_equity(net_income, eq)));
    }

    if let Some(p) = price {
        raw.insert_opt(
            "dividendYield",
            trailing_dividends(&inputs.dividends, as_of).and_then(|d| ratios::dividend_yield(d, p)),
        );
    }

    raw.insert_opt("beta", beta_against(year, &inputs.benchmark_bars));

    if !year.is_empty() {
        let high = year.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let low = year.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        raw.insert_opt("fiftyTwoWeekHigh", Some(high));
        raw.insert_opt("fiftyTwoWeekLow", Some(low));
    }

    raw.insert_opt("averageVolume10days", average_volume(year, SHORT_VOLUME_WINDOW));
    raw.insert_opt("averageVolume", average_volume(year, LONG_VOLUME_WINDOW));

    raw
}
