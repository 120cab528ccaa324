use async_trait::async_trait;
use crate::{AnalysisError, NewsItem, PriceSeries, RawFundamentals};

/// Source of daily price history
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Daily bars covering the last `lookback_days` calendar days.
    /// `Ok(None)` means the provider has no data for the symbol.
    async fn daily_history(
        &self,
        symbol: &str,
        lookback_days: i64,
    ) -> Result<Option<PriceSeries>, AnalysisError>;
}

/// Source of raw fundamental fields. Missing fields are not an error.
///
/// `history` is the daily series already fetched for the symbol; providers
/// derive price-based fields (52-week range, average volume, beta) from it
/// rather than downloading the bars again.
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    async fn fundamentals(
        &self,
        symbol: &str,
        history: &PriceSeries,
    ) -> Result<RawFundamentals, AnalysisError>;
}

/// Source of news headlines. Never fails: problems are reported as a
/// placeholder item instead.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn headlines(&self, ticker: &str, company_name: &str, limit: usize) -> Vec<NewsItem>;
}

/// Scores free text in `[-1, 1]`; empty text scores exactly `0.0`.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> f64;
}
