use analysis_core::{
    AnalysisError, FundamentalsProvider, FundamentalsSnapshot, Headline, IndicatorResult,
    NewsProvider, PriceHistoryProvider, PriceSeries, RawFundamentals, RecommendationTier,
    SentimentLabel, SentimentScorer,
};
use fundamental_analysis::FundamentalAnalysisEngine;
use serde::Serialize;
use std::sync::Arc;
use technical_analysis::TechnicalAnalysisEngine;

pub mod recommendation;

pub use recommendation::{aggregate, tier_for, Contribution, Recommendation, ScoreBreakdown};

pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;
pub const DEFAULT_HEADLINE_LIMIT: usize = 5;

pub const DISCLAIMER: &str = "All analysis is for educational purposes only and NOT financial advice. \
Market conditions can change rapidly. News headlines provided by NewsAPI.org. \
Market data from Polygon.io (US listings) and Yahoo Finance (other exchanges).";

/// Everything the engine derives from one price series and one fundamentals
/// payload.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub indicator_results: Vec<IndicatorResult>,
    pub recommendation: RecommendationTier,
    pub fundamentals: FundamentalsSnapshot,
}

/// Run the default calculators, the normalizer and the aggregator.
pub fn evaluate(series: &PriceSeries, raw: &RawFundamentals) -> Evaluation {
    evaluate_with(&TechnicalAnalysisEngine::default(), &FundamentalAnalysisEngine::new(), series, raw)
}

pub fn evaluate_with(
    technical: &TechnicalAnalysisEngine,
    fundamental: &FundamentalAnalysisEngine,
    series: &PriceSeries,
    raw: &RawFundamentals,
) -> Evaluation {
    let indicator_results = technical.analyze_all(series);
    let fundamentals = fundamental.normalize(raw);
    let recommendation = aggregate(&indicator_results, &fundamentals);

    Evaluation {
        indicator_results,
        recommendation: recommendation.tier,
        fundamentals,
    }
}

/// Display strings for the latest close and its move from the prior close
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChange {
    pub current_price: String,
    pub change: String,
    pub change_percent: String,
}

impl PriceChange {
    pub fn from_series(series: &PriceSeries) -> Self {
        let Some(current) = series.last_close() else {
            return Self {
                current_price: "N/A".to_string(),
                change: "N/A".to_string(),
                change_percent: "N/A".to_string(),
            };
        };
        let previous = series.previous_close().unwrap_or(current);
        let change = current - previous;
        let change_percent = if previous != 0.0 { change / previous * 100.0 } else { 0.0 };

        Self {
            current_price: format!("{:.2}", current),
            change: format!("{:+.2}", change),
            change_percent: format!("{:+.2}%", change_percent),
        }
    }
}

/// Full per-ticker view served by the API
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub ticker: String,
    pub name: String,
    #[serde(flatten)]
    pub price: PriceChange,
    pub analyses: Vec<IndicatorResult>,
    pub overall_recommendation: RecommendationTier,
    pub fundamentals: FundamentalsSnapshot,
    pub headlines: Vec<Headline>,
    pub disclaimer: String,
}

pub struct AnalysisOrchestrator {
    price_history: Arc<dyn PriceHistoryProvider>,
    fundamentals: Arc<dyn FundamentalsProvider>,
    news: Arc<dyn NewsProvider>,
    sentiment: Arc<dyn SentimentScorer>,
    technical_analyzer: TechnicalAnalysisEngine,
    fundamental_analyzer: FundamentalAnalysisEngine,
    lookback_days: i64,
    headline_limit: usize,
}

impl AnalysisOrchestrator {
    pub fn new(
        price_history: Arc<dyn PriceHistoryProvider>,
        fundamentals: Arc<dyn FundamentalsProvider>,
        news: Arc<dyn NewsProvider>,
        sentiment: Arc<dyn SentimentScorer>,
    ) -> Self {
        Self {
            price_history,
            fundamentals,
            news,
            sentiment,
            technical_analyzer: TechnicalAnalysisEngine::new(),
            fundamental_analyzer: FundamentalAnalysisEngine::new(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            headline_limit: DEFAULT_HEADLINE_LIMIT,
        }
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_headline_limit(mut self, limit: usize) -> Self {
        self.headline_limit = limit;
        self
    }

    fn score_headline(&self, title: String, source: String, url: String) -> Headline {
        let sentiment = self.sentiment.score(&title);
        Headline {
            title,
            source,
            url,
            sentiment,
            sentiment_label: SentimentLabel::from_score(sentiment),
        }
    }

    /// Build the dashboard for one ticker.
    ///
    /// Missing price history is `NotFound`. A fundamentals failure only
    /// degrades the snapshot to "N/A" values.
    pub async fn dashboard(&self, symbol: &str) -> Result<Dashboard, AnalysisError> {
        let ticker = symbol.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(AnalysisError::InvalidData("ticker symbol is empty".to_string()));
        }

        tracing::info!("Building dashboard for {}", ticker);

        let history = self
            .price_history
            .daily_history(&ticker, self.lookback_days)
            .await?;

        let series = match history {
            Some(series) if !series.is_empty() => series,
            _ => {
                return Err(AnalysisError::NotFound(format!(
                    "Could not retrieve or process historical price data for ticker '{}'. \
                     Check ticker or try again later.",
                    ticker
                )))
            }
        };

        let raw = self.fundamentals.fundamentals(&ticker, &series).await.unwrap_or_else(|e| {
            tracing::warn!("Could not fetch fundamentals for {}: {}", ticker, e);
            RawFundamentals::new()
        });

        let evaluation = evaluate_with(&self.technical_analyzer, &self.fundamental_analyzer, &series, &raw);
        let name = self.fundamental_analyzer.display_name(&raw, &ticker);

        let headlines = self
            .news
            .headlines(&ticker, &name, self.headline_limit)
            .await
            .into_iter()
            .map(|item| self.score_headline(item.title, item.source, item.url))
            .collect();

        tracing::info!(
            "Dashboard for {} complete: {} ({} bars)",
            ticker,
            evaluation.recommendation,
            series.len()
        );

        Ok(Dashboard {
            ticker,
            name,
            price: PriceChange::from_series(&series),
            analyses: evaluation.indicator_results,
            overall_recommendation: evaluation.recommendation,
            fundamentals: evaluation.fundamentals,
            headlines,
            disclaimer: DISCLAIMER.to_string(),
        })
    }
}

#[cfg(test)]
mod orchestrator_tests;
