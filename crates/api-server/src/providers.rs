//! Per-symbol choice of market data source.

use analysis_core::{
    AnalysisError, FundamentalsProvider, PriceHistoryProvider, PriceSeries, RawFundamentals,
};
use async_trait::async_trait;
use std::sync::Arc;

/// One data source serving both history and fundamentals.
#[derive(Clone)]
pub struct Venue {
    pub history: Arc<dyn PriceHistoryProvider>,
    pub fundamentals: Arc<dyn FundamentalsProvider>,
}

impl Venue {
    pub fn new<P>(provider: Arc<P>) -> Self
    where
        P: PriceHistoryProvider + FundamentalsProvider + 'static,
    {
        Self {
            history: provider.clone(),
            fundamentals: provider,
        }
    }
}

/// Sends exchange-suffixed symbols (`CBA.AX`) to the international venue
/// and everything else to the US venue.
pub struct MarketDataRouter {
    us: Venue,
    international: Venue,
}

impl MarketDataRouter {
    pub fn new(us: Venue, international: Venue) -> Self {
        Self { us, international }
    }

    fn venue(&self, symbol: &str) -> &Venue {
        if yahoo_client::is_international(symbol) {
            &self.international
        } else {
            &self.us
        }
    }
}

#[async_trait]
impl PriceHistoryProvider for MarketDataRouter {
    async fn daily_history(&self, symbol: &str, lookback_days: i64) -> Result<Option<PriceSeries>, AnalysisError> {
        self.venue(symbol).history.daily_history(symbol, lookback_days).await
    }
}

#[async_trait]
impl FundamentalsProvider for MarketDataRouter {
    async fn fundamentals(&self, symbol: &str, history: &PriceSeries) -> Result<RawFundamentals, AnalysisError> {
        self.venue(symbol).fundamentals.fundamentals(symbol, history).await
    }
}
