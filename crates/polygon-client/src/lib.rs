use analysis_core::{
    AnalysisError, Bar, FundamentalsProvider, PriceHistoryProvider, PriceSeries, RawFundamentals,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub mod fundamentals;

pub use fundamentals::{
    assemble_raw_fundamentals, covers_trailing_year, FundamentalInputs, QuarterlyFinancials,
    TRAILING_YEAR_DAYS,
};

const BASE_URL: &str = "https://api.polygon.io";

/// Default plan limit, requests per minute.
pub const DEFAULT_RATE_LIMIT: usize = 500;

/// Benchmark used for beta.
const BENCHMARK_SYMBOL: &str = "SPY";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let sleep_dur = match ts.front() {
                Some(&oldest) => (oldest + self.window).duration_since(now) + Duration::from_millis(50),
                None => Duration::from_millis(50),
            };
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Polygon API slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Rate-limited client for the Polygon REST API.
#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl PolygonClient {
    pub fn new(api_key: String, requests_per_minute: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            client,
            rate_limiter: RateLimiter::new(requests_per_minute, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let request = builder.build().map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| AnalysisError::ApiError("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            let wait_secs = 15u64;
            tracing::warn!("Polygon 429 rate limited, waiting {}s before retry {}/3", wait_secs, attempt + 1);
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(AnalysisError::ApiError("Rate limited by Polygon after 3 retries".to_string()))
    }

    /// Decode a successful response body, or turn the status into an error.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T, AnalysisError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AnalysisError::NotFound(format!("{} not found", what)));
        }
        if !status.is_success() {
            return Err(AnalysisError::ApiError(format!(
                "{} HTTP {}: {}",
                what,
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(format!("{}: {}", what, e)))
    }

    /// Get aggregates (bars) for a symbol
    pub async fn get_aggregates(
        &self,
        symbol: &str,
        multiplier: u32,
        timespan: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Bar>, AnalysisError> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            BASE_URL,
            symbol,
            multiplier,
            timespan,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("apiKey", self.api_key.as_str()),
                ("adjusted", "true"),
                ("sort", "asc"),
                ("limit", "50000"),
            ]))
            .await?;

        let agg_response: AggregateResponse = Self::decode(response, "Aggregates").await?;

        Ok(agg_response
            .results
            .into_iter()
            .filter_map(|r| {
                Some(Bar {
                    timestamp: DateTime::from_timestamp_millis(r.t)?,
                    open: r.o,
                    high: r.h,
                    low: r.l,
                    close: r.c,
                    volume: r.v,
                })
            })
            .collect())
    }

    /// Get quarterly company financials, newest first
    pub async fn get_financials(&self, symbol: &str, limit: u32) -> Result<Vec<QuarterlyFinancials>, AnalysisError> {
        let url = format!("{}/vX/reference/financials", BASE_URL);

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("ticker", symbol),
                ("timeframe", "quarterly"),
                ("order", "desc"),
                ("apiKey", self.api_key.as_str()),
                ("limit", &limit.to_string()),
            ]))
            .await?;

        if matches!(response.status(), StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED) {
            return Ok(Vec::new());
        }

        let fin_response: FinancialsResponse = Self::decode(response, "Financials").await?;

        Ok(fin_response
            .results
            .into_iter()
            .map(|r| {
                let income = &r.financials.income_statement;
                let balance = &r.financials.balance_sheet;

                QuarterlyFinancials {
                    fiscal_period: r.fiscal_period,
                    fiscal_year: r.fiscal_year.parse().unwrap_or(0),
                    revenue: statement_value(income, "revenues"),
                    net_income: statement_value(income, "net_income_loss"),
                    eps: statement_value(income, "diluted_earnings_per_share")
                        .or_else(|| statement_value(income, "basic_earnings_per_share")),
                    shareholders_equity: statement_value(balance, "equity_attributable_to_parent")
                        .or_else(|| statement_value(balance, "equity")),
                }
            })
            .collect())
    }

    /// Get ticker details
    pub async fn get_ticker_details(&self, symbol: &str) -> Result<TickerDetails, AnalysisError> {
        let url = format!("{}/v3/reference/tickers/{}", BASE_URL, symbol);

        let response = self
            .send_request(self.client.get(&url).query(&[("apiKey", self.api_key.as_str())]))
            .await?;

        let details_response: TickerDetailsResponse =
            Self::decode(response, &format!("Ticker {}", symbol)).await?;

        Ok(details_response.results)
    }

    /// Get dividend history for a symbol, newest first
    pub async fn get_dividends(&self, symbol: &str, limit: u32) -> Result<Vec<DividendInfo>, AnalysisError> {
        let url = format!("{}/v3/reference/dividends", BASE_URL);

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("ticker", symbol),
                ("apiKey", self.api_key.as_str()),
                ("limit", &limit.to_string()),
                ("order", "desc"),
            ]))
            .await?;

        if matches!(response.status(), StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED) {
            return Ok(Vec::new());
        }

        let div_response: DividendResponse = Self::decode(response, "Dividends").await?;

        Ok(div_response.results)
    }

    async fn daily_bars(&self, symbol: &str, lookback_days: i64) -> Result<Vec<Bar>, AnalysisError> {
        let to = Utc::now();
        let from = to - ChronoDuration::days(lookback_days.max(1));
        self.get_aggregates(symbol, 1, "day", from, to).await
    }
}

fn statement_value(statement: &HashMap<String, serde_json::Value>, key: &str) -> Option<f64> {
    statement
        .get(key)
        .and_then(|v| v.get("value"))
        .and_then(|v| v.as_f64())
        .filter(|v| v.is_finite())
}

/// Log a failed sub-request and fall back to an empty value.
fn or_empty<T: Default>(what: &str, symbol: &str, result: Result<T, AnalysisError>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!("Polygon {} request for {} failed: {}", what, symbol, e);
        T::default()
    })
}

#[async_trait]
impl PriceHistoryProvider for PolygonClient {
    async fn daily_history(&self, symbol: &str, lookback_days: i64) -> Result<Option<PriceSeries>, AnalysisError> {
        let bars = match self.daily_bars(symbol, lookback_days).await {
            Ok(bars) => bars,
            Err(AnalysisError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        if bars.is_empty() {
            tracing::info!("No daily bars returned for {}", symbol);
            return Ok(None);
        }
        Ok(Some(PriceSeries::new(bars)))
    }
}

#[async_trait]
impl FundamentalsProvider for PolygonClient {
    async fn fundamentals(&self, symbol: &str, history: &PriceSeries) -> Result<RawFundamentals, AnalysisError> {
        let as_of = Utc::now();
        let year_of_bars = async {
            if covers_trailing_year(history.bars(), as_of) {
                Ok(history.bars().to_vec())
            } else {
                tracing::debug!("History for {} is shorter than a year, fetching daily bars", symbol);
                self.daily_bars(symbol, TRAILING_YEAR_DAYS).await
            }
        };

        let (details, financials, bars, dividends, benchmark_bars) = tokio::join!(
            self.get_ticker_details(symbol),
            self.get_financials(symbol, 8),
            year_of_bars,
            self.get_dividends(symbol, 12),
            self.daily_bars(BENCHMARK_SYMBOL, TRAILING_YEAR_DAYS),
        );

        let inputs = FundamentalInputs {
            details: details
                .map_err(|e| tracing::warn!("Polygon ticker details request for {} failed: {}", symbol, e))
                .ok(),
            financials: or_empty("financials", symbol, financials),
            bars: or_empty("aggregates", symbol, bars),
            dividends: or_empty("dividends", symbol, dividends),
            benchmark_bars: or_empty("benchmark aggregates", BENCHMARK_SYMBOL, benchmark_bars),
        };

        Ok(assemble_raw_fundamentals(&inputs, as_of))
    }
}

// Response structures
#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggregateResult>,
}

#[derive(Debug, Deserialize)]
struct AggregateResult {
    t: i64, // timestamp
    o: f64, // open
    h: f64, // high
    l: f64, // low
    c: f64, // close
    #[serde(default)]
    v: f64, // volume
}

#[derive(Debug, Deserialize)]
struct FinancialsResponse {
    #[serde(default)]
    results: Vec<FinancialResult>,
}

#[derive(Debug, Deserialize)]
struct FinancialResult {
    #[serde(default)]
    fiscal_period: String,
    #[serde(default)]
    fiscal_year: String,
    financials: FinancialStatements,
}

#[derive(Debug, Deserialize)]
struct FinancialStatements {
    #[serde(default)]
    income_statement: HashMap<String, serde_json::Value>,
    #[serde(default)]
    balance_sheet: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TickerDetailsResponse {
    results: TickerDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickerDetails {
    pub ticker: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub market: String,
    pub currency_name: Option<String>,
    pub market_cap: Option<f64>,
    pub share_class_shares_outstanding: Option<f64>,
    pub weighted_shares_outstanding: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DividendResponse {
    #[serde(default)]
    results: Vec<DividendInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DividendInfo {
    pub cash_amount: Option<f64>,
    pub ex_dividend_date: Option<String>,
    pub pay_date: Option<String>,
    pub frequency: Option<i32>,
}
