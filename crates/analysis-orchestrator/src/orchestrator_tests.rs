#[cfg(test)]
mod tests {
    use super::super::*;
    use analysis_core::{FundamentalMetric, NewsItem, SignalKey, NOT_AVAILABLE};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct FakeHistory(Result<Option<PriceSeries>, AnalysisError>);

    #[async_trait]
    impl PriceHistoryProvider for FakeHistory {
        async fn daily_history(&self, _symbol: &str, _lookback_days: i64) -> Result<Option<PriceSeries>, AnalysisError> {
            self.0.clone()
        }
    }

    /// Records the length of every history it is handed.
    struct FakeFundamentals {
        payload: Result<RawFundamentals, AnalysisError>,
        seen_history: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl FundamentalsProvider for FakeFundamentals {
        async fn fundamentals(&self, _symbol: &str, history: &PriceSeries) -> Result<RawFundamentals, AnalysisError> {
            if let Ok(mut seen) = self.seen_history.lock() {
                seen.push(history.len());
            }
            self.payload.clone()
        }
    }

    #[derive(Default)]
    struct FakeNews {
        items: Vec<NewsItem>,
        requests: Mutex<Vec<(String, String, usize)>>,
    }

    #[async_trait]
    impl NewsProvider for FakeNews {
        async fn headlines(&self, ticker: &str, company_name: &str, limit: usize) -> Vec<NewsItem> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push((ticker.to_string(), company_name.to_string(), limit));
            }
            self.items.clone()
        }
    }

    struct KeywordScorer;

    impl SentimentScorer for KeywordScorer {
        fn score(&self, text: &str) -> f64 {
            if text.contains("record") {
                0.6
            } else if text.contains("slump") {
                -0.4
            } else {
                0.0
            }
        }
    }

    fn rising(len: usize) -> PriceSeries {
        let closes: Vec<f64> = (0..len).map(|i| 100.0 + i as f64).collect();
        PriceSeries::from_closes(&closes)
    }

    fn cba_fundamentals() -> RawFundamentals {
        RawFundamentals::from(json!({
            "longName": "Commonwealth Bank of Australia",
            "marketCap": 250_000_000_000u64,
            "trailingPE": 12.0,
            "pegRatio": 0.5
        }))
    }

    fn fake_fundamentals(payload: Result<RawFundamentals, AnalysisError>) -> Arc<FakeFundamentals> {
        Arc::new(FakeFundamentals {
            payload,
            seen_history: Mutex::new(vec![]),
        })
    }

    fn orchestrator_with(
        history: Result<Option<PriceSeries>, AnalysisError>,
        fundamentals: Arc<FakeFundamentals>,
        news: Arc<FakeNews>,
    ) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(
            Arc::new(FakeHistory(history)),
            fundamentals,
            news,
            Arc::new(KeywordScorer),
        )
    }

    fn orchestrator(
        history: Result<Option<PriceSeries>, AnalysisError>,
        fundamentals: Result<RawFundamentals, AnalysisError>,
        news: Arc<FakeNews>,
    ) -> AnalysisOrchestrator {
        orchestrator_with(history, fake_fundamentals(fundamentals), news)
    }

    // --- evaluate ---

    #[test]
    fn test_evaluate_short_series_is_not_enough_data() {
        let evaluation = evaluate(&rising(10), &cba_fundamentals());

        assert_eq!(evaluation.indicator_results.len(), 3);
        assert!(evaluation
            .indicator_results
            .iter()
            .all(|r| r.signal_key == SignalKey::NoData));
        assert_eq!(evaluation.recommendation, RecommendationTier::NotEnoughData);
        assert_eq!(evaluation.fundamentals.get(FundamentalMetric::TrailingPe), "12.00");
    }

    #[test]
    fn test_evaluate_golden_cross() {
        let mut closes = vec![100.0; 59];
        closes.push(200.0);
        let evaluation = evaluate(&PriceSeries::from_closes(&closes), &RawFundamentals::new());

        assert_eq!(evaluation.indicator_results[0].signal_key, SignalKey::StrongBuy);
        assert_ne!(evaluation.recommendation, RecommendationTier::NotEnoughData);
    }

    // --- price change ---

    #[test]
    fn test_price_change_formatting() {
        let up = PriceChange::from_series(&PriceSeries::from_closes(&[100.0, 102.5]));
        assert_eq!(up.current_price, "102.50");
        assert_eq!(up.change, "+2.50");
        assert_eq!(up.change_percent, "+2.50%");

        let down = PriceChange::from_series(&PriceSeries::from_closes(&[100.0, 97.0]));
        assert_eq!(down.change, "-3.00");
        assert_eq!(down.change_percent, "-3.00%");
    }

    #[test]
    fn test_price_change_single_bar_and_zero_previous() {
        let single = PriceChange::from_series(&PriceSeries::from_closes(&[42.0]));
        assert_eq!(single.change, "+0.00");
        assert_eq!(single.change_percent, "+0.00%");

        let from_zero = PriceChange::from_series(&PriceSeries::from_closes(&[0.0, 5.0]));
        assert_eq!(from_zero.change, "+5.00");
        assert_eq!(from_zero.change_percent, "+0.00%");
    }

    // --- dashboard ---

    #[tokio::test]
    async fn test_dashboard_happy_path() {
        let news = Arc::new(FakeNews {
            items: vec![
                NewsItem::placeholder("CBA posts record half-year profit", "Reuters"),
                NewsItem::placeholder("Bank stocks slump on rate fears", "AFR"),
            ],
            ..FakeNews::default()
        });
        let orch = orchestrator(Ok(Some(rising(80))), Ok(cba_fundamentals()), news.clone());

        let dashboard = orch.dashboard("cba.ax").await.unwrap();

        assert_eq!(dashboard.ticker, "CBA.AX");
        assert_eq!(dashboard.name, "Commonwealth Bank of Australia");
        assert_eq!(dashboard.price.current_price, "179.00");
        assert_eq!(dashboard.analyses.len(), 3);
        assert_eq!(dashboard.fundamentals.get(FundamentalMetric::MarketCap), "$250.00B");
        assert_eq!(dashboard.disclaimer, DISCLAIMER);

        assert_eq!(dashboard.headlines.len(), 2);
        assert_eq!(dashboard.headlines[0].sentiment_label, SentimentLabel::Positive);
        assert_eq!(dashboard.headlines[1].sentiment_label, SentimentLabel::Negative);

        let requests = news.requests.lock().unwrap();
        assert_eq!(
            requests.as_slice(),
            &[("CBA.AX".to_string(), "Commonwealth Bank of Australia".to_string(), DEFAULT_HEADLINE_LIMIT)]
        );
    }

    #[tokio::test]
    async fn test_dashboard_missing_history_is_not_found() {
        let orch = orchestrator(Ok(None), Ok(RawFundamentals::new()), Arc::new(FakeNews::default()));

        match orch.dashboard("ZZZZ").await {
            Err(AnalysisError::NotFound(msg)) => assert!(msg.contains("'ZZZZ'")),
            other => panic!("expected NotFound, got {:?}", other.map(|d| d.ticker)),
        }
    }

    #[tokio::test]
    async fn test_fundamentals_reuse_fetched_history() {
        let fundamentals = fake_fundamentals(Ok(cba_fundamentals()));
        let orch = orchestrator_with(Ok(Some(rising(80))), fundamentals.clone(), Arc::new(FakeNews::default()));

        orch.dashboard("CBA.AX").await.unwrap();

        assert_eq!(fundamentals.seen_history.lock().unwrap().as_slice(), &[80]);
    }

    #[tokio::test]
    async fn test_missing_history_skips_fundamentals() {
        let fundamentals = fake_fundamentals(Ok(cba_fundamentals()));
        let orch = orchestrator_with(Ok(None), fundamentals.clone(), Arc::new(FakeNews::default()));

        assert!(orch.dashboard("ZZZZ").await.is_err());
        assert!(fundamentals.seen_history.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_headline_limit_is_passed_to_news() {
        let news = Arc::new(FakeNews::default());
        let orch = orchestrator(Ok(Some(rising(30))), Ok(RawFundamentals::new()), news.clone())
            .with_headline_limit(8);

        orch.dashboard("AAPL").await.unwrap();

        assert_eq!(news.requests.lock().unwrap()[0].2, 8);
    }

    #[tokio::test]
    async fn test_dashboard_empty_history_is_not_found() {
        let orch = orchestrator(
            Ok(Some(PriceSeries::default())),
            Ok(RawFundamentals::new()),
            Arc::new(FakeNews::default()),
        );

        assert!(matches!(orch.dashboard("ZZZZ").await, Err(AnalysisError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_dashboard_history_error_propagates() {
        let orch = orchestrator(
            Err(AnalysisError::ApiError("HTTP 500".to_string())),
            Ok(RawFundamentals::new()),
            Arc::new(FakeNews::default()),
        );

        assert!(matches!(orch.dashboard("AAPL").await, Err(AnalysisError::ApiError(_))));
    }

    #[tokio::test]
    async fn test_dashboard_survives_fundamentals_failure() {
        let orch = orchestrator(
            Ok(Some(rising(60))),
            Err(AnalysisError::ApiError("timeout".to_string())),
            Arc::new(FakeNews::default()),
        );

        let dashboard = orch.dashboard("msft").await.unwrap();

        assert_eq!(dashboard.name, "MSFT");
        for metric in FundamentalMetric::ALL {
            assert_eq!(dashboard.fundamentals.get(metric), NOT_AVAILABLE);
        }
    }

    #[tokio::test]
    async fn test_dashboard_rejects_blank_symbol() {
        let orch = orchestrator(Ok(None), Ok(RawFundamentals::new()), Arc::new(FakeNews::default()));
        assert!(matches!(orch.dashboard("   ").await, Err(AnalysisError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_dashboard_serializes_flat_price_fields() {
        let orch = orchestrator(Ok(Some(rising(5))), Ok(RawFundamentals::new()), Arc::new(FakeNews::default()));
        let dashboard = orch.dashboard("TSLA").await.unwrap();

        let value = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(value["current_price"], "104.00");
        assert_eq!(value["change"], "+1.00");
        assert_eq!(value["overall_recommendation"], "Not Enough Data for Recommendation");
        assert_eq!(value["fundamentals"]["Market Cap"], "N/A");
        assert_eq!(value["analyses"][0]["signal_key"], "NO_DATA");
    }
}
