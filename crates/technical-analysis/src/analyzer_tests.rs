#[cfg(test)]
mod tests {
    use super::super::analyzer::*;
    use analysis_core::{IndicatorDetails, IndicatorKind, PriceSeries, SignalKey};

    fn flat_then(last: f64, len: usize) -> PriceSeries {
        let mut closes = vec![100.0; len - 1];
        closes.push(last);
        PriceSeries::from_closes(&closes)
    }

    fn linear(len: usize, start: f64, step: f64) -> PriceSeries {
        let closes: Vec<f64> = (0..len).map(|i| start + step * i as f64).collect();
        PriceSeries::from_closes(&closes)
    }

    // --- SMA ---

    #[test]
    fn test_sma_golden_cross_with_price_confirmation() {
        let result = analyze_sma(&flat_then(200.0, 60), &SmaConfig::default());

        assert_eq!(result.kind, IndicatorKind::Sma);
        assert_eq!(result.signal_key, SignalKey::StrongBuy);
        assert_eq!(result.details.value("Current Price"), Some("200.00"));
        assert_eq!(result.details.value("SMA 20-day"), Some("105.00"));
        assert_eq!(result.details.value("SMA 50-day"), Some("102.00"));
    }

    #[test]
    fn test_sma_death_cross_with_price_confirmation() {
        let result = analyze_sma(&flat_then(50.0, 60), &SmaConfig::default());
        assert_eq!(result.signal_key, SignalKey::StrongSell);
    }

    #[test]
    fn test_sma_uptrend_and_downtrend() {
        let up = analyze_sma(&linear(60, 10.0, 1.0), &SmaConfig::default());
        assert_eq!(up.signal_key, SignalKey::Buy);
        assert_eq!(up.signal_text, "Buy (Uptrend)");

        let down = analyze_sma(&linear(60, 100.0, -1.0), &SmaConfig::default());
        assert_eq!(down.signal_key, SignalKey::Sell);
    }

    #[test]
    fn test_sma_flat_is_neutral() {
        let result = analyze_sma(&PriceSeries::from_closes(&[42.0; 60]), &SmaConfig::default());
        assert_eq!(result.signal_key, SignalKey::Neutral);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let result = analyze_sma(&linear(49, 10.0, 1.0), &SmaConfig::default());

        assert_eq!(result.signal_key, SignalKey::NoData);
        assert_eq!(
            result.details,
            IndicatorDetails::Message("Insufficient historical data for SMA calculation.".to_string())
        );
    }

    #[test]
    fn test_sma_exactly_long_window_is_computed() {
        let result = analyze_sma(&linear(50, 10.0, 1.0), &SmaConfig::default());
        assert_ne!(result.signal_key, SignalKey::NoData);
    }

    #[test]
    fn test_sma_non_finite_close_is_error() {
        let mut closes = vec![100.0; 60];
        closes[30] = f64::NAN;
        let result = analyze_sma(&PriceSeries::from_closes(&closes), &SmaConfig::default());

        assert_eq!(result.signal_key, SignalKey::Error);
        assert!(result.details.message().unwrap().starts_with("Error during SMA analysis"));
    }

    #[test]
    fn test_sma_invalid_windows_is_error() {
        let config = SmaConfig { short_window: 50, long_window: 20 };
        let result = analyze_sma(&linear(60, 10.0, 1.0), &config);
        assert_eq!(result.signal_key, SignalKey::Error);
    }

    // --- RSI ---

    #[test]
    fn test_rsi_without_losses_is_overbought() {
        let result = analyze_rsi(&linear(15, 10.0, 1.0), &RsiConfig::default());

        assert_eq!(result.signal_key, SignalKey::Sell);
        assert_eq!(result.details.value("Current RSI (14-day)"), Some("100.00"));
    }

    #[test]
    fn test_rsi_without_gains_is_oversold() {
        let result = analyze_rsi(&linear(30, 100.0, -1.0), &RsiConfig::default());
        assert_eq!(result.signal_key, SignalKey::Buy);
        assert_eq!(result.signal_text, "Buy (Oversold)");
    }

    #[test]
    fn test_rsi_choppy_is_neutral() {
        let closes: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        let result = analyze_rsi(&PriceSeries::from_closes(&closes), &RsiConfig::default());
        assert_eq!(result.signal_key, SignalKey::Neutral);
    }

    #[test]
    fn test_rsi_short_recovery_is_overbought() {
        let mut closes: Vec<f64> = (0..8).map(|i| 100.0 - i as f64).collect();
        closes.extend((0..7).map(|i| 94.5 + 1.5 * i as f64));
        let result = analyze_rsi(&PriceSeries::from_closes(&closes), &RsiConfig::default());

        assert_eq!(result.signal_key, SignalKey::Sell);
        assert_eq!(result.details.value("Current RSI (14-day)"), Some("71.59"));
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let result = analyze_rsi(&linear(14, 10.0, 1.0), &RsiConfig::default());
        assert_eq!(result.signal_key, SignalKey::NoData);
    }

    #[test]
    fn test_rsi_never_strong() {
        let series = [linear(40, 10.0, 1.0), linear(40, 100.0, -1.0), flat_then(500.0, 40)];
        for s in &series {
            let key = analyze_rsi(s, &RsiConfig::default()).signal_key;
            assert!(key != SignalKey::StrongBuy && key != SignalKey::StrongSell);
        }
    }

    // --- MACD ---

    #[test]
    fn test_macd_bullish_crossover() {
        let result = analyze_macd(&flat_then(110.0, 60), &MacdConfig::default());

        assert_eq!(result.kind, IndicatorKind::Macd);
        assert_eq!(result.signal_key, SignalKey::StrongBuy);
        assert!(result.details.value("Histogram").is_some());
    }

    #[test]
    fn test_macd_bearish_crossover() {
        let result = analyze_macd(&flat_then(90.0, 60), &MacdConfig::default());
        assert_eq!(result.signal_key, SignalKey::StrongSell);
    }

    #[test]
    fn test_macd_stances_are_neutral() {
        let bullish = analyze_macd(&linear(60, 10.0, 1.0), &MacdConfig::default());
        assert_eq!(bullish.signal_key, SignalKey::Neutral);
        assert_eq!(bullish.signal_text, "Hold (MACD Bullish Stance)");

        let bearish = analyze_macd(&linear(60, 100.0, -1.0), &MacdConfig::default());
        assert_eq!(bearish.signal_key, SignalKey::Neutral);
        assert_eq!(bearish.signal_text, "Hold (MACD Bearish Stance)");
    }

    #[test]
    fn test_macd_flat_is_plain_neutral() {
        let result = analyze_macd(&PriceSeries::from_closes(&[75.0; 40]), &MacdConfig::default());
        assert_eq!(result.signal_key, SignalKey::Neutral);
        assert_eq!(result.signal_text, "Neutral / Hold");
    }

    #[test]
    fn test_macd_insufficient_data() {
        let result = analyze_macd(&linear(34, 10.0, 1.0), &MacdConfig::default());
        assert_eq!(result.signal_key, SignalKey::NoData);

        let result = analyze_macd(&linear(35, 10.0, 1.0), &MacdConfig::default());
        assert_ne!(result.signal_key, SignalKey::NoData);
    }

    // --- Engine ---

    #[test]
    fn test_engine_runs_all_in_order() {
        let engine = TechnicalAnalysisEngine::new();
        let results = engine.analyze_all(&linear(60, 10.0, 1.0));

        let kinds: Vec<IndicatorKind> = results.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![IndicatorKind::Sma, IndicatorKind::Rsi, IndicatorKind::Macd]);
    }

    #[test]
    fn test_engine_short_series_all_no_data() {
        let engine = TechnicalAnalysisEngine::new();
        let results = engine.analyze_all(&linear(5, 10.0, 1.0));

        assert!(results.iter().all(|r| r.signal_key == SignalKey::NoData));
    }

    #[test]
    fn test_engine_empty_series_all_no_data() {
        let engine = TechnicalAnalysisEngine::new();
        let results = engine.analyze_all(&PriceSeries::default());

        assert!(results.iter().all(|r| r.signal_key == SignalKey::NoData));
    }
}
