//! Weighted combination of indicator signals and fundamentals into one tier.

use analysis_core::{
    FundamentalMetric, FundamentalsSnapshot, IndicatorKind, IndicatorResult, RecommendationTier,
    SignalKey,
};
use serde::Serialize;

const CONFLUENCE_BONUS: f64 = 1.5;

const STRONG_THRESHOLD: f64 = 3.5;
const DIRECTIONAL_THRESHOLD: f64 = 1.5;
const LEANING_THRESHOLD: f64 = 0.5;

/// One active indicator's share of the score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub kind: IndicatorKind,
    pub signal_key: SignalKey,
    pub base_score: i32,
    pub weight: f64,
    pub value: f64,
}

/// Audit trail of how the final score was reached
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub contributions: Vec<Contribution>,
    pub active_indicators: usize,
    pub confluence_adjustment: f64,
    pub fundamental_adjustment: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub tier: RecommendationTier,
    pub breakdown: ScoreBreakdown,
}

/// Signal of the first result of `kind`; a missing indicator reads as neutral.
fn signal_of(results: &[IndicatorResult], kind: IndicatorKind) -> SignalKey {
    results
        .iter()
        .find(|r| r.kind == kind)
        .map(|r| r.signal_key)
        .unwrap_or(SignalKey::Neutral)
}

/// Bonus when trend, momentum and oscillator agree.
fn confluence_adjustment(results: &[IndicatorResult]) -> f64 {
    let sma = signal_of(results, IndicatorKind::Sma);
    let rsi = signal_of(results, IndicatorKind::Rsi);
    let macd = signal_of(results, IndicatorKind::Macd);

    if sma == SignalKey::StrongBuy
        && rsi != SignalKey::Sell
        && matches!(macd, SignalKey::Buy | SignalKey::StrongBuy)
    {
        CONFLUENCE_BONUS
    } else if sma == SignalKey::StrongSell
        && rsi != SignalKey::Buy
        && matches!(macd, SignalKey::Sell | SignalKey::StrongSell)
    {
        -CONFLUENCE_BONUS
    } else {
        0.0
    }
}

fn pe_adjustment(pe: f64) -> f64 {
    if pe > 0.0 && pe < 15.0 {
        0.5
    } else if pe > 30.0 && pe < 50.0 {
        -0.25
    } else if pe >= 50.0 {
        -0.5
    } else {
        0.0
    }
}

fn peg_adjustment(peg: f64) -> f64 {
    if peg > 0.0 && peg < 1.0 {
        0.5
    } else if peg > 2.0 {
        -0.25
    } else {
        0.0
    }
}

/// Valuation nudge from trailing P/E and PEG. A metric that does not parse
/// contributes nothing; the other one still counts.
fn fundamental_adjustment(fundamentals: &FundamentalsSnapshot) -> f64 {
    let mut adjustment = 0.0;

    match fundamentals.parse_number(FundamentalMetric::TrailingPe) {
        Ok(pe) => adjustment += pe_adjustment(pe),
        Err(e) => tracing::debug!("Trailing P/E ignored: {}", e),
    }
    match fundamentals.parse_number(FundamentalMetric::PegRatio) {
        Ok(peg) => adjustment += peg_adjustment(peg),
        Err(e) => tracing::debug!("PEG ratio ignored: {}", e),
    }

    adjustment
}

/// Map a score onto a tier. Without any active indicator there is nothing to
/// recommend, whatever the fundamentals say.
pub fn tier_for(score: f64, active_indicators: usize) -> RecommendationTier {
    if active_indicators == 0 {
        RecommendationTier::NotEnoughData
    } else if score >= STRONG_THRESHOLD {
        RecommendationTier::StrongBuy
    } else if score >= DIRECTIONAL_THRESHOLD {
        RecommendationTier::Buy
    } else if score >= LEANING_THRESHOLD {
        RecommendationTier::LeaningBuy
    } else if score <= -STRONG_THRESHOLD {
        RecommendationTier::StrongSell
    } else if score <= -DIRECTIONAL_THRESHOLD {
        RecommendationTier::Sell
    } else if score <= -LEANING_THRESHOLD {
        RecommendationTier::LeaningSell
    } else {
        RecommendationTier::NeutralMixed
    }
}

/// Combine indicator results and the fundamentals snapshot.
pub fn aggregate(results: &[IndicatorResult], fundamentals: &FundamentalsSnapshot) -> Recommendation {
    let mut breakdown = ScoreBreakdown::default();

    for result in results {
        let Some(base_score) = result.signal_key.base_score() else {
            continue;
        };
        let weight = result.kind.weight();
        let value = base_score as f64 * weight;

        breakdown.active_indicators += 1;
        breakdown.score += value;
        breakdown.contributions.push(Contribution {
            kind: result.kind,
            signal_key: result.signal_key,
            base_score,
            weight,
            value,
        });
    }

    breakdown.confluence_adjustment = confluence_adjustment(results);
    breakdown.score += breakdown.confluence_adjustment;

    breakdown.fundamental_adjustment = fundamental_adjustment(fundamentals);
    breakdown.score += breakdown.fundamental_adjustment;

    let tier = tier_for(breakdown.score, breakdown.active_indicators);

    tracing::debug!(
        score = breakdown.score,
        active = breakdown.active_indicators,
        confluence = breakdown.confluence_adjustment,
        fundamental = breakdown.fundamental_adjustment,
        "Recommendation: {}",
        tier
    );

    Recommendation { tier, breakdown }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::IndicatorDetails;
    use approx::assert_abs_diff_eq;

    fn result(kind: IndicatorKind, signal_key: SignalKey) -> IndicatorResult {
        IndicatorResult {
            kind,
            name: kind.short_name().to_string(),
            signal_key,
            signal_text: signal_key.as_str().to_string(),
            details: IndicatorDetails::Message(String::new()),
            explanation: String::new(),
        }
    }

    fn trio(sma: SignalKey, rsi: SignalKey, macd: SignalKey) -> Vec<IndicatorResult> {
        vec![
            result(IndicatorKind::Sma, sma),
            result(IndicatorKind::Rsi, rsi),
            result(IndicatorKind::Macd, macd),
        ]
    }

    fn valuation(pe: &str, peg: &str) -> FundamentalsSnapshot {
        FundamentalsSnapshot::empty()
            .with(FundamentalMetric::TrailingPe, pe)
            .with(FundamentalMetric::PegRatio, peg)
    }

    #[test]
    fn test_all_no_data_is_not_enough_data() {
        let results = trio(SignalKey::NoData, SignalKey::NoData, SignalKey::NoData);
        let rec = aggregate(&results, &valuation("12.00", "0.50"));

        assert_eq!(rec.tier, RecommendationTier::NotEnoughData);
        assert_eq!(rec.breakdown.active_indicators, 0);
        assert_abs_diff_eq!(rec.breakdown.score, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_errors_are_not_counted() {
        let results = trio(SignalKey::Error, SignalKey::Buy, SignalKey::NoData);
        let rec = aggregate(&results, &FundamentalsSnapshot::empty());

        assert_eq!(rec.breakdown.active_indicators, 1);
        assert_eq!(rec.breakdown.contributions.len(), 1);
        assert_eq!(rec.tier, RecommendationTier::LeaningBuy);
    }

    #[test]
    fn test_bullish_confluence_reaches_strong_buy() {
        let results = trio(SignalKey::StrongBuy, SignalKey::Neutral, SignalKey::Buy);
        let rec = aggregate(&results, &FundamentalsSnapshot::empty());

        assert_abs_diff_eq!(rec.breakdown.confluence_adjustment, 1.5);
        assert_abs_diff_eq!(rec.breakdown.score, 5.7, epsilon = 1e-9);
        assert_eq!(rec.tier, RecommendationTier::StrongBuy);
    }

    #[test]
    fn test_bearish_confluence() {
        let results = trio(SignalKey::StrongSell, SignalKey::Neutral, SignalKey::StrongSell);
        let rec = aggregate(&results, &FundamentalsSnapshot::empty());

        assert_abs_diff_eq!(rec.breakdown.confluence_adjustment, -1.5);
        // -3.0 - 2.4 - 1.5
        assert_abs_diff_eq!(rec.breakdown.score, -6.9, epsilon = 1e-9);
        assert_eq!(rec.tier, RecommendationTier::StrongSell);
    }

    #[test]
    fn test_confluence_blocked_by_contrary_rsi() {
        let results = trio(SignalKey::StrongBuy, SignalKey::Sell, SignalKey::Buy);
        let rec = aggregate(&results, &FundamentalsSnapshot::empty());

        assert_eq!(rec.breakdown.confluence_adjustment, 0.0);
        // 3.0 - 1.0 + 1.2
        assert_abs_diff_eq!(rec.breakdown.score, 3.2, epsilon = 1e-9);
        assert_eq!(rec.tier, RecommendationTier::Buy);
    }

    #[test]
    fn test_missing_indicators_read_as_neutral_for_confluence() {
        let results = vec![result(IndicatorKind::Sma, SignalKey::StrongBuy)];
        let rec = aggregate(&results, &FundamentalsSnapshot::empty());

        assert_eq!(rec.breakdown.confluence_adjustment, 0.0);
        assert_eq!(rec.tier, RecommendationTier::Buy);
    }

    #[test]
    fn test_cheap_valuation_tilts_neutral_to_leaning_buy() {
        let results = trio(SignalKey::Neutral, SignalKey::Neutral, SignalKey::Neutral);
        let rec = aggregate(&results, &valuation("12.00", "0.50"));

        assert_abs_diff_eq!(rec.breakdown.fundamental_adjustment, 1.0);
        assert_eq!(rec.tier, RecommendationTier::LeaningBuy);
    }

    #[test]
    fn test_expensive_valuation_penalties() {
        assert_abs_diff_eq!(fundamental_adjustment(&valuation("35.00", "2.50")), -0.5);
        assert_abs_diff_eq!(fundamental_adjustment(&valuation("50.00", "N/A")), -0.5);
        assert_abs_diff_eq!(fundamental_adjustment(&valuation("30.00", "2.00")), 0.0);
        assert_abs_diff_eq!(fundamental_adjustment(&valuation("-5.00", "0.00")), 0.0);
    }

    #[test]
    fn test_unparseable_metric_only_drops_itself() {
        // P/E fails to parse, PEG still counts
        let snapshot = valuation("12.0x", "0.50");
        assert_abs_diff_eq!(fundamental_adjustment(&snapshot), 0.5);

        let snapshot = valuation("N/A", "N/A");
        assert_eq!(fundamental_adjustment(&snapshot), 0.0);
    }

    #[test]
    fn test_other_kind_weighs_one() {
        let results = vec![result(IndicatorKind::Other, SignalKey::StrongBuy)];
        let rec = aggregate(&results, &FundamentalsSnapshot::empty());

        assert_abs_diff_eq!(rec.breakdown.score, 2.0);
        assert_eq!(rec.tier, RecommendationTier::Buy);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tier_for(3.5, 1), RecommendationTier::StrongBuy);
        assert_eq!(tier_for(3.49, 1), RecommendationTier::Buy);
        assert_eq!(tier_for(1.5, 1), RecommendationTier::Buy);
        assert_eq!(tier_for(0.5, 1), RecommendationTier::LeaningBuy);
        assert_eq!(tier_for(0.49, 1), RecommendationTier::NeutralMixed);
        assert_eq!(tier_for(0.0, 3), RecommendationTier::NeutralMixed);
        assert_eq!(tier_for(-0.49, 1), RecommendationTier::NeutralMixed);
        assert_eq!(tier_for(-0.5, 1), RecommendationTier::LeaningSell);
        assert_eq!(tier_for(-1.5, 1), RecommendationTier::Sell);
        assert_eq!(tier_for(-3.5, 1), RecommendationTier::StrongSell);
        assert_eq!(tier_for(10.0, 0), RecommendationTier::NotEnoughData);
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(tier_for(5.7, 3).label(), "Strong Buy Candidate");
        assert_eq!(tier_for(0.0, 3).label(), "Neutral / Hold - Mixed Signals");
        assert_eq!(tier_for(0.0, 0).label(), "Not Enough Data for Recommendation");
    }
}
