use analysis_core::SentimentScorer;
use std::collections::HashSet;

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "won't", "wouldn't", "couldn't", "shouldn't", "hardly",
    "barely", "neither", "nor", "without",
];

const NEGATION_WINDOW: usize = 3;

/// Normalisation constant: a raw score of ±√15 maps to roughly ±0.71.
const NORMALIZATION_ALPHA: f64 = 15.0;

const POSITIVE_WORDS: &[&str] = &[
    "bullish", "rally", "rallies", "surge", "surges", "soar", "soars", "gain", "gains",
    "profit", "profits", "growth", "beat", "beats", "upgrade", "upgraded", "outperform",
    "strong", "stronger", "positive", "rise", "rises", "increase", "breakthrough",
    "innovation", "success", "exceed", "exceeds", "momentum", "recommend",
    "optimistic", "higher", "advance", "jump", "jumps",
    // Financial-specific terms
    "buyback", "repurchase", "accretive", "upside", "recovery", "rebound",
    "expansion", "robust", "accelerating", "overweight", "raised", "outpacing",
    "tailwind", "win", "wins", "approval",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bearish", "decline", "declines", "loss", "losses", "fall", "falls", "plunge",
    "plunges", "crash", "miss", "misses", "downgrade", "downgraded", "underperform",
    "weak", "weaker", "negative", "drop", "drops", "decrease", "concern", "concerns",
    "fail", "fails", "disappoint", "disappoints", "slump", "warning",
    "pessimistic", "lower", "retreat", "fear", "fears", "trouble", "tumble",
    "tumbles", "slide", "slides",
    // Financial-specific terms
    "dilution", "dilutive", "headwind", "lawsuit", "litigation", "recall",
    "investigation", "probe", "bankruptcy", "restructuring", "layoff",
    "layoffs", "downside", "overvalued", "bubble", "underweight", "lowered",
    "suspended", "fined",
];

/// Word-list sentiment scorer for short texts such as headlines.
///
/// Each positive word counts +1 and each negative word −1; a negation word
/// up to three tokens earlier flips the sign. The summed score `s` is
/// squashed into `[-1, 1]` with `s / sqrt(s² + 15)`.
pub struct SentimentAnalysisEngine {
    positive_words: HashSet<&'static str>,
    negative_words: HashSet<&'static str>,
    negation_words: HashSet<&'static str>,
}

impl SentimentAnalysisEngine {
    pub fn new() -> Self {
        Self {
            positive_words: POSITIVE_WORDS.iter().copied().collect(),
            negative_words: NEGATIVE_WORDS.iter().copied().collect(),
            negation_words: NEGATION_WORDS.iter().copied().collect(),
        }
    }

    /// Unnormalised lexicon score.
    fn analyze_text(&self, text: &str) -> i32 {
        let text_lower = text.to_lowercase();
        // Split into words, stripping common punctuation
        let words: Vec<&str> = text_lower
            .split(|c: char| {
                c.is_whitespace() || matches!(c, ',' | ';' | ':' | '.' | '!' | '?' | '"' | '(' | ')')
            })
            .filter(|w| !w.is_empty())
            .collect();

        let negation_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| self.negation_words.contains(*w))
            .map(|(i, _)| i)
            .collect();

        let mut score: i32 = 0;

        for (i, word) in words.iter().enumerate() {
            let is_positive = self.positive_words.contains(*word);
            let is_negative = self.negative_words.contains(*word);

            if !is_positive && !is_negative {
                continue;
            }

            let negated = negation_positions
                .iter()
                .any(|&neg_pos| neg_pos < i && (i - neg_pos) <= NEGATION_WINDOW);

            let polarity = if is_positive { 1 } else { -1 };
            score += if negated { -polarity } else { polarity };
        }

        score
    }
}

fn normalize(score: f64) -> f64 {
    if score == 0.0 {
        return 0.0;
    }
    (score / (score * score + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

impl SentimentScorer for SentimentAnalysisEngine {
    fn score(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        normalize(self.analyze_text(text) as f64)
    }
}

impl Default for SentimentAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
