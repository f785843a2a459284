use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

use crate::models::{ArticleScore, CategoryScores};
use crate::taxonomy::Taxonomy;

/// Text → polarity in [-1.0, 1.0].
pub trait SentimentAnalyzer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

/// Joins the non-empty parts, NFC-normalizes, lower-cases and collapses whitespace.
pub fn normalize_text(title: &str, snippet: &str, body: &str) -> String {
    let joined = [title, snippet, body]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    joined
        .nfc()
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Presence test per keyword phrase: a phrase counts its category weight once,
/// however often it occurs. `text` must already be lower-cased.
pub fn keyword_scores(taxonomy: &Taxonomy, text: &str) -> CategoryScores {
    let mut scores = CategoryScores::default();
    for rule in taxonomy.rules() {
        for kw in &rule.keywords {
            if text.contains(kw.as_str()) {
                scores.add(rule.category, rule.weight);
            }
        }
    }
    scores
}

pub struct TextScorer<'a> {
    taxonomy: &'a Taxonomy,
    sentiment: &'a dyn SentimentAnalyzer,
}

impl<'a> TextScorer<'a> {
    pub fn new(taxonomy: &'a Taxonomy, sentiment: &'a dyn SentimentAnalyzer) -> Self {
        Self { taxonomy, sentiment }
    }

    pub fn score(&self, text: &str) -> ArticleScore {
        let category_scores = keyword_scores(self.taxonomy, text);
        ArticleScore {
            total_score: category_scores.total(),
            category_scores,
            sentiment: self.sentiment.polarity(text),
        }
    }
}

/* ------------------------------ Lexicon ---------------------------------- */

static POLARITY: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    let entries: &[(&str, f64)] = &[
        // positive
        ("good", 0.7),
        ("great", 0.8),
        ("excellent", 1.0),
        ("best", 1.0),
        ("better", 0.5),
        ("positive", 0.23),
        ("ethical", 0.5),
        ("responsible", 0.2),
        ("responsibly", 0.2),
        ("sustainable", 0.5),
        ("sustainably", 0.5),
        ("safe", 0.5),
        ("safer", 0.5),
        ("clean", 0.37),
        ("cleaner", 0.37),
        ("fair", 0.7),
        ("transparent", 0.3),
        ("transparency", 0.3),
        ("improve", 0.4),
        ("improved", 0.5),
        ("improvement", 0.4),
        ("success", 0.3),
        ("successful", 0.75),
        ("strong", 0.43),
        ("benefit", 0.4),
        ("benefits", 0.4),
        ("progress", 0.4),
        ("award", 0.5),
        ("certified", 0.4),
        ("compliant", 0.3),
        ("leading", 0.3),
        ("renewable", 0.3),
        ("secure", 0.4),
        ("trusted", 0.5),
        ("commitment", 0.2),
        ("committed", 0.2),
        ("support", 0.2),
        ("protect", 0.3),
        ("traceable", 0.3),
        // negative
        ("bad", -0.7),
        ("poor", -0.4),
        ("worse", -0.4),
        ("worst", -1.0),
        ("negative", -0.3),
        ("illegal", -0.5),
        ("unsafe", -0.5),
        ("dangerous", -0.6),
        ("hazardous", -0.6),
        ("deadly", -0.8),
        ("toxic", -0.5),
        ("abuse", -0.6),
        ("abuses", -0.6),
        ("exploitation", -0.6),
        ("exploited", -0.6),
        ("violation", -0.5),
        ("violations", -0.5),
        ("crisis", -0.5),
        ("scandal", -0.6),
        ("risk", -0.3),
        ("risks", -0.3),
        ("risky", -0.4),
        ("harm", -0.5),
        ("harmful", -0.6),
        ("corrupt", -0.7),
        ("fraud", -0.7),
        ("failed", -0.5),
        ("failure", -0.5),
        ("death", -0.6),
        ("deaths", -0.6),
        ("killed", -0.7),
        ("contaminated", -0.6),
        ("polluted", -0.6),
        ("protest", -0.2),
        ("protests", -0.2),
        ("concern", -0.2),
        ("concerns", -0.2),
        ("controversy", -0.4),
        ("controversial", -0.4),
        ("accused", -0.4),
        ("alleged", -0.2),
        ("fined", -0.4),
        ("banned", -0.4),
        ("severe", -0.5),
    ];
    entries.iter().copied().collect()
});

const INTENSIFIERS: &[&str] = &["very", "extremely", "highly", "deeply", "severely"];
const NEGATORS: &[&str] = &["not", "no", "never", "without", "cannot", "dont", "nor"];

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9]+(?:['’][a-z]+)?").unwrap());

fn is_negator(t: &str) -> bool {
    NEGATORS.contains(&t) || t.ends_with("n't") || t.ends_with("n’t")
}

/// Averaged word polarity with light intensifier and negation handling.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconSentiment;

impl SentimentAnalyzer for LexiconSentiment {
    fn polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = TOKEN_RE.find_iter(&lowered).map(|m| m.as_str()).collect();

        let mut hits = Vec::new();
        for (i, tok) in tokens.iter().enumerate() {
            let Some(&base) = POLARITY.get(tok) else {
                continue;
            };
            let mut p = base;
            if i >= 1 && INTENSIFIERS.contains(&tokens[i - 1]) {
                p *= 1.3;
            }
            let window = &tokens[i.saturating_sub(2)..i];
            if window.iter().any(|t| is_negator(t)) {
                p *= -0.5;
            }
            hits.push(p);
        }

        if hits.is_empty() {
            return 0.0;
        }
        (hits.iter().sum::<f64>() / hits.len() as f64).clamp(-1.0, 1.0)
    }
}
