use esg_supplier_finder::aggregate::{aggregate_suppliers, SupplierGroups};
use esg_supplier_finder::entities::{HeuristicOrgExtractor, OrgExtractor};
use esg_supplier_finder::fetch::make_article_id;
use esg_supplier_finder::models::{Article, CategoryScores, Outcome, SupplierRecord};
use esg_supplier_finder::orchestrator::analyze_articles;
use esg_supplier_finder::rank::{rank, round2, summarize};
use esg_supplier_finder::render::render_report_markdown;
use esg_supplier_finder::scoring::{keyword_scores, normalize_text, LexiconSentiment, SentimentAnalyzer, TextScorer};
use esg_supplier_finder::taxonomy::Taxonomy;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Organizations come from a "[org: A; B]" tag in the title.
struct TaggedExtractor;

impl OrgExtractor for TaggedExtractor {
    fn extract_organizations(&self, text: &str) -> BTreeSet<String> {
        let Some(start) = text.find("[org:") else {
            return BTreeSet::new();
        };
        let rest = &text[start + 5..];
        let end = rest.find(']').unwrap_or(rest.len());
        rest[..end]
            .split(';')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Constant polarity, to keep sentiment out of the way.
struct FixedSentiment(f64);

impl SentimentAnalyzer for FixedSentiment {
    fn polarity(&self, _text: &str) -> f64 {
        self.0
    }
}

fn article(title: &str, snippet: &str) -> Article {
    Article {
        id: make_article_id(None, title),
        title: title.to_string(),
        url: None,
        snippet: snippet.to_string(),
        body_text: String::new(),
    }
}

#[test]
fn cobalt_scenario() {
    let sentiment = FixedSentiment(-0.2);
    let scorer = TextScorer::new(Taxonomy::default_esg(), &sentiment);
    let articles = vec![
        article("[org: Acme] Cobalt mines", "Reports of child labor near the pits"),
        article("[org: Acme; Beta Co] Refinery", "Pollution downstream and a fraud probe"),
    ];
    let report = analyze_articles("cobalt", "cobalt ESG", &articles, None, &scorer, &TaggedExtractor);

    let Outcome::Ranked { summaries, recommended } = &report.outcome else {
        panic!("expected ranked outcome");
    };
    let rows: Vec<(&str, f64, usize)> = summaries
        .iter()
        .map(|s| (s.supplier_name.as_str(), s.avg_risk_score, s.mention_count))
        .collect();
    assert_eq!(rows, vec![("Acme", 4.0, 2), ("Beta Co", 5.0, 1)]);
    assert_eq!(recommended.supplier_name, "Acme");
    assert_eq!(report.articles_found, 2);
    assert_eq!(report.details[0].records.len(), 2);

    let md = render_report_markdown(&report, false);
    assert!(md.contains("## Recommended Supplier: Acme"));
}

#[test]
fn zero_articles_is_no_suppliers() {
    let scorer = TextScorer::new(Taxonomy::default_esg(), &LexiconSentiment);
    let report = analyze_articles("cobalt", "q", &[], None, &scorer, &TaggedExtractor);
    assert_eq!(report.outcome, Outcome::NoSuppliers);
    assert!(report.outcome.summaries().is_empty());
    assert!(render_report_markdown(&report, false).contains("No suppliers found"));
}

#[test]
fn article_without_orgs_adds_no_mentions() {
    let scorer = TextScorer::new(Taxonomy::default_esg(), &LexiconSentiment);
    let articles = vec![
        article("[org: Acme] one", "fraud"),
        article("untagged", "child labor and fraud"),
    ];
    let groups = aggregate_suppliers(&articles, &scorer, &TaggedExtractor);
    let summaries = summarize(&groups);
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].mention_count, 1);
    assert_eq!(summaries[0].avg_risk_score, 3.0);
}

#[test]
fn heuristic_extractor_end_to_end() {
    let scorer = TextScorer::new(Taxonomy::default_esg(), &LexiconSentiment);
    let extractor = HeuristicOrgExtractor::new(&["Glencore".to_string()]);
    let articles = vec![
        article("Acme Mining Corp accused of child labor", "Glencore named in lawsuit"),
        article("Glencore expands recycling", "No incidents reported"),
    ];
    let report = analyze_articles("cobalt", "q", &articles, None, &scorer, &extractor);
    let names: Vec<&str> = report
        .outcome
        .summaries()
        .iter()
        .map(|s| s.supplier_name.as_str())
        .collect();
    // Glencore: (6 + 0) / 2 = 3.0, Acme: 6
    assert_eq!(names, vec!["Glencore", "Acme Mining Corp"]);
    assert_eq!(report.outcome.summaries()[0].avg_risk_score, 3.0);
}

const KEYWORDS: &[&str] = &[
    "child labor", "forced labor", "unsafe working", "wage theft", "pollution", "deforestation",
    "carbon emissions", "toxic", "corruption", "fraud", "lawsuit", "sanctions",
];

fn filler() -> impl Strategy<Value = String> {
    // letters that never spell a keyword fragment on their own
    proptest::string::string_regex("[ bdhjkmqvxyz ]{0,40}").unwrap()
}

proptest! {
    #[test]
    fn no_keywords_scores_zero(text in filler()) {
        let s = keyword_scores(Taxonomy::default_esg(), &text);
        prop_assert_eq!(s.total(), 0);
        prop_assert_eq!(s.labor, 0);
        prop_assert_eq!(s.environment, 0);
        prop_assert_eq!(s.governance, 0);
    }

    #[test]
    fn total_equals_category_sum(picks in proptest::collection::vec(0..KEYWORDS.len(), 0..8), pad in filler()) {
        let text = picks.iter().map(|&i| KEYWORDS[i]).collect::<Vec<_>>().join(format!(" {} ", pad).as_str());
        let scorer = TextScorer::new(Taxonomy::default_esg(), &LexiconSentiment);
        let s = scorer.score(&normalize_text(&text, "", ""));
        let c = s.category_scores;
        prop_assert_eq!(s.total_score, c.labor + c.environment + c.governance);
        prop_assert!((-1.0..=1.0).contains(&s.sentiment));
    }

    #[test]
    fn repeating_a_matched_keyword_is_idempotent(i in 0..KEYWORDS.len(), times in 1usize..5) {
        let once = keyword_scores(Taxonomy::default_esg(), KEYWORDS[i]);
        let many = keyword_scores(Taxonomy::default_esg(), &vec![KEYWORDS[i]; times + 1].join(" and "));
        prop_assert_eq!(once, many);
    }

    #[test]
    fn averages_match_rounded_mean(scores in proptest::collection::vec(0u32..30, 1..10)) {
        let mut groups = SupplierGroups::default();
        for (i, s) in scores.iter().enumerate() {
            groups.push("Acme", SupplierRecord {
                article_id: format!("a{i}"),
                title: String::new(),
                url: None,
                snippet: String::new(),
                risk_score: *s,
                sentiment: 0.0,
                category_scores: CategoryScores::default(),
            });
        }
        let summary = &summarize(&groups)[0];
        let mean = scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64;
        prop_assert_eq!(summary.avg_risk_score, round2(mean));
        prop_assert_eq!(summary.mention_count, scores.len());
    }

    #[test]
    fn summary_values_ignore_article_order(seed in any::<u64>()) {
        let scorer = TextScorer::new(Taxonomy::default_esg(), &LexiconSentiment);
        let mut articles = vec![
            article("[org: Acme] a", "child labor"),
            article("[org: Acme; Beta Co] b", "pollution and fraud"),
            article("[org: Gamma] c", "toxic"),
            article("[org: Beta Co] d", "sanctions"),
        ];
        let baseline = {
            let mut v = summarize(&aggregate_suppliers(&articles, &scorer, &TaggedExtractor));
            v.sort_by(|a, b| a.supplier_name.cmp(&b.supplier_name));
            v
        };
        // deterministic shuffle from the seed
        let n = articles.len();
        let mut state = seed;
        for i in (1..n).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = (state >> 33) as usize % (i + 1);
            articles.swap(i, j);
        }
        let mut shuffled = summarize(&aggregate_suppliers(&articles, &scorer, &TaggedExtractor));
        shuffled.sort_by(|a, b| a.supplier_name.cmp(&b.supplier_name));
        prop_assert_eq!(baseline, shuffled);
    }

    #[test]
    fn ranking_is_deterministic_for_fixed_input(_x in 0u8..4) {
        let scorer = TextScorer::new(Taxonomy::default_esg(), &LexiconSentiment);
        let articles = vec![
            article("[org: Beta Co] x", "fraud"),
            article("[org: Acme] y", "lawsuit"),
        ];
        let first = rank(&aggregate_suppliers(&articles, &scorer, &TaggedExtractor));
        let second = rank(&aggregate_suppliers(&articles, &scorer, &TaggedExtractor));
        prop_assert_eq!(first.recommended().map(|s| s.supplier_name.clone()), Some("Beta Co".to_string()));
        prop_assert_eq!(first, second);
    }
}
