use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use crate::entities::OrgExtractor;
use crate::models::{Article, ArticleScore, SupplierDetail, SupplierRecord};
use crate::scoring::{normalize_text, TextScorer};

/// Supplier name → records, remembering the order suppliers were first seen in.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SupplierGroups {
    order: Vec<String>,
    records: HashMap<String, Vec<SupplierRecord>>,
}

impl SupplierGroups {
    pub fn push(&mut self, supplier: &str, record: SupplierRecord) {
        match self.records.get_mut(supplier) {
            Some(list) => list.push(record),
            None => {
                self.order.push(supplier.to_string());
                self.records.insert(supplier.to_string(), vec![record]);
            }
        }
    }

    pub fn get(&self, supplier: &str) -> Option<&[SupplierRecord]> {
        self.records.get(supplier).map(|v| v.as_slice())
    }

    /// First-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SupplierRecord])> + '_ {
        self.order
            .iter()
            .map(move |name| (name.as_str(), self.records[name].as_slice()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_details(mut self) -> Vec<SupplierDetail> {
        self.order
            .into_iter()
            .map(|name| {
                let records = self.records.remove(&name).unwrap_or_default();
                SupplierDetail { supplier_name: name, records }
            })
            .collect()
    }
}

/// Original-case text handed to the extractor: title, snippet and body, whitespace collapsed.
pub fn extraction_text(a: &Article) -> String {
    [a.title.as_str(), a.snippet.as_str(), a.body_text.as_str()]
        .iter()
        .flat_map(|s| s.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-cased text handed to the scorer.
pub fn scoring_text(a: &Article) -> String {
    normalize_text(&a.title, &a.snippet, &a.body_text)
}

fn record_for(a: &Article, score: &ArticleScore) -> SupplierRecord {
    SupplierRecord {
        article_id: a.id.clone(),
        title: a.title.clone(),
        url: a.url.clone(),
        snippet: a.snippet.clone(),
        risk_score: score.total_score,
        sentiment: score.sentiment,
        category_scores: score.category_scores,
    }
}

/// Fan-out join: every organization found in an article gets that article's score.
/// Articles with no organizations contribute nothing.
pub fn aggregate_suppliers(
    articles: &[Article],
    scorer: &TextScorer<'_>,
    extractor: &dyn OrgExtractor,
) -> SupplierGroups {
    let start = std::time::Instant::now();

    // per-article work is independent; collect() keeps article order
    let scored: Vec<Option<(ArticleScore, BTreeSet<String>)>> = articles
        .par_iter()
        .map(|a| {
            let orgs = extractor.extract_organizations(&extraction_text(a));
            if orgs.is_empty() {
                debug!("No organizations - article={}, title={:?}", a.id, a.title);
                return None;
            }
            Some((scorer.score(&scoring_text(a)), orgs))
        })
        .collect();

    let mut groups = SupplierGroups::default();
    let mut skipped = 0usize;
    for (a, entry) in articles.iter().zip(scored) {
        let Some((score, orgs)) = entry else {
            skipped += 1;
            continue;
        };
        for org in &orgs {
            groups.push(org, record_for(a, &score));
        }
    }

    info!(
        "Aggregation completed - duration={:.3}s, articles={}, skipped={}, suppliers={}",
        start.elapsed().as_secs_f32(),
        articles.len(),
        skipped,
        groups.len()
    );
    groups
}
