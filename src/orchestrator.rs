use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::aggregate::{aggregate_suppliers, extraction_text};
use crate::config::{AppConfig, ExtractorMode};
use crate::entities::{HeuristicOrgExtractor, LlmOrgExtractor, OrgExtractor};
use crate::fetch::{enrich_articles, normalize_articles, search_articles};
use crate::models::{Article, Outcome, QueryReport};
use crate::rank::rank;
use crate::scoring::{LexiconSentiment, SentimentAnalyzer, TextScorer};
use crate::taxonomy::Taxonomy;

#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub enrich: bool,
    pub extractor: ExtractorMode,
}

/// Scores, groups and ranks already-fetched articles. No I/O.
pub fn analyze_articles(
    material: &str,
    query: &str,
    articles: &[Article],
    search_error: Option<String>,
    scorer: &TextScorer<'_>,
    extractor: &dyn OrgExtractor,
) -> QueryReport {
    let groups = aggregate_suppliers(articles, scorer, extractor);
    let outcome = rank(&groups);

    match &outcome {
        Outcome::NoSuppliers => warn!("No suppliers found - material={}, articles={}", material, articles.len()),
        Outcome::Ranked { summaries, recommended } => info!(
            "Ranking completed - suppliers={}, recommended={:?}, avg_risk={:.2}",
            summaries.len(),
            recommended.supplier_name,
            recommended.avg_risk_score
        ),
    }

    QueryReport {
        material: material.trim().to_string(),
        query: query.to_string(),
        generated_at: chrono::Utc::now(),
        articles_found: articles.len(),
        search_error,
        outcome,
        details: groups.into_details(),
    }
}

/// Holds what stays fixed between queries: config, taxonomy, HTTP client, default extractor.
pub struct Pipeline {
    cfg: AppConfig,
    taxonomy: Taxonomy,
    sentiment: LexiconSentiment,
    heuristic: HeuristicOrgExtractor,
    client: Client,
}

impl Pipeline {
    pub fn new(cfg: AppConfig) -> Result<Self> {
        let taxonomy = cfg.build_taxonomy()?;
        let heuristic = HeuristicOrgExtractor::new(&cfg.extraction.known_organizations);
        let client = Client::builder().build().context("building HTTP client")?;
        Ok(Self {
            cfg,
            taxonomy,
            sentiment: LexiconSentiment,
            heuristic,
            client,
        })
    }

    /// One material, end to end. Failures degrade to fewer or no results.
    pub async fn run_query(&self, material: &str, opts: &QueryOptions) -> QueryReport {
        let pipeline_start = std::time::Instant::now();
        let query = self.cfg.search.render_query(material);
        info!("Query started - material={:?}, query={:?}", material.trim(), query);

        // 1) search
        let (articles, search_error) = match search_articles(&self.client, &self.cfg.search, &query).await {
            Ok(a) => (a, None),
            Err(e) => {
                error!("Search failed - error={:#}", e);
                (Vec::new(), Some(format!("{:#}", e)))
            }
        };
        let mut articles = normalize_articles(articles);

        // 2) enrichment
        if opts.enrich && self.cfg.enrichment.enabled && !articles.is_empty() {
            articles = enrich_articles(&self.client, articles, &self.cfg.enrichment).await;
        } else {
            debug!("Enrichment disabled or nothing to enrich");
        }

        // 3) score / extract / aggregate / rank
        let sentiment: &dyn SentimentAnalyzer = &self.sentiment;
        let scorer = TextScorer::new(&self.taxonomy, sentiment);

        let report = match (opts.extractor, self.cfg.extraction.llm.as_ref()) {
            (ExtractorMode::Llm, Some(llm_cfg)) if !articles.is_empty() => {
                let texts: Vec<String> = articles.iter().map(extraction_text).collect();
                let prefetched = LlmOrgExtractor::new(&self.client, llm_cfg).prefetch(&texts).await;
                analyze_articles(material, &query, &articles, search_error, &scorer, &prefetched)
            }
            (ExtractorMode::Llm, None) => {
                warn!("LLM extraction requested without extraction.llm config; using heuristic extractor");
                analyze_articles(material, &query, &articles, search_error, &scorer, &self.heuristic)
            }
            _ => analyze_articles(material, &query, &articles, search_error, &scorer, &self.heuristic),
        };

        info!(
            "Query completed - total_duration={:.2}s, articles={}, suppliers={}",
            pipeline_start.elapsed().as_secs_f32(),
            report.articles_found,
            report.outcome.summaries().len()
        );
        report
    }
}

fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(path: P, value: &T) -> Result<()> {
    std::fs::write(path, serde_json::to_vec_pretty(value)?)
        .map(|_| ())
        .map_err(|e| e.into())
}

pub fn material_slug(material: &str) -> String {
    let mut slug = String::new();
    for c in material.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "material".to_string()
    } else {
        slug.to_string()
    }
}

/// Writes `<dir>/<YYYY-MM-DD>/<slug>.report.{json,md}` and returns the date directory.
pub fn persist_report(output_dir: &Path, report: &QueryReport, markdown: &str) -> Result<PathBuf> {
    let date_dir = output_dir.join(report.generated_at.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&date_dir).with_context(|| format!("create {:?}", date_dir))?;

    let slug = material_slug(&report.material);
    write_json(date_dir.join(format!("{}.report.json", slug)), report)?;
    debug!("Wrote {}.report.json", slug);
    std::fs::write(date_dir.join(format!("{}.report.md", slug)), markdown.as_bytes())?;
    debug!("Wrote {}.report.md", slug);

    info!("Output persisted - directory={}", date_dir.display());
    Ok(date_dir)
}
