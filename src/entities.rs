use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

use crate::budget::cap_to_tokens;
use crate::config::LlmConfig;
use crate::llm::{llm_call, strip_code_fences};
use crate::out_models::OrgExtraction;
use crate::prompts::{user_org_extraction, ORG_EXTRACTION_SYSTEM};

/// Text → organization names. Same input, same set; may be empty.
pub trait OrgExtractor: Send + Sync {
    fn extract_organizations(&self, text: &str) -> BTreeSet<String>;
}

/* ---------------------------- Rule-based --------------------------------- */

// One to four capitalized words followed by a corporate suffix, e.g. "Acme Mining Corp".
static ORG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:[A-Z][A-Za-z0-9&'\-]*\.?\s+){1,4}(?:Corporation|Corp|Incorporated|Inc|Limited|Ltd|LLC|PLC|plc|Group|Holdings|Mining|Minerals|Metals|Resources|Industries|Company|Co|AG|SA|NV|GmbH)\b\.?",
    )
    .unwrap()
});

// Words that start sentences or clauses but are never part of a name.
const LEADING_NOISE: &[&str] = &[
    "The", "A", "An", "In", "On", "At", "By", "For", "From", "With", "And", "Of", "To", "As", "But",
    "While", "After", "Before", "Says", "Report", "Reports", "Why", "How", "When",
];

/// Corporate-suffix patterns plus an optional gazetteer of known organizations.
pub struct HeuristicOrgExtractor {
    gazetteer: Vec<(String, Regex)>,
}

impl HeuristicOrgExtractor {
    pub fn new(known_organizations: &[String]) -> Self {
        let gazetteer = known_organizations
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .filter_map(|n| {
                let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(n))).ok()?;
                Some((n.to_string(), re))
            })
            .collect();
        Self { gazetteer }
    }
}

impl Default for HeuristicOrgExtractor {
    fn default() -> Self {
        Self::new(&[])
    }
}

fn clean_match(raw: &str) -> Option<String> {
    let mut words: Vec<&str> = raw.split_whitespace().collect();
    while words.len() > 1 && LEADING_NOISE.contains(&words[0]) {
        words.remove(0);
    }
    // a bare suffix ("Group", "Company") is not a name
    if words.len() < 2 {
        return None;
    }
    let name = words.join(" ");
    let name = name.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '"' | '(' | ')'));
    (!name.is_empty()).then(|| name.to_string())
}

impl OrgExtractor for HeuristicOrgExtractor {
    fn extract_organizations(&self, text: &str) -> BTreeSet<String> {
        let mut out: BTreeSet<String> = ORG_RE
            .find_iter(text)
            .filter_map(|m| clean_match(m.as_str()))
            .collect();
        for (name, re) in &self.gazetteer {
            if re.is_match(text) {
                out.insert(name.clone());
            }
        }
        out
    }
}

/* ------------------------------- LLM ------------------------------------- */

/// Answers computed ahead of time, keyed by the exact text that was asked about.
#[derive(Debug, Default, Clone)]
pub struct PrefetchedOrgs {
    answers: HashMap<String, BTreeSet<String>>,
}

impl PrefetchedOrgs {
    pub fn insert(&mut self, text: String, orgs: BTreeSet<String>) {
        self.answers.insert(text, orgs);
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl OrgExtractor for PrefetchedOrgs {
    fn extract_organizations(&self, text: &str) -> BTreeSet<String> {
        self.answers.get(text).cloned().unwrap_or_default()
    }
}

pub fn parse_org_answer(answer: &str) -> anyhow::Result<BTreeSet<String>> {
    let parsed: OrgExtraction = serde_json::from_str(strip_code_fences(answer))?;
    Ok(parsed
        .organizations
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

pub struct LlmOrgExtractor<'a> {
    client: &'a Client,
    cfg: &'a LlmConfig,
}

impl<'a> LlmOrgExtractor<'a> {
    pub fn new(client: &'a Client, cfg: &'a LlmConfig) -> Self {
        Self { client, cfg }
    }

    /// One call per distinct text, all in flight at once. Failures yield an empty set.
    pub async fn prefetch(&self, texts: &[String]) -> PrefetchedOrgs {
        let start = std::time::Instant::now();
        let distinct: BTreeSet<&String> = texts.iter().collect();

        let tasks = distinct.iter().map(|text| async move {
            let prompt = user_org_extraction(cap_to_tokens(text, self.cfg.max_prompt_tokens));
            let orgs = match llm_call(self.client, self.cfg, ORG_EXTRACTION_SYSTEM, &prompt).await {
                Ok(answer) => parse_org_answer(&answer).unwrap_or_else(|e| {
                    warn!("Unparsable organization answer - error={}", e);
                    BTreeSet::new()
                }),
                Err(e) => {
                    warn!("Organization extraction failed - error={:#}", e);
                    BTreeSet::new()
                }
            };
            debug!("Organizations extracted - count={}", orgs.len());
            ((*text).clone(), orgs)
        });
        let results = futures::future::join_all(tasks).await;

        let mut prefetched = PrefetchedOrgs::default();
        for (text, orgs) in results {
            prefetched.insert(text, orgs);
        }
        info!(
            "LLM extraction completed - duration={:.2}s, texts={}",
            start.elapsed().as_secs_f32(),
            prefetched.len()
        );
        prefetched
    }
}
