use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::taxonomy::{CategoryRule, Taxonomy};

const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
const DEFAULT_QUERY_TEMPLATE: &str = "{material} ESG supplier human rights environment";
const DEFAULT_USER_AGENT: &str = concat!("esg-supplier-finder/", env!("CARGO_PKG_VERSION"));

// Custom Search returns at most 10 items per request
const MAX_SEARCH_RESULTS: u8 = 10;

pub const ENV_CONFIG: &str = "ESG_CONFIG";
pub const ENV_CONFIG_DIR: &str = "ESG_CONFIG_DIR";
pub const ENV_SEARCH_API_KEY: &str = "ESG_SEARCH_API_KEY";
pub const ENV_SEARCH_CX: &str = "ESG_SEARCH_CX";
pub const ENV_LLM_API_KEY: &str = "ESG_LLM_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub enrichment: EnrichmentConfig,
    pub extraction: ExtractionConfig,
    pub taxonomy: Option<Vec<CategoryRule>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub cx: Option<String>, // search-scope (engine) id
    pub num_results: u8,
    pub timeout_secs: u64,
    pub query_template: String, // "{material}" is substituted
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            api_key: None,
            cx: None,
            num_results: 5,
            timeout_secs: 5,
            query_template: DEFAULT_QUERY_TEMPLATE.to_string(),
        }
    }
}

impl SearchConfig {
    pub fn render_query(&self, material: &str) -> String {
        let material = material.trim();
        if self.query_template.contains("{material}") {
            self.query_template.replace("{material}", material)
        } else {
            format!("{} {}", material, self.query_template.trim())
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorMode {
    #[default]
    Heuristic,
    Llm,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub mode: ExtractorMode,
    pub known_organizations: Vec<String>,
    pub llm: Option<LlmConfig>,
}

/// OpenAI-compatible chat endpoint used for organization extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_base: String, // e.g. "http://localhost:5001/v1"
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_prompt_tokens")]
    pub max_prompt_tokens: usize,
}

fn default_llm_timeout() -> u64 {
    30
}

fn default_max_prompt_tokens() -> usize {
    2_000
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.search.num_results == 0 || self.search.num_results > MAX_SEARCH_RESULTS {
            bail!(
                "search.num_results must be between 1 and {} (got {})",
                MAX_SEARCH_RESULTS,
                self.search.num_results
            );
        }
        if self.search.timeout_secs == 0 || self.enrichment.timeout_secs == 0 {
            bail!("timeouts must be at least one second");
        }
        Ok(())
    }

    pub fn build_taxonomy(&self) -> Result<Taxonomy> {
        match &self.taxonomy {
            Some(rules) => Taxonomy::from_rules(rules.clone()).context("invalid taxonomy section"),
            None => Ok(Taxonomy::default_esg().clone()),
        }
    }

    /// Secrets from the environment win over whatever the file says.
    pub fn apply_secret_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty(ENV_SEARCH_API_KEY) {
            self.search.api_key = Some(v);
        }
        if let Some(v) = non_empty(ENV_SEARCH_CX) {
            self.search.cx = Some(v);
        }
        if let Some(v) = non_empty(ENV_LLM_API_KEY) {
            if let Some(llm) = self.extraction.llm.as_mut() {
                llm.api_key = Some(v);
            }
        }
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: AppConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(cfg)
}

/// Config file location: explicit path > ESG_CONFIG > <ESG_CONFIG_DIR or ./.esg>/config.yaml.
/// The boolean says whether the location was asked for explicitly (a missing file is then an error).
pub fn resolve_config_path(cli: Option<&str>) -> (PathBuf, bool) {
    if let Some(p) = cli {
        return (PathBuf::from(p), true);
    }
    if let Ok(p) = std::env::var(ENV_CONFIG) {
        return (PathBuf::from(p), true);
    }
    let base_dir = std::env::var(ENV_CONFIG_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".esg"));
    (base_dir.join("config.yaml"), false)
}
