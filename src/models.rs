use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: String, // xxh3 of "url|title"
    pub title: String,
    pub url: Option<String>,
    pub snippet: String,
    #[serde(default)]
    pub body_text: String, // empty when enrichment is off or failed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Labor,
    Environment,
    Governance,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 3] = [
        RiskCategory::Labor,
        RiskCategory::Environment,
        RiskCategory::Governance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Labor => "labor",
            RiskCategory::Environment => "environment",
            RiskCategory::Governance => "governance",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted keyword hits per category. All three categories are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub labor: u32,
    pub environment: u32,
    pub governance: u32,
}

impl CategoryScores {
    pub fn get(&self, cat: RiskCategory) -> u32 {
        match cat {
            RiskCategory::Labor => self.labor,
            RiskCategory::Environment => self.environment,
            RiskCategory::Governance => self.governance,
        }
    }

    pub fn add(&mut self, cat: RiskCategory, weight: u32) {
        match cat {
            RiskCategory::Labor => self.labor += weight,
            RiskCategory::Environment => self.environment += weight,
            RiskCategory::Governance => self.governance += weight,
        }
    }

    pub fn total(&self) -> u32 {
        self.labor + self.environment + self.governance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArticleScore {
    pub total_score: u32,
    pub category_scores: CategoryScores,
    pub sentiment: f64, // [-1.0, 1.0], unrounded
}

/// One (organization, article) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierRecord {
    pub article_id: String,
    pub title: String,
    pub url: Option<String>,
    pub snippet: String,
    pub risk_score: u32,
    pub sentiment: f64,
    pub category_scores: CategoryScores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierSummary {
    pub supplier_name: String,
    pub avg_risk_score: f64, // rounded to 2 decimals
    pub mention_count: usize,
    pub avg_sentiment: f64, // rounded to 2 decimals
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    NoSuppliers,
    Ranked {
        summaries: Vec<SupplierSummary>,
        recommended: SupplierSummary,
    },
}

impl Outcome {
    pub fn recommended(&self) -> Option<&SupplierSummary> {
        match self {
            Outcome::NoSuppliers => None,
            Outcome::Ranked { recommended, .. } => Some(recommended),
        }
    }

    pub fn summaries(&self) -> &[SupplierSummary] {
        match self {
            Outcome::NoSuppliers => &[],
            Outcome::Ranked { summaries, .. } => summaries,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierDetail {
    pub supplier_name: String,
    pub records: Vec<SupplierRecord>,
}

/// Everything produced for one material query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryReport {
    pub material: String,
    pub query: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub articles_found: usize,
    pub search_error: Option<String>,
    pub outcome: Outcome,
    pub details: Vec<SupplierDetail>, // first-appearance order
}
