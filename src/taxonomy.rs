use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::models::RiskCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: RiskCategory,
    pub weight: u32,
    pub keywords: Vec<String>, // lower-case phrases
}

/// Category → weight + keyword phrases. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Taxonomy {
    rules: Vec<CategoryRule>,
}

static DEFAULT_ESG: Lazy<Taxonomy> = Lazy::new(|| {
    let rule = |category, weight, kws: &[&str]| CategoryRule {
        category,
        weight,
        keywords: kws.iter().map(|s| s.to_string()).collect(),
    };
    Taxonomy {
        rules: vec![
            rule(
                RiskCategory::Labor,
                3,
                &["child labor", "forced labor", "unsafe working", "wage theft"],
            ),
            rule(
                RiskCategory::Environment,
                2,
                &["pollution", "deforestation", "carbon emissions", "toxic"],
            ),
            rule(
                RiskCategory::Governance,
                3,
                &["corruption", "fraud", "lawsuit", "sanctions"],
            ),
        ],
    }
});

impl Taxonomy {
    pub fn default_esg() -> &'static Taxonomy {
        &DEFAULT_ESG
    }

    /// Builds a taxonomy from configured rules. Keywords are lower-cased and blank ones dropped.
    pub fn from_rules(rules: Vec<CategoryRule>) -> Result<Self> {
        let mut seen = Vec::new();
        let mut out = Vec::with_capacity(rules.len());
        for mut r in rules {
            if seen.contains(&r.category) {
                bail!("taxonomy lists category '{}' more than once", r.category);
            }
            seen.push(r.category);
            r.keywords = r
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            out.push(r);
        }
        // keep a stable category order regardless of how the file lists them
        out.sort_by_key(|r| r.category);
        Ok(Self { rules: out })
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn weight(&self, cat: RiskCategory) -> u32 {
        self.rules
            .iter()
            .find(|r| r.category == cat)
            .map(|r| r.weight)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights() {
        let t = Taxonomy::default_esg();
        assert_eq!(t.weight(RiskCategory::Labor), 3);
        assert_eq!(t.weight(RiskCategory::Environment), 2);
        assert_eq!(t.weight(RiskCategory::Governance), 3);
        assert!(t.rules().iter().all(|r| r.keywords.len() == 4));
    }

    #[test]
    fn configured_rules_are_lowercased_and_sorted() {
        let t = Taxonomy::from_rules(vec![
            CategoryRule {
                category: RiskCategory::Governance,
                weight: 5,
                keywords: vec!["Bribery ".into(), "  ".into()],
            },
            CategoryRule {
                category: RiskCategory::Labor,
                weight: 1,
                keywords: vec!["Strike".into()],
            },
        ])
        .unwrap();
        assert_eq!(t.rules()[0].category, RiskCategory::Labor);
        assert_eq!(t.rules()[1].keywords, vec!["bribery".to_string()]);
        assert_eq!(t.weight(RiskCategory::Environment), 0);
    }

    #[test]
    fn duplicate_category_rejected() {
        let r = CategoryRule {
            category: RiskCategory::Labor,
            weight: 1,
            keywords: vec![],
        };
        assert!(Taxonomy::from_rules(vec![r.clone(), r]).is_err());
    }
}
