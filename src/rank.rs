use crate::aggregate::SupplierGroups;
use crate::models::{Outcome, SupplierRecord, SupplierSummary};

/// Two decimals, exact halves go to the even neighbour (0.125 -> 0.12).
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

fn summarize_one(name: &str, records: &[SupplierRecord]) -> SupplierSummary {
    let n = records.len().max(1) as f64;
    let risk_sum: f64 = records.iter().map(|r| r.risk_score as f64).sum();
    let sentiment_sum: f64 = records.iter().map(|r| r.sentiment).sum();
    SupplierSummary {
        supplier_name: name.to_string(),
        avg_risk_score: round2(risk_sum / n),
        mention_count: records.len(),
        avg_sentiment: round2(sentiment_sum / n),
    }
}

/// One summary per supplier, ascending by average risk. Ties keep first-seen order.
pub fn summarize(groups: &SupplierGroups) -> Vec<SupplierSummary> {
    let mut out: Vec<SupplierSummary> = groups
        .iter()
        .filter(|(_, records)| !records.is_empty())
        .map(|(name, records)| summarize_one(name, records))
        .collect();
    // sort_by is stable
    out.sort_by(|a, b| a.avg_risk_score.total_cmp(&b.avg_risk_score));
    out
}

pub fn rank(groups: &SupplierGroups) -> Outcome {
    let summaries = summarize(groups);
    match summaries.first().cloned() {
        None => Outcome::NoSuppliers,
        Some(recommended) => Outcome::Ranked {
            summaries,
            recommended,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryScores;
    use pretty_assertions::assert_eq;

    fn rec(risk: u32, sentiment: f64) -> SupplierRecord {
        SupplierRecord {
            article_id: format!("a{risk}"),
            title: "t".into(),
            url: None,
            snippet: String::new(),
            risk_score: risk,
            sentiment,
            category_scores: CategoryScores::default(),
        }
    }

    fn groups(entries: Vec<(&str, Vec<u32>)>) -> SupplierGroups {
        let mut g = SupplierGroups::default();
        for (name, scores) in entries {
            for s in scores {
                g.push(name, rec(s, 0.0));
            }
        }
        g
    }

    #[test]
    fn averages_are_rounded_means() {
        let g = groups(vec![("Acme", vec![1, 2, 2])]);
        let s = summarize(&g);
        assert_eq!(s[0].avg_risk_score, 1.67);
        assert_eq!(s[0].mention_count, 3);
    }

    #[test]
    fn ascending_with_stable_ties() {
        let g = groups(vec![
            ("Zeta", vec![4]),
            ("Alpha", vec![9]),
            ("Mid", vec![2, 6]),
            ("Low", vec![1]),
        ]);
        let names: Vec<String> = summarize(&g).into_iter().map(|s| s.supplier_name).collect();
        assert_eq!(names, vec!["Low", "Zeta", "Mid", "Alpha"]);
    }

    #[test]
    fn recommended_is_first_after_sort() {
        let g = groups(vec![("B", vec![3]), ("A", vec![3]), ("C", vec![5])]);
        match rank(&g) {
            Outcome::Ranked { summaries, recommended } => {
                assert_eq!(recommended.supplier_name, "B");
                assert_eq!(summaries.len(), 3);
            }
            Outcome::NoSuppliers => panic!("expected ranked outcome"),
        }
    }

    #[test]
    fn empty_groups_mean_no_suppliers() {
        assert_eq!(rank(&SupplierGroups::default()), Outcome::NoSuppliers);
    }

    #[test]
    fn sentiment_average_is_rounded() {
        let mut g = SupplierGroups::default();
        g.push("Acme", rec(1, 0.12));
        g.push("Acme", rec(1, -0.5));
        assert_eq!(summarize(&g)[0].avg_sentiment, -0.19);
    }

    #[test]
    fn exact_halves_round_to_even() {
        let g = groups(vec![("Acme", vec![1, 0, 0, 0, 0, 0, 0, 0])]);
        assert_eq!(summarize(&g)[0].avg_risk_score, 0.12);

        let g = groups(vec![("Beta Co", vec![3, 0, 0, 0, 0, 0, 0, 0])]);
        assert_eq!(summarize(&g)[0].avg_risk_score, 0.38);
        assert_eq!(round2(-0.125), -0.12);
    }
}
