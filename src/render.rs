// src/render.rs
use itertools::Itertools;

use crate::models::{Outcome, QueryReport, RiskCategory, SupplierDetail, SupplierRecord};

fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

fn category_breakdown(r: &SupplierRecord) -> String {
    RiskCategory::ALL
        .iter()
        .map(|c| format!("{} {}", c, r.category_scores.get(*c)))
        .join(", ")
}

pub fn render_details(details: &[SupplierDetail]) -> String {
    let mut out = String::new();
    out.push_str("## Article Details\n");
    for d in details {
        out.push_str(&format!("\n### {}\n", cell(&d.supplier_name)));
        for r in &d.records {
            let title = if r.title.is_empty() { "(untitled)" } else { r.title.as_str() };
            match r.url.as_deref() {
                Some(u) => out.push_str(&format!("- [{}]({})", title, u)),
                None => out.push_str(&format!("- {}", title)),
            }
            out.push_str(&format!(
                ": risk {} ({}), sentiment {:.2}\n",
                r.risk_score,
                category_breakdown(r),
                r.sentiment
            ));
        }
    }
    out
}

pub fn render_report_markdown(report: &QueryReport, with_details: bool) -> String {
    let mut md = String::new();
    md.push_str(&format!("# ESG Supplier Finder: {}\n\n", report.material.trim()));
    md.push_str(&format!(
        "_Query: \"{}\" | articles: {} | generated: {}_\n\n",
        report.query,
        report.articles_found,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if let Some(err) = &report.search_error {
        md.push_str(&format!("**Search failed:** {}\n\n", err));
    }

    match &report.outcome {
        Outcome::NoSuppliers => {
            md.push_str("**No suppliers found.**\n");
        }
        Outcome::Ranked {
            summaries,
            recommended,
        } => {
            md.push_str("## Supplier Risk Summary\n");
            md.push_str("| Supplier | Avg Risk Score | Mentions | Avg Sentiment |\n");
            md.push_str("|---|---:|---:|---:|\n");
            for s in summaries {
                md.push_str(&format!(
                    "| {} | {:.2} | {} | {:.2} |\n",
                    cell(&s.supplier_name),
                    s.avg_risk_score,
                    s.mention_count,
                    s.avg_sentiment
                ));
            }
            md.push('\n');

            md.push_str(&format!("## Recommended Supplier: {}\n", cell(&recommended.supplier_name)));
            md.push_str(&format!("- Avg Risk Score: {:.2}\n", recommended.avg_risk_score));
            md.push_str(&format!("- Mentions: {}\n", recommended.mention_count));

            if with_details && !report.details.is_empty() {
                md.push('\n');
                md.push_str(&render_details(&report.details));
            }
        }
    }

    md
}
