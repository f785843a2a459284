pub const ORG_EXTRACTION_SYSTEM: &str = "You are a named-entity recognizer. You only ever answer with strict JSON.";

pub fn user_org_extraction(article_text: &str) -> String {
    format!(r#"List every company or organization named in the text below.

Output JSON with:
{{
  "organizations": ["<name exactly as written in the text>", ...]
}}

CONSTRAINTS:
- Copy names verbatim; do not expand, translate or normalize them.
- Skip people, places, products and generic groups ("miners", "the government").
- Return {{"organizations": []}} when none are named.

TEXT:
<{text}>"#, text = article_text)
}
