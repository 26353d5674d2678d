//! X-ray query generation: turns a SearchSpec into site-restricted boolean
//! search strings, plus the URL canonicalization used as the profile dedup key.

use serde::{Deserialize, Serialize};

use crate::models::SearchSpec;

/// A compiled search string ready to hand to a web search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub query_type: String,
    pub label: String,
    pub query_text: String,
}

/// Canonicalize a LinkedIn profile URL into the dedup key: trim, lowercase,
/// drop the query string and fragment, drop one trailing slash. Nothing more
/// (no scheme/host rewriting, no percent-decoding). Idempotent.
pub fn normalize_linkedin_url(url: &str) -> String {
    let mut cleaned = url.trim().to_lowercase();
    if let Some(idx) = cleaned.find('?') {
        cleaned.truncate(idx);
    }
    if let Some(idx) = cleaned.find('#') {
        cleaned.truncate(idx);
    }
    if cleaned.ends_with('/') {
        cleaned.pop();
    }
    cleaned
}

/// Compile a spec into its query set. Always returns exactly two entries,
/// primary first. Empty filter groups contribute nothing; with every group
/// empty the text is just the bare site: clause.
pub fn build_queries(spec: &SearchSpec) -> Vec<CompiledQuery> {
    let mut parts = vec!["site:linkedin.com/in".to_string()];

    if !spec.job_titles.is_empty() {
        parts.push(or_group(&spec.job_titles));
    }
    if !spec.companies.is_empty() {
        parts.push(or_group(&spec.companies));
    }
    if !spec.keywords.is_empty() {
        parts.push(or_group(&spec.keywords));
    }
    if !spec.exclusions.is_empty() {
        // Leading '-' negates the whole group.
        parts.push(format!("-{}", or_group(&spec.exclusions)));
    }
    if !spec.location.is_empty() {
        parts.push(quoted(&spec.location));
    }

    let main = parts.join(" ");

    // The variant is currently byte-identical to the primary; downstream code
    // expects two rows regardless, so both are always emitted. A genuinely
    // different title permutation is pending product input (see DESIGN.md).
    vec![
        CompiledQuery {
            query_type: "xray_linkedin".to_string(),
            label: "Primary".to_string(),
            query_text: main.clone(),
        },
        CompiledQuery {
            query_type: "xray_linkedin_variant".to_string(),
            label: "Title variation".to_string(),
            query_text: main,
        },
    ]
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value)
}

fn or_group(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| quoted(v)).collect();
    format!("({})", quoted.join(" OR "))
}
