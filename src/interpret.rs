//! Prompt interpretation: turns a free-text sourcing brief into an initial
//! SearchSpec. Kept behind a trait so the fixed heuristic can be swapped for
//! a real language-model interpreter without touching query compilation.

use crate::models::SearchSpec;

pub trait PromptInterpreter {
    /// Produce an initial spec from a free-text prompt. Infallible: an empty
    /// prompt yields an empty spec, never an error.
    fn interpret(&self, prompt: &str) -> SearchSpec;

    #[allow(dead_code)]
    fn name(&self) -> &str;
}

/// Placeholder interpreter. It does NOT extract entities from the prompt; it
/// returns a fixed fleet-sales filter set and only routes on a location
/// keyword (manchester/london, defaulting to United Kingdom). Output is fully
/// deterministic for a given prompt.
pub struct HeuristicInterpreter;

impl PromptInterpreter for HeuristicInterpreter {
    fn interpret(&self, prompt: &str) -> SearchSpec {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return SearchSpec::default();
        }

        let text = trimmed.to_lowercase();
        let location = if text.contains("manchester") {
            "Manchester"
        } else if text.contains("london") {
            "London"
        } else {
            "United Kingdom"
        };

        SearchSpec {
            companies: to_strings(&["SG Fleet UK", "Holman", "Lex Autolease"]),
            job_titles: to_strings(&[
                "Business Development Manager",
                "Corporate Sales Manager",
                "Sales Director",
            ]),
            locations: vec![location.to_string()],
            location: location.to_string(),
            keywords: to_strings(&["leasing", "fleet", "contract hire"]),
            exclusions: to_strings(&["internal sales", "telesales"]),
            ranking_criteria: to_strings(&["Leasing", "Products"]),
        }
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

pub fn default_interpreter() -> Box<dyn PromptInterpreter> {
    Box::new(HeuristicInterpreter)
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
