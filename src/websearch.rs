use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;

const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";

// Fixed run parameters: first page of English results for the UK market.
const RESULT_COUNT: &str = "10";
const SEARCH_LANG: &str = "en";
const COUNTRY: &str = "gb";

/// One search result, reduced to what the capture workflow needs.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    description: Option<String>,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BraveWebSection {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    web: Option<BraveWebSection>,
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug)]
pub struct BraveSearchClient {
    api_key: String,
    client: reqwest::blocking::Client,
}

impl BraveSearchClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = env::var("BRAVE_SEARCH_API_KEY").context(
            "BRAVE_SEARCH_API_KEY environment variable not set. Set it with: export BRAVE_SEARCH_API_KEY=your-key-here",
        )?;
        Ok(Self::new(api_key))
    }

    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .get(BRAVE_SEARCH_URL)
            .query(&[
                ("q", query),
                ("count", RESULT_COUNT),
                ("search_lang", SEARCH_LANG),
                ("country", COUNTRY),
            ])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .context("Failed to send request to Brave search API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!("Brave search failed with status {}: {}", status, error_text));
        }

        let body = response.text().context("Failed to read Brave search response")?;
        parse_search_response(&body)
    }
}

fn parse_search_response(body: &str) -> Result<Vec<SearchHit>> {
    let parsed: BraveResponse =
        serde_json::from_str(body).context("Failed to parse Brave search response")?;

    // Results normally sit under web.results; some response shapes put them
    // at the top level instead.
    let raw = match parsed.web {
        Some(web) => web.results,
        None => parsed.results,
    };

    Ok(raw
        .into_iter()
        .map(|item| SearchHit {
            title: item.title,
            url: item.url,
            description: item.description.or(item.snippet).unwrap_or_default(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_requires_api_key() {
        let original = env::var("BRAVE_SEARCH_API_KEY").ok();
        unsafe {
            env::remove_var("BRAVE_SEARCH_API_KEY");
        }

        let result = BraveSearchClient::from_env();

        if let Some(val) = original {
            unsafe {
                env::set_var("BRAVE_SEARCH_API_KEY", val);
            }
        }

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("BRAVE_SEARCH_API_KEY"));
    }

    #[test]
    fn test_new_takes_an_explicit_key_without_env() {
        let client = BraveSearchClient::new("test-key".to_string());
        assert_eq!(client.api_key, "test-key");
        // Debug output is available for error reporting in tests.
        assert!(format!("{:?}", client).contains("BraveSearchClient"));
    }

    #[test]
    fn test_parse_web_results() {
        let body = r#"{
            "web": {
                "results": [
                    {"title": "Jane Doe - Sales Director", "url": "https://linkedin.com/in/jane-doe", "description": "Sales Director at Holman"},
                    {"title": "John Roe", "url": "https://linkedin.com/in/john-roe", "snippet": "Fleet sales"}
                ]
            }
        }"#;
        let hits = parse_search_response(body).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Jane Doe - Sales Director");
        assert_eq!(hits[0].description, "Sales Director at Holman");
        // snippet fills in when description is missing
        assert_eq!(hits[1].description, "Fleet sales");
    }

    #[test]
    fn test_parse_top_level_results() {
        let body = r#"{"results": [{"title": "T", "url": "u"}]}"#;
        let hits = parse_search_response(body).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].description, "");
    }

    #[test]
    fn test_parse_empty_response() {
        let hits = parse_search_response("{}").unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        assert!(parse_search_response("not json").is_err());
    }
}
