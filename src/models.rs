use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Search {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub nl_prompt: String,
    pub summary: String,
    pub created_at: String,
}

/// Structured candidate filters. Every field deserializes to empty when
/// absent, so query compilation never has to distinguish missing from empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSpec {
    #[serde(default)]
    pub companies: Vec<String>,
    #[serde(default)]
    pub job_titles: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    /// Primary location used in query text (may duplicate locations[0]).
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    /// Stored for display only; nothing scores against it yet.
    #[serde(default)]
    pub ranking_criteria: Vec<String>,
}

/// One saved revision of a search's spec. Revisions are append-only; edits
/// insert a new row with the next version number.
#[derive(Debug, Clone, Serialize)]
pub struct SpecVersion {
    pub id: i64,
    pub search_id: i64,
    pub version: i64,
    pub spec: SearchSpec,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub id: i64,
    pub search_id: i64,
    pub query_type: String,
    pub label: String,
    pub query_text: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub project_id: i64,
    pub search_id: Option<i64>,
    pub full_name: Option<String>,
    pub current_company: Option<String>,
    pub current_title: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: String,
    pub linkedin_url_normalised: String,
    pub status: String, // see ProfileStatus; stored as free text, filtered by equality
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileNote {
    pub id: i64,
    pub profile_id: i64,
    pub note: String,
    pub source: String, // "user" for manually attached notes
    pub created_at: String,
}

/// Pipeline stage of a captured profile. The store keeps plain text so old
/// rows with unknown stages still load; commands parse into this enum before
/// writing or filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileStatus {
    NotContacted,
    Shortlisted,
    Contacted,
    Rejected,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::NotContacted => "not_contacted",
            ProfileStatus::Shortlisted => "shortlisted",
            ProfileStatus::Contacted => "contacted",
            ProfileStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "not_contacted" | "not-contacted" => Some(ProfileStatus::NotContacted),
            "shortlisted" => Some(ProfileStatus::Shortlisted),
            "contacted" => Some(ProfileStatus::Contacted),
            "rejected" => Some(ProfileStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_spec_defaults_missing_fields_to_empty() {
        let spec: SearchSpec = serde_json::from_str(r#"{"job_titles":["Sales Director"]}"#).unwrap();
        assert_eq!(spec.job_titles, vec!["Sales Director".to_string()]);
        assert!(spec.companies.is_empty());
        assert!(spec.keywords.is_empty());
        assert!(spec.exclusions.is_empty());
        assert!(spec.locations.is_empty());
        assert!(spec.ranking_criteria.is_empty());
        assert_eq!(spec.location, "");
    }

    #[test]
    fn test_search_spec_empty_object() {
        let spec: SearchSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec, SearchSpec::default());
    }

    #[test]
    fn test_profile_status_round_trip() {
        for status in [
            ProfileStatus::NotContacted,
            ProfileStatus::Shortlisted,
            ProfileStatus::Contacted,
            ProfileStatus::Rejected,
        ] {
            assert_eq!(ProfileStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_profile_status_parse_is_lenient_about_case() {
        assert_eq!(ProfileStatus::parse("Shortlisted"), Some(ProfileStatus::Shortlisted));
        assert_eq!(ProfileStatus::parse("  not-contacted "), Some(ProfileStatus::NotContacted));
        assert_eq!(ProfileStatus::parse("archived"), None);
    }
}
