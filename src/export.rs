use crate::models::Profile;

// Column set is fixed; consumers of the exported file key on these names.
// Profiles carry no score yet, so that column is always empty.
const CSV_HEADER: [&str; 7] = [
    "full_name",
    "current_company",
    "current_title",
    "location",
    "linkedin_url",
    "score",
    "status",
];

/// Serialize profiles to CSV. Every value is double-quoted with internal
/// quotes doubled; missing fields render as empty quoted strings.
pub fn to_csv(rows: &[Profile]) -> String {
    let mut lines = vec![CSV_HEADER.join(",")];

    for row in rows {
        let values = [
            row.full_name.as_deref().unwrap_or(""),
            row.current_company.as_deref().unwrap_or(""),
            row.current_title.as_deref().unwrap_or(""),
            row.location.as_deref().unwrap_or(""),
            row.linkedin_url.as_str(),
            "",
            row.status.as_str(),
        ];
        let fields: Vec<String> = values.iter().map(|v| csv_field(v)).collect();
        lines.push(fields.join(","));
    }

    lines.join("\n")
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(full_name: Option<&str>) -> Profile {
        Profile {
            id: 1,
            project_id: 1,
            search_id: None,
            full_name: full_name.map(|s| s.to_string()),
            current_company: Some("Holman".to_string()),
            current_title: None,
            location: Some("Manchester".to_string()),
            linkedin_url: "https://linkedin.com/in/jane-doe".to_string(),
            linkedin_url_normalised: "https://linkedin.com/in/jane-doe".to_string(),
            status: "shortlisted".to_string(),
            created_at: "2025-01-01 00:00:00".to_string(),
            updated_at: "2025-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_header_only_when_no_rows() {
        assert_eq!(
            to_csv(&[]),
            "full_name,current_company,current_title,location,linkedin_url,score,status"
        );
    }

    #[test]
    fn test_row_values_are_quoted_and_missing_fields_empty() {
        let csv = to_csv(&[profile(Some("Jane Doe"))]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            r#""Jane Doe","Holman","","Manchester","https://linkedin.com/in/jane-doe","","shortlisted""#
        );
    }

    #[test]
    fn test_internal_quotes_are_doubled() {
        let csv = to_csv(&[profile(Some(r#"Jane "JJ" Doe"#))]);
        assert!(csv.contains(r#""Jane ""JJ"" Doe""#));
    }
}
