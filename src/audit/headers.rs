use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::types::{Category, Issue, IssueSource, PageContext};

use super::policy::PolicyTable;
use super::sink::IssueSink;

/// Check response headers against every rule in the policy table.
///
/// Header names may arrive in any case; they are lower-cased before lookup.
/// When several spellings of one header are present every value is checked,
/// and the header is misconfigured if any of them falls outside the allow list.
pub fn check_headers(
    policy: &PolicyTable,
    headers: &HashMap<String, String>,
    context: &PageContext,
    sink: &IssueSink,
) {
    debug!("Checking {} headers against {} rules", headers.len(), policy.len());

    let mut normalized: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (name, value) in headers {
        normalized
            .entry(name.trim().to_ascii_lowercase())
            .or_default()
            .push(value.as_str());
    }

    for rule in policy.rules() {
        let header = &rule.header;
        match normalized.get(header) {
            None => {
                if rule.required.is_required(context) {
                    sink.append(Issue::new(
                        Category::Headers,
                        format!("Missing {} header", header),
                        rule.severity,
                        format!("{} header is required for security", header),
                        IssueSource::Header { name: header.clone() },
                    ));
                }
            }
            Some(values) => {
                let Some(allowed) = &rule.allowed_values else {
                    continue;
                };
                let mut rejected: Vec<&str> =
                    values.iter().copied().filter(|v| !rule.allows(v)).collect();
                if rejected.is_empty() {
                    continue;
                }
                // HashMap order is arbitrary; sort so the description is stable
                rejected.sort_unstable();
                rejected.dedup();
                sink.append(Issue::new(
                    Category::Headers,
                    format!("Misconfigured {} header", header),
                    rule.severity,
                    format!(
                        "Invalid value: {}. Allowed: {}",
                        rejected.join(", "),
                        allowed.join(", ")
                    ),
                    IssueSource::Header { name: header.clone() },
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn run(pairs: &[(&str, &str)], encrypted_transport: bool) -> Vec<Issue> {
        let sink = IssueSink::new();
        check_headers(
            PolicyTable::builtin(),
            &headers(pairs),
            &PageContext { encrypted_transport },
            &sink,
        );
        sink.issues()
    }

    fn titles(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_only_frame_options_on_https() {
        let issues = run(&[("x-frame-options", "DENY")], true);

        let mut found: Vec<(&str, Severity)> = issues
            .iter()
            .map(|i| (i.title.as_str(), i.severity))
            .collect();
        found.sort();
        assert_eq!(
            found,
            vec![
                ("Missing content-security-policy header", Severity::High),
                ("Missing referrer-policy header", Severity::Low),
                ("Missing strict-transport-security header", Severity::High),
                ("Missing x-content-type-options header", Severity::Medium),
            ]
        );
    }

    #[test]
    fn test_hsts_not_required_over_plain_http() {
        let issues = run(&[("x-frame-options", "DENY")], false);
        assert!(!titles(&issues).contains(&"Missing strict-transport-security header"));
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn test_mixed_case_names() {
        let issues = run(
            &[
                ("Content-Security-Policy", "default-src 'self'"),
                ("X-Frame-Options", "SAMEORIGIN"),
                ("X-Content-Type-Options", "nosniff"),
                ("Strict-Transport-Security", "max-age=63072000"),
                ("Referrer-Policy", "no-referrer"),
            ],
            true,
        );
        assert!(issues.is_empty(), "unexpected issues: {:?}", titles(&issues));
    }

    #[test]
    fn test_misconfigured_value() {
        let issues = run(&[("x-frame-options", "ALLOW-FROM https://a.example")], false);
        let issue = issues
            .iter()
            .find(|i| i.title == "Misconfigured x-frame-options header")
            .unwrap();
        assert_eq!(issue.severity, Severity::High);
        assert_eq!(
            issue.description,
            "Invalid value: ALLOW-FROM https://a.example. Allowed: DENY, SAMEORIGIN"
        );
    }

    #[test]
    fn test_allowed_values_are_case_sensitive() {
        let issues = run(&[("x-content-type-options", "NOSNIFF")], false);
        assert!(titles(&issues).contains(&"Misconfigured x-content-type-options header"));
    }

    #[test]
    fn test_empty_value_is_present_but_misconfigured() {
        let issues = run(&[("x-frame-options", ""), ("referrer-policy", "")], false);
        let t = titles(&issues);
        assert!(t.contains(&"Misconfigured x-frame-options header"));
        assert!(!t.contains(&"Missing x-frame-options header"));
        assert!(!t.contains(&"Missing referrer-policy header"));
    }

    #[test]
    fn test_case_variants_of_one_header() {
        let pairs = [("X-Frame-Options", "ALLOWALL"), ("x-frame-options", "DENY")];
        for _ in 0..50 {
            let issues = run(&pairs, false);
            let misconfigured: Vec<&Issue> = issues
                .iter()
                .filter(|i| i.title == "Misconfigured x-frame-options header")
                .collect();
            assert_eq!(misconfigured.len(), 1);
            assert_eq!(
                misconfigured[0].description,
                "Invalid value: ALLOWALL. Allowed: DENY, SAMEORIGIN"
            );
        }

        let issues = run(&[("X-Frame-Options", "DENY"), ("x-frame-options", "SAMEORIGIN")], false);
        assert!(!titles(&issues).contains(&"Misconfigured x-frame-options header"));
    }

    #[test]
    fn test_one_missing_issue_per_header() {
        let issues = run(&[], true);
        assert_eq!(issues.len(), 5);
        assert!(issues.iter().all(|i| i.title.starts_with("Missing ")));
    }
}
