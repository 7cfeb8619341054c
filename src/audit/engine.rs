use std::sync::Arc;
use tracing::{debug, info};

use crate::types::{AuditReport, PageArtifacts};

use super::console::ConsoleInterceptor;
use super::patterns::PatternSet;
use super::policy::PolicyTable;
use super::sink::IssueSink;
use super::{cookies, headers, storage};

pub struct AuditEngine {
    policy: Arc<PolicyTable>,
    patterns: &'static PatternSet,
    sink: Arc<IssueSink>,
}

impl AuditEngine {
    pub fn new(policy: Arc<PolicyTable>, sink: Arc<IssueSink>) -> Self {
        Self {
            policy,
            patterns: PatternSet::builtin(),
            sink,
        }
    }

    /// Engine over the built-in policy with a fresh sink
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(PolicyTable::builtin().clone()),
            Arc::new(IssueSink::new()),
        )
    }

    pub fn sink(&self) -> &Arc<IssueSink> {
        &self.sink
    }

    /// Clear the previous run's results
    pub fn reset(&self) {
        self.sink.reset();
    }

    /// Run a full audit over one page's artifacts
    pub fn run(&self, artifacts: &PageArtifacts) -> AuditReport {
        self.reset();

        let context = artifacts.context;
        let mut report = AuditReport::new(artifacts.page_url.clone(), context.encrypted_transport);

        info!(
            "Starting audit of {} (encrypted transport: {})",
            artifacts.page_url.as_deref().unwrap_or("unknown page"),
            context.encrypted_transport
        );

        // Phase 1: Response headers
        headers::check_headers(&self.policy, &artifacts.headers, &context, &self.sink);

        // Phase 2: Cookies
        cookies::check_cookies(
            self.patterns,
            &artifacts.cookies,
            context.encrypted_transport,
            &self.sink,
        );

        // Phase 3: Browser storage
        storage::check_storage(self.patterns, &artifacts.storage, &self.sink);

        // Phase 4: Console output captured during the page's lifetime
        if !artifacts.console.is_empty() {
            debug!("Replaying {} console events", artifacts.console.len());
            let interceptor = ConsoleInterceptor::new(self.patterns);
            interceptor.register(self.sink.clone());
            report.leaks = artifacts
                .console
                .iter()
                .filter_map(|event| interceptor.intercept(event).notice)
                .collect();
        }

        let (issues, counts) = self.sink.snapshot();
        report.issues = issues;
        report.counts = counts;

        info!(
            "Audit {} completed: {} critical, {} high, {} medium, {} low",
            report.id, counts.critical, counts.high, counts.medium, counts.low
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Category, ConsoleEvent, Cookie, IssueCount, LogLevel, PageContext, Severity, StorageArea,
    };
    use serde_json::json;
    use std::collections::HashMap;

    fn artifacts() -> PageArtifacts {
        let mut headers = HashMap::new();
        headers.insert("X-Frame-Options".to_string(), "DENY".to_string());

        PageArtifacts {
            page_url: Some("https://shop.example/checkout".to_string()),
            context: PageContext {
                encrypted_transport: true,
            },
            headers,
            cookies: vec![Cookie::new("theme", "dark")],
            storage: vec![StorageArea::new("localStorage").with_entry("cart", "3 items")],
            console: vec![
                ConsoleEvent::new(LogLevel::Info, vec![json!("ready")]),
                ConsoleEvent::new(LogLevel::Error, vec![json!("bad password for user")]),
            ],
        }
    }

    #[test]
    fn test_end_to_end_counts() {
        let engine = AuditEngine::with_defaults();
        let report = engine.run(&artifacts());

        // headers: csp(high), xcto(medium), hsts(high), referrer(low)
        // cookie: secure(high), httponly(medium), samesite(medium)
        // console: one critical leak
        assert_eq!(
            report.counts,
            IssueCount {
                critical: 1,
                high: 3,
                medium: 3,
                low: 1,
            }
        );
        assert_eq!(report.issues_in(Category::Headers).count(), 4);
        assert_eq!(report.issues_in(Category::Cookies).count(), 3);
        assert_eq!(report.issues_in(Category::Storage).count(), 0);
        assert_eq!(report.issues_in(Category::Console).count(), 1);
        assert_eq!(report.leaks.len(), 1);
        assert_eq!(report.leaks[0].level, LogLevel::Error);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let engine = AuditEngine::with_defaults();
        let first = engine.run(&artifacts());
        let second = engine.run(&artifacts());

        assert_eq!(first.issues, second.issues);
        assert_eq!(first.counts, second.counts);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_reset_then_rerun() {
        let engine = AuditEngine::with_defaults();
        let first = engine.run(&artifacts());
        engine.reset();
        assert!(engine.sink().is_empty());

        let second = engine.run(&artifacts());
        assert_eq!(first.issues, second.issues);
        assert_eq!(engine.sink().counts(), second.counts);
    }

    #[test]
    fn test_empty_artifacts() {
        let engine = AuditEngine::with_defaults();
        let report = engine.run(&PageArtifacts::default());

        // Plain-HTTP page with no headers: csp, xfo, xcto, referrer
        assert_eq!(report.issues.len(), 4);
        assert!(report.issues.iter().all(|i| i.category == Category::Headers));
        assert!(report.leaks.is_empty());
    }

    #[test]
    fn test_tally_matches_issue_list() {
        let engine = AuditEngine::with_defaults();
        let mut input = artifacts();
        input.cookies.push(Cookie::new("auth_token", "x"));
        let report = engine.run(&input);

        assert_eq!(report.counts, IssueCount::tally(&report.issues));
        assert!(report.counts.get(Severity::Critical) >= 3);
    }

    #[test]
    fn test_custom_policy() {
        let policy = PolicyTable::from_json(
            r#"[{"header": "x-powered-by", "severity": "low", "required": false, "allowed_values": ["none"]}]"#,
        )
        .unwrap();
        let engine = AuditEngine::new(Arc::new(policy), Arc::new(IssueSink::new()));

        let mut headers = HashMap::new();
        headers.insert("X-Powered-By".to_string(), "Express".to_string());
        let report = engine.run(&PageArtifacts {
            headers,
            ..Default::default()
        });

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].title, "Misconfigured x-powered-by header");
    }
}
