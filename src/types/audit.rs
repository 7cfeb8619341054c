use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::artifacts::LogLevel;
use super::errors::PolicyError;

/// Ordinal risk class. Used for aggregation only, never for ranking within a category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(PolicyError::UnknownSeverity(s.to_string())),
        }
    }
}

/// Which artifact family an issue was raised against
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Headers,
    Cookies,
    Storage,
    Console,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Headers,
        Category::Cookies,
        Category::Storage,
        Category::Console,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Headers => "headers",
            Category::Cookies => "cookies",
            Category::Storage => "storage",
            Category::Console => "console",
        }
    }
}

/// Reference back to the artifact an issue was raised against.
///
/// Storage sources carry the key only, never the stored value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueSource {
    Header { name: String },
    Cookie { name: String },
    Storage { store: String, key: String },
    Console { level: LogLevel },
}

/// A single reported finding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    pub category: Category,
    pub title: String,
    pub severity: Severity,
    pub description: String,
    pub source: IssueSource,
    /// Name of the sensitive pattern that triggered this issue, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Issue {
    pub fn new(
        category: Category,
        title: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
        source: IssueSource,
    ) -> Self {
        Self {
            category,
            title: title.into(),
            severity,
            description: description.into(),
            source,
            pattern: None,
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }
}

/// Severity tally for one audit run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueCount {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl IssueCount {
    pub fn get(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.critical + self.high + self.medium + self.low
    }

    /// Recount from scratch
    pub fn tally<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let mut count = Self::default();
        for issue in issues {
            count.increment(issue.severity);
        }
        count
    }
}

/// Passive leak notification raised by the console interceptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeakNotice {
    pub level: LogLevel,
    /// First 200 characters of the offending argument
    pub excerpt: String,
    /// Every pattern the offending argument matched
    pub patterns: Vec<String>,
}

/// Result of one audit run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub id: String,
    /// RFC 3339 timestamp
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    pub encrypted_transport: bool,
    pub issues: Vec<Issue>,
    pub counts: IssueCount,
    #[serde(default)]
    pub leaks: Vec<LeakNotice>,
}

impl AuditReport {
    pub fn new(page_url: Option<String>, encrypted_transport: bool) -> Self {
        Self {
            id: format!("aud_{}", uuid::Uuid::new_v4().simple()),
            created_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            page_url,
            encrypted_transport,
            issues: vec![],
            counts: IssueCount::default(),
            leaks: vec![],
        }
    }

    pub fn issues_in(&self, category: Category) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.category == category)
    }
}
