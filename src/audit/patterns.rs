//! Sensitive-data heuristics
//!
//! Keyword patterns that flag text which may hold credentials, personal data,
//! payment data or contact details. Deliberately tuned for recall: every
//! matching pattern is reported, overlapping ones included.

use once_cell::sync::Lazy;
use regex::RegexSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    Credentials,
    Pii,
    Financial,
    Contact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensitivePattern {
    pub name: &'static str,
    pub regex: &'static str,
    pub category: PatternCategory,
}

const fn pattern(name: &'static str, regex: &'static str, category: PatternCategory) -> SensitivePattern {
    SensitivePattern { name, regex, category }
}

const PATTERNS: &[SensitivePattern] = &[
    pattern("password", "password", PatternCategory::Credentials),
    pattern("passwd", "passwd", PatternCategory::Credentials),
    pattern("pwd", "pwd", PatternCategory::Credentials),
    pattern("secret", "secret", PatternCategory::Credentials),
    pattern("token", "token", PatternCategory::Credentials),
    pattern("auth", "auth", PatternCategory::Credentials),
    pattern("credential", "credential", PatternCategory::Credentials),
    pattern("session", "session", PatternCategory::Credentials),
    pattern("key", "key", PatternCategory::Credentials),
    pattern("api_key", "api[-_]?key", PatternCategory::Credentials),
    pattern("bearer", "bearer", PatternCategory::Credentials),
    pattern("jwt", "jwt", PatternCategory::Credentials),
    pattern("ssn", "ssn", PatternCategory::Pii),
    pattern("social_security", "social.?security", PatternCategory::Pii),
    pattern("credit_card", "credit.?card", PatternCategory::Financial),
    pattern("cvv", "cvv", PatternCategory::Financial),
    pattern("cvc", "cvc", PatternCategory::Financial),
    pattern("expiration", "expiration", PatternCategory::Financial),
    pattern("phone", "phone", PatternCategory::Contact),
    pattern("email", "email", PatternCategory::Contact),
    pattern("address", "address", PatternCategory::Contact),
    pattern("dob", "dob", PatternCategory::Pii),
    pattern("birth", "birth", PatternCategory::Pii),
];

static DEFAULT_PATTERNS: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::compile(PATTERNS).expect("built-in sensitive patterns are valid")
});

/// Compiled, immutable pattern set
#[derive(Debug)]
pub struct PatternSet {
    patterns: Vec<SensitivePattern>,
    set: RegexSet,
}

impl PatternSet {
    /// Compile a pattern list. Matching is case-insensitive for every pattern.
    pub fn compile(patterns: &[SensitivePattern]) -> Result<Self, regex::Error> {
        let set = RegexSet::new(patterns.iter().map(|p| format!("(?i){}", p.regex)))?;
        Ok(Self {
            patterns: patterns.to_vec(),
            set,
        })
    }

    /// The process-wide built-in set
    pub fn builtin() -> &'static PatternSet {
        &DEFAULT_PATTERNS
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Every pattern matching `text`, in table order
    pub fn matches(&self, text: &str) -> Vec<&SensitivePattern> {
        self.set
            .matches(text)
            .into_iter()
            .map(|idx| &self.patterns[idx])
            .collect()
    }

    /// Every pattern matching any of `texts`, each pattern reported once
    pub fn matches_any(&self, texts: &[&str]) -> Vec<&SensitivePattern> {
        let mut hit = vec![false; self.patterns.len()];
        for text in texts {
            for idx in self.set.matches(text).into_iter() {
                hit[idx] = true;
            }
        }
        hit.iter()
            .enumerate()
            .filter(|(_, matched)| **matched)
            .map(|(idx, _)| &self.patterns[idx])
            .collect()
    }
}
