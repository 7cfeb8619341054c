//! Response header policy table

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::types::{PageContext, PolicyError, Severity};

/// When a header must be present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Always,
    Never,
    /// Only when the page was loaded over an encrypted transport
    EncryptedTransport,
}

impl Requirement {
    pub fn is_required(&self, context: &PageContext) -> bool {
        match self {
            Requirement::Always => true,
            Requirement::Never => false,
            Requirement::EncryptedTransport => context.encrypted_transport,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRule {
    /// Lower-cased header name
    pub header: String,
    pub severity: Severity,
    pub required: Requirement,
    /// Case-sensitive allow list. Never empty when set.
    pub allowed_values: Option<Vec<String>>,
}

impl HeaderRule {
    fn new(header: &str, severity: Severity, required: Requirement) -> Self {
        Self {
            header: header.to_string(),
            severity,
            required,
            allowed_values: None,
        }
    }

    fn allow(mut self, values: &[&str]) -> Self {
        self.allowed_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn allows(&self, value: &str) -> bool {
        match &self.allowed_values {
            Some(allowed) => allowed.iter().any(|v| v == value),
            None => true,
        }
    }
}

static DEFAULT_POLICY: Lazy<PolicyTable> = Lazy::new(|| PolicyTable {
    rules: vec![
        HeaderRule::new("content-security-policy", Severity::High, Requirement::Always),
        HeaderRule::new("x-frame-options", Severity::High, Requirement::Always)
            .allow(&["DENY", "SAMEORIGIN"]),
        HeaderRule::new("x-content-type-options", Severity::Medium, Requirement::Always)
            .allow(&["nosniff"]),
        HeaderRule::new(
            "strict-transport-security",
            Severity::High,
            Requirement::EncryptedTransport,
        ),
        HeaderRule::new("referrer-policy", Severity::Low, Requirement::Always),
        HeaderRule::new("permissions-policy", Severity::Medium, Requirement::Never),
        HeaderRule::new("x-xss-protection", Severity::Low, Requirement::Never),
    ],
});

/// Validated, immutable set of header rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    rules: Vec<HeaderRule>,
}

/// `required` as written in a policy document: a boolean or `"encrypted_transport"`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RequiredDef {
    Flag(bool),
    Condition(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDef {
    header: String,
    severity: String,
    #[serde(default = "default_required")]
    required: RequiredDef,
    #[serde(default, alias = "allowedValues")]
    allowed_values: Option<Vec<String>>,
}

fn default_required() -> RequiredDef {
    RequiredDef::Flag(false)
}

impl PolicyTable {
    pub fn builtin() -> &'static PolicyTable {
        &DEFAULT_POLICY
    }

    /// Parse and validate a JSON policy document
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let defs: Vec<RuleDef> = serde_json::from_str(json)?;
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(defs.len());

        for def in defs {
            let header = def.header.trim().to_ascii_lowercase();
            if header.is_empty() {
                return Err(PolicyError::EmptyHeaderName);
            }
            if !seen.insert(header.clone()) {
                return Err(PolicyError::DuplicateHeader(header));
            }

            let severity: Severity = def.severity.parse()?;
            let required = match def.required {
                RequiredDef::Flag(true) => Requirement::Always,
                RequiredDef::Flag(false) => Requirement::Never,
                RequiredDef::Condition(cond) => match cond.trim().to_ascii_lowercase().as_str() {
                    "encrypted_transport" | "https" => Requirement::EncryptedTransport,
                    "always" => Requirement::Always,
                    "never" => Requirement::Never,
                    _ => {
                        return Err(PolicyError::Parse(format!(
                            "unknown requirement '{}' for {}",
                            cond, header
                        )))
                    }
                },
            };

            if matches!(&def.allowed_values, Some(values) if values.is_empty()) {
                return Err(PolicyError::EmptyAllowedValues(header));
            }

            rules.push(HeaderRule {
                header,
                severity,
                required,
                allowed_values: def.allowed_values,
            });
        }

        Ok(Self { rules })
    }

    /// Load a policy document from disk
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let table = Self::from_json(&json)?;
        info!("Loaded {} header rules from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn rules(&self) -> &[HeaderRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let table = PolicyTable::builtin();
        assert_eq!(table.len(), 7);
        let xfo = table
            .rules()
            .iter()
            .find(|r| r.header == "x-frame-options")
            .unwrap();
        assert!(xfo.allows("DENY"));
        assert!(!xfo.allows("deny"));
        assert!(!xfo.allows(""));
    }

    #[test]
    fn test_hsts_depends_on_transport() {
        let hsts = PolicyTable::builtin()
            .rules()
            .iter()
            .find(|r| r.header == "strict-transport-security")
            .unwrap();
        assert!(hsts.required.is_required(&PageContext { encrypted_transport: true }));
        assert!(!hsts.required.is_required(&PageContext { encrypted_transport: false }));
    }

    #[test]
    fn test_from_json() {
        let table = PolicyTable::from_json(
            r#"[
                {"header": "X-Frame-Options", "severity": "HIGH", "required": true, "allowed_values": ["DENY"]},
                {"header": "strict-transport-security", "severity": "high", "required": "encrypted_transport"},
                {"header": "x-xss-protection", "severity": "low"}
            ]"#,
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.rules()[0].header, "x-frame-options");
        assert_eq!(table.rules()[0].required, Requirement::Always);
        assert_eq!(table.rules()[1].required, Requirement::EncryptedTransport);
        assert_eq!(table.rules()[2].required, Requirement::Never);
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let err = PolicyTable::from_json(r#"[{"header": "a", "severity": "urgent"}]"#).unwrap_err();
        assert_eq!(err, PolicyError::UnknownSeverity("urgent".to_string()));
    }

    #[test]
    fn test_empty_allowed_values_rejected() {
        let err = PolicyTable::from_json(
            r#"[{"header": "x-frame-options", "severity": "high", "allowed_values": []}]"#,
        )
        .unwrap_err();
        assert_eq!(err, PolicyError::EmptyAllowedValues("x-frame-options".to_string()));
    }

    #[test]
    fn test_camel_case_allowed_values() {
        let table = PolicyTable::from_json(
            r#"[{"header": "x-frame-options", "severity": "high", "required": true, "allowedValues": ["DENY"]}]"#,
        )
        .unwrap();
        assert_eq!(table.rules()[0].allowed_values, Some(vec!["DENY".to_string()]));

        let err = PolicyTable::from_json(
            r#"[{"header": "x-frame-options", "severity": "high", "required": true, "allowedValues": []}]"#,
        )
        .unwrap_err();
        assert_eq!(err, PolicyError::EmptyAllowedValues("x-frame-options".to_string()));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            PolicyTable::from_json(r#"[{"header": "a", "severity": "low", "allowed": ["x"]}]"#),
            Err(PolicyError::Parse(_))
        ));
    }

    #[test]
    fn test_duplicate_and_empty_headers_rejected() {
        let dup = PolicyTable::from_json(
            r#"[{"header": "a", "severity": "low"}, {"header": "A", "severity": "low"}]"#,
        )
        .unwrap_err();
        assert_eq!(dup, PolicyError::DuplicateHeader("a".to_string()));

        let empty = PolicyTable::from_json(r#"[{"header": " ", "severity": "low"}]"#).unwrap_err();
        assert_eq!(empty, PolicyError::EmptyHeaderName);
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"header": "referrer-policy", "severity": "low", "required": true}}]"#)
            .unwrap();

        let table = PolicyTable::from_file(file.path()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rules()[0].severity, Severity::Low);
    }

    #[test]
    fn test_malformed_document_rejected() {
        assert!(matches!(
            PolicyTable::from_json("{not json"),
            Err(PolicyError::Parse(_))
        ));
    }
}
