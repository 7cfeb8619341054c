use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Cookie record as reported by the browser cookie API.
///
/// Missing flags deserialize as `false` so incomplete records get flagged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub same_site: Option<String>,
}

impl Cookie {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            ..Default::default()
        }
    }

    /// Normalized SameSite attribute, `None` when absent
    pub fn same_site(&self) -> Option<SameSite> {
        self.same_site.as_deref().and_then(SameSite::parse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    /// `SameSite=None`
    NoRestriction,
    Other(String),
}

impl SameSite {
    /// Case-insensitive parse. Empty and `unspecified` mean the attribute was not set.
    pub fn parse(raw: &str) -> Option<SameSite> {
        let normalized = raw.trim().to_ascii_lowercase().replace(&['-', ' '][..], "_");
        match normalized.as_str() {
            "" | "unspecified" => None,
            "strict" => Some(SameSite::Strict),
            "lax" => Some(SameSite::Lax),
            "none" | "no_restriction" => Some(SameSite::NoRestriction),
            _ => Some(SameSite::Other(normalized)),
        }
    }
}

/// One named key/value store (e.g. localStorage, sessionStorage)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageArea {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entries: BTreeMap<String, serde_json::Value>,
}

impl StorageArea {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Log,
    Warn,
    Error,
    Info,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Log => "log",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Info => "info",
        };
        f.write_str(s)
    }
}

/// One intercepted console call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleEvent {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl ConsoleEvent {
    pub fn new(level: LogLevel, args: Vec<serde_json::Value>) -> Self {
        Self { level, args }
    }

    /// Arguments coerced to text: strings verbatim, anything else as JSON
    pub fn texts(&self) -> impl Iterator<Item = String> + '_ {
        self.args.iter().map(coerce_to_text)
    }
}

pub fn coerce_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Context the header rules depend on. Supplied by the caller, never inferred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageContext {
    pub encrypted_transport: bool,
}

/// Everything collected for one page
#[derive(Debug, Clone, Default)]
pub struct PageArtifacts {
    pub page_url: Option<String>,
    pub context: PageContext,
    pub headers: HashMap<String, String>,
    pub cookies: Vec<Cookie>,
    pub storage: Vec<StorageArea>,
    pub console: Vec<ConsoleEvent>,
}

/// Audit request from the collector
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    #[serde(default)]
    pub page_url: Option<String>,
    /// Explicit transport flag. Derived from `page_url` when absent.
    #[serde(default)]
    pub encrypted_transport: Option<bool>,
    /// Tab whose cached headers are used when `headers` is absent
    #[serde(default)]
    pub tab_id: Option<u64>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub storage: Vec<StorageArea>,
    #[serde(default)]
    pub console: Vec<ConsoleEvent>,
}

impl AuditRequest {
    /// Resolve the page context: explicit flag, else the URL scheme, else plain.
    pub fn context(&self) -> Result<PageContext, url::ParseError> {
        if let Some(encrypted_transport) = self.encrypted_transport {
            return Ok(PageContext { encrypted_transport });
        }

        let encrypted_transport = match &self.page_url {
            Some(page_url) => {
                let url = url::Url::parse(page_url)?;
                matches!(url.scheme(), "https" | "wss")
            }
            None => false,
        };

        Ok(PageContext { encrypted_transport })
    }

    pub fn into_artifacts(self, context: PageContext, headers: HashMap<String, String>) -> PageArtifacts {
        PageArtifacts {
            page_url: self.page_url,
            context,
            headers,
            cookies: self.cookies,
            storage: self.storage,
            console: self.console,
        }
    }
}
