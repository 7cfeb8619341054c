use anyhow::Result;
use std::env;
use std::path::PathBuf;

use crate::audit::PolicyTable;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// API key for collector-to-service authentication (optional)
    pub api_key: Option<String>,
    /// JSON header policy replacing the built-in table (optional)
    pub policy_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // APP_PORT takes precedence over PORT
            port: env::var("APP_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,

            // If set, all requests except /health must include X-API-Key
            api_key: env::var("API_KEY").ok().filter(|k| !k.is_empty()),

            policy_file: env::var("POLICY_FILE")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        })
    }

    /// Load the configured policy table. A bad policy file fails startup.
    pub fn load_policy(&self) -> Result<PolicyTable> {
        match &self.policy_file {
            Some(path) => PolicyTable::from_file(path),
            None => Ok(PolicyTable::builtin().clone()),
        }
    }
}
