//! Build configuration
//!
//! Settings come from the environment (a `.env` file is honoured) with the defaults below;
//! command-line flags override them.

use crate::error::{BuildError, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Build Configuration Constants
// ============================================================================

/// Default view database when none is given.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:view_model.db";

/// Default number of records between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

pub const ENV_DATABASE_URL: &str = "VIEW_DATABASE_URL";
pub const ENV_ALLOW_BROKEN_RELATIONSHIPS: &str = "VIEW_ALLOW_BROKEN_RELATIONSHIPS";
pub const ENV_PROGRESS_INTERVAL: &str = "VIEW_PROGRESS_INTERVAL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// sqlx connection URL of the view database
    pub database_url: String,

    /// Omit unresolved joins instead of failing the build
    #[serde(default)]
    pub allow_broken_relationships: bool,

    /// Records between progress log lines when no total is known; 0 disables them
    pub progress_interval: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            allow_broken_relationships: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl BuildConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_vars(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Build from a variable source; unparsable values fall back to the defaults
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            database_url: var(ENV_DATABASE_URL).unwrap_or(defaults.database_url),
            allow_broken_relationships: var(ENV_ALLOW_BROKEN_RELATIONSHIPS)
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.allow_broken_relationships),
            progress_interval: var(ENV_PROGRESS_INTERVAL)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.progress_interval),
        }
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn with_allow_broken_relationships(mut self, allow: bool) -> Self {
        self.allow_broken_relationships = allow;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(BuildError::config("Database URL cannot be empty"));
        }

        if !self.database_url.starts_with("sqlite:") {
            return Err(BuildError::config(format!(
                "Database URL must be a sqlite URL, got {:?}",
                self.database_url
            )));
        }

        Ok(())
    }
}

/// Database URL for a path given on the command line
pub fn database_url_for(path: &str) -> String {
    if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite:{path}")
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
