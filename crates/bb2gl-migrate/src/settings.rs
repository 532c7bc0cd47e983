//! Migration configuration.
//!
//! Configuration is read from a TOML file through the `config` crate, with
//! `BB2GL_`-prefixed environment variables overriding scalar keys:
//!
//! ```toml
//! api_url      = "https://gitlab.example.net/api/v4"
//! project_path = "repo/name"
//! input_path   = "/tmp/db-1.0.json"
//!
//! [[credentials]]
//! username = "bitbucket_username"
//! token    = "gitlab_private_token"
//! ```

use crate::error::{MigrationError, Result};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Colour given to labels created by the migration.
pub const DEFAULT_LABEL_COLOR: &str = "#808080";

/// Default timeout for a single GitLab request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// One Bitbucket user and the GitLab token that writes on their behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEntry {
    /// Bitbucket username as it appears in the export.
    pub username: String,

    /// GitLab private token.
    pub token: String,
}

/// Configuration for a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// GitLab API base URL, including the version prefix.
    pub api_url: String,

    /// Target project path (`namespace/name`).
    pub project_path: String,

    /// Path of the Bitbucket JSON export.
    pub input_path: PathBuf,

    /// Credential table. The first entry is the default handle.
    #[serde(default)]
    pub credentials: Vec<CredentialEntry>,

    /// Colour of labels created during the run.
    #[serde(default = "default_label_color")]
    pub label_color: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_label_color() -> String {
    DEFAULT_LABEL_COLOR.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl MigrationConfig {
    /// Create a new migration configuration without credentials.
    pub fn new(
        api_url: impl Into<String>,
        project_path: impl Into<String>,
        input_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            project_path: project_path.into(),
            input_path: input_path.into(),
            credentials: Vec::new(),
            label_color: default_label_color(),
            request_timeout_secs: default_timeout_secs(),
        }
    }

    /// Register a credential. Registration order is preserved.
    pub fn with_credential(mut self, username: impl Into<String>, token: impl Into<String>) -> Self {
        self.credentials.push(CredentialEntry {
            username: username.into(),
            token: token.into(),
        });
        self
    }

    /// Set the colour of created labels.
    pub fn with_label_color(mut self, color: impl Into<String>) -> Self {
        self.label_color = color.into();
        self
    }

    /// Load the configuration from a file, applying environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading migration configuration");

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(::config::Environment::with_prefix("BB2GL"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;

        debug!(
            project = %config.project_path,
            credentials = config.credentials.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Check the configuration for values a run cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(MigrationError::InvalidConfig("api_url is empty".into()));
        }
        url::Url::parse(&self.api_url)
            .map_err(|e| MigrationError::InvalidConfig(format!("api_url: {e}")))?;

        if self.project_path.trim().is_empty() {
            return Err(MigrationError::InvalidConfig("project_path is empty".into()));
        }

        if self.credentials.is_empty() {
            return Err(MigrationError::NoCredentials);
        }

        let mut seen = HashSet::new();
        for entry in &self.credentials {
            if !seen.insert(entry.username.as_str()) {
                return Err(MigrationError::InvalidConfig(format!(
                    "duplicate credential for '{}'",
                    entry.username
                )));
            }
        }

        Ok(())
    }
}
