//! Credential table and per-user handle selection.
//!
//! Every write is performed by the GitLab identity mapped to the Bitbucket
//! user who authored it, so issues and notes keep their attribution.

use crate::error::{MigrationError, Result};
use crate::gitlab::{GitLabApi, GitLabClient};
use crate::settings::MigrationConfig;

use std::time::Duration;
use tracing::{debug, warn};

/// Ordered mapping from Bitbucket username to an authenticated handle.
pub struct CredentialTable<A> {
    handles: Vec<(String, A)>,
}

impl<A> Default for CredentialTable<A> {
    fn default() -> Self {
        Self {
            handles: Vec::new(),
        }
    }
}

impl CredentialTable<GitLabClient> {
    /// Build one GitLab client per configured credential.
    pub fn from_config(config: &MigrationConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let mut table = Self::default();
        for entry in &config.credentials {
            let client = GitLabClient::new(&config.api_url, &entry.token, timeout)?;
            table.register(entry.username.clone(), client);
        }
        debug!(handles = table.len(), "credential table built");
        Ok(table)
    }
}

impl<A: GitLabApi> CredentialTable<A> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle. The first registration becomes the default.
    pub fn register(&mut self, username: impl Into<String>, handle: A) {
        self.handles.push((username.into(), handle));
    }

    /// Add a handle, builder style.
    pub fn with_handle(mut self, username: impl Into<String>, handle: A) -> Self {
        self.register(username, handle);
        self
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Handle for `username`, or the first registered handle when no
    /// username is given. Unknown usernames yield `None`.
    pub fn handle(&self, username: Option<&str>) -> Option<&A> {
        match username {
            None => self.handles.first().map(|(_, h)| h),
            Some(name) => self
                .handles
                .iter()
                .find(|(user, _)| user == name)
                .map(|(_, h)| h),
        }
    }

    /// The first registered handle.
    pub fn default_handle(&self) -> Result<&A> {
        self.handle(None).ok_or(MigrationError::NoCredentials)
    }

    /// Handle for a write attributed to `username`.
    ///
    /// Users without a mapped token write through the default handle.
    pub fn writer(&self, username: Option<&str>) -> Result<&A> {
        if let Some(handle) = self.handle(username) {
            return Ok(handle);
        }
        warn!(
            user = username.unwrap_or_default(),
            "no GitLab token for user, writing with the default identity"
        );
        self.default_handle()
    }
}
