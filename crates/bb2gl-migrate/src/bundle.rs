//! Bitbucket issue-tracker export.
//!
//! Only the fields the migration reads are modelled; everything else in the
//! export (`meta`, `logs`, `attachments`, `versions`, ...) is ignored.

use crate::error::{MigrationError, Result};
use crate::mapping::Priority;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Status that marks an issue as parked.
pub const STATUS_ON_HOLD: &str = "on hold";

/// Status of a finished issue.
pub const STATUS_RESOLVED: &str = "resolved";

/// Bitbucket milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
}

/// Bitbucket component, migrated to a GitLab label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
}

/// Bitbucket issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub title: String,
    pub status: String,
    #[serde(default)]
    pub reporter: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub milestone: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub updated_on: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl Issue {
    /// Whether the issue is closed on GitLab after creation.
    pub fn should_close(&self) -> bool {
        self.status == STATUS_RESOLVED || self.status == STATUS_ON_HOLD
    }

    /// Whether the issue carries the `on hold` label.
    pub fn is_on_hold(&self) -> bool {
        self.status == STATUS_ON_HOLD
    }
}

/// Bitbucket issue comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Id of the issue this comment belongs to.
    pub issue: u64,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    pub created_on: String,
}

/// The parsed export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportBundle {
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl ImportBundle {
    /// Read and validate an export file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading Bitbucket export");

        let contents = std::fs::read_to_string(path)?;
        let bundle = Self::from_json(&contents)?;

        debug!(
            milestones = bundle.milestones.len(),
            components = bundle.components.len(),
            issues = bundle.issues.len(),
            comments = bundle.comments.len(),
            "export loaded"
        );
        Ok(bundle)
    }

    /// Parse and validate an export held in memory.
    pub fn from_json(json: &str) -> Result<Self> {
        let bundle: Self = serde_json::from_str(json)?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Check issue id uniqueness and comment references.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::with_capacity(self.issues.len());
        for issue in &self.issues {
            if !ids.insert(issue.id) {
                return Err(MigrationError::InvalidBundle(format!(
                    "duplicate issue id {}",
                    issue.id
                )));
            }
        }

        if let Some(orphan) = self.comments.iter().find(|c| !ids.contains(&c.issue)) {
            return Err(MigrationError::InvalidBundle(format!(
                "comment from {} references unknown issue {}",
                orphan.user.as_deref().unwrap_or("anonymous"),
                orphan.issue
            )));
        }

        Ok(())
    }

    /// Issues in ascending id order.
    pub fn issues_by_id(&self) -> Vec<&Issue> {
        let mut issues: Vec<&Issue> = self.issues.iter().collect();
        issues.sort_by_key(|i| i.id);
        issues
    }

    /// Comments of one issue, oldest first. Ties keep export order.
    pub fn comments_for(&self, issue_id: u64) -> Vec<&Comment> {
        let mut comments: Vec<&Comment> =
            self.comments.iter().filter(|c| c.issue == issue_id).collect();
        comments.sort_by(|a, b| a.created_on.cmp(&b.created_on));
        comments
    }
}
