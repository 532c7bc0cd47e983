//! Common types for migration runs.

use chrono::{DateTime, Utc};
use console::style;
use serde::{Deserialize, Serialize};

/// Report of a completed migration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Target project path.
    pub project_path: String,

    /// Numeric id of the target project.
    pub project_id: Option<u64>,

    /// Milestones created on GitLab.
    pub milestones_created: usize,

    /// Milestones that already existed.
    pub milestones_skipped: usize,

    /// Labels created on GitLab.
    pub labels_created: usize,

    /// Labels that already existed.
    pub labels_skipped: usize,

    /// Issues created on GitLab.
    pub issues_migrated: usize,

    /// Issues closed after creation.
    pub issues_closed: usize,

    /// Issues created without an assignee.
    pub issues_unassigned: usize,

    /// Notes created on GitLab.
    pub comments_migrated: usize,

    /// Comments without content, never sent.
    pub comments_skipped: usize,

    /// Warnings generated during migration.
    pub warnings: Vec<String>,

    /// Start time of migration.
    pub started_at: Option<DateTime<Utc>>,

    /// End time of migration.
    pub completed_at: Option<DateTime<Utc>>,
}

impl MigrationReport {
    /// Create a new empty report.
    pub fn new(project_path: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark the migration as complete.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Whether the run reached the end.
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Remote objects created by the run.
    pub fn total_created(&self) -> usize {
        self.milestones_created + self.labels_created + self.issues_migrated + self.comments_migrated
    }

    /// Add a warning to the report.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Get the duration of the migration.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Print a summary of the migration.
    pub fn print_summary(&self) {
        println!("\n=== Migration Summary ===\n");
        println!("Project:            {}", self.project_path);
        println!(
            "Milestones:         {} created, {} existing",
            self.milestones_created, self.milestones_skipped
        );
        println!(
            "Labels:             {} created, {} existing",
            self.labels_created, self.labels_skipped
        );
        println!(
            "Issues migrated:    {} ({} closed, {} unassigned)",
            self.issues_migrated, self.issues_closed, self.issues_unassigned
        );
        println!(
            "Comments migrated:  {} ({} empty skipped)",
            self.comments_migrated, self.comments_skipped
        );

        if let Some(duration) = self.duration() {
            println!("\nCompleted in {} seconds", duration.num_seconds());
        }

        if !self.warnings.is_empty() {
            println!("\nWarnings ({}):", self.warnings.len());
            for warning in &self.warnings {
                println!("  - {warning}");
            }
        }

        let status = if self.is_complete() {
            style("SUCCESS").green().bold()
        } else {
            style("INCOMPLETE").red().bold()
        };
        println!("\nOverall Status: {status}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_totals() {
        let mut report = MigrationReport::new("repo/name");
        report.milestones_created = 2;
        report.labels_created = 6;
        report.issues_migrated = 10;
        report.comments_migrated = 5;
        report.comments_skipped = 3;

        assert_eq!(report.total_created(), 23);
        assert!(!report.is_complete());

        report.complete();
        assert!(report.is_complete());
        assert!(report.duration().is_some());
    }
}
