//! Migration driver.
//!
//! Runs the fixed sequence: resolve the target project, sync milestones,
//! sync labels, then migrate issues in ascending id order with their notes
//! and closure. Calls are awaited one at a time.

use crate::bundle::{ImportBundle, Issue};
use crate::credentials::CredentialTable;
use crate::error::{MigrationError, Result};
use crate::gitlab::{GitLabApi, GitLabClient, GitLabIssue, GitLabProject};
use crate::index::{LabelIndex, MilestoneIndex};
use crate::mapping::{Priority, TranslatedIssue, ON_HOLD_LABEL};
use crate::progress::{MigrationPhase, MigrationProgress};
use crate::settings::{MigrationConfig, DEFAULT_LABEL_COLOR};
use crate::types::MigrationReport;

use tracing::{debug, info};

/// Migrates one export into one GitLab project.
pub struct Migrator<A> {
    handles: CredentialTable<A>,
    bundle: ImportBundle,
    project_path: String,
    label_color: String,
    progress: MigrationProgress,
}

impl Migrator<GitLabClient> {
    /// Load the export and build the GitLab handles described by `config`.
    pub fn from_config(config: &MigrationConfig) -> Result<Self> {
        config.validate()?;
        let bundle = ImportBundle::load(&config.input_path)?;
        let handles = CredentialTable::from_config(config)?;

        Ok(Self::new(handles, bundle, &config.project_path).with_label_color(&config.label_color))
    }
}

impl<A: GitLabApi> Migrator<A> {
    /// Create a new migrator.
    pub fn new(
        handles: CredentialTable<A>,
        bundle: ImportBundle,
        project_path: impl Into<String>,
    ) -> Self {
        Self {
            handles,
            bundle,
            project_path: project_path.into(),
            label_color: DEFAULT_LABEL_COLOR.to_string(),
            progress: MigrationProgress::new(),
        }
    }

    /// Set the colour of created labels.
    pub fn with_label_color(mut self, color: impl Into<String>) -> Self {
        self.label_color = color.into();
        self
    }

    /// Set a progress tracker.
    pub fn with_progress(mut self, progress: MigrationProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn bundle(&self) -> &ImportBundle {
        &self.bundle
    }

    /// Run the migration.
    pub async fn migrate(&self) -> Result<MigrationReport> {
        let mut report = MigrationReport::new(&self.project_path);

        info!("Starting Bitbucket migration into {}", self.project_path);

        let project = self.resolve_project().await?;
        report.project_id = Some(project.id);

        let milestones = self.sync_milestones(project.id, &mut report).await?;
        self.sync_labels(project.id, &mut report).await?;
        self.migrate_issues(project.id, &milestones, &mut report)
            .await?;

        self.progress.set_phase(MigrationPhase::Complete, 1);
        report.complete();

        Ok(report)
    }

    /// Find the target project among those visible to the default handle.
    pub async fn resolve_project(&self) -> Result<GitLabProject> {
        self.progress.set_phase(MigrationPhase::ResolvingProject, 1);
        self.progress.message("Fetching project list...");

        let projects = self.handles.default_handle()?.projects().await?;
        let project = projects
            .into_iter()
            .find(|p| p.path_with_namespace == self.project_path)
            .ok_or_else(|| MigrationError::ProjectNotFound(self.project_path.clone()))?;

        debug!(id = project.id, path = %project.path_with_namespace, "resolved project");
        self.progress.increment(Some(&project.path_with_namespace));
        Ok(project)
    }

    /// Create every bundle milestone missing from the project.
    pub async fn sync_milestones(
        &self,
        project_id: u64,
        report: &mut MigrationReport,
    ) -> Result<MilestoneIndex> {
        let gitlab = self.handles.default_handle()?;
        let mut index = MilestoneIndex::new(gitlab.milestones(project_id).await?);

        info!("found {} milestones to migrate", self.bundle.milestones.len());
        self.progress.set_phase(
            MigrationPhase::SyncingMilestones,
            self.bundle.milestones.len() as u64,
        );

        for milestone in &self.bundle.milestones {
            if index.find(&milestone.name).is_some() {
                debug!("skipping existing milestone '{}'", milestone.name);
                report.milestones_skipped += 1;
            } else {
                let created = gitlab.create_milestone(project_id, &milestone.name).await?;
                debug!(id = created.id, "created milestone '{}'", milestone.name);
                index.insert(created);
                report.milestones_created += 1;
            }
            self.progress.increment(Some(&milestone.name));
        }

        Ok(index)
    }

    /// Label names the project must carry: components, then priorities,
    /// then `on hold`.
    pub fn desired_labels(&self) -> Vec<String> {
        self.bundle
            .components
            .iter()
            .map(|c| c.name.clone())
            .chain(Priority::ALL.iter().map(|p| p.label().to_string()))
            .chain(std::iter::once(ON_HOLD_LABEL.to_string()))
            .collect()
    }

    /// Create every desired label missing from the project.
    pub async fn sync_labels(
        &self,
        project_id: u64,
        report: &mut MigrationReport,
    ) -> Result<LabelIndex> {
        let gitlab = self.handles.default_handle()?;
        let mut index = LabelIndex::new(gitlab.labels(project_id).await?);
        let desired = self.desired_labels();

        info!("found {} labels to sync", desired.len());
        self.progress
            .set_phase(MigrationPhase::SyncingLabels, desired.len() as u64);

        for name in &desired {
            if index.contains(name) {
                debug!("skipping existing label '{name}'");
                report.labels_skipped += 1;
            } else {
                let created = gitlab
                    .create_label(project_id, name, &self.label_color)
                    .await?;
                debug!("created label '{name}'");
                index.insert(created);
                report.labels_created += 1;
            }
            self.progress.increment(Some(name));
        }

        Ok(index)
    }

    /// Migrate all issues in ascending id order.
    pub async fn migrate_issues(
        &self,
        project_id: u64,
        milestones: &MilestoneIndex,
        report: &mut MigrationReport,
    ) -> Result<()> {
        info!("found {} issues to migrate", self.bundle.issues.len());
        self.progress.set_phase(
            MigrationPhase::MigratingIssues,
            self.bundle.issues.len() as u64,
        );

        // TODO: detect issues already migrated by an earlier run
        for issue in self.bundle.issues_by_id() {
            self.migrate_issue(project_id, issue, milestones, report)
                .await?;
            self.progress.increment(Some(&format!("Issue #{}", issue.id)));
        }

        Ok(())
    }

    /// Create one issue with its notes, closing it when its status asks for it.
    pub async fn migrate_issue(
        &self,
        project_id: u64,
        issue: &Issue,
        milestones: &MilestoneIndex,
        report: &mut MigrationReport,
    ) -> Result<GitLabIssue> {
        let comments = self.bundle.comments_for(issue.id);

        info!(
            "migrating issue #{} by {} with {} comments",
            issue.id,
            issue.reporter.as_deref().unwrap_or("anonymous"),
            comments.len()
        );

        let mut payload = TranslatedIssue::from_issue(issue)?;
        payload.assignee_id = self.resolve_assignee(issue.assignee.as_deref()).await;
        payload.milestone_id = issue
            .milestone
            .as_deref()
            .and_then(|name| milestones.find(name));

        if payload.assignee_id.is_none() {
            report.issues_unassigned += 1;
        }
        if let (Some(name), None) = (issue.milestone.as_deref(), payload.milestone_id) {
            report.add_warning(format!(
                "issue #{}: milestone '{name}' not found on GitLab",
                issue.id
            ));
        }

        let reporter = self.handles.writer(issue.reporter.as_deref())?;
        let created = reporter
            .create_issue(project_id, &issue.title, &payload)
            .await?;
        report.issues_migrated += 1;

        for comment in comments {
            match comment.content.as_deref() {
                Some(body) => {
                    self.handles
                        .writer(comment.user.as_deref())?
                        .create_issue_note(project_id, created.iid, body)
                        .await?;
                    report.comments_migrated += 1;
                }
                None => {
                    debug!(issue = issue.id, "skipping comment without content");
                    report.comments_skipped += 1;
                }
            }
        }

        if issue.should_close() {
            reporter.close_issue(project_id, created.iid).await?;
            debug!(issue = issue.id, status = %issue.status, "closed issue");
            report.issues_closed += 1;
        }

        Ok(created)
    }

    /// GitLab user id behind the assignee's handle.
    ///
    /// An issue without assignee resolves through the default handle; an
    /// unmapped assignee or a failed lookup leaves the issue unassigned.
    async fn resolve_assignee(&self, username: Option<&str>) -> Option<u64> {
        let handle = self.handles.handle(username)?;
        match handle.current_user().await {
            Ok(user) => Some(user.id),
            Err(e) => {
                debug!(
                    "could not resolve assignee '{}': {e}",
                    username.unwrap_or("default")
                );
                None
            }
        }
    }
}
