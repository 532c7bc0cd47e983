//! Name lookups over the target project's milestones and labels.
//!
//! Both indexes are filled once per run from GitLab and extended with
//! whatever the run creates; they are never re-fetched.

use crate::gitlab::{GitLabLabel, GitLabMilestone};

/// Existing milestones of the target project, by title.
#[derive(Debug, Clone, Default)]
pub struct MilestoneIndex {
    milestones: Vec<GitLabMilestone>,
}

impl MilestoneIndex {
    pub fn new(milestones: Vec<GitLabMilestone>) -> Self {
        Self { milestones }
    }

    /// Id of the milestone titled exactly `title`.
    pub fn find(&self, title: &str) -> Option<u64> {
        self.milestones
            .iter()
            .find(|m| m.title == title)
            .map(|m| m.id)
    }

    pub fn insert(&mut self, milestone: GitLabMilestone) {
        self.milestones.push(milestone);
    }

    pub fn len(&self) -> usize {
        self.milestones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }
}

/// Existing labels of the target project, by name.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    labels: Vec<GitLabLabel>,
}

impl LabelIndex {
    pub fn new(labels: Vec<GitLabLabel>) -> Self {
        Self { labels }
    }

    /// Label named exactly `name`.
    pub fn find(&self, name: &str) -> Option<&GitLabLabel> {
        self.labels.iter().find(|l| l.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn insert(&mut self, label: GitLabLabel) {
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
