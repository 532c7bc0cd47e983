//! Field and priority mappings from Bitbucket to GitLab.

use crate::bundle::{Issue, STATUS_ON_HOLD};
use crate::error::Result;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bitbucket issue field → GitLab issue field.
pub const ISSUE_FIELD_MAP: &[(&str, &str)] = &[
    ("status", "state"),
    ("created_on", "created_at"),
    ("updated_on", "updated_at"),
    ("content", "description"),
];

/// Label attached to issues parked as `on hold`.
pub const ON_HOLD_LABEL: &str = STATUS_ON_HOLD;

/// Bitbucket issue priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Trivial,
    Minor,
    Major,
    Critical,
    Blocker,
}

impl Priority {
    /// All levels, lowest first.
    pub const ALL: [Priority; 5] = [
        Priority::Trivial,
        Priority::Minor,
        Priority::Major,
        Priority::Critical,
        Priority::Blocker,
    ];

    /// GitLab label for this priority.
    pub fn label(self) -> &'static str {
        match self {
            Self::Trivial => "P4",
            Self::Minor => "P3",
            Self::Major => "P2",
            Self::Critical => "P1",
            Self::Blocker => "P0",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trivial => write!(f, "trivial"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
            Self::Critical => write!(f, "critical"),
            Self::Blocker => write!(f, "blocker"),
        }
    }
}

/// Copy `source[from]` into `to` for every pair of `map`.
///
/// The result holds exactly the destination keys. A field missing from the
/// source becomes `null`; values are never converted.
pub fn translate(source: &Map<String, Value>, map: &[(&str, &str)]) -> Map<String, Value> {
    map.iter()
        .map(|(from, to)| {
            (
                (*to).to_string(),
                source.get(*from).cloned().unwrap_or(Value::Null),
            )
        })
        .collect()
}

/// Comma-joined label list: priority, then component, then `on hold`.
pub fn issue_labels(issue: &Issue) -> String {
    let mut labels = vec![issue.priority.label()];
    if let Some(component) = issue.component.as_deref() {
        labels.push(component);
    }
    if issue.is_on_hold() {
        labels.push(ON_HOLD_LABEL);
    }
    labels.join(",")
}

/// Payload sent to GitLab when creating an issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslatedIssue {
    /// Renamed Bitbucket fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,

    pub labels: String,
}

impl TranslatedIssue {
    /// Translate an issue's own fields. Assignee and milestone are resolved
    /// by the caller.
    pub fn from_issue(issue: &Issue) -> Result<Self> {
        let source = match serde_json::to_value(issue)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Ok(Self {
            fields: translate(&source, ISSUE_FIELD_MAP),
            assignee_id: None,
            milestone_id: None,
            labels: issue_labels(issue),
        })
    }
}
