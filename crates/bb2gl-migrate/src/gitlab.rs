//! GitLab REST API access.
//!
//! [`GitLabApi`] is the fixed set of remote operations the migration needs.
//! [`GitLabClient`] implements it over the v4 REST API for one private token.

use crate::error::{MigrationError, Result};
use crate::mapping::TranslatedIssue;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

const PER_PAGE: usize = 100;

/// GitLab API response types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabProject {
    pub id: u64,
    pub path_with_namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabMilestone {
    pub id: u64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabLabel {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabUser {
    pub id: u64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabIssue {
    pub id: u64,
    pub iid: u64,
    pub title: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabNote {
    pub id: u64,
    pub body: String,
}

/// Remote operations performed by one GitLab identity.
#[async_trait]
pub trait GitLabApi: Send + Sync {
    /// Projects the identity is a member of.
    async fn projects(&self) -> Result<Vec<GitLabProject>>;

    async fn milestones(&self, project_id: u64) -> Result<Vec<GitLabMilestone>>;

    async fn create_milestone(&self, project_id: u64, title: &str) -> Result<GitLabMilestone>;

    async fn labels(&self, project_id: u64) -> Result<Vec<GitLabLabel>>;

    async fn create_label(&self, project_id: u64, name: &str, color: &str) -> Result<GitLabLabel>;

    /// The user owning this handle's token.
    async fn current_user(&self) -> Result<GitLabUser>;

    async fn create_issue(
        &self,
        project_id: u64,
        title: &str,
        issue: &TranslatedIssue,
    ) -> Result<GitLabIssue>;

    async fn create_issue_note(
        &self,
        project_id: u64,
        issue_iid: u64,
        body: &str,
    ) -> Result<GitLabNote>;

    async fn close_issue(&self, project_id: u64, issue_iid: u64) -> Result<GitLabIssue>;
}

#[derive(Debug, Serialize)]
struct CreateMilestoneRequest<'a> {
    title: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateLabelRequest<'a> {
    name: &'a str,
    color: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateIssueRequest<'a> {
    title: &'a str,
    #[serde(flatten)]
    issue: &'a TranslatedIssue,
}

#[derive(Debug, Serialize)]
struct CreateNoteRequest<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateIssueRequest<'a> {
    state_event: &'a str,
}

/// GitLab client authenticated with one private token.
pub struct GitLabClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GitLabClient {
    /// Create a new GitLab client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root including the version, e.g. `https://gitlab.com/api/v4`
    /// * `token` - GitLab private token
    /// * `timeout` - per-request timeout
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("bb2gl")
            .timeout(timeout)
            .build()
            .map_err(|e| MigrationError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        trace!(%method, %url, "GitLab request");
        self.client
            .request(method, url)
            .header("PRIVATE-TOKEN", &self.token)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| MigrationError::NetworkError(e.to_string()))?;

        if response.status() == 401 {
            return Err(MigrationError::AuthenticationFailed(
                "Invalid GitLab token".to_string(),
            ));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MigrationError::ApiError(format!(
                "GitLab API error ({status}): {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| MigrationError::ApiError(e.to_string()))
    }

    async fn gitlab_get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(self.request(Method::GET, path)).await
    }

    async fn gitlab_send<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(self.request(method, path).json(body)).await
    }

    async fn gitlab_get_paginated<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        let mut page = 1;

        loop {
            let paginated_path = if path.contains('?') {
                format!("{path}&page={page}&per_page={PER_PAGE}")
            } else {
                format!("{path}?page={page}&per_page={PER_PAGE}")
            };

            let items: Vec<T> = self.gitlab_get(&paginated_path).await?;

            if items.is_empty() {
                break;
            }

            let count = items.len();
            all_items.extend(items);

            if count < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(all_items)
    }
}

#[async_trait]
impl GitLabApi for GitLabClient {
    async fn projects(&self) -> Result<Vec<GitLabProject>> {
        self.gitlab_get_paginated("/projects?membership=true&simple=true")
            .await
    }

    async fn milestones(&self, project_id: u64) -> Result<Vec<GitLabMilestone>> {
        self.gitlab_get_paginated(&format!("/projects/{project_id}/milestones"))
            .await
    }

    async fn create_milestone(&self, project_id: u64, title: &str) -> Result<GitLabMilestone> {
        self.gitlab_send(
            Method::POST,
            &format!("/projects/{project_id}/milestones"),
            &CreateMilestoneRequest { title },
        )
        .await
    }

    async fn labels(&self, project_id: u64) -> Result<Vec<GitLabLabel>> {
        self.gitlab_get_paginated(&format!("/projects/{project_id}/labels"))
            .await
    }

    async fn create_label(&self, project_id: u64, name: &str, color: &str) -> Result<GitLabLabel> {
        self.gitlab_send(
            Method::POST,
            &format!("/projects/{project_id}/labels"),
            &CreateLabelRequest { name, color },
        )
        .await
    }

    async fn current_user(&self) -> Result<GitLabUser> {
        self.gitlab_get("/user").await
    }

    async fn create_issue(
        &self,
        project_id: u64,
        title: &str,
        issue: &TranslatedIssue,
    ) -> Result<GitLabIssue> {
        self.gitlab_send(
            Method::POST,
            &format!("/projects/{project_id}/issues"),
            &CreateIssueRequest { title, issue },
        )
        .await
    }

    async fn create_issue_note(
        &self,
        project_id: u64,
        issue_iid: u64,
        body: &str,
    ) -> Result<GitLabNote> {
        self.gitlab_send(
            Method::POST,
            &format!("/projects/{project_id}/issues/{issue_iid}/notes"),
            &CreateNoteRequest { body },
        )
        .await
    }

    async fn close_issue(&self, project_id: u64, issue_iid: u64) -> Result<GitLabIssue> {
        self.gitlab_send(
            Method::PUT,
            &format!("/projects/{project_id}/issues/{issue_iid}"),
            &UpdateIssueRequest {
                state_event: "close",
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GitLabClient {
        GitLabClient::new(&server.uri(), "secret", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_current_user_sends_private_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("PRIVATE-TOKEN", "secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 12, "username": "alice"})),
            )
            .mount(&mock_server)
            .await;

        let user = client(&mock_server).current_user().await.unwrap();
        assert_eq!(user.id, 12);
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_authentication_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server).current_user().await.unwrap_err();
        assert!(matches!(err, MigrationError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn test_milestones_follow_pagination() {
        let mock_server = MockServer::start().await;

        let first_page: Vec<_> = (1..=100)
            .map(|i| json!({"id": i, "title": format!("m{i}")}))
            .collect();

        Mock::given(method("GET"))
            .and(path("/projects/3/milestones"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(first_page))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/projects/3/milestones"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": 101, "title": "last"}])),
            )
            .mount(&mock_server)
            .await;

        let milestones = client(&mock_server).milestones(3).await.unwrap();
        assert_eq!(milestones.len(), 101);
        assert_eq!(milestones[100].title, "last");
    }

    #[tokio::test]
    async fn test_create_issue_flattens_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/projects/3/issues"))
            .and(body_json(json!({
                "title": "Broken",
                "state": "new",
                "description": "text",
                "assignee_id": 12,
                "labels": "P3"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(
                json!({"id": 900, "iid": 1, "title": "Broken", "state": "opened"}),
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut fields = serde_json::Map::new();
        fields.insert("state".into(), json!("new"));
        fields.insert("description".into(), json!("text"));
        let payload = TranslatedIssue {
            fields,
            assignee_id: Some(12),
            milestone_id: None,
            labels: "P3".to_string(),
        };

        let issue = client(&mock_server)
            .create_issue(3, "Broken", &payload)
            .await
            .unwrap();
        assert_eq!(issue.iid, 1);
    }

    #[tokio::test]
    async fn test_close_issue_uses_state_event() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/projects/3/issues/4"))
            .and(body_json(json!({"state_event": "close"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"id": 900, "iid": 4, "title": "x", "state": "closed"}),
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let issue = client(&mock_server).close_issue(3, 4).await.unwrap();
        assert_eq!(issue.state.as_deref(), Some("closed"));
    }

    #[tokio::test]
    async fn test_api_error_carries_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/projects/3/labels"))
            .respond_with(ResponseTemplate::new(409).set_body_string("Label already exists"))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server)
            .create_label(3, "P1", "#808080")
            .await
            .unwrap_err();
        match err {
            MigrationError::ApiError(msg) => assert!(msg.contains("409")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
