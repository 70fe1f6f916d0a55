//! Vercel project creation over the REST API.

use launchpad_core::EnvVars;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to create one project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub framework: String,
    pub output_directory: String,
    /// GitHub repository as `owner/repo`
    pub repo: String,
    pub env: EnvVars,
}

#[derive(Debug, Clone)]
pub struct ProjectCreated {
    pub id: String,
    /// Full response body
    pub details: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRequest<'a> {
    name: &'a str,
    framework: &'a str,
    enable_preview_feedback: bool,
    output_directory: &'a str,
    git_repository: GitRepository<'a>,
    environment_variables: Vec<EnvironmentVariable<'a>>,
}

#[derive(Serialize)]
struct GitRepository<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    repo: &'a str,
}

#[derive(Serialize)]
struct EnvironmentVariable<'a> {
    key: &'a str,
    value: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    target: &'static str,
}

impl<'a> From<&'a CreateProject> for ProjectRequest<'a> {
    fn from(project: &'a CreateProject) -> Self {
        Self {
            name: &project.name,
            framework: &project.framework,
            enable_preview_feedback: true,
            output_directory: &project.output_directory,
            git_repository: GitRepository {
                kind: "github",
                repo: &project.repo,
            },
            environment_variables: project
                .env
                .iter()
                .map(|var| EnvironmentVariable {
                    key: &var.key,
                    value: &var.value,
                    kind: "plain",
                    target: "production",
                })
                .collect(),
        }
    }
}

/// Vercel REST client. One request per call; no retries.
#[derive(Clone)]
pub struct VercelClient {
    token: SecretString,
    api_url: String,
    team_id: Option<String>,
    http: Client,
}

impl std::fmt::Debug for VercelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VercelClient")
            .field("api_url", &self.api_url)
            .field("team_id", &self.team_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl VercelClient {
    pub fn new(
        token: SecretString,
        api_url: &str,
        team_id: Option<String>,
    ) -> Result<Self, VercelError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| VercelError::Request { source: e })?;

        Ok(Self {
            token,
            api_url: api_url.trim_end_matches('/').to_owned(),
            team_id,
            http,
        })
    }

    /// Create a project linked to a GitHub repository.
    ///
    /// Does not check for an existing project first; Vercel rejects a
    /// duplicate name, which surfaces as [`VercelError::Api`].
    pub async fn create_project(
        &self,
        project: &CreateProject,
    ) -> Result<ProjectCreated, VercelError> {
        validate_repo(&project.repo)?;

        let url = format!("{}/v11/projects", self.api_url);
        tracing::debug!(%url, name = %project.name, env_count = project.env.len(), "creating vercel project");

        let mut request = self
            .http
            .post(&url)
            .bearer_auth(self.token.expose_secret())
            .json(&ProjectRequest::from(project));
        if let Some(team_id) = &self.team_id {
            request = request.query(&[("teamId", team_id)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VercelError::Request { source: e })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VercelError::Request { source: e })?;

        if !status.is_success() {
            // arch-lint: allow(no-silent-result-drop) reason="bodies without error.message fall back to the raw text"
            let message = extract_error_message(&body).unwrap_or_else(|| {
                if body.trim().is_empty() {
                    // arch-lint: allow(no-silent-result-drop) reason="non-standard status codes have no reason phrase"
                    status.canonical_reason().unwrap_or("request failed").to_owned()
                } else {
                    body.clone()
                }
            });
            return Err(VercelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let details: Value =
            serde_json::from_str(&body).map_err(|e| VercelError::Decode { source: e })?;
        let id = details
            .get("id")
            .and_then(Value::as_str)
            .ok_or(VercelError::MissingProjectId)?
            .to_owned();

        tracing::info!(id = %id, name = %project.name, "vercel project created");
        Ok(ProjectCreated { id, details })
    }
}

/// `owner/repo`, both parts non-empty.
pub fn validate_repo(repo: &str) -> Result<(), VercelError> {
    match repo.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => Err(VercelError::InvalidRepo(repo.to_owned())),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body)
        // arch-lint: allow(no-silent-result-drop) reason="non-JSON error bodies fall back to the raw body text"
        .ok()?;

    parsed
        .get("error")
        .and_then(|error| error.get("message"))
        .or_else(|| parsed.get("message"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

#[derive(Debug, thiserror::Error)]
pub enum VercelError {
    #[error("invalid repository {0:?} — expected owner/repo")]
    InvalidRepo(String),

    #[error("vercel request failed")]
    Request { source: reqwest::Error },

    #[error("vercel API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected vercel response")]
    Decode { source: serde_json::Error },

    #[error("vercel response did not include a project id")]
    MissingProjectId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> CreateProject {
        CreateProject {
            name: "portfolio-prod".to_owned(),
            framework: "nextjs".to_owned(),
            output_directory: "out".to_owned(),
            repo: "acme/portfolio".to_owned(),
            env: [
                ("API_URL".to_owned(), "https://api.example.dev".to_owned()),
                ("FLAG".to_owned(), "on".to_owned()),
            ]
            .into_iter()
            .collect(),
        }
    }

    fn client(url: &str) -> VercelClient {
        VercelClient::new(SecretString::from("tok_123"), url, None).unwrap()
    }

    #[test]
    fn request_body_tags_env_as_plain_production() {
        let p = project();
        let body = serde_json::to_value(ProjectRequest::from(&p)).unwrap();

        assert_eq!(body["name"], "portfolio-prod");
        assert_eq!(body["framework"], "nextjs");
        assert_eq!(body["enablePreviewFeedback"], true);
        assert_eq!(body["outputDirectory"], "out");
        assert_eq!(body["gitRepository"]["type"], "github");
        assert_eq!(body["gitRepository"]["repo"], "acme/portfolio");

        let vars = body["environmentVariables"].as_array().unwrap();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0]["key"], "API_URL");
        assert_eq!(vars[0]["value"], "https://api.example.dev");
        assert_eq!(vars[0]["type"], "plain");
        assert_eq!(vars[0]["target"], "production");
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", client("https://api.vercel.com"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("tok_123"));
    }

    #[test]
    fn repo_must_be_owner_slash_name() {
        assert!(validate_repo("acme/portfolio").is_ok());
        assert!(validate_repo("portfolio").is_err());
        assert!(validate_repo("/portfolio").is_err());
        assert!(validate_repo("acme/").is_err());
        assert!(validate_repo("a/b/c").is_err());
    }

    #[tokio::test]
    async fn create_project_returns_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v11/projects")
            .match_header("authorization", "Bearer tok_123")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "name": "portfolio-prod",
                "gitRepository": { "type": "github", "repo": "acme/portfolio" },
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "prj_abc", "name": "portfolio-prod"}"#)
            .expect(1)
            .create_async()
            .await;

        let created = client(&server.url()).create_project(&project()).await.unwrap();

        assert_eq!(created.id, "prj_abc");
        assert_eq!(created.details["name"], "portfolio-prod");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn team_id_sent_as_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v11/projects")
            .match_query(mockito::Matcher::UrlEncoded(
                "teamId".into(),
                "team_9".into(),
            ))
            .with_status(200)
            .with_body(r#"{"id": "prj_team"}"#)
            .create_async()
            .await;

        let client =
            VercelClient::new(SecretString::from("tok"), &server.url(), Some("team_9".to_owned()))
                .unwrap();
        let created = client.create_project(&project()).await.unwrap();

        assert_eq!(created.id, "prj_team");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_error_propagates_with_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v11/projects")
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"code": "conflict", "message": "Project already exists"}}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .create_project(&project())
            .await
            .unwrap_err();

        match err {
            VercelError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Project already exists");
            }
            other => panic!("expected Api error, got: {other}"),
        }
    }

    #[tokio::test]
    async fn api_error_without_json_uses_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v11/projects")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let err = client(&server.url())
            .create_project(&project())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("upstream exploded"), "got: {err}");
    }

    #[tokio::test]
    async fn success_without_id_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v11/projects")
            .with_status(200)
            .with_body(r#"{"name": "portfolio-prod"}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .create_project(&project())
            .await
            .unwrap_err();

        assert!(matches!(err, VercelError::MissingProjectId), "got: {err}");
    }

    #[tokio::test]
    async fn invalid_repo_rejected_before_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v11/projects")
            .expect(0)
            .create_async()
            .await;

        let mut p = project();
        p.repo = "not-a-repo".to_owned();
        let err = client(&server.url()).create_project(&p).await.unwrap_err();

        assert!(matches!(err, VercelError::InvalidRepo(_)), "got: {err}");
        mock.assert_async().await;
    }
}
