use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::github::api::GitHubApi;

pub struct GitHubClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    private: bool,
    description: &'a str,
}

#[derive(Serialize)]
struct CreateIssueRequest<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
struct UpdateIssueRequest<'a> {
    state: &'a str,
}

#[derive(Serialize)]
struct CreateCommentRequest<'a> {
    body: &'a str,
}

#[derive(Deserialize)]
struct CreatedIssue {
    number: u64,
}

impl GitHubClient {
    pub fn new(token: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("gitmigrator/0.1.0"),
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: "https://api.github.com".to_string(),
        })
    }

    /// Converts a non-success response into the error taxonomy. `subject`
    /// names the entity for AlreadyExists mapping on 422.
    async fn check(&self, response: Response, subject: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::Auth(format!("{} - {}", status, body)))
            }
            StatusCode::UNPROCESSABLE_ENTITY => Err(Error::AlreadyExists(subject.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);
                Err(Error::RateLimited(retry_after))
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::Api(format!("{}: {} - {}", subject, status, body)))
            }
        }
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn repo_exists(&self, org: &str, name: &str) -> Result<bool> {
        let url = format!("{}/repos/{}/{}", self.base_url, org, name);
        tracing::debug!("Checking existence of {}/{}", org, name);

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        self.check(response, &format!("{}/{}", org, name)).await?;
        Ok(true)
    }

    async fn create_repository(&self, org: &str, name: &str, description: &str) -> Result<()> {
        let url = format!("{}/orgs/{}/repos", self.base_url, org);
        tracing::info!("Creating repository {}/{}", org, name);

        let response = self
            .client
            .post(&url)
            .json(&CreateRepoRequest {
                name,
                private: true,
                description,
            })
            .send()
            .await?;
        self.check(response, &format!("repository {}/{}", org, name))
            .await?;
        Ok(())
    }

    async fn create_issue(&self, org: &str, repo: &str, title: &str, body: &str) -> Result<u64> {
        let url = format!("{}/repos/{}/{}/issues", self.base_url, org, repo);
        tracing::debug!("Creating issue in {}/{}: {}", org, repo, title);

        let response = self
            .client
            .post(&url)
            .json(&CreateIssueRequest { title, body })
            .send()
            .await?;
        let response = self
            .check(response, &format!("issue in {}/{}", org, repo))
            .await?;

        let created: CreatedIssue = response.json().await?;
        Ok(created.number)
    }

    async fn close_issue(&self, org: &str, repo: &str, number: u64) -> Result<()> {
        let url = format!("{}/repos/{}/{}/issues/{}", self.base_url, org, repo, number);
        tracing::debug!("Closing issue {}/{}#{}", org, repo, number);

        let response = self
            .client
            .patch(&url)
            .json(&UpdateIssueRequest { state: "closed" })
            .send()
            .await?;
        self.check(response, &format!("issue {}/{}#{}", org, repo, number))
            .await?;
        Ok(())
    }

    async fn create_comment(&self, org: &str, repo: &str, number: u64, body: &str) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.base_url, org, repo, number
        );
        tracing::debug!("Commenting on {}/{}#{}", org, repo, number);

        let response = self
            .client
            .post(&url)
            .json(&CreateCommentRequest { body })
            .send()
            .await?;
        self.check(response, &format!("comment on {}/{}#{}", org, repo, number))
            .await?;
        Ok(())
    }
}
