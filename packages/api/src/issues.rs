//! Client for the issue-report service.
//!
//! The service is a small REST API: `GET {base}/issues` lists reported issues
//! and `POST {base}/issues` files a new one. It is separate from the
//! location and account data.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use store::config::IssuesConfig;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("Issue service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid issue service URL: {0}")]
    Url(String),
}

/// A reported problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "open".to_string()
}

impl Issue {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            description: description.to_string(),
            status: default_status(),
        }
    }

    /// One-line summary for lists.
    pub fn summary(&self) -> String {
        format!("{} - {}", self.title, self.status)
    }
}

#[derive(Debug, Clone)]
pub struct IssueClient {
    client: Client,
    issues_url: Url,
}

impl IssueClient {
    pub fn new(config: &IssuesConfig) -> Result<Self, IssueError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            issues_url: issues_url(&config.base_url)?,
        })
    }

    pub fn issues_url(&self) -> &Url {
        &self.issues_url
    }

    pub async fn list_issues(&self) -> Result<Vec<Issue>, IssueError> {
        let issues: Vec<Issue> = self
            .client
            .get(self.issues_url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(count = issues.len(), "issues fetched");
        Ok(issues)
    }

    pub async fn report_issue(&self, issue: &Issue) -> Result<(), IssueError> {
        self.client
            .post(self.issues_url.clone())
            .json(issue)
            .send()
            .await?
            .error_for_status()?;
        info!(title = %issue.title, "issue reported");
        Ok(())
    }
}

/// `{base}/issues`, tolerating a base with or without a trailing slash.
fn issues_url(base: &str) -> Result<Url, IssueError> {
    let base = base.trim();
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    let base = Url::parse(&base).map_err(|e| IssueError::Url(format!("{base}: {e}")))?;
    if base.cannot_be_a_base() {
        return Err(IssueError::Url(base.to_string()));
    }
    base.join("issues")
        .map_err(|e| IssueError::Url(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issues_url_joins_base() {
        assert_eq!(
            issues_url("https://your-api-url.com/api/").unwrap().as_str(),
            "https://your-api-url.com/api/issues"
        );
        assert_eq!(
            issues_url("http://localhost:8080/api").unwrap().as_str(),
            "http://localhost:8080/api/issues"
        );
    }

    #[test]
    fn test_bad_base_url() {
        assert!(matches!(issues_url("not a url"), Err(IssueError::Url(_))));
        assert!(matches!(issues_url("mailto:a@b.com"), Err(IssueError::Url(_))));
    }

    #[test]
    fn test_client_from_default_config() {
        let client = IssueClient::new(&IssuesConfig::default()).unwrap();
        assert_eq!(client.issues_url().path(), "/api/issues");
    }

    #[test]
    fn test_issue_wire_shape() {
        let issue: Issue = serde_json::from_str(r#"{"title":"Map blank"}"#).unwrap();
        assert_eq!(issue.status, "open");
        assert_eq!(issue.summary(), "Map blank - open");

        let json = serde_json::to_value(Issue::new("GPS drift", "Off by 50m")).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["description"], "Off by 50m");
    }
}
