use serde::{Deserialize, Serialize};
use serde_json::Value;

const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "Nydus-Tunnel";

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("Missing GitHub PAT")]
    MissingToken,
    #[error("Failed to connect to GitHub: {0}")]
    Network(String),
    #[error("GitHub API Error ({0})")]
    Status(u16),
    #[error("Unexpected GitHub response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
    #[serde(rename = "type")]
    pub owner_type: String,
}

/// Subset of GitHub's repository object the dashboard uses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubRepo {
    pub id: u64,
    pub name: String,
    pub owner: RepoOwner,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    pub clone_url: String,
    pub ssh_url: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
}

impl GithubClient {
    pub fn new() -> Self {
        Self::with_api_url(GITHUB_API_URL)
    }

    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Repositories visible to the token, most recently updated first
    pub async fn list_user_repos(&self, pat: &str) -> Result<Vec<GithubRepo>, GithubError> {
        if pat.is_empty() {
            return Err(GithubError::MissingToken);
        }

        let resp = self
            .http
            .get(format!("{}/user/repos", self.api_url))
            .query(&[("per_page", "100"), ("sort", "updated")])
            .bearer_auth(pat)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| GithubError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            tracing::warn!(status = %status, "GitHub repository listing failed");
            return Err(GithubError::Status(status.as_u16()));
        }

        resp.json()
            .await
            .map_err(|e| GithubError::Decode(e.to_string()))
    }
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop repositories that are already attached (matched on `url_path`,
/// case-insensitive) and sort the rest by name.
pub fn available_repos(repos: Vec<GithubRepo>, attached: &Value) -> Vec<GithubRepo> {
    let attached_urls: Vec<String> = attached
        .as_array()
        .map(|projects| {
            projects
                .iter()
                .filter_map(|p| p.get("url_path").and_then(Value::as_str))
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default();

    let mut available: Vec<GithubRepo> = repos
        .into_iter()
        .filter(|repo| !attached_urls.contains(&repo.html_url.to_lowercase()))
        .collect();
    available.sort_by(|a, b| a.name.cmp(&b.name));
    available
}
