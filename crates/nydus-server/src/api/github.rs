use gotcha::axum::extract::{Query, State};
use gotcha::axum::http::HeaderMap;
use gotcha::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::settings::{read_cookie, PAT_COOKIE};
use crate::bot::BotApiClient;
use crate::config::Settings;
use crate::github::{available_repos, GithubClient, GithubError, GithubRepo};

#[derive(Debug, Deserialize)]
pub struct ReposQuery {
    /// Only return repositories not yet attached as projects
    #[serde(default)]
    pub available: bool,
}

/// GET /api/github/repos - Repositories visible to the configured GitHub token
pub async fn list_repos(
    State(github): State<GithubClient>,
    State(bot): State<BotApiClient>,
    State(settings): State<Settings>,
    headers: HeaderMap,
    Query(query): Query<ReposQuery>,
) -> Result<Json<Vec<GithubRepo>>, ApiError> {
    let pat = resolve_pat(&headers, settings.github_pat).ok_or(GithubError::MissingToken)?;

    let repos = github.list_user_repos(&pat).await?;
    if !query.available {
        return Ok(Json(repos));
    }

    let attached = bot.list_github_projects().await?;
    Ok(Json(available_repos(repos, &attached)))
}

/// The `nydus_pat` cookie when set and non-empty, else the configured token
fn resolve_pat(headers: &HeaderMap, configured: Option<String>) -> Option<String> {
    read_cookie(headers, PAT_COOKIE)
        .filter(|pat| !pat.is_empty())
        .or(configured)
        .filter(|pat| !pat.is_empty())
}
