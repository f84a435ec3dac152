use gotcha::axum::extract::{Path, State};
use gotcha::Json;
use serde_json::{json, Value};

use nydus_protocol::{AttachProjectRequest, AttachProjectResponse, CreateProjectRequest};

use crate::api::error::ApiError;
use crate::bot::BotApiClient;

/// GET /api/projects - List projects known to the bot
pub async fn list_projects(State(bot): State<BotApiClient>) -> Result<Json<Value>, ApiError> {
    Ok(Json(bot.list_projects().await?))
}

/// POST /api/projects - Create a project
pub async fn create_project(
    State(bot): State<BotApiClient>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(bot.create_project(&payload).await?))
}

/// DELETE /api/projects/:uuid - Delete a project
pub async fn delete_project(
    State(bot): State<BotApiClient>,
    Path(uuid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    bot.delete_project(&uuid).await?;
    Ok(Json(json!({"success": true})))
}

/// GET /api/github-projects - List attached GitHub repositories
pub async fn list_github_projects(
    State(bot): State<BotApiClient>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(bot.list_github_projects().await?))
}

/// POST /api/github-projects - Attach a GitHub repository
pub async fn attach_github_project(
    State(bot): State<BotApiClient>,
    Json(payload): Json<AttachProjectRequest>,
) -> Result<Json<AttachProjectResponse>, ApiError> {
    if payload.owner_discord_id.trim().is_empty() {
        return Err(ApiError::unauthorized(
            "Unauthorized: No user session found",
        ));
    }

    let attached = bot.attach_github_project(&payload).await?;
    tracing::info!(name = %payload.name, uuid = %attached.uuid, "attached github project");
    Ok(Json(attached))
}

/// DELETE /api/github-projects/:uuid - Detach a GitHub repository
pub async fn detach_github_project(
    State(bot): State<BotApiClient>,
    Path(uuid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    bot.detach_github_project(&uuid).await?;
    Ok(Json(json!({"success": true})))
}
