use gotcha::axum::extract::{Path, State};
use gotcha::Json;
use serde_json::{json, Value};

use nydus_protocol::{CreateDeploymentRequest, DeploymentCreated};

use crate::api::error::ApiError;
use crate::bot::BotApiClient;

/// GET /api/deployments - List deployments
pub async fn list_deployments(State(bot): State<BotApiClient>) -> Result<Json<Value>, ApiError> {
    Ok(Json(bot.list_deployments().await?))
}

/// POST /api/deployments - Create a deployment and return its webhook credentials
pub async fn create_deployment(
    State(bot): State<BotApiClient>,
    Json(payload): Json<CreateDeploymentRequest>,
) -> Result<Json<DeploymentCreated>, ApiError> {
    let created = bot.create_deployment(&payload).await?;
    tracing::info!(
        project = %payload.project_name,
        subdomain = %payload.subdomain,
        webhook_uuid = %created.webhook_uuid,
        "deployment created"
    );
    Ok(Json(created))
}

/// DELETE /api/deployments/:uuid - Delete a deployment
pub async fn delete_deployment(
    State(bot): State<BotApiClient>,
    Path(uuid): Path<String>,
) -> Result<Json<Value>, ApiError> {
    bot.delete_deployment(&uuid).await?;
    Ok(Json(json!({"success": true})))
}
