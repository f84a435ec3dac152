use gotcha::axum::response::{IntoResponse, Response};
use gotcha::Gotcha;
use gotcha::Json;
use serde_json::json;
use tracing::{error, info};

use nydus_server::api::{deployments, dns, github, maintenance, projects, settings, stats};
use nydus_server::config::Settings;
use nydus_server::AppState;

// ============================================================================
// Health check handler
// ============================================================================

async fn health_check() -> Response {
    Json(json!({"status": "ok"})).into_response()
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting Nydus dashboard server");

    let config = Settings::new().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let app_state = AppState::new(config.application.clone());
    info!(
        bot_api_url = %app_state.settings.bot_api_url,
        idle_timeout_secs = app_state.settings.relay.idle_timeout_secs,
        "Bot API client initialized"
    );

    let addr = format!("{}:{}", &config.basic.host, &config.basic.port);
    info!("Starting server on http://{}", addr);

    Gotcha::with_types::<AppState, Settings>()
        .state(app_state)
        .config(config)
        // Health check
        .get("/api", health_check)
        // Maintenance routes
        .get("/api/maintenance/restart/:service", maintenance::restart_service)
        .get("/api/maintenance/logs/:service", maintenance::service_logs)
        // Host and traffic
        .get("/api/stats", stats::live_stats)
        .get("/api/analytics", stats::analytics)
        // Project routes
        .get("/api/projects", projects::list_projects)
        .post("/api/projects", projects::create_project)
        .delete("/api/projects/:uuid", projects::delete_project)
        .get("/api/github-projects", projects::list_github_projects)
        .post("/api/github-projects", projects::attach_github_project)
        .delete("/api/github-projects/:uuid", projects::detach_github_project)
        // Deployment routes
        .get("/api/deployments", deployments::list_deployments)
        .post("/api/deployments", deployments::create_deployment)
        .delete("/api/deployments/:uuid", deployments::delete_deployment)
        // DNS routes
        .get("/api/cloudflare/records", dns::list_records)
        .post("/api/cloudflare/records", dns::create_record)
        .delete("/api/cloudflare/records/:record_id", dns::delete_record)
        // GitHub routes
        .get("/api/github/repos", github::list_repos)
        // Settings routes
        .get("/api/settings", settings::get_settings)
        .post("/api/settings", settings::update_settings)
        .with_cors()
        .listen(addr)
        .await?;

    Ok(())
}
