use gotcha::axum::body::Body;
use gotcha::axum::extract::{Path, State};
use gotcha::axum::http::{header, StatusCode};
use gotcha::axum::response::{IntoResponse, Response};
use gotcha::Json;

use nydus_protocol::ServiceLogs;

use crate::api::error::ApiError;
use crate::bot::BotApiClient;
use crate::config::Settings;
use crate::relay::spawn_restart_relay;

/// GET /api/maintenance/restart/:service - Restart a service, streaming its progress
///
/// Always answers 200 with an event stream; failures arrive as a terminal
/// `error` event inside the stream.
pub async fn restart_service(
    State(bot): State<BotApiClient>,
    State(settings): State<Settings>,
    Path(service): Path<String>,
) -> Response {
    let body = spawn_restart_relay(bot, service, settings.relay.idle_timeout());

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

/// GET /api/maintenance/logs/:service - Recent log output of a service
pub async fn service_logs(
    State(bot): State<BotApiClient>,
    Path(service): Path<String>,
) -> Result<Json<ServiceLogs>, ApiError> {
    let logs = bot.service_logs(&service).await.map_err(|e| {
        tracing::warn!(service = %service, error = %e, "failed to fetch service logs");
        ApiError::internal(e.to_string())
    })?;
    Ok(Json(logs))
}
