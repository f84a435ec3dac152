use gotcha::axum::extract::{Query, State};
use gotcha::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::bot::BotApiClient;

/// GET /api/stats - Live host usage samples
pub async fn live_stats(State(bot): State<BotApiClient>) -> Result<Json<Value>, ApiError> {
    Ok(Json(bot.live_stats().await?))
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    1
}

/// GET /api/analytics - Cloudflare traffic analytics for the last `days` days
pub async fn analytics(
    State(bot): State<BotApiClient>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(bot.cloudflare_analytics(query.days.max(1)).await?))
}
