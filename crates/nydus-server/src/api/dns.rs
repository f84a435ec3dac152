use gotcha::axum::extract::{Path, Query, State};
use gotcha::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use nydus_protocol::DnsRecordPayload;

use crate::api::error::ApiError;
use crate::bot::BotApiClient;
use crate::config::Settings;
use crate::NydusError;

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub search: String,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CreateSubdomainRequest {
    pub subdomain: String,
    #[serde(default)]
    pub comment: String,
}

/// GET /api/cloudflare/records - One page of DNS records, optionally filtered by name
pub async fn list_records(
    State(bot): State<BotApiClient>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<Value>, ApiError> {
    let records = bot
        .list_dns_records(query.page.max(1), query.search.trim())
        .await?;
    Ok(Json(records))
}

/// POST /api/cloudflare/records - Create a proxied A record for a subdomain of the zone
pub async fn create_record(
    State(bot): State<BotApiClient>,
    State(settings): State<Settings>,
    Json(payload): Json<CreateSubdomainRequest>,
) -> Result<Json<Value>, ApiError> {
    let subdomain = validate_subdomain(&payload.subdomain)?;
    let record = DnsRecordPayload::subdomain(
        subdomain,
        &settings.zone_domain,
        &settings.vps_ip,
        payload.comment,
    );

    let created = bot.create_dns_record(&record).await?;
    tracing::info!(name = %record.name, "dns record created");
    Ok(Json(created))
}

/// DELETE /api/cloudflare/records/:record_id - Delete a DNS record
pub async fn delete_record(
    State(bot): State<BotApiClient>,
    Path(record_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    bot.delete_dns_record(&record_id).await?;
    Ok(Json(json!({"success": true})))
}

/// Subdomain labels: letters, digits, hyphens and dots, no leading/trailing separator
fn validate_subdomain(raw: &str) -> crate::Result<&str> {
    let subdomain = raw.trim();
    let valid_chars = subdomain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    let valid_edges = !subdomain.starts_with(['-', '.']) && !subdomain.ends_with(['-', '.']);

    if subdomain.is_empty() || !valid_chars || !valid_edges {
        return Err(NydusError::BadRequest(format!("invalid subdomain '{}'", raw)));
    }
    Ok(subdomain)
}
