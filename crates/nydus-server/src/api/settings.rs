//! Per-browser credentials kept in cookies.
//!
//! Nothing is persisted server-side; the dashboard reads these back on each
//! request that needs them.

use gotcha::axum::http::{header, HeaderMap, HeaderValue};
use gotcha::axum::response::{IntoResponse, Response};
use gotcha::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::error::ApiError;

pub const PAT_COOKIE: &str = "nydus_pat";
pub const CF_TOKEN_COOKIE: &str = "nydus_cf_token";
pub const CF_ZONE_COOKIE: &str = "nydus_cf_zone";

const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 30;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    pub pat: String,
    pub cf_token: String,
    pub cf_zone: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub pat: Option<String>,
    #[serde(default, alias = "cfToken")]
    pub cf_token: Option<String>,
    #[serde(default, alias = "cfZone")]
    pub cf_zone: Option<String>,
}

/// Value of cookie `name` from the request's `Cookie` headers
pub(crate) fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// GET /api/settings - Current cookie-stored credentials
pub async fn get_settings(headers: HeaderMap) -> Json<StoredSettings> {
    let read = |name: &str| read_cookie(&headers, name).unwrap_or_default();
    Json(StoredSettings {
        pat: read(PAT_COOKIE),
        cf_token: read(CF_TOKEN_COOKIE),
        cf_zone: read(CF_ZONE_COOKIE),
    })
}

/// POST /api/settings - Store credentials; an empty value clears the cookie
pub async fn update_settings(
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Response, ApiError> {
    let updates = [
        (PAT_COOKIE, payload.pat),
        (CF_TOKEN_COOKIE, payload.cf_token),
        (CF_ZONE_COOKIE, payload.cf_zone),
    ];

    let mut headers = HeaderMap::new();
    for (name, value) in updates {
        let Some(value) = value else { continue };
        let cookie = set_cookie(name, value.trim())?;
        headers.append(header::SET_COOKIE, cookie);
    }

    Ok((headers, Json(json!({"success": true}))).into_response())
}

fn set_cookie(name: &str, value: &str) -> Result<HeaderValue, ApiError> {
    if value.chars().any(|c| c == ';' || c == ',' || c.is_whitespace()) {
        return Err(ApiError::bad_request(format!("Invalid value for {}", name)));
    }

    let cookie = if value.is_empty() {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
    } else {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            name, value, COOKIE_MAX_AGE_SECS
        )
    };

    HeaderValue::from_str(&cookie)
        .map_err(|_| ApiError::bad_request(format!("Invalid value for {}", name)))
}
