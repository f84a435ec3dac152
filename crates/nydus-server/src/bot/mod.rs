//! Typed client for the Bot API.
//!
//! Every dashboard route that touches projects, deployments, DNS, analytics or
//! maintenance goes through [`BotApiClient`]. Listing endpoints return the Bot
//! API's JSON untouched; mutations use the typed payloads from `nydus-protocol`.

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use gotcha::axum::body::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use nydus_protocol::{
    AttachProjectRequest, AttachProjectResponse, CreateDeploymentRequest, CreateProjectRequest,
    DeploymentCreated, DnsRecordPayload, ErrorBody, ServiceLogs,
};

const DNS_PAGE_SIZE: u32 = 20;

/// Body of a restart stream as read from the Bot API
pub type RestartStream = BoxStream<'static, reqwest::Result<Bytes>>;

#[derive(Debug, thiserror::Error)]
pub enum BotApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("invalid response from Bot API: {0}")]
    Decode(String),
}

#[derive(Clone)]
pub struct BotApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl BotApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ------------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------------

    pub async fn list_projects(&self) -> Result<Value, BotApiError> {
        self.get_json("projects", "Failed to fetch projects").await
    }

    pub async fn create_project(&self, req: &CreateProjectRequest) -> Result<Value, BotApiError> {
        self.send_json(Method::POST, "projects", req, "Failed to create project")
            .await
    }

    pub async fn delete_project(&self, uuid: &str) -> Result<(), BotApiError> {
        self.delete(&format!("projects/{}", uuid), "Delete failed").await
    }

    // ------------------------------------------------------------------------
    // GitHub project attachments
    // ------------------------------------------------------------------------

    pub async fn list_github_projects(&self) -> Result<Value, BotApiError> {
        self.get_json("github-projects", "Failed to fetch attached projects")
            .await
    }

    pub async fn attach_github_project(
        &self,
        req: &AttachProjectRequest,
    ) -> Result<AttachProjectResponse, BotApiError> {
        self.send_json(Method::POST, "github-projects", req, "Failed to attach project")
            .await
    }

    pub async fn detach_github_project(&self, uuid: &str) -> Result<(), BotApiError> {
        self.delete(&format!("github-projects/{}", uuid), "Delete failed")
            .await
    }

    // ------------------------------------------------------------------------
    // Deployments
    // ------------------------------------------------------------------------

    pub async fn list_deployments(&self) -> Result<Value, BotApiError> {
        self.get_json("deployments", "Failed to fetch deployments").await
    }

    pub async fn create_deployment(
        &self,
        req: &CreateDeploymentRequest,
    ) -> Result<DeploymentCreated, BotApiError> {
        self.send_json(Method::POST, "deployments", req, "Failed to create deployment")
            .await
    }

    pub async fn delete_deployment(&self, uuid: &str) -> Result<(), BotApiError> {
        self.delete(&format!("deployments/{}", uuid), "Delete failed")
            .await
    }

    // ------------------------------------------------------------------------
    // Cloudflare
    // ------------------------------------------------------------------------

    pub async fn list_dns_records(&self, page: u32, search: &str) -> Result<Value, BotApiError> {
        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", DNS_PAGE_SIZE.to_string()),
        ];
        if !search.is_empty() {
            query.push(("name", search.to_string()));
        }

        let resp = self
            .http
            .get(self.url("cloudflare/records"))
            .query(&query)
            .send()
            .await
            .map_err(|e| BotApiError::Network(e.to_string()))?;
        let resp = check(resp, "Failed to fetch records").await?;
        decode(resp).await
    }

    pub async fn create_dns_record(&self, record: &DnsRecordPayload) -> Result<Value, BotApiError> {
        self.send_json(Method::POST, "cloudflare/records", record, "Creation failed")
            .await
    }

    pub async fn delete_dns_record(&self, record_id: &str) -> Result<(), BotApiError> {
        self.delete(&format!("cloudflare/records/{}", record_id), "Delete failed")
            .await
    }

    pub async fn cloudflare_analytics(&self, days: u32) -> Result<Value, BotApiError> {
        let resp = self
            .http
            .get(self.url("cloudflare/analytics"))
            .query(&[("days", days)])
            .send()
            .await
            .map_err(|e| BotApiError::Network(e.to_string()))?;
        let resp = check(resp, "Failed to fetch analytics").await?;
        decode(resp).await
    }

    // ------------------------------------------------------------------------
    // Host and maintenance
    // ------------------------------------------------------------------------

    pub async fn live_stats(&self) -> Result<Value, BotApiError> {
        self.get_json("stats", "Failed to fetch stats").await
    }

    pub async fn service_logs(&self, service: &str) -> Result<ServiceLogs, BotApiError> {
        self.get_json(
            &format!("maintenance/logs/{}", service),
            &format!("Failed to fetch logs for {}", service),
        )
        .await
    }

    /// Start a restart of `service` and return its event stream body.
    ///
    /// The service name is put into the path as given. No request timeout is
    /// set here; the relay bounds idle time itself.
    pub async fn open_restart_stream(
        &self,
        service: &str,
    ) -> Result<RestartStream, BotApiError> {
        let resp = self
            .http
            .get(self.url(&format!("maintenance/restart/{}", service)))
            .send()
            .await
            .map_err(|e| BotApiError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BotApiError::Status {
                status: status.as_u16(),
                message: format!("Bot API returned {}", status),
            });
        }

        Ok(resp.bytes_stream().boxed())
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        fallback: &str,
    ) -> Result<T, BotApiError> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| BotApiError::Network(e.to_string()))?;
        let resp = check(resp, fallback).await?;
        decode(resp).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<T, BotApiError> {
        let resp = self
            .http
            .request(method, self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| BotApiError::Network(e.to_string()))?;
        let resp = check(resp, fallback).await?;
        decode(resp).await
    }

    async fn delete(&self, path: &str, fallback: &str) -> Result<(), BotApiError> {
        let resp = self
            .http
            .delete(self.url(path))
            .send()
            .await
            .map_err(|e| BotApiError::Network(e.to_string()))?;
        check(resp, fallback).await?;
        Ok(())
    }
}

/// Turn a non-success response into `BotApiError::Status`, preferring the
/// Bot API's own `{"error": ...}` message over `fallback`.
async fn check(resp: reqwest::Response, fallback: &str) -> Result<reqwest::Response, BotApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or_else(|_| fallback.to_string());

    tracing::warn!(status = %status, message = %message, "Bot API request failed");
    Err(BotApiError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BotApiError> {
    resp.json::<T>()
        .await
        .map_err(|e| BotApiError::Decode(e.to_string()))
}
