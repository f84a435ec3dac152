use anyhow::{Context, Result};

use nydus_protocol::{ErrorBody, HostStats, ServiceLogs};

/// Plain JSON routes of the dashboard
#[derive(Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn service_logs(&self, service: &str) -> Result<String> {
        let logs: ServiceLogs = self
            .get(&format!("api/maintenance/logs/{}", service))
            .await
            .with_context(|| format!("Failed to fetch logs for {}", service))?;
        Ok(logs.logs)
    }

    pub async fn live_stats(&self) -> Result<HostStats> {
        self.get("api/stats").await.context("Failed to fetch stats")
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            anyhow::bail!("dashboard returned {}: {}", status.as_u16(), message);
        }

        Ok(resp.json().await?)
    }
}
