//! Shared protocol definitions for the nydus dashboard, its console and the Bot API.

pub mod sse;

use serde::{Deserialize, Serialize};

pub use sse::{encode_frame, Frame, FrameDecoder, FrameTooLarge, MAX_PENDING_FRAME};

/// Message shown by consumers when the event stream breaks without a terminal frame.
pub const BRIDGE_CLOSED_MESSAGE: &str = "Bridge connection closed (Check if service is restarting).";

/// Message shown by consumers before the first frame arrives.
pub const CONNECTING_MESSAGE: &str = "Connecting to local bridge...";

// ============================================================================
// Restart events
// ============================================================================

/// Status carried by a restart event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayStatus {
    Progress,
    Success,
    Error,
}

/// One notification on the restart stream.
///
/// The Bot API omits `done` on intermediate frames, so it defaults to `false`.
/// A frame with `done == true` is terminal: nothing may follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEvent {
    pub status: RelayStatus,
    pub message: String,
    #[serde(default)]
    pub done: bool,
}

impl RelayEvent {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: RelayStatus::Success,
            message: message.into(),
            done: true,
        }
    }

    /// Terminal error event
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: RelayStatus::Error,
            message: message.into(),
            done: true,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.done
    }
}

// ============================================================================
// Bot API payloads
// ============================================================================

/// POST /projects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub project_name: String,
    pub tech_stack: String,
    pub github_repository_url: String,
    pub deploy_path: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

/// POST /github-projects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachProjectRequest {
    pub name: String,
    pub owner: String,
    pub owner_type: String,
    #[serde(default = "default_description")]
    pub description: String,
    pub url_path: String,
    pub git_url: String,
    pub ssh_url: String,
    pub visibility: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Empty when the caller has no user session
    #[serde(default)]
    pub owner_discord_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachProjectResponse {
    pub uuid: String,
}

/// POST /deployments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeploymentRequest {
    pub project_name: String,
    pub tech_stack: String,
    pub github_repository_url: String,
    pub subdomain: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub nginx_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentCreated {
    pub webhook_uuid: String,
    pub webhook_secret: String,
}

/// POST /cloudflare/records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecordPayload {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub proxied: bool,
    pub ttl: u32,
    #[serde(default)]
    pub comment: String,
}

impl DnsRecordPayload {
    /// Proxied A record for `<subdomain>.<zone>` pointing at the VPS.
    pub fn subdomain(subdomain: &str, zone: &str, vps_ip: &str, comment: impl Into<String>) -> Self {
        Self {
            record_type: "A".to_string(),
            name: format!("{}.{}", subdomain, zone),
            content: vps_ip.to_string(),
            proxied: true,
            // 1 means "automatic" to Cloudflare
            ttl: 1,
            comment: comment.into(),
        }
    }
}

/// GET /maintenance/logs/:service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceLogs {
    #[serde(default)]
    pub logs: String,
}

/// One sample from GET /stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostStats {
    #[serde(default)]
    pub cpu_percent: f64,
    #[serde(default)]
    pub ram_percent: f64,
}

/// Error body returned by the Bot API and by the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_description() -> String {
    "No description".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_frame_without_done() {
        let event: RelayEvent =
            serde_json::from_str(r#"{"status":"progress","message":"pulling"}"#).unwrap();
        assert_eq!(event.status, RelayStatus::Progress);
        assert_eq!(event.message, "pulling");
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_error_event_is_terminal() {
        let event = RelayEvent::error("fetch failed");
        assert!(event.is_terminal());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "message": "fetch failed", "done": true})
        );
    }

    #[test]
    fn test_unknown_status_rejected() {
        let result = serde_json::from_str::<RelayEvent>(r#"{"status":"weird","message":""}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_subdomain_record() {
        let record = DnsRecordPayload::subdomain("demo", "arvo.team", "10.0.0.7", "preview");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "A");
        assert_eq!(json["name"], "demo.arvo.team");
        assert_eq!(json["content"], "10.0.0.7");
        assert_eq!(json["proxied"], true);
        assert_eq!(json["ttl"], 1);
        assert_eq!(json["comment"], "preview");
    }

    #[test]
    fn test_deployment_defaults() {
        let req: CreateDeploymentRequest = serde_json::from_value(serde_json::json!({
            "project_name": "site",
            "tech_stack": "nextjs",
            "github_repository_url": "https://github.com/arvo/site",
            "subdomain": "site",
        }))
        .unwrap();
        assert_eq!(req.branch, "main");
        assert_eq!(req.nginx_port, 0);
    }
}
