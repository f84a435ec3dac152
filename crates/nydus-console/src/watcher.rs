//! Follows a restart event stream and reduces it to the state shown to the
//! operator.
//!
//! The watcher never reports a transport problem as such. Anything that ends
//! the stream before a `done` event leaves the operator looking at
//! [`BRIDGE_CLOSED_MESSAGE`], since the dashboard itself may be the service
//! being restarted.

use futures_util::StreamExt;
use reqwest::StatusCode;

use nydus_protocol::{
    FrameDecoder, FrameTooLarge, RelayEvent, RelayStatus, BRIDGE_CLOSED_MESSAGE,
    CONNECTING_MESSAGE,
};

/// What the console currently shows for a restart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartProgress {
    pub status: RelayStatus,
    pub message: String,
}

impl RestartProgress {
    pub fn connecting() -> Self {
        Self {
            status: RelayStatus::Progress,
            message: CONNECTING_MESSAGE.to_string(),
        }
    }

    pub fn bridge_closed() -> Self {
        Self {
            status: RelayStatus::Error,
            message: BRIDGE_CLOSED_MESSAGE.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RelayStatus::Success
    }
}

impl From<RelayEvent> for RestartProgress {
    fn from(event: RelayEvent) -> Self {
        Self {
            status: event.status,
            message: event.message,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum WatchError {
    #[error("connect failed: {0}")]
    Connect(reqwest::Error),
    #[error("dashboard returned {0}")]
    Status(StatusCode),
    #[error("read failed: {0}")]
    Read(reqwest::Error),
    #[error(transparent)]
    Decode(#[from] FrameTooLarge),
    #[error("stream closed before a final event")]
    Closed,
}

pub struct RestartWatcher {
    http: reqwest::Client,
    base_url: String,
}

impl RestartWatcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn restart_url(&self, service: &str) -> String {
        format!("{}/api/maintenance/restart/{}", self.base_url, service)
    }

    /// Restart `service` and report every state change to `on_update`.
    ///
    /// Returns the final state: the stream's `done` event, or the
    /// bridge-closed error when the stream ended any other way. The
    /// connection is dropped as soon as either is reached.
    pub async fn watch<F>(&self, service: &str, mut on_update: F) -> RestartProgress
    where
        F: FnMut(&RestartProgress),
    {
        on_update(&RestartProgress::connecting());

        match self.follow(service, &mut on_update).await {
            Ok(last) => last,
            Err(e) => {
                tracing::debug!(service = %service, error = %e, "restart stream lost");
                let closed = RestartProgress::bridge_closed();
                on_update(&closed);
                closed
            }
        }
    }

    async fn follow<F>(&self, service: &str, on_update: &mut F) -> Result<RestartProgress, WatchError>
    where
        F: FnMut(&RestartProgress),
    {
        let resp = self
            .http
            .get(self.restart_url(service))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(WatchError::Connect)?;

        if !resp.status().is_success() {
            return Err(WatchError::Status(resp.status()));
        }

        let mut body = resp.bytes_stream();
        let mut decoder = FrameDecoder::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(WatchError::Read)?;

            for frame in decoder.push(&chunk)? {
                let event = match frame.relay_event() {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(service = %service, data = %frame.data, error = %e, "skipping malformed restart event");
                        continue;
                    }
                };

                let done = event.done;
                let progress = RestartProgress::from(event);
                on_update(&progress);
                if done {
                    return Ok(progress);
                }
            }
        }

        Err(WatchError::Closed)
    }
}
