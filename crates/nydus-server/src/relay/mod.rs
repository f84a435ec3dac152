//! Restart relay: re-streams a Bot API restart event stream to one client.
//!
//! Each request gets its own [`RelaySession`], run on its own task. The
//! session owns the upstream body and the [`Downstream`] writer; both are
//! released when `run` returns, whichever way it exits.

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use gotcha::axum::body::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use nydus_protocol::{encode_frame, FrameDecoder, RelayEvent};

use crate::bot::BotApiClient;

/// One chunk in flight between the relay task and the response body
const DOWNSTREAM_CAPACITY: usize = 1;

pub type DownstreamItem = Result<Bytes, Infallible>;

/// Response body fed by a relay session
pub type DownstreamBody = ReceiverStream<DownstreamItem>;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{0}")]
    Connect(String),
    #[error("{0}")]
    Read(String),
    #[error("Restart stream idle for {0:?}")]
    IdleTimeout(Duration),
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Upstream ended cleanly without a terminal frame
    Completed,
    /// Upstream's own terminal frame was forwarded
    Terminal,
    /// A terminal error event was synthesized
    Failed(String),
    /// The client went away; upstream was released
    ClientGone,
}

/// The client is no longer reading
#[derive(Debug)]
pub struct ClientGone;

/// Writer half of the downstream channel.
pub struct Downstream {
    tx: mpsc::Sender<DownstreamItem>,
}

impl Downstream {
    pub fn channel() -> (Self, DownstreamBody) {
        let (tx, rx) = mpsc::channel(DOWNSTREAM_CAPACITY);
        (Self { tx }, ReceiverStream::new(rx))
    }

    pub async fn write(&self, chunk: Bytes) -> Result<(), ClientGone> {
        self.tx.send(Ok(chunk)).await.map_err(|_| ClientGone)
    }

    /// Resolves once the reading side has been dropped
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

pub struct RelaySession {
    service: String,
    downstream: Downstream,
    idle_timeout: Option<Duration>,
    decoder: FrameDecoder,
    terminal: bool,
}

impl RelaySession {
    pub fn new(service: impl Into<String>, downstream: Downstream, idle_timeout: Option<Duration>) -> Self {
        Self {
            service: service.into(),
            downstream,
            idle_timeout,
            decoder: FrameDecoder::new(),
            terminal: false,
        }
    }

    /// Drive the session to completion. Never fails: every error ends up as a
    /// terminal error event on the downstream channel.
    pub async fn run<C, CE, S, E>(mut self, connect: C) -> RelayOutcome
    where
        C: Future<Output = Result<S, CE>>,
        CE: Display,
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Display,
    {
        tracing::info!(service = %self.service, "restart relay opened");

        let outcome = match self.pump(connect).await {
            Ok(outcome) => outcome,
            Err(err) => self.fail(err).await,
        };

        tracing::info!(service = %self.service, outcome = ?outcome, "restart relay closed");
        outcome
    }

    async fn pump<C, CE, S, E>(&mut self, connect: C) -> Result<RelayOutcome, RelayError>
    where
        C: Future<Output = Result<S, CE>>,
        CE: Display,
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Display,
    {
        let idle = self.idle_timeout;

        let mut upstream = tokio::select! {
            biased;
            _ = self.downstream.closed() => return Ok(RelayOutcome::ClientGone),
            connected = within(idle, connect) => match connected {
                None => return Err(RelayError::IdleTimeout(idle.unwrap_or_default())),
                Some(Err(e)) => return Err(RelayError::Connect(e.to_string())),
                Some(Ok(stream)) => stream,
            },
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = self.downstream.closed() => return Ok(RelayOutcome::ClientGone),
                next = within(idle, upstream.next()) => next,
            };

            let chunk = match next {
                None => return Err(RelayError::IdleTimeout(idle.unwrap_or_default())),
                Some(None) => return Ok(RelayOutcome::Completed),
                Some(Some(Err(e))) => return Err(RelayError::Read(e.to_string())),
                Some(Some(Ok(chunk))) => chunk,
            };

            let (chunk, terminal) = self.cut_at_terminal(chunk)?;
            if self.downstream.write(chunk).await.is_err() {
                return Ok(RelayOutcome::ClientGone);
            }
            if terminal {
                self.terminal = true;
                return Ok(RelayOutcome::Terminal);
            }
        }
    }

    /// Bytes are forwarded untouched; a chunk is only shortened when a
    /// terminal frame ends inside it.
    fn cut_at_terminal(&mut self, chunk: Bytes) -> Result<(Bytes, bool), RelayError> {
        let frames = self
            .decoder
            .push(&chunk)
            .map_err(|e| RelayError::Read(e.to_string()))?;
        Ok(match frames.iter().find(|f| f.is_terminal()) {
            Some(frame) => (chunk.slice(..frame.end), true),
            None => (chunk, false),
        })
    }

    async fn fail(&mut self, err: RelayError) -> RelayOutcome {
        let message = err.to_string();
        tracing::warn!(service = %self.service, error = %message, "restart relay failed");

        if !self.terminal {
            let frame = encode_frame(&RelayEvent::error(message.clone()));
            if self.downstream.write(Bytes::from(frame)).await.is_err() {
                return RelayOutcome::ClientGone;
            }
            self.terminal = true;
        }

        RelayOutcome::Failed(message)
    }
}

async fn within<F: Future>(limit: Option<Duration>, fut: F) -> Option<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}

/// Start a relay task for `service` and return the body it feeds.
pub fn spawn_restart_relay(
    bot: BotApiClient,
    service: String,
    idle_timeout: Option<Duration>,
) -> DownstreamBody {
    let (downstream, body) = Downstream::channel();
    let session = RelaySession::new(service.clone(), downstream, idle_timeout);

    tokio::spawn(async move {
        session
            .run(async move { bot.open_restart_stream(&service).await })
            .await
    });

    body
}
