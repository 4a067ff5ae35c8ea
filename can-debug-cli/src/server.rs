//! HTTP report server
//!
//! Serves rendered reports as `text/plain`. The server never decodes anything
//! itself: a [`PairSource`] supplies the frame pairs for each request and the
//! report writer turns them into the response body.

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use can_debug_decoder::{FramePair, ReportConfig, ReportWriter};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Header listing how many pairs were left out of a partial body
const SKIPPED_HEADER: &str = "x-skipped-reports";

/// Supplies the pairs rendered for a request
pub trait PairSource: Send + Sync + 'static {
    /// Pairs to render, in response order
    fn pairs(&self) -> Vec<FramePair>;
}

/// The most recent frame per identifier, ordered by identifier
#[derive(Debug, Clone, Default)]
pub struct LatestFrames {
    latest: BTreeMap<u32, FramePair>,
}

impl LatestFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pair, replacing any earlier frame with the same identifier
    pub fn observe(&mut self, pair: FramePair) {
        self.latest.insert(pair.frame().id(), pair);
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

impl FromIterator<FramePair> for LatestFrames {
    fn from_iter<I: IntoIterator<Item = FramePair>>(iter: I) -> Self {
        let mut latest = Self::new();
        for pair in iter {
            latest.observe(pair);
        }
        latest
    }
}

impl PairSource for LatestFrames {
    fn pairs(&self) -> Vec<FramePair> {
        self.latest.values().cloned().collect()
    }
}

/// Shared state injected into the axum handlers
struct ServerState {
    source: Arc<dyn PairSource>,
    writer: ReportWriter,
}

/// Builder used to configure and spawn the report server
pub struct ServerBuilder {
    listen: SocketAddr,
    source: Arc<dyn PairSource>,
    config: ReportConfig,
}

impl ServerBuilder {
    pub fn new(listen: SocketAddr, source: Arc<dyn PairSource>) -> Self {
        Self {
            listen,
            source,
            config: ReportConfig::default(),
        }
    }

    /// Builder method: set the report configuration
    pub fn with_report_config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    /// Spawn the server and return a handle that can be used to stop it
    pub async fn spawn(self) -> Result<ServerHandle> {
        let listener = TcpListener::bind(self.listen).await?;
        let local_addr = listener.local_addr()?;
        log::info!("Report server listening on http://{}", local_addr);

        let state = ServerState {
            source: self.source,
            writer: ReportWriter::new(self.config),
        };
        let router = Router::new()
            .route("/messages", get(get_messages))
            .route("/health", get(|| async { "ok" }))
            .with_state(Arc::new(state));

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        });
        let task = tokio::spawn(async move {
            if let Err(err) = server.await {
                log::warn!("Report server exited with error: {}", err);
            }
        });

        Ok(ServerHandle {
            address: local_addr,
            task,
            shutdown: shutdown_tx,
        })
    }
}

/// Handle returned from [`ServerBuilder::spawn`]
pub struct ServerHandle {
    address: SocketAddr,
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl ServerHandle {
    /// Address the server is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.address
    }

    /// Request graceful shutdown and wait for the server task to finish
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(true);
        self.task.await.map_err(|join| anyhow::anyhow!(join))
    }
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    /// Decimal or `0x`-prefixed hex identifier
    id: Option<String>,
}

async fn get_messages(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<MessageQuery>,
) -> Response {
    let filter = match query.id.as_deref().map(parse_identifier) {
        None => None,
        Some(Some(id)) => Some(id),
        Some(None) => {
            return (StatusCode::BAD_REQUEST, "invalid id parameter").into_response();
        }
    };

    let pairs: Vec<FramePair> = state
        .source
        .pairs()
        .into_iter()
        .filter(|pair| filter.map_or(true, |id| pair.frame().id() == id))
        .collect();

    match state.writer.write_reports(pairs.iter().map(FramePair::as_pair)) {
        Ok(outcome) => {
            let content_type = [(header::CONTENT_TYPE, state.writer.content_type())];
            if outcome.is_complete() {
                (StatusCode::OK, content_type, outcome.body).into_response()
            } else {
                let skipped = outcome.skipped.len().to_string();
                (
                    StatusCode::OK,
                    content_type,
                    [(SKIPPED_HEADER, skipped)],
                    outcome.body,
                )
                    .into_response()
            }
        }
        Err(err) => {
            log::warn!("Failed to render reports: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

/// Parse `100` or `0x64`
fn parse_identifier(text: &str) -> Option<u32> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}
