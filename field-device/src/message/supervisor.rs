//! Connection supervisor
//!
//! Keeps the broker session alive:
//!
//! ```text
//! Disconnected → Connecting → Connected ─(transport error)→ Disconnected
//!       ↑                                                        │
//!       └──────────────── fixed reconnect delay ─────────────────┘
//! ```
//!
//! Every entry into `Connected` re-subscribes all topic filters. Deliveries
//! are parsed here and pushed into the bounded inbound channel; a full
//! channel applies backpressure to the broker link.

use super::aggregator::Inbound;
use async_trait::async_trait;
use shared::BriefingMessage;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Broker link errors (all count as transport errors)
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Subscribe to {filter} failed: {reason}")]
    Subscribe { filter: String, reason: String },

    #[error("Broker refused connection: {0}")]
    Refused(String),
}

/// Connection state, published on a watch channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Event produced by one poll of the link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Session established (or re-established)
    Connected,
    /// Application message
    Message { topic: String, payload: Vec<u8> },
    /// Protocol traffic with nothing to do
    Other,
}

/// Transport seam between the supervisor and a concrete broker client
///
/// `poll` drives the connection; after an error the next `poll` is expected
/// to reconnect.
#[async_trait]
pub trait BrokerLink: Send {
    async fn poll(&mut self) -> Result<LinkEvent, BrokerError>;

    async fn subscribe(&mut self, filter: &str) -> Result<(), BrokerError>;
}

/// How a session ended without a transport error
enum SessionEnd {
    Shutdown,
    ConsumerGone,
}

pub struct ConnectionSupervisor<L> {
    link: L,
    topics: Vec<String>,
    reconnect_delay: Duration,
    inbound: mpsc::Sender<Inbound>,
    state: watch::Sender<ConnectionState>,
}

impl<L: BrokerLink> ConnectionSupervisor<L> {
    pub fn new(
        link: L,
        topics: Vec<String>,
        reconnect_delay: Duration,
        inbound: mpsc::Sender<Inbound>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            link,
            topics,
            reconnect_delay,
            inbound,
            state,
        }
    }

    /// Subscribe to connection state changes
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!(from = %previous, to = %next, "Broker connection state changed");
        }
    }

    /// Run until shutdown or until the aggregator is gone
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(topics = ?self.topics, "Connection supervisor started");

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            self.set_state(ConnectionState::Connecting);
            match self.session(&shutdown).await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::ConsumerGone) => {
                    warn!("Inbound channel closed, connection supervisor stopping");
                    break;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        delay_ms = self.reconnect_delay.as_millis() as u64,
                        "Broker transport error, reconnecting after delay"
                    );
                    self.set_state(ConnectionState::Disconnected);
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.reconnect_delay) => {},
                    }
                }
            }
        }

        self.set_state(ConnectionState::Disconnected);
        info!("Connection supervisor stopped");
    }

    /// One connection lifetime
    async fn session(&mut self, shutdown: &CancellationToken) -> Result<SessionEnd, BrokerError> {
        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => return Ok(SessionEnd::Shutdown),
                event = self.link.poll() => event?,
            };

            match event {
                LinkEvent::Connected => {
                    self.set_state(ConnectionState::Connected);
                    for filter in &self.topics {
                        tokio::select! {
                            _ = shutdown.cancelled() => return Ok(SessionEnd::Shutdown),
                            subscribed = self.link.subscribe(filter) => subscribed?,
                        }
                        debug!(filter = %filter, "Subscribed");
                    }
                    info!(count = self.topics.len(), "Topic filters subscribed");
                }
                LinkEvent::Message { topic, payload } => {
                    let parsed = BriefingMessage::parse(&topic, &payload);
                    tokio::select! {
                        _ = shutdown.cancelled() => return Ok(SessionEnd::Shutdown),
                        sent = self.inbound.send(parsed) => {
                            if sent.is_err() {
                                return Ok(SessionEnd::ConsumerGone);
                            }
                        }
                    }
                }
                LinkEvent::Other => {}
            }
        }
    }
}
