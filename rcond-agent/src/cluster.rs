//! Cluster membership and event dispatch.
//!
//! The agent talks to its peers through a [`ClusterAgent`]. Inbound events
//! end up on a queue that a single [`EventDispatcher`] drains in order, so
//! two events never run their handlers at the same time.
//!
//! [`LocalAgent`] is a cluster of one: it reports this node as the only
//! member and delivers broadcast events back to itself. It has no gossip
//! transport, so joining other nodes fails.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::ClusterConfig;
use crate::system::SystemControl;

/// Depth of the inbound event queue.
const EVENT_QUEUE: usize = 16;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("no cluster transport available to join {0} address(es)")]
    NoTransport(usize),

    #[error("unknown cluster event {0:?}")]
    UnknownEvent(String),

    #[error("cluster event queue is closed")]
    Stopped,
}

/// The events a node knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterEventKind {
    Restart,
    Shutdown,
    PrintHostname,
}

impl ClusterEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restart => "restart",
            Self::Shutdown => "shutdown",
            Self::PrintHostname => "printHostname",
        }
    }
}

impl FromStr for ClusterEventKind {
    type Err = ClusterError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "restart" => Ok(Self::Restart),
            "shutdown" => Ok(Self::Shutdown),
            "printHostname" => Ok(Self::PrintHostname),
            other => Err(ClusterError::UnknownEvent(other.to_string())),
        }
    }
}

impl fmt::Display for ClusterEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEvent {
    pub kind: ClusterEventKind,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Alive,
    Left,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub name: String,
    pub addr: String,
    pub port: u16,
    pub status: MemberStatus,
}

#[async_trait]
pub trait ClusterAgent: Send + Sync {
    /// Joins the nodes at `addrs` and returns how many were reached.
    async fn join(&self, addrs: &[String]) -> Result<usize, ClusterError>;
    async fn leave(&self) -> Result<(), ClusterError>;
    async fn members(&self) -> Result<Vec<Member>, ClusterError>;
    /// Broadcasts `event` to every member, this node included.
    async fn event(&self, event: ClusterEvent) -> Result<(), ClusterError>;
}

/// Runs event handlers one at a time.
pub struct EventDispatcher {
    system: Arc<dyn SystemControl>,
}

impl EventDispatcher {
    pub fn new(system: Arc<dyn SystemControl>) -> Self {
        Self { system }
    }

    /// Handles one event. Failures are logged; nothing is retried.
    pub async fn handle(&self, event: &ClusterEvent) {
        tracing::info!(event = %event.kind, payload_len = event.payload.len(), "cluster event");
        let result = match event.kind {
            ClusterEventKind::Restart => self.system.restart().await,
            ClusterEventKind::Shutdown => self.system.shutdown().await,
            ClusterEventKind::PrintHostname => self.system.hostname().await.map(|hostname| {
                tracing::info!(%hostname, "cluster event printHostname");
            }),
        };
        if let Err(e) = result {
            tracing::error!(event = %event.kind, error = %e, "cluster event failed");
        }
    }

    /// Drains `events` until every sender is gone.
    pub async fn run(self, mut events: mpsc::Receiver<ClusterEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(&event).await;
        }
        tracing::debug!("cluster event queue closed");
    }
}

/// Single-node cluster agent.
pub struct LocalAgent {
    member: Mutex<Member>,
    events: mpsc::Sender<ClusterEvent>,
}

impl LocalAgent {
    /// Creates the agent and spawns its dispatch loop.
    pub fn start(
        config: &ClusterConfig,
        hostname: &str,
        system: Arc<dyn SystemControl>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE);
        let dispatcher = tokio::spawn(EventDispatcher::new(system).run(rx));

        let name = if config.node_name.is_empty() {
            hostname.to_string()
        } else {
            config.node_name.clone()
        };
        let (addr, port) = if config.advertise_addr.is_empty() {
            (config.bind_addr.clone(), config.bind_port)
        } else {
            (config.advertise_addr.clone(), config.advertise_port)
        };
        tracing::info!(%name, %addr, port, "cluster agent started");

        let agent = Self {
            member: Mutex::new(Member {
                name,
                addr,
                port,
                status: MemberStatus::Alive,
            }),
            events: tx,
        };
        (agent, dispatcher)
    }

    fn member(&self) -> std::sync::MutexGuard<'_, Member> {
        self.member.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ClusterAgent for LocalAgent {
    async fn join(&self, addrs: &[String]) -> Result<usize, ClusterError> {
        tracing::warn!(?addrs, "cannot join: no cluster transport");
        Err(ClusterError::NoTransport(addrs.len()))
    }

    async fn leave(&self) -> Result<(), ClusterError> {
        self.member().status = MemberStatus::Left;
        tracing::info!("left cluster");
        Ok(())
    }

    async fn members(&self) -> Result<Vec<Member>, ClusterError> {
        Ok(vec![self.member().clone()])
    }

    async fn event(&self, event: ClusterEvent) -> Result<(), ClusterError> {
        self.events
            .send(event)
            .await
            .map_err(|_| ClusterError::Stopped)
    }
}
