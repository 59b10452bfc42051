//! Node startup: apply the configured state, then serve the API.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use rcond::NetworkManager;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::cluster::{ClusterAgent, LocalAgent};
use crate::config::Config;
use crate::http::{AppState, router};
use crate::system::SystemControl;
use crate::users::AuthorizedKeys;

/// A started node, ready to serve.
pub struct Node {
    addr: String,
    state: AppState,
    dispatcher: Option<JoinHandle<()>>,
}

impl Node {
    /// Applies the hostname and connection profiles from `config` and
    /// starts the cluster agent if enabled.
    ///
    /// None of these steps is fatal; failures are logged and startup
    /// continues.
    pub async fn start(
        config: &Config,
        network: NetworkManager,
        system: Arc<dyn SystemControl>,
        keys: AuthorizedKeys,
    ) -> Self {
        if !config.hostname.is_empty() {
            if let Err(e) = system.set_hostname(&config.hostname).await {
                tracing::error!(hostname = %config.hostname, error = %e, "failed to set hostname");
            }
        }

        let specs = &config.network.connections;
        if !specs.is_empty() {
            let report = network.sync_connections(specs).await;
            if !report.is_clean() {
                tracing::warn!(
                    failed = report.failed.len(),
                    "startup continues with unsynced connections"
                );
            }
        }

        let (cluster, dispatcher) = if config.cluster.enabled {
            let hostname = match system.hostname().await {
                Ok(hostname) => hostname,
                Err(e) => {
                    tracing::warn!(error = %e, "cannot read hostname for cluster member name");
                    config.hostname.clone()
                }
            };
            let (agent, dispatcher) =
                LocalAgent::start(&config.cluster, &hostname, system.clone());

            if !config.cluster.join.is_empty() {
                match agent.join(&config.cluster.join).await {
                    Ok(joined) => tracing::info!(joined, "joined cluster"),
                    Err(e) => tracing::error!(error = %e, "failed to join cluster"),
                }
            }
            let agent: Arc<dyn ClusterAgent> = Arc::new(agent);
            (Some(agent), Some(dispatcher))
        } else {
            (None, None)
        };

        let state = AppState {
            network,
            system,
            keys: Arc::new(keys),
            cluster,
            defaults: config.network.defaults.clone(),
            api_token: Arc::from(config.rcond.api_token.as_str()),
        };

        Self {
            addr: config.rcond.addr.clone(),
            state,
            dispatcher,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        tracing::info!(addr = %listener.local_addr()?, "rcond API listening");

        let result = axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server error");

        if let Some(dispatcher) = self.dispatcher {
            dispatcher.abort();
        }
        result
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received shutdown signal"),
        Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl-C"),
    }
}
