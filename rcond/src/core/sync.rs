//! Bulk reconciliation of configured connections.

use log::{info, warn};
use std::future::Future;
use zvariant::OwnedObjectPath;

use crate::Result;
use crate::api::models::{ConnectionError, ConnectionSpec};

/// Outcome of a [`NetworkManager::sync_connections`](crate::NetworkManager::sync_connections) run.
///
/// Entries are keyed by connection UUID and keep the input order.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Profiles that exist after the run, with their paths.
    pub ensured: Vec<(String, OwnedObjectPath)>,
    /// Specs that could not be ensured, with the reason.
    pub failed: Vec<(String, ConnectionError)>,
}

impl SyncReport {
    /// True when every spec was ensured.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs `ensure` for every spec in order. One failure does not stop the
/// others.
pub(crate) async fn sync_connections<F, Fut>(specs: &[ConnectionSpec], mut ensure: F) -> SyncReport
where
    F: FnMut(ConnectionSpec) -> Fut,
    Fut: Future<Output = Result<OwnedObjectPath>>,
{
    let mut report = SyncReport::default();

    for spec in specs {
        let uuid = spec.uuid.clone();
        match ensure(spec.clone()).await {
            Ok(path) => report.ensured.push((uuid, path)),
            Err(e) => {
                warn!("Failed to ensure connection {uuid}: {e}");
                report.failed.push((uuid, e));
            }
        }
    }

    info!(
        "Connection sync finished: {} ensured, {} failed",
        report.ensured.len(),
        report.failed.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::connection_settings::ensure_connection;
    use crate::memory::MemoryStore;
    use uuid::Uuid;

    fn specs(n: usize) -> Vec<ConnectionSpec> {
        (0..n)
            .map(|i| {
                ConnectionSpec::station(Uuid::new_v4(), &format!("net{i}"), "secret123", true)
            })
            .collect()
    }

    #[tokio::test]
    async fn failure_does_not_stop_later_specs() {
        let store = MemoryStore::new();
        let specs = specs(3);
        store.fail_add_for(specs[1].uuid.clone());

        let report = sync_connections(&specs, |spec| {
            let store = store.clone();
            async move { ensure_connection(&store, &spec).await }
        })
        .await;

        assert!(!report.is_clean());
        assert_eq!(report.ensured.len(), 2);
        assert_eq!(report.ensured[0].0, specs[0].uuid);
        assert_eq!(report.ensured[1].0, specs[2].uuid);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, specs[1].uuid);
        assert_eq!(store.profile_count(), 2);
    }

    #[tokio::test]
    async fn empty_input_is_clean() {
        let report = sync_connections(&[], |_spec: ConnectionSpec| async {
            Err::<OwnedObjectPath, _>(ConnectionError::Store("unreachable".into()))
        })
        .await;
        assert!(report.is_clean());
        assert!(report.ensured.is_empty());
    }
}
