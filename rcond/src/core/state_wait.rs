//! Activation state polling.
//!
//! After `ActivateConnection` returns, NetworkManager still has to bring the
//! link up. The active connection's `State` is read once immediately and
//! then once per [`POLL_INTERVAL`](activation::POLL_INTERVAL), for at most
//! [`MAX_ATTEMPTS`](activation::MAX_ATTEMPTS) reads. A timeout is reported
//! only once the whole window (`MAX_ATTEMPTS` intervals) has passed.

use log::{debug, warn};
use tokio::time::{MissedTickBehavior, interval};
use zvariant::OwnedObjectPath;

use crate::Result;
use crate::api::models::{ActiveConnectionState, ConnectionError};
use crate::core::store::ProfileStore;
use crate::types::constants::activation;

/// Waits for an active connection to reach the activated state.
///
/// A failed state read ends the wait with that error.
pub(crate) async fn wait_for_connection_activation(
    store: &dyn ProfileStore,
    active: &OwnedObjectPath,
) -> Result<()> {
    let mut ticker = interval(activation::POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for attempt in 1..=activation::MAX_ATTEMPTS {
        ticker.tick().await;

        let state = ActiveConnectionState::from(store.active_state(active).await?);
        debug!(
            "Activation check {attempt}/{}: {state}",
            activation::MAX_ATTEMPTS
        );

        if state == ActiveConnectionState::Activated {
            return Ok(());
        }
    }

    // the last read still gets its full interval
    ticker.tick().await;

    warn!(
        "Connection {} not activated after {} checks",
        active.as_str(),
        activation::MAX_ATTEMPTS
    );
    Err(ConnectionError::ActivationTimeout {
        attempts: activation::MAX_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::builders::build_connection_settings;
    use crate::api::models::ConnectionSpec;
    use crate::memory::MemoryStore;
    use std::time::Duration;
    use tokio::time::Instant;
    use uuid::Uuid;

    async fn start(store: &MemoryStore) -> OwnedObjectPath {
        let spec = ConnectionSpec::station(Uuid::new_v4(), "Home", "secret123", true);
        let profile = store
            .add_profile(build_connection_settings(&spec))
            .await
            .unwrap();
        let device = store.device_by_interface("wlan0").await.unwrap();
        store.activate(&profile, &device).await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn returns_on_first_read_when_activated() {
        let store = MemoryStore::new();
        let active = start(&store).await;
        let began = Instant::now();

        wait_for_connection_activation(&store, &active).await.unwrap();

        assert_eq!(store.calls().state_reads, 1);
        assert_eq!(began.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_read() {
        let store = MemoryStore::new();
        store.set_activation_states([1, 1, 2]);
        let active = start(&store).await;
        let began = Instant::now();

        wait_for_connection_activation(&store, &active).await.unwrap();

        assert_eq!(store.calls().state_reads, 3);
        assert_eq!(began.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let store = MemoryStore::new();
        store.set_activation_states([1]);
        let active = start(&store).await;
        let began = Instant::now();

        let err = wait_for_connection_activation(&store, &active)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ConnectionError::ActivationTimeout { attempts: 10 }
        ));
        assert_eq!(store.calls().state_reads, 10);
        assert_eq!(began.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn read_failure_ends_wait() {
        let store = MemoryStore::new();
        let bogus = OwnedObjectPath::try_from("/org/freedesktop/NetworkManager/ActiveConnection/99")
            .unwrap();

        let err = wait_for_connection_activation(&store, &bogus)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Store(_)));
    }
}
