//! Saved connection profile management.
//!
//! Profiles are addressed by UUID. Creating one is idempotent: if a
//! profile with the same UUID is already stored, its path is returned and
//! nothing is written. Deleting a missing profile is a no-op.

use log::{debug, info};
use zvariant::OwnedObjectPath;

use crate::Result;
use crate::api::builders::build_connection_settings;
use crate::api::models::ConnectionSpec;
use crate::core::store::{ProfileStore, settings_uuid};

/// Finds the path of the saved profile with the given UUID.
///
/// Profiles whose settings cannot be read are skipped rather than failing
/// the lookup. Returns `None` if no readable profile matches.
pub(crate) async fn find_connection_path(
    store: &dyn ProfileStore,
    uuid: &str,
) -> Result<Option<OwnedObjectPath>> {
    for path in store.list_profiles().await? {
        let settings = match store.profile_settings(&path).await {
            Ok(settings) => settings,
            Err(e) => {
                debug!("Skipping unreadable profile {}: {e}", path.as_str());
                continue;
            }
        };

        if settings_uuid(&settings) == Some(uuid) {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

/// Makes sure a profile for `spec` exists and returns its path.
///
/// An existing profile is returned as-is, even if its settings differ from
/// `spec`. The spec is only validated when a new profile has to be created.
pub(crate) async fn ensure_connection(
    store: &dyn ProfileStore,
    spec: &ConnectionSpec,
) -> Result<OwnedObjectPath> {
    if let Some(path) = find_connection_path(store, &spec.uuid).await? {
        debug!("Connection {} already exists at {}", spec.uuid, path.as_str());
        return Ok(path);
    }

    spec.validate()?;

    let path = store.add_profile(build_connection_settings(spec)).await?;
    info!("Created connection {} ({}) at {}", spec.id, spec.uuid, path.as_str());
    Ok(path)
}

/// Deletes the profile with the given UUID, if there is one.
pub(crate) async fn remove_connection(store: &dyn ProfileStore, uuid: &str) -> Result<()> {
    match find_connection_path(store, uuid).await? {
        Some(path) => {
            store.delete_profile(&path).await?;
            info!("Removed connection {uuid}");
        }
        None => debug!("Connection {uuid} not present, nothing to remove"),
    }
    Ok(())
}
