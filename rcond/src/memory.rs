//! In-process profile store.
//!
//! [`MemoryStore`] behaves like a small NetworkManager: profiles get object
//! paths, duplicate UUIDs are rejected and activations report a state on
//! every read. It backs `--dry-run` nodes and the test suites, and can be
//! told to fail specific calls.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use zvariant::{OwnedObjectPath, OwnedValue};

use crate::Result;
use crate::api::builders::ConnectionSettings;
use crate::api::models::ConnectionError;
use crate::core::store::{Connector, ProfileStore, StoredSettings, settings_uuid};
use crate::types::constants::active_state;

const SETTINGS_PREFIX: &str = "/org/freedesktop/NetworkManager/Settings";
const DEVICES_PREFIX: &str = "/org/freedesktop/NetworkManager/Devices";
const ACTIVE_PREFIX: &str = "/org/freedesktop/NetworkManager/ActiveConnection";

/// Number of calls made against a [`MemoryStore`], per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    pub list: usize,
    pub add: usize,
    pub delete: usize,
    pub activate: usize,
    pub state_reads: usize,
    pub disconnect: usize,
}

#[derive(Debug)]
struct Profile {
    path: OwnedObjectPath,
    uuid: Option<String>,
    settings: Option<StoredSettings>,
}

#[derive(Debug)]
struct Active {
    path: OwnedObjectPath,
    profile: OwnedObjectPath,
    device: OwnedObjectPath,
    reads: usize,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    profiles: Vec<Profile>,
    interfaces: Vec<String>,
    fixed_interfaces: bool,
    activation_states: Vec<u32>,
    active: Vec<Active>,
    fail_add: HashSet<String>,
    calls: Calls,
}

impl State {
    fn next_path(&mut self, prefix: &str) -> Result<OwnedObjectPath> {
        self.next_id += 1;
        object_path(format!("{prefix}/{}", self.next_id))
    }

    fn find_profile(&self, path: &OwnedObjectPath) -> Result<&Profile> {
        self.profiles
            .iter()
            .find(|p| &p.path == path)
            .ok_or_else(|| ConnectionError::Store(format!("no profile at {}", path.as_str())))
    }

    fn device_path(&self, interface: &str) -> Option<OwnedObjectPath> {
        let index = self.interfaces.iter().position(|i| i == interface)?;
        object_path(format!("{DEVICES_PREFIX}/{index}")).ok()
    }
}

fn object_path(path: String) -> Result<OwnedObjectPath> {
    OwnedObjectPath::try_from(path)
        .map_err(|e| ConnectionError::Store(format!("invalid object path: {e}")))
}

fn to_stored(settings: ConnectionSettings) -> Result<StoredSettings> {
    let mut stored = HashMap::with_capacity(settings.len());
    for (name, section) in settings {
        let mut props = HashMap::with_capacity(section.len());
        for (key, value) in section {
            let value = OwnedValue::try_from(value)
                .map_err(|e| ConnectionError::Store(format!("unstorable value {key}: {e}")))?;
            props.insert(key.to_string(), value);
        }
        stored.insert(name.to_string(), props);
    }
    Ok(stored)
}

fn copy_stored(settings: &StoredSettings) -> Result<StoredSettings> {
    let mut copy = HashMap::with_capacity(settings.len());
    for (name, section) in settings {
        let mut props = HashMap::with_capacity(section.len());
        for (key, value) in section {
            let value = value
                .try_clone()
                .map_err(|e| ConnectionError::Store(format!("uncopyable value {key}: {e}")))?;
            props.insert(key.clone(), value);
        }
        copy.insert(name.clone(), props);
    }
    Ok(copy)
}

/// Shared in-memory profile store. Clones share state.
///
/// # Example
///
/// ```rust
/// use rcond::{ConnectionSpec, NetworkManager};
/// use rcond::memory::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() -> rcond::Result<()> {
/// let store = MemoryStore::new();
/// let nm = NetworkManager::with_connector(store.clone());
///
/// let spec = ConnectionSpec::station(Uuid::new_v4(), "Home", "secret123", true);
/// nm.ensure_connection(&spec).await?;
/// nm.ensure_connection(&spec).await?;
/// assert_eq!(store.profile_count(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Creates an empty store that accepts any interface name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that only knows the given interfaces.
    pub fn with_interfaces(interfaces: &[&str]) -> Self {
        let store = Self::default();
        {
            let mut state = store.state();
            state.interfaces = interfaces.iter().map(|i| i.to_string()).collect();
            state.fixed_interfaces = true;
        }
        store
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Scripts the states returned by successive reads of each new
    /// activation. The last entry repeats; an empty script means the
    /// connection is activated on the first read.
    pub fn set_activation_states(&self, states: impl IntoIterator<Item = u32>) {
        self.state().activation_states = states.into_iter().collect();
    }

    /// Makes every `add_profile` for `uuid` fail.
    pub fn fail_add_for(&self, uuid: impl Into<String>) {
        self.state().fail_add.insert(uuid.into());
    }

    /// Adds a profile whose settings cannot be read.
    pub fn insert_unreadable_profile(&self) {
        let mut state = self.state();
        if let Ok(path) = state.next_path(SETTINGS_PREFIX) {
            state.profiles.push(Profile {
                path,
                uuid: None,
                settings: None,
            });
        }
    }

    /// Number of stored profiles, readable or not.
    pub fn profile_count(&self) -> usize {
        self.state().profiles.len()
    }

    /// UUIDs of the readable profiles, in insertion order.
    pub fn uuids(&self) -> Vec<String> {
        self.state()
            .profiles
            .iter()
            .filter_map(|p| p.uuid.clone())
            .collect()
    }

    /// Call counters so far.
    pub fn calls(&self) -> Calls {
        self.state().calls
    }

    /// UUID of the profile currently active on `interface`.
    pub fn active_uuid(&self, interface: &str) -> Option<String> {
        let state = self.state();
        let device = state.device_path(interface)?;
        let active = state.active.iter().find(|a| a.device == device)?;
        state.find_profile(&active.profile).ok()?.uuid.clone()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn list_profiles(&self) -> Result<Vec<OwnedObjectPath>> {
        let mut state = self.state();
        state.calls.list += 1;
        Ok(state.profiles.iter().map(|p| p.path.clone()).collect())
    }

    async fn profile_settings(&self, profile: &OwnedObjectPath) -> Result<StoredSettings> {
        let state = self.state();
        let found = state.find_profile(profile)?;
        match &found.settings {
            Some(settings) => copy_stored(settings),
            None => Err(ConnectionError::Store(format!(
                "settings of {} are not readable",
                profile.as_str()
            ))),
        }
    }

    async fn add_profile(&self, settings: ConnectionSettings) -> Result<OwnedObjectPath> {
        let stored = to_stored(settings)?;
        let uuid = settings_uuid(&stored).map(str::to_string);

        let mut state = self.state();
        state.calls.add += 1;

        if let Some(uuid) = &uuid {
            if state.fail_add.contains(uuid) {
                return Err(ConnectionError::Store(format!("refused to add {uuid}")));
            }
            if state.profiles.iter().any(|p| p.uuid.as_ref() == Some(uuid)) {
                return Err(ConnectionError::Store(format!(
                    "a connection with UUID {uuid} already exists"
                )));
            }
        }

        let path = state.next_path(SETTINGS_PREFIX)?;
        state.profiles.push(Profile {
            path: path.clone(),
            uuid,
            settings: Some(stored),
        });
        Ok(path)
    }

    async fn delete_profile(&self, profile: &OwnedObjectPath) -> Result<()> {
        let mut state = self.state();
        state.calls.delete += 1;
        state.find_profile(profile)?;
        state.profiles.retain(|p| &p.path != profile);
        state.active.retain(|a| &a.profile != profile);
        Ok(())
    }

    async fn device_by_interface(&self, interface: &str) -> Result<OwnedObjectPath> {
        let mut state = self.state();
        if let Some(path) = state.device_path(interface) {
            return Ok(path);
        }
        if state.fixed_interfaces {
            return Err(ConnectionError::Store(format!(
                "no device for interface {interface}"
            )));
        }
        state.interfaces.push(interface.to_string());
        state
            .device_path(interface)
            .ok_or_else(|| ConnectionError::Store(format!("no device for interface {interface}")))
    }

    async fn activate(
        &self,
        profile: &OwnedObjectPath,
        device: &OwnedObjectPath,
    ) -> Result<OwnedObjectPath> {
        let mut state = self.state();
        state.calls.activate += 1;
        state.find_profile(profile)?;

        let path = state.next_path(ACTIVE_PREFIX)?;
        state.active.retain(|a| &a.device != device);
        state.active.push(Active {
            path: path.clone(),
            profile: profile.clone(),
            device: device.clone(),
            reads: 0,
        });
        Ok(path)
    }

    async fn active_state(&self, active: &OwnedObjectPath) -> Result<u32> {
        let mut state = self.state();
        state.calls.state_reads += 1;

        let reads = {
            let entry = state
                .active
                .iter_mut()
                .find(|a| &a.path == active)
                .ok_or_else(|| {
                    ConnectionError::Store(format!("no active connection at {}", active.as_str()))
                })?;
            entry.reads += 1;
            entry.reads
        };

        let script = &state.activation_states;
        Ok(script
            .get(reads - 1)
            .or(script.last())
            .copied()
            .unwrap_or(active_state::ACTIVATED))
    }

    async fn disconnect(&self, device: &OwnedObjectPath) -> Result<()> {
        let mut state = self.state();
        state.calls.disconnect += 1;
        state.active.retain(|a| &a.device != device);
        Ok(())
    }
}

#[async_trait]
impl Connector for MemoryStore {
    async fn open(&self) -> Result<Box<dyn ProfileStore>> {
        Ok(Box::new(self.clone()))
    }
}
