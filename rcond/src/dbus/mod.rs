//! D-Bus proxy interfaces for NetworkManager.
//!
//! This module contains low-level D-Bus proxy definitions for communicating
//! with NetworkManager over the system bus, and the [`SystemBus`] connector
//! built on top of them.

mod active_connection;
mod device;
mod main_nm;
mod settings;
mod settings_connection;
mod store;

pub(crate) use active_connection::NMActiveConnectionProxy;
pub(crate) use device::NMDeviceProxy;
pub(crate) use main_nm::NMProxy;
pub(crate) use settings::NMSettingsProxy;
pub(crate) use settings_connection::NMSettingsConnectionProxy;
pub use store::SystemBus;
