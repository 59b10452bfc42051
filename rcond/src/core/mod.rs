//! Core internal logic for connection management.
//!
//! This module contains the reconciliation logic: profile lookup and
//! creation, activation with bounded polling, and bulk sync. Everything
//! here works against the [`ProfileStore`](store::ProfileStore) seam.

pub(crate) mod connection;
pub(crate) mod connection_settings;
pub(crate) mod state_wait;
pub(crate) mod store;
pub(crate) mod sync;
