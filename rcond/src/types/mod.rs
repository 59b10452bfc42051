//! Shared constants used across the crate.

pub(crate) mod constants;
