//! Internal helpers.

pub(crate) mod locks;
