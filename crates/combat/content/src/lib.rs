//! Data-driven action content and loaders.
//!
//! This crate houses authored techniques, items and bloodline abilities and
//! provides loaders for RON/TOML data files:
//! - Action catalogues (data-driven via RON)
//! - Engine configuration (data-driven via TOML)
//!
//! Content is consumed by the action resolver through the
//! [`combat_core::ContentCatalogue`] contract and never appears in battle
//! state beyond its [`combat_core::ContentRef`].

pub mod registry;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use registry::{ContentRegistry, RegistryError};

#[cfg(feature = "loaders")]
pub use loaders::{ActionLoader, ConfigLoader, ContentFactory};
