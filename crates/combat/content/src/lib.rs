//! Data-driven combat content and loaders.
//!
//! Archetype catalogs are authored in RON and combat tuning in TOML. Both
//! deserialize straight into `combat-core` types; the catalog is validated
//! through [`combat_core::ArchetypeCatalog::new`] before it is handed out.
//!
//! Default data files ship with the crate under `data/` and are reachable
//! through [`ContentFactory::bundled`].

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{CatalogLoader, ConfigLoader, ContentFactory, LoadResult};
