//! Content factory for loading everything an encounter needs from one directory.

use std::path::{Path, PathBuf};

use combat_core::{ArchetypeCatalog, CombatConfig};

use crate::loaders::{CatalogLoader, ConfigLoader, LoadResult};

/// Content factory that loads combat content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── combat.toml
/// └── catalog.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub const CONFIG_FILE: &'static str = "combat.toml";
    pub const CATALOG_FILE: &'static str = "catalog.ron";

    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The data files shipped with this crate.
    pub fn bundled() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
    }

    /// Load combat tuning from `combat.toml`.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        ConfigLoader::load(&self.data_dir.join(Self::CONFIG_FILE))
    }

    /// Load the archetype catalog from `catalog.ron`.
    pub fn load_catalog(&self) -> LoadResult<ArchetypeCatalog> {
        CatalogLoader::load(&self.data_dir.join(Self::CATALOG_FILE))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
