//! Archetype catalog loader.

use std::path::Path;

use combat_core::{ArchetypeCatalog, CatalogEntry};

use crate::loaders::{LoadResult, read_file};

/// Loader for archetype catalogs from RON files.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load and validate a catalog.
    ///
    /// RON format: `Vec<CatalogEntry>`, i.e. a list of
    /// `(archetype: (...), cost: u32, unlock_wave: u32)` records.
    pub fn load(path: &Path) -> LoadResult<ArchetypeCatalog> {
        let content = read_file(path)?;
        let catalog = Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))?;
        tracing::debug!(path = %path.display(), archetypes = catalog.len(), "loaded archetype catalog");
        Ok(catalog)
    }

    pub fn parse(content: &str) -> LoadResult<ArchetypeCatalog> {
        let entries: Vec<CatalogEntry> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse archetype catalog RON: {}", e))?;
        ArchetypeCatalog::new(entries).map_err(|e| anyhow::anyhow!("Invalid archetype catalog: {}", e))
    }
}
