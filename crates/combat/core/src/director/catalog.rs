//! Archetypes the director may roll, with their wave cost.
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::behavior::Archetype;
use crate::config::CombatConfig;
use crate::error::CatalogError;

/// One purchasable archetype.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogEntry {
    pub archetype: Arc<Archetype>,
    /// Budget spent when this archetype is rolled. Never zero.
    pub cost: u32,
    /// First wave this archetype may appear in.
    #[cfg_attr(feature = "serde", serde(default = "default_unlock_wave"))]
    pub unlock_wave: u32,
}

#[cfg(feature = "serde")]
fn default_unlock_wave() -> u32 {
    1
}

impl CatalogEntry {
    pub fn new(archetype: Archetype, cost: u32, unlock_wave: u32) -> Self {
        Self {
            archetype: Arc::new(archetype),
            cost,
            unlock_wave,
        }
    }

    pub fn name(&self) -> &str {
        &self.archetype.name
    }

    pub fn is_unlocked(&self, wave: u32) -> bool {
        self.unlock_wave <= wave
    }
}

/// Validated list of catalog entries.
///
/// Construction rejects empty catalogs, duplicate names, zero costs and
/// archetypes that fail [`Archetype::validate`], so the wave planner can rely
/// on every cost being positive.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchetypeCatalog {
    entries: Vec<CatalogEntry>,
}

impl ArchetypeCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = BTreeSet::new();
        for entry in &entries {
            let name = entry.name().to_string();
            if entry.archetype.attacks.len() > CombatConfig::MAX_ATTACKS {
                return Err(CatalogError::TooManyAttacks {
                    name,
                    count: entry.archetype.attacks.len(),
                    max: CombatConfig::MAX_ATTACKS,
                });
            }
            if entry.cost == 0 {
                return Err(CatalogError::ZeroCost(name));
            }
            entry.archetype.validate()?;
            if !seen.insert(name.clone()) {
                return Err(CatalogError::DuplicateArchetype(name));
            }
        }
        Ok(Self { entries })
    }

    /// The six built-in archetypes with their default costs.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                CatalogEntry::new(Archetype::skeleton(), 5, 1),
                CatalogEntry::new(Archetype::spider(), 8, 1),
                CatalogEntry::new(Archetype::imp(), 10, 2),
                CatalogEntry::new(Archetype::orc(), 15, 3),
                CatalogEntry::new(Archetype::necromancer(), 20, 4),
                CatalogEntry::new(Archetype::dragon(), 40, 6),
            ],
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ArchetypeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
