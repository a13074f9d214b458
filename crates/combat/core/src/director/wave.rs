//! Greedy wave composition.
use std::sync::Arc;

use super::catalog::ArchetypeCatalog;
use crate::behavior::Archetype;
use crate::env::SimRng;

/// The population rolled for one wave.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WavePlan {
    /// Spawn order, consumed front to back.
    pub spawns: Vec<Arc<Archetype>>,
    pub spent: u32,
    /// Budget the greedy roll could not use.
    pub leftover: u32,
}

impl WavePlan {
    pub fn population(&self) -> usize {
        self.spawns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spawns.is_empty()
    }
}

/// Rolls archetypes for `wave` until nothing unlocked fits the remaining budget.
///
/// Each pick is uniform over the entries that are unlocked and affordable
/// right now. The result is intentionally not budget-optimal; leftover budget
/// is simply dropped. Catalog costs are never zero, so the loop spends at
/// least one unit per iteration and always terminates.
pub fn plan_wave(
    catalog: &ArchetypeCatalog,
    wave: u32,
    budget: u32,
    max_population: u32,
    rng: &mut SimRng,
) -> WavePlan {
    let mut remaining = budget;
    let mut spawns = Vec::new();

    while remaining > 0 && spawns.len() < max_population as usize {
        let affordable: Vec<_> = catalog
            .entries()
            .iter()
            .filter(|entry| entry.is_unlocked(wave) && entry.cost > 0 && entry.cost <= remaining)
            .collect();
        if affordable.is_empty() {
            break;
        }
        let entry = affordable[rng.index(affordable.len())];
        remaining -= entry.cost;
        spawns.push(Arc::clone(&entry.archetype));
    }

    WavePlan {
        spawns,
        spent: budget - remaining,
        leftover: remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::director::catalog::CatalogEntry;

    fn catalog(costs: &[(u32, u32)]) -> ArchetypeCatalog {
        let entries = costs
            .iter()
            .enumerate()
            .map(|(i, &(cost, unlock))| {
                let mut archetype = Archetype::skeleton();
                archetype.name = format!("e{i}");
                CatalogEntry::new(archetype, cost, unlock)
            })
            .collect();
        ArchetypeCatalog::new(entries).unwrap()
    }

    #[test]
    fn never_exceeds_budget_and_stops_below_cheapest() {
        let catalog = catalog(&[(5, 1), (10, 1), (20, 1)]);
        for seed in 0..50 {
            let mut rng = SimRng::new(seed);
            let plan = plan_wave(&catalog, 1, 40, 64, &mut rng);
            assert!(!plan.is_empty());
            assert!(plan.spent <= 40);
            assert!(plan.leftover < 5);
            let total: u32 = plan
                .spawns
                .iter()
                .map(|a| catalog.get(&a.name).unwrap().cost)
                .sum();
            assert_eq!(total, plan.spent);
        }
    }

    #[test]
    fn terminates_when_nothing_is_affordable() {
        let catalog = catalog(&[(50, 1)]);
        let plan = plan_wave(&catalog, 1, 40, 64, &mut SimRng::new(1));
        assert!(plan.is_empty());
        assert_eq!(plan.leftover, 40);

        let plan = plan_wave(&catalog, 1, 0, 64, &mut SimRng::new(1));
        assert!(plan.is_empty());
    }

    #[test]
    fn locked_archetypes_are_never_rolled() {
        let catalog = catalog(&[(5, 1), (5, 3)]);
        for seed in 0..20 {
            let plan = plan_wave(&catalog, 2, 30, 64, &mut SimRng::new(seed));
            assert!(plan.spawns.iter().all(|a| a.name == "e0"));
            assert_eq!(plan.population(), 6);
        }
    }

    #[test]
    fn population_cap_limits_wave() {
        let catalog = catalog(&[(1, 1)]);
        let plan = plan_wave(&catalog, 1, 100, 8, &mut SimRng::new(3));
        assert_eq!(plan.population(), 8);
        assert_eq!(plan.leftover, 92);
    }
}
