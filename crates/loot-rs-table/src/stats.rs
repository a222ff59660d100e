//! Drop-rate simulation for a single template.

use std::collections::HashMap;

use rand::Rng;

use crate::error::TableError;
use crate::store::{LootStoreKind, LootStores};
use crate::template::{LootSink, LootStoreItem};

/// Items a simulated container holds, same cap as a real one.
const SIMULATION_CAP: usize = 16;

/// Result of [`check_drop_stats`]: how often each item dropped.
#[derive(Debug, Clone)]
pub struct DropStats {
    pub kind: LootStoreKind,
    pub loot_id: u32,
    pub iterations: u32,
    /// `(item_id, times dropped)`, most frequent first.
    pub counts: Vec<(u32, u32)>,
}

impl DropStats {
    /// Observed drop rate of an item, in percent.
    pub fn rate_of(&self, item_id: u32) -> f32 {
        self.counts
            .iter()
            .find(|(id, _)| *id == item_id)
            .map(|(_, n)| *n as f32 * 100.0 / self.iterations as f32)
            .unwrap_or(0.0)
    }
}

/// Sink without looters: conditions are not evaluated.
struct SimulationSink {
    items: Vec<u32>,
}

impl LootSink for SimulationSink {
    fn add_item(&mut self, item: &LootStoreItem, _count: u32) -> bool {
        if self.items.len() >= SIMULATION_CAP {
            return false;
        }
        self.items.push(item.item_id);
        true
    }

    fn is_item_already_in(&self, item_id: u32) -> bool {
        self.items.contains(&item_id)
    }

    fn fulfils_condition(&self, _condition_id: u16) -> bool {
        true
    }
}

/// Fill template `loot_id` `iterations` times and count the drops.
pub fn check_drop_stats<R: Rng + ?Sized>(
    stores: &LootStores,
    kind: LootStoreKind,
    loot_id: u32,
    iterations: u32,
    rng: &mut R,
) -> Result<DropStats, TableError> {
    let iterations = iterations.max(1);
    let mut counts: HashMap<u32, u32> = HashMap::new();

    for _ in 0..iterations {
        let mut sink = SimulationSink { items: Vec::new() };
        stores.fill(kind, loot_id, &mut sink, rng)?;
        for item_id in sink.items {
            *counts.entry(item_id).or_default() += 1;
        }
    }

    let mut counts: Vec<(u32, u32)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    Ok(DropStats {
        kind,
        loot_id,
        iterations,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemCatalog, ItemPrototype, ItemQuality};
    use crate::rates::DropRates;
    use crate::store::LootStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn simulation_matches_chances() {
        let mut catalog = ItemCatalog::new();
        catalog.insert(ItemPrototype::new(1, ItemQuality::Normal));
        catalog.insert(ItemPrototype::new(2, ItemQuality::Normal));

        let mut stores = LootStores::new(catalog.clone(), DropRates::default());
        stores.set_store(
            LootStore::parse_json(
                LootStoreKind::Creature,
                r#"[
                    { "entry": 3, "item": 1, "chance": 100 },
                    { "entry": 3, "item": 2, "chance": 25 }
                ]"#,
                &catalog,
            )
            .unwrap(),
        );

        let mut rng = StdRng::seed_from_u64(2024);
        let stats = check_drop_stats(&stores, LootStoreKind::Creature, 3, 4000, &mut rng).unwrap();
        assert_eq!(stats.counts[0], (1, 4000));
        assert_eq!(stats.rate_of(1), 100.0);
        let rare = stats.rate_of(2);
        assert!(rare > 20.0 && rare < 30.0, "rate = {rare}");
    }

    #[test]
    fn unknown_template_is_an_error() {
        let stores = LootStores::new(ItemCatalog::new(), DropRates::default());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(check_drop_stats(&stores, LootStoreKind::Fishing, 1, 10, &mut rng).is_err());
    }
}
