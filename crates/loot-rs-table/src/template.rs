//! Loot templates: ungrouped entries, references and mutually exclusive groups.
//!
//! A template is processed into a [`LootSink`] (normally a loot container).
//! Ungrouped entries roll independently, references re-process another
//! template a fixed number of times, and each group yields at most one item.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::TableError;
use crate::item::ItemCatalog;
use crate::rates::DropRates;
use crate::store::LootStore;

/// Groups are stored in a 7 bit field.
pub const MAX_LOOT_GROUP: u8 = 1 << 7;

/// Reference chains deeper than this are cut off.
pub const MAX_REFERENCE_DEPTH: u32 = 8;

/// A raw template row as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct LootRow {
    pub entry: u32,
    pub item: u32,
    /// Negative values mark quest-only drops.
    #[serde(alias = "chance")]
    pub chance_or_quest_chance: f32,
    #[serde(default)]
    pub group: u8,
    /// Positive: minimum count. Negative: id of a reference template.
    #[serde(default = "default_min_count")]
    pub mincount_or_ref: i32,
    /// Maximum count, or the repeat multiplier for references.
    #[serde(default = "default_max_count")]
    pub maxcount: u32,
    #[serde(default)]
    pub condition_id: u16,
}

fn default_min_count() -> i32 {
    1
}

fn default_max_count() -> u32 {
    1
}

/// Receives the items selected while processing a template.
pub trait LootSink {
    /// Add a rolled entry with its rolled count. Returns false once the
    /// sink is full; processing stops at that point.
    fn add_item(&mut self, item: &LootStoreItem, count: u32) -> bool;

    /// Whether an item with this id was already added.
    fn is_item_already_in(&self, item_id: u32) -> bool;

    /// Whether the condition attached to an entry holds for the looters.
    fn fulfils_condition(&self, condition_id: u16) -> bool;
}

/// Everything a roll needs besides the sink.
pub struct RollContext<'a> {
    pub references: &'a LootStore,
    pub catalog: &'a ItemCatalog,
    pub rates: &'a DropRates,
    /// Rate multipliers only apply for stores that allow them.
    pub rates_allowed: bool,
}

/// `chance` is a percentage.
fn roll_chance<R: Rng + ?Sized>(rng: &mut R, chance: f32) -> bool {
    chance > rng.gen_range(0.0f32..100.0)
}

// ---------------------------------------------------------------------------
// LootStoreItem
// ---------------------------------------------------------------------------

/// One validated template entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LootStoreItem {
    pub item_id: u32,
    /// Always positive, see `needs_quest`.
    pub chance: f32,
    pub mincount_or_ref: i32,
    pub group: u8,
    pub needs_quest: bool,
    pub max_count: u8,
    pub condition_id: u16,
}

impl LootStoreItem {
    pub fn new(
        item_id: u32,
        chance_or_quest_chance: f32,
        group: u8,
        condition_id: u16,
        mincount_or_ref: i32,
        max_count: u8,
    ) -> Self {
        Self {
            item_id,
            chance: chance_or_quest_chance.abs(),
            mincount_or_ref,
            group,
            needs_quest: chance_or_quest_chance < 0.0,
            max_count,
            condition_id,
        }
    }

    /// Id of the referenced template, for reference entries.
    pub fn reference_id(&self) -> Option<u32> {
        if self.mincount_or_ref < 0 {
            Some(self.mincount_or_ref.unsigned_abs())
        } else {
            None
        }
    }

    /// Check whether the entry takes its chance.
    pub fn roll<R: Rng + ?Sized>(&self, ctx: &RollContext<'_>, rng: &mut R) -> bool {
        if self.chance >= 100.0 {
            return true;
        }

        let rate = if self.reference_id().is_some() {
            if ctx.rates_allowed {
                ctx.rates.referenced
            } else {
                1.0
            }
        } else if self.needs_quest {
            if ctx.rates_allowed {
                ctx.rates.quest
            } else {
                1.0
            }
        } else {
            match ctx.catalog.get(self.item_id) {
                Some(proto) if ctx.rates_allowed => ctx.rates.for_quality(proto.quality),
                _ => 1.0,
            }
        };

        roll_chance(rng, self.chance * rate)
    }

    /// Random count in `mincount..=maxcount`.
    pub fn roll_count<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let min = self.mincount_or_ref.max(1) as u32;
        let max = u32::from(self.max_count).max(min);
        rng.gen_range(min..=max)
    }

    /// Row-level validation. Referenced template existence is checked at
    /// store level.
    pub fn validate(
        &self,
        table: &'static str,
        entry: u32,
        catalog: &ItemCatalog,
    ) -> Result<(), TableError> {
        let item = self.item_id;

        if self.group >= MAX_LOOT_GROUP {
            return Err(TableError::GroupOutOfRange {
                table,
                entry,
                item,
                group: self.group,
            });
        }

        if self.mincount_or_ref == 0 {
            return Err(TableError::WrongMinCount {
                table,
                entry,
                item,
                value: self.mincount_or_ref,
            });
        }

        if self.mincount_or_ref > 0 {
            if catalog.get(item).is_none() {
                return Err(TableError::UnknownItem { table, entry, item });
            }

            if self.chance == 0.0 && self.group == 0 {
                return Err(TableError::EqualChanceWithoutGroup { table, entry, item });
            }

            if self.chance != 0.0 && self.chance < 0.000_001 {
                return Err(TableError::LowChance {
                    table,
                    entry,
                    item,
                    chance: self.chance,
                });
            }

            if i32::from(self.max_count) < self.mincount_or_ref {
                return Err(TableError::MaxCountBelowMinCount {
                    table,
                    entry,
                    item,
                    max: self.max_count,
                    min: self.mincount_or_ref,
                });
            }
        } else {
            if self.needs_quest {
                return Err(TableError::QuestChanceReference { table, entry, item });
            }
            if self.chance == 0.0 {
                return Err(TableError::ZeroChanceReference { table, entry, item });
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LootGroup
// ---------------------------------------------------------------------------

/// A set of mutually exclusive entries: at most one of them drops.
#[derive(Debug, Clone, Default)]
pub struct LootGroup {
    explicitly_chanced: Vec<LootStoreItem>,
    equal_chanced: Vec<LootStoreItem>,
}

impl LootGroup {
    pub fn add_entry(&mut self, item: LootStoreItem) {
        if item.chance != 0.0 {
            self.explicitly_chanced.push(item);
        } else {
            self.equal_chanced.push(item);
        }
    }

    /// Pick at most one entry.
    ///
    /// Explicitly chanced entries are shuffled and scanned against a single
    /// roll. When none is picked, equal chanced entries are shuffled and the
    /// first eligible one is taken; an item already present in the sink is
    /// skipped with a 50% chance.
    pub fn roll<'a, R: Rng + ?Sized>(
        &'a self,
        sink: &dyn LootSink,
        rng: &mut R,
    ) -> Option<&'a LootStoreItem> {
        if !self.explicitly_chanced.is_empty() {
            let mut candidates: Vec<&LootStoreItem> = self.explicitly_chanced.iter().collect();
            candidates.shuffle(rng);

            let mut chance = rng.gen_range(0.0f32..100.0);
            for item in candidates {
                if item.condition_id != 0 && !sink.fulfils_condition(item.condition_id) {
                    debug!("explicit chance: condition {} blocks item {}", item.condition_id, item.item_id);
                    continue;
                }

                if item.chance >= 100.0 {
                    return Some(item);
                }

                chance -= item.chance;
                if chance < 0.0 {
                    return Some(item);
                }
            }
        }

        if !self.equal_chanced.is_empty() {
            let mut candidates: Vec<&LootStoreItem> = self.equal_chanced.iter().collect();
            candidates.shuffle(rng);

            for item in candidates {
                if sink.is_item_already_in(item.item_id) && rng.gen_bool(0.5) {
                    continue;
                }

                if item.condition_id != 0 && !sink.fulfils_condition(item.condition_id) {
                    debug!("equal chance: condition {} blocks item {}", item.condition_id, item.item_id);
                    continue;
                }

                return Some(item);
            }
        }

        None
    }

    /// Roll the group and hand the result to the sink. Returns false when
    /// the sink is full.
    pub fn process<R: Rng + ?Sized>(&self, sink: &mut dyn LootSink, rng: &mut R) -> bool {
        match self.roll(&*sink, rng) {
            Some(item) => {
                let count = item.roll_count(rng);
                sink.add_item(item, count)
            }
            None => true,
        }
    }

    pub fn has_quest_drop(&self) -> bool {
        self.entries().any(|item| item.needs_quest)
    }

    pub fn has_quest_drop_for(&self, has_quest_for_item: &dyn Fn(u32) -> bool) -> bool {
        self.entries().any(|item| has_quest_for_item(item.item_id))
    }

    /// Sum of explicit chances, quest entries excluded.
    pub fn raw_total_chance(&self) -> f32 {
        self.explicitly_chanced
            .iter()
            .filter(|item| !item.needs_quest)
            .map(|item| item.chance)
            .sum()
    }

    /// Overall chance that the group yields something.
    pub fn total_chance(&self) -> f32 {
        let raw = self.raw_total_chance();
        if !self.equal_chanced.is_empty() && raw < 100.0 {
            100.0
        } else {
            raw
        }
    }

    pub fn verify(&self, table: &'static str, entry: u32, group: usize) -> Vec<TableError> {
        let mut problems = Vec::new();
        let chance = self.raw_total_chance();

        // Some tolerance for rounding in hand-written data.
        if chance > 101.0 {
            problems.push(TableError::GroupChanceOverflow {
                table,
                entry,
                group,
                chance,
            });
        }

        if chance >= 100.0 && !self.equal_chanced.is_empty() {
            problems.push(TableError::EqualChanceShadowed {
                table,
                entry,
                group,
                chance,
            });
        }

        problems
    }

    pub fn entries(&self) -> impl Iterator<Item = &LootStoreItem> {
        self.explicitly_chanced.iter().chain(self.equal_chanced.iter())
    }
}

// ---------------------------------------------------------------------------
// LootTemplate
// ---------------------------------------------------------------------------

/// Everything that can drop for one loot id.
#[derive(Debug, Clone, Default)]
pub struct LootTemplate {
    /// Ungrouped entries and references.
    entries: Vec<LootStoreItem>,
    /// Group N lives at index N - 1.
    groups: Vec<LootGroup>,
}

impl LootTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, item: LootStoreItem) {
        if item.group > 0 && item.mincount_or_ref > 0 {
            let index = usize::from(item.group);
            if index > self.groups.len() {
                self.groups.resize_with(index, LootGroup::default);
            }
            self.groups[index - 1].add_entry(item);
        } else {
            self.entries.push(item);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.groups.is_empty()
    }

    pub fn groups(&self) -> &[LootGroup] {
        &self.groups
    }

    /// Roll the template into `sink`. A non-zero `group_id` rolls only that
    /// group, which is how grouped references work. Returns false once the
    /// sink reported full.
    pub fn process<R: Rng + ?Sized>(
        &self,
        sink: &mut dyn LootSink,
        ctx: &RollContext<'_>,
        group_id: u8,
        rng: &mut R,
    ) -> bool {
        self.process_at_depth(sink, ctx, group_id, rng, 0)
    }

    fn process_at_depth<R: Rng + ?Sized>(
        &self,
        sink: &mut dyn LootSink,
        ctx: &RollContext<'_>,
        group_id: u8,
        rng: &mut R,
        depth: u32,
    ) -> bool {
        if group_id > 0 {
            // Missing groups were reported at load time.
            return match self.groups.get(usize::from(group_id) - 1) {
                Some(group) => group.process(sink, rng),
                None => true,
            };
        }

        for entry in &self.entries {
            if entry.condition_id != 0 && !sink.fulfils_condition(entry.condition_id) {
                continue;
            }

            if !entry.roll(ctx, rng) {
                continue;
            }

            match entry.reference_id() {
                Some(reference_id) => {
                    let Some(referenced) = ctx.references.get(reference_id) else {
                        continue;
                    };
                    if depth >= MAX_REFERENCE_DEPTH {
                        warn!(
                            "reference chain too deep at reference {} (item {}), cut off",
                            reference_id, entry.item_id
                        );
                        continue;
                    }
                    for _ in 0..entry.max_count {
                        if !referenced.process_at_depth(sink, ctx, entry.group, rng, depth + 1) {
                            return false;
                        }
                    }
                }
                None => {
                    let count = entry.roll_count(rng);
                    if !sink.add_item(entry, count) {
                        return false;
                    }
                }
            }
        }

        for group in &self.groups {
            if !group.process(sink, rng) {
                return false;
            }
        }

        true
    }

    /// True if the template can drop at least one quest item.
    pub fn has_quest_drop(&self, references: &LootStore, group_id: u8) -> bool {
        self.has_quest_drop_at_depth(references, group_id, 0)
    }

    fn has_quest_drop_at_depth(&self, references: &LootStore, group_id: u8, depth: u32) -> bool {
        if group_id > 0 {
            return self
                .groups
                .get(usize::from(group_id) - 1)
                .map(LootGroup::has_quest_drop)
                .unwrap_or(false);
        }

        for entry in &self.entries {
            match entry.reference_id() {
                Some(reference_id) => {
                    if depth >= MAX_REFERENCE_DEPTH {
                        continue;
                    }
                    if let Some(referenced) = references.get(reference_id) {
                        if referenced.has_quest_drop_at_depth(references, entry.group, depth + 1) {
                            return true;
                        }
                    }
                }
                None if entry.needs_quest => return true,
                None => {}
            }
        }

        self.groups.iter().any(LootGroup::has_quest_drop)
    }

    /// True if the template can drop an item one of the player's active
    /// quests asks for.
    pub fn has_quest_drop_for(
        &self,
        references: &LootStore,
        group_id: u8,
        has_quest_for_item: &dyn Fn(u32) -> bool,
    ) -> bool {
        self.has_quest_drop_for_at_depth(references, group_id, has_quest_for_item, 0)
    }

    fn has_quest_drop_for_at_depth(
        &self,
        references: &LootStore,
        group_id: u8,
        has_quest_for_item: &dyn Fn(u32) -> bool,
        depth: u32,
    ) -> bool {
        if group_id > 0 {
            return self
                .groups
                .get(usize::from(group_id) - 1)
                .map(|group| group.has_quest_drop_for(has_quest_for_item))
                .unwrap_or(false);
        }

        for entry in &self.entries {
            match entry.reference_id() {
                Some(reference_id) => {
                    if depth >= MAX_REFERENCE_DEPTH {
                        continue;
                    }
                    if let Some(referenced) = references.get(reference_id) {
                        if referenced.has_quest_drop_for_at_depth(
                            references,
                            entry.group,
                            has_quest_for_item,
                            depth + 1,
                        ) {
                            return true;
                        }
                    }
                }
                None if has_quest_for_item(entry.item_id) => return true,
                None => {}
            }
        }

        self.groups
            .iter()
            .any(|group| group.has_quest_drop_for(has_quest_for_item))
    }

    /// Group chance sanity checks.
    pub fn verify(&self, table: &'static str, entry: u32) -> Vec<TableError> {
        self.groups
            .iter()
            .enumerate()
            .flat_map(|(index, group)| group.verify(table, entry, index + 1))
            .collect()
    }

    /// Ids of all templates this one references.
    pub fn reference_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries
            .iter()
            .chain(self.groups.iter().flat_map(LootGroup::entries))
            .filter_map(LootStoreItem::reference_id)
    }
}
