//! Named loot stores: one template map per loot source.

use std::collections::{BTreeSet, HashMap};

use rand::Rng;
use tracing::{error, info};

use crate::error::TableError;
use crate::item::ItemCatalog;
use crate::rates::DropRates;
use crate::template::{LootRow, LootSink, LootStoreItem, LootTemplate, RollContext};

/// The loot sources a template can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LootStoreKind {
    Creature,
    Disenchant,
    Fishing,
    Gameobject,
    Item,
    Mail,
    Pickpocketing,
    Prospecting,
    Reference,
    Skinning,
}

impl LootStoreKind {
    pub const ALL: [LootStoreKind; 10] = [
        LootStoreKind::Creature,
        LootStoreKind::Disenchant,
        LootStoreKind::Fishing,
        LootStoreKind::Gameobject,
        LootStoreKind::Item,
        LootStoreKind::Mail,
        LootStoreKind::Pickpocketing,
        LootStoreKind::Prospecting,
        LootStoreKind::Reference,
        LootStoreKind::Skinning,
    ];

    /// Table name used in log messages.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Creature => "creature_loot_template",
            Self::Disenchant => "disenchant_loot_template",
            Self::Fishing => "fishing_loot_template",
            Self::Gameobject => "gameobject_loot_template",
            Self::Item => "item_loot_template",
            Self::Mail => "mail_loot_template",
            Self::Pickpocketing => "pickpocketing_loot_template",
            Self::Prospecting => "prospecting_loot_template",
            Self::Reference => "reference_loot_template",
            Self::Skinning => "skinning_loot_template",
        }
    }

    /// What the template id stands for.
    pub fn entry_name(self) -> &'static str {
        match self {
            Self::Creature => "creature entry",
            Self::Disenchant => "item disenchant id",
            Self::Fishing => "area id",
            Self::Gameobject => "gameobject entry",
            Self::Item => "item entry",
            Self::Mail => "mail template id",
            Self::Pickpocketing => "creature pickpocket lootid",
            Self::Prospecting => "item entry (ore)",
            Self::Reference => "reference id",
            Self::Skinning => "creature skinning id",
        }
    }

    /// Whether drop-rate multipliers apply to this store.
    pub fn rates_allowed(self) -> bool {
        !matches!(self, Self::Reference | Self::Mail)
    }

    /// File stem of the data file holding this store's rows.
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Creature => "creature",
            Self::Disenchant => "disenchant",
            Self::Fishing => "fishing",
            Self::Gameobject => "gameobject",
            Self::Item => "item",
            Self::Mail => "mail",
            Self::Pickpocketing => "pickpocketing",
            Self::Prospecting => "prospecting",
            Self::Reference => "reference",
            Self::Skinning => "skinning",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.file_stem() == name || kind.table_name() == name)
    }
}

/// Templates of one loot source, keyed by loot id.
#[derive(Debug, Clone)]
pub struct LootStore {
    kind: LootStoreKind,
    templates: HashMap<u32, LootTemplate>,
}

impl LootStore {
    pub fn new(kind: LootStoreKind) -> Self {
        Self {
            kind,
            templates: HashMap::new(),
        }
    }

    pub fn kind(&self) -> LootStoreKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.table_name()
    }

    pub fn is_rates_allowed(&self) -> bool {
        self.kind.rates_allowed()
    }

    /// Parse a JSON array of rows into a fresh store.
    pub fn parse_json(
        kind: LootStoreKind,
        json: &str,
        catalog: &ItemCatalog,
    ) -> Result<Self, TableError> {
        let rows: Vec<LootRow> = serde_json::from_str(json)?;
        let mut store = Self::new(kind);
        store.load_rows(rows, catalog);
        Ok(store)
    }

    /// Validate and add rows. Invalid rows are logged and skipped.
    /// Returns the number of rows kept.
    pub fn load_rows(&mut self, rows: Vec<LootRow>, catalog: &ItemCatalog) -> usize {
        let table = self.name();
        let mut count = 0;

        for row in rows {
            let Ok(max_count) = u8::try_from(row.maxcount) else {
                error!(
                    "{}",
                    TableError::MaxCountTooLarge {
                        table,
                        entry: row.entry,
                        item: row.item,
                        max_count: row.maxcount,
                    }
                );
                continue;
            };

            let item = LootStoreItem::new(
                row.item,
                row.chance_or_quest_chance,
                row.group,
                row.condition_id,
                row.mincount_or_ref,
                max_count,
            );

            if let Err(e) = item.validate(table, row.entry, catalog) {
                error!("{e}");
                continue;
            }

            self.templates.entry(row.entry).or_default().add_entry(item);
            count += 1;
        }

        for problem in self.verify() {
            error!("{problem}");
        }

        info!(
            "Loaded {} loot definitions ({} templates) from table {}",
            count,
            self.templates.len(),
            table
        );
        count
    }

    pub fn insert(&mut self, loot_id: u32, template: LootTemplate) {
        self.templates.insert(loot_id, template);
    }

    pub fn get(&self, loot_id: u32) -> Option<&LootTemplate> {
        self.templates.get(&loot_id)
    }

    pub fn contains(&self, loot_id: u32) -> bool {
        self.templates.contains_key(&loot_id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// All loot ids present in this store.
    pub fn ids(&self) -> BTreeSet<u32> {
        self.templates.keys().copied().collect()
    }

    /// Group chance checks over every template.
    pub fn verify(&self) -> Vec<TableError> {
        let mut ids: Vec<&u32> = self.templates.keys().collect();
        ids.sort();
        ids.into_iter()
            .flat_map(|id| self.templates[id].verify(self.name(), *id))
            .collect()
    }

    /// Check that every reference points to an existing reference
    /// template, and strike used ones from `unused`.
    pub fn check_loot_refs(
        &self,
        references: &LootStore,
        unused: &mut BTreeSet<u32>,
    ) -> Vec<TableError> {
        let mut problems = Vec::new();
        for template in self.templates.values() {
            for reference_id in template.reference_ids() {
                if references.contains(reference_id) {
                    unused.remove(&reference_id);
                } else {
                    problems.push(references.not_existed_id(reference_id));
                }
            }
        }
        problems
    }

    pub fn not_existed_id(&self, id: u32) -> TableError {
        TableError::MissingTemplate {
            table: self.name(),
            entry_name: self.kind.entry_name(),
            id,
        }
    }

    /// Log every id that nothing uses.
    pub fn report_unused_ids(&self, ids: &BTreeSet<u32>) -> Vec<TableError> {
        ids.iter()
            .map(|&id| TableError::UnusedTemplate {
                table: self.name(),
                entry_name: self.kind.entry_name(),
                id,
            })
            .inspect(|problem| error!("{problem}"))
            .collect()
    }

    pub fn have_quest_loot_for(&self, loot_id: u32, references: &LootStore) -> bool {
        self.get(loot_id)
            .map(|template| template.has_quest_drop(references, 0))
            .unwrap_or(false)
    }

    pub fn have_quest_loot_for_player(
        &self,
        loot_id: u32,
        references: &LootStore,
        has_quest_for_item: &dyn Fn(u32) -> bool,
    ) -> bool {
        self.get(loot_id)
            .map(|template| template.has_quest_drop_for(references, 0, has_quest_for_item))
            .unwrap_or(false)
    }
}

/// The full set of loot stores plus the shared data used to roll them.
#[derive(Debug, Clone)]
pub struct LootStores {
    stores: HashMap<LootStoreKind, LootStore>,
    pub catalog: ItemCatalog,
    pub rates: DropRates,
}

impl LootStores {
    pub fn new(catalog: ItemCatalog, rates: DropRates) -> Self {
        let stores = LootStoreKind::ALL
            .into_iter()
            .map(|kind| (kind, LootStore::new(kind)))
            .collect();
        Self {
            stores,
            catalog,
            rates,
        }
    }

    pub fn store(&self, kind: LootStoreKind) -> &LootStore {
        // every kind is inserted by `new`
        &self.stores[&kind]
    }

    pub fn store_mut(&mut self, kind: LootStoreKind) -> &mut LootStore {
        self.stores
            .entry(kind)
            .or_insert_with(|| LootStore::new(kind))
    }

    pub fn set_store(&mut self, store: LootStore) {
        self.stores.insert(store.kind(), store);
    }

    /// Roll template `loot_id` of store `kind` into `sink`.
    ///
    /// Returns `Err(MissingTemplate)` when the store has no such template;
    /// callers decide whether that is worth a log line.
    pub fn fill<R: Rng + ?Sized>(
        &self,
        kind: LootStoreKind,
        loot_id: u32,
        sink: &mut dyn LootSink,
        rng: &mut R,
    ) -> Result<(), TableError> {
        let store = self.store(kind);
        let template = store
            .get(loot_id)
            .ok_or_else(|| store.not_existed_id(loot_id))?;

        let ctx = RollContext {
            references: self.store(LootStoreKind::Reference),
            catalog: &self.catalog,
            rates: &self.rates,
            rates_allowed: store.is_rates_allowed(),
        };
        template.process(sink, &ctx, 0, rng);
        Ok(())
    }

    /// Cross-store reference checks: missing references are errors, and
    /// reference templates that nothing points to are reported.
    pub fn check_references(&self) -> Vec<TableError> {
        let references = self.store(LootStoreKind::Reference);
        let mut unused = references.ids();
        let mut problems = Vec::new();

        for kind in LootStoreKind::ALL {
            problems.extend(self.store(kind).check_loot_refs(references, &mut unused));
        }
        for problem in &problems {
            error!("{problem}");
        }

        problems.extend(references.report_unused_ids(&unused));
        problems
    }
}
