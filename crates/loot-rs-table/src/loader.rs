//! Loot data loader: scans a data directory for the item catalog and the
//! per-source template files.
//!
//! Layout:
//! ```text
//! <data>/items.json
//! <data>/loot/creature.json
//! <data>/loot/reference.json
//! ...
//! ```

use std::path::Path;

use tracing::{info, warn};

use crate::error::TableError;
use crate::item::ItemCatalog;
use crate::rates::DropRates;
use crate::store::{LootStore, LootStoreKind, LootStores};

/// Load `items.json` from the data directory.
pub fn load_item_catalog(data_dir: &Path) -> Result<ItemCatalog, TableError> {
    let path = data_dir.join("items.json");
    let content = std::fs::read_to_string(&path)?;
    let catalog = ItemCatalog::parse_json(&content)?;
    info!("Loaded {} item prototypes from {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Load every store found under `<data>/loot`. Missing or broken files
/// leave that store empty.
pub fn load_loot_stores(data_dir: &Path, catalog: ItemCatalog, rates: DropRates) -> LootStores {
    let mut stores = LootStores::new(catalog, rates);
    let loot_dir = data_dir.join("loot");

    for kind in LootStoreKind::ALL {
        let path = loot_dir.join(format!("{}.json", kind.file_stem()));
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => match LootStore::parse_json(kind, &content, &stores.catalog) {
                Ok(store) => stores.set_store(store),
                Err(e) => warn!("Failed to parse {}: {e}", path.display()),
            },
            Err(e) => warn!("Failed to read {}: {e}", path.display()),
        }
    }

    let problems = stores.check_references();
    if !problems.is_empty() {
        warn!("{} loot reference problem(s) in {}", problems.len(), loot_dir.display());
    }

    stores
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn load_missing_directory() {
        let dir = std::env::temp_dir().join("loot_rs_table_test_missing");
        let _ = fs::remove_dir_all(&dir);
        assert!(load_item_catalog(&dir).is_err());

        let stores = load_loot_stores(&dir, ItemCatalog::new(), DropRates::default());
        assert!(stores.store(LootStoreKind::Creature).is_empty());
    }

    #[test]
    fn load_data_directory() {
        let dir = std::env::temp_dir().join("loot_rs_table_test_data");
        let loot_dir = dir.join("loot");
        let _ = fs::create_dir_all(&loot_dir);

        fs::write(
            dir.join("items.json"),
            r#"[{ "id": 2589, "quality": "normal" }, { "id": 2592, "quality": "normal" }]"#,
        )
        .unwrap();
        fs::write(
            loot_dir.join("creature.json"),
            r#"[
                { "entry": 1, "item": 2589, "chance": 80, "mincount_or_ref": 1, "maxcount": 2 },
                { "entry": 1, "item": 2592, "chance": 20 }
            ]"#,
        )
        .unwrap();
        fs::write(loot_dir.join("skinning.json"), "not json").unwrap();

        let catalog = load_item_catalog(&dir).unwrap();
        assert_eq!(catalog.len(), 2);

        let stores = load_loot_stores(&dir, catalog, DropRates::default());
        assert!(stores.store(LootStoreKind::Creature).contains(1));
        assert!(stores.store(LootStoreKind::Skinning).is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn dangling_reference_keeps_the_store() {
        let dir = std::env::temp_dir().join("loot_rs_table_test_dangling");
        let loot_dir = dir.join("loot");
        let _ = fs::create_dir_all(&loot_dir);
        fs::write(
            loot_dir.join("creature.json"),
            r#"[{ "entry": 3, "item": 0, "chance": 100, "mincount_or_ref": -77 }]"#,
        )
        .unwrap();

        let stores = load_loot_stores(&dir, ItemCatalog::new(), DropRates::default());
        assert!(stores.store(LootStoreKind::Creature).contains(3));
        assert_eq!(stores.check_references().len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
