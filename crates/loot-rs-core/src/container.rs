//! A loot container: the items and gold of one target, the owners and the
//! active distribution policy.

use std::collections::BTreeSet;

use rand::{Rng, RngCore};
use tracing::{debug, error, warn};

use loot_rs_table::{ItemCatalog, ItemQuality, LootSink, LootStoreItem, LootStoreKind, LootStores};

use crate::config::LootConfig;
use crate::defines::{
    ClientLootType, CreatureLootStatus, GameObjectLootState, InventoryResult, ItemLootState,
    LootErrorCode, LootSlotType, LootStatus, LootType, RollVote, Skill, MAX_NR_LOOT_ITEMS,
};
use crate::error::LootError;
use crate::event::{LootEvent, LootOutbox, LootView};
use crate::guid::ObjectGuid;
use crate::item::{LootItem, LootItemType};
use crate::policy::{Distribution, Initialized, LootPolicy};
use crate::roll::{GroupRollSession, RollOutcome, RollStart};
use crate::target::{
    CorpseTarget, CreatureTarget, GameObjectKind, GameObjectTarget, ItemTarget, LootTarget,
    MailTarget,
};
use crate::world::LootWorld;

/// Everything a container needs from its caller for one operation.
pub struct LootContext<'a> {
    pub world: &'a mut dyn LootWorld,
    pub stores: &'a LootStores,
    pub config: &'a LootConfig,
    pub rng: &'a mut dyn RngCore,
    pub out: &'a mut LootOutbox,
}

/// Slot and category of an item a player can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LootItemRight {
    pub slot: u8,
    pub slot_type: LootSlotType,
}

/// Receives rolled template entries.
struct FillSink<'a> {
    items: &'a mut Vec<LootItem>,
    owners: &'a BTreeSet<ObjectGuid>,
    target: ObjectGuid,
    threshold: ItemQuality,
    catalog: &'a ItemCatalog,
    world: &'a dyn LootWorld,
    over_threshold: &'a mut bool,
}

impl LootSink for FillSink<'_> {
    fn add_item(&mut self, entry: &LootStoreItem, count: u32) -> bool {
        if self.items.len() >= MAX_NR_LOOT_ITEMS {
            return false;
        }
        let item = LootItem::from_store(
            entry,
            count,
            self.items.len() as u8,
            self.threshold,
            self.catalog.get(entry.item_id),
            self.world.random_enchantment(entry.item_id),
        );
        if !item.is_under_threshold {
            *self.over_threshold = true;
        }
        self.items.push(item);
        true
    }

    fn is_item_already_in(&self, item_id: u32) -> bool {
        self.items.iter().any(|item| item.item_id == item_id)
    }

    fn fulfils_condition(&self, condition_id: u16) -> bool {
        self.owners.iter().any(|&owner| {
            self.world.is_online(owner)
                && self.world.is_condition_satisfied(condition_id, owner, self.target)
        })
    }
}

#[derive(Debug)]
pub struct LootContainer {
    target: LootTarget,
    loot_type: LootType,
    client_loot_type: ClientLootType,
    items: Vec<LootItem>,
    gold: u32,
    owners: BTreeSet<ObjectGuid>,
    players_looting: BTreeSet<ObjectGuid>,
    players_opened: BTreeSet<ObjectGuid>,
    policy: LootPolicy,
    threshold: ItemQuality,
    max_enchant_skill: u32,
    have_item_over_threshold: bool,
    is_fake: bool,
    changed: bool,
    /// Successful opens of a vein or fishing hole.
    use_count: u32,
    /// A fishing hole with uses left, waiting for the next cast.
    awaiting_refill: bool,
    /// The target is done with; the container can be dropped.
    expired: bool,
}

impl LootContainer {
    pub fn new(target: LootTarget, loot_type: LootType, client_loot_type: ClientLootType) -> Self {
        Self {
            target,
            loot_type,
            client_loot_type,
            items: Vec::with_capacity(MAX_NR_LOOT_ITEMS),
            gold: 0,
            owners: BTreeSet::new(),
            players_looting: BTreeSet::new(),
            players_opened: BTreeSet::new(),
            policy: LootPolicy::SoloOwner,
            threshold: ItemQuality::Uncommon,
            max_enchant_skill: 0,
            have_item_over_threshold: false,
            is_fake: false,
            changed: false,
            use_count: 0,
            awaiting_refill: false,
            expired: false,
        }
    }

    // -----------------------------------------------------------------------
    // Construction per loot type
    // -----------------------------------------------------------------------

    /// Corpse loot of a killed creature, shared by the killer's group.
    pub fn for_kill(player: ObjectGuid, creature: &CreatureTarget, ctx: &mut LootContext<'_>) -> Self {
        let mut loot = Self::new(
            LootTarget::Creature(creature.clone()),
            LootType::Corpse,
            ClientLootType::Corpse,
        );
        loot.set_group_loot_right(player, ctx);

        let filled = creature.loot_id != 0
            && loot.fill_loot(LootStoreKind::Creature, creature.loot_id, false, ctx);
        let status = if filled || creature.max_gold > 0 {
            loot.generate_money(creature.min_gold, creature.max_gold, ctx);
            let mut looted_for_all = loot.is_looted_for_all(&*ctx.world, ctx.config);
            if looted_for_all
                && ctx.config.empty_loot_window
                && ctx.rng.gen_bool(ctx.config.empty_loot_window_chance.clamp(0.0, 1.0))
            {
                loot.is_fake = true;
                looted_for_all = false;
            }
            if looted_for_all {
                CreatureLootStatus::Looted
            } else {
                CreatureLootStatus::Lootable
            }
        } else {
            debug!("no corpse loot for {} (loot id {})", creature.guid, creature.loot_id);
            CreatureLootStatus::Looted
        };
        ctx.world.set_creature_loot_status(creature.guid, status);
        loot
    }

    pub fn for_pickpocket(
        player: ObjectGuid,
        creature: &CreatureTarget,
        ctx: &mut LootContext<'_>,
    ) -> Self {
        let target = LootTarget::Creature(creature.clone());
        let mut loot = Self::new(target, LootType::Pickpocketing, ClientLootType::Pickpocketing);
        loot.apply(LootPolicy::solo(player, &loot.target));

        if creature.pickpocket_loot_id == 0
            || !loot.fill_loot(LootStoreKind::Pickpocketing, creature.pickpocket_loot_id, false, ctx)
        {
            error!(
                "cannot create pickpocket loot for {} (loot id {})",
                creature.guid, creature.pickpocket_loot_id
            );
            return loot;
        }

        let a = ctx.rng.gen_range(0..=creature.level / 2);
        let b = ctx.rng.gen_range(0..=ctx.world.player_level(player) / 2);
        loot.gold = (10.0 * (a + b) as f32 * ctx.config.rate_drop_money) as u32;
        loot
    }

    pub fn for_skinning(
        player: ObjectGuid,
        creature: &CreatureTarget,
        ctx: &mut LootContext<'_>,
    ) -> Self {
        let target = LootTarget::Creature(creature.clone());
        let mut loot = Self::new(target, LootType::Skinning, ClientLootType::Pickpocketing);
        loot.apply(Initialized {
            policy: LootPolicy::SkinningSharedRelease { released: false },
            owners: BTreeSet::from([player]),
            threshold: ItemQuality::Uncommon,
            max_enchant_skill: 0,
        });
        if creature.skinning_loot_id == 0
            || !loot.fill_loot(LootStoreKind::Skinning, creature.skinning_loot_id, false, ctx)
        {
            error!(
                "cannot create skinning loot for {} (loot id {})",
                creature.guid, creature.skinning_loot_id
            );
        }
        loot
    }

    /// Chests, veins, fishing holes and bobbers.
    pub fn for_game_object(
        player: ObjectGuid,
        go: &GameObjectTarget,
        loot_type: LootType,
        ctx: &mut LootContext<'_>,
    ) -> Result<Self, LootError> {
        let owned_bobber = matches!(loot_type, LootType::Fishing | LootType::FishingFail)
            && go.owner == Some(player);
        if loot_type != LootType::FishingHole
            && !owned_bobber
            && !ctx.world.is_within_interaction_distance(player, go.guid)
        {
            return Err(LootError::Refused {
                player,
                target: go.guid,
                code: LootErrorCode::TooFar,
            });
        }

        let mut loot = Self::new(
            LootTarget::GameObject(go.clone()),
            loot_type,
            ClientLootType::Pickpocketing,
        );
        loot.fill_game_object(player, ctx);
        Ok(loot)
    }

    fn fill_game_object(&mut self, player: ObjectGuid, ctx: &mut LootContext<'_>) {
        let LootTarget::GameObject(go) = &self.target else {
            return;
        };
        let go = go.clone();

        match self.loot_type {
            LootType::FishingFail => {
                self.client_loot_type = ClientLootType::Fishing;
                self.apply(LootPolicy::solo(player, &self.target));
                // entry 0 holds the junk caught on a failed cast
                self.fill_loot(LootStoreKind::Fishing, 0, true, ctx);
            }
            LootType::Fishing => {
                self.client_loot_type = ClientLootType::Fishing;
                self.apply(LootPolicy::solo(player, &self.target));
                let has_subzone = go.area_id != go.zone_id;
                if !self.fill_loot(LootStoreKind::Fishing, go.area_id, has_subzone, ctx)
                    && has_subzone
                {
                    self.fill_loot(LootStoreKind::Fishing, go.zone_id, false, ctx);
                }
            }
            _ => {
                if go.loot_id != 0 {
                    self.set_group_loot_right(player, ctx);
                    self.fill_loot(LootStoreKind::Gameobject, go.loot_id, false, ctx);
                    self.generate_money(go.min_money, go.max_money, ctx);
                    self.client_loot_type = if self.loot_type == LootType::FishingHole {
                        ClientLootType::Fishing
                    } else {
                        ClientLootType::Pickpocketing
                    };
                }
            }
        }

        ctx.world
            .set_game_object_loot_state(go.guid, GameObjectLootState::Activated);
    }

    /// Next cast into a fishing hole that still has uses.
    pub fn refill_fishing_hole(&mut self, player: ObjectGuid, ctx: &mut LootContext<'_>) {
        self.reset(ctx);
        self.awaiting_refill = false;
        self.fill_game_object(player, ctx);
    }

    /// Insignia of a player's bones.
    pub fn for_insignia(
        player: ObjectGuid,
        corpse: &CorpseTarget,
        ctx: &mut LootContext<'_>,
    ) -> Result<Self, LootError> {
        if !corpse.is_bones {
            return Err(LootError::NotReady {
                target: corpse.guid,
            });
        }
        let target = LootTarget::Corpse(corpse.clone());
        let mut loot = Self::new(target, LootType::Insignia, ClientLootType::Corpse);
        loot.apply(LootPolicy::solo(player, &loot.target));

        if let Some(loot_id) = corpse.insignia_loot_id {
            loot.fill_loot(LootStoreKind::Creature, loot_id, false, ctx);
        }

        // level 10: ~6 copper, level 70: ~9 silver
        let level = if ctx.world.is_online(corpse.owner) {
            ctx.world.player_level(corpse.owner)
        } else {
            ctx.world.player_level(player)
        };
        let base = ctx.rng.gen_range(50..=150) as f32;
        loot.gold = (base * 0.016 * (level as f32 / 5.76).powf(2.5) * ctx.config.rate_drop_money) as u32;
        ctx.world.set_corpse_lootable(corpse.guid, true);
        Ok(loot)
    }

    /// Opened, disenchanted or prospected item.
    pub fn for_item(
        player: ObjectGuid,
        item: &ItemTarget,
        loot_type: LootType,
        ctx: &mut LootContext<'_>,
    ) -> Result<Self, LootError> {
        if !ctx.world.owns_item(player, item.guid) {
            return Err(LootError::NotFound {
                player,
                target: Some(item.guid),
            });
        }
        let proto = ctx.stores.catalog.get(item.entry).cloned();
        let target = LootTarget::Item(item.clone());
        let mut loot = Self::new(target, loot_type, ClientLootType::Pickpocketing);
        loot.apply(LootPolicy::solo(player, &loot.target));

        match loot_type {
            LootType::Disenchanting => {
                loot.client_loot_type = ClientLootType::Disenchanting;
                let disenchant_id = proto.as_ref().map(|p| p.disenchant_id).unwrap_or(0);
                loot.fill_loot(LootStoreKind::Disenchant, disenchant_id, true, ctx);
                ctx.world.set_item_loot_state(item.guid, ItemLootState::Temporary);
            }
            LootType::Prospecting => {
                loot.fill_loot(LootStoreKind::Prospecting, item.entry, true, ctx);
                ctx.world.set_item_loot_state(item.guid, ItemLootState::Temporary);
            }
            _ => {
                loot.loot_type = LootType::Item;
                let (min_money, max_money) = proto
                    .as_ref()
                    .map(|p| (p.min_money_loot, p.max_money_loot))
                    .unwrap_or((0, 0));
                loot.fill_loot(LootStoreKind::Item, item.entry, max_money == 0, ctx);
                loot.generate_money(min_money, max_money, ctx);
                ctx.world.set_item_loot_state(item.guid, ItemLootState::Changed);
            }
        }
        Ok(loot)
    }

    pub fn for_mail(player: ObjectGuid, mail: MailTarget, ctx: &mut LootContext<'_>) -> Self {
        let mut loot = Self::new(LootTarget::Mail(mail), LootType::Mail, ClientLootType::Pickpocketing);
        loot.apply(LootPolicy::solo(player, &loot.target));
        loot.fill_loot(LootStoreKind::Mail, mail.template_id, true, ctx);
        loot
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn target(&self) -> &LootTarget {
        &self.target
    }

    pub fn target_guid(&self) -> ObjectGuid {
        self.target.guid()
    }

    pub fn loot_type(&self) -> LootType {
        self.loot_type
    }

    pub fn client_loot_type(&self) -> ClientLootType {
        self.client_loot_type
    }

    pub fn items(&self) -> &[LootItem] {
        &self.items
    }

    pub fn item_in_slot(&self, slot: u8) -> Option<&LootItem> {
        self.items.iter().find(|item| item.slot == slot)
    }

    pub fn gold(&self) -> u32 {
        self.gold
    }

    /// Gold restored from storage.
    pub fn set_gold(&mut self, gold: u32) {
        self.gold = gold;
    }

    pub fn owners(&self) -> &BTreeSet<ObjectGuid> {
        &self.owners
    }

    pub fn policy(&self) -> &LootPolicy {
        &self.policy
    }

    pub fn is_looting(&self, player: ObjectGuid) -> bool {
        self.players_looting.contains(&player)
    }

    pub fn players_looting(&self) -> &BTreeSet<ObjectGuid> {
        &self.players_looting
    }

    pub fn is_fake(&self) -> bool {
        self.is_fake
    }

    pub fn is_chest(&self) -> bool {
        self.target.is_chest()
    }

    pub fn use_count(&self) -> u32 {
        self.use_count
    }

    pub fn is_awaiting_refill(&self) -> bool {
        self.awaiting_refill
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Whether anything changed since the last call (for persistence).
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    fn index_of(&self, slot: u8) -> Option<usize> {
        self.items.iter().position(|item| item.slot == slot)
    }

    // -----------------------------------------------------------------------
    // Owners and generation
    // -----------------------------------------------------------------------

    fn apply(&mut self, init: Initialized) {
        self.policy = init.policy;
        self.owners = init.owners;
        self.threshold = init.threshold;
        self.max_enchant_skill = init.max_enchant_skill;
    }

    /// Decide who owns this container. Chests that were already opened only
    /// gain the new player as an owner.
    pub fn set_group_loot_right(&mut self, player: ObjectGuid, ctx: &mut LootContext<'_>) {
        if self.is_chest() && !self.owners.is_empty() {
            if self.owners.insert(player) {
                self.grant_owner(player, &*ctx.world);
            }
            return;
        }

        let init = LootPolicy::for_group(player, &self.target, ctx.world);
        self.apply(init);
        let owners: Vec<ObjectGuid> = self.owners.iter().copied().collect();
        for owner in owners {
            self.grant_owner(owner, &*ctx.world);
        }
        self.send_allowed_looter(&*ctx.world, ctx.out);
    }

    fn grant_owner(&mut self, player: ObjectGuid, world: &dyn LootWorld) {
        let target = self.target.guid();
        let is_current = self.policy.current_looter() == Some(player);
        for item in &mut self.items {
            item.grant(player, target, is_current, world);
        }
    }

    /// Roll template `loot_id` into the container. The owners' permissions
    /// are fixed right after, so later group changes cannot alter them.
    pub fn fill_loot(
        &mut self,
        kind: LootStoreKind,
        loot_id: u32,
        no_empty_error: bool,
        ctx: &mut LootContext<'_>,
    ) -> bool {
        let first_new = self.items.len();
        let mut sink = FillSink {
            items: &mut self.items,
            owners: &self.owners,
            target: self.target.guid(),
            threshold: self.threshold,
            catalog: &ctx.stores.catalog,
            world: &*ctx.world,
            over_threshold: &mut self.have_item_over_threshold,
        };
        if let Err(e) = ctx.stores.fill(kind, loot_id, &mut sink, &mut *ctx.rng) {
            if !no_empty_error {
                error!("{e}");
            }
            return false;
        }

        let target = self.target.guid();
        let current_looter = self.policy.current_looter();
        for &owner in &self.owners {
            for item in &mut self.items[first_new..] {
                item.grant(owner, target, current_looter == Some(owner), &*ctx.world);
            }
        }

        let distribution = self.policy.distribution();
        let master_online = self
            .policy
            .master_looter()
            .is_some_and(|master| ctx.world.is_online(master));
        for item in &mut self.items[first_new..] {
            if item.free_for_all || item.kind == LootItemType::Quest {
                item.is_under_threshold = true;
                continue;
            }
            item.is_blocked = match distribution {
                Distribution::GroupLoot | Distribution::NeedBeforeGreed => !item.is_under_threshold,
                Distribution::MasterLoot => {
                    !item.is_under_threshold
                        && item.quality().is_some_and(|q| q > ItemQuality::Uncommon)
                        && !master_online
                }
                _ => false,
            };
        }
        self.changed = true;
        true
    }

    /// Item restored from storage; every owner may take it.
    pub fn add_saved_item(
        &mut self,
        item_id: u32,
        count: u32,
        random_suffix: u32,
        random_property_id: i32,
        catalog: &ItemCatalog,
    ) -> bool {
        if self.items.len() >= MAX_NR_LOOT_ITEMS {
            return false;
        }
        let mut item = LootItem::saved(
            item_id,
            count,
            self.items.len() as u8,
            catalog.get(item_id),
            (random_suffix, random_property_id),
        );
        item.allowed.extend(self.owners.iter().copied());
        self.items.push(item);
        true
    }

    pub fn generate_money(&mut self, min_amount: u32, max_amount: u32, ctx: &mut LootContext<'_>) {
        self.gold = roll_money(min_amount, max_amount, ctx.config.rate_drop_money, &mut *ctx.rng);
    }

    // -----------------------------------------------------------------------
    // Rights
    // -----------------------------------------------------------------------

    fn slot_type_for(
        &self,
        item: &LootItem,
        player: ObjectGuid,
        world: &dyn LootWorld,
        config: &LootConfig,
    ) -> Option<LootSlotType> {
        match self.policy {
            LootPolicy::SkinningSharedRelease { released } => {
                let visible = (released || self.owners.contains(&player))
                    && !item.is_taken()
                    && !item.picked_up.contains(&player)
                    && item.allowed_for_player(player, self.target.guid(), world);
                visible.then_some(LootSlotType::Owner)
            }
            _ => item.slot_type(player, &self.policy.slot_rules(self.is_chest(), config, world)),
        }
    }

    /// Items `player` can see, in slot order.
    pub fn have_item_for(
        &self,
        player: ObjectGuid,
        world: &dyn LootWorld,
        config: &LootConfig,
    ) -> Vec<LootItemRight> {
        self.items
            .iter()
            .filter_map(|item| {
                self.slot_type_for(item, player, world, config)
                    .map(|slot_type| LootItemRight {
                        slot: item.slot,
                        slot_type,
                    })
            })
            .collect()
    }

    pub fn status_for(&self, player: ObjectGuid, world: &dyn LootWorld, config: &LootConfig) -> LootStatus {
        if self.is_fake && self.players_opened.is_empty() {
            return LootStatus::FAKE_LOOT;
        }

        let mut status = LootStatus::default();
        if self.gold != 0 {
            status.insert(LootStatus::CONTAIN_GOLD);
        }
        for item in &self.items {
            if self.slot_type_for(item, player, world, config).is_none() {
                continue;
            }
            status.insert(LootStatus::NOT_FULLY_LOOTED);
            if item.free_for_all {
                status.insert(LootStatus::CONTAIN_FFA);
            }
            if item.is_released {
                status.insert(LootStatus::CONTAIN_RELEASED_ITEMS);
            }
            if item.is_blocked {
                status.insert(LootStatus::ONGOING_ROLL);
            }
        }
        status
    }

    pub fn is_looted_for(&self, player: ObjectGuid, world: &dyn LootWorld, config: &LootConfig) -> bool {
        self.status_for(player, world, config).is_empty()
    }

    pub fn is_looted_for_all(&self, world: &dyn LootWorld, config: &LootConfig) -> bool {
        if let LootPolicy::SkinningSharedRelease { .. } = self.policy {
            return self.items.iter().all(|item| !item.picked_up.is_empty());
        }
        self.owners
            .iter()
            .filter(|&&owner| world.is_online(owner))
            .all(|&owner| self.is_looted_for(owner, world, config))
    }

    fn admits_late_owners(&self) -> bool {
        self.is_chest() || matches!(self.policy, LootPolicy::SkinningSharedRelease { released: true })
    }

    /// Whether `player` may open the window and take something.
    pub fn can_loot(&self, player: ObjectGuid, world: &dyn LootWorld, config: &LootConfig) -> bool {
        if !self.owners.contains(&player) && !self.admits_late_owners() {
            return false;
        }
        if let LootPolicy::SkinningSharedRelease { .. } = self.policy {
            return !self.have_item_for(player, world, config).is_empty();
        }

        let status = self.status_for(player, world, config);
        if status.is_empty() {
            return false;
        }
        if status.contains(LootStatus::ONGOING_ROLL)
            || status.contains(LootStatus::CONTAIN_GOLD)
            || status.contains(LootStatus::CONTAIN_FFA)
        {
            return true;
        }

        let distribution = self.policy.distribution();
        if matches!(distribution, Distribution::NotGroup | Distribution::FreeForAll) {
            return true;
        }
        if self.have_item_over_threshold {
            if let Some(master) = self.policy.master_looter() {
                if master == player || !world.is_online(master) {
                    return true;
                }
            }
            if !matches!(distribution, Distribution::MasterLoot | Distribution::RoundRobin) {
                return true;
            }
        }
        status.contains(LootStatus::CONTAIN_RELEASED_ITEMS)
            || self.policy.current_looter() == Some(player)
    }

    // -----------------------------------------------------------------------
    // Window
    // -----------------------------------------------------------------------

    /// Open the loot window for `player`.
    pub fn show_content_to(&mut self, player: ObjectGuid, ctx: &mut LootContext<'_>) -> Result<(), LootError> {
        let target = self.target.guid();

        if self.is_chest() {
            if !self.players_looting.is_empty() && !self.players_looting.contains(&player) {
                ctx.out.push(LootEvent::LootError {
                    to: player,
                    target,
                    code: LootErrorCode::Locked,
                });
                return Err(LootError::Refused {
                    player,
                    target,
                    code: LootErrorCode::Locked,
                });
            }
            if !self.owners.contains(&player) {
                self.set_group_loot_right(player, ctx);
            }
        } else {
            if self.admits_late_owners() && self.owners.insert(player) {
                self.grant_owner(player, &*ctx.world);
            }

            let may_open = self.can_loot(player, &*ctx.world, ctx.config)
                || (self.owners.contains(&player) && (self.items.is_empty() || self.is_fake));
            if !may_open {
                warn!("{} tried to open {} without rights", player, target);
                self.send_release_for(player, ctx.out);
                return Err(LootError::NotPermitted { player, target });
            }
            self.players_opened.insert(player);
        }

        if self.policy.is_group() {
            self.group_check(ctx);
        }

        let items = self
            .have_item_for(player, &*ctx.world, ctx.config)
            .into_iter()
            .filter_map(|right| {
                self.item_in_slot(right.slot).map(|item| LootView {
                    slot: item.slot,
                    item_id: item.item_id,
                    count: item.count,
                    display_id: item.display_id(),
                    random_suffix: item.random_suffix,
                    random_property_id: item.random_property_id,
                    slot_type: right.slot_type,
                })
            })
            .collect();
        ctx.out.push(LootEvent::LootResponse {
            to: player,
            target,
            client_loot_type: self.client_loot_type,
            gold: self.gold,
            items,
        });
        self.players_looting.insert(player);
        Ok(())
    }

    /// First window on a group container: start rolls on blocked items and
    /// send the master looter the candidate list.
    fn group_check(&mut self, ctx: &mut LootContext<'_>) {
        let target = self.target.guid();
        let start = RollStart {
            need_before_greed: matches!(self.policy, LootPolicy::NeedBeforeGreed(_)),
            max_enchant_skill: self.max_enchant_skill,
            timeout_ms: ctx.config.roll_timeout_ms,
        };
        let master = self.policy.master_looter();

        let Some(rolling) = self.policy.rolling_mut() else {
            return;
        };
        if rolling.checked {
            return;
        }
        rolling.checked = true;

        for item in &mut self.items {
            if !item.is_blocked || rolling.rolls.contains_key(&item.slot) {
                continue;
            }
            let mut session = GroupRollSession::new(target, item);
            if session.try_start(item, &self.owners, start, &*ctx.world, ctx.out) {
                rolling.rolls.insert(item.slot, session);
            }
        }

        if let Some(master) = master.filter(|&m| ctx.world.is_online(m)) {
            let candidates = self
                .owners
                .iter()
                .copied()
                .filter(|&owner| ctx.world.is_online(owner))
                .collect();
            ctx.out.push(LootEvent::MasterList {
                to: master,
                target,
                candidates,
            });
        }
    }

    fn send_allowed_looter(&self, world: &dyn LootWorld, out: &mut LootOutbox) {
        if !self.policy.is_group() {
            return;
        }
        for &owner in &self.owners {
            if !world.is_online(owner) {
                continue;
            }
            out.push(LootEvent::AllowedLooters {
                to: owner,
                target: self.target.guid(),
                master: self.policy.master_looter(),
                current_looter: self.policy.current_looter(),
            });
        }
    }

    fn send_release_for(&mut self, player: ObjectGuid, out: &mut LootOutbox) {
        out.push(LootEvent::ReleaseResponse {
            to: player,
            target: self.target.guid(),
        });
        self.players_looting.remove(&player);
    }

    fn send_release_for_all(&mut self, out: &mut LootOutbox) {
        let looting: Vec<ObjectGuid> = self.players_looting.iter().copied().collect();
        for player in looting {
            self.send_release_for(player, out);
        }
    }

    // -----------------------------------------------------------------------
    // Taking things
    // -----------------------------------------------------------------------

    /// Take an item the player sees as theirs.
    pub fn request_item(&mut self, player: ObjectGuid, slot: u8, ctx: &mut LootContext<'_>) -> Result<(), LootError> {
        let target = self.target.guid();
        if !self.players_looting.contains(&player) {
            return Err(LootError::NotLooting { player, target });
        }
        let item = self
            .item_in_slot(slot)
            .ok_or(LootError::SlotNotFound { target, slot })?;
        let slot_type = self.slot_type_for(item, player, &*ctx.world, ctx.config);
        if !matches!(slot_type, Some(LootSlotType::Owner | LootSlotType::Normal)) {
            return Err(LootError::SlotNotPermitted { player, target, slot });
        }
        let item_id = item.item_id;

        match self.send_item(player, slot, ctx) {
            InventoryResult::Ok => Ok(()),
            result => Err(LootError::Inventory {
                player,
                item_id,
                result,
            }),
        }
    }

    /// Deliver the item in `slot` to `recipient`.
    ///
    /// On failure the item goes back to the pool and the recipient becomes
    /// the current looter.
    pub fn send_item(&mut self, recipient: ObjectGuid, slot: u8, ctx: &mut LootContext<'_>) -> InventoryResult {
        let Some(index) = self.index_of(slot) else {
            if ctx.world.is_online(recipient) {
                self.send_release_for(recipient, ctx.out);
            }
            return InventoryResult::ItemNotFound;
        };

        let online = ctx.world.is_online(recipient);
        let (item_id, count, property) = {
            let item = &self.items[index];
            (item.item_id, item.count, item.random_property_id)
        };
        let result = if online {
            ctx.world.can_store_item(recipient, item_id, count)
        } else {
            InventoryResult::CantDoRightNow
        };

        if !result.is_ok() {
            if online {
                ctx.out.push(LootEvent::EquipError {
                    to: recipient,
                    item_id,
                    result,
                });
            }
            let item = &mut self.items[index];
            item.is_blocked = false;
            item.is_released = false;
            self.policy.set_current_looter(recipient);
            self.send_allowed_looter(&*ctx.world, ctx.out);
            return result;
        }

        ctx.world.store_item(recipient, item_id, count, property);
        if self.items[index].free_for_all {
            ctx.out.push(LootEvent::ItemRemoved { to: recipient, slot });
        } else {
            for &looter in &self.players_looting {
                ctx.out.push(LootEvent::ItemRemoved { to: looter, slot });
            }
        }
        ctx.out.push(LootEvent::NewItem {
            to: recipient,
            item_id,
            count,
        });
        self.items[index].mark_picked(recipient);
        self.changed = true;
        debug!("{} looted item {} x{} from {}", recipient, item_id, count, self.target.guid());

        if self.is_looted_for_all(&*ctx.world, ctx.config) {
            self.send_release_for_all(ctx.out);
            if let LootTarget::GameObject(go) = &self.target {
                if go.is_chest() && !go.kind.is_vein() {
                    ctx.world
                        .set_game_object_loot_state(go.guid, GameObjectLootState::JustDeactivated);
                }
            }
        } else if self.is_looted_for(recipient, &*ctx.world, ctx.config) {
            self.send_release_for(recipient, ctx.out);
        }
        result
    }

    /// Store everything the player owns here. Returns false if anything
    /// did not fit.
    pub fn auto_store(&mut self, player: ObjectGuid, ctx: &mut LootContext<'_>) -> bool {
        let mut stored_all = true;
        for index in 0..self.items.len() {
            let visible = matches!(
                self.slot_type_for(&self.items[index], player, &*ctx.world, ctx.config),
                Some(LootSlotType::Owner | LootSlotType::Normal)
            );
            if !visible {
                continue;
            }
            let item = &self.items[index];
            let (item_id, count, property) = (item.item_id, item.count, item.random_property_id);
            let result = ctx.world.can_store_item(player, item_id, count);
            if !result.is_ok() {
                ctx.out.push(LootEvent::EquipError {
                    to: player,
                    item_id,
                    result,
                });
                stored_all = false;
                continue;
            }
            ctx.world.store_item(player, item_id, count, property);
            ctx.out.push(LootEvent::NewItem {
                to: player,
                item_id,
                count,
            });
            self.items[index].mark_picked(player);
            self.changed = true;
        }
        stored_all
    }

    /// Take the gold. Group loot splits it evenly between online owners;
    /// the odd coppers go to the looter.
    pub fn send_gold(&mut self, player: ObjectGuid, ctx: &mut LootContext<'_>) -> Result<(), LootError> {
        let target = self.target.guid();
        if self.gold == 0 {
            return Err(LootError::NoGold { target });
        }
        if !self.players_looting.contains(&player) {
            return Err(LootError::NotLooting { player, target });
        }

        for &looter in &self.players_looting {
            ctx.out.push(LootEvent::ClearMoney { to: looter });
        }

        if self.policy.distribution() != Distribution::NotGroup {
            let receivers: Vec<ObjectGuid> = self
                .owners
                .iter()
                .copied()
                .filter(|&owner| ctx.world.is_online(owner))
                .collect();
            let share = self.gold / receivers.len().max(1) as u32;
            // the looter keeps what does not divide evenly
            let remainder = self.gold - share * receivers.len() as u32;
            for owner in receivers {
                let amount = if owner == player { share + remainder } else { share };
                ctx.world.modify_money(owner, amount);
                ctx.out.push(LootEvent::MoneyNotify { to: owner, amount });
            }
        } else {
            ctx.world.modify_money(player, self.gold);
            if let LootTarget::Item(item) = &self.target {
                ctx.world.set_item_loot_state(item.guid, ItemLootState::Changed);
            }
        }
        self.gold = 0;
        self.changed = true;

        if self.is_looted_for(player, &*ctx.world, ctx.config) {
            self.release(player, ctx);
        }
        Ok(())
    }

    /// Hand a master-loot item to a chosen owner.
    pub fn assign_master_loot(
        &mut self,
        master: ObjectGuid,
        slot: u8,
        recipient: ObjectGuid,
        ctx: &mut LootContext<'_>,
    ) -> Result<(), LootError> {
        let target = self.target.guid();
        if self.policy.master_looter() != Some(master) {
            return Err(LootError::NotMasterLooter {
                player: master,
                target,
            });
        }
        let item = self
            .item_in_slot(slot)
            .ok_or(LootError::SlotNotFound { target, slot })?;
        if self.slot_type_for(item, master, &*ctx.world, ctx.config) != Some(LootSlotType::Master) {
            return Err(LootError::SlotNotPermitted {
                player: master,
                target,
                slot,
            });
        }

        let refuse = |code: LootErrorCode, out: &mut LootOutbox| -> Result<(), LootError> {
            out.push(LootEvent::LootError {
                to: master,
                target,
                code,
            });
            Err(LootError::Refused {
                player: master,
                target,
                code,
            })
        };
        if !self.owners.contains(&recipient) || !ctx.world.is_online(recipient) {
            return refuse(LootErrorCode::PlayerNotFound, ctx.out);
        }
        if !item.allowed.contains(&recipient) {
            return refuse(LootErrorCode::MasterOther, ctx.out);
        }
        let result = ctx.world.can_store_item(recipient, item.item_id, item.count);
        if !result.is_ok() {
            return refuse(result.master_error(), ctx.out);
        }

        match self.send_item(recipient, slot, ctx) {
            InventoryResult::Ok => Ok(()),
            result => refuse(result.master_error(), ctx.out),
        }
    }

    // -----------------------------------------------------------------------
    // Rolls
    // -----------------------------------------------------------------------

    pub fn roll_for_slot(&self, slot: u8) -> Option<&GroupRollSession> {
        self.policy.roll_for_slot(slot)
    }

    pub fn vote(
        &mut self,
        player: ObjectGuid,
        slot: u8,
        vote: RollVote,
        ctx: &mut LootContext<'_>,
    ) -> Result<(), LootError> {
        let target = self.target.guid();
        let session = self
            .policy
            .roll_for_slot_mut(slot)
            .ok_or(LootError::RollNotFound { target, slot })?;
        session.player_vote(player, vote, &mut *ctx.rng, &*ctx.world, ctx.out)
    }

    /// Advance running rolls and act on the finished ones.
    pub fn update(&mut self, diff_ms: u32, ctx: &mut LootContext<'_>) {
        let mut finished = Vec::new();
        if let Some(rolling) = self.policy.rolling_mut() {
            for (&slot, session) in rolling.rolls.iter_mut() {
                if let Some(outcome) = session.update(diff_ms, &*ctx.world, ctx.out) {
                    finished.push((slot, outcome));
                }
            }
            for (slot, _) in &finished {
                rolling.rolls.remove(slot);
            }
        }

        for (slot, outcome) in finished {
            self.finish_roll(slot, outcome, ctx);
        }
    }

    fn finish_roll(&mut self, slot: u8, outcome: RollOutcome, ctx: &mut LootContext<'_>) {
        let Some(index) = self.index_of(slot) else {
            return;
        };
        self.items[index].is_blocked = false;
        match outcome {
            RollOutcome::AllPassed => self.items[index].is_released = true,
            RollOutcome::Winner { player, .. } => {
                if ctx.world.is_online(player) {
                    self.send_item(player, slot, ctx);
                } else {
                    self.items[index].is_released = true;
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Release and teardown
    // -----------------------------------------------------------------------

    /// The player closed the window.
    pub fn release(&mut self, player: ObjectGuid, ctx: &mut LootContext<'_>) {
        let was_looting = self.players_looting.contains(&player);
        if !was_looting && !self.owners.contains(&player) {
            debug!("{} released {} without looting it", player, self.target.guid());
            return;
        }
        let could_loot = self.can_loot(player, &*ctx.world, ctx.config);
        self.send_release_for(player, ctx.out);

        let privileged = self.policy.current_looter() == Some(player)
            || self.policy.master_looter() == Some(player);
        if privileged {
            for index in 0..self.items.len() {
                let slot_type = self.slot_type_for(&self.items[index], player, &*ctx.world, ctx.config);
                if matches!(slot_type, None | Some(LootSlotType::View)) {
                    continue;
                }
                let item = &mut self.items[index];
                if !item.is_blocked && !item.is_released {
                    item.is_released = true;
                }
            }
        }

        if let LootPolicy::SkinningSharedRelease { released } = &mut self.policy {
            if could_loot {
                *released = true;
            }
        }

        self.finalize_target(player, ctx);
    }

    fn finalize_target(&mut self, player: ObjectGuid, ctx: &mut LootContext<'_>) {
        let target = self.target.clone();
        match target {
            LootTarget::GameObject(go) => self.finalize_game_object(player, &go, ctx),
            LootTarget::Corpse(corpse) => {
                if !ctx.world.is_within_interaction_distance(player, corpse.guid) {
                    return;
                }
                if self.is_looted_for(player, &*ctx.world, ctx.config) {
                    self.reset(ctx);
                    ctx.world.set_corpse_lootable(corpse.guid, false);
                    self.expired = true;
                }
            }
            LootTarget::Item(item) => self.finalize_item(player, &item, ctx),
            LootTarget::Creature(creature) => match self.loot_type {
                LootType::Pickpocketing => {
                    if self.is_looted_for(player, &*ctx.world, ctx.config) {
                        ctx.world
                            .set_creature_loot_status(creature.guid, CreatureLootStatus::Pickpocketed);
                        self.expired = true;
                    }
                }
                LootType::Skinning => {
                    if self.is_looted_for_all(&*ctx.world, ctx.config) {
                        ctx.world.set_creature_loot_status(creature.guid, CreatureLootStatus::Skinned);
                        self.expired = true;
                    } else {
                        // released with items left: anyone may finish it
                        ctx.world
                            .set_creature_loot_status(creature.guid, CreatureLootStatus::SkinAvailable);
                    }
                }
                _ => {
                    if self.is_fake || self.is_looted_for_all(&*ctx.world, ctx.config) {
                        self.send_release_for_all(ctx.out);
                        ctx.world.set_creature_loot_status(creature.guid, CreatureLootStatus::Looted);
                        self.expired = true;
                    }
                }
            },
            LootTarget::Mail(_) => {
                if self.is_looted_for(player, &*ctx.world, ctx.config) {
                    self.expired = true;
                }
            }
        }
    }

    fn finalize_game_object(&mut self, player: ObjectGuid, go: &GameObjectTarget, ctx: &mut LootContext<'_>) {
        match go.kind {
            GameObjectKind::Door => ctx.world.use_door(go.guid),
            GameObjectKind::Chest {
                min_success_opens,
                max_success_opens,
                lock_skill,
                ..
            } => {
                if !self.is_looted_for_all(&*ctx.world, ctx.config) {
                    return;
                }
                let refill = go.kind.is_vein()
                    && self.roll_vein_refill(
                        player,
                        min_success_opens,
                        max_success_opens,
                        lock_skill,
                        ctx,
                    );
                if refill {
                    // nobody else can be looting a vein
                    self.reset(ctx);
                    self.set_group_loot_right(player, ctx);
                    self.fill_loot(LootStoreKind::Gameobject, go.loot_id, false, ctx);
                    ctx.world
                        .set_game_object_loot_state(go.guid, GameObjectLootState::Ready);
                } else {
                    ctx.world
                        .set_game_object_loot_state(go.guid, GameObjectLootState::JustDeactivated);
                    self.expired = true;
                }
            }
            GameObjectKind::FishingHole {
                min_success_opens,
                max_success_opens,
            } => {
                self.use_count += 1;
                let (low, high) = (
                    min_success_opens.min(max_success_opens),
                    min_success_opens.max(max_success_opens),
                );
                if self.use_count >= ctx.rng.gen_range(low..=high) {
                    ctx.world
                        .set_game_object_loot_state(go.guid, GameObjectLootState::JustDeactivated);
                    self.expired = true;
                } else {
                    ctx.world
                        .set_game_object_loot_state(go.guid, GameObjectLootState::Ready);
                    self.awaiting_refill = true;
                }
            }
            GameObjectKind::FishingNode | GameObjectKind::Other => {
                ctx.world
                    .set_game_object_loot_state(go.guid, GameObjectLootState::JustDeactivated);
                self.expired = true;
            }
        }
    }

    /// Whether an emptied vein fills up again for another open.
    fn roll_vein_refill(
        &mut self,
        player: ObjectGuid,
        min_opens: u32,
        max_opens: u32,
        lock_skill: Option<u32>,
        ctx: &mut LootContext<'_>,
    ) -> bool {
        let config = ctx.config;
        let min_amount = min_opens as f32 * config.rate_mining_amount;
        let max_amount = max_opens as f32 * config.rate_mining_amount;

        self.use_count += 1;
        let uses = self.use_count as f32;
        if uses >= max_amount {
            return false;
        }
        if uses < min_amount {
            return true;
        }

        let required = lock_skill.unwrap_or(config.vein_default_required_skill) as f32;
        let skill = ctx.world.skill_value(player, Skill::Mining) as f32 / (required + 25.0);
        let chance = (0.8 * config.rate_mining_next as f64).powf(4.0 / max_amount as f64 * uses as f64);
        let roll = 100.0 * chance as f32 + skill;
        roll > ctx.rng.gen_range(0.0f32..100.0)
    }

    fn finalize_item(&mut self, player: ObjectGuid, item: &ItemTarget, ctx: &mut LootContext<'_>) {
        match self.loot_type {
            LootType::Prospecting => {
                self.reset(ctx);
                ctx.world.set_item_loot_state(item.guid, ItemLootState::Removed);
                ctx.world.destroy_item(player, item.guid, Some(item.count.min(5)));
                self.expired = true;
            }
            LootType::Disenchanting => {
                if !self.is_looted_for(player, &*ctx.world, ctx.config) {
                    // lost when the bags are full
                    self.auto_store(player, ctx);
                }
                self.reset(ctx);
                ctx.world.set_item_loot_state(item.guid, ItemLootState::Removed);
                ctx.world.destroy_item(player, item.guid, None);
                self.expired = true;
            }
            _ => {
                if self.is_looted_for(player, &*ctx.world, ctx.config) {
                    ctx.world.set_item_loot_state(item.guid, ItemLootState::Removed);
                    ctx.world.destroy_item(player, item.guid, None);
                    self.expired = true;
                }
            }
        }
    }

    /// Empty the container, cancelling rolls in progress.
    fn reset(&mut self, ctx: &mut LootContext<'_>) {
        self.cancel_rolls(&*ctx.world, ctx.out);
        self.items.clear();
        self.players_looting.clear();
        self.gold = 0;
        self.owners.clear();
        self.policy = LootPolicy::SoloOwner;
        self.max_enchant_skill = 0;
        self.have_item_over_threshold = false;
    }

    fn cancel_rolls(&mut self, world: &dyn LootWorld, out: &mut LootOutbox) {
        if let Some(rolling) = self.policy.rolling_mut() {
            for session in rolling.rolls.values_mut() {
                session.cancel(world, out);
            }
            rolling.rolls.clear();
        }
    }

    /// Tear down before the container is dropped: running rolls end as
    /// all-passed and every open window is closed.
    pub fn shutdown(&mut self, world: &dyn LootWorld, out: &mut LootOutbox) {
        self.cancel_rolls(world, out);
        self.send_release_for_all(out);
    }
}

/// Gold between `min` and `max`, scaled by `rate`. Wide ranges are rolled
/// in steps of 256.
pub fn roll_money(min: u32, max: u32, rate: f32, rng: &mut dyn RngCore) -> u32 {
    if max == 0 {
        0
    } else if max <= min {
        (max as f32 * rate) as u32
    } else if max - min < 32_700 {
        (rng.gen_range(min..=max) as f32 * rate) as u32
    } else {
        ((rng.gen_range(min >> 8..=max >> 8) as f32 * rate) as u32) << 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWorld;
    use loot_rs_table::{DropRates, ItemPrototype, LootStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const P1: ObjectGuid = ObjectGuid::player(1);
    const P2: ObjectGuid = ObjectGuid::player(2);
    const MOB: ObjectGuid = ObjectGuid::unit(9);
    const HOLE: ObjectGuid = ObjectGuid::game_object(3);

    const FISH: u32 = 10;
    const LEATHER: u32 = 11;
    const HIDE: u32 = 12;
    const TOOTH: u32 = 13;
    const TOKEN: u32 = 14;

    struct Harness {
        world: MockWorld,
        stores: LootStores,
        config: LootConfig,
        rng: StdRng,
        out: LootOutbox,
    }

    impl Harness {
        fn new(tables: &[(LootStoreKind, &str)]) -> Self {
            let mut catalog = ItemCatalog::new();
            for id in [FISH, LEATHER, HIDE, TOOTH, TOKEN] {
                catalog.insert(ItemPrototype::new(id, ItemQuality::Normal));
            }
            let mut stores = LootStores::new(catalog.clone(), DropRates::default());
            for (kind, json) in tables {
                stores.set_store(LootStore::parse_json(*kind, json, &catalog).unwrap());
            }
            let mut world = MockWorld::new();
            world.add_player(P1, 30);
            world.add_player(P2, 30);
            Self {
                world,
                stores,
                config: LootConfig::default(),
                rng: StdRng::seed_from_u64(3),
                out: LootOutbox::new(),
            }
        }

        fn ctx(&mut self) -> LootContext<'_> {
            LootContext {
                world: &mut self.world,
                stores: &self.stores,
                config: &self.config,
                rng: &mut self.rng,
                out: &mut self.out,
            }
        }
    }

    fn creature() -> CreatureTarget {
        CreatureTarget {
            guid: MOB,
            level: 30,
            loot_id: 1,
            pickpocket_loot_id: 2,
            skinning_loot_id: 3,
            ..CreatureTarget::default()
        }
    }

    #[test]
    fn money_ranges() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(roll_money(10, 0, 1.0, &mut rng), 0);
        assert_eq!(roll_money(50, 50, 2.0, &mut rng), 100);

        let narrow = roll_money(100, 200, 1.0, &mut rng);
        assert!((100..=200).contains(&narrow));

        let wide = roll_money(0, 100_000, 1.0, &mut rng);
        assert_eq!(wide % 256, 0);
        assert!(wide <= 100_000);
    }

    #[test]
    fn corpse_nobody_can_loot_may_fake_a_window() {
        let mut h = Harness::new(&[(
            LootStoreKind::Creature,
            r#"[{ "entry": 1, "item": 14, "chance": -100 }]"#,
        )]);
        h.config.empty_loot_window_chance = 1.0;

        let mut loot = LootContainer::for_kill(P1, &creature(), &mut h.ctx());
        assert!(loot.is_fake());
        assert_eq!(h.world.creature_status[&MOB], CreatureLootStatus::Lootable);
        assert_eq!(loot.status_for(P1, &h.world, &h.config), LootStatus::FAKE_LOOT);

        loot.show_content_to(P1, &mut h.ctx()).unwrap();
        assert!(loot.is_looted_for(P1, &h.world, &h.config));
        loot.release(P1, &mut h.ctx());
        assert_eq!(h.world.creature_status[&MOB], CreatureLootStatus::Looted);
        assert!(loot.is_expired());
    }

    #[test]
    fn quest_item_only_for_the_questing_player() {
        let mut h = Harness::new(&[(
            LootStoreKind::Creature,
            r#"[{ "entry": 1, "item": 14, "chance": -100 }]"#,
        )]);
        h.world.give_quest_item(P1, TOKEN);
        let loot = LootContainer::for_kill(P1, &creature(), &mut h.ctx());
        assert!(!loot.is_fake());
        assert_eq!(loot.have_item_for(P1, &h.world, &h.config).len(), 1);
        assert!(loot.items()[0].is_under_threshold);
    }

    #[test]
    fn conditional_entries_need_an_owner_meeting_them() {
        let table = r#"[{ "entry": 1, "item": 13, "chance": 100, "condition_id": 5 }]"#;
        let mut h = Harness::new(&[(LootStoreKind::Creature, table)]);
        let loot = LootContainer::for_kill(P1, &creature(), &mut h.ctx());
        assert!(loot.items().is_empty());

        let mut h = Harness::new(&[(LootStoreKind::Creature, table)]);
        h.world.satisfy_condition(5, P1);
        let loot = LootContainer::for_kill(P1, &creature(), &mut h.ctx());
        assert_eq!(loot.items()[0].item_id, TOOTH);
    }

    #[test]
    fn skinning_opens_to_everyone_after_release() {
        let mut h = Harness::new(&[(
            LootStoreKind::Skinning,
            r#"[
                { "entry": 3, "item": 11, "chance": 100 },
                { "entry": 3, "item": 12, "chance": 100 }
            ]"#,
        )]);
        let mut loot = LootContainer::for_skinning(P1, &creature(), &mut h.ctx());
        assert!(!loot.can_loot(P2, &h.world, &h.config));

        loot.show_content_to(P1, &mut h.ctx()).unwrap();
        loot.request_item(P1, 0, &mut h.ctx()).unwrap();
        loot.release(P1, &mut h.ctx());
        assert_eq!(h.world.creature_status[&MOB], CreatureLootStatus::SkinAvailable);
        assert!(matches!(loot.policy(), LootPolicy::SkinningSharedRelease { released: true }));

        loot.show_content_to(P2, &mut h.ctx()).unwrap();
        loot.request_item(P2, 1, &mut h.ctx()).unwrap();
        assert_eq!(h.world.bag(P2), &[(HIDE, 1)]);
        loot.release(P2, &mut h.ctx());
        assert_eq!(h.world.creature_status[&MOB], CreatureLootStatus::Skinned);
    }

    #[test]
    fn pickpocket_pays_gold_and_marks_the_creature() {
        let mut h = Harness::new(&[(
            LootStoreKind::Pickpocketing,
            r#"[{ "entry": 2, "item": 13, "chance": 100 }]"#,
        )]);
        let mut loot = LootContainer::for_pickpocket(P1, &creature(), &mut h.ctx());
        // 10 * (rand(0, 15) + rand(0, 15))
        assert!(loot.gold() <= 300);
        assert_eq!(loot.gold() % 10, 0);

        loot.show_content_to(P1, &mut h.ctx()).unwrap();
        loot.request_item(P1, 0, &mut h.ctx()).unwrap();
        if loot.gold() > 0 {
            loot.send_gold(P1, &mut h.ctx()).unwrap();
        } else {
            loot.release(P1, &mut h.ctx());
        }
        assert_eq!(h.world.creature_status[&MOB], CreatureLootStatus::Pickpocketed);
    }

    #[test]
    fn insignia_needs_bones() {
        let mut h = Harness::new(&[]);
        let corpse = CorpseTarget {
            guid: ObjectGuid::corpse(4),
            owner: P2,
            is_bones: false,
            insignia_loot_id: None,
        };
        assert!(LootContainer::for_insignia(P1, &corpse, &mut h.ctx()).is_err());

        let bones = CorpseTarget {
            is_bones: true,
            ..corpse
        };
        let loot = LootContainer::for_insignia(P1, &bones, &mut h.ctx()).unwrap();
        // level 30: (30 / 5.76)^2.5 * 0.016 * 50..=150
        assert!((49..=149).contains(&loot.gold()), "gold {}", loot.gold());
        assert!(h.world.corpse_lootable[&bones.guid]);
    }

    fn fishing_spot(kind: GameObjectKind) -> GameObjectTarget {
        GameObjectTarget {
            guid: HOLE,
            entry: 1,
            kind,
            loot_id: 0,
            min_money: 0,
            max_money: 0,
            owner: Some(P1),
            zone_id: 1,
            area_id: 10,
        }
    }

    #[test]
    fn fishing_falls_back_to_the_zone() {
        let mut h = Harness::new(&[(
            LootStoreKind::Fishing,
            r#"[{ "entry": 1, "item": 10, "chance": 100 }]"#,
        )]);
        // far away is fine for one's own bobber
        h.world.set_out_of_range(P1, HOLE);
        let bobber = fishing_spot(GameObjectKind::FishingNode);
        let loot = LootContainer::for_game_object(P1, &bobber, LootType::Fishing, &mut h.ctx()).unwrap();
        assert_eq!(loot.items()[0].item_id, FISH);
        assert_eq!(loot.client_loot_type(), ClientLootType::Fishing);
        assert_eq!(h.world.go_state[&HOLE], GameObjectLootState::Activated);

        let mut stranger = bobber.clone();
        stranger.owner = Some(P2);
        let err = LootContainer::for_game_object(P1, &stranger, LootType::Fishing, &mut h.ctx()).unwrap_err();
        assert!(matches!(err, LootError::Refused { code: LootErrorCode::TooFar, .. }));
    }

    #[test]
    fn fishing_hole_runs_dry() {
        let mut h = Harness::new(&[(
            LootStoreKind::Gameobject,
            r#"[{ "entry": 6, "item": 10, "chance": 100 }]"#,
        )]);
        let mut hole = fishing_spot(GameObjectKind::FishingHole {
            min_success_opens: 2,
            max_success_opens: 2,
        });
        hole.loot_id = 6;

        let mut loot = LootContainer::for_game_object(P1, &hole, LootType::FishingHole, &mut h.ctx()).unwrap();
        loot.show_content_to(P1, &mut h.ctx()).unwrap();
        loot.request_item(P1, 0, &mut h.ctx()).unwrap();
        loot.release(P1, &mut h.ctx());
        assert!(loot.is_awaiting_refill());
        assert_eq!(h.world.go_state[&HOLE], GameObjectLootState::Ready);

        loot.refill_fishing_hole(P1, &mut h.ctx());
        loot.show_content_to(P1, &mut h.ctx()).unwrap();
        loot.request_item(P1, 0, &mut h.ctx()).unwrap();
        loot.release(P1, &mut h.ctx());
        assert!(loot.is_expired());
        assert_eq!(h.world.go_state[&HOLE], GameObjectLootState::JustDeactivated);
        assert_eq!(h.world.bag(P1), &[(FISH, 1), (FISH, 1)]);
    }

    #[test]
    fn saved_items_belong_to_every_owner() {
        let mut h = Harness::new(&[]);
        let item = ItemTarget {
            guid: ObjectGuid::item(8),
            entry: 77,
            count: 1,
        };
        h.world.give_item(P1, item.guid);
        let mut loot = LootContainer::for_item(P1, &item, LootType::Item, &mut h.ctx()).unwrap();
        assert!(loot.items().is_empty());

        assert!(loot.add_saved_item(LEATHER, 3, 0, 0, &h.stores.catalog));
        loot.set_gold(25);
        assert_eq!(loot.have_item_for(P1, &h.world, &h.config).len(), 1);
        assert_eq!(h.world.item_state[&item.guid], ItemLootState::Changed);

        loot.show_content_to(P1, &mut h.ctx()).unwrap();
        loot.send_gold(P1, &mut h.ctx()).unwrap();
        assert_eq!(h.world.money(P1), 25);
        loot.request_item(P1, 0, &mut h.ctx()).unwrap();
        loot.release(P1, &mut h.ctx());
        assert_eq!(h.world.item_state[&item.guid], ItemLootState::Removed);
        assert_eq!(h.world.destroyed, vec![(P1, item.guid, None)]);
    }
}
