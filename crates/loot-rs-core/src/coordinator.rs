//! Entry point for the host: creates containers for loot triggers, routes
//! player requests to them and ticks running rolls.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use loot_rs_table::LootStores;

use crate::config::LootConfig;
use crate::container::{LootContainer, LootContext};
use crate::defines::{LootErrorCode, LootType, RollVote, Skill};
use crate::error::LootError;
use crate::event::{LootEvent, LootOutbox};
use crate::guid::{HighGuid, ObjectGuid};
use crate::target::{CorpseTarget, CreatureTarget, GameObjectKind, GameObjectTarget, ItemTarget, MailTarget};
use crate::world::LootWorld;

pub struct LootCoordinator {
    containers: HashMap<ObjectGuid, LootContainer>,
    stores: LootStores,
    config: LootConfig,
    rng: StdRng,
    outbox: LootOutbox,
}

impl LootCoordinator {
    pub fn new(stores: LootStores, config: LootConfig) -> Self {
        Self::with_rng(stores, config, StdRng::from_entropy())
    }

    /// Deterministic rolls, for replays and tests.
    pub fn with_seed(stores: LootStores, config: LootConfig, seed: u64) -> Self {
        Self::with_rng(stores, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(stores: LootStores, config: LootConfig, rng: StdRng) -> Self {
        Self {
            containers: HashMap::new(),
            stores,
            config,
            rng,
            outbox: LootOutbox::new(),
        }
    }

    pub fn stores(&self) -> &LootStores {
        &self.stores
    }

    pub fn config(&self) -> &LootConfig {
        &self.config
    }

    pub fn container(&self, target: ObjectGuid) -> Option<&LootContainer> {
        self.containers.get(&target)
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Take the messages produced since the last call.
    pub fn drain_events(&mut self) -> Vec<LootEvent> {
        self.outbox.drain()
    }

    fn split<'a>(
        &'a mut self,
        world: &'a mut dyn LootWorld,
    ) -> (&'a mut HashMap<ObjectGuid, LootContainer>, LootContext<'a>) {
        let Self {
            containers,
            stores,
            config,
            rng,
            outbox,
        } = self;
        let ctx = LootContext {
            world,
            stores,
            config,
            rng,
            out: outbox,
        };
        (containers, ctx)
    }

    /// Put `container` on its target, tearing down whatever was there.
    fn replace(&mut self, world: &mut dyn LootWorld, container: LootContainer) -> ObjectGuid {
        let guid = container.target_guid();
        if let Some(mut old) = self.containers.insert(guid, container) {
            old.shutdown(world, &mut self.outbox);
        }
        guid
    }

    fn show(&mut self, world: &mut dyn LootWorld, player: ObjectGuid, target: ObjectGuid) -> Result<(), LootError> {
        let (containers, mut ctx) = self.split(world);
        let container = containers.get_mut(&target).ok_or(LootError::NotFound {
            player,
            target: Some(target),
        })?;
        container.show_content_to(player, &mut ctx)
    }

    // -----------------------------------------------------------------------
    // Triggers
    // -----------------------------------------------------------------------

    /// Corpse loot for a kill. The window opens on a later request.
    pub fn create_loot_for_kill(
        &mut self,
        world: &mut dyn LootWorld,
        killer: ObjectGuid,
        creature: &CreatureTarget,
    ) -> ObjectGuid {
        let (_, mut ctx) = self.split(world);
        let container = LootContainer::for_kill(killer, creature, &mut ctx);
        debug!(
            "corpse loot for {}: {} items, {} gold",
            creature.guid,
            container.items().len(),
            container.gold()
        );
        self.replace(world, container)
    }

    pub fn pickpocket(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        creature: &CreatureTarget,
    ) -> Result<(), LootError> {
        if let Some(existing) = self.containers.get(&creature.guid) {
            if existing.loot_type() == LootType::Pickpocketing {
                if existing.is_expired() {
                    return Err(LootError::Refused {
                        player,
                        target: creature.guid,
                        code: LootErrorCode::AlreadyPickpocketed,
                    });
                }
                return self.show(world, player, creature.guid);
            }
        }

        let (_, mut ctx) = self.split(world);
        let container = LootContainer::for_pickpocket(player, creature, &mut ctx);
        let guid = self.replace(world, container);
        self.show(world, player, guid)
    }

    pub fn skin(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        creature: &CreatureTarget,
    ) -> Result<(), LootError> {
        let reusable = self
            .containers
            .get(&creature.guid)
            .is_some_and(|c| c.loot_type() == LootType::Skinning && !c.is_expired());
        if !reusable {
            let (_, mut ctx) = self.split(world);
            let container = LootContainer::for_skinning(player, creature, &mut ctx);
            self.replace(world, container);
        }
        self.show(world, player, creature.guid)
    }

    /// Open a chest, vein, door or fishing hole.
    pub fn open_game_object(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        go: &GameObjectTarget,
    ) -> Result<(), LootError> {
        let loot_type = match go.kind {
            GameObjectKind::FishingHole { .. } => LootType::FishingHole,
            _ => LootType::Corpse,
        };

        let existing = self
            .containers
            .get(&go.guid)
            .map(|c| (c.is_awaiting_refill(), c.is_expired()));
        match existing {
            Some((true, _)) => {
                let (containers, mut ctx) = self.split(world);
                if let Some(container) = containers.get_mut(&go.guid) {
                    container.refill_fishing_hole(player, &mut ctx);
                }
            }
            Some((false, false)) => {}
            _ => {
                let (_, mut ctx) = self.split(world);
                let container = LootContainer::for_game_object(player, go, loot_type, &mut ctx)?;
                self.replace(world, container);
            }
        }
        self.show(world, player, go.guid)
    }

    /// Loot a bobber after a cast.
    pub fn fish(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        bobber: &GameObjectTarget,
        caught: bool,
    ) -> Result<(), LootError> {
        let loot_type = if caught {
            LootType::Fishing
        } else {
            LootType::FishingFail
        };
        let (_, mut ctx) = self.split(world);
        let container = LootContainer::for_game_object(player, bobber, loot_type, &mut ctx)?;
        let guid = self.replace(world, container);
        self.show(world, player, guid)
    }

    pub fn loot_insignia(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        corpse: &CorpseTarget,
    ) -> Result<(), LootError> {
        if !self.containers.get(&corpse.guid).is_some_and(|c| !c.is_expired()) {
            let (_, mut ctx) = self.split(world);
            let container = LootContainer::for_insignia(player, corpse, &mut ctx)?;
            self.replace(world, container);
        }
        self.show(world, player, corpse.guid)
    }

    /// Open a container item (clam, lockbox). Its loot stays with the item
    /// until emptied.
    pub fn open_item(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        item: &ItemTarget,
    ) -> Result<(), LootError> {
        self.loot_item(world, player, item, LootType::Item)
    }

    pub fn disenchant(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        item: &ItemTarget,
    ) -> Result<(), LootError> {
        let proto = self.stores.catalog.get(item.entry).ok_or(LootError::NotReady { target: item.guid })?;
        if proto.disenchant_id == 0 {
            return Err(LootError::NotReady { target: item.guid });
        }
        if world.skill_value(player, Skill::Enchanting) < proto.required_disenchant_skill {
            return Err(LootError::NotPermitted {
                player,
                target: item.guid,
            });
        }
        self.loot_item(world, player, item, LootType::Disenchanting)
    }

    pub fn prospect(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        item: &ItemTarget,
    ) -> Result<(), LootError> {
        self.loot_item(world, player, item, LootType::Prospecting)
    }

    fn loot_item(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        item: &ItemTarget,
        loot_type: LootType,
    ) -> Result<(), LootError> {
        let reusable = self
            .containers
            .get(&item.guid)
            .is_some_and(|c| c.loot_type() == loot_type && !c.is_expired());
        if !reusable {
            let (_, mut ctx) = self.split(world);
            let container = LootContainer::for_item(player, item, loot_type, &mut ctx)?;
            self.replace(world, container);
        }
        self.show(world, player, item.guid)
    }

    pub fn open_mail(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        mail: MailTarget,
    ) -> Result<(), LootError> {
        let guid = ObjectGuid::mail(mail.mail_id);
        if !self.containers.get(&guid).is_some_and(|c| !c.is_expired()) {
            let (_, mut ctx) = self.split(world);
            let container = LootContainer::for_mail(player, mail, &mut ctx);
            self.replace(world, container);
        }
        self.show(world, player, guid)
    }

    // -----------------------------------------------------------------------
    // Player actions
    // -----------------------------------------------------------------------

    fn tracked_target(&self, player: ObjectGuid) -> Option<ObjectGuid> {
        self.containers
            .iter()
            .find(|(_, container)| container.is_looting(player))
            .map(|(&guid, _)| guid)
    }

    /// Locate the container a request is about: the named target, else
    /// the one the player has open, else their selection.
    pub fn find_container(
        &self,
        world: &dyn LootWorld,
        player: ObjectGuid,
        target: Option<ObjectGuid>,
    ) -> Result<ObjectGuid, LootError> {
        let guid = target
            .or_else(|| self.tracked_target(player))
            .or_else(|| world.selection(player))
            .ok_or(LootError::NotFound {
                player,
                target: None,
            })?;

        let lootable = match guid.high() {
            HighGuid::Unit | HighGuid::GameObject | HighGuid::Corpse | HighGuid::Item | HighGuid::Mail => {
                self.containers.contains_key(&guid)
            }
            HighGuid::Player => false,
        };
        if lootable {
            Ok(guid)
        } else {
            Err(LootError::NotFound {
                player,
                target: Some(guid),
            })
        }
    }

    /// Open the window on an existing container (corpses mostly).
    pub fn open_loot_window(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        target: Option<ObjectGuid>,
    ) -> Result<(), LootError> {
        let guid = self.find_container(&*world, player, target)?;
        self.show(world, player, guid)
    }

    pub fn request_item(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        target: Option<ObjectGuid>,
        slot: u8,
    ) -> Result<(), LootError> {
        let guid = self.find_container(&*world, player, target)?;
        let (containers, mut ctx) = self.split(world);
        match containers.get_mut(&guid) {
            Some(container) => container.request_item(player, slot, &mut ctx),
            None => Err(LootError::NotFound {
                player,
                target: Some(guid),
            }),
        }
    }

    pub fn request_gold(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        target: Option<ObjectGuid>,
    ) -> Result<(), LootError> {
        let guid = self.find_container(&*world, player, target)?;
        let (containers, mut ctx) = self.split(world);
        match containers.get_mut(&guid) {
            Some(container) => container.send_gold(player, &mut ctx),
            None => Err(LootError::NotFound {
                player,
                target: Some(guid),
            }),
        }
    }

    /// A roll vote. Stale or invalid votes are logged and dropped.
    pub fn vote(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        target: ObjectGuid,
        slot: u8,
        vote: RollVote,
    ) {
        let (containers, mut ctx) = self.split(world);
        let Some(container) = containers.get_mut(&target) else {
            warn!("{} voted on {} which has no loot", player, target);
            return;
        };
        if let Err(e) = container.vote(player, slot, vote, &mut ctx) {
            warn!("ignored vote: {e}");
        }
    }

    pub fn release_window(
        &mut self,
        world: &mut dyn LootWorld,
        player: ObjectGuid,
        target: Option<ObjectGuid>,
    ) -> Result<(), LootError> {
        let guid = self.find_container(&*world, player, target)?;
        let (containers, mut ctx) = self.split(world);
        if let Some(container) = containers.get_mut(&guid) {
            container.release(player, &mut ctx);
        }
        Ok(())
    }

    pub fn assign_master_loot(
        &mut self,
        world: &mut dyn LootWorld,
        master: ObjectGuid,
        target: Option<ObjectGuid>,
        slot: u8,
        recipient: ObjectGuid,
    ) -> Result<(), LootError> {
        let guid = self.find_container(&*world, master, target)?;
        let (containers, mut ctx) = self.split(world);
        match containers.get_mut(&guid) {
            Some(container) => container.assign_master_loot(master, slot, recipient, &mut ctx),
            None => Err(LootError::NotFound {
                player: master,
                target: Some(guid),
            }),
        }
    }

    /// Close every window the player has open (logout, teleport).
    pub fn release_all_for(&mut self, world: &mut dyn LootWorld, player: ObjectGuid) {
        let (containers, mut ctx) = self.split(world);
        for container in containers.values_mut() {
            if container.is_looting(player) {
                container.release(player, &mut ctx);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Advance rolls and drop containers whose target is done with.
    pub fn update(&mut self, world: &mut dyn LootWorld, diff_ms: u32) {
        let (containers, mut ctx) = self.split(world);
        for container in containers.values_mut() {
            container.update(diff_ms, &mut ctx);
        }
        containers.retain(|guid, container| {
            let keep = !container.is_expired() || !container.players_looting().is_empty();
            if !keep {
                debug!("dropping finished loot of {}", guid);
            }
            keep
        });
    }

    /// The target despawned: cancel rolls, close windows and forget it.
    pub fn remove_container(&mut self, world: &mut dyn LootWorld, target: ObjectGuid) -> bool {
        match self.containers.remove(&target) {
            Some(mut container) => {
                container.shutdown(&*world, &mut self.outbox);
                true
            }
            None => false,
        }
    }

    pub fn shutdown(&mut self, world: &mut dyn LootWorld) {
        let count = self.containers.len();
        for (_, mut container) in self.containers.drain() {
            container.shutdown(&*world, &mut self.outbox);
        }
        info!("Loot coordinator stopped ({} containers closed)", count);
    }
}
