//! Timed need/greed vote on one contested item.

use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, RngCore};
use tracing::{debug, warn};

use crate::defines::{RollVote, RollVoteMask, ROLL_HIDDEN};
use crate::error::LootError;
use crate::event::{LootEvent, LootOutbox};
use crate::guid::ObjectGuid;
use crate::item::{LootItem, LootItemType};
use crate::world::LootWorld;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollPhase {
    Idle,
    Started,
    Resolved,
}

/// One owner's entry in the vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerRoll {
    pub vote: RollVote,
    /// 1..=100 for need, greed and disenchant; 0 otherwise.
    pub number: u8,
    pub mask: RollVoteMask,
}

impl PlayerRoll {
    pub fn new(vote: RollVote) -> Self {
        Self {
            vote,
            number: 0,
            mask: RollVoteMask::ALL,
        }
    }

    pub fn voted(vote: RollVote, number: u8) -> Self {
        Self {
            vote,
            number,
            mask: RollVoteMask::ALL,
        }
    }
}

/// How a finished roll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollOutcome {
    Winner {
        player: ObjectGuid,
        number: u8,
        vote: RollVote,
    },
    AllPassed,
}

/// Parameters fixed when a roll starts.
#[derive(Debug, Clone, Copy)]
pub struct RollStart {
    /// Need is withheld from players that cannot use the item.
    pub need_before_greed: bool,
    /// Best enchanting skill among the owners.
    pub max_enchant_skill: u32,
    pub timeout_ms: u32,
}

#[derive(Debug)]
pub struct GroupRollSession {
    target: ObjectGuid,
    slot: u8,
    item_id: u32,
    random_suffix: u32,
    random_property_id: i32,
    votes: BTreeMap<ObjectGuid, PlayerRoll>,
    remaining_ms: u32,
    phase: RollPhase,
}

impl GroupRollSession {
    pub fn new(target: ObjectGuid, item: &LootItem) -> Self {
        Self {
            target,
            slot: item.slot,
            item_id: item.item_id,
            random_suffix: item.random_suffix,
            random_property_id: item.random_property_id,
            votes: BTreeMap::new(),
            remaining_ms: 0,
            phase: RollPhase::Idle,
        }
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn phase(&self) -> RollPhase {
        self.phase
    }

    pub fn is_started(&self) -> bool {
        self.phase == RollPhase::Started
    }

    pub fn remaining_ms(&self) -> u32 {
        self.remaining_ms
    }

    pub fn votes(&self) -> &BTreeMap<ObjectGuid, PlayerRoll> {
        &self.votes
    }

    /// Start the vote. Fails for quest items and when fewer than two owners
    /// can take the item; the item is then handed out like an
    /// under-threshold one.
    pub fn try_start(
        &mut self,
        item: &mut LootItem,
        owners: &BTreeSet<ObjectGuid>,
        start: RollStart,
        world: &dyn LootWorld,
        out: &mut LootOutbox,
    ) -> bool {
        if self.phase != RollPhase::Idle {
            return false;
        }
        if item.kind == LootItemType::Quest {
            return false;
        }

        item.is_blocked = true;

        let mut mask = RollVoteMask::ALL;
        let can_disenchant = item.proto.as_ref().is_some_and(|p| {
            p.disenchant_id != 0 && start.max_enchant_skill >= p.required_disenchant_skill
        });
        if !can_disenchant {
            mask = mask.without(RollVoteMask::DISENCHANT);
        }

        let mut voters = 0;
        for &owner in owners {
            if !world.is_online(owner) || !item.is_allowed(owner) {
                self.votes.insert(owner, PlayerRoll::new(RollVote::NotValid));
                continue;
            }
            let mut roll = PlayerRoll::new(RollVote::NotEmittedYet);
            roll.mask = mask;
            if start.need_before_greed {
                let usable = item
                    .proto
                    .as_ref()
                    .is_some_and(|proto| world.can_use_item(owner, proto));
                if !usable {
                    roll.mask = roll.mask.without(RollVoteMask::NEED);
                }
            }
            self.votes.insert(owner, roll);
            voters += 1;
        }

        if voters < 2 {
            item.is_under_threshold = true;
            item.is_blocked = false;
            self.votes.clear();
            return false;
        }

        self.remaining_ms = start.timeout_ms;
        self.phase = RollPhase::Started;
        debug!(
            "roll started on {} slot {} (item {}) with {} voters",
            self.target, self.slot, self.item_id, voters
        );

        for (&player, roll) in &self.votes {
            if roll.vote == RollVote::NotValid || !world.is_online(player) {
                continue;
            }
            out.push(LootEvent::StartRoll {
                to: player,
                target: self.target,
                slot: self.slot,
                item_id: self.item_id,
                random_suffix: self.random_suffix,
                random_property_id: self.random_property_id,
                countdown_ms: start.timeout_ms,
                vote_mask: roll.mask,
            });
        }
        true
    }

    /// Record a vote. Each voter votes once; the roll number is drawn here
    /// but only revealed when the roll ends.
    pub fn player_vote(
        &mut self,
        player: ObjectGuid,
        vote: RollVote,
        rng: &mut dyn RngCore,
        world: &dyn LootWorld,
        out: &mut LootOutbox,
    ) -> Result<(), LootError> {
        let slot = self.slot;
        if !self.is_started() {
            return Err(LootError::RollNotFound {
                target: self.target,
                slot,
            });
        }
        let Some(entry) = self.votes.get_mut(&player) else {
            return Err(LootError::NotAVoter { player, slot });
        };
        match entry.vote {
            RollVote::NotEmittedYet => {}
            RollVote::NotValid => return Err(LootError::NotAVoter { player, slot }),
            _ => return Err(LootError::AlreadyVoted { player, slot }),
        }
        if !entry.mask.contains(vote.mask_bit()) {
            return Err(LootError::VoteNotAllowed {
                player,
                vote: vote as u8,
            });
        }

        entry.vote = vote;
        if vote != RollVote::Pass {
            entry.number = rng.gen_range(1..=100);
        }
        debug!("{} voted {:?} on {} slot {}", player, vote, self.target, slot);

        let (number, kind) = match vote {
            RollVote::Pass => (ROLL_HIDDEN, ROLL_HIDDEN),
            RollVote::Need => (0, 0),
            RollVote::Greed => (ROLL_HIDDEN, RollVote::Greed as u8),
            _ => (ROLL_HIDDEN, RollVote::Disenchant as u8),
        };
        self.broadcast_roll(player, number, kind, world, out);
        Ok(())
    }

    /// Advance the countdown. Returns the outcome once everyone voted or
    /// time ran out.
    pub fn update(
        &mut self,
        diff_ms: u32,
        world: &dyn LootWorld,
        out: &mut LootOutbox,
    ) -> Option<RollOutcome> {
        if !self.is_started() {
            return None;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(diff_ms);

        let (all_voted, winner) = select_winner(&self.votes);
        if all_voted || self.remaining_ms == 0 {
            return Some(self.finish(winner, world, out));
        }
        None
    }

    fn finish(
        &mut self,
        winner: Option<(ObjectGuid, PlayerRoll)>,
        world: &dyn LootWorld,
        out: &mut LootOutbox,
    ) -> RollOutcome {
        self.phase = RollPhase::Resolved;
        match winner {
            None => {
                debug!("everyone passed on {} slot {}", self.target, self.slot);
                self.broadcast_all_passed(world, out);
                RollOutcome::AllPassed
            }
            Some((player, roll)) => {
                debug!(
                    "{} won {} slot {} with {:?} {}",
                    player, self.target, self.slot, roll.vote, roll.number
                );
                let reveals: Vec<(ObjectGuid, u8, u8)> = self
                    .votes
                    .iter()
                    .filter_map(|(&voter, r)| match r.vote {
                        RollVote::Pass => None,
                        RollVote::NotEmittedYet | RollVote::NotValid => {
                            Some((voter, ROLL_HIDDEN, ROLL_HIDDEN))
                        }
                        vote => Some((voter, r.number, vote as u8)),
                    })
                    .collect();
                for (voter, number, kind) in reveals {
                    self.broadcast_roll(voter, number, kind, world, out);
                }
                for recipient in self.recipients(world) {
                    out.push(LootEvent::RollWon {
                        to: recipient,
                        target: self.target,
                        slot: self.slot,
                        item_id: self.item_id,
                        winner: player,
                        roll_number: roll.number,
                        vote: roll.vote,
                    });
                }
                RollOutcome::Winner {
                    player,
                    number: roll.number,
                    vote: roll.vote,
                }
            }
        }
    }

    /// Abort a running roll, telling everyone it was passed.
    pub fn cancel(&mut self, world: &dyn LootWorld, out: &mut LootOutbox) {
        if self.is_started() {
            self.broadcast_all_passed(world, out);
            self.phase = RollPhase::Resolved;
        }
    }

    fn recipients(&self, world: &dyn LootWorld) -> Vec<ObjectGuid> {
        self.votes
            .iter()
            .filter(|(&player, roll)| roll.vote != RollVote::NotValid && world.is_online(player))
            .map(|(&player, _)| player)
            .collect()
    }

    fn broadcast_roll(
        &self,
        roller: ObjectGuid,
        roll_number: u8,
        roll_type: u8,
        world: &dyn LootWorld,
        out: &mut LootOutbox,
    ) {
        for recipient in self.recipients(world) {
            out.push(LootEvent::Roll {
                to: recipient,
                target: self.target,
                slot: self.slot,
                roller,
                item_id: self.item_id,
                roll_number,
                roll_type,
            });
        }
    }

    fn broadcast_all_passed(&self, world: &dyn LootWorld, out: &mut LootOutbox) {
        for recipient in self.recipients(world) {
            out.push(LootEvent::AllPassed {
                to: recipient,
                target: self.target,
                slot: self.slot,
                item_id: self.item_id,
            });
        }
    }
}

impl Drop for GroupRollSession {
    fn drop(&mut self) {
        if self.is_started() {
            warn!(
                "roll on {} slot {} dropped while running; containers cancel rolls before removal",
                self.target, self.slot
            );
        }
    }
}

/// Whether every voter has voted, and the current best roll.
///
/// Need beats greed and disenchant; within a class the highest number wins
/// and the first voter keeps a tie.
pub fn select_winner(
    votes: &BTreeMap<ObjectGuid, PlayerRoll>,
) -> (bool, Option<(ObjectGuid, PlayerRoll)>) {
    let mut not_voted = 0;
    let mut someone_needs = false;
    let mut winner: Option<(ObjectGuid, PlayerRoll)> = None;

    for (&player, &roll) in votes {
        match roll.vote {
            RollVote::Need => {
                let beats = match winner {
                    Some((_, best)) => !someone_needs || roll.number > best.number,
                    None => true,
                };
                if beats {
                    someone_needs = true;
                    winner = Some((player, roll));
                }
            }
            RollVote::Greed | RollVote::Disenchant => {
                if someone_needs {
                    continue;
                }
                let beats = winner.map(|(_, best)| roll.number > best.number).unwrap_or(true);
                if beats {
                    winner = Some((player, roll));
                }
            }
            RollVote::NotEmittedYet => not_voted += 1,
            RollVote::Pass | RollVote::NotValid => {}
        }
    }

    (not_voted == 0, winner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWorld;
    use loot_rs_table::{ItemPrototype, ItemQuality};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TARGET: ObjectGuid = ObjectGuid::unit(100);

    fn players(n: u32) -> Vec<ObjectGuid> {
        (1..=n).map(ObjectGuid::player).collect()
    }

    fn world_with(players: &[ObjectGuid]) -> MockWorld {
        let mut world = MockWorld::new();
        for &p in players {
            world.add_player(p, 60);
        }
        world
    }

    fn rare_item(owners: &[ObjectGuid]) -> LootItem {
        let proto = ItemPrototype::new(900, ItemQuality::Rare);
        let mut item = LootItem::saved(900, 1, 2, Some(&proto), (0, 0));
        item.allowed.extend(owners.iter().copied());
        item
    }

    fn start() -> RollStart {
        RollStart {
            need_before_greed: false,
            max_enchant_skill: 0,
            timeout_ms: 60_000,
        }
    }

    fn started(owners: &[ObjectGuid], world: &MockWorld) -> (GroupRollSession, LootItem) {
        let mut item = rare_item(owners);
        let mut session = GroupRollSession::new(TARGET, &item);
        let set: BTreeSet<ObjectGuid> = owners.iter().copied().collect();
        let mut out = LootOutbox::new();
        assert!(session.try_start(&mut item, &set, start(), world, &mut out));
        (session, item)
    }

    #[test]
    fn need_beats_greed() {
        let [a, b, c] = [ObjectGuid::player(1), ObjectGuid::player(2), ObjectGuid::player(3)];
        let mut votes = BTreeMap::new();
        votes.insert(a, PlayerRoll::voted(RollVote::Greed, 99));
        votes.insert(b, PlayerRoll::voted(RollVote::Need, 12));
        votes.insert(c, PlayerRoll::voted(RollVote::Need, 40));
        let (all_voted, winner) = select_winner(&votes);
        assert!(all_voted);
        assert_eq!(winner.map(|(p, r)| (p, r.number)), Some((c, 40)));
    }

    #[test]
    fn greed_and_disenchant_compete() {
        let [a, b, c] = [ObjectGuid::player(1), ObjectGuid::player(2), ObjectGuid::player(3)];
        let mut votes = BTreeMap::new();
        votes.insert(a, PlayerRoll::voted(RollVote::Greed, 30));
        votes.insert(b, PlayerRoll::voted(RollVote::Disenchant, 70));
        votes.insert(c, PlayerRoll::new(RollVote::NotEmittedYet));
        let (all_voted, winner) = select_winner(&votes);
        assert!(!all_voted);
        assert_eq!(winner.map(|(p, _)| p), Some(b));
    }

    #[test]
    fn passes_never_win() {
        let mut votes = BTreeMap::new();
        votes.insert(ObjectGuid::player(1), PlayerRoll::new(RollVote::Pass));
        votes.insert(ObjectGuid::player(2), PlayerRoll::new(RollVote::NotValid));
        assert_eq!(select_winner(&votes), (true, None));
    }

    #[test]
    fn single_voter_does_not_start() {
        let owners = players(2);
        let world = world_with(&owners);
        let mut item = rare_item(&owners[..1]);
        let mut session = GroupRollSession::new(TARGET, &item);
        let set: BTreeSet<ObjectGuid> = owners.iter().copied().collect();
        let mut out = LootOutbox::new();

        assert!(!session.try_start(&mut item, &set, start(), &world, &mut out));
        assert!(item.is_under_threshold);
        assert!(!item.is_blocked);
        assert!(out.is_empty());
        assert_eq!(session.phase(), RollPhase::Idle);
    }

    #[test]
    fn quest_items_are_never_rolled() {
        let owners = players(3);
        let world = world_with(&owners);
        let mut item = rare_item(&owners);
        item.kind = LootItemType::Quest;
        let mut session = GroupRollSession::new(TARGET, &item);
        let set: BTreeSet<ObjectGuid> = owners.iter().copied().collect();
        let mut out = LootOutbox::new();
        assert!(!session.try_start(&mut item, &set, start(), &world, &mut out));
        assert!(!item.is_blocked);
    }

    #[test]
    fn start_broadcasts_masks() {
        let owners = players(3);
        let mut world = world_with(&owners);
        world.set_cannot_use(owners[2], 900);
        let mut item = rare_item(&owners);
        let mut session = GroupRollSession::new(TARGET, &item);
        let set: BTreeSet<ObjectGuid> = owners.iter().copied().collect();
        let mut out = LootOutbox::new();
        let nbg = RollStart {
            need_before_greed: true,
            ..start()
        };

        assert!(session.try_start(&mut item, &set, nbg, &world, &mut out));
        assert!(item.is_blocked);
        let masks: Vec<(ObjectGuid, RollVoteMask)> = out
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                LootEvent::StartRoll { to, vote_mask, countdown_ms, .. } => {
                    assert_eq!(countdown_ms, 60_000);
                    Some((to, vote_mask))
                }
                _ => None,
            })
            .collect();
        assert_eq!(masks.len(), 3);
        // no disenchanter in the group
        assert_eq!(masks[0].1, RollVoteMask(0x07));
        assert_eq!(masks[2].1, RollVoteMask(0x05));
    }

    #[test]
    fn disenchant_offered_with_enough_skill() {
        let owners = players(2);
        let world = world_with(&owners);
        let mut proto = ItemPrototype::new(901, ItemQuality::Rare);
        proto.disenchant_id = 40;
        proto.required_disenchant_skill = 150;
        let mut item = LootItem::saved(901, 1, 0, Some(&proto), (0, 0));
        item.allowed.extend(owners.iter().copied());
        let mut session = GroupRollSession::new(TARGET, &item);
        let set: BTreeSet<ObjectGuid> = owners.iter().copied().collect();
        let mut out = LootOutbox::new();
        let skilled = RollStart {
            max_enchant_skill: 150,
            ..start()
        };
        assert!(session.try_start(&mut item, &set, skilled, &world, &mut out));
        assert!(session.votes().values().all(|r| r.mask == RollVoteMask::ALL));
    }

    #[test]
    fn votes_are_checked() {
        let owners = players(3);
        let mut world = world_with(&owners);
        world.set_cannot_use(owners[1], 900);
        let mut item = rare_item(&owners);
        let mut session = GroupRollSession::new(TARGET, &item);
        let set: BTreeSet<ObjectGuid> = owners.iter().copied().collect();
        let mut out = LootOutbox::new();
        let nbg = RollStart {
            need_before_greed: true,
            ..start()
        };
        assert!(session.try_start(&mut item, &set, nbg, &world, &mut out));
        let mut rng = StdRng::seed_from_u64(5);

        let stranger = ObjectGuid::player(9);
        assert!(matches!(
            session.player_vote(stranger, RollVote::Need, &mut rng, &world, &mut out),
            Err(LootError::NotAVoter { .. })
        ));
        assert!(matches!(
            session.player_vote(owners[1], RollVote::Need, &mut rng, &world, &mut out),
            Err(LootError::VoteNotAllowed { .. })
        ));
        session
            .player_vote(owners[0], RollVote::Need, &mut rng, &world, &mut out)
            .unwrap();
        assert!(matches!(
            session.player_vote(owners[0], RollVote::Greed, &mut rng, &world, &mut out),
            Err(LootError::AlreadyVoted { .. })
        ));
        let number = session.votes()[&owners[0]].number;
        assert!((1..=100).contains(&number));
    }

    #[test]
    fn need_vote_is_broadcast_hidden() {
        let owners = players(2);
        let world = world_with(&owners);
        let (mut session, _item) = started(&owners, &world);
        let mut out = LootOutbox::new();
        let mut rng = StdRng::seed_from_u64(1);

        session
            .player_vote(owners[0], RollVote::Need, &mut rng, &world, &mut out)
            .unwrap();
        session
            .player_vote(owners[1], RollVote::Pass, &mut rng, &world, &mut out)
            .unwrap();
        let shown: Vec<(ObjectGuid, u8, u8)> = out
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                LootEvent::Roll { to, roller, roll_number, roll_type, .. } if to == owners[0] => {
                    Some((roller, roll_number, roll_type))
                }
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec![(owners[0], 0, 0), (owners[1], 128, 128)]);
    }

    #[test]
    fn everyone_voted_resolves() {
        let owners = players(3);
        let world = world_with(&owners);
        let (mut session, _item) = started(&owners, &world);
        let mut out = LootOutbox::new();
        let mut rng = StdRng::seed_from_u64(11);

        session
            .player_vote(owners[0], RollVote::Greed, &mut rng, &world, &mut out)
            .unwrap();
        session
            .player_vote(owners[1], RollVote::Need, &mut rng, &world, &mut out)
            .unwrap();
        assert_eq!(session.update(10, &world, &mut out), None);
        session
            .player_vote(owners[2], RollVote::Pass, &mut rng, &world, &mut out)
            .unwrap();
        out.drain();

        let outcome = session.update(10, &world, &mut out);
        assert!(matches!(
            outcome,
            Some(RollOutcome::Winner { player, vote: RollVote::Need, .. }) if player == owners[1]
        ));
        assert_eq!(session.phase(), RollPhase::Resolved);
        let won = out
            .events()
            .iter()
            .filter(|e| matches!(e, LootEvent::RollWon { winner, .. } if *winner == owners[1]))
            .count();
        assert_eq!(won, 3);
        // greed and need revealed, pass silent
        let reveals = out
            .events()
            .iter()
            .filter(|e| matches!(e, LootEvent::Roll { to, .. } if *to == owners[2]))
            .count();
        assert_eq!(reveals, 2);
    }

    #[test]
    fn deadline_ends_the_roll() {
        let owners = players(2);
        let world = world_with(&owners);
        let (mut session, _item) = started(&owners, &world);
        let mut out = LootOutbox::new();

        assert_eq!(session.update(59_999, &world, &mut out), None);
        assert_eq!(session.remaining_ms(), 1);
        assert_eq!(session.update(50, &world, &mut out), Some(RollOutcome::AllPassed));
        assert_eq!(
            out.events()
                .iter()
                .filter(|e| matches!(e, LootEvent::AllPassed { .. }))
                .count(),
            2
        );
        assert_eq!(session.update(50, &world, &mut out), None);
    }

    #[test]
    fn deadline_with_partial_votes_picks_winner() {
        let owners = players(3);
        let world = world_with(&owners);
        let (mut session, _item) = started(&owners, &world);
        let mut out = LootOutbox::new();
        let mut rng = StdRng::seed_from_u64(3);
        session
            .player_vote(owners[2], RollVote::Greed, &mut rng, &world, &mut out)
            .unwrap();
        out.drain();

        let outcome = session.update(60_000, &world, &mut out);
        assert!(matches!(outcome, Some(RollOutcome::Winner { player, .. }) if player == owners[2]));
        // silent voters shown as 128/128
        assert!(out.events().iter().any(|e| matches!(
            e,
            LootEvent::Roll { roller, roll_number: 128, roll_type: 128, .. } if *roller == owners[0]
        )));
    }

    #[test]
    fn cancel_broadcasts_all_passed() {
        let owners = players(2);
        let world = world_with(&owners);
        let (mut session, _item) = started(&owners, &world);
        let mut out = LootOutbox::new();
        session.cancel(&world, &mut out);
        assert_eq!(out.len(), 2);
        assert!(!session.is_started());
        session.cancel(&world, &mut out);
        assert_eq!(out.len(), 2);
    }
}
