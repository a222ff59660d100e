//! Console commands that drive the sandbox world and the loot engine.

use std::str::FromStr;

use loot_rs_core::{
    CreatureTarget, GameObjectKind, HighGuid, LootCoordinator, LootError, LootMethod, MailTarget,
    ObjectGuid, RollVote, Skill,
};
use loot_rs_table::{check_drop_stats, ItemQuality, LootStoreKind};
use tracing::warn;

use crate::sandbox::Sandbox;

/// Result of a console command.
#[derive(Debug)]
pub struct CommandResult {
    pub success: bool,
    pub messages: Vec<String>,
    /// If true, the server should shut down.
    pub should_stop: bool,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            messages: vec![message.into()],
            should_stop: false,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
            should_stop: false,
        }
    }

    fn lines(messages: Vec<String>) -> Self {
        Self {
            success: true,
            messages,
            should_stop: false,
        }
    }
}

type CmdResult = Result<CommandResult, String>;

/// Usage line and description of every command, in `help` order.
const COMMANDS: &[(&str, &str)] = &[
    ("login <player> [level]", "Log a player in"),
    ("logout <player>", "Log a player out and close their windows"),
    ("skill <player> <enchanting|mining> <value>", "Set a profession skill"),
    ("quest <player> <item_id>", "Give the player a quest needing the item"),
    ("group <id> <method> <threshold> <player>...", "Form a group"),
    ("master <group> <player>", "Set the master looter"),
    ("select <player> <guid>", "Set the player's selection"),
    ("range <player> <guid>", "Toggle the player out of range of a target"),
    ("bagsize <player> <slots>", "Resize a player's bags"),
    ("spawn <loot_id> [level] [min_gold] [max_gold] [pickpocket_id] [skinning_id]", "Spawn a creature"),
    ("kill <player> <unit>", "Kill a creature and roll its corpse loot"),
    ("pickpocket <player> <unit>", "Pick a creature's pocket"),
    ("skin <player> <unit>", "Skin a looted creature"),
    ("chest <loot_id> [min_opens] [max_opens] [group]", "Spawn a chest or mining vein"),
    ("hole <loot_id> <min_opens> <max_opens>", "Spawn a fishing hole"),
    ("open <player> <go>", "Open a chest, vein or fishing hole"),
    ("fish <player> <zone> <area> [fail]", "Cast and loot a bobber"),
    ("bones <player> [insignia_loot_id]", "Leave bones of a dead player"),
    ("insignia <player> <corpse>", "Loot insignia from bones"),
    ("give <player> <item_id> [count]", "Put an item in a player's bags"),
    ("use <player> <item>", "Open a container item"),
    ("disenchant <player> <item>", "Disenchant an item"),
    ("prospect <player> <item>", "Prospect a stack of ore"),
    ("mail <player> <mail_id> <template_id>", "Open mail attachments"),
    ("loot <player> [target]", "Open the loot window"),
    ("take <player> <slot> [target]", "Take an item"),
    ("gold <player> [target]", "Take the gold"),
    ("roll <player> <target> <slot> <need|greed|disenchant|pass>", "Vote on a roll"),
    ("assign <master> <slot> <recipient> [target]", "Give an item as master looter"),
    ("release <player> [target]", "Close the loot window"),
    ("despawn <guid>", "Remove a target and its loot"),
    ("bag <player>", "Show a player's bags and money"),
    ("status [target]", "Show open loot"),
    ("stats <store> <loot_id> [iterations]", "Simulate drop rates"),
    ("help", "List available commands"),
    ("stop", "Stop the server"),
];

/// Parse and run one console line.
pub fn execute(line: &str, loot: &mut LootCoordinator, world: &mut Sandbox) -> CommandResult {
    let mut parts = line.split_whitespace();
    let Some(cmd_name) = parts.next() else {
        return CommandResult::err("Empty command");
    };
    let args: Vec<&str> = parts.collect();

    let name = cmd_name.to_ascii_lowercase();
    let result = match name.as_str() {
        "login" => cmd_login(&args, world),
        "logout" => cmd_logout(&args, loot, world),
        "skill" => cmd_skill(&args, world),
        "quest" => cmd_quest(&args, world),
        "group" => cmd_group(&args, world),
        "master" => cmd_master(&args, world),
        "select" => cmd_select(&args, world),
        "range" => cmd_range(&args, world),
        "bagsize" => cmd_bagsize(&args, world),
        "spawn" => cmd_spawn(&args, world),
        "kill" => cmd_kill(&args, loot, world),
        "pickpocket" => cmd_pickpocket(&args, loot, world),
        "skin" => cmd_skin(&args, loot, world),
        "chest" => cmd_chest(&args, world),
        "hole" => cmd_hole(&args, world),
        "open" => cmd_open(&args, loot, world),
        "fish" => cmd_fish(&args, loot, world),
        "bones" => cmd_bones(&args, world),
        "insignia" => cmd_insignia(&args, loot, world),
        "give" => cmd_give(&args, world),
        "use" | "disenchant" | "prospect" => cmd_use_item(&name, &args, loot, world),
        "mail" => cmd_mail(&args, loot, world),
        "loot" => cmd_loot(&args, loot, world),
        "take" => cmd_take(&args, loot, world),
        "gold" => cmd_gold(&args, loot, world),
        "roll" => cmd_roll(&args, loot, world),
        "assign" => cmd_assign(&args, loot, world),
        "release" => cmd_release(&args, loot, world),
        "despawn" => cmd_despawn(&args, loot, world),
        "bag" => cmd_bag(&args, world),
        "status" => cmd_status(&args, loot, world),
        "stats" => cmd_stats(&args, loot),
        "help" => Ok(cmd_help()),
        "stop" => Ok(CommandResult {
            success: true,
            messages: vec!["Stopping the server...".into()],
            should_stop: true,
        }),
        _ => Err(format!("Unknown command: {cmd_name}. Type 'help' for a list.")),
    };

    result.unwrap_or_else(CommandResult::err)
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

fn arg<'a>(args: &[&'a str], index: usize, usage: &str) -> Result<&'a str, String> {
    args.get(index).copied().ok_or_else(|| format!("Usage: {usage}"))
}

fn number<T: FromStr>(args: &[&str], index: usize, usage: &str) -> Result<T, String> {
    let text = arg(args, index, usage)?;
    text.parse()
        .map_err(|_| format!("'{text}' is not a number. Usage: {usage}"))
}

fn optional_number<T: FromStr>(args: &[&str], index: usize, default: T, usage: &str) -> Result<T, String> {
    match args.get(index) {
        Some(_) => number(args, index, usage),
        None => Ok(default),
    }
}

/// A player given as `3` or `player:3`.
fn player(args: &[&str], index: usize, usage: &str) -> Result<ObjectGuid, String> {
    let text = arg(args, index, usage)?;
    let guid = match text.parse::<u32>() {
        Ok(counter) => ObjectGuid::player(counter),
        Err(_) => ObjectGuid::parse(text).ok_or_else(|| format!("Bad player '{text}'"))?,
    };
    if guid.is_player() {
        Ok(guid)
    } else {
        Err(format!("{guid} is not a player"))
    }
}

fn guid(args: &[&str], index: usize, usage: &str) -> Result<ObjectGuid, String> {
    let text = arg(args, index, usage)?;
    ObjectGuid::parse(text).ok_or_else(|| format!("Bad guid '{text}' (expected kind:counter)"))
}

fn optional_guid(args: &[&str], index: usize, usage: &str) -> Result<Option<ObjectGuid>, String> {
    match args.get(index) {
        Some(_) => guid(args, index, usage).map(Some),
        None => Ok(None),
    }
}

fn known_player(world: &Sandbox, player: ObjectGuid) -> Result<(), String> {
    if world.players.contains_key(&player) {
        Ok(())
    } else {
        Err(format!("{player} never logged in"))
    }
}

/// Turn a refused loot action into a failed command.
fn loot_result(result: Result<(), LootError>, done: impl Into<String>) -> CmdResult {
    match result {
        Ok(()) => Ok(CommandResult::ok(done)),
        Err(e) => {
            warn!("{e}");
            Err(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Players and groups
// ---------------------------------------------------------------------------

fn cmd_login(args: &[&str], world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "login <player> [level]";
    let p = player(args, 0, USAGE)?;
    let level = optional_number(args, 1, 60, USAGE)?;
    world.login(p, level);
    Ok(CommandResult::ok(format!("{p} logged in at level {level}")))
}

fn cmd_logout(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    let p = player(args, 0, "logout <player>")?;
    loot.release_all_for(world, p);
    if world.logout(p) {
        Ok(CommandResult::ok(format!("{p} logged out")))
    } else {
        Err(format!("{p} never logged in"))
    }
}

fn cmd_skill(args: &[&str], world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "skill <player> <enchanting|mining> <value>";
    let p = player(args, 0, USAGE)?;
    let skill = match arg(args, 1, USAGE)?.to_ascii_lowercase().as_str() {
        "enchanting" => Skill::Enchanting,
        "mining" => Skill::Mining,
        other => return Err(format!("Unknown skill '{other}'")),
    };
    let value: u32 = number(args, 2, USAGE)?;
    let entry = world
        .player_mut(p)
        .ok_or_else(|| format!("{p} never logged in"))?;
    entry.skills.insert(skill, value);
    Ok(CommandResult::ok(format!("{p} {skill:?} = {value}")))
}

fn cmd_quest(args: &[&str], world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "quest <player> <item_id>";
    let p = player(args, 0, USAGE)?;
    let item_id: u32 = number(args, 1, USAGE)?;
    let entry = world
        .player_mut(p)
        .ok_or_else(|| format!("{p} never logged in"))?;
    entry.quest_items.insert(item_id);
    Ok(CommandResult::ok(format!("{p} now needs item {item_id}")))
}

fn cmd_group(args: &[&str], world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "group <id> <method> <threshold> <player>...";
    let id: u32 = number(args, 0, USAGE)?;
    let method_name = arg(args, 1, USAGE)?;
    let method = LootMethod::parse(method_name)
        .ok_or_else(|| format!("Unknown loot method '{method_name}'"))?;
    let threshold_name = arg(args, 2, USAGE)?;
    let threshold = ItemQuality::parse(threshold_name)
        .ok_or_else(|| format!("Unknown quality '{threshold_name}'"))?;

    let mut members = Vec::new();
    for index in 3..args.len() {
        let p = player(args, index, USAGE)?;
        known_player(world, p)?;
        if !members.contains(&p) {
            members.push(p);
        }
    }
    if members.len() < 2 {
        return Err("A group needs at least two players".into());
    }

    let count = members.len();
    world.form_group(id, members, method, threshold);
    Ok(CommandResult::ok(format!(
        "Group {id}: {count} members, {method:?}, threshold {threshold:?}"
    )))
}

fn cmd_master(args: &[&str], world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "master <group> <player>";
    let group_id: u32 = number(args, 0, USAGE)?;
    let p = player(args, 1, USAGE)?;
    if world.set_master_looter(group_id, p) {
        Ok(CommandResult::ok(format!("{p} is master looter of group {group_id}")))
    } else {
        Err(format!("{p} is not in group {group_id}"))
    }
}

fn cmd_select(args: &[&str], world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "select <player> <guid>";
    let p = player(args, 0, USAGE)?;
    let target = guid(args, 1, USAGE)?;
    let entry = world
        .player_mut(p)
        .ok_or_else(|| format!("{p} never logged in"))?;
    entry.selection = Some(target);
    Ok(CommandResult::ok(format!("{p} selected {target}")))
}

fn cmd_range(args: &[&str], world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "range <player> <guid>";
    let p = player(args, 0, USAGE)?;
    let target = guid(args, 1, USAGE)?;
    let far = world.toggle_range(p, target);
    let state = if far { "out of range of" } else { "near" };
    Ok(CommandResult::ok(format!("{p} is {state} {target}")))
}

fn cmd_bagsize(args: &[&str], world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "bagsize <player> <slots>";
    let p = player(args, 0, USAGE)?;
    let slots: usize = number(args, 1, USAGE)?;
    let entry = world
        .player_mut(p)
        .ok_or_else(|| format!("{p} never logged in"))?;
    entry.bag_slots = slots;
    Ok(CommandResult::ok(format!("{p} has {slots} bag slots")))
}

// ---------------------------------------------------------------------------
// Creatures
// ---------------------------------------------------------------------------

fn cmd_spawn(args: &[&str], world: &mut Sandbox) -> CmdResult {
    const USAGE: &str =
        "spawn <loot_id> [level] [min_gold] [max_gold] [pickpocket_id] [skinning_id]";
    let loot_id: u32 = number(args, 0, USAGE)?;
    let target = CreatureTarget {
        entry: loot_id,
        loot_id,
        level: optional_number(args, 1, 60, USAGE)?,
        min_gold: optional_number(args, 2, 0, USAGE)?,
        max_gold: optional_number(args, 3, 0, USAGE)?,
        pickpocket_loot_id: optional_number(args, 4, 0, USAGE)?,
        skinning_loot_id: optional_number(args, 5, 0, USAGE)?,
        ..CreatureTarget::default()
    };
    let guid = world.spawn_creature(target);
    Ok(CommandResult::ok(format!("Spawned {guid}")))
}

fn creature_for(world: &Sandbox, target: ObjectGuid) -> Result<CreatureTarget, String> {
    world
        .creature(target)
        .ok_or_else(|| format!("No creature {target}"))
}

fn cmd_kill(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "kill <player> <unit>";
    let killer = player(args, 0, USAGE)?;
    known_player(world, killer)?;
    let target = guid(args, 1, USAGE)?;
    let creature = world
        .kill(killer, target)
        .ok_or_else(|| format!("No creature {target}"))?;

    let guid = loot.create_loot_for_kill(world, killer, &creature);
    let (items, gold) = loot
        .container(guid)
        .map(|c| (c.items().len(), c.gold()))
        .unwrap_or_default();
    Ok(CommandResult::ok(format!(
        "{killer} killed {guid}: {items} item(s), {gold} copper"
    )))
}

fn cmd_pickpocket(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "pickpocket <player> <unit>";
    let p = player(args, 0, USAGE)?;
    let creature = creature_for(world, guid(args, 1, USAGE)?)?;
    loot_result(
        loot.pickpocket(world, p, &creature),
        format!("{p} picks {}'s pocket", creature.guid),
    )
}

fn cmd_skin(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "skin <player> <unit>";
    let p = player(args, 0, USAGE)?;
    let creature = creature_for(world, guid(args, 1, USAGE)?)?;
    loot_result(
        loot.skin(world, p, &creature),
        format!("{p} skins {}", creature.guid),
    )
}

// ---------------------------------------------------------------------------
// Game objects
// ---------------------------------------------------------------------------

fn cmd_chest(args: &[&str], world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "chest <loot_id> [min_opens] [max_opens] [group]";
    let loot_id: u32 = number(args, 0, USAGE)?;
    let kind = GameObjectKind::Chest {
        min_success_opens: optional_number(args, 1, 0, USAGE)?,
        max_success_opens: optional_number(args, 2, 0, USAGE)?,
        lock_skill: None,
        group_loot_rules: args.get(3).is_some_and(|a| a.eq_ignore_ascii_case("group")),
    };
    let what = if kind.is_vein() { "vein" } else { "chest" };
    let guid = world.spawn_object(loot_id, kind, loot_id, None, 0, 0);
    Ok(CommandResult::ok(format!("Spawned {what} {guid}")))
}

fn cmd_hole(args: &[&str], world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "hole <loot_id> <min_opens> <max_opens>";
    let loot_id: u32 = number(args, 0, USAGE)?;
    let kind = GameObjectKind::FishingHole {
        min_success_opens: number(args, 1, USAGE)?,
        max_success_opens: number(args, 2, USAGE)?,
    };
    let guid = world.spawn_object(loot_id, kind, loot_id, None, 0, 0);
    Ok(CommandResult::ok(format!("Spawned fishing hole {guid}")))
}

fn cmd_open(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "open <player> <go>";
    let p = player(args, 0, USAGE)?;
    let target = guid(args, 1, USAGE)?;
    let go = world
        .object(target)
        .ok_or_else(|| format!("No game object {target}"))?;
    loot_result(
        loot.open_game_object(world, p, &go),
        format!("{p} opens {target}"),
    )
}

fn cmd_fish(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "fish <player> <zone> <area> [fail]";
    let p = player(args, 0, USAGE)?;
    let zone: u32 = number(args, 1, USAGE)?;
    let area: u32 = number(args, 2, USAGE)?;
    let caught = !args.get(3).is_some_and(|a| a.eq_ignore_ascii_case("fail"));

    let bobber_guid = world.spawn_object(35591, GameObjectKind::FishingNode, 0, Some(p), zone, area);
    let bobber = world
        .object(bobber_guid)
        .ok_or_else(|| format!("No game object {bobber_guid}"))?;
    let result = loot.fish(world, p, &bobber, caught);
    if result.is_err() {
        world.despawn(bobber_guid);
    }
    loot_result(result, format!("{p} reels in {bobber_guid}"))
}

// ---------------------------------------------------------------------------
// Corpses, items and mail
// ---------------------------------------------------------------------------

fn cmd_bones(args: &[&str], world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "bones <player> [insignia_loot_id]";
    let owner = player(args, 0, USAGE)?;
    let insignia = match args.get(1) {
        Some(_) => Some(number(args, 1, USAGE)?),
        None => None,
    };
    let guid = world.spawn_bones(owner, insignia);
    Ok(CommandResult::ok(format!("Bones of {owner}: {guid}")))
}

fn cmd_insignia(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "insignia <player> <corpse>";
    let p = player(args, 0, USAGE)?;
    let target = guid(args, 1, USAGE)?;
    let corpse = world
        .corpse(target)
        .ok_or_else(|| format!("No corpse {target}"))?;
    loot_result(
        loot.loot_insignia(world, p, &corpse),
        format!("{p} loots {target}"),
    )
}

fn cmd_give(args: &[&str], world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "give <player> <item_id> [count]";
    let p = player(args, 0, USAGE)?;
    known_player(world, p)?;
    let entry: u32 = number(args, 1, USAGE)?;
    let count = optional_number(args, 2, 1, USAGE)?;
    let guid = world.give_item(p, entry, count);
    Ok(CommandResult::ok(format!("{p} holds {guid} ({count} x {entry})")))
}

fn cmd_use_item(
    cmd_name: &str,
    args: &[&str],
    loot: &mut LootCoordinator,
    world: &mut Sandbox,
) -> CmdResult {
    let usage = format!("{cmd_name} <player> <item>");
    let p = player(args, 0, &usage)?;
    let target = guid(args, 1, &usage)?;
    if target.high() != HighGuid::Item {
        return Err(format!("{target} is not an item"));
    }
    let item = world
        .item(target)
        .ok_or_else(|| format!("No item {target}"))?;
    if !world.items.get(&target).is_some_and(|held| held.owner == p) {
        return Err(format!("{p} does not hold {target}"));
    }

    let result = match cmd_name {
        "disenchant" => loot.disenchant(world, p, &item),
        "prospect" => loot.prospect(world, p, &item),
        _ => loot.open_item(world, p, &item),
    };
    loot_result(result, format!("{p} {cmd_name}s {target}"))
}

fn cmd_mail(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "mail <player> <mail_id> <template_id>";
    let p = player(args, 0, USAGE)?;
    let mail = MailTarget {
        mail_id: number(args, 1, USAGE)?,
        template_id: number(args, 2, USAGE)?,
    };
    loot_result(
        loot.open_mail(world, p, mail),
        format!("{p} opens mail {}", mail.mail_id),
    )
}

// ---------------------------------------------------------------------------
// Loot window
// ---------------------------------------------------------------------------

fn cmd_loot(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "loot <player> [target]";
    let p = player(args, 0, USAGE)?;
    let target = optional_guid(args, 1, USAGE)?;
    loot_result(loot.open_loot_window(world, p, target), format!("{p} opens loot"))
}

fn cmd_take(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "take <player> <slot> [target]";
    let p = player(args, 0, USAGE)?;
    let slot: u8 = number(args, 1, USAGE)?;
    let target = optional_guid(args, 2, USAGE)?;
    loot_result(
        loot.request_item(world, p, target, slot),
        format!("{p} takes slot {slot}"),
    )
}

fn cmd_gold(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "gold <player> [target]";
    let p = player(args, 0, USAGE)?;
    let target = optional_guid(args, 1, USAGE)?;
    loot_result(loot.request_gold(world, p, target), format!("{p} takes the gold"))
}

fn cmd_roll(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "roll <player> <target> <slot> <need|greed|disenchant|pass>";
    let p = player(args, 0, USAGE)?;
    let target = guid(args, 1, USAGE)?;
    let slot: u8 = number(args, 2, USAGE)?;
    let vote_name = arg(args, 3, USAGE)?;
    let vote = RollVote::parse(vote_name).ok_or_else(|| format!("Unknown vote '{vote_name}'"))?;
    loot.vote(world, p, target, slot, vote);
    Ok(CommandResult::ok(format!("{p} votes {vote:?} on slot {slot}")))
}

fn cmd_assign(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "assign <master> <slot> <recipient> [target]";
    let master = player(args, 0, USAGE)?;
    let slot: u8 = number(args, 1, USAGE)?;
    let recipient = player(args, 2, USAGE)?;
    let target = optional_guid(args, 3, USAGE)?;
    loot_result(
        loot.assign_master_loot(world, master, target, slot, recipient),
        format!("{master} gives slot {slot} to {recipient}"),
    )
}

fn cmd_release(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    const USAGE: &str = "release <player> [target]";
    let p = player(args, 0, USAGE)?;
    let target = optional_guid(args, 1, USAGE)?;
    loot_result(loot.release_window(world, p, target), format!("{p} closes loot"))
}

fn cmd_despawn(args: &[&str], loot: &mut LootCoordinator, world: &mut Sandbox) -> CmdResult {
    let target = guid(args, 0, "despawn <guid>")?;
    let had_loot = loot.remove_container(world, target);
    if world.despawn(target) || had_loot {
        Ok(CommandResult::ok(format!("Despawned {target}")))
    } else {
        Err(format!("Nothing to despawn at {target}"))
    }
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

fn cmd_bag(args: &[&str], world: &mut Sandbox) -> CmdResult {
    let p = player(args, 0, "bag <player>")?;
    let entry = world
        .players
        .get(&p)
        .ok_or_else(|| format!("{p} never logged in"))?;
    let mut messages = vec![format!(
        "{p}: {} copper, {}/{} slots",
        entry.money,
        entry.bag.len(),
        entry.bag_slots
    )];
    messages.extend(
        entry
            .bag
            .iter()
            .map(|(item_id, count)| format!("  {count} x {item_id}")),
    );
    Ok(CommandResult::lines(messages))
}

fn cmd_status(args: &[&str], loot: &LootCoordinator, world: &Sandbox) -> CmdResult {
    let Some(target) = optional_guid(args, 0, "status [target]")? else {
        return Ok(CommandResult::ok(format!(
            "{} open loot container(s), {} door(s) opened",
            loot.container_count(),
            world.doors_used()
        )));
    };

    let container = loot
        .container(target)
        .ok_or_else(|| format!("No loot on {target}"))?;
    let mut messages = vec![format!(
        "{target}: {:?}, {} copper, owners {:?}, looting {:?}",
        container.loot_type(),
        container.gold(),
        container.owners(),
        container.players_looting()
    )];
    for item in container.items() {
        messages.push(format!(
            "  [{}] {} x {}{}{}",
            item.slot,
            item.count,
            item.item_id,
            if item.is_taken() { " (taken)" } else { "" },
            if item.is_blocked { " (blocked)" } else { "" },
        ));
    }
    Ok(CommandResult::lines(messages))
}

fn cmd_stats(args: &[&str], loot: &LootCoordinator) -> CmdResult {
    const USAGE: &str = "stats <store> <loot_id> [iterations]";
    let store_name = arg(args, 0, USAGE)?;
    let kind = LootStoreKind::from_name(store_name)
        .ok_or_else(|| format!("Unknown loot store '{store_name}'"))?;
    let loot_id: u32 = number(args, 1, USAGE)?;
    let iterations = optional_number(args, 2, 10_000, USAGE)?;

    let stats = check_drop_stats(
        loot.stores(),
        kind,
        loot_id,
        iterations,
        &mut rand::thread_rng(),
    )
    .map_err(|e| e.to_string())?;

    let mut messages = vec![format!(
        "{} {} over {} fills:",
        kind.table_name(),
        loot_id,
        stats.iterations
    )];
    messages.extend(
        stats
            .counts
            .iter()
            .map(|&(item_id, _)| format!("  {item_id}: {:.2}%", stats.rate_of(item_id))),
    );
    Ok(CommandResult::lines(messages))
}

fn cmd_help() -> CommandResult {
    let mut messages = vec!["Available commands:".to_string()];
    messages.extend(
        COMMANDS
            .iter()
            .map(|(usage, description)| format!("  {usage} - {description}")),
    );
    CommandResult::lines(messages)
}
