//! Groups — the row groups each event kind writes into.

use crate::table::{Accumulator, AccumulatorError, Column, GroupId};

const TS: Column = Column::timestamp("timestamp");
const PLAYER: Column = Column::int("player_id");
const VICTIM: Column = Column::int("victim_id");
const CAUSER: Column = Column::int("causer_id");
const WEAPON: Column = Column::int("weapon_id");
const ROLE: Column = Column::int("role_id");
const FACTION: Column = Column::int("faction_id");
const DAMAGE: Column = Column::float("damage");
const DOWNED: Column = Column::boolean("downed");
const FACTION_ONE: Column = Column::int("faction_one_id");
const FACTION_TWO: Column = Column::int("faction_two_id");

pub const JOIN: &[Column] = &[TS, PLAYER, Column::boolean("player_joined")];
pub const DISCONNECT: &[Column] = &[TS, PLAYER, Column::boolean("player_disconnected")];
pub const SPAWN: &[Column] = &[TS, PLAYER, Column::boolean("player_spawned"), ROLE, FACTION];
pub const CHANGED_KIT: &[Column] = &[TS, PLAYER, Column::boolean("player_changed_kit"), ROLE];
pub const VEHICLE_ENTER: &[Column] = &[
    TS,
    PLAYER,
    Column::boolean("player_entered_vehicle"),
    Column::int("vehicle_id"),
];
pub const VEHICLE_EXIT: &[Column] = &[TS, PLAYER, Column::boolean("player_exited_vehicle")];
pub const ENEMY_DAMAGE: &[Column] = &[
    TS, VICTIM, CAUSER, WEAPON, ROLE, FACTION, DAMAGE, DOWNED,
    Column::boolean("enemy_damage"),
];
pub const TEAM_DAMAGE: &[Column] = &[
    TS, VICTIM, CAUSER, WEAPON, ROLE, FACTION, DAMAGE, DOWNED,
    Column::boolean("team_damage"),
];
pub const SELF_DAMAGE: &[Column] = &[
    TS, PLAYER, WEAPON, ROLE, FACTION, DAMAGE, DOWNED,
    Column::boolean("self_damage"),
];
pub const KILL: &[Column] = &[TS, VICTIM, CAUSER, WEAPON, ROLE, FACTION, Column::boolean("kill")];
pub const TEAMKILL: &[Column] = &[TS, VICTIM, CAUSER, WEAPON, ROLE, FACTION, Column::boolean("teamkill")];
pub const SUICIDE: &[Column] = &[TS, PLAYER, WEAPON, ROLE, FACTION, Column::boolean("suicide")];
pub const REVIVE: &[Column] = &[TS, CAUSER, VICTIM, ROLE, FACTION, Column::boolean("revive")];
pub const MATCH_START: &[Column] = &[TS, Column::boolean("match_started"), Column::int("map_id")];
pub const MATCH_END: &[Column] = &[
    TS,
    Column::boolean("match_ended"),
    Column::int("winner_faction_id"),
    FACTION_ONE,
    FACTION_TWO,
    Column::int("map_id"),
    Column::int("match_duration_ms"),
];
pub const SERVER_CLOSED: &[Column] = &[TS, FACTION_ONE, FACTION_TWO, Column::boolean("server_shutdown")];

/// Handles to every registered row group, in registration order.
#[derive(Debug, Clone, Copy)]
pub struct Groups {
    pub join: GroupId,
    pub disconnect: GroupId,
    pub kick: GroupId,
    pub spawn: GroupId,
    pub changed_kit: GroupId,
    pub vehicle_enter: GroupId,
    pub vehicle_exit: GroupId,
    pub enemy_damage: GroupId,
    pub team_damage: GroupId,
    pub self_damage: GroupId,
    pub kill: GroupId,
    pub teamkill: GroupId,
    pub suicide: GroupId,
    pub revive: GroupId,
    pub match_start: GroupId,
    pub match_end: GroupId,
    pub server_closed: GroupId,
}

impl Groups {
    pub fn register(acc: &mut Accumulator) -> Result<Self, AccumulatorError> {
        Ok(Self {
            join: acc.register("join", JOIN)?,
            disconnect: acc.register("disconnect", DISCONNECT)?,
            kick: acc.register("kick", DISCONNECT)?,
            spawn: acc.register("spawn", SPAWN)?,
            changed_kit: acc.register("changed_kit", CHANGED_KIT)?,
            vehicle_enter: acc.register("vehicle_enter", VEHICLE_ENTER)?,
            vehicle_exit: acc.register("vehicle_exit", VEHICLE_EXIT)?,
            enemy_damage: acc.register("enemy_damage", ENEMY_DAMAGE)?,
            team_damage: acc.register("team_damage", TEAM_DAMAGE)?,
            self_damage: acc.register("self_damage", SELF_DAMAGE)?,
            kill: acc.register("kill", KILL)?,
            teamkill: acc.register("teamkill", TEAMKILL)?,
            suicide: acc.register("suicide", SUICIDE)?,
            revive: acc.register("revive", REVIVE)?,
            match_start: acc.register("match_start", MATCH_START)?,
            match_end: acc.register("match_end", MATCH_END)?,
            server_closed: acc.register("server_closed", SERVER_CLOSED)?,
        })
    }
}
