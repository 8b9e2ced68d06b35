//! Player — per-player attributes and the map-transition join queue entry.

use chrono::NaiveDateTime;

/// A player as last observed in the log.
///
/// The record outlives the connection so late lines can still be
/// correlated after a disconnect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub controller_id: Option<i64>,
    pub prefix: Option<String>,
    pub role_id: Option<i64>,
    pub weapon_id: Option<i64>,
    pub faction_id: Option<i64>,
    pub vehicle_id: Option<i64>,
}

/// Snapshot of the attributes copied into combat rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loadout {
    pub weapon_id: Option<i64>,
    pub role_id: Option<i64>,
    pub faction_id: Option<i64>,
}

impl Player {
    pub fn new(id: i64, name: impl Into<String>, controller_id: Option<i64>) -> Self {
        Self {
            id,
            name: name.into(),
            controller_id,
            ..Default::default()
        }
    }

    /// Players with the same faction, including two unknown factions, share a team.
    pub fn same_team(&self, other: &Player) -> bool {
        self.faction_id == other.faction_id
    }

    pub fn loadout(&self) -> Loadout {
        Loadout {
            weapon_id: self.weapon_id,
            role_id: self.role_id,
            faction_id: self.faction_id,
        }
    }
}

/// A join seen while no teams existed, waiting for its register-client line.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingJoin {
    pub name: String,
    pub controller_id: i64,
    pub queued_at: NaiveDateTime,
}
