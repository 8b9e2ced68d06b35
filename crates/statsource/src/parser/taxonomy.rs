//! Taxonomy — the event kinds the classifier recognises, in priority order.

use super::line;

/// How an event kind is recognised line by line.
#[derive(Debug)]
pub struct EventDef {
    /// One category fragment per physical line, anchored at the category column.
    pub fragments: &'static [&'static str],
    /// Extra substring a line must contain, for kinds sharing a first fragment.
    pub contains: Option<&'static str>,
    /// All lines must carry the same tick.
    pub bounded: bool,
}

impl EventDef {
    /// Whether `line` matches fragment number `index`.
    pub fn matches(&self, line: &str, index: usize) -> bool {
        let Some(fragment) = self.fragments.get(index) else {
            return false;
        };
        line::anchored(line, fragment) && self.contains.map_or(true, |c| line.contains(c))
    }
}

const SET_ROLE: &str =
    "LogSquadTrace: [DedicatedServer]ASQPlayerController::SetCurrentRole(): On Server PC";
const POSSESS: &str = "LogSquadTrace: [DedicatedServer]ASQPlayerController::Possess():";
const REGISTER_CLIENT: &str = "LogEasyAntiCheatServer: [RegisterClient] Client:";
const JOIN_SUCCEEDED: &str = "LogNet: Join succeeded:";
const WOUND: &str = "LogSquadTrace: [DedicatedServer]ASQSoldier::Wound():";

static PLAYER_JOINED: EventDef = EventDef {
    fragments: &["LogSquad: PostLogin: NewPlayer:", REGISTER_CLIENT, JOIN_SUCCEEDED],
    contains: None,
    bounded: false,
};
static PLAYER_JOINED_DURING_TRANSITION: EventDef = EventDef {
    fragments: &["LogSquad: Error: No teams exist yet, returning nullptr", JOIN_SUCCEEDED],
    contains: None,
    bounded: false,
};
static PLAYER_DISCONNECTED: EventDef = EventDef {
    fragments: &["LogNet: UNetConnection::Close: [UNetConnection]"],
    contains: None,
    bounded: false,
};
static PLAYER_KICKED: EventDef = EventDef {
    fragments: &["LogOnlineGame: Display: Kicking player:"],
    contains: None,
    bounded: false,
};
static PLAYER_REGISTERED: EventDef = EventDef {
    fragments: &[REGISTER_CLIENT],
    contains: None,
    bounded: false,
};
static PLAYER_SPAWN_OR_KIT: EventDef = EventDef {
    fragments: &[SET_ROLE, SET_ROLE, POSSESS],
    contains: None,
    bounded: true,
};
static PLAYER_VEHICLE: EventDef = EventDef {
    fragments: &[POSSESS],
    contains: None,
    bounded: false,
};
static PLAYER_DAMAGED: EventDef = EventDef {
    fragments: &["LogSquad: Player:", WOUND, POSSESS],
    contains: None,
    bounded: false,
};
static PLAYER_BLED_OUT: EventDef = EventDef {
    fragments: &[WOUND],
    contains: None,
    bounded: false,
};
static PLAYER_GAVE_UP: EventDef = EventDef {
    fragments: &["LogSquadTrace: [DedicatedServer]ASQSoldier::Die():"],
    contains: None,
    bounded: false,
};
static PLAYER_REVIVED: EventDef = EventDef {
    fragments: &["LogSquad:"],
    contains: Some("has revived"),
    bounded: false,
};
static VEHICLE_DAMAGED: EventDef = EventDef {
    fragments: &["LogSquadTrace: [DedicatedServer]ASQVehicle::TakeDamage():"],
    contains: None,
    bounded: false,
};
static MATCH_START: EventDef = EventDef {
    fragments: &["LogWorld: Bringing World"],
    contains: None,
    bounded: false,
};
static MATCH_END: EventDef = EventDef {
    fragments: &["LogSquadTrace: [DedicatedServer]ASQGameMode::DetermineMatchWinner():"],
    contains: None,
    bounded: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PlayerJoined,
    PlayerJoinedDuringTransition,
    PlayerDisconnected,
    PlayerKicked,
    PlayerRegistered,
    PlayerSpawnOrKit,
    PlayerVehicle,
    PlayerDamaged,
    PlayerBledOut,
    PlayerGaveUp,
    PlayerRevived,
    VehicleDamaged,
    MatchStart,
    MatchEnd,
}

impl EventKind {
    /// Every kind, in classification priority order.
    pub const ALL: [EventKind; 14] = [
        EventKind::PlayerJoined,
        EventKind::PlayerJoinedDuringTransition,
        EventKind::PlayerDisconnected,
        EventKind::PlayerKicked,
        EventKind::PlayerRegistered,
        EventKind::PlayerSpawnOrKit,
        EventKind::PlayerVehicle,
        EventKind::PlayerDamaged,
        EventKind::PlayerBledOut,
        EventKind::PlayerGaveUp,
        EventKind::PlayerRevived,
        EventKind::VehicleDamaged,
        EventKind::MatchStart,
        EventKind::MatchEnd,
    ];

    /// Identity-only subset applied while seeking to a checkpoint.
    pub const CATCH_UP: [EventKind; 5] = [
        EventKind::PlayerJoined,
        EventKind::PlayerJoinedDuringTransition,
        EventKind::PlayerDisconnected,
        EventKind::PlayerKicked,
        EventKind::PlayerRegistered,
    ];

    pub fn definition(self) -> &'static EventDef {
        match self {
            EventKind::PlayerJoined => &PLAYER_JOINED,
            EventKind::PlayerJoinedDuringTransition => &PLAYER_JOINED_DURING_TRANSITION,
            EventKind::PlayerDisconnected => &PLAYER_DISCONNECTED,
            EventKind::PlayerKicked => &PLAYER_KICKED,
            EventKind::PlayerRegistered => &PLAYER_REGISTERED,
            EventKind::PlayerSpawnOrKit => &PLAYER_SPAWN_OR_KIT,
            EventKind::PlayerVehicle => &PLAYER_VEHICLE,
            EventKind::PlayerDamaged => &PLAYER_DAMAGED,
            EventKind::PlayerBledOut => &PLAYER_BLED_OUT,
            EventKind::PlayerGaveUp => &PLAYER_GAVE_UP,
            EventKind::PlayerRevived => &PLAYER_REVIVED,
            EventKind::VehicleDamaged => &VEHICLE_DAMAGED,
            EventKind::MatchStart => &MATCH_START,
            EventKind::MatchEnd => &MATCH_END,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EventKind::PlayerJoined => "player_joined",
            EventKind::PlayerJoinedDuringTransition => "player_joined_during_transition",
            EventKind::PlayerDisconnected => "player_disconnected",
            EventKind::PlayerKicked => "player_kicked",
            EventKind::PlayerRegistered => "player_registered",
            EventKind::PlayerSpawnOrKit => "player_spawn_or_kit",
            EventKind::PlayerVehicle => "player_vehicle",
            EventKind::PlayerDamaged => "player_damaged",
            EventKind::PlayerBledOut => "player_bled_out",
            EventKind::PlayerGaveUp => "player_gave_up",
            EventKind::PlayerRevived => "player_revived",
            EventKind::VehicleDamaged => "vehicle_damaged",
            EventKind::MatchStart => "match_start",
            EventKind::MatchEnd => "match_end",
        }
    }
}
