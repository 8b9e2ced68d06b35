//! Shared test fixtures: a seeded context and builders for server log lines.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::checkpoint::MemoryCheckpoint;
use crate::events::{dispatch, Context, ExtractError};
use crate::parser::{Classifier, EventKind};
use crate::registry::{Entity, Registry};
use crate::sink::MemorySink;

pub const SERVER_ID: i64 = 1;

/// Test clock: 2019-08-01 12:00:00 plus `secs`.
pub fn at(secs: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2019, 8, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap()
        + Duration::seconds(secs)
}

/// The log stamp for [`at`].
pub fn stamp(secs: i64) -> String {
    at(secs).format("%Y.%m.%d-%H.%M.%S:%3f").to_string()
}

/// A full log line; the tick follows the second so distinct seconds never
/// share one.
pub fn line(secs: i64, body: &str) -> String {
    format!("[{}][{:>3}]{}", stamp(secs), secs.rem_euclid(1000), body)
}

pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(Entity::faction("Russian Ground Forces", "RU"));
    registry.register(Entity::faction("United States Army", "USA"));
    registry.register(Entity::faction("United States Marine Corps", "USMC"));
    registry.register(Entity::faction("Insurgent Forces", "INS"));
    registry
}

pub fn context() -> (Context, Arc<MemorySink>, Arc<MemoryCheckpoint>) {
    context_with_sink(Arc::new(MemorySink::new()))
}

pub fn context_with_sink(sink: Arc<MemorySink>) -> (Context, Arc<MemorySink>, Arc<MemoryCheckpoint>) {
    let checkpoint = Arc::new(MemoryCheckpoint::new());
    let ctx = Context::new(SERVER_ID, registry(), sink.clone(), checkpoint.clone()).unwrap();
    (ctx, sink, checkpoint)
}

/// Classify and dispatch `input` with every kind enabled, then close the
/// last open candidate.
pub fn feed(ctx: &mut Context, input: &[String]) -> Result<(), ExtractError> {
    let mut classifier = Classifier::new();
    for text in input {
        if let Some(done) = classifier.feed(text, &EventKind::ALL) {
            dispatch(done.kind, &done.text, ctx)?;
        }
    }
    if let Some(done) = classifier.finish() {
        dispatch(done.kind, &done.text, ctx)?;
    }
    Ok(())
}

/// Builders for the server lines each event kind is recognised from.
pub mod lines {
    use super::line;

    const TRACE: &str = "LogSquadTrace: [DedicatedServer]";
    const LEVEL: &str = "/Game/Maps/Narva/Narva.Narva:PersistentLevel";

    pub fn match_start(secs: i64, layer: &str) -> Vec<String> {
        vec![line(
            secs,
            &format!("LogWorld: Bringing World /Game/Maps/{layer}/{layer}.{layer} up for play"),
        )]
    }

    pub fn match_end(secs: i64, faction: &str, map: &str) -> Vec<String> {
        vec![line(
            secs,
            &format!("{TRACE}ASQGameMode::DetermineMatchWinner(): {faction} won on {map}"),
        )]
    }

    /// An unrelated line that closes a completed candidate.
    pub fn filler(secs: i64) -> Vec<String> {
        vec![line(secs, "LogNetTraffic: Warning: dropped unreliable bunch on idle channel")]
    }

    pub fn join(secs: i64, controller: i64, player_id: i64, name: &str) -> Vec<String> {
        vec![
            line(
                secs,
                &format!(
                    "LogSquad: PostLogin: NewPlayer: BP_PlayerController_C {LEVEL}.BP_PlayerController_C_{controller}"
                ),
            ),
            register_line(secs, player_id, name),
            line(secs, &format!("LogNet: Join succeeded: {name}")),
        ]
    }

    pub fn transition_join(secs: i64, controller: i64, name: &str) -> Vec<String> {
        vec![
            line(
                secs,
                &format!(
                    "LogSquad: Error: No teams exist yet, returning nullptr in ChooseTeam for \
                     BP_PlayerController_C {LEVEL}.BP_PlayerController_C_{controller} Name: {name}"
                ),
            ),
            line(secs, &format!("LogNet: Join succeeded: {name}")),
        ]
    }

    pub fn register_client(secs: i64, player_id: i64, name: &str) -> Vec<String> {
        vec![register_line(secs, player_id, name)]
    }

    fn register_line(secs: i64, player_id: i64, name: &str) -> String {
        line(
            secs,
            &format!(
                "LogEasyAntiCheatServer: [RegisterClient] Client: 0x3f1a2b PlayerGUID: {player_id} \
                 PlayerIP: 10.0.0.1 OwnerGUID: {player_id} PlayerName: {name}"
            ),
        )
    }

    pub fn disconnect(secs: i64, player_id: i64) -> String {
        line(
            secs,
            &format!(
                "LogNet: UNetConnection::Close: [UNetConnection] RemoteAddr: {player_id}:7777, \
                 Name: SteamNetConnection_1, Driver: GameNetDriver SteamNetDriver_0, IsServer: YES"
            ),
        )
    }

    pub fn kick(secs: i64, name: &str) -> String {
        line(
            secs,
            &format!("LogOnlineGame: Display: Kicking player: {name} ; Reason = Admin kick"),
        )
    }

    /// Role change, role confirmation and soldier possession in one tick.
    pub fn spawn(secs: i64, name: &str, role: &str, pawn: &str) -> Vec<String> {
        let mut lines = kit_change(secs, name, role);
        lines.push(possess(secs, name, pawn));
        lines
    }

    pub fn kit_change(secs: i64, name: &str, role: &str) -> Vec<String> {
        vec![
            line(
                secs,
                &format!("{TRACE}ASQPlayerController::SetCurrentRole(): On Server PC={name} NewRole={role}"),
            ),
            line(
                secs,
                &format!("{TRACE}ASQPlayerController::SetCurrentRole(): On Server PC={name} CurrentRole={role}"),
            ),
        ]
    }

    pub fn possess(secs: i64, name: &str, pawn: &str) -> String {
        line(
            secs,
            &format!("{TRACE}ASQPlayerController::Possess(): PC={name} Pawn={pawn} FullPath={pawn} {LEVEL}.{pawn}"),
        )
    }

    pub fn damage(secs: i64, victim: &str, damage: f32, causer: &str, weapon: &str) -> String {
        line(
            secs,
            &format!("LogSquad: Player:{victim} ActualDamage={damage:.6} from {causer} caused by {weapon}"),
        )
    }

    pub fn wound(secs: i64, victim: &str, killing_damage: f32, controller: i64) -> String {
        line(
            secs,
            &format!(
                "{TRACE}ASQSoldier::Wound(): Player:{victim} KillingDamage={killing_damage:.6} \
                 from BP_PlayerController_C_{controller} caused by BP_M4_C_12"
            ),
        )
    }

    pub fn die(secs: i64, victim: &str, controller: i64, causer_pawn: &str) -> String {
        line(
            secs,
            &format!(
                "{TRACE}ASQSoldier::Die(): Player:{victim} KillingDamage=120.000000 \
                 from BP_PlayerController_C_{controller} caused by {causer_pawn}"
            ),
        )
    }

    pub fn revive(secs: i64, reviver: &str, revived: &str) -> String {
        line(secs, &format!("LogSquad: {reviver} has revived {revived}."))
    }

    pub fn vehicle_damage(secs: i64, vehicle: &str, instigator: &str) -> String {
        line(
            secs,
            &format!(
                "{TRACE}ASQVehicle::TakeDamage(): {vehicle}: 250.000000 damage taken by causer \
                 BP_RPG7_Proj_C_1 instigator {instigator} health remaining 750.000000"
            ),
        )
    }
}
