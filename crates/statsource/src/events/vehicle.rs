//! Vehicle — possession changes and vehicle damage.

use tracing::{debug, trace};

use super::{matched, Context, ExtractError};
use crate::parser::{lit, req, skip, EventKind, Template, Transform};
use crate::registry::{trim_instance_id, EntityKind};

/// Pawn class prefix of an on-foot soldier.
pub(crate) const SOLDIER_PAWN: &str = "BP_Soldier_";
const DEPLOYABLE_PAWN: &str = "SQDeployable";

static POSSESS: Template = Template {
    lines: &[&[
        lit("LogSquadTrace: [DedicatedServer]ASQPlayerController::Possess(): PC="),
        req("name", &[]),
        lit(" Pawn="),
        skip(),
        lit(" FullPath="),
        req("pawn", &[]),
        lit(" /"),
    ]],
};

static VEHICLE_DAMAGED: Template = Template {
    lines: &[&[
        lit("LogSquadTrace: [DedicatedServer]ASQVehicle::TakeDamage(): "),
        req("vehicle", &[]),
        lit(": "),
        req("damage", &[]),
        lit(" damage taken by causer "),
        req("causer", &[]),
        lit(" instigator "),
        req("instigator", &[Transform::NotEqual("nullptr")]),
        lit(" health remaining "),
        req("health", &[]),
    ]],
};

/// Possessing a soldier leaves a vehicle; possessing anything else enters one.
///
/// Also applied to the possession line split off a spawn bundle.
pub fn player_vehicle(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::PlayerVehicle;
    let Some(caps) = matched(&POSSESS, kind, buffer) else {
        return Ok(());
    };
    let name = caps.get("name").unwrap_or_default();
    let pawn = caps.get("pawn").unwrap_or_default();

    // The controller of a player who just left still exits its vehicle.
    let Some(player_id) = ctx.session.find_by_name(name) else {
        debug!(server_id = ctx.server_id(), name, "possession by disconnected player ignored");
        return Ok(());
    };

    if pawn.starts_with(SOLDIER_PAWN) {
        let left = ctx.session.player_mut(player_id).and_then(|p| p.vehicle_id.take());
        if left.is_none() {
            // Fresh spawns possess a soldier too.
            return Ok(());
        }
        let group = ctx.groups.vehicle_exit;
        return ctx.record(group, vec![caps.timestamp.into(), player_id.into(), true.into()], false);
    }

    if pawn.starts_with(DEPLOYABLE_PAWN) {
        trace!(server_id = ctx.server_id(), player_id, pawn, "emplacement possession ignored");
        return Ok(());
    }

    let vehicle_id = ctx.registry.resolve(trim_instance_id(pawn), EntityKind::Vehicle);
    if let Some(player) = ctx.session.player_mut(player_id) {
        player.vehicle_id = Some(vehicle_id);
    }
    let group = ctx.groups.vehicle_enter;
    ctx.record(
        group,
        vec![caps.timestamp.into(), player_id.into(), true.into(), vehicle_id.into()],
        false,
    )
}

/// Recognised so the line never joins another candidate; no rows yet.
pub fn vehicle_damaged(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::VehicleDamaged;
    let Some(caps) = matched(&VEHICLE_DAMAGED, kind, buffer) else {
        return Ok(());
    };
    let destroyed = caps
        .get("health")
        .and_then(|h| h.trim().parse::<f32>().ok())
        .is_some_and(|h| h <= 0.0);
    trace!(
        server_id = ctx.server_id(),
        vehicle = caps.get("vehicle").unwrap_or_default(),
        instigator = caps.get("instigator").unwrap_or_default(),
        destroyed,
        "vehicle damaged"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::entity_id;
    use crate::table::{Cell, Value};
    use crate::testing::{context, feed, lines};

    fn spawned(ctx: &mut Context) {
        let mut input = lines::match_start(0, "Narva_RAAS_v1");
        input.extend(lines::join(1, 7, 111, "Bob"));
        input.extend(lines::spawn(2, "Bob", "RU_Rifleman_01", "BP_Soldier_RU_Rifleman_C_1"));
        feed(ctx, &input).unwrap();
    }

    // ── Enter / exit ────────────────────────────────────────────

    #[test]
    fn test_enter_then_exit_records_both() {
        let (mut ctx, _, _) = context();
        spawned(&mut ctx);
        let input = vec![
            lines::possess(10, "Bob", "BP_BTR80_RU_C_2147"),
            lines::possess(20, "Bob", "BP_Soldier_RU_Rifleman_C_2148"),
        ];
        feed(&mut ctx, &input).unwrap();

        let enters = ctx.accumulator.rows(ctx.groups.vehicle_enter);
        assert_eq!(enters.len(), 1);
        let vehicle = ctx.accumulator.schema().position("vehicle_id").unwrap();
        assert_eq!(enters[0][vehicle], Cell::Value(Value::Int(entity_id("BP_BTR80_RU_C"))));
        assert_eq!(ctx.accumulator.group_rows(ctx.groups.vehicle_exit), 1);
        assert_eq!(ctx.session.player(111).unwrap().vehicle_id, None);
    }

    #[test]
    fn test_soldier_possession_without_vehicle_is_not_an_exit() {
        let (mut ctx, _, _) = context();
        spawned(&mut ctx);
        feed(&mut ctx, &[lines::possess(10, "Bob", "BP_Soldier_RU_Rifleman_C_2148")]).unwrap();
        assert_eq!(ctx.accumulator.group_rows(ctx.groups.vehicle_exit), 0);
    }

    #[test]
    fn test_emplacement_is_ignored() {
        let (mut ctx, _, _) = context();
        spawned(&mut ctx);
        feed(&mut ctx, &[lines::possess(10, "Bob", "SQDeployableKord_C_1")]).unwrap();
        assert_eq!(ctx.accumulator.group_rows(ctx.groups.vehicle_enter), 0);
        assert_eq!(ctx.session.player(111).unwrap().vehicle_id, None);
    }

    #[test]
    fn test_exit_after_disconnect_is_dropped() {
        let (mut ctx, _, _) = context();
        spawned(&mut ctx);
        let input = vec![
            lines::possess(10, "Bob", "BP_BTR80_RU_C_2147"),
            lines::disconnect(15, 111),
            lines::possess(16, "Bob", "BP_Soldier_RU_Rifleman_C_2148"),
        ];
        feed(&mut ctx, &input).unwrap();
        assert_eq!(ctx.accumulator.group_rows(ctx.groups.vehicle_exit), 0);
    }

    // ── Vehicle damage ──────────────────────────────────────────

    #[test]
    fn test_vehicle_damage_records_nothing() {
        let (mut ctx, _, _) = context();
        spawned(&mut ctx);
        let before = ctx.accumulator.row_count();
        feed(&mut ctx, &[lines::vehicle_damage(10, "BP_BTR80_RU_C_2147", "Bob")]).unwrap();
        assert_eq!(ctx.accumulator.row_count(), before);
    }
}
