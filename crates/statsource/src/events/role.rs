//! Role — spawns and kit changes.

use tracing::debug;

use super::vehicle::{self, SOLDIER_PAWN};
use super::{invariant, matched, Context, ExtractError};
use crate::parser::{lit, opt, req, skip, EventKind, Template, Transform};
use crate::registry::EntityKind;

const SET_ROLE: &str = "LogSquadTrace: [DedicatedServer]ASQPlayerController::SetCurrentRole(): On Server PC=";

static SPAWN_OR_KIT: Template = Template {
    lines: &[
        &[
            lit(SET_ROLE),
            req("name", &[]),
            lit(" NewRole="),
            req("role", &[Transform::NotEqual("nullptr")]),
        ],
        &[lit(SET_ROLE), skip(), lit(" CurrentRole="), skip()],
        &[
            lit("LogSquadTrace: [DedicatedServer]ASQPlayerController::Possess(): PC="),
            opt("possessor", &[]),
            lit(" Pawn="),
            opt("pawn", &[]),
            lit(" FullPath"),
        ],
    ],
};

/// A role change followed by a soldier possession in the same tick is a
/// spawn; anything else is a kit change.
///
/// When the possession in the bundle belongs to another player it is
/// split off and applied as a vehicle possession of its own.
pub fn player_spawn_or_kit(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::PlayerSpawnOrKit;
    let Some(caps) = matched(&SPAWN_OR_KIT, kind, buffer) else {
        return Ok(());
    };
    let name = caps.get("name").unwrap_or_default();
    let player_id = ctx
        .session
        .find_by_name(name)
        .ok_or_else(|| invariant(kind, format!("player {name:?} is not connected")))?;
    let role_id = ctx
        .registry
        .resolve(caps.get("role").unwrap_or_default(), EntityKind::Role);

    let foreign_possession = caps.get("possessor").is_some_and(|p| p != name);
    let faction_id = match caps.get("pawn") {
        Some(pawn) if !foreign_possession && pawn.starts_with(SOLDIER_PAWN) => {
            Some(spawn_faction(ctx, kind, pawn)?)
        }
        _ => None,
    };

    if let Some(player) = ctx.session.player_mut(player_id) {
        player.role_id = Some(role_id);
        if faction_id.is_some() {
            player.faction_id = faction_id;
        }
    }

    if foreign_possession {
        if let Some(line) = buffer.lines().nth(2) {
            vehicle::player_vehicle(line, ctx)?;
        }
    }

    let (group, cells) = match faction_id {
        Some(faction_id) => {
            if let Some(current) = ctx.session.current_match.as_mut() {
                current.observe_faction(faction_id);
            }
            debug!(server_id = ctx.server_id(), player_id, role_id, faction_id, "player spawned");
            (
                ctx.groups.spawn,
                vec![
                    caps.timestamp.into(),
                    player_id.into(),
                    true.into(),
                    role_id.into(),
                    faction_id.into(),
                ],
            )
        }
        None => (
            ctx.groups.changed_kit,
            vec![caps.timestamp.into(), player_id.into(), true.into(), role_id.into()],
        ),
    };
    ctx.record(group, cells, false)
}

/// `BP_Soldier_<ABBR>_...` names the faction by its abbreviation, which
/// must match a registered faction exactly.
fn spawn_faction(ctx: &Context, kind: EventKind, pawn: &str) -> Result<i64, ExtractError> {
    let tag = pawn
        .split('_')
        .nth(2)
        .ok_or_else(|| invariant(kind, format!("pawn {pawn:?} carries no faction tag")))?;
    match ctx.registry.faction_by_abbreviation(tag) {
        Some(found) if found.distance == 0 => Ok(found.id),
        Some(found) => Err(invariant(
            kind,
            format!("faction tag {tag:?} is not registered (nearest at distance {})", found.distance),
        )),
        None => Err(invariant(kind, "no factions registered")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::entity_id;
    use crate::table::{Cell, Value};
    use crate::testing::{context, feed, lines};

    fn joined(ctx: &mut Context) {
        let mut input = lines::match_start(0, "Narva_RAAS_v1");
        input.extend(lines::join(1, 7, 111, "Bob"));
        input.extend(lines::join(2, 8, 222, "Carl"));
        feed(ctx, &input).unwrap();
    }

    // ── Spawns ──────────────────────────────────────────────────

    #[test]
    fn test_spawn_sets_role_faction_and_match_side() {
        let (mut ctx, _, _) = context();
        joined(&mut ctx);
        feed(&mut ctx, &lines::spawn(5, "Bob", "RU_Rifleman_01", "BP_Soldier_RU_Rifleman_C_1")).unwrap();

        let bob = ctx.session.player(111).unwrap();
        assert_eq!(bob.role_id, Some(entity_id("RU_Rifleman_01")));
        assert_eq!(bob.faction_id, Some(entity_id("Russian Ground Forces")));

        let current = ctx.session.current_match.as_ref().unwrap();
        assert_eq!(current.side_one, Some(entity_id("Russian Ground Forces")));
        assert_eq!(current.side_two, None);

        let rows = ctx.accumulator.rows(ctx.groups.spawn);
        assert_eq!(rows.len(), 1);
        let faction = ctx.accumulator.schema().position("faction_id").unwrap();
        assert_eq!(rows[0][faction], Cell::Value(Value::Int(entity_id("Russian Ground Forces"))));
    }

    #[test]
    fn test_two_factions_fill_both_sides() {
        let (mut ctx, _, _) = context();
        joined(&mut ctx);
        let mut input = lines::spawn(5, "Bob", "RU_Rifleman_01", "BP_Soldier_RU_Rifleman_C_1");
        input.extend(lines::spawn(6, "Carl", "USA_Rifleman_01", "BP_Soldier_USA_Rifleman_C_2"));
        feed(&mut ctx, &input).unwrap();

        let current = ctx.session.current_match.as_ref().unwrap();
        assert_eq!(current.side_one, Some(entity_id("Russian Ground Forces")));
        assert_eq!(current.side_two, Some(entity_id("United States Army")));
    }

    #[test]
    fn test_unknown_faction_tag_is_invariant_violation() {
        let (mut ctx, _, _) = context();
        joined(&mut ctx);
        let err = feed(&mut ctx, &lines::spawn(5, "Bob", "XX_Rifleman_01", "BP_Soldier_XYZQ_Rifleman_C_1"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Invariant { event: "player_spawn_or_kit", .. }));
    }

    // ── Kit changes ─────────────────────────────────────────────

    #[test]
    fn test_role_change_without_possession_is_kit_change() {
        let (mut ctx, _, _) = context();
        joined(&mut ctx);
        feed(&mut ctx, &lines::kit_change(5, "Bob", "RU_Medic_01")).unwrap();

        assert_eq!(ctx.accumulator.group_rows(ctx.groups.changed_kit), 1);
        assert_eq!(ctx.accumulator.group_rows(ctx.groups.spawn), 0);
        assert_eq!(ctx.session.player(111).unwrap().role_id, Some(entity_id("RU_Medic_01")));
    }

    #[test]
    fn test_nullptr_role_is_void() {
        let (mut ctx, _, _) = context();
        joined(&mut ctx);
        feed(&mut ctx, &lines::kit_change(5, "Bob", "nullptr")).unwrap();
        assert_eq!(ctx.accumulator.group_rows(ctx.groups.changed_kit), 0);
        assert_eq!(ctx.session.player(111).unwrap().role_id, None);
    }

    #[test]
    fn test_foreign_possession_is_split_off() {
        let (mut ctx, _, _) = context();
        joined(&mut ctx);
        let mut input = lines::kit_change(5, "Bob", "RU_Medic_01");
        input.push(lines::possess(5, "Carl", "BP_BTR80_RU_C_2147"));
        feed(&mut ctx, &input).unwrap();

        assert_eq!(ctx.accumulator.group_rows(ctx.groups.changed_kit), 1);
        assert_eq!(ctx.accumulator.group_rows(ctx.groups.vehicle_enter), 1);
        assert_eq!(ctx.session.player(222).unwrap().vehicle_id, Some(entity_id("BP_BTR80_RU_C")));
        assert_eq!(ctx.session.player(111).unwrap().faction_id, None);
    }

    #[test]
    fn test_unknown_player_is_invariant_violation() {
        let (mut ctx, _, _) = context();
        joined(&mut ctx);
        let err = feed(&mut ctx, &lines::kit_change(5, "Nobody", "RU_Medic_01")).unwrap_err();
        assert!(matches!(err, ExtractError::Invariant { .. }));
    }
}
