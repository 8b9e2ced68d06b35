//! Combat — damage, downs, bleed-outs, deaths and revives.
//!
//! Rows are bucketed by comparing the two players involved: the same player
//! is self damage, the same faction is team damage, anything else is enemy
//! damage. Enemy rows are what make a match worth keeping.

use chrono::NaiveDateTime;
use tracing::debug;

use super::{invariant, matched, number, Context, ExtractError};
use crate::parser::{lit, opt, req, skip, EventKind, Template, Transform};
use crate::registry::{trim_instance_id, EntityKind};

const WOUND: &str = "LogSquadTrace: [DedicatedServer]ASQSoldier::Wound(): Player:";
const NULLPTR: &str = "nullptr";

static DAMAGE: Template = Template {
    lines: &[
        &[
            lit("LogSquad: Player:"),
            req("victim", &[]),
            lit(" ActualDamage="),
            req("damage", &[]),
            lit(" from "),
            req("causer", &[Transform::NotEqual(NULLPTR)]),
            lit(" caused by "),
            req("weapon", &[]),
        ],
        &[
            lit(WOUND),
            skip(),
            lit(" KillingDamage="),
            opt("killing_damage", &[]),
            lit(" from "),
            opt("causer_controller", &[Transform::After("_C_")]),
            lit(" caused by "),
            skip(),
        ],
        &[
            lit("LogSquadTrace: [DedicatedServer]ASQPlayerController::Possess(): PC="),
            opt("victim_possessor", &[]),
            lit(" Pawn="),
            opt("victim_pawn", &[]),
            lit(" FullPath"),
        ],
    ],
};

static BLED_OUT: Template = Template {
    lines: &[&[
        lit(WOUND),
        req("victim", &[]),
        lit(" KillingDamage="),
        opt("killing_damage", &[]),
        lit(" from "),
        req("causer_controller", &[Transform::NotEqual(NULLPTR), Transform::After("_C_")]),
        lit(" caused by "),
        skip(),
    ]],
};

static GAVE_UP: Template = Template {
    lines: &[&[
        lit("LogSquadTrace: [DedicatedServer]ASQSoldier::Die(): Player:"),
        req("victim", &[Transform::NotEqual(NULLPTR)]),
        lit(" KillingDamage="),
        skip(),
        lit(" from "),
        req("causer_controller", &[Transform::After("_C_")]),
        lit(" caused by "),
        req("causer_pawn", &[]),
    ]],
};

static REVIVED: Template = Template {
    lines: &[&[
        lit("LogSquad: "),
        req("reviver", &[]),
        lit(" has revived "),
        req("revived", &[Transform::ChopEnd(1)]),
    ]],
};

/// One damage or down, after both players were resolved.
struct Wound {
    at: NaiveDateTime,
    victim: i64,
    causer: i64,
    damage: f32,
    downed: bool,
}

fn same_team(ctx: &Context, a: i64, b: i64) -> bool {
    match (ctx.session.player(a), ctx.session.player(b)) {
        (Some(a), Some(b)) => a.same_team(b),
        _ => false,
    }
}

fn record_wound(ctx: &mut Context, wound: Wound) -> Result<(), ExtractError> {
    let Wound {
        at,
        victim,
        causer,
        damage,
        downed,
    } = wound;

    if victim == causer {
        let gear = ctx.session.loadout(victim);
        let cells = vec![
            at.into(),
            victim.into(),
            gear.weapon_id.into(),
            gear.role_id.into(),
            gear.faction_id.into(),
            damage.into(),
            downed.into(),
            true.into(),
        ];
        let group = ctx.groups.self_damage;
        return ctx.record(group, cells, false);
    }

    let gear = ctx.session.loadout(causer);
    let cells = vec![
        at.into(),
        victim.into(),
        causer.into(),
        gear.weapon_id.into(),
        gear.role_id.into(),
        gear.faction_id.into(),
        damage.into(),
        downed.into(),
        true.into(),
    ];
    if same_team(ctx, victim, causer) {
        let group = ctx.groups.team_damage;
        ctx.record(group, cells, false)
    } else {
        let group = ctx.groups.enemy_damage;
        ctx.record(group, cells, true)
    }
}

/// Reconciles the damage line with the optional wound and passenger
/// possession lines that follow it.
pub fn player_damaged(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::PlayerDamaged;
    let Some(caps) = matched(&DAMAGE, kind, buffer) else {
        return Ok(());
    };
    let Some(damage) = number::<f32>(&caps, "damage", kind) else {
        return Ok(());
    };
    let killing_damage = caps
        .get("killing_damage")
        .and_then(|raw| raw.trim().parse::<f32>().ok());
    let controller = caps.get("causer_controller");

    let causer_name = caps.get("causer").unwrap_or_default();
    let (causer, prefix) = ctx
        .session
        .find_by_full_name(causer_name)
        .ok_or_else(|| invariant(kind, format!("causer {causer_name:?} is not connected")))?;
    ctx.session.learn_prefix(causer, prefix);

    let weapon = trim_instance_id(caps.get("weapon").unwrap_or_default());
    let weapon_id = ctx.registry.resolve(weapon, EntityKind::Weapon);
    if let Some(player) = ctx.session.player_mut(causer) {
        player.weapon_id = Some(weapon_id);
    }

    let downed = controller.is_some() && killing_damage.is_some_and(|k| k != 0.0);
    if let Some(controller) = controller {
        if downed {
            if let Ok(controller_id) = controller.trim().parse::<i64>() {
                if let Some(player) = ctx.session.player_mut(causer) {
                    player.controller_id = Some(controller_id);
                }
            }
        } else if let Some(line) = buffer.lines().nth(1) {
            // Zero killing damage: the wound line is a bleed-out of its own.
            player_bled_out(line, ctx)?;
        }
    }

    let victim_name = caps.get("victim").unwrap_or_default();
    let victim = if victim_name == NULLPTR {
        // A vehicle passenger, named only by the possession line that
        // follows a wound.
        let Some(possessor) = caps.get("victim_possessor").filter(|_| controller.is_some()) else {
            debug!(server_id = ctx.server_id(), causer, "unattributable passenger damage dropped");
            return Ok(());
        };
        ctx.session
            .find_by_name(possessor)
            .ok_or_else(|| invariant(kind, format!("passenger {possessor:?} is not connected")))?
    } else {
        let Some((victim, prefix)) = ctx.session.find_by_full_name(victim_name) else {
            debug!(server_id = ctx.server_id(), victim = victim_name, "damage to disconnected player dropped");
            return Ok(());
        };
        ctx.session.learn_prefix(victim, prefix);
        victim
    };

    record_wound(
        ctx,
        Wound {
            at: caps.timestamp,
            victim,
            causer,
            damage,
            downed,
        },
    )
}

/// A wound line with zero killing damage. The causer is only known by
/// controller id.
pub fn player_bled_out(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::PlayerBledOut;
    let Some(caps) = matched(&BLED_OUT, kind, buffer) else {
        return Ok(());
    };
    let killing_damage = caps
        .get("killing_damage")
        .and_then(|raw| raw.trim().parse::<f32>().ok());
    if killing_damage.is_some_and(|k| k != 0.0) {
        debug!(server_id = ctx.server_id(), "wound with killing damage outside a damage bundle ignored");
        return Ok(());
    }

    let victim_name = caps.get("victim").unwrap_or_default();
    let Some((victim, prefix)) = ctx.session.find_by_full_name(victim_name) else {
        debug!(server_id = ctx.server_id(), victim = victim_name, "bleed-out of disconnected player dropped");
        return Ok(());
    };
    ctx.session.learn_prefix(victim, prefix);

    let Some(controller_id) = number::<i64>(&caps, "causer_controller", kind) else {
        return Ok(());
    };
    let causer = ctx
        .session
        .find_by_controller(controller_id)
        .ok_or_else(|| invariant(kind, format!("no connected player owns controller {controller_id}")))?;

    record_wound(
        ctx,
        Wound {
            at: caps.timestamp,
            victim,
            causer,
            damage: 0.0,
            downed: true,
        },
    )
}

/// A downed player giving up or dying. A null causer pawn is a suicide; a
/// null causer controller means the killer already left.
pub fn player_gave_up(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::PlayerGaveUp;
    let Some(caps) = matched(&GAVE_UP, kind, buffer) else {
        return Ok(());
    };
    let victim_name = caps.get("victim").unwrap_or_default();
    let (victim, prefix) = ctx
        .session
        .find_by_full_name(victim_name)
        .ok_or_else(|| invariant(kind, format!("victim {victim_name:?} is not connected")))?;
    ctx.session.learn_prefix(victim, prefix);

    let suicide = |ctx: &mut Context| {
        let gear = ctx.session.loadout(victim);
        let cells = vec![
            caps.timestamp.into(),
            victim.into(),
            gear.weapon_id.into(),
            gear.role_id.into(),
            gear.faction_id.into(),
            true.into(),
        ];
        let group = ctx.groups.suicide;
        ctx.record(group, cells, false)
    };

    if caps.get("causer_pawn").is_some_and(|p| p.eq_ignore_ascii_case(NULLPTR)) {
        return suicide(ctx);
    }
    if caps.get("causer_controller").is_some_and(|c| c.eq_ignore_ascii_case(NULLPTR)) {
        debug!(server_id = ctx.server_id(), victim, "kill by disconnected player dropped");
        return Ok(());
    }
    let Some(controller_id) = number::<i64>(&caps, "causer_controller", kind) else {
        return Ok(());
    };
    let causer = ctx
        .session
        .find_by_controller(controller_id)
        .ok_or_else(|| invariant(kind, format!("no connected player owns controller {controller_id}")))?;
    if causer == victim {
        return suicide(ctx);
    }

    let gear = ctx.session.loadout(causer);
    let cells = vec![
        caps.timestamp.into(),
        victim.into(),
        causer.into(),
        gear.weapon_id.into(),
        gear.role_id.into(),
        gear.faction_id.into(),
        true.into(),
    ];
    if same_team(ctx, victim, causer) {
        let group = ctx.groups.teamkill;
        ctx.record(group, cells, false)
    } else {
        let group = ctx.groups.kill;
        ctx.record(group, cells, true)
    }
}

pub fn player_revived(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::PlayerRevived;
    let Some(caps) = matched(&REVIVED, kind, buffer) else {
        return Ok(());
    };

    let mut resolve = |field: &str| -> Result<i64, ExtractError> {
        let name = caps.get(field).unwrap_or_default();
        let (id, prefix) = ctx
            .session
            .find_by_full_name(name)
            .ok_or_else(|| invariant(kind, format!("{field} {name:?} is not connected")))?;
        ctx.session.learn_prefix(id, prefix);
        Ok(id)
    };
    let reviver = resolve("reviver")?;
    let revived = resolve("revived")?;

    let gear = ctx.session.loadout(reviver);
    let cells = vec![
        caps.timestamp.into(),
        reviver.into(),
        revived.into(),
        gear.role_id.into(),
        gear.faction_id.into(),
        true.into(),
    ];
    let group = ctx.groups.revive;
    ctx.record(group, cells, false)
}
