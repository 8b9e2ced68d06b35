//! Join — player connections, including joins during a map transition.

use tracing::debug;

use super::{matched, number, Context, ExtractError};
use crate::parser::{lit, opt, req, skip, EventKind, Template, Transform};
use crate::session::{PendingJoin, Player};

const REGISTER_CLIENT: &str = "LogEasyAntiCheatServer: [RegisterClient] Client: ";

static JOINED: Template = Template {
    lines: &[
        &[
            lit("LogSquad: PostLogin: NewPlayer: BP_PlayerController_C "),
            req("controller", &[Transform::After("_C_")]),
        ],
        &[
            lit(REGISTER_CLIENT),
            skip(),
            lit(" PlayerGUID: "),
            req("player_id", &[]),
            lit(" PlayerIP: "),
        ],
        &[lit("LogNet: Join succeeded: "), req("name", &[])],
    ],
};

static JOINED_DURING_TRANSITION: Template = Template {
    lines: &[
        &[
            lit("LogSquad: Error: No teams exist yet, returning nullptr in ChooseTeam for BP_PlayerController_C "),
            req("controller", &[Transform::After("_C_")]),
            lit(" Name: "),
        ],
        &[lit("LogNet: Join succeeded: "), opt("name", &[])],
    ],
};

static REGISTERED: Template = Template {
    lines: &[&[
        lit(REGISTER_CLIENT),
        skip(),
        lit(" PlayerGUID: "),
        req("player_id", &[]),
        lit(" PlayerIP: "),
        skip(),
        lit(" OwnerGUID: "),
        skip(),
        lit(" PlayerName: "),
        opt("name", &[]),
    ]],
};

pub fn player_joined(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::PlayerJoined;
    let Some(caps) = matched(&JOINED, kind, buffer) else {
        return Ok(());
    };
    let (Some(player_id), Some(controller)) = (
        number::<i64>(&caps, "player_id", kind),
        number::<i64>(&caps, "controller", kind),
    ) else {
        return Ok(());
    };
    let name = caps.get("name").unwrap_or_default();

    debug!(server_id = ctx.server_id(), player_id, name, "player joined");
    ctx.session.connect(Player::new(player_id, name, Some(controller)));
    let group = ctx.groups.join;
    ctx.record(group, vec![caps.timestamp.into(), player_id.into(), true.into()], false)
}

/// The id is not known yet; park the join until its register-client line.
pub fn player_joined_during_transition(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::PlayerJoinedDuringTransition;
    let Some(caps) = matched(&JOINED_DURING_TRANSITION, kind, buffer) else {
        return Ok(());
    };
    let Some(controller_id) = number::<i64>(&caps, "controller", kind) else {
        return Ok(());
    };
    let name = caps.get("name").unwrap_or_default().to_string();

    debug!(server_id = ctx.server_id(), controller_id, name = %name, "join queued during map transition");
    ctx.session.queue_transition_join(PendingJoin {
        name,
        controller_id,
        queued_at: caps.timestamp,
    });
    Ok(())
}

/// Pairs a queued transition join with its id and emits the join row at
/// the time the player actually joined.
pub fn player_registered(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::PlayerRegistered;
    if !ctx.session.has_transition_joins() {
        return Ok(());
    }
    let Some(caps) = matched(&REGISTERED, kind, buffer) else {
        return Ok(());
    };
    let Some(player_id) = number::<i64>(&caps, "player_id", kind) else {
        return Ok(());
    };
    if ctx.session.is_connected(player_id) {
        return Ok(());
    }
    let Some(pending) = ctx.session.take_transition_join(caps.get("name")) else {
        return Ok(());
    };

    debug!(server_id = ctx.server_id(), player_id, name = %pending.name, "transition join registered");
    ctx.session
        .connect(Player::new(player_id, pending.name, Some(pending.controller_id)));
    let group = ctx.groups.join;
    ctx.record(group, vec![pending.queued_at.into(), player_id.into(), true.into()], false)
}
