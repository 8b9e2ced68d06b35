//! Leave — disconnects and kicks.

use tracing::debug;

use super::{invariant, matched, number, Context, ExtractError};
use crate::parser::{lit, req, EventKind, Template, Transform};

static DISCONNECTED: Template = Template {
    lines: &[&[
        lit("LogNet: UNetConnection::Close: [UNetConnection] RemoteAddr: "),
        req("player_id", &[Transform::Before(":")]),
        lit(", Name"),
    ]],
};

static KICKED: Template = Template {
    lines: &[&[
        lit("LogOnlineGame: Display: Kicking player: "),
        req("name", &[]),
        lit(" ; Reason"),
    ]],
};

pub fn player_disconnected(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::PlayerDisconnected;
    let Some(caps) = matched(&DISCONNECTED, kind, buffer) else {
        return Ok(());
    };
    let Some(player_id) = number::<i64>(&caps, "player_id", kind) else {
        return Ok(());
    };
    if !ctx.session.disconnect(player_id) {
        return Ok(());
    }

    debug!(server_id = ctx.server_id(), player_id, "player disconnected");
    let group = ctx.groups.disconnect;
    ctx.record(group, vec![caps.timestamp.into(), player_id.into(), true.into()], false)
}

/// Kick lines carry the prefixed name, so the prefix is learned here too.
pub fn player_kicked(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::PlayerKicked;
    let Some(caps) = matched(&KICKED, kind, buffer) else {
        return Ok(());
    };
    let name = caps.get("name").unwrap_or_default();
    let (player_id, prefix) = ctx
        .session
        .find_by_full_name(name)
        .ok_or_else(|| invariant(kind, format!("kicked player {name:?} is not connected")))?;
    ctx.session.learn_prefix(player_id, prefix);
    if !ctx.session.disconnect(player_id) {
        return Ok(());
    }

    debug!(server_id = ctx.server_id(), player_id, "player kicked");
    let group = ctx.groups.kick;
    ctx.record(group, vec![caps.timestamp.into(), player_id.into(), true.into()], false)
}
