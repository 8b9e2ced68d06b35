//! Lifecycle — match start, match end and the synthetic server-closed event.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::{matched, Context, ExtractError};
use crate::parser::{lit, req, EventKind, Template, Transform};
use crate::registry::EntityKind;
use crate::session::{Match, Side};
use crate::table::Deferred;

static MATCH_START: Template = Template {
    lines: &[&[
        lit("LogWorld: Bringing World "),
        req("map", &[Transform::After("."), Transform::NotEqual("TransitionMap")]),
        lit(" up for play"),
    ]],
};

static MATCH_END: Template = Template {
    lines: &[&[
        lit("LogSquadTrace: [DedicatedServer]ASQGameMode::DetermineMatchWinner(): "),
        req("faction", &[]),
        lit(" won on "),
        req("map", &[]),
    ]],
};

/// Flushes any open match, then opens a new one keyed by this line's stamp.
pub fn match_start(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::MatchStart;
    let Some(caps) = matched(&MATCH_START, kind, buffer) else {
        return Ok(());
    };
    if ctx.session.current_match.is_some() {
        ctx.flush()?;
    }

    let layer = caps.get("map").unwrap_or_default().to_string();
    ctx.registry.register_name(EntityKind::Map, &layer.replace('_', " "));

    let current = Match::new(ctx.server_id(), &caps.stamp, caps.timestamp);
    info!(server_id = ctx.server_id(), match_id = current.id, map = %layer, "match started");
    ctx.session.current_match = Some(current);

    let map = Deferred::Entity {
        kind: EntityKind::Map,
        name: layer,
    };
    let group = ctx.groups.match_start;
    ctx.record(group, vec![caps.timestamp.into(), true.into(), map.into()], false)
}

/// Closes the match. The side columns are deferred because spawns later in
/// the same flush window may still assign side two.
pub fn match_end(buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let kind = EventKind::MatchEnd;
    let Some(caps) = matched(&MATCH_END, kind, buffer) else {
        return Ok(());
    };
    let Some(started_at) = ctx.session.recording_match().map(|m| m.started_at) else {
        debug!(server_id = ctx.server_id(), "match end without an open match ignored");
        return Ok(());
    };

    let map_id = ctx
        .registry
        .register_name(EntityKind::Map, caps.get("map").unwrap_or_default());
    let winner = ctx
        .registry
        .resolve(caps.get("faction").unwrap_or_default(), EntityKind::Faction);
    let duration_ms = (caps.timestamp - started_at).num_milliseconds();

    let cells = vec![
        caps.timestamp.into(),
        true.into(),
        winner.into(),
        Deferred::MatchSide(Side::One).into(),
        Deferred::MatchSide(Side::Two).into(),
        map_id.into(),
        duration_ms.into(),
    ];
    let group = ctx.groups.match_end;
    ctx.record(group, cells, false)?;

    let server_id = ctx.server_id();
    if let Some(current) = ctx.session.current_match.as_mut() {
        current.finish(caps.timestamp);
        info!(server_id, match_id = current.id, duration_ms, "match ended");
    }
    ctx.stage_checkpoint(&caps.stamp);
    Ok(())
}

/// Inferred at end of stream: flush whatever is open, checkpoint at the
/// last line seen and forget who was connected.
pub fn server_closed(stamp: &str, at: NaiveDateTime, ctx: &mut Context) -> Result<(), ExtractError> {
    if ctx.session.current_match.is_some() {
        let cells = vec![
            at.into(),
            Deferred::MatchSide(Side::One).into(),
            Deferred::MatchSide(Side::Two).into(),
            true.into(),
        ];
        let group = ctx.groups.server_closed;
        ctx.record_closing(group, cells, false)?;
    }

    info!(server_id = ctx.server_id(), stamp, "server closed");
    ctx.stage_checkpoint(stamp);
    ctx.flush()?;
    ctx.session.clear_connected();
    ctx.session.clear_transition_joins();
    Ok(())
}
