//! Events module — per-event extraction and the business rules behind it.
//!
//! Each completed buffer from the classifier is matched against its kind's
//! template, then applied to the worker's [`Context`]. A template mismatch
//! is silent; an identity lookup that must succeed and does not is an
//! [`ExtractError::Invariant`] and stops the worker.

pub mod combat;
pub mod context;
pub mod groups;
pub mod join;
pub mod lifecycle;
pub mod leave;
pub mod role;
pub mod vehicle;

use thiserror::Error;
use tracing::{error, trace};

use crate::checkpoint::CheckpointError;
use crate::parser::{Captures, EventKind, Template};
use crate::sink::SinkError;
use crate::table::AccumulatorError;

pub use context::Context;
pub use groups::Groups;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{event}: {detail}")]
    Invariant { event: &'static str, detail: String },
    #[error(transparent)]
    Accumulator(#[from] AccumulatorError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

pub(crate) fn invariant(kind: EventKind, detail: impl Into<String>) -> ExtractError {
    ExtractError::Invariant {
        event: kind.name(),
        detail: detail.into(),
    }
}

/// Run `template` over `buffer`; a mismatch is traced and yields `None`.
pub(crate) fn matched(template: &Template, kind: EventKind, buffer: &str) -> Option<Captures> {
    match template.extract(buffer) {
        Ok(captures) => Some(captures),
        Err(err) => {
            trace!(event = kind.name(), error = %err, "template mismatch");
            None
        }
    }
}

/// Parse a captured numeric field; unparseable text counts as a mismatch.
pub(crate) fn number<T: std::str::FromStr>(captures: &Captures, field: &str, kind: EventKind) -> Option<T> {
    let raw = captures.get(field)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            trace!(event = kind.name(), field, raw, "field is not numeric");
            None
        }
    }
}

/// Apply one completed event buffer.
pub fn dispatch(kind: EventKind, buffer: &str, ctx: &mut Context) -> Result<(), ExtractError> {
    let result = match kind {
        EventKind::PlayerJoined => join::player_joined(buffer, ctx),
        EventKind::PlayerJoinedDuringTransition => join::player_joined_during_transition(buffer, ctx),
        EventKind::PlayerRegistered => join::player_registered(buffer, ctx),
        EventKind::PlayerDisconnected => leave::player_disconnected(buffer, ctx),
        EventKind::PlayerKicked => leave::player_kicked(buffer, ctx),
        EventKind::PlayerSpawnOrKit => role::player_spawn_or_kit(buffer, ctx),
        EventKind::PlayerVehicle => vehicle::player_vehicle(buffer, ctx),
        EventKind::VehicleDamaged => vehicle::vehicle_damaged(buffer, ctx),
        EventKind::PlayerDamaged => combat::player_damaged(buffer, ctx),
        EventKind::PlayerBledOut => combat::player_bled_out(buffer, ctx),
        EventKind::PlayerGaveUp => combat::player_gave_up(buffer, ctx),
        EventKind::PlayerRevived => combat::player_revived(buffer, ctx),
        EventKind::MatchStart => lifecycle::match_start(buffer, ctx),
        EventKind::MatchEnd => lifecycle::match_end(buffer, ctx),
    };

    if let Err(ref err) = result {
        error!(
            server_id = ctx.session.server_id,
            event = kind.name(),
            error = %err,
            "event extraction failed"
        );
    }
    result
}
