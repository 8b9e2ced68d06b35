//! Session module — players, connections, and match lifecycle state.

pub mod player;
pub mod state;

pub use player::{Loadout, PendingJoin, Player};
pub use state::{match_id, Match, Session, Side};
