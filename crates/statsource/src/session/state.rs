//! State — the per-server session: players, connections, and the active match.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDateTime;

use super::player::{Loadout, PendingJoin, Player};
use crate::registry::entity_id;

/// One of the two sides of a match, numbered by first appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    One,
    Two,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: i64,
    pub started_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
    pub side_one: Option<i64>,
    pub side_two: Option<i64>,
    /// Set once a significant row has been recorded. Invalid matches are
    /// discarded at flush.
    pub valid: bool,
}

/// Match id derived from the server id and the literal start stamp.
pub fn match_id(server_id: i64, stamp: &str) -> i64 {
    entity_id(&format!("{server_id}{stamp}"))
}

impl Match {
    pub fn new(server_id: i64, stamp: &str, started_at: NaiveDateTime) -> Self {
        Self {
            id: match_id(server_id, stamp),
            started_at,
            ended_at: None,
            side_one: None,
            side_two: None,
            valid: false,
        }
    }

    /// First faction seen becomes side one; the first different one, side two.
    pub fn observe_faction(&mut self, faction_id: i64) {
        match self.side_one {
            None => self.side_one = Some(faction_id),
            Some(one) if one != faction_id && self.side_two.is_none() => {
                self.side_two = Some(faction_id)
            }
            Some(_) => {}
        }
    }

    pub fn side(&self, side: Side) -> Option<i64> {
        match side {
            Side::One => self.side_one,
            Side::Two => self.side_two,
        }
    }

    pub fn finish(&mut self, at: NaiveDateTime) {
        self.ended_at = Some(at);
    }

    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

/// Everything a worker knows about one server between lines.
#[derive(Debug, Clone)]
pub struct Session {
    pub server_id: i64,
    pub current_match: Option<Match>,
    players: HashMap<i64, Player>,
    connected: Vec<i64>,
    transition_joins: VecDeque<PendingJoin>,
}

impl Session {
    pub fn new(server_id: i64) -> Self {
        Self {
            server_id,
            current_match: None,
            players: HashMap::new(),
            connected: Vec::new(),
            transition_joins: VecDeque::new(),
        }
    }

    // ── Connections ─────────────────────────────────────────────

    /// Store the record (replacing any previous one) and mark it connected.
    pub fn connect(&mut self, player: Player) {
        let id = player.id;
        self.players.insert(id, player);
        if !self.connected.contains(&id) {
            self.connected.push(id);
        }
    }

    /// Returns whether the player was connected.
    pub fn disconnect(&mut self, id: i64) -> bool {
        match self.connected.iter().position(|&c| c == id) {
            Some(pos) => {
                self.connected.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn is_connected(&self, id: i64) -> bool {
        self.connected.contains(&id)
    }

    pub fn connected_count(&self) -> usize {
        self.connected.len()
    }

    pub fn connected(&self) -> impl Iterator<Item = &Player> {
        self.connected.iter().filter_map(|id| self.players.get(id))
    }

    pub fn clear_connected(&mut self) {
        self.connected.clear();
    }

    // ── Lookups ─────────────────────────────────────────────────

    pub fn player(&self, id: i64) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: i64) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn loadout(&self, id: i64) -> Loadout {
        self.player(id).map(Player::loadout).unwrap_or_default()
    }

    pub fn find_by_name(&self, name: &str) -> Option<i64> {
        self.connected().find(|p| p.name == name).map(|p| p.id)
    }

    /// Match a clan-prefixed display name against connected players.
    ///
    /// Returns the id and the prefix, if the full name was longer than the
    /// stored name. The prefix is kept verbatim, separator included.
    pub fn find_by_full_name(&self, full_name: &str) -> Option<(i64, Option<String>)> {
        let player = self
            .connected()
            .find(|p| !p.name.is_empty() && full_name.ends_with(p.name.as_str()))?;
        let prefix = &full_name[..full_name.len() - player.name.len()];
        let prefix = (!prefix.is_empty()).then(|| prefix.to_string());
        Some((player.id, prefix))
    }

    pub fn find_by_controller(&self, controller_id: i64) -> Option<i64> {
        self.connected()
            .find(|p| p.controller_id == Some(controller_id))
            .map(|p| p.id)
    }

    /// Remember a prefix learned from a full display name.
    pub fn learn_prefix(&mut self, id: i64, prefix: Option<String>) {
        if let (Some(player), Some(prefix)) = (self.players.get_mut(&id), prefix) {
            player.prefix = Some(prefix);
        }
    }

    // ── Map-transition joins ────────────────────────────────────

    pub fn queue_transition_join(&mut self, join: PendingJoin) {
        self.transition_joins.push_back(join);
    }

    pub fn has_transition_joins(&self) -> bool {
        !self.transition_joins.is_empty()
    }

    /// Take the queued join for `name`, or the oldest one if none matches.
    pub fn take_transition_join(&mut self, name: Option<&str>) -> Option<PendingJoin> {
        let pos = name
            .and_then(|n| self.transition_joins.iter().position(|j| j.name == n))
            .unwrap_or(0);
        self.transition_joins.remove(pos)
    }

    pub fn clear_transition_joins(&mut self) {
        self.transition_joins.clear();
    }

    // ── Match ───────────────────────────────────────────────────

    /// The active match, if rows may still be recorded into it.
    pub fn recording_match(&self) -> Option<&Match> {
        self.current_match.as_ref().filter(|m| !m.is_ended())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 8, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    // ── Match ───────────────────────────────────────────────────

    #[test]
    fn test_match_id_depends_on_server_and_stamp() {
        let a = match_id(1, "2019.08.01-12.00.00:000");
        assert_eq!(a, match_id(1, "2019.08.01-12.00.00:000"));
        assert_ne!(a, match_id(2, "2019.08.01-12.00.00:000"));
        assert_eq!(a, entity_id("12019.08.01-12.00.00:000"));
    }

    #[test]
    fn test_observe_faction_assigns_sides_in_order() {
        let mut m = Match::new(1, "x", at(12, 0, 0));
        m.observe_faction(10);
        m.observe_faction(10);
        assert_eq!(m.side(Side::One), Some(10));
        assert_eq!(m.side(Side::Two), None);
        m.observe_faction(20);
        m.observe_faction(30);
        assert_eq!(m.side(Side::Two), Some(20));
    }

    #[test]
    fn test_match_duration() {
        let mut m = Match::new(1, "x", at(12, 0, 0));
        assert_eq!(m.duration_ms(), None);
        m.finish(at(12, 30, 0));
        assert!(m.is_ended());
        assert_eq!(m.duration_ms(), Some(30 * 60 * 1000));
    }

    // ── Connections ─────────────────────────────────────────────

    #[test]
    fn test_connect_disconnect() {
        let mut session = Session::new(1);
        session.connect(Player::new(5, "X", Some(1)));
        assert!(session.is_connected(5));
        assert!(session.disconnect(5));
        assert!(!session.disconnect(5), "second disconnect is a no-op");
        assert!(session.player(5).is_some(), "record outlives the connection");
        assert_eq!(session.find_by_name("X"), None);
    }

    #[test]
    fn test_reconnect_does_not_duplicate() {
        let mut session = Session::new(1);
        session.connect(Player::new(5, "X", Some(1)));
        session.connect(Player::new(5, "X", Some(2)));
        assert_eq!(session.connected_count(), 1);
        assert_eq!(session.find_by_controller(2), Some(5));
        assert_eq!(session.find_by_controller(1), None);
    }

    #[test]
    fn test_find_by_full_name_extracts_prefix() {
        let mut session = Session::new(1);
        session.connect(Player::new(5, "Bob", None));
        assert_eq!(
            session.find_by_full_name("[TAG] Bob"),
            Some((5, Some("[TAG] ".to_string())))
        );
        assert_eq!(
            session.find_by_full_name("[TAG]Bob"),
            Some((5, Some("[TAG]".to_string())))
        );
        assert_eq!(session.find_by_full_name("Bob"), Some((5, None)));
        assert_eq!(session.find_by_full_name("Alice"), None);
    }

    #[test]
    fn test_learn_prefix_ignores_none() {
        let mut session = Session::new(1);
        session.connect(Player::new(5, "Bob", None));
        session.learn_prefix(5, Some("[TAG]".into()));
        session.learn_prefix(5, None);
        assert_eq!(session.player(5).unwrap().prefix.as_deref(), Some("[TAG]"));
    }

    // ── Transition queue ────────────────────────────────────────

    #[test]
    fn test_take_transition_join_prefers_name() {
        let mut session = Session::new(1);
        for (name, controller_id) in [("A", 1), ("B", 2)] {
            session.queue_transition_join(PendingJoin {
                name: name.into(),
                controller_id,
                queued_at: at(12, 0, 0),
            });
        }
        assert_eq!(session.take_transition_join(Some("B")).unwrap().controller_id, 2);
        assert_eq!(session.take_transition_join(Some("Z")).unwrap().controller_id, 1);
        assert!(!session.has_transition_joins());
        assert!(session.take_transition_join(None).is_none());
    }
}
