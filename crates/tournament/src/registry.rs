use std::collections::HashMap;

use tc_core::ErrorCode;
use tc_core::PlayerId;
use tc_core::TournamentId;
use tc_engines::GameId;

use crate::tournament::Tournament;
use crate::tournament::TournamentPhase;

/// Holds at most one active (non-finished) tournament per game, auto-creating
/// one in `Registration` the first time someone joins for that game (§4.5.1).
#[derive(Debug, Default)]
pub struct TournamentRegistry {
    tournaments: HashMap<TournamentId, Tournament>,
    active_by_game: HashMap<GameId, TournamentId>,
}

impl TournamentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TournamentId) -> Option<&Tournament> {
        self.tournaments.get(&id)
    }

    pub fn get_mut(&mut self, id: TournamentId) -> Option<&mut Tournament> {
        self.tournaments.get_mut(&id)
    }

    pub fn active_for_game(&self, game_id: GameId) -> Option<&Tournament> {
        self.active_by_game.get(&game_id).and_then(|id| self.tournaments.get(id))
    }

    /// All tournaments the registry knows about, finished ones included —
    /// used by the admin surface and the bot-driving sweep.
    pub fn tournaments(&self) -> impl Iterator<Item = &Tournament> {
        self.tournaments.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = TournamentId> + '_ {
        self.tournaments.keys().copied()
    }

    /// Creates a fresh tournament for `game_id`, even if one is already
    /// running (the prior one keeps playing out, just no longer accepts
    /// new joins through this path).
    pub fn create(&mut self, game_id: GameId, label: impl Into<String>) -> TournamentId {
        let tournament = Tournament::new(game_id, label);
        let id = tournament.id();
        self.tournaments.insert(id, tournament);
        self.active_by_game.insert(game_id, id);
        id
    }

    /// Replaces (or inserts) a tournament wholesale, e.g. restoring a
    /// snapshot. Becomes the active tournament for its game if still in
    /// registration.
    pub fn restore(&mut self, tournament: Tournament) -> TournamentId {
        let id = tournament.id();
        if tournament.phase() == TournamentPhase::Registration {
            self.active_by_game.insert(tournament.game_id(), id);
        }
        self.tournaments.insert(id, tournament);
        id
    }

    /// Joins the active tournament for `game_id`, creating one if none is
    /// in `Registration` right now.
    pub fn join_for_game(
        &mut self,
        game_id: GameId,
        name: impl Into<String>,
        class: Option<String>,
        existing_id: Option<PlayerId>,
    ) -> Result<(TournamentId, PlayerId), ErrorCode> {
        let needs_new = match self.active_by_game.get(&game_id) {
            Some(id) => self
                .tournaments
                .get(id)
                .map(|t| t.phase() != TournamentPhase::Registration)
                .unwrap_or(true),
            None => true,
        };
        if needs_new && existing_id.is_none() {
            self.create(game_id, format!("{game_id}"));
        }
        let tournament_id = *self.active_by_game.get(&game_id).ok_or(ErrorCode::JoinFailed)?;
        let tournament = self.tournaments.get_mut(&tournament_id).ok_or(ErrorCode::JoinFailed)?;
        let player_id = tournament.join(name, class, existing_id)?;
        Ok((tournament_id, player_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joining_for_a_new_game_auto_creates_a_tournament() {
        let mut reg = TournamentRegistry::new();
        let (tid, _pid) = reg.join_for_game(GameId::Nex, "alice", None, None).unwrap();
        assert!(reg.get(tid).is_some());
        assert_eq!(reg.active_for_game(GameId::Nex).unwrap().id(), tid);
    }

    #[test]
    fn second_join_reuses_the_same_registration_tournament() {
        let mut reg = TournamentRegistry::new();
        let (tid1, _) = reg.join_for_game(GameId::Nex, "alice", None, None).unwrap();
        let (tid2, _) = reg.join_for_game(GameId::Nex, "bob", None, None).unwrap();
        assert_eq!(tid1, tid2);
    }

    #[test]
    fn join_after_start_opens_a_fresh_tournament() {
        let mut reg = TournamentRegistry::new();
        let (tid1, _) = reg.join_for_game(GameId::Nex, "alice", None, None).unwrap();
        reg.join_for_game(GameId::Nex, "bob", None, None).unwrap();
        reg.get_mut(tid1).unwrap().start().unwrap();
        let (tid2, _) = reg.join_for_game(GameId::Nex, "carol", None, None).unwrap();
        assert_ne!(tid1, tid2);
    }

    #[test]
    fn restoring_a_registration_phase_snapshot_reopens_it_for_joins() {
        let mut reg = TournamentRegistry::new();
        let tournament = Tournament::new(GameId::Nex, "recovered");
        let id = tournament.id();
        reg.restore(tournament);
        assert!(reg.get(id).is_some());
        assert_eq!(reg.active_for_game(GameId::Nex).unwrap().id(), id);
        let (tid, _) = reg.join_for_game(GameId::Nex, "dana", None, None).unwrap();
        assert_eq!(tid, id, "restore reopens the game's active slot rather than creating a new one");
    }

    #[test]
    fn restoring_a_finished_snapshot_does_not_reopen_it_for_joins() {
        let mut reg = TournamentRegistry::new();
        let mut tournament = Tournament::new(GameId::Nex, "done");
        tournament.force_finish();
        let id = tournament.id();
        reg.restore(tournament);
        let (tid, _) = reg.join_for_game(GameId::Nex, "erin", None, None).unwrap();
        assert_ne!(tid, id, "a finished tournament never becomes the active one for new joins");
    }
}
