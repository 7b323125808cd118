use std::time::SystemTime;

use tc_core::ErrorCode;
use tc_core::MatchId;
use tc_core::Outcome;
use tc_core::PlayerId;
use tc_core::Role;
use tc_core::TournamentId;
use tc_engines::GameId;
use tc_engines::GameMove;

use crate::session::GameSession;

#[derive(Debug, Clone, Copy, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bracket {
    Winners,
    Losers,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    Waiting,
    Playing,
    Finished,
}

/// What happened as a result of a move landing on the match's active session.
#[derive(Debug, Clone, Copy)]
pub struct MoveEffect {
    pub game_over: bool,
    pub match_finished: bool,
    pub winner: Outcome,
}

/// Best-of-three orchestration around [`GameSession`]: creates successive
/// sessions, flips the starting role, latches the match winner.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Match {
    id: MatchId,
    tournament_id: TournamentId,
    game_id: GameId,
    round: u32,
    bracket: Bracket,
    p1: Option<PlayerId>,
    p2: Option<PlayerId>,
    p1_wins: u8,
    p2_wins: u8,
    best_of: u8,
    current_game: u8,
    starting_role_for_current_game: Option<Role>,
    phase: MatchPhase,
    winner: Option<PlayerId>,
    loser: Option<PlayerId>,
    advance_winner_to: Option<MatchId>,
    advance_loser_to: Option<MatchId>,
    session: Option<GameSession>,
}

impl Match {
    pub fn new(tournament_id: TournamentId, game_id: GameId, round: u32, bracket: Bracket) -> Self {
        Self {
            id: MatchId::default(),
            tournament_id,
            game_id,
            round,
            bracket,
            p1: None,
            p2: None,
            p1_wins: 0,
            p2_wins: 0,
            best_of: 3,
            current_game: 0,
            starting_role_for_current_game: None,
            phase: MatchPhase::Waiting,
            winner: None,
            loser: None,
            advance_winner_to: None,
            advance_loser_to: None,
            session: None,
        }
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn bracket(&self) -> Bracket {
        self.bracket
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn p1(&self) -> Option<PlayerId> {
        self.p1
    }

    pub fn p2(&self) -> Option<PlayerId> {
        self.p2
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn loser(&self) -> Option<PlayerId> {
        self.loser
    }

    pub fn current_game(&self) -> u8 {
        self.current_game
    }

    /// Games won by p1 and p2 respectively, for `game_end`'s `matchScore`.
    pub fn score(&self) -> (u8, u8) {
        (self.p1_wins, self.p2_wins)
    }

    pub fn starting_role_for_current_game(&self) -> Option<Role> {
        self.starting_role_for_current_game
    }

    pub fn advance_winner_to(&self) -> Option<MatchId> {
        self.advance_winner_to
    }

    pub fn advance_loser_to(&self) -> Option<MatchId> {
        self.advance_loser_to
    }

    pub fn set_advance_winner_to(&mut self, id: MatchId) {
        self.advance_winner_to = Some(id);
    }

    pub fn set_advance_loser_to(&mut self, id: MatchId) {
        self.advance_loser_to = Some(id);
    }

    pub fn active_session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Fills the next empty slot, left to right, and returns which role it became.
    pub fn assign_slot(&mut self, player_id: PlayerId) -> Role {
        if self.p1.is_none() {
            self.p1 = Some(player_id);
            Role::P1
        } else {
            self.p2 = Some(player_id);
            Role::P2
        }
    }

    /// Resolves the match immediately as a bye: the single occupant wins
    /// without a loser being recorded, per §4.5.2.
    pub fn resolve_bye(&mut self) {
        self.winner = self.p1.or(self.p2);
        self.loser = None;
        self.phase = MatchPhase::Finished;
    }

    pub fn ready_to_start(&self) -> bool {
        self.phase == MatchPhase::Waiting && self.p1.is_some() && self.p2.is_some()
    }

    /// Transitions `waiting` -> `playing`, starts game 1 with p1 to move.
    pub fn start(&mut self) -> Result<(), ErrorCode> {
        if !self.ready_to_start() {
            return Err(ErrorCode::MatchNotFound);
        }
        self.phase = MatchPhase::Playing;
        self.current_game = 1;
        self.starting_role_for_current_game = Some(Role::P1);
        self.begin_next_game();
        Ok(())
    }

    fn begin_next_game(&mut self) {
        let role = self
            .starting_role_for_current_game
            .expect("begin_next_game called before a starting role was set");
        self.session = Some(GameSession::new(
            self.tournament_id,
            self.id,
            self.current_game,
            self.game_id,
            role,
        ));
    }

    /// True once the active session has finished but the match hasn't
    /// progressed to the next game yet — the coordinator uses this to know
    /// when to schedule `begin_next_game` after the inter-game pause.
    pub fn awaiting_next_game(&self) -> bool {
        self.phase == MatchPhase::Playing
            && self
                .session
                .as_ref()
                .is_some_and(GameSession::finished)
            && self.current_game <= self.best_of
    }

    /// Creates the session for `current_game`; call after the pause once
    /// `awaiting_next_game` is true.
    pub fn start_next_game(&mut self) -> Result<(), ErrorCode> {
        if !self.awaiting_next_game() {
            return Err(ErrorCode::NoActiveGame);
        }
        self.begin_next_game();
        Ok(())
    }

    pub fn submit_move(
        &mut self,
        player_id: PlayerId,
        role: Role,
        mv: GameMove,
        now: SystemTime,
    ) -> Result<MoveEffect, ErrorCode> {
        if self.phase != MatchPhase::Playing {
            return Err(ErrorCode::NoActiveGame);
        }
        let session = self.session.as_mut().ok_or(ErrorCode::NoActiveGame)?;
        let outcome = session.submit_move(player_id, role, mv, now)?;
        if outcome.game_over {
            self.record_game_result(outcome.winner);
        }
        Ok(MoveEffect {
            game_over: outcome.game_over,
            match_finished: self.phase == MatchPhase::Finished,
            winner: outcome.winner,
        })
    }

    /// Scores a finished game and either closes out the match or advances
    /// to the next game number, flipping the starting role (§4.4).
    fn record_game_result(&mut self, winner: Outcome) {
        match winner.role() {
            Some(Role::P1) => self.p1_wins += 1,
            Some(Role::P2) => self.p2_wins += 1,
            None => {}
        }
        let needed = self.best_of.div_ceil(2);
        if self.p1_wins.max(self.p2_wins) >= needed {
            self.phase = MatchPhase::Finished;
            if self.p1_wins > self.p2_wins {
                self.winner = self.p1;
                self.loser = self.p2;
            } else {
                self.winner = self.p2;
                self.loser = self.p1;
            }
            log::info!(
                "[match {}] finished {}-{}, winner={:?}",
                self.id,
                self.p1_wins,
                self.p2_wins,
                self.winner
            );
        } else if self.current_game >= self.best_of {
            // Every game drawn (two consecutive passes, or a Produto tie):
            // neither side reaches `needed`, so close the series out here
            // rather than incrementing `current_game` past `best_of`.
            self.phase = MatchPhase::Finished;
            self.winner = None;
            self.loser = None;
            log::info!(
                "[match {}] finished {}-{}, series drawn",
                self.id,
                self.p1_wins,
                self.p2_wins
            );
        } else {
            self.current_game += 1;
            self.starting_role_for_current_game = self.starting_role_for_current_game.map(Role::other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_core::ID;

    fn ready_match() -> Match {
        let mut m = Match::new(ID::default(), GameId::AtariGo, 1, Bracket::Winners);
        m.assign_slot(ID::default());
        m.assign_slot(ID::default());
        m
    }

    #[test]
    fn starting_alternation_flips_per_game() {
        let mut m = ready_match();
        m.start().unwrap();
        assert_eq!(m.starting_role_for_current_game(), Some(Role::P1));
        // Two passes end game 1 as a draw, which still consumes a game number.
        let p1 = m.p1().unwrap();
        let p2 = m.p2().unwrap();
        let pass = GameMove::AtariGo(tc_engines::atarigo::Move {
            row: 0,
            col: 0,
            pass: true,
        });
        m.submit_move(p1, Role::P1, pass.clone(), SystemTime::now()).unwrap();
        m.submit_move(p2, Role::P2, pass, SystemTime::now()).unwrap();
        assert_eq!(m.current_game(), 2);
        assert_eq!(m.starting_role_for_current_game(), Some(Role::P2));
    }

    #[test]
    fn match_finishes_after_ceil_half_wins() {
        // Whoever starts a game always wins it (a corner-capture sequence),
        // so with alternation P1,P2,P1 across three games p1 ends 2-1.
        let mut m = ready_match();
        m.start().unwrap();
        let p1 = m.p1().unwrap();
        let p2 = m.p2().unwrap();
        let mut games_played = 0;
        while m.phase() != MatchPhase::Finished {
            if games_played > 0 {
                m.start_next_game().unwrap();
            }
            let starter = m.starting_role_for_current_game().unwrap();
            let (mover, other) = if starter == Role::P1 {
                (p1, p2)
            } else {
                (p2, p1)
            };
            let first = GameMove::AtariGo(tc_engines::atarigo::Move { row: 1, col: 0, pass: false });
            let second = GameMove::AtariGo(tc_engines::atarigo::Move { row: 0, col: 0, pass: false });
            let third = GameMove::AtariGo(tc_engines::atarigo::Move { row: 0, col: 1, pass: false });
            m.submit_move(mover, starter, first, SystemTime::now()).unwrap();
            m.submit_move(other, starter.other(), second, SystemTime::now())
                .unwrap();
            let effect = m
                .submit_move(mover, starter, third, SystemTime::now())
                .unwrap();
            assert!(effect.game_over);
            games_played += 1;
            assert!(games_played <= 3, "best-of-three must finish within three games");
        }
        assert_eq!(m.winner(), Some(p1));
        assert_eq!(games_played, 3);
    }

    #[test]
    fn bye_resolves_without_a_loser() {
        let mut m = Match::new(ID::default(), GameId::Nex, 1, Bracket::Winners);
        let p1 = m.assign_slot(ID::default());
        assert_eq!(p1, Role::P1);
        m.resolve_bye();
        assert_eq!(m.phase(), MatchPhase::Finished);
        assert!(m.winner().is_some());
        assert!(m.loser().is_none());
    }
}
