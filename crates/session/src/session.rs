use std::time::SystemTime;

use tc_core::ErrorCode;
use tc_core::MatchId;
use tc_core::Outcome;
use tc_core::PlayerId;
use tc_core::Role;
use tc_core::SessionId;
use tc_core::TournamentId;
use tc_engines::GameId;
use tc_engines::GameMove;
use tc_engines::GameState;

/// One accepted move, kept for the match's history and for replay/export.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MoveRecord {
    pub player_id: PlayerId,
    pub mv: GameMove,
    #[serde(with = "crate::timestamp")]
    pub at: SystemTime,
}

/// Result of a move that was accepted by the engine.
#[derive(Debug, Clone, Copy)]
pub struct SubmitOutcome {
    pub game_over: bool,
    pub winner: Outcome,
}

/// Safety cap on moves per session; guards against a self-sustaining
/// bot-vs-bot loop that never reaches a terminal state because of an engine
/// defect. Hitting it force-closes the game as a draw rather than looping
/// forever.
pub const MAX_MOVES_PER_SESSION: u32 = 1000;

/// Wraps one engine instance for one playing of one game inside a match:
/// turn tracking, move log, terminal latch.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GameSession {
    id: SessionId,
    tournament_id: TournamentId,
    match_id: MatchId,
    game_number: u8,
    game_id: GameId,
    state: GameState,
    finished: bool,
    winner: Outcome,
    moves: Vec<MoveRecord>,
}

impl GameSession {
    pub fn new(
        tournament_id: TournamentId,
        match_id: MatchId,
        game_number: u8,
        game_id: GameId,
        starting_role: Role,
    ) -> Self {
        Self {
            id: SessionId::default(),
            tournament_id,
            match_id,
            game_number,
            game_id,
            state: game_id.initial_state(starting_role),
            finished: false,
            winner: Outcome::None,
            moves: Vec::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn game_number(&self) -> u8 {
        self.game_number
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn turn(&self) -> Role {
        self.state.turn()
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn winner(&self) -> Outcome {
        self.winner
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    /// Validates and applies `mv` on behalf of `player_id`. Leaves the
    /// session unchanged on any rejection.
    pub fn submit_move(
        &mut self,
        player_id: PlayerId,
        role: Role,
        mv: GameMove,
        now: SystemTime,
    ) -> Result<SubmitOutcome, ErrorCode> {
        if self.finished {
            return Err(ErrorCode::GameFinished);
        }
        if self.state.turn() != role {
            return Err(ErrorCode::NotYourTurn);
        }
        if !self.state.validate(&mv, role) {
            return Err(ErrorCode::InvalidMove);
        }
        self.state = self.state.apply(&mv, role);
        self.moves.push(MoveRecord { player_id, mv, at: now });
        if self.state.terminal() {
            self.finished = true;
            self.winner = self.state.winner();
            log::debug!(
                "[session {}] game {} finished, winner={:?}",
                self.id,
                self.game_number,
                self.winner
            );
        } else if self.moves.len() as u32 >= MAX_MOVES_PER_SESSION {
            self.finished = true;
            self.winner = Outcome::Draw;
            log::warn!(
                "[session {}] game {} hit the {}-move safety cap, forcing a draw",
                self.id,
                self.game_number,
                MAX_MOVES_PER_SESSION
            );
        }
        Ok(SubmitOutcome {
            game_over: self.finished,
            winner: self.winner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_core::ID;

    #[test]
    fn rejects_move_out_of_turn() {
        let mut session = GameSession::new(
            ID::default(),
            ID::default(),
            1,
            GameId::GatosCaes,
            Role::P1,
        );
        let state = session.state().clone();
        let illegal = state.enumerate(Role::P2);
        assert!(!illegal.is_empty());
        let err = session
            .submit_move(ID::default(), Role::P2, illegal[0].clone(), SystemTime::now())
            .unwrap_err();
        assert_eq!(err, ErrorCode::NotYourTurn);
    }

    #[test]
    fn accepted_move_appends_to_log_and_flips_turn() {
        let mut session = GameSession::new(
            ID::default(),
            ID::default(),
            1,
            GameId::GatosCaes,
            Role::P1,
        );
        let state = session.state().clone();
        let legal = state.enumerate(Role::P1);
        let mv = legal[0].clone();
        let outcome = session
            .submit_move(ID::default(), Role::P1, mv, SystemTime::now())
            .unwrap();
        assert!(!outcome.game_over);
        assert_eq!(session.moves().len(), 1);
        assert_eq!(session.turn(), Role::P2);
    }

    #[test]
    fn no_further_moves_accepted_once_finished() {
        let mut session = GameSession::new(
            ID::default(),
            ID::default(),
            1,
            GameId::AtariGo,
            Role::P1,
        );
        let pass = tc_engines::GameMove::AtariGo(tc_engines::atarigo::Move {
            row: 0,
            col: 0,
            pass: true,
        });
        session
            .submit_move(ID::default(), Role::P1, pass.clone(), SystemTime::now())
            .unwrap();
        session
            .submit_move(ID::default(), Role::P2, pass.clone(), SystemTime::now())
            .unwrap();
        assert!(session.finished());
        let err = session
            .submit_move(ID::default(), Role::P1, pass, SystemTime::now())
            .unwrap_err();
        assert_eq!(err, ErrorCode::GameFinished);
    }
}
