//! Deterministic rules engines for the six board games the coordinator runs.
//!
//! Each game lives in its own module and exposes a `State`, a `Move`, and a
//! uniform set of inherent functions (`initial_state`, `validate`, `apply`,
//! `terminal`, `winner`, `turn`, `enumerate`). [`GameState`] and [`GameMove`]
//! are tagged enums over those per-game types so call sites (the session and
//! the bot) can dispatch without knowing which game is live.
pub mod atarigo;
pub mod dominorio;
pub mod gatos;
pub mod nex;
pub mod produto;
pub mod quelhas;

use tc_core::Outcome;
use tc_core::Role;

/// Identifies which of the six games a match or session is playing.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameId {
    GatosCaes,
    Dominorio,
    Quelhas,
    Produto,
    AtariGo,
    Nex,
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GameId::GatosCaes => "gatos_caes",
            GameId::Dominorio => "dominorio",
            GameId::Quelhas => "quelhas",
            GameId::Produto => "produto",
            GameId::AtariGo => "atari_go",
            GameId::Nex => "nex",
        };
        write!(f, "{}", s)
    }
}

/// A game's board state, tagged by which game it belongs to.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameState {
    GatosCaes(gatos::State),
    Dominorio(dominorio::State),
    Quelhas(quelhas::State),
    Produto(produto::State),
    AtariGo(atarigo::State),
    Nex(nex::State),
}

/// A candidate move, tagged by which game it applies to.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameMove {
    GatosCaes(gatos::Move),
    Dominorio(dominorio::Move),
    Quelhas(quelhas::Move),
    Produto(produto::Move),
    AtariGo(atarigo::Move),
    Nex(nex::Move),
}

impl GameState {
    pub fn game_id(&self) -> GameId {
        match self {
            GameState::GatosCaes(_) => GameId::GatosCaes,
            GameState::Dominorio(_) => GameId::Dominorio,
            GameState::Quelhas(_) => GameId::Quelhas,
            GameState::Produto(_) => GameId::Produto,
            GameState::AtariGo(_) => GameId::AtariGo,
            GameState::Nex(_) => GameId::Nex,
        }
    }

    pub fn turn(&self) -> Role {
        match self {
            GameState::GatosCaes(s) => gatos::turn(s),
            GameState::Dominorio(s) => dominorio::turn(s),
            GameState::Quelhas(s) => quelhas::turn(s),
            GameState::Produto(s) => produto::turn(s),
            GameState::AtariGo(s) => atarigo::turn(s),
            GameState::Nex(s) => nex::turn(s),
        }
    }

    pub fn terminal(&self) -> bool {
        match self {
            GameState::GatosCaes(s) => gatos::terminal(s),
            GameState::Dominorio(s) => dominorio::terminal(s),
            GameState::Quelhas(s) => quelhas::terminal(s),
            GameState::Produto(s) => produto::terminal(s),
            GameState::AtariGo(s) => atarigo::terminal(s),
            GameState::Nex(s) => nex::terminal(s),
        }
    }

    pub fn winner(&self) -> Outcome {
        match self {
            GameState::GatosCaes(s) => gatos::winner(s),
            GameState::Dominorio(s) => dominorio::winner(s),
            GameState::Quelhas(s) => quelhas::winner(s),
            GameState::Produto(s) => produto::winner(s),
            GameState::AtariGo(s) => atarigo::winner(s),
            GameState::Nex(s) => nex::winner(s),
        }
    }

    /// Validates a move against this state for the given role.
    pub fn validate(&self, mv: &GameMove, role: Role) -> bool {
        match (self, mv) {
            (GameState::GatosCaes(s), GameMove::GatosCaes(m)) => gatos::validate(s, m, role),
            (GameState::Dominorio(s), GameMove::Dominorio(m)) => dominorio::validate(s, m, role),
            (GameState::Quelhas(s), GameMove::Quelhas(m)) => quelhas::validate(s, m, role),
            (GameState::Produto(s), GameMove::Produto(m)) => produto::validate(s, m, role),
            (GameState::AtariGo(s), GameMove::AtariGo(m)) => atarigo::validate(s, m, role),
            (GameState::Nex(s), GameMove::Nex(m)) => nex::validate(s, m, role),
            _ => false,
        }
    }

    /// Applies a move, returning the successor state. Precondition: `validate` holds.
    pub fn apply(&self, mv: &GameMove, role: Role) -> GameState {
        match (self, mv) {
            (GameState::GatosCaes(s), GameMove::GatosCaes(m)) => {
                GameState::GatosCaes(gatos::apply(s, m, role))
            }
            (GameState::Dominorio(s), GameMove::Dominorio(m)) => {
                GameState::Dominorio(dominorio::apply(s, m, role))
            }
            (GameState::Quelhas(s), GameMove::Quelhas(m)) => {
                GameState::Quelhas(quelhas::apply(s, m, role))
            }
            (GameState::Produto(s), GameMove::Produto(m)) => {
                GameState::Produto(produto::apply(s, m, role))
            }
            (GameState::AtariGo(s), GameMove::AtariGo(m)) => {
                GameState::AtariGo(atarigo::apply(s, m, role))
            }
            (GameState::Nex(s), GameMove::Nex(m)) => GameState::Nex(nex::apply(s, m, role)),
            _ => panic!("apply called with mismatched game/move pair"),
        }
    }

    /// Enumerates the legal moves for `role` in this state.
    pub fn enumerate(&self, role: Role) -> Vec<GameMove> {
        match self {
            GameState::GatosCaes(s) => gatos::enumerate(s, role)
                .into_iter()
                .map(GameMove::GatosCaes)
                .collect(),
            GameState::Dominorio(s) => dominorio::enumerate(s, role)
                .into_iter()
                .map(GameMove::Dominorio)
                .collect(),
            GameState::Quelhas(s) => quelhas::enumerate(s, role)
                .into_iter()
                .map(GameMove::Quelhas)
                .collect(),
            GameState::Produto(s) => produto::enumerate(s, role)
                .into_iter()
                .map(GameMove::Produto)
                .collect(),
            GameState::AtariGo(s) => atarigo::enumerate(s, role)
                .into_iter()
                .map(GameMove::AtariGo)
                .collect(),
            GameState::Nex(s) => nex::enumerate(s, role)
                .into_iter()
                .map(GameMove::Nex)
                .collect(),
        }
    }
}

impl GameId {
    /// Builds the initial board state for a fresh game of this type.
    pub fn initial_state(self, starting_role: Role) -> GameState {
        match self {
            GameId::GatosCaes => GameState::GatosCaes(gatos::initial_state(starting_role)),
            GameId::Dominorio => GameState::Dominorio(dominorio::initial_state(starting_role)),
            GameId::Quelhas => GameState::Quelhas(quelhas::initial_state(starting_role)),
            GameId::Produto => GameState::Produto(produto::initial_state(starting_role)),
            GameId::AtariGo => GameState::AtariGo(atarigo::initial_state(starting_role)),
            GameId::Nex => GameState::Nex(nex::initial_state(starting_role)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_matches_game_id() {
        for id in [
            GameId::GatosCaes,
            GameId::Dominorio,
            GameId::Quelhas,
            GameId::Produto,
            GameId::AtariGo,
            GameId::Nex,
        ] {
            let state = id.initial_state(Role::P1);
            assert_eq!(state.game_id(), id);
            assert!(!state.terminal());
        }
    }
}
