//! Dominório: an 8x8 domino-placement game (Domineering). p1 places vertical
//! dominoes, p2 horizontal. The first player unable to move loses.
use serde::Deserialize;
use serde::Serialize;
use tc_core::Outcome;
use tc_core::Role;

pub const SIZE: usize = 8;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    None,
    P1,
    P2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    board: Vec<Vec<Cell>>,
    turn: Role,
    finished: bool,
    winner: Outcome,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub row1: usize,
    pub col1: usize,
    pub row2: usize,
    pub col2: usize,
}

fn in_bounds(row: usize, col: usize) -> bool {
    row < SIZE && col < SIZE
}

/// True if the two cells form a valid domino for `role`'s orientation:
/// p1 is vertical (same column, adjacent rows), p2 is horizontal (same row,
/// adjacent columns).
fn oriented(mv: &Move, role: Role) -> bool {
    match role {
        Role::P1 => mv.col1 == mv.col2 && mv.row1.abs_diff(mv.row2) == 1,
        Role::P2 => mv.row1 == mv.row2 && mv.col1.abs_diff(mv.col2) == 1,
    }
}

pub fn initial_state(starting_role: Role) -> State {
    State {
        board: vec![vec![Cell::None; SIZE]; SIZE],
        turn: starting_role,
        finished: false,
        winner: Outcome::None,
    }
}

fn placement_legal(state: &State, mv: &Move, role: Role) -> bool {
    if !in_bounds(mv.row1, mv.col1) || !in_bounds(mv.row2, mv.col2) {
        return false;
    }
    if (mv.row1, mv.col1) == (mv.row2, mv.col2) {
        return false;
    }
    if !oriented(mv, role) {
        return false;
    }
    state.board[mv.row1][mv.col1] == Cell::None && state.board[mv.row2][mv.col2] == Cell::None
}

pub fn validate(state: &State, mv: &Move, role: Role) -> bool {
    if state.finished || turn(state) != role {
        return false;
    }
    placement_legal(state, mv, role)
}

pub fn apply(state: &State, mv: &Move, role: Role) -> State {
    let mut next = state.clone();
    let marker = match role {
        Role::P1 => Cell::P1,
        Role::P2 => Cell::P2,
    };
    next.board[mv.row1][mv.col1] = marker;
    next.board[mv.row2][mv.col2] = marker;
    next.turn = role.other();
    if enumerate(&next, next.turn).is_empty() {
        next.finished = true;
        next.winner = Outcome::of(role);
    }
    next
}

pub fn terminal(state: &State) -> bool {
    state.finished
}

pub fn winner(state: &State) -> Outcome {
    state.winner
}

pub fn turn(state: &State) -> Role {
    state.turn
}

pub fn enumerate(state: &State, role: Role) -> Vec<Move> {
    if state.finished {
        return Vec::new();
    }
    let mut moves = Vec::new();
    match role {
        Role::P1 => {
            for col in 0..SIZE {
                for row in 0..SIZE - 1 {
                    let mv = Move {
                        row1: row,
                        col1: col,
                        row2: row + 1,
                        col2: col,
                    };
                    if placement_legal(state, &mv, role) {
                        moves.push(mv);
                    }
                }
            }
        }
        Role::P2 => {
            for row in 0..SIZE {
                for col in 0..SIZE - 1 {
                    let mv = Move {
                        row1: row,
                        col1: col,
                        row2: row,
                        col2: col + 1,
                    };
                    if placement_legal(state, &mv, role) {
                        moves.push(mv);
                    }
                }
            }
        }
    }
    moves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_orientation() {
        let state = initial_state(Role::P1);
        // Horizontal pair submitted by p1 (vertical-only) is rejected.
        assert!(!validate(
            &state,
            &Move {
                row1: 0,
                col1: 0,
                row2: 0,
                col2: 1
            },
            Role::P1
        ));
        assert!(validate(
            &state,
            &Move {
                row1: 0,
                col1: 0,
                row2: 1,
                col2: 0
            },
            Role::P1
        ));
    }

    #[test]
    fn small_board_exhausts_to_a_winner() {
        // 8x8 but constrained to a 1-wide corridor the mover eventually loses.
        let mut state = initial_state(Role::P1);
        for row in 0..SIZE {
            for col in 0..SIZE {
                state.board[row][col] = Cell::P1;
            }
        }
        // Leave exactly one horizontal domino open for p2, then p1 has
        // nothing left afterward.
        state.board[0][0] = Cell::None;
        state.board[0][1] = Cell::None;
        state.turn = Role::P2;
        let mv = Move {
            row1: 0,
            col1: 0,
            row2: 0,
            col2: 1,
        };
        assert!(validate(&state, &mv, Role::P2));
        let next = apply(&state, &mv, Role::P2);
        assert!(terminal(&next));
        assert_eq!(winner(&next), Outcome::P2);
    }
}
