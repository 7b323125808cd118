//! Produto: a radius-4 hex board (61 cells) where both players place stones
//! of either color and are scored by the product of their two largest
//! connected groups once the board fills.
use std::collections::HashMap;
use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;
use tc_core::Outcome;
use tc_core::Role;

pub const RADIUS: i32 = 4;

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize, Deserialize, Ord, PartialOrd)]
pub struct Axial {
    pub q: i32,
    pub r: i32,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum Color {
    Black,
    White,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    #[serde(with = "axial_map")]
    board: HashMap<Axial, Color>,
    move_count: u32,
    filled: usize,
    total_cells: usize,
    turn: Role,
    finished: bool,
    winner: Outcome,
}

/// serde_json map keys must serialize as strings, so the board is carried
/// over the wire as an entry list and rebuilt into a HashMap on load.
mod axial_map {
    use super::Axial;
    use super::Color;
    use serde::Deserialize;
    use serde::Serialize;
    use std::collections::HashMap;

    pub fn serialize<S>(map: &HashMap<Axial, Color>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let entries: Vec<(Axial, Color)> = map.iter().map(|(&k, &v)| (k, v)).collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<Axial, Color>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<(Axial, Color)>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    pub coord: Axial,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Move {
    pub placements: Vec<Placement>,
}

fn distance(a: Axial) -> i32 {
    (a.q.abs()).max(a.r.abs()).max((a.q + a.r).abs())
}

fn all_cells() -> Vec<Axial> {
    let mut cells = Vec::new();
    for q in -RADIUS..=RADIUS {
        for r in -RADIUS..=RADIUS {
            let a = Axial { q, r };
            if distance(a) <= RADIUS {
                cells.push(a);
            }
        }
    }
    cells
}

const NEIGHBOR_OFFSETS: [(i32, i32); 6] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, -1), (-1, 1)];

fn neighbors(a: Axial) -> impl Iterator<Item = Axial> {
    NEIGHBOR_OFFSETS.iter().map(move |&(dq, dr)| Axial {
        q: a.q + dq,
        r: a.r + dr,
    })
}

pub fn initial_state(starting_role: Role) -> State {
    let total_cells = all_cells().len();
    State {
        board: HashMap::new(),
        move_count: 0,
        filled: 0,
        total_cells,
        turn: starting_role,
        finished: false,
        winner: Outcome::None,
    }
}

fn required_arity(state: &State) -> usize {
    if state.move_count == 0 { 1 } else { 2 }
}

pub fn validate(state: &State, mv: &Move, role: Role) -> bool {
    if state.finished || turn(state) != role {
        return false;
    }
    if mv.placements.len() != required_arity(state) {
        return false;
    }
    let mut seen = HashSet::new();
    for p in &mv.placements {
        if distance(p.coord) > RADIUS {
            return false;
        }
        if state.board.contains_key(&p.coord) {
            return false;
        }
        if !seen.insert(p.coord) {
            return false;
        }
    }
    true
}

pub fn apply(state: &State, mv: &Move, role: Role) -> State {
    let mut next = state.clone();
    for p in &mv.placements {
        next.board.insert(p.coord, p.color);
        next.filled += 1;
    }
    next.move_count += 1;
    next.turn = role.other();
    if next.filled >= next.total_cells {
        next.finished = true;
        next.winner = score_winner(&next);
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
    if state.finished || turn(state) != role {
        return Vec::new();
    }
    let arity = required_arity(state);
    let empties: Vec<Axial> = all_cells()
        .into_iter()
        .filter(|c| !state.board.contains_key(c))
        .collect();
    let mut moves = Vec::new();
    for cells in combinations(&empties, arity) {
        for colors in color_assignments(arity) {
            let placements = cells
                .iter()
                .zip(colors.iter())
                .map(|(&coord, &color)| Placement { coord, color })
                .collect();
            moves.push(Move { placements });
        }
    }
    moves
}

fn combinations(items: &[Axial], k: usize) -> Vec<Vec<Axial>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    if items.len() < k {
        return Vec::new();
    }
    let mut out = Vec::new();
    for i in 0..=items.len() - k {
        let head = items[i];
        for mut tail in combinations(&items[i + 1..], k - 1) {
            tail.insert(0, head);
            out.push(tail);
        }
    }
    out
}

fn color_assignments(k: usize) -> Vec<Vec<Color>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for rest in color_assignments(k - 1) {
        for color in [Color::Black, Color::White] {
            let mut v = vec![color];
            v.extend(rest.clone());
            out.push(v);
        }
    }
    out
}

/// Product of the two largest connected-group sizes for `color`.
pub fn score(state: &State, color: Color) -> u64 {
    let mut visited: HashSet<Axial> = HashSet::new();
    let mut sizes = Vec::new();
    for (&coord, &c) in state.board.iter() {
        if c != color || visited.contains(&coord) {
            continue;
        }
        let mut size = 0u64;
        let mut stack = vec![coord];
        visited.insert(coord);
        while let Some(cur) = stack.pop() {
            size += 1;
            for n in neighbors(cur) {
                if state.board.get(&n) == Some(&color) && visited.insert(n) {
                    stack.push(n);
                }
            }
        }
        sizes.push(size);
    }
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    if sizes.len() < 2 {
        0
    } else {
        sizes[0] * sizes[1]
    }
}

fn piece_count(state: &State, color: Color) -> usize {
    state.board.values().filter(|&&c| c == color).count()
}

fn score_winner(state: &State) -> Outcome {
    let black = score(state, Color::Black);
    let white = score(state, Color::White);
    match black.cmp(&white) {
        std::cmp::Ordering::Greater => Outcome::P1,
        std::cmp::Ordering::Less => Outcome::P2,
        std::cmp::Ordering::Equal => {
            let p1_pieces = piece_count(state, Color::Black);
            let p2_pieces = piece_count(state, Color::White);
            match p1_pieces.cmp(&p2_pieces) {
                std::cmp::Ordering::Less => Outcome::P1,
                std::cmp::Ordering::Greater => Outcome::P2,
                std::cmp::Ordering::Equal => Outcome::Draw,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_has_sixty_one_cells() {
        assert_eq!(all_cells().len(), 61);
    }

    #[test]
    fn first_move_must_be_single_placement() {
        let state = initial_state(Role::P1);
        let two = Move {
            placements: vec![
                Placement {
                    coord: Axial { q: 0, r: 0 },
                    color: Color::Black,
                },
                Placement {
                    coord: Axial { q: 1, r: 0 },
                    color: Color::White,
                },
            ],
        };
        assert!(!validate(&state, &two, Role::P1));
        let one = Move {
            placements: vec![Placement {
                coord: Axial { q: 0, r: 0 },
                color: Color::Black,
            }],
        };
        assert!(validate(&state, &one, Role::P1));
    }

    #[test]
    fn second_move_requires_exactly_two() {
        let state = initial_state(Role::P1);
        let state = apply(
            &state,
            &Move {
                placements: vec![Placement {
                    coord: Axial { q: 0, r: 0 },
                    color: Color::Black,
                }],
            },
            Role::P1,
        );
        let one = Move {
            placements: vec![Placement {
                coord: Axial { q: 1, r: 0 },
                color: Color::Black,
            }],
        };
        assert!(!validate(&state, &one, Role::P2));
        let two = Move {
            placements: vec![
                Placement {
                    coord: Axial { q: 1, r: 0 },
                    color: Color::Black,
                },
                Placement {
                    coord: Axial { q: -1, r: 0 },
                    color: Color::White,
                },
            ],
        };
        assert!(validate(&state, &two, Role::P2));
    }

    #[test]
    fn score_is_product_of_two_largest_groups() {
        let mut state = initial_state(Role::P1);
        for (q, r) in [(0, 0), (1, 0), (2, 0), (0, 1)] {
            state.board.insert(Axial { q, r }, Color::Black);
        }
        // Groups: {(0,0),(1,0),(2,0),(0,1)} all connected -> one group of 4.
        assert_eq!(score(&state, Color::Black), 0);
        state.board.insert(Axial { q: -3, r: 0 }, Color::Black);
        state.board.insert(Axial { q: -4, r: 0 }, Color::Black);
        // Now a second group of size 2 exists, disconnected from the first.
        assert_eq!(score(&state, Color::Black), 4 * 2);
    }
}
