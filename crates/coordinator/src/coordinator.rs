use std::collections::HashMap;

use tc_core::ConnectionId;
use tc_core::ErrorCode;
use tc_core::MatchId;
use tc_core::PlayerId;
use tc_core::TournamentId;
use tc_engines::GameId;
use tc_session::MatchPhase;
use tc_tournament::TournamentRegistry;

use crate::protocol::ClientMessage;
use crate::protocol::Outbox;
use crate::protocol::Recipient;
use crate::protocol::ServerMessage;
use crate::protocol::Standing;

/// Which tournament/player a connection has joined as.
#[derive(Debug, Clone, Copy)]
struct ConnectionBinding {
    tournament_id: TournamentId,
    player_id: PlayerId,
}

/// Transport-agnostic dispatch over [`TournamentRegistry`]: turns
/// [`ClientMessage`]s into state mutations plus an [`Outbox`] of events for
/// `tc-server` to deliver. Holds no sockets; `tc-server` owns the actual
/// per-connection actix-ws sessions and resolves [`Recipient`]s against its
/// own registry.
#[derive(Debug, Default)]
pub struct Coordinator {
    registry: TournamentRegistry,
    connections: HashMap<ConnectionId, ConnectionBinding>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &TournamentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TournamentRegistry {
        &mut self.registry
    }

    pub fn dispatch(&mut self, conn: ConnectionId, msg: ClientMessage) -> Result<Outbox, ErrorCode> {
        match msg {
            ClientMessage::JoinTournament {
                game_id,
                player_name,
                class_id,
                player_id,
            } => self.join_tournament(conn, game_id, player_name, class_id, player_id),
            ClientMessage::ReadyForMatch { match_id } => self.ready_for_match(conn, match_id),
            ClientMessage::SubmitMove {
                match_id,
                game_number,
                mv,
            } => self.submit_move(conn, match_id, game_number, mv),
            ClientMessage::LeaveTournament => self.leave(conn),
        }
    }

    fn binding(&self, conn: ConnectionId) -> Result<ConnectionBinding, ErrorCode> {
        self.connections.get(&conn).copied().ok_or(ErrorCode::NotInTournament)
    }

    fn join_tournament(
        &mut self,
        conn: ConnectionId,
        game_id: GameId,
        player_name: String,
        class_id: Option<String>,
        player_id: Option<PlayerId>,
    ) -> Result<Outbox, ErrorCode> {
        let (tournament_id, player_id) = self
            .registry
            .join_for_game(game_id, player_name, class_id, player_id)?;
        self.connections.insert(conn, ConnectionBinding { tournament_id, player_id });
        let tournament = self.registry.get(tournament_id).expect("just joined");
        Ok(vec![
            (
                Recipient::Player(player_id),
                ServerMessage::Welcome { player_id, tournament_id },
            ),
            (
                Recipient::Tournament(tournament_id),
                ServerMessage::TournamentStateUpdate {
                    tournament_id,
                    phase: tournament.phase(),
                    player_count: tournament.players().count(),
                },
            ),
        ])
    }

    fn ready_for_match(&mut self, conn: ConnectionId, match_id: MatchId) -> Result<Outbox, ErrorCode> {
        let binding = self.binding(conn)?;
        let tournament = self
            .registry
            .get_mut(binding.tournament_id)
            .ok_or(ErrorCode::NotInTournament)?;
        let m = tournament.find_match(match_id).ok_or(ErrorCode::MatchNotFound)?;
        if m.p1() != Some(binding.player_id) && m.p2() != Some(binding.player_id) {
            return Err(ErrorCode::NotInMatch);
        }
        if m.phase() != MatchPhase::Waiting {
            return Err(ErrorCode::MatchNotFound);
        }
        tournament.start_match(match_id)?;
        Ok(vec![(
            Recipient::Tournament(binding.tournament_id),
            ServerMessage::Info {
                message: format!("match {match_id} under way"),
            },
        )])
    }

    fn submit_move(
        &mut self,
        conn: ConnectionId,
        match_id: MatchId,
        game_number: u8,
        mv: tc_engines::GameMove,
    ) -> Result<Outbox, ErrorCode> {
        let binding = self.binding(conn)?;
        self.submit_move_for(binding.tournament_id, binding.player_id, match_id, game_number, mv)
    }

    /// Submits a move on behalf of `player_id` directly, bypassing the
    /// connection registry. Used by the bot driver, which never holds a
    /// [`ConnectionId`] of its own.
    pub fn submit_move_as(
        &mut self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        match_id: MatchId,
        game_number: u8,
        mv: tc_engines::GameMove,
    ) -> Result<Outbox, ErrorCode> {
        self.submit_move_for(tournament_id, player_id, match_id, game_number, mv)
    }

    fn submit_move_for(
        &mut self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        match_id: MatchId,
        game_number: u8,
        mv: tc_engines::GameMove,
    ) -> Result<Outbox, ErrorCode> {
        let tournament = self.registry.get_mut(tournament_id).ok_or(ErrorCode::NotInTournament)?;
        let m = tournament.find_match_mut(match_id).ok_or(ErrorCode::MatchNotFound)?;
        if m.current_game() != game_number {
            return Err(ErrorCode::NoActiveGame);
        }
        let (p1, p2) = (m.p1(), m.p2());
        let role = match (p1, p2) {
            (Some(p), _) if p == player_id => tc_core::Role::P1,
            (_, Some(p)) if p == player_id => tc_core::Role::P2,
            _ => return Err(ErrorCode::NotInMatch),
        };
        let effect = m.submit_move(player_id, role, mv.clone(), std::time::SystemTime::now())?;
        let next_turn = m.active_session().map(tc_session::GameSession::turn);

        let mut out: Outbox = [(tc_core::Role::P1, p1), (tc_core::Role::P2, p2)]
            .into_iter()
            .filter_map(|(recipient_role, recipient)| {
                recipient.map(|pid| {
                    (
                        Recipient::Player(pid),
                        ServerMessage::GameStateUpdate {
                            match_id,
                            your_turn: !effect.game_over && next_turn == Some(recipient_role),
                            last_move: Some(mv.clone()),
                            last_move_by: Some(player_id),
                        },
                    )
                })
            })
            .collect();
        if effect.game_over {
            let final_state = m
                .active_session()
                .expect("a session that just finished a game is still the match's active one")
                .state()
                .clone();
            out.push((
                Recipient::Tournament(tournament_id),
                ServerMessage::GameEnd {
                    match_id,
                    winner_id: effect.winner.role().and_then(|r| match r {
                        tc_core::Role::P1 => p1,
                        tc_core::Role::P2 => p2,
                    }),
                    winner_role: effect.winner,
                    is_draw: effect.winner == tc_core::Outcome::Draw,
                    final_state,
                    match_score: m.score(),
                },
            ));
        }
        if effect.match_finished {
            let winner_id = m.winner();
            let loser_id = m.loser();
            let advance_winner_to = m.advance_winner_to();
            let advance_loser_to = m.advance_loser_to();
            let final_score = m.score();
            let winner_name = winner_id.and_then(|id| tournament.player(id)).map(|p| p.name.clone());
            tournament.on_match_finished(match_id)?;
            out.extend([p1, p2].into_iter().flatten().map(|pid| {
                let is_winner = Some(pid) == winner_id;
                (
                    Recipient::Player(pid),
                    ServerMessage::MatchEnd {
                        match_id,
                        winner_id,
                        winner_name: winner_name.clone(),
                        final_score,
                        you_won: is_winner,
                        eliminated_from_tournament: Some(pid) == loser_id && advance_loser_to.is_none(),
                        next_match_id: if is_winner { advance_winner_to } else { advance_loser_to },
                    },
                )
            }));
            if tournament.phase() == tc_tournament::TournamentPhase::Finished {
                out.push((
                    Recipient::Tournament(tournament_id),
                    ServerMessage::TournamentEnd {
                        champion_id: tournament.champion(),
                        champion_name: tournament
                            .champion()
                            .and_then(|id| tournament.player(id))
                            .map(|p| p.name.clone()),
                        final_standings: tournament
                            .champion()
                            .zip(winner_name.clone())
                            .map(|(id, name)| Standing { rank: 1, player_id: id, player_name: name })
                            .into_iter()
                            .collect(),
                    },
                ));
            }
        }
        Ok(out)
    }

    /// Transitions a waiting match to playing without going through a
    /// connection's own readiness check. Used when both seats are bots,
    /// which auto-ready on assignment per the scheduling sweep (§4.6).
    pub fn start_match(&mut self, tournament_id: TournamentId, match_id: MatchId) -> Result<Outbox, ErrorCode> {
        let tournament = self.registry.get_mut(tournament_id).ok_or(ErrorCode::NotInTournament)?;
        tournament.start_match(match_id)?;
        Ok(vec![(
            Recipient::Tournament(tournament_id),
            ServerMessage::Info {
                message: format!("match {match_id} under way"),
            },
        )])
    }

    /// Starts the next game of a match once its inter-game pause has
    /// elapsed. Used by `tc-server`'s scheduling sweep, never by a client
    /// message directly.
    pub fn advance_match(&mut self, tournament_id: TournamentId, match_id: MatchId) -> Result<Outbox, ErrorCode> {
        let tournament = self.registry.get_mut(tournament_id).ok_or(ErrorCode::NotInTournament)?;
        tournament.start_next_game(match_id)?;
        let m = tournament.find_match(match_id).ok_or(ErrorCode::MatchNotFound)?;
        Ok(vec![(
            Recipient::Tournament(tournament_id),
            ServerMessage::GameStart {
                match_id,
                game_number: m.current_game(),
                your_role: m.starting_role_for_current_game().unwrap_or(tc_core::Role::P1),
            },
        )])
    }

    fn leave(&mut self, conn: ConnectionId) -> Result<Outbox, ErrorCode> {
        let binding = self.binding(conn)?;
        self.connections.remove(&conn);
        if let Some(tournament) = self.registry.get_mut(binding.tournament_id) {
            tournament.set_online(binding.player_id, false);
        }
        Ok(vec![(
            Recipient::Tournament(binding.tournament_id),
            ServerMessage::Info {
                message: format!("player {} left", binding.player_id),
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_core::ID;
    use tc_engines::GameMove;

    #[test]
    fn join_then_leave_round_trips_connection_state() {
        let mut c = Coordinator::new();
        let conn: ConnectionId = ID::default();
        let out = c
            .dispatch(
                conn,
                ClientMessage::JoinTournament {
                    game_id: GameId::Nex,
                    player_name: "alice".into(),
                    class_id: None,
                    player_id: None,
                },
            )
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(c.binding(conn).is_ok());
        c.dispatch(conn, ClientMessage::LeaveTournament).unwrap();
        assert!(c.binding(conn).is_err());
    }

    #[test]
    fn ready_for_unknown_match_is_rejected() {
        let mut c = Coordinator::new();
        let conn: ConnectionId = ID::default();
        c.dispatch(
            conn,
            ClientMessage::JoinTournament {
                game_id: GameId::Nex,
                player_name: "alice".into(),
                class_id: None,
                player_id: None,
            },
        )
        .unwrap();
        let err = c
            .dispatch(conn, ClientMessage::ReadyForMatch { match_id: ID::default() })
            .unwrap_err();
        assert_eq!(err, ErrorCode::MatchNotFound);
    }

    /// Drives a two-player Atari Go match to completion (same corner-capture
    /// sequence as `tc-session`'s best-of-three test: whoever starts a game
    /// always wins it, so alternating starters gives p1 the match 2-1) and
    /// checks that `match_end`/`game_end` carry correct per-player fields.
    #[test]
    fn finishing_a_match_emits_per_player_match_end() {
        let mut c = Coordinator::new();
        let conn_a: ConnectionId = ID::default();
        let conn_b: ConnectionId = ID::default();
        let out_a = c
            .dispatch(
                conn_a,
                ClientMessage::JoinTournament {
                    game_id: GameId::AtariGo,
                    player_name: "alice".into(),
                    class_id: None,
                    player_id: None,
                },
            )
            .unwrap();
        let (tournament_id, alice) = match &out_a[0] {
            (Recipient::Player(pid), ServerMessage::Welcome { tournament_id, .. }) => (*tournament_id, *pid),
            _ => panic!("expected a welcome message first"),
        };
        c.dispatch(
            conn_b,
            ClientMessage::JoinTournament {
                game_id: GameId::AtariGo,
                player_name: "bob".into(),
                class_id: None,
                player_id: None,
            },
        )
        .unwrap();
        let bob = c.binding(conn_b).unwrap().player_id;

        c.registry_mut().get_mut(tournament_id).unwrap().start().unwrap();
        let match_id = c.registry().get(tournament_id).unwrap().matches_ready_to_start()[0];
        c.start_match(tournament_id, match_id).unwrap();

        // Registration shuffles seeding, so p1/p2 may be either player;
        // read back who actually holds each slot rather than assuming join
        // order survived.
        let m = c.registry().get(tournament_id).unwrap().find_match(match_id).unwrap();
        let p1 = m.p1().unwrap();
        let p2 = m.p2().unwrap();
        let conn_for = |pid: PlayerId| if pid == alice { conn_a } else { conn_b };

        let first = GameMove::AtariGo(tc_engines::atarigo::Move { row: 1, col: 0, pass: false });
        let second = GameMove::AtariGo(tc_engines::atarigo::Move { row: 0, col: 0, pass: false });
        let third = GameMove::AtariGo(tc_engines::atarigo::Move { row: 0, col: 1, pass: false });

        let mut game_number = 1;
        let mut last_out = Vec::new();
        for game in 0..3 {
            if game > 0 {
                c.advance_match(tournament_id, match_id).unwrap();
            }
            // Invariant 5 (§4.3): p1 starts odd games, p2 starts even ones.
            let (starter, other) = if game % 2 == 0 { (p1, p2) } else { (p2, p1) };
            c.dispatch(
                conn_for(starter),
                ClientMessage::SubmitMove { match_id, game_number, mv: first.clone() },
            )
            .unwrap();
            c.dispatch(
                conn_for(other),
                ClientMessage::SubmitMove { match_id, game_number, mv: second.clone() },
            )
            .unwrap();
            last_out = c
                .dispatch(
                    conn_for(starter),
                    ClientMessage::SubmitMove { match_id, game_number, mv: third.clone() },
                )
                .unwrap();
            game_number += 1;
        }

        let match_end_for = |pid: PlayerId| {
            last_out.iter().find_map(|(r, m)| match (r, m) {
                (Recipient::Player(id), ServerMessage::MatchEnd { you_won, eliminated_from_tournament, .. })
                    if *id == pid =>
                {
                    Some((*you_won, *eliminated_from_tournament))
                }
                _ => None,
            })
        };
        // p1 starts games 1 and 3, and the starter always wins in this
        // scripted sequence, so p1 takes the match 2-1.
        let (p1_won, p1_eliminated) = match_end_for(p1).expect("p1 gets a match_end");
        let (p2_won, p2_eliminated) = match_end_for(p2).expect("p2 gets a match_end");
        assert!(p1_won);
        assert!(!p1_eliminated, "the match winner is never eliminated");
        assert!(!p2_won);
        assert!(p2_eliminated, "a two-player bracket has nowhere for the loser to advance to");

        assert!(
            last_out
                .iter()
                .any(|(_, m)| matches!(m, ServerMessage::TournamentEnd { champion_id: Some(id), .. } if *id == p1))
        );
    }
}
