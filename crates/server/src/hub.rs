//! Shared server state: the transport-agnostic [`Coordinator`] plus the
//! per-player websocket sessions and bot-scheduling bookkeeping it has no
//! knowledge of.
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use tc_bots::BotLevel;
use tc_core::ConnectionId;
use tc_core::MatchId;
use tc_core::PlayerId;
use tc_coordinator::Coordinator;
use tc_coordinator::Outbox;
use tc_coordinator::Recipient;
use tokio::sync::Mutex;

fn bot_level_from_env() -> BotLevel {
    match std::env::var("BOT_LEVEL").as_deref() {
        Ok("basic") => BotLevel::Basic,
        _ => BotLevel::Advanced,
    }
}

pub struct Hub {
    coordinator: Mutex<Coordinator>,
    sessions: Mutex<HashMap<PlayerId, actix_ws::Session>>,
    players_by_conn: Mutex<HashMap<ConnectionId, PlayerId>>,
    busy_matches: Mutex<HashSet<MatchId>>,
    announced_matches: Mutex<HashSet<MatchId>>,
    bot_level: BotLevel,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            coordinator: Mutex::new(Coordinator::new()),
            sessions: Mutex::new(HashMap::new()),
            players_by_conn: Mutex::new(HashMap::new()),
            busy_matches: Mutex::new(HashSet::new()),
            announced_matches: Mutex::new(HashSet::new()),
            bot_level: bot_level_from_env(),
        }
    }

    pub fn coordinator(&self) -> &Mutex<Coordinator> {
        &self.coordinator
    }

    pub async fn register_session(&self, conn: ConnectionId, player_id: PlayerId, session: actix_ws::Session) {
        self.sessions.lock().await.insert(player_id, session);
        self.players_by_conn.lock().await.insert(conn, player_id);
    }

    pub async fn forget_connection(&self, conn: ConnectionId) {
        if let Some(player_id) = self.players_by_conn.lock().await.remove(&conn) {
            self.sessions.lock().await.remove(&player_id);
        }
    }

    /// Resolves each [`Recipient`] against connected sessions and writes the
    /// message over the wire. Players with no live session (bots, or a
    /// client that dropped) are silently skipped. Callers must not hold the
    /// coordinator lock when calling this: tournament recipients are
    /// resolved by briefly re-acquiring it.
    pub async fn deliver(&self, outbox: Outbox) {
        let mut sessions = self.sessions.lock().await;
        for (recipient, msg) in outbox {
            let targets: Vec<PlayerId> = match recipient {
                Recipient::Player(id) => vec![id],
                Recipient::Tournament(tid) => {
                    let coordinator = self.coordinator.lock().await;
                    coordinator
                        .registry()
                        .get(tid)
                        .map(|t| t.players().map(|p| p.id).collect())
                        .unwrap_or_default()
                }
            };
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    log::error!("failed to encode outbound message: {e}");
                    continue;
                }
            };
            for player_id in targets {
                if let Some(session) = sessions.get_mut(&player_id) {
                    if session.text(json.clone()).await.is_err() {
                        sessions.remove(&player_id);
                    }
                }
            }
        }
    }

    /// Sweeps every tournament for matches whose mover is a bot, or that are
    /// sitting in the inter-game pause, and schedules the appropriate delay
    /// for each one not already pending. Safe to call repeatedly; matches
    /// already scheduled are skipped via `busy_matches`.
    pub async fn drive(self: &Arc<Self>) {
        self.drive_match_starts().await;
        self.drive_bot_moves().await;
        self.drive_inter_game_pauses().await;
    }

    /// Announces every match that just became ready to start (both slots
    /// filled) with `MatchAssigned`, and auto-readies the ones where both
    /// seats are bots — humans wait for their own `ready_for_match` (§4.6).
    /// `announced_matches` ensures each match is announced exactly once.
    async fn drive_match_starts(self: &Arc<Self>) {
        let (to_announce, to_auto_start) = {
            let coordinator = self.coordinator.lock().await;
            let mut announced = self.announced_matches.lock().await;
            let mut to_announce = Vec::new();
            let mut to_auto_start = Vec::new();
            for tournament in coordinator.registry().tournaments() {
                for match_id in tournament.matches_ready_to_start() {
                    if !announced.insert(match_id) {
                        continue;
                    }
                    to_announce.push((tournament.id(), match_id));
                    let m = tournament.find_match(match_id).expect("just listed as ready");
                    let both_bots = [m.p1(), m.p2()].into_iter().all(|p| {
                        p.and_then(|id| tournament.player(id)).is_some_and(|p| p.is_bot)
                    });
                    if both_bots {
                        to_auto_start.push((tournament.id(), match_id));
                    }
                }
            }
            (to_announce, to_auto_start)
        };
        for (tournament_id, match_id) in to_announce {
            let outbox = {
                let coordinator = self.coordinator.lock().await;
                let Some(tournament) = coordinator.registry().get(tournament_id) else { continue };
                let Some(m) = tournament.find_match(match_id) else { continue };
                [m.p1(), m.p2()]
                    .into_iter()
                    .flatten()
                    .map(|pid| {
                        let opponent = if Some(pid) == m.p1() { m.p2() } else { m.p1() };
                        let opponent_name = opponent.and_then(|o| tournament.player(o)).map(|p| p.name.clone());
                        (Recipient::Player(pid), tc_coordinator::ServerMessage::MatchAssigned { match_id, opponent_name })
                    })
                    .collect::<Vec<_>>()
            };
            self.deliver(outbox).await;
        }
        for (tournament_id, match_id) in to_auto_start {
            let outcome = {
                let mut coordinator = self.coordinator.lock().await;
                coordinator.start_match(tournament_id, match_id)
            };
            match outcome {
                Ok(outbox) => self.deliver(outbox).await,
                Err(e) => log::warn!("[match {match_id}] bot auto-ready failed: {e}"),
            }
        }
    }

    async fn drive_bot_moves(self: &Arc<Self>) {
        let due = {
            let coordinator = self.coordinator.lock().await;
            let mut busy = self.busy_matches.lock().await;
            let mut due = Vec::new();
            for tournament in coordinator.registry().tournaments() {
                for m in tournament.matches() {
                    if busy.contains(&m.id()) {
                        continue;
                    }
                    let Some(session) = m.active_session() else { continue };
                    if session.finished() {
                        continue;
                    }
                    let role = session.turn();
                    let mover = match role {
                        tc_core::Role::P1 => m.p1(),
                        tc_core::Role::P2 => m.p2(),
                    };
                    let Some(mover) = mover else { continue };
                    if !tournament.player(mover).is_some_and(|p| p.is_bot) {
                        continue;
                    }
                    busy.insert(m.id());
                    due.push((tournament.id(), mover, m.id(), session.game_number(), session.state().clone(), role));
                }
            }
            due
        };
        for (tournament_id, player_id, match_id, game_number, state, role) in due {
            let hub = Arc::clone(self);
            let level = self.bot_level;
            tokio::spawn(async move {
                let mv = tc_coordinator::bot_driver::delayed_move(state, role, level).await;
                hub.busy_matches.lock().await.remove(&match_id);
                let Some(mv) = mv else { return };
                let outcome = {
                    let mut coordinator = hub.coordinator.lock().await;
                    coordinator.submit_move_as(tournament_id, player_id, match_id, game_number, mv)
                };
                match outcome {
                    Ok(outbox) => hub.deliver(outbox).await,
                    Err(e) => log::warn!("[bot {player_id}] move rejected: {e}"),
                }
                hub.drive().await;
            });
        }
    }

    async fn drive_inter_game_pauses(self: &Arc<Self>) {
        let due = {
            let coordinator = self.coordinator.lock().await;
            let mut busy = self.busy_matches.lock().await;
            let mut due = Vec::new();
            for tournament in coordinator.registry().tournaments() {
                for match_id in tournament.matches_awaiting_next_game() {
                    if busy.insert(match_id) {
                        due.push((tournament.id(), match_id));
                    }
                }
            }
            due
        };
        for (tournament_id, match_id) in due {
            let hub = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(tc_coordinator::bot_driver::INTER_GAME_PAUSE).await;
                hub.busy_matches.lock().await.remove(&match_id);
                let outcome = {
                    let mut coordinator = hub.coordinator.lock().await;
                    coordinator.advance_match(tournament_id, match_id)
                };
                match outcome {
                    Ok(outbox) => hub.deliver(outbox).await,
                    Err(e) => log::warn!("[match {match_id}] failed to advance: {e}"),
                }
                hub.drive().await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_engines::GameId;

    /// A tournament of two bots should announce its match exactly once and
    /// auto-start it without any `ready_for_match` from a client.
    #[tokio::test]
    async fn bot_vs_bot_match_is_announced_once_and_auto_started() {
        let hub = Arc::new(Hub::new());
        let tournament_id = {
            let mut coordinator = hub.coordinator.lock().await;
            let registry = coordinator.registry_mut();
            let tournament_id = registry.create(GameId::Nex, "bots-only");
            let tournament = registry.get_mut(tournament_id).unwrap();
            tournament.add_bots(2, "bot").unwrap();
            tournament.start().unwrap();
            tournament_id
        };

        hub.drive().await;

        let match_id = {
            let coordinator = hub.coordinator.lock().await;
            let tournament = coordinator.registry().get(tournament_id).unwrap();
            let m = tournament.matches().next().expect("the only match");
            assert_eq!(m.phase(), tc_session::MatchPhase::Playing, "both bots auto-ready");
            m.id()
        };

        assert!(hub.announced_matches.lock().await.contains(&match_id));

        // Running the sweep again must not re-announce or re-start it.
        hub.drive_match_starts().await;
        assert_eq!(hub.announced_matches.lock().await.len(), 1);
    }
}
