use std::collections::HashMap;

use rand::seq::SliceRandom;
use tc_core::ErrorCode;
use tc_core::Player;
use tc_core::PlayerId;
use tc_core::TournamentId;
use tc_core::Unique;
use tc_engines::GameId;
use tc_session::Bracket;
use tc_session::Match;
use tc_session::MatchPhase;

#[derive(Debug, Clone, Copy, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentPhase {
    Registration,
    Running,
    Finished,
}

/// serde_json map keys must serialize as strings, so the registry is carried
/// over the wire as an entry list and rebuilt into a HashMap on load.
mod player_map {
    use std::collections::HashMap;

    use serde::Deserialize;
    use serde::Serialize;
    use tc_core::Player;
    use tc_core::PlayerId;

    pub fn serialize<S>(map: &HashMap<PlayerId, Player>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let entries: Vec<&Player> = map.values().collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<PlayerId, Player>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<Player>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|p| (p.id, p)).collect())
    }
}

/// One source feeding into a bracket match: either side of an already-placed
/// match, tracked until the upstream match actually resolves.
#[derive(Debug, Clone, Copy)]
enum Feed {
    Winner(tc_core::MatchId),
    Loser(tc_core::MatchId),
}

/// A running (or finished) double-elimination tournament for one game.
///
/// Registration admits players and bots; [`Tournament::start`] shuffles the
/// field and builds the bracket (§4.5.2). From then on the coordinator drives
/// play by calling [`Tournament::on_match_finished`] whenever a [`Match`]
/// reports `match_finished`, which wires winners/losers forward and, for the
/// grand final, decides whether a reset match is needed (§4.5.3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Tournament {
    id: TournamentId,
    game_id: GameId,
    label: String,
    phase: TournamentPhase,
    #[serde(with = "player_map")]
    players: HashMap<PlayerId, Player>,
    winners_matches: Vec<Match>,
    losers_matches: Vec<Match>,
    grand_final: Option<Match>,
    grand_final_reset: Option<Match>,
    wb_final_id: Option<tc_core::MatchId>,
    champion_id: Option<PlayerId>,
}

impl Tournament {
    pub fn new(game_id: GameId, label: impl Into<String>) -> Self {
        Self {
            id: TournamentId::default(),
            game_id,
            label: label.into(),
            phase: TournamentPhase::Registration,
            players: HashMap::new(),
            winners_matches: Vec::new(),
            losers_matches: Vec::new(),
            grand_final: None,
            grand_final_reset: None,
            wb_final_id: None,
            champion_id: None,
        }
    }

    pub fn id(&self) -> TournamentId {
        self.id
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn phase(&self) -> TournamentPhase {
        self.phase
    }

    pub fn champion(&self) -> Option<PlayerId> {
        self.champion_id
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Registers a human player, or reconnects one by `existing_id`.
    pub fn join(&mut self, name: impl Into<String>, class: Option<String>, existing_id: Option<PlayerId>) -> Result<PlayerId, ErrorCode> {
        if let Some(id) = existing_id {
            if let Some(p) = self.players.get_mut(&id) {
                p.online = true;
                return Ok(id);
            }
        }
        if self.phase != TournamentPhase::Registration {
            return Err(ErrorCode::RegistrationClosed);
        }
        let player = Player::human(name, class);
        let id = player.id();
        self.players.insert(id, player);
        Ok(id)
    }

    /// Fills the field out with bots, e.g. to round out an odd lobby.
    pub fn add_bots(&mut self, count: usize, name_prefix: &str) -> Result<Vec<PlayerId>, ErrorCode> {
        if self.phase != TournamentPhase::Registration {
            return Err(ErrorCode::RegistrationClosed);
        }
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let bot = Player::bot(format!("{name_prefix}-{i}"));
            let id = bot.id();
            self.players.insert(id, bot);
            ids.push(id);
        }
        Ok(ids)
    }

    /// Administrative override: marks the tournament finished without a
    /// champion, e.g. to tear down an abandoned bracket.
    pub fn force_finish(&mut self) {
        self.phase = TournamentPhase::Finished;
        log::info!("[tournament {}] force-finished by admin", self.id);
    }

    pub fn set_online(&mut self, id: PlayerId, online: bool) {
        if let Some(p) = self.players.get_mut(&id) {
            p.online = online;
        }
    }

    fn match_by_id(&self, id: tc_core::MatchId) -> Option<&Match> {
        self.winners_matches
            .iter()
            .chain(self.losers_matches.iter())
            .chain(self.grand_final.iter())
            .chain(self.grand_final_reset.iter())
            .find(|m| m.id() == id)
    }

    fn match_mut(&mut self, id: tc_core::MatchId) -> Option<&mut Match> {
        self.winners_matches
            .iter_mut()
            .chain(self.losers_matches.iter_mut())
            .chain(self.grand_final.iter_mut())
            .chain(self.grand_final_reset.iter_mut())
            .find(|m| m.id() == id)
    }

    pub fn find_match(&self, id: tc_core::MatchId) -> Option<&Match> {
        self.match_by_id(id)
    }

    pub fn find_match_mut(&mut self, id: tc_core::MatchId) -> Option<&mut Match> {
        self.match_mut(id)
    }

    /// Every match in the bracket, in no particular order.
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.winners_matches
            .iter()
            .chain(self.losers_matches.iter())
            .chain(self.grand_final.iter())
            .chain(self.grand_final_reset.iter())
    }

    /// Every match whose two slots are filled but hasn't started yet.
    pub fn matches_ready_to_start(&self) -> Vec<tc_core::MatchId> {
        self.winners_matches
            .iter()
            .chain(self.losers_matches.iter())
            .chain(self.grand_final.iter())
            .chain(self.grand_final_reset.iter())
            .filter(|m| m.ready_to_start())
            .map(Match::id)
            .collect()
    }

    pub fn start_match(&mut self, id: tc_core::MatchId) -> Result<(), ErrorCode> {
        self.match_mut(id).ok_or(ErrorCode::MatchNotFound)?.start()
    }

    /// Matches that finished a game but haven't started the next one yet —
    /// the coordinator schedules these after the inter-game pause.
    pub fn matches_awaiting_next_game(&self) -> Vec<tc_core::MatchId> {
        self.matches().filter(|m| m.awaiting_next_game()).map(Match::id).collect()
    }

    pub fn start_next_game(&mut self, id: tc_core::MatchId) -> Result<(), ErrorCode> {
        self.match_mut(id).ok_or(ErrorCode::MatchNotFound)?.start_next_game()
    }

    /// Wires a feed's source match forward to `target`, assigning the slot
    /// immediately if the source has already resolved (e.g. a bye).
    fn wire_feed(&mut self, feed: Feed, target: tc_core::MatchId) {
        let (src_id, player) = match feed {
            Feed::Winner(src_id) => {
                let src = self.match_mut(src_id).expect("feed source must exist");
                src.set_advance_winner_to(target);
                (src_id, src.winner())
            }
            Feed::Loser(src_id) => {
                let src = self.match_mut(src_id).expect("feed source must exist");
                src.set_advance_loser_to(target);
                (src_id, src.loser())
            }
        };
        let already_done = self
            .match_by_id(src_id)
            .is_some_and(|m| m.phase() == MatchPhase::Finished);
        if already_done {
            if let Some(pid) = player {
                self.match_mut(target)
                    .expect("target must exist")
                    .assign_slot(pid);
            }
        }
    }

    /// Pairs consecutive feeds into new matches in `bracket`; an odd one out
    /// carries forward unpaired into the caller's next round.
    fn pair_round(&mut self, round: u32, bracket: Bracket, feeds: Vec<Feed>) -> Vec<Feed> {
        let mut out = Vec::new();
        let mut iter = feeds.into_iter();
        loop {
            let Some(a) = iter.next() else { break };
            match iter.next() {
                Some(b) => {
                    let m = Match::new(self.id, self.game_id, round, bracket);
                    let mid = m.id();
                    match bracket {
                        Bracket::Winners => self.winners_matches.push(m),
                        Bracket::Losers => self.losers_matches.push(m),
                    }
                    self.wire_feed(a, mid);
                    self.wire_feed(b, mid);
                    out.push(Feed::Winner(mid));
                }
                None => out.push(a),
            }
        }
        out
    }

    /// Builds the winners bracket, losers bracket, and grand final, then
    /// transitions to `Running`. Players are shuffled before seeding (§4.5.2).
    pub fn start(&mut self) -> Result<(), ErrorCode> {
        if self.phase != TournamentPhase::Registration {
            return Err(ErrorCode::RegistrationClosed);
        }
        let n = self.players.len();
        if n < 2 {
            return Err(ErrorCode::JoinFailed);
        }
        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.shuffle(&mut rand::rng());
        let capacity = n.next_power_of_two();
        let rounds = capacity.trailing_zeros();
        let byes = capacity - n;

        // Winners round 1: one bye-match per missing player (spread across
        // the first `byes` matches so no match ends up with two empty
        // slots), the rest full pairs.
        let mut ids_iter = ids.into_iter();
        let mut wb_rounds: Vec<Vec<tc_core::MatchId>> = Vec::new();
        let mut round1 = Vec::new();
        for i in 0..(capacity / 2) {
            let mut m = Match::new(self.id, self.game_id, 1, Bracket::Winners);
            if i < byes {
                let p = ids_iter.next().expect("enough players for bye slot");
                m.assign_slot(p);
                m.resolve_bye();
            } else {
                let a = ids_iter.next().expect("enough players for a full pair");
                let b = ids_iter.next().expect("enough players for a full pair");
                m.assign_slot(a);
                m.assign_slot(b);
            }
            round1.push(m.id());
            self.winners_matches.push(m);
        }
        wb_rounds.push(round1);

        // Winners rounds 2..=rounds: each match takes the winners of a pair
        // of matches from the previous round.
        for round in 2..=rounds {
            let prev = wb_rounds.last().expect("previous round exists").clone();
            let mut this_round = Vec::new();
            for pair in prev.chunks(2) {
                let m = Match::new(self.id, self.game_id, round, Bracket::Winners);
                let mid = m.id();
                self.winners_matches.push(m);
                for &src in pair {
                    self.wire_feed(Feed::Winner(src), mid);
                }
                this_round.push(mid);
            }
            wb_rounds.push(this_round);
        }
        self.wb_final_id = wb_rounds.last().and_then(|r| r.first()).copied();

        // Losers bracket: 2*(rounds - 1) rounds alternating a self-pair
        // (elimination) stage with a 1:1 merge (drop-in) of the next
        // winners round's losers (§4.5.2).
        let mut lb_round = 1u32;
        let non_bye_losers = |t: &Tournament, ids: &[tc_core::MatchId]| -> Vec<Feed> {
            ids.iter()
                .filter(|&&mid| {
                    let m = t.match_by_id(mid).expect("wb match exists");
                    !(m.phase() == MatchPhase::Finished && m.loser().is_none())
                })
                .map(|&mid| Feed::Loser(mid))
                .collect()
        };
        let mut survivors: Vec<Feed> = non_bye_losers(self, &wb_rounds[0]);
        for wb_round in 2..=rounds {
            survivors = self.pair_round(lb_round, Bracket::Losers, survivors);
            lb_round += 1;
            let merge_feeds = non_bye_losers(self, &wb_rounds[(wb_round - 1) as usize]);
            let mut interleaved = Vec::with_capacity(survivors.len() + merge_feeds.len());
            for (s, f) in survivors.into_iter().zip(merge_feeds) {
                interleaved.push(s);
                interleaved.push(f);
            }
            survivors = self.pair_round(lb_round, Bracket::Losers, interleaved);
            lb_round += 1;
        }
        let lb_champion_feed = survivors
            .into_iter()
            .next()
            .expect("losers bracket always yields exactly one survivor feed");

        // Grand final, plus an eagerly-built reset in case the losers-side
        // entrant wins it (§4.5.3).
        let grand_final = Match::new(self.id, self.game_id, rounds + 1, Bracket::Winners);
        let gf_id = grand_final.id();
        self.grand_final = Some(grand_final);
        let wb_final_id = self.wb_final_id.expect("winners bracket always has a final");
        self.wire_feed(Feed::Winner(wb_final_id), gf_id);
        self.wire_feed(lb_champion_feed, gf_id);
        self.grand_final_reset = Some(Match::new(self.id, self.game_id, rounds + 2, Bracket::Winners));

        self.phase = TournamentPhase::Running;
        log::info!(
            "[tournament {}] started with {} players, {} winners-bracket rounds",
            self.id,
            n,
            rounds
        );
        Ok(())
    }

    /// Call once a match reports `match_finished`: advances the winner and
    /// loser to whatever they're wired to, and handles grand-final / reset
    /// resolution.
    pub fn on_match_finished(&mut self, match_id: tc_core::MatchId) -> Result<(), ErrorCode> {
        let m = self.match_by_id(match_id).ok_or(ErrorCode::MatchNotFound)?;
        let winner = m.winner();
        let loser = m.loser();
        let advance_winner_to = m.advance_winner_to();
        let advance_loser_to = m.advance_loser_to();
        let is_grand_final = self.grand_final.as_ref().map(Match::id) == Some(match_id);
        let is_reset = self.grand_final_reset.as_ref().map(Match::id) == Some(match_id);

        if let (Some(w), Some(target)) = (winner, advance_winner_to) {
            self.match_mut(target).ok_or(ErrorCode::MatchNotFound)?.assign_slot(w);
        }
        if let (Some(l), Some(target)) = (loser, advance_loser_to) {
            self.match_mut(target).ok_or(ErrorCode::MatchNotFound)?.assign_slot(l);
        }

        if is_grand_final {
            let winners_side = self
                .wb_final_id
                .and_then(|id| self.match_by_id(id))
                .and_then(Match::winner);
            if winner.is_some() && winner == winners_side {
                self.champion_id = winner;
                self.phase = TournamentPhase::Finished;
                log::info!("[tournament {}] champion {:?}", self.id, self.champion_id);
            } else {
                let (p1, p2) = (
                    self.grand_final.as_ref().and_then(Match::p1),
                    self.grand_final.as_ref().and_then(Match::p2),
                );
                let reset = self.grand_final_reset.as_mut().expect("reset built eagerly");
                if let Some(p1) = p1 {
                    reset.assign_slot(p1);
                }
                if let Some(p2) = p2 {
                    reset.assign_slot(p2);
                }
                log::info!("[tournament {}] grand final reset triggered", self.id);
            }
        } else if is_reset {
            self.champion_id = winner;
            self.phase = TournamentPhase::Finished;
            log::info!("[tournament {}] champion {:?} (after reset)", self.id, self.champion_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(n: usize) -> Tournament {
        let mut t = Tournament::new(GameId::AtariGo, "test");
        for i in 0..n {
            t.join(format!("p{i}"), None, None).unwrap();
        }
        t
    }

    #[test]
    fn four_player_bracket_has_balanced_winners_round_one() {
        let mut t = registered(4);
        t.start().unwrap();
        let round1: Vec<_> = t
            .winners_matches
            .iter()
            .filter(|m| m.round() == 1)
            .collect();
        assert_eq!(round1.len(), 2);
        assert!(round1.iter().all(|m| m.p1().is_some() && m.p2().is_some()));
    }

    #[test]
    fn odd_field_resolves_a_bye_in_round_one() {
        let mut t = registered(3);
        t.start().unwrap();
        let byes = t
            .winners_matches
            .iter()
            .filter(|m| m.round() == 1 && m.phase() == MatchPhase::Finished)
            .count();
        assert_eq!(byes, 1);
    }

    #[test]
    fn grand_final_and_reset_are_built_eagerly() {
        let mut t = registered(4);
        t.start().unwrap();
        assert!(t.grand_final.is_some());
        assert!(t.grand_final_reset.is_some());
    }

    #[test]
    fn cannot_start_with_fewer_than_two_players() {
        let mut t = registered(1);
        assert_eq!(t.start().unwrap_err(), ErrorCode::JoinFailed);
    }

    #[test]
    fn reconnect_by_existing_id_works_after_registration_closes() {
        let mut t = registered(2);
        let existing = *t.players.keys().next().unwrap();
        t.start().unwrap();
        let rejoined = t.join("whoever", None, Some(existing)).unwrap();
        assert_eq!(rejoined, existing);
        assert_eq!(t.join("late", None, None).unwrap_err(), ErrorCode::RegistrationClosed);
    }

    #[test]
    fn add_bots_rounds_out_the_field_and_closes_after_start() {
        let mut t = registered(1);
        let bots = t.add_bots(3, "bot").unwrap();
        assert_eq!(bots.len(), 3);
        assert!(bots.iter().all(|id| t.player(*id).is_some_and(|p| p.is_bot)));
        t.start().unwrap();
        assert_eq!(t.add_bots(1, "late").unwrap_err(), ErrorCode::RegistrationClosed);
    }

    #[test]
    fn force_finish_ends_the_tournament_without_a_champion() {
        let mut t = registered(4);
        t.start().unwrap();
        t.force_finish();
        assert_eq!(t.phase(), TournamentPhase::Finished);
        assert!(t.champion().is_none());
    }

    #[test]
    fn matches_ready_to_start_only_lists_matches_with_both_slots_filled() {
        let mut t = registered(4);
        t.start().unwrap();
        let ready = t.matches_ready_to_start();
        assert_eq!(ready.len(), 2, "both round-one winners-bracket matches are immediately playable");
        for id in &ready {
            t.start_match(*id).unwrap();
        }
        assert!(t.matches_ready_to_start().is_empty(), "already-started matches drop out of the ready list");
    }
}
