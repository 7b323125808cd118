use tc_core::ErrorCode;
use tc_core::MatchId;
use tc_core::PlayerId;
use tc_core::Role;
use tc_core::TournamentId;
use tc_engines::GameId;
use tc_engines::GameMove;
use tc_engines::GameState;

/// Messages accepted from a connected client (§6 Client → core).
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinTournament {
        game_id: GameId,
        player_name: String,
        class_id: Option<String>,
        player_id: Option<PlayerId>,
    },
    ReadyForMatch {
        match_id: MatchId,
    },
    SubmitMove {
        match_id: MatchId,
        game_number: u8,
        #[serde(rename = "move")]
        mv: GameMove,
    },
    LeaveTournament,
}

/// A player in the tournament's current standing, for `tournament_end`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Standing {
    pub rank: u32,
    pub player_id: PlayerId,
    pub player_name: String,
}

/// Messages the core emits back to clients (§6 Core → client).
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        player_id: PlayerId,
        tournament_id: TournamentId,
    },
    TournamentStateUpdate {
        tournament_id: TournamentId,
        phase: tc_tournament::TournamentPhase,
        player_count: usize,
    },
    MatchAssigned {
        match_id: MatchId,
        opponent_name: Option<String>,
    },
    GameStart {
        match_id: MatchId,
        game_number: u8,
        your_role: Role,
    },
    GameStateUpdate {
        match_id: MatchId,
        your_turn: bool,
        last_move: Option<GameMove>,
        last_move_by: Option<PlayerId>,
    },
    GameEnd {
        match_id: MatchId,
        winner_id: Option<PlayerId>,
        winner_role: tc_core::Outcome,
        is_draw: bool,
        final_state: GameState,
        match_score: (u8, u8),
    },
    MatchEnd {
        match_id: MatchId,
        winner_id: Option<PlayerId>,
        winner_name: Option<String>,
        final_score: (u8, u8),
        you_won: bool,
        eliminated_from_tournament: bool,
        next_match_id: Option<MatchId>,
    },
    TournamentEnd {
        champion_id: Option<PlayerId>,
        champion_name: Option<String>,
        final_standings: Vec<Standing>,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
    Info {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(code: ErrorCode) -> Self {
        Self::Error {
            message: code.to_string(),
            code,
        }
    }
}

/// Who a [`ServerMessage`] is addressed to; `tc-server` resolves this against
/// its own connection registry.
#[derive(Debug, Clone, Copy)]
pub enum Recipient {
    Player(PlayerId),
    Tournament(TournamentId),
}

pub type Outbox = Vec<(Recipient, ServerMessage)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_tournament_parses_from_wire_shape() {
        let json = serde_json::json!({
            "type": "join_tournament",
            "game_id": "nex",
            "player_name": "alice",
        });
        let msg: ClientMessage = serde_json::from_value(json).unwrap();
        assert!(matches!(msg, ClientMessage::JoinTournament { game_id: GameId::Nex, .. }));
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let json = serde_json::json!({ "type": "not_a_real_message" });
        assert!(serde_json::from_value::<ClientMessage>(json).is_err());
    }
}
