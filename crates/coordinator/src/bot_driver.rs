use std::time::Duration;

use tc_bots::BotLevel;
use tc_engines::GameMove;
use tc_engines::GameState;
use tc_core::Role;

/// Perceptual pause before a bot's move is submitted, so spectators can
/// follow along instead of seeing the game resolve instantly (§4.6).
pub const BOT_MOVE_DELAY: Duration = Duration::from_millis(200);

/// Pause between games within a match, so the result of the last game is
/// legible before the next one's board appears.
pub const INTER_GAME_PAUSE: Duration = Duration::from_secs(1);

/// Re-exported so callers reaching for the bot-driving constants find the
/// move-count safety cap here too; the cap itself is enforced by
/// `GameSession::submit_move`, which owns the move log it's counting.
pub use tc_session::MAX_MOVES_PER_SESSION;

/// Asks the bot policy for its next move, given the active session's state
/// and whichever role is to move.
pub fn next_move(state: &GameState, role: Role, level: BotLevel) -> Option<GameMove> {
    tc_bots::choose_move(state.game_id(), state, role, level)
}

/// Runs the bot's delay and returns its chosen move, or `None` if there was
/// no legal move (the caller should not submit anything in that case).
pub async fn delayed_move(state: GameState, role: Role, level: BotLevel) -> Option<GameMove> {
    tokio::time::sleep(BOT_MOVE_DELAY).await;
    next_move(&state, role, level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_engines::GameId;

    #[tokio::test]
    async fn delayed_move_returns_a_legal_move() {
        let state = GameId::Nex.initial_state(Role::P1);
        let mv = delayed_move(state, Role::P1, BotLevel::Basic).await;
        assert!(mv.is_some());
    }
}
