//! One playing of one game inside a match, and the best-of-three controller
//! that strings three of them together.
//!
//! ## Submodules
//!
//! - [`session`] — [`session::GameSession`], wraps a single engine instance
//! - [`match_controller`] — [`match_controller::Match`], best-of-three orchestration
mod match_controller;
mod session;

/// `SystemTime` has no native `serde` impl; sessions carry it as an RFC3339
/// string at the wire boundary, matching the teacher's own persisted-record
/// timestamps.
mod timestamp {
    use chrono::DateTime;
    use chrono::Utc;
    use serde::Deserialize;
    use serde::Serialize;
    use std::time::SystemTime;

    pub fn serialize<S>(at: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        DateTime::<Utc>::from(*at).to_rfc3339().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let at = DateTime::parse_from_rfc3339(&s).map_err(serde::de::Error::custom)?;
        Ok(SystemTime::from(at.with_timezone(&Utc)))
    }
}

pub use match_controller::Bracket;
pub use match_controller::Match;
pub use match_controller::MatchPhase;
pub use match_controller::MoveEffect;
pub use session::GameSession;
pub use session::MAX_MOVES_PER_SESSION;
pub use session::MoveRecord;
pub use session::SubmitOutcome;
