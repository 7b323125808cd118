//! Core identifiers, roles, and error codes shared across the tournament
//! coordinator workspace.
#![allow(dead_code)]

use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Unique identifier trait for domain entities.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

/// Generic ID wrapper providing compile-time type safety over `uuid::Uuid`.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast ID<T> to ID<U> while preserving the underlying UUID.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self::from(uuid::Uuid::deserialize(deserializer)?))
    }
}

/// Phantom markers for [`ID`], one per domain entity. Entities living in
/// different crates (e.g. `Match` in `tc-session`, `Tournament` in
/// `tc-tournament`) would otherwise force a dependency cycle just to name
/// an `ID<Match>` from `tc-core`; tagging by marker instead of by the real
/// type sidesteps that.
pub struct PlayerTag;
pub struct TournamentTag;
pub struct MatchTag;
pub struct SessionTag;
pub struct ConnectionTag;

pub type PlayerId = ID<PlayerTag>;
pub type TournamentId = ID<TournamentTag>;
pub type MatchId = ID<MatchTag>;
pub type SessionId = ID<SessionTag>;
pub type ConnectionId = ID<ConnectionTag>;

/// A registered participant in a tournament. Bots are permanently online and
/// never acquire a connection.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub class: Option<String>,
    pub online: bool,
    pub is_bot: bool,
}

impl Player {
    pub fn human(name: impl Into<String>, class: Option<String>) -> Self {
        Self {
            id: ID::default(),
            name: name.into(),
            class,
            online: true,
            is_bot: false,
        }
    }

    pub fn bot(name: impl Into<String>) -> Self {
        Self {
            id: ID::default(),
            name: name.into(),
            class: None,
            online: true,
            is_bot: true,
        }
    }
}

impl Unique<PlayerTag> for Player {
    fn id(&self) -> PlayerId {
        self.id
    }
}

/// A player's side in a one-on-one game or match. `P1` is always the mover
/// who acts first in game 1 of a match.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Role {
    P1,
    P2,
}

impl Role {
    pub fn other(self) -> Role {
        match self {
            Role::P1 => Role::P2,
            Role::P2 => Role::P1,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::P1 => write!(f, "p1"),
            Role::P2 => write!(f, "p2"),
        }
    }
}

/// Result of a finished game: which role won, a draw, or nobody (bye).
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Outcome {
    P1,
    P2,
    Draw,
    None,
}

impl Outcome {
    pub fn of(role: Role) -> Outcome {
        match role {
            Role::P1 => Outcome::P1,
            Role::P2 => Outcome::P2,
        }
    }
    pub fn role(self) -> Option<Role> {
        match self {
            Outcome::P1 => Some(Role::P1),
            Outcome::P2 => Some(Role::P2),
            Outcome::Draw | Outcome::None => None,
        }
    }
}

/// Canonical protocol error codes surfaced to clients (§6/§7).
#[derive(Debug, Clone, Copy, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    JoinFailed,
    NotInTournament,
    MatchNotFound,
    NotInMatch,
    NoActiveGame,
    InvalidMove,
    ParseError,
    UnknownMessage,
    RegistrationClosed,
    NotYourTurn,
    GameFinished,
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "UNKNOWN".to_string());
        write!(f, "{}", s)
    }
}

impl std::error::Error for ErrorCode {}

/// Initializes process-wide logging. Mirrors the ambient logging setup of
/// sibling crates; call once from a binary's `main`.
#[cfg(feature = "server")]
pub fn init_logging(verbosity: log::LevelFilter) {
    use simplelog::ColorChoice;
    use simplelog::Config;
    use simplelog::TermLogger;
    use simplelog::TerminalMode;
    let _ = TermLogger::init(
        verbosity,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_other_is_involutive() {
        assert_eq!(Role::P1.other(), Role::P2);
        assert_eq!(Role::P2.other(), Role::P1);
        assert_eq!(Role::P1.other().other(), Role::P1);
    }

    #[test]
    fn id_cast_preserves_uuid() {
        struct A;
        struct B;
        let a: ID<A> = ID::default();
        let uuid = a.inner();
        let b: ID<B> = a.cast();
        assert_eq!(b.inner(), uuid);
    }

    #[test]
    fn bot_players_are_permanently_online() {
        let bot = Player::bot("zerotemp");
        assert!(bot.is_bot);
        assert!(bot.online);
    }

    #[test]
    fn outcome_of_role_roundtrips() {
        assert_eq!(Outcome::of(Role::P1).role(), Some(Role::P1));
        assert_eq!(Outcome::of(Role::P2).role(), Some(Role::P2));
        assert_eq!(Outcome::Draw.role(), None);
        assert_eq!(Outcome::None.role(), None);
    }
}
