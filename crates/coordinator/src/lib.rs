//! Client protocol dispatch, the bot driver, and match/tournament orchestration
//! glue, kept transport-agnostic so `tc-server` is free to bridge it over
//! whatever socket technology it likes.
//!
//! ## Submodules
//!
//! - [`protocol`] — wire-facing [`protocol::ClientMessage`] / [`protocol::ServerMessage`]
//! - [`coordinator`] — [`coordinator::Coordinator`], the command dispatcher
//! - [`bot_driver`] — bot move scheduling with a perceptual delay
pub mod bot_driver;
pub mod coordinator;
pub mod protocol;

pub use coordinator::Coordinator;
pub use protocol::ClientMessage;
pub use protocol::Outbox;
pub use protocol::Recipient;
pub use protocol::ServerMessage;
