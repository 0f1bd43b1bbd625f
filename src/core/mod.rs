//! Core engine types: ids, players, RNG, configuration, errors.
//!
//! Everything here is independent of the table/player/dealer protocol.

pub mod ids;
pub mod player;
pub mod rng;
pub mod config;
pub mod error;
pub(crate) mod sync;

pub use ids::{CardId, SlotId};
pub use player::{PlayerId, PlayerKind, PlayerMap};
pub use rng::GameRng;
pub use config::GameConfig;
pub use error::{ConfigError, GameError, Result};
