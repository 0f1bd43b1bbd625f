//! # rust-set
//!
//! A concurrent engine for Set: players race to spot three cards on a shared
//! table whose features are, one by one, all equal or all different.
//!
//! ## Design Principles
//!
//! 1. **One Authority**: Only the dealer deals, removes and adjudicates.
//!    Players touch nothing but their own tokens.
//!
//! 2. **Races Are No-ops**: A press on a slot that is being cleared, or a
//!    claim whose cards were taken by a faster player, resolves to nothing.
//!    No error crosses component boundaries while a game runs.
//!
//! 3. **Bounded Waits**: Every blocking wait has a timeout or a wake-up on
//!    termination, so the countdown stays live and shutdown is prompt.
//!
//! ## Architecture
//!
//! - **Per-slot locks**: Each table slot has its own lock. A player's
//!   selection lock is always taken before a slot lock, and a slot lock
//!   before the card index.
//!
//! - **LIFO claims**: Players with three cards push a claim and block. The
//!   dealer serves the newest claim first and releases each claimant with
//!   a verdict.
//!
//! - **Seeded streams**: One game seed fixes every shuffle and every
//!   computer player's presses.
//!
//! ## Modules
//!
//! - `core`: Ids, players, RNG, configuration, errors
//! - `cards`: Set legality (`SetOracle`, `FeatureOracle`)
//! - `table`: The shared grid of slots, cards and tokens
//! - `players`: Input queues, selections, claims and freezes
//! - `dealer`: Deck, claim board and the round loop
//! - `ui`: The display surface the engine reports to
//! - `game`: Launching a game on its own threads

pub mod core;
pub mod cards;
pub mod table;
pub mod players;
pub mod dealer;
pub mod ui;
pub mod game;

// Re-export commonly used types
pub use crate::core::{
    CardId, SlotId, PlayerId, PlayerKind, PlayerMap,
    GameRng, GameConfig, ConfigError, GameError,
};

pub use crate::cards::{FeatureOracle, SetOracle};
pub use crate::table::Table;
pub use crate::players::{Player, PlayerPhase, Verdict};
pub use crate::dealer::{Dealer, Deck, Terminator};
pub use crate::ui::{UserInterface, NullInterface, TracingInterface, RecordingInterface};
pub use crate::game::{Game, GameHandle};
