//! The visual surface the engine reports to.
//!
//! The engine never draws anything. Every visible change (a card dealt, a
//! token placed, a score, the countdown) goes through `UserInterface`,
//! which the table, players and dealer call from their own threads.
//!
//! Two implementations ship with the crate:
//! - `TracingInterface`: renders every event as a log line
//! - `RecordingInterface`: keeps every event for later inspection

mod logging;
mod recording;

use std::time::Duration;

use crate::core::{CardId, PlayerId, SlotId};

pub use logging::TracingInterface;
pub use recording::{RecordingInterface, UiEvent};

/// Display callbacks.
///
/// Calls arrive concurrently from every game thread and must not block for
/// long: the table calls them while holding a slot lock.
pub trait UserInterface: Send + Sync {
    /// A card was dealt to a slot.
    fn place_card(&self, card: CardId, slot: SlotId);

    /// The card at a slot was taken away.
    fn remove_card(&self, slot: SlotId);

    /// A player put a token on a slot.
    fn place_token(&self, player: PlayerId, slot: SlotId);

    /// A player's token left a slot.
    fn remove_token(&self, player: PlayerId, slot: SlotId);

    /// A player's score changed.
    fn set_score(&self, player: PlayerId, score: u32);

    /// Time left in the round. `warn` is set below the warning threshold.
    fn set_countdown(&self, remaining: Duration, warn: bool);

    /// Time left in a player's freeze. Zero clears it.
    fn set_freeze(&self, player: PlayerId, remaining: Duration);

    /// The game is over.
    fn announce_winners(&self, winners: &[PlayerId]);
}

/// Interface that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullInterface;

impl UserInterface for NullInterface {
    fn place_card(&self, _card: CardId, _slot: SlotId) {}
    fn remove_card(&self, _slot: SlotId) {}
    fn place_token(&self, _player: PlayerId, _slot: SlotId) {}
    fn remove_token(&self, _player: PlayerId, _slot: SlotId) {}
    fn set_score(&self, _player: PlayerId, _score: u32) {}
    fn set_countdown(&self, _remaining: Duration, _warn: bool) {}
    fn set_freeze(&self, _player: PlayerId, _remaining: Duration) {}
    fn announce_winners(&self, _winners: &[PlayerId]) {}
}
