use std::time::Duration;

use tracing::{debug, info, trace};

use super::UserInterface;
use crate::core::{CardId, PlayerId, SlotId};

/// Renders the game as log lines under the `rust_set::ui` target.
///
/// Card and score changes log at `debug`, token and timer traffic at
/// `trace`, winners at `info`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingInterface;

impl UserInterface for TracingInterface {
    fn place_card(&self, card: CardId, slot: SlotId) {
        debug!(target: "rust_set::ui", %card, %slot, "card placed");
    }

    fn remove_card(&self, slot: SlotId) {
        debug!(target: "rust_set::ui", %slot, "card removed");
    }

    fn place_token(&self, player: PlayerId, slot: SlotId) {
        trace!(target: "rust_set::ui", %player, %slot, "token placed");
    }

    fn remove_token(&self, player: PlayerId, slot: SlotId) {
        trace!(target: "rust_set::ui", %player, %slot, "token removed");
    }

    fn set_score(&self, player: PlayerId, score: u32) {
        debug!(target: "rust_set::ui", %player, score, "score");
    }

    fn set_countdown(&self, remaining: Duration, warn: bool) {
        trace!(target: "rust_set::ui", remaining_ms = remaining.as_millis() as u64, warn, "countdown");
    }

    fn set_freeze(&self, player: PlayerId, remaining: Duration) {
        trace!(target: "rust_set::ui", %player, remaining_ms = remaining.as_millis() as u64, "freeze");
    }

    fn announce_winners(&self, winners: &[PlayerId]) {
        let names: Vec<String> = winners.iter().map(ToString::to_string).collect();
        info!(target: "rust_set::ui", winners = ?names, "game over");
    }
}
