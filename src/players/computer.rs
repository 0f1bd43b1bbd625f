//! Key-press generator for computer players.

use std::time::Duration;

use tracing::debug;

use super::player::Player;
use crate::core::{GameRng, SlotId};

/// How long the generator waits for queue room before re-checking
/// termination.
const ROOM_POLL: Duration = Duration::from_millis(20);

/// Feed random slot presses into `player` until it terminates.
///
/// Presses go through the same queue as human input, so a computer player is
/// frozen, rate-limited and ignored exactly like a human one.
pub(crate) fn generate_presses(player: &Player, mut rng: GameRng) {
    let slots = player.table_size();
    if slots == 0 {
        return;
    }

    let mut presses = 0u64;
    while !player.is_terminated() {
        if player.wait_for_room(ROOM_POLL) {
            let slot = SlotId(rng.gen_range_usize(0..slots));
            if player.key_pressed(slot) {
                presses += 1;
            }
        }
    }
    debug!(player = %player.id(), presses, "press generator stopped");
}
