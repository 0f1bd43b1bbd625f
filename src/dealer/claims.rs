//! Claims waiting for the dealer.
//!
//! Players that hold three cards push their id here and block. The dealer
//! pops the most recent claim first. A player can have at most one claim
//! in flight: the flag is set in the same critical section as the push and
//! cleared by the dealer before it releases the player.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::core::sync::{lock, wait_for};
use crate::core::PlayerId;

#[derive(Debug, Default)]
struct Claims {
    stack: Vec<PlayerId>,
    in_flight: FxHashSet<PlayerId>,
    closed: bool,
}

/// LIFO claim stack plus the running maximum score.
#[derive(Debug, Default)]
pub struct ClaimBoard {
    claims: Mutex<Claims>,
    wake: Condvar,
    max_score: AtomicU32,
}

impl ClaimBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a claim and wake the dealer.
    ///
    /// Returns false if the player already has a claim in flight or the
    /// board is closed.
    pub fn submit(&self, player: PlayerId) -> bool {
        let mut claims = lock(&self.claims);
        if claims.closed || !claims.in_flight.insert(player) {
            return false;
        }
        claims.stack.push(player);
        trace!(%player, depth = claims.stack.len(), "claim submitted");
        self.wake.notify_all();
        true
    }

    /// Pop the most recent claim, waiting up to `timeout` for one.
    ///
    /// The popped player stays in flight until `finish`.
    pub fn next_claim(&self, timeout: Duration) -> Option<PlayerId> {
        let guard = lock(&self.claims);
        let (mut claims, _) = wait_for(&self.wake, guard, timeout, |c| c.closed || !c.stack.is_empty());
        claims.stack.pop()
    }

    /// Clear a player's in-flight flag.
    pub fn finish(&self, player: PlayerId) {
        lock(&self.claims).in_flight.remove(&player);
    }

    /// Whether a player has a claim queued or being adjudicated.
    #[must_use]
    pub fn is_in_flight(&self, player: PlayerId) -> bool {
        lock(&self.claims).in_flight.contains(&player)
    }

    /// Queued claims, oldest first.
    #[must_use]
    pub fn pending(&self) -> Vec<PlayerId> {
        lock(&self.claims).stack.clone()
    }

    /// Refuse further claims and hand back every queued one.
    pub fn close(&self) -> Vec<PlayerId> {
        let mut claims = lock(&self.claims);
        claims.closed = true;
        claims.in_flight.clear();
        self.wake.notify_all();
        std::mem::take(&mut claims.stack)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        lock(&self.claims).closed
    }

    /// Raise the running maximum score.
    pub fn record_score(&self, score: u32) {
        self.max_score.fetch_max(score, Ordering::AcqRel);
    }

    /// Highest score reached by any player so far.
    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.max_score.load(Ordering::Acquire)
    }
}
