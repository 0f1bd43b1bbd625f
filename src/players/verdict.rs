//! The dealer's answer to a claim, and the rendezvous a claiming player
//! blocks on until it arrives.

use std::sync::{Condvar, Mutex, PoisonError};

use crate::core::sync::lock;

/// Outcome of adjudicating a player's three cards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verdict {
    /// Released without adjudication.
    #[default]
    Unset,
    Legal,
    Illegal,
}

#[derive(Debug, Default)]
struct Ticket {
    awaiting: bool,
    verdict: Verdict,
    closed: bool,
}

/// One player's verdict slot.
///
/// The player arms it before claiming and blocks in `wait`; the dealer
/// fills it with `release`. Closing it releases any waiter for good.
#[derive(Debug, Default)]
pub struct VerdictSlot {
    ticket: Mutex<Ticket>,
    released: Condvar,
}

impl VerdictSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare for a claim: clear any stale verdict.
    pub fn arm(&self) {
        let mut ticket = lock(&self.ticket);
        ticket.awaiting = true;
        ticket.verdict = Verdict::Unset;
    }

    /// Cancel an armed claim that was never queued.
    pub fn disarm(&self) {
        lock(&self.ticket).awaiting = false;
    }

    /// Deliver `verdict` and wake the waiting player.
    pub fn release(&self, verdict: Verdict) {
        let mut ticket = lock(&self.ticket);
        ticket.verdict = verdict;
        ticket.awaiting = false;
        self.released.notify_all();
    }

    /// Block until released or closed, then take the verdict, leaving the
    /// slot `Unset`.
    pub fn wait(&self) -> Verdict {
        let guard = lock(&self.ticket);
        let mut ticket = self
            .released
            .wait_while(guard, |t| t.awaiting && !t.closed)
            .unwrap_or_else(PoisonError::into_inner);
        ticket.awaiting = false;
        std::mem::take(&mut ticket.verdict)
    }

    /// Whether a claim is armed and unanswered.
    #[must_use]
    pub fn is_awaiting(&self) -> bool {
        lock(&self.ticket).awaiting
    }

    /// Release every current and future waiter.
    pub fn close(&self) {
        let mut ticket = lock(&self.ticket);
        ticket.closed = true;
        self.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_release_before_wait() {
        let slot = VerdictSlot::new();
        slot.arm();
        assert!(slot.is_awaiting());
        slot.release(Verdict::Legal);
        assert!(!slot.is_awaiting());
        assert_eq!(slot.wait(), Verdict::Legal);
    }

    #[test]
    fn test_wait_resets_verdict() {
        let slot = VerdictSlot::new();
        slot.arm();
        slot.release(Verdict::Illegal);
        assert_eq!(slot.wait(), Verdict::Illegal);

        slot.arm();
        slot.release(Verdict::Unset);
        assert_eq!(slot.wait(), Verdict::Unset);
    }

    #[test]
    fn test_release_wakes_waiter() {
        let slot = Arc::new(VerdictSlot::new());
        slot.arm();
        let remote = Arc::clone(&slot);

        let handle = thread::spawn(move || remote.wait());
        thread::sleep(Duration::from_millis(20));
        slot.release(Verdict::Legal);

        assert_eq!(handle.join().unwrap(), Verdict::Legal);
    }

    #[test]
    fn test_close_releases_without_verdict() {
        let slot = Arc::new(VerdictSlot::new());
        slot.arm();
        let remote = Arc::clone(&slot);

        let handle = thread::spawn(move || remote.wait());
        thread::sleep(Duration::from_millis(20));
        slot.close();

        assert_eq!(handle.join().unwrap(), Verdict::Unset);
    }
}
