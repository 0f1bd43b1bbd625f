//! Pending key presses of one player.
//!
//! The input surface (or a computer player's generator) pushes slots; the
//! player thread takes the most recent one. The queue holds at most
//! `CAPACITY` presses; extra presses are dropped rather than blocking the
//! caller. While the player is frozen the queue refuses input.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use smallvec::SmallVec;

use crate::core::sync::{lock, wait_for};
use crate::core::SlotId;

/// Maximum number of unconsumed presses.
pub const CAPACITY: usize = 3;

#[derive(Debug)]
struct Pending {
    slots: SmallVec<[SlotId; CAPACITY]>,
    accepting: bool,
    closed: bool,
}

/// Bounded press queue with blocking, timed takes.
#[derive(Debug)]
pub struct InputQueue {
    pending: Mutex<Pending>,
    changed: Condvar,
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InputQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Pending {
                slots: SmallVec::new(),
                accepting: true,
                closed: false,
            }),
            changed: Condvar::new(),
        }
    }

    /// Queue a press. Returns false if the queue is full, refusing input,
    /// or closed.
    pub fn push(&self, slot: SlotId) -> bool {
        let mut pending = lock(&self.pending);
        if pending.closed || !pending.accepting || pending.slots.len() >= CAPACITY {
            return false;
        }
        pending.slots.push(slot);
        self.changed.notify_all();
        true
    }

    /// Take the most recently queued press, waiting up to `timeout` for one.
    ///
    /// Older presses stay queued.
    pub fn take_latest(&self, timeout: Duration) -> Option<SlotId> {
        let guard = lock(&self.pending);
        let (mut pending, _) = wait_for(&self.changed, guard, timeout, |p| p.closed || !p.slots.is_empty());
        if pending.closed {
            return None;
        }
        let slot = pending.slots.pop();
        if slot.is_some() {
            self.changed.notify_all();
        }
        slot
    }

    /// Wait up to `timeout` until a press could be queued.
    pub fn wait_for_room(&self, timeout: Duration) -> bool {
        let guard = lock(&self.pending);
        let (pending, _) = wait_for(&self.changed, guard, timeout, |p| {
            p.closed || (p.accepting && p.slots.len() < CAPACITY)
        });
        !pending.closed && pending.accepting && pending.slots.len() < CAPACITY
    }

    /// Sleep for `timeout`, waking early only if the queue is closed.
    pub fn sleep(&self, timeout: Duration) {
        let guard = lock(&self.pending);
        let _ = wait_for(&self.changed, guard, timeout, |p| p.closed);
    }

    /// Drop every queued press.
    pub fn clear(&self) {
        let mut pending = lock(&self.pending);
        pending.slots.clear();
        self.changed.notify_all();
    }

    /// Start or stop accepting presses. Stopping drops queued presses.
    pub fn set_accepting(&self, accepting: bool) {
        let mut pending = lock(&self.pending);
        pending.accepting = accepting;
        if !accepting {
            pending.slots.clear();
        }
        self.changed.notify_all();
    }

    /// Refuse input for good and wake every waiter.
    pub fn close(&self) {
        let mut pending = lock(&self.pending);
        pending.closed = true;
        pending.slots.clear();
        self.changed.notify_all();
    }

    /// Number of queued presses.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.pending).slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    const SHORT: Duration = Duration::from_millis(10);

    #[test]
    fn test_latest_press_wins() {
        let queue = InputQueue::new();
        assert!(queue.push(SlotId(1)));
        assert!(queue.push(SlotId(2)));
        assert!(queue.push(SlotId(3)));

        assert_eq!(queue.take_latest(SHORT), Some(SlotId(3)));
        assert_eq!(queue.take_latest(SHORT), Some(SlotId(2)));
        assert_eq!(queue.take_latest(SHORT), Some(SlotId(1)));
        assert_eq!(queue.take_latest(SHORT), None);
    }

    #[test]
    fn test_capacity() {
        let queue = InputQueue::new();
        for i in 0..CAPACITY {
            assert!(queue.push(SlotId(i)));
        }
        assert!(!queue.push(SlotId(9)));
        assert_eq!(queue.len(), CAPACITY);
        assert!(!queue.wait_for_room(SHORT));

        queue.take_latest(SHORT);
        assert!(queue.wait_for_room(SHORT));
    }

    #[test]
    fn test_not_accepting_drops_input() {
        let queue = InputQueue::new();
        queue.push(SlotId(1));
        queue.set_accepting(false);

        assert!(queue.is_empty());
        assert!(!queue.push(SlotId(2)));
        assert!(!queue.wait_for_room(SHORT));

        queue.set_accepting(true);
        assert!(queue.push(SlotId(2)));
    }

    #[test]
    fn test_clear() {
        let queue = InputQueue::new();
        queue.push(SlotId(1));
        queue.push(SlotId(2));
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_take_wakes_on_push() {
        let queue = Arc::new(InputQueue::new());
        let remote = Arc::clone(&queue);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.push(SlotId(5));
        });

        assert_eq!(queue.take_latest(Duration::from_secs(5)), Some(SlotId(5)));
        handle.join().unwrap();
    }

    #[test]
    fn test_close_wakes_sleepers() {
        let queue = Arc::new(InputQueue::new());
        let remote = Arc::clone(&queue);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.close();
        });

        let start = Instant::now();
        queue.sleep(Duration::from_secs(5));
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(!queue.push(SlotId(0)));
        assert_eq!(queue.take_latest(SHORT), None);
        handle.join().unwrap();
    }
}
