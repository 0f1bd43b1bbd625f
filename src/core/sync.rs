//! Lock helpers shared by the table, players and dealer.
//!
//! A panic on one game thread must not wedge the others, so poisoned locks
//! are recovered instead of propagated. Every critical section in the crate
//! leaves its data consistent before any call that could panic.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wait on `condvar` until `done` holds or `deadline` passes.
///
/// Returns the guard and whether `done` held on return.
pub(crate) fn wait_until<'a, T>(
    condvar: &Condvar,
    mut guard: MutexGuard<'a, T>,
    deadline: Instant,
    mut done: impl FnMut(&mut T) -> bool,
) -> (MutexGuard<'a, T>, bool) {
    loop {
        if done(&mut *guard) {
            return (guard, true);
        }
        let now = Instant::now();
        if now >= deadline {
            return (guard, false);
        }
        guard = condvar
            .wait_timeout(guard, deadline - now)
            .map(|(guard, _)| guard)
            .unwrap_or_else(|poisoned| poisoned.into_inner().0);
    }
}

/// Wait on `condvar` for at most `timeout`, until `done` holds.
pub(crate) fn wait_for<'a, T>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
    timeout: Duration,
    done: impl FnMut(&mut T) -> bool,
) -> (MutexGuard<'a, T>, bool) {
    wait_until(condvar, guard, Instant::now() + timeout, done)
}
