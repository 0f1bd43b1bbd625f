//! The shared table.
//!
//! `Table` owns the slot↔card layout and the per-slot token sets that every
//! player writes concurrently. See `grid` for the locking rules.

mod grid;

pub use grid::{Table, TokenToggle, Tokens};
