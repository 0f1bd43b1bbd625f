//! Players: input queues, selections, claims and freezes.
//!
//! Each player runs on its own thread. Human players are fed through
//! `Player::key_pressed`; computer players also own a generator thread that
//! presses random slots through the same queue.

pub mod input;
pub mod verdict;
mod computer;
mod player;

pub use input::InputQueue;
pub use player::{Player, PlayerPhase, Selection, SET_SIZE};
pub use verdict::{Verdict, VerdictSlot};
