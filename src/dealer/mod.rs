//! The dealer and the state it owns: the deck and the claim board.

mod claims;
mod deck;
mod round;

pub use claims::ClaimBoard;
pub use deck::{CardLocation, Deck};
pub use round::{Dealer, Terminator};
