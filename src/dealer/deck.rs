//! The dealer's private card piles.
//!
//! Every card is in exactly one place: the deck, on the table, burned (part
//! of a legal set), or set aside (cleared from the table at a round end).
//! The deck only tracks the three piles it owns; a card in none of them is
//! on the table.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::core::{CardId, GameRng};

/// Where a card currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CardLocation {
    Deck,
    Table,
    Burned,
    SetAside,
}

/// Undealt cards plus the burned and set-aside piles.
#[derive(Clone, Debug, Default)]
pub struct Deck {
    cards: VecDeque<CardId>,
    burned: FxHashSet<CardId>,
    set_aside: FxHashSet<CardId>,
    deck_size: usize,
}

impl Deck {
    /// A full, unshuffled deck of `deck_size` cards.
    #[must_use]
    pub fn new(deck_size: usize) -> Self {
        Self {
            cards: CardId::all(deck_size).collect(),
            burned: FxHashSet::default(),
            set_aside: FxHashSet::default(),
            deck_size,
        }
    }

    /// A deck holding exactly `cards`, in draw order. Every other card of a
    /// `deck_size` deck counts as set aside.
    #[must_use]
    pub fn from_cards(deck_size: usize, cards: impl IntoIterator<Item = CardId>) -> Self {
        let cards: VecDeque<CardId> = cards.into_iter().collect();
        let set_aside = CardId::all(deck_size).filter(|c| !cards.contains(c)).collect();
        Self {
            cards,
            burned: FxHashSet::default(),
            set_aside,
            deck_size,
        }
    }

    pub fn shuffle(&mut self, rng: &mut GameRng) {
        rng.shuffle(self.cards.make_contiguous());
    }

    /// Take the top card.
    pub fn draw(&mut self) -> Option<CardId> {
        self.cards.pop_front()
    }

    /// Take a specific card out of the deck, if it is there.
    pub fn remove(&mut self, card: CardId) -> bool {
        match self.cards.iter().position(|c| *c == card) {
            Some(index) => {
                self.cards.remove(index);
                true
            }
            None => false,
        }
    }

    /// Record a card from a legal set. It never comes back.
    pub fn burn(&mut self, card: CardId) {
        self.remove(card);
        self.set_aside.remove(&card);
        self.burned.insert(card);
    }

    /// Record a card cleared from the table at the end of a round.
    pub fn set_aside(&mut self, card: CardId) {
        if !self.burned.contains(&card) {
            self.remove(card);
            self.set_aside.insert(card);
        }
    }

    #[must_use]
    pub fn is_burned(&self, card: CardId) -> bool {
        self.burned.contains(&card)
    }

    /// Cards left to deal.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn burned_count(&self) -> usize {
        self.burned.len()
    }

    #[must_use]
    pub fn set_aside_count(&self) -> usize {
        self.set_aside.len()
    }

    /// Undealt cards in draw order.
    #[must_use]
    pub fn cards(&self) -> Vec<CardId> {
        self.cards.iter().copied().collect()
    }

    /// Where `card` is. `None` for ids outside the deck.
    #[must_use]
    pub fn location(&self, card: CardId) -> Option<CardLocation> {
        if card.index() >= self.deck_size {
            None
        } else if self.burned.contains(&card) {
            Some(CardLocation::Burned)
        } else if self.set_aside.contains(&card) {
            Some(CardLocation::SetAside)
        } else if self.cards.contains(&card) {
            Some(CardLocation::Deck)
        } else {
            Some(CardLocation::Table)
        }
    }
}
