//! Card and slot identifiers.
//!
//! ## Id Layout
//!
//! - `CardId`: `0..deck_size`. The id alone determines the card's features,
//!   see [`crate::cards::FeatureOracle`].
//! - `SlotId`: `0..rows * columns`, row-major over the table grid.
//!
//! ```
//! use rust_set::core::{CardId, SlotId};
//!
//! let card = CardId::new(80);
//! assert_eq!(card.index(), 80);
//!
//! let slot = SlotId::from_grid(1, 2, 4);
//! assert_eq!(slot, SlotId::new(6));
//! assert_eq!(slot.row(4), 1);
//! assert_eq!(slot.column(4), 2);
//! ```

use serde::{Deserialize, Serialize};

/// Identifier of a card in the deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index into per-card tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over every card of a deck with `deck_size` cards.
    pub fn all(deck_size: usize) -> impl Iterator<Item = CardId> {
        (0..deck_size as u32).map(CardId)
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// A fixed position on the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(pub usize);

impl SlotId {
    /// Create a new slot ID.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Slot at `row`/`column` of a grid with `columns` columns.
    #[must_use]
    pub const fn from_grid(row: usize, column: usize, columns: usize) -> Self {
        Self(row * columns + column)
    }

    /// Get the raw slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Grid row of this slot.
    #[must_use]
    pub const fn row(self, columns: usize) -> usize {
        self.0 / columns
    }

    /// Grid column of this slot.
    #[must_use]
    pub const fn column(self, columns: usize) -> usize {
        self.0 % columns
    }

    /// Iterate over every slot of a table with `table_size` slots.
    pub fn all(table_size: usize) -> impl Iterator<Item = SlotId> {
        (0..table_size).map(SlotId)
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Slot({})", self.0)
    }
}
