//! The shared table: which card lies in which slot, and whose tokens are on it.
//!
//! Every slot is guarded by its own lock, so players marking different slots
//! never contend, while the dealer clearing a slot excludes any token write
//! on that same slot. The card→slot index has a separate lock, always taken
//! after a slot lock.
//!
//! Only the dealer calls `place_card`/`remove_card`/`remove_tokens`. Players
//! only touch their own tokens, through `toggle_token`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use smallvec::SmallVec;
use tracing::{info, warn};

use crate::cards::SetOracle;
use crate::core::sync::lock;
use crate::core::{CardId, GameConfig, PlayerId, SlotId};
use crate::ui::UserInterface;

/// Player ids holding a token on one slot.
pub type Tokens = SmallVec<[PlayerId; 4]>;

#[derive(Debug, Default)]
struct Slot {
    card: Option<CardId>,
    tokens: Tokens,
}

/// Outcome of a player pressing a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenToggle {
    /// A token was placed on the slot holding this card.
    Placed(CardId),
    /// The player's token was taken off the slot holding this card.
    Removed(CardId),
    /// Nothing changed: the slot is empty, or placing was not allowed.
    Ignored,
}

/// The grid of slots shared by the dealer and every player.
///
/// ## Invariants
///
/// - `card_at(s) == Some(c)` iff `slot_of(c) == Some(s)`
/// - a slot holds at most one token per player
/// - tokens only lie on occupied slots
pub struct Table {
    slots: Vec<Mutex<Slot>>,
    card_to_slot: Mutex<Vec<Option<SlotId>>>,
    ready: AtomicBool,
    delay: Duration,
    ui: Arc<dyn UserInterface>,
}

impl Table {
    /// Create an empty table.
    ///
    /// `delay` is slept before every card placement and removal, outside
    /// any lock, to let a display animate the change.
    pub fn new(table_size: usize, deck_size: usize, delay: Duration, ui: Arc<dyn UserInterface>) -> Self {
        Self {
            slots: (0..table_size).map(|_| Mutex::default()).collect(),
            card_to_slot: Mutex::new(vec![None; deck_size]),
            ready: AtomicBool::new(false),
            delay,
            ui,
        }
    }

    /// Create an empty table shaped by a game configuration.
    pub fn from_config(config: &GameConfig, ui: Arc<dyn UserInterface>) -> Self {
        Self::new(config.table_size(), config.deck_size, config.table_delay(), ui)
    }

    /// Number of slots.
    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Whether players may act: false while the dealer is dealing.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Open or close the table to player input.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    fn slot(&self, slot: SlotId) -> Option<&Mutex<Slot>> {
        self.slots.get(slot.index())
    }

    /// Place `card` in the empty `slot`.
    ///
    /// Returns false, changing nothing, if the slot is occupied or the card
    /// already lies elsewhere.
    pub fn place_card(&self, card: CardId, slot: SlotId) -> bool {
        let Some(cell) = self.slot(slot) else {
            warn!(%slot, "place on unknown slot");
            return false;
        };
        self.simulate_delay();

        let mut cell = lock(cell);
        if cell.card.is_some() {
            warn!(%card, %slot, "place on occupied slot");
            return false;
        }
        {
            let mut index = lock(&self.card_to_slot);
            let Some(entry) = index.get_mut(card.index()) else {
                warn!(%card, %slot, "unknown card");
                return false;
            };
            if entry.is_some() {
                warn!(%card, %slot, "card is already on the table");
                return false;
            }
            *entry = Some(slot);
        }
        cell.card = Some(card);
        self.ui.place_card(card, slot);
        true
    }

    /// Take the card out of `slot`, clearing every token on it.
    ///
    /// Returns the removed card, or `None` if the slot was already empty.
    pub fn remove_card(&self, slot: SlotId) -> Option<CardId> {
        let cell = self.slot(slot)?;
        self.simulate_delay();

        let mut cell = lock(cell);
        let card = cell.card.take()?;
        for player in cell.tokens.drain(..) {
            self.ui.remove_token(player, slot);
        }
        if let Some(entry) = lock(&self.card_to_slot).get_mut(card.index()) {
            *entry = None;
        }
        self.ui.remove_card(slot);
        Some(card)
    }

    /// Put `player`'s token on `slot`.
    ///
    /// Returns false if the slot is empty or already carries this player's
    /// token.
    pub fn place_token(&self, player: PlayerId, slot: SlotId) -> bool {
        let Some(cell) = self.slot(slot) else {
            return false;
        };
        let mut cell = lock(cell);
        if cell.card.is_none() || cell.tokens.contains(&player) {
            return false;
        }
        cell.tokens.push(player);
        self.ui.place_token(player, slot);
        true
    }

    /// Take `player`'s token off `slot`.
    ///
    /// Returns whether a token was removed. Absence is not an error: it
    /// means there was nothing to undo.
    pub fn remove_token(&self, player: PlayerId, slot: SlotId) -> bool {
        let Some(cell) = self.slot(slot) else {
            return false;
        };
        let mut cell = lock(cell);
        match cell.tokens.iter().position(|&p| p == player) {
            Some(pos) => {
                cell.tokens.remove(pos);
                self.ui.remove_token(player, slot);
                true
            }
            None => false,
        }
    }

    /// Take `player`'s token off whichever slot holds `card`.
    ///
    /// Returns false if the card is not on the table or carries no token of
    /// this player.
    pub fn remove_token_from_card(&self, player: PlayerId, card: CardId) -> bool {
        match self.slot_of(card) {
            Some(slot) => {
                let mut cell = match self.slot(slot) {
                    Some(cell) => lock(cell),
                    None => return false,
                };
                // The card may have moved between the index read and the lock.
                if cell.card != Some(card) {
                    return false;
                }
                match cell.tokens.iter().position(|&p| p == player) {
                    Some(pos) => {
                        cell.tokens.remove(pos);
                        self.ui.remove_token(player, slot);
                        true
                    }
                    None => false,
                }
            }
            None => false,
        }
    }

    /// Press `slot` on behalf of `player`, atomically with respect to the
    /// dealer clearing the same slot.
    ///
    /// Removes the player's token if present. Otherwise places one, but only
    /// when `may_place` is set.
    pub fn toggle_token(&self, player: PlayerId, slot: SlotId, may_place: bool) -> TokenToggle {
        let Some(cell) = self.slot(slot) else {
            return TokenToggle::Ignored;
        };
        let mut cell = lock(cell);
        let Some(card) = cell.card else {
            return TokenToggle::Ignored;
        };

        if let Some(pos) = cell.tokens.iter().position(|&p| p == player) {
            cell.tokens.remove(pos);
            self.ui.remove_token(player, slot);
            TokenToggle::Removed(card)
        } else if may_place {
            cell.tokens.push(player);
            self.ui.place_token(player, slot);
            TokenToggle::Placed(card)
        } else {
            TokenToggle::Ignored
        }
    }

    /// Clear every token on `slot`, notifying each removal.
    pub fn remove_tokens(&self, slot: SlotId) {
        if let Some(cell) = self.slot(slot) {
            let mut cell = lock(cell);
            for player in cell.tokens.drain(..) {
                self.ui.remove_token(player, slot);
            }
        }
    }

    /// Card lying in `slot`.
    #[must_use]
    pub fn card_at(&self, slot: SlotId) -> Option<CardId> {
        self.slot(slot).and_then(|cell| lock(cell).card)
    }

    /// Slot holding `card`.
    #[must_use]
    pub fn slot_of(&self, card: CardId) -> Option<SlotId> {
        lock(&self.card_to_slot).get(card.index()).copied().flatten()
    }

    /// Players with a token on `slot`.
    #[must_use]
    pub fn tokens_at(&self, slot: SlotId) -> Tokens {
        self.slot(slot)
            .map(|cell| lock(cell).tokens.clone())
            .unwrap_or_default()
    }

    /// Number of cards on the table.
    #[must_use]
    pub fn count_cards(&self) -> usize {
        self.slots.iter().filter(|cell| lock(*cell).card.is_some()).count()
    }

    /// Slots without a card, in slot order.
    #[must_use]
    pub fn empty_slots(&self) -> Vec<SlotId> {
        SlotId::all(self.slots.len())
            .zip(&self.slots)
            .filter(|(_, cell)| lock(*cell).card.is_none())
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Cards on the table, in slot order.
    #[must_use]
    pub fn cards(&self) -> Vec<CardId> {
        self.slots.iter().filter_map(|cell| lock(cell).card).collect()
    }

    /// Slots where `player` has a token, in slot order.
    #[must_use]
    pub fn slots_with_token(&self, player: PlayerId) -> Vec<SlotId> {
        SlotId::all(self.slots.len())
            .zip(&self.slots)
            .filter(|(_, cell)| lock(*cell).tokens.contains(&player))
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Check the slot/card bijection and token placement under all locks.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let cells: Vec<_> = self.slots.iter().map(lock).collect();
        let index = lock(&self.card_to_slot);

        let forward = cells.iter().enumerate().all(|(i, cell)| match cell.card {
            Some(card) => index.get(card.index()).copied().flatten() == Some(SlotId(i)),
            None => cell.tokens.is_empty(),
        });
        let backward = index.iter().enumerate().all(|(card, slot)| match slot {
            Some(slot) => cells
                .get(slot.index())
                .is_some_and(|cell| cell.card == Some(CardId(card as u32))),
            None => true,
        });
        let unique_tokens = cells.iter().all(|cell| {
            let mut seen: Tokens = SmallVec::new();
            cell.tokens.iter().all(|p| {
                let fresh = !seen.contains(p);
                seen.push(*p);
                fresh
            })
        });

        forward && backward && unique_tokens
    }

    /// Log every legal set currently on the table.
    pub fn hints(&self, oracle: &dyn SetOracle) {
        let cards = self.cards();
        for set in oracle.find_sets(&cards, usize::MAX) {
            let mut slots: Vec<usize> = set
                .iter()
                .filter_map(|&card| self.slot_of(card).map(SlotId::index))
                .collect();
            slots.sort_unstable();
            let features: Vec<Vec<u8>> = set.iter().map(|&card| oracle.card_features(card).to_vec()).collect();
            info!(?slots, ?features, "hint: set found");
        }
    }

    fn simulate_delay(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("size", &self.slots.len())
            .field("cards", &self.count_cards())
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::FeatureOracle;
    use crate::ui::{RecordingInterface, UiEvent};
    use proptest::prelude::*;

    fn table(size: usize) -> (Table, Arc<RecordingInterface>) {
        let ui = Arc::new(RecordingInterface::new());
        (Table::new(size, 81, Duration::ZERO, ui.clone()), ui)
    }

    #[test]
    fn test_place_and_remove_card() {
        let (table, ui) = table(12);

        assert!(table.place_card(CardId(5), SlotId(3)));
        assert_eq!(table.card_at(SlotId(3)), Some(CardId(5)));
        assert_eq!(table.slot_of(CardId(5)), Some(SlotId(3)));
        assert_eq!(table.count_cards(), 1);
        assert_eq!(table.empty_slots().len(), 11);
        assert!(!table.empty_slots().contains(&SlotId(3)));

        assert_eq!(table.remove_card(SlotId(3)), Some(CardId(5)));
        assert_eq!(table.card_at(SlotId(3)), None);
        assert_eq!(table.slot_of(CardId(5)), None);
        assert_eq!(table.empty_slots().len(), 12);

        assert_eq!(
            ui.events(),
            vec![UiEvent::PlaceCard(CardId(5), SlotId(3)), UiEvent::RemoveCard(SlotId(3))]
        );
    }

    #[test]
    fn test_place_on_occupied_slot_is_rejected() {
        let (table, _) = table(12);
        assert!(table.place_card(CardId(1), SlotId(0)));
        assert!(!table.place_card(CardId(2), SlotId(0)));
        assert!(!table.place_card(CardId(1), SlotId(1)));
        assert_eq!(table.card_at(SlotId(0)), Some(CardId(1)));
        assert_eq!(table.slot_of(CardId(2)), None);
        assert!(table.is_consistent());
    }

    #[test]
    fn test_remove_empty_slot() {
        let (table, ui) = table(12);
        assert_eq!(table.remove_card(SlotId(0)), None);
        assert_eq!(table.remove_card(SlotId(99)), None);
        assert!(ui.events().is_empty());
    }

    #[test]
    fn test_remove_card_clears_tokens() {
        let (table, ui) = table(12);
        table.place_card(CardId(7), SlotId(2));
        assert!(table.place_token(PlayerId(0), SlotId(2)));
        assert!(table.place_token(PlayerId(1), SlotId(2)));

        table.remove_card(SlotId(2));

        assert!(table.tokens_at(SlotId(2)).is_empty());
        let removed: Vec<_> = ui
            .events()
            .into_iter()
            .filter(|e| matches!(e, UiEvent::RemoveToken(..)))
            .collect();
        assert_eq!(removed.len(), 2);
    }

    #[test]
    fn test_token_requires_card_and_is_unique() {
        let (table, _) = table(12);
        assert!(!table.place_token(PlayerId(0), SlotId(0)));

        table.place_card(CardId(1), SlotId(0));
        assert!(table.place_token(PlayerId(0), SlotId(0)));
        assert!(!table.place_token(PlayerId(0), SlotId(0)));
        assert_eq!(table.tokens_at(SlotId(0)).as_slice(), &[PlayerId(0)]);
    }

    #[test]
    fn test_remove_token_is_idempotent() {
        let (table, ui) = table(12);
        table.place_card(CardId(1), SlotId(0));
        table.place_token(PlayerId(0), SlotId(0));

        assert!(table.remove_token(PlayerId(0), SlotId(0)));
        let events_after_first = ui.events().len();

        assert!(!table.remove_token(PlayerId(0), SlotId(0)));
        assert_eq!(ui.events().len(), events_after_first);
        assert!(table.tokens_at(SlotId(0)).is_empty());
    }

    #[test]
    fn test_remove_token_from_card() {
        let (table, _) = table(12);
        table.place_card(CardId(9), SlotId(4));
        table.place_token(PlayerId(2), SlotId(4));

        assert!(!table.remove_token_from_card(PlayerId(1), CardId(9)));
        assert!(!table.remove_token_from_card(PlayerId(2), CardId(10)));
        assert!(table.remove_token_from_card(PlayerId(2), CardId(9)));
        assert!(table.tokens_at(SlotId(4)).is_empty());
    }

    #[test]
    fn test_toggle_token() {
        let (table, _) = table(12);
        assert_eq!(table.toggle_token(PlayerId(0), SlotId(0), true), TokenToggle::Ignored);

        table.place_card(CardId(3), SlotId(0));
        assert_eq!(table.toggle_token(PlayerId(0), SlotId(0), false), TokenToggle::Ignored);
        assert_eq!(table.toggle_token(PlayerId(0), SlotId(0), true), TokenToggle::Placed(CardId(3)));
        // removal is always allowed
        assert_eq!(table.toggle_token(PlayerId(0), SlotId(0), false), TokenToggle::Removed(CardId(3)));
        assert_eq!(table.toggle_token(PlayerId(0), SlotId(42), true), TokenToggle::Ignored);
    }

    #[test]
    fn test_remove_tokens() {
        let (table, _) = table(12);
        table.place_card(CardId(3), SlotId(1));
        for p in 0..3 {
            table.place_token(PlayerId(p), SlotId(1));
        }
        table.remove_tokens(SlotId(1));
        assert!(table.tokens_at(SlotId(1)).is_empty());
        assert_eq!(table.card_at(SlotId(1)), Some(CardId(3)));
    }

    #[test]
    fn test_slots_with_token() {
        let (table, _) = table(12);
        for i in 0..4 {
            table.place_card(CardId(i), SlotId(i as usize));
        }
        table.place_token(PlayerId(1), SlotId(3));
        table.place_token(PlayerId(1), SlotId(0));
        table.place_token(PlayerId(0), SlotId(2));

        assert_eq!(table.slots_with_token(PlayerId(1)), vec![SlotId(0), SlotId(3)]);
        assert_eq!(table.cards(), vec![CardId(0), CardId(1), CardId(2), CardId(3)]);
    }

    #[test]
    fn test_ready_flag() {
        let (table, _) = table(3);
        assert!(!table.is_ready());
        table.set_ready(true);
        assert!(table.is_ready());
    }

    #[test]
    fn test_hints_do_not_mutate() {
        let (table, ui) = table(3);
        for (slot, card) in [0u32, 1, 2].into_iter().enumerate() {
            table.place_card(CardId(card), SlotId(slot));
        }
        let before = ui.events().len();
        table.hints(&FeatureOracle::new(4, 3));
        assert_eq!(ui.events().len(), before);
        assert_eq!(table.count_cards(), 3);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Place(u32, usize),
        Remove(usize),
        Token(u8, usize),
        Untoken(u8, usize),
        Clear(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..81, 0usize..12).prop_map(|(c, s)| Op::Place(c, s)),
            (0usize..12).prop_map(Op::Remove),
            (0u8..4, 0usize..12).prop_map(|(p, s)| Op::Token(p, s)),
            (0u8..4, 0usize..12).prop_map(|(p, s)| Op::Untoken(p, s)),
            (0usize..12).prop_map(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn prop_operations_keep_bijection(ops in prop::collection::vec(op(), 0..200)) {
            let table = Table::new(12, 81, Duration::ZERO, Arc::new(crate::ui::NullInterface));
            for op in ops {
                match op {
                    Op::Place(c, s) => { table.place_card(CardId(c), SlotId(s)); }
                    Op::Remove(s) => { table.remove_card(SlotId(s)); }
                    Op::Token(p, s) => { table.place_token(PlayerId(p), SlotId(s)); }
                    Op::Untoken(p, s) => { table.remove_token(PlayerId(p), SlotId(s)); }
                    Op::Clear(s) => table.remove_tokens(SlotId(s)),
                }
                prop_assert!(table.is_consistent());
            }
            prop_assert_eq!(table.count_cards() + table.empty_slots().len(), 12);
        }
    }
}
