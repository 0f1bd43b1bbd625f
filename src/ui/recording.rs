use std::sync::Mutex;
use std::time::Duration;

use super::UserInterface;
use crate::core::sync::lock;
use crate::core::{CardId, PlayerId, SlotId};

/// One call made on a `UserInterface`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    PlaceCard(CardId, SlotId),
    RemoveCard(SlotId),
    PlaceToken(PlayerId, SlotId),
    RemoveToken(PlayerId, SlotId),
    Score(PlayerId, u32),
    Countdown { remaining: Duration, warn: bool },
    Freeze(PlayerId, Duration),
    Winners(Vec<PlayerId>),
}

/// Interface that records every call, in arrival order.
///
/// Countdown updates arrive many times a second; they are only kept when
/// `with_countdown` is used.
///
/// ```
/// use rust_set::core::{CardId, SlotId};
/// use rust_set::ui::{RecordingInterface, UiEvent, UserInterface};
///
/// let ui = RecordingInterface::new();
/// ui.place_card(CardId(3), SlotId(0));
/// assert_eq!(ui.events(), vec![UiEvent::PlaceCard(CardId(3), SlotId(0))]);
/// ```
#[derive(Debug, Default)]
pub struct RecordingInterface {
    events: Mutex<Vec<UiEvent>>,
    keep_countdown: bool,
}

impl RecordingInterface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also record countdown updates.
    #[must_use]
    pub fn with_countdown() -> Self {
        Self {
            events: Mutex::default(),
            keep_countdown: true,
        }
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<UiEvent> {
        lock(&self.events).clone()
    }

    /// Latest score reported for a player.
    #[must_use]
    pub fn last_score(&self, player: PlayerId) -> Option<u32> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            UiEvent::Score(p, score) if *p == player => Some(*score),
            _ => None,
        })
    }

    /// Winners, if announced.
    #[must_use]
    pub fn winners(&self) -> Option<Vec<PlayerId>> {
        lock(&self.events).iter().find_map(|event| match event {
            UiEvent::Winners(winners) => Some(winners.clone()),
            _ => None,
        })
    }

    fn push(&self, event: UiEvent) {
        lock(&self.events).push(event);
    }
}

impl UserInterface for RecordingInterface {
    fn place_card(&self, card: CardId, slot: SlotId) {
        self.push(UiEvent::PlaceCard(card, slot));
    }

    fn remove_card(&self, slot: SlotId) {
        self.push(UiEvent::RemoveCard(slot));
    }

    fn place_token(&self, player: PlayerId, slot: SlotId) {
        self.push(UiEvent::PlaceToken(player, slot));
    }

    fn remove_token(&self, player: PlayerId, slot: SlotId) {
        self.push(UiEvent::RemoveToken(player, slot));
    }

    fn set_score(&self, player: PlayerId, score: u32) {
        self.push(UiEvent::Score(player, score));
    }

    fn set_countdown(&self, remaining: Duration, warn: bool) {
        if self.keep_countdown {
            self.push(UiEvent::Countdown { remaining, warn });
        }
    }

    fn set_freeze(&self, player: PlayerId, remaining: Duration) {
        self.push(UiEvent::Freeze(player, remaining));
    }

    fn announce_winners(&self, winners: &[PlayerId]) {
        self.push(UiEvent::Winners(winners.to_vec()));
    }
}
