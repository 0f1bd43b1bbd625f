//! The dealer: deals, runs the turn timer, adjudicates claims and decides
//! when the game is over.
//!
//! The dealer is the only writer of card placement. It owns the deck, and
//! every adjudication, deal and top-up runs on its thread, so they never
//! overlap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, instrument, warn};

use super::claims::ClaimBoard;
use super::deck::Deck;
use crate::cards::SetOracle;
use crate::core::{CardId, GameConfig, GameError, GameRng, PlayerId, PlayerMap, Result, SlotId};
use crate::players::{Player, Verdict, SET_SIZE};
use crate::table::Table;
use crate::ui::UserInterface;

/// Claim wait while the countdown is calm.
const POLL: Duration = Duration::from_millis(100);

/// Claim wait under the warning threshold, so the countdown shows
/// sub-second precision.
const WARNING_POLL: Duration = Duration::from_millis(10);

/// Stops a running game from any thread.
///
/// Terminating raises the flag the dealer checks at loop boundaries,
/// releases every queued claim without a verdict, and terminates the
/// players in reverse id order.
#[derive(Clone, Debug)]
pub struct Terminator {
    flag: Arc<AtomicBool>,
    claims: Arc<ClaimBoard>,
    players: PlayerMap<Arc<Player>>,
}

impl Terminator {
    pub fn terminate(&self) {
        if !self.flag.swap(true, Ordering::AcqRel) {
            info!("termination requested");
        }
        for player in self.claims.close() {
            if let Some(player) = self.players.get(player) {
                player.release(Verdict::Unset);
            }
        }
        let players: Vec<_> = self.players.values().collect();
        for player in players.into_iter().rev() {
            player.terminate();
        }
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Single authority over the deck, the timer and claim verdicts.
pub struct Dealer {
    table: Arc<Table>,
    claims: Arc<ClaimBoard>,
    players: PlayerMap<Arc<Player>>,
    oracle: Arc<dyn SetOracle>,
    ui: Arc<dyn UserInterface>,
    deck: Deck,
    /// Shuffles and slot order.
    rng: GameRng,
    /// Parent of every computer player's stream.
    seed_rng: GameRng,
    terminated: Arc<AtomicBool>,
    deadline: Instant,
    turn_timeout: Duration,
    turn_timeout_warning: Duration,
    hints: bool,
}

impl Dealer {
    /// Create a dealer with a full deck.
    pub fn new(
        config: &GameConfig,
        table: Arc<Table>,
        claims: Arc<ClaimBoard>,
        players: PlayerMap<Arc<Player>>,
        oracle: Arc<dyn SetOracle>,
        ui: Arc<dyn UserInterface>,
        rng: &GameRng,
    ) -> Self {
        Self {
            table,
            claims,
            players,
            oracle,
            ui,
            deck: Deck::new(config.deck_size),
            rng: rng.for_context("dealer"),
            seed_rng: rng.clone(),
            terminated: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now(),
            turn_timeout: config.turn_timeout(),
            turn_timeout_warning: config.turn_timeout_warning(),
            hints: config.hints,
        }
    }

    /// Replace the deck, e.g. with a fixed draw order.
    #[must_use]
    pub fn with_deck(mut self, deck: Deck) -> Self {
        self.deck = deck;
        self
    }

    /// A handle that stops this dealer's game.
    #[must_use]
    pub fn terminator(&self) -> Terminator {
        Terminator {
            flag: Arc::clone(&self.terminated),
            claims: Arc::clone(&self.claims),
            players: self.players.clone(),
        }
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    #[must_use]
    pub fn players(&self) -> &PlayerMap<Arc<Player>> {
        &self.players
    }

    /// When the current round times out.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left in the current round.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Dealer thread body: start one thread per player, play to the end,
    /// then wait for every player to stop. Returns the winners.
    pub fn run(mut self) -> Result<Vec<PlayerId>> {
        info!(players = self.players.player_count(), "dealer thread starting");

        let mut handles = Vec::with_capacity(self.players.player_count());
        for (id, player) in self.players.iter() {
            let name = format!("player-{}", id.0);
            let rng = self.seed_rng.for_context(&format!("computer-{}", id.0));
            let player = Arc::clone(player);
            match thread::Builder::new().name(name.clone()).spawn(move || player.run(rng)) {
                Ok(handle) => handles.push((name, handle)),
                Err(source) => {
                    error!(thread = %name, error = %source, "failed to spawn player thread");
                    self.terminator().terminate();
                    let _ = join_players(handles);
                    return Err(GameError::Spawn { name, source });
                }
            }
        }

        let winners = self.play();
        join_players(handles)?;
        info!(?winners, "dealer thread terminated");
        Ok(winners)
    }

    /// Play rounds until terminated or the deck holds no set, then announce
    /// the winners and terminate the players.
    pub fn play(&mut self) -> Vec<PlayerId> {
        while !self.should_finish() {
            self.deck.shuffle(&mut self.rng);
            self.place_cards_on_table();
            self.timer_loop();
            self.ui.set_countdown(Duration::ZERO, false);
            self.remove_all_cards_from_table();
        }
        let winners = self.announce_winners();
        self.terminator().terminate();
        winners
    }

    /// Whether the game is over. Checked once per round.
    #[must_use]
    pub fn should_finish(&self) -> bool {
        self.is_terminated() || !self.oracle.has_set(&self.deck.cards())
    }

    #[instrument(skip(self), level = "debug")]
    fn timer_loop(&mut self) {
        self.reset_deadline();
        while !self.is_terminated() {
            let remaining = self.remaining();
            if remaining.is_zero() {
                break;
            }
            let poll = if remaining <= self.turn_timeout_warning {
                WARNING_POLL
            } else {
                POLL
            };

            if let Some(player) = self.claims.next_claim(poll.min(remaining)) {
                self.service_claim(player);
            }
            self.update_timer_display();
            self.remove_cards_from_table();
            self.place_cards_on_table();
        }
        debug!(terminated = self.is_terminated(), "round over");
    }

    /// Restart the countdown at the full turn duration.
    pub fn reset_deadline(&mut self) {
        self.deadline = Instant::now() + self.turn_timeout;
        self.ui.set_countdown(self.turn_timeout, false);
    }

    /// Show the time left, flagged once under the warning threshold.
    pub fn update_timer_display(&self) {
        let remaining = self.remaining();
        self.ui.set_countdown(remaining, remaining <= self.turn_timeout_warning);
    }

    /// Deal into every empty slot, in random order, until the deck or the
    /// empty slots run out. Presses are rejected while dealing. Returns the
    /// number of cards dealt.
    #[instrument(skip(self), level = "debug")]
    pub fn place_cards_on_table(&mut self) -> usize {
        let mut empty = self.table.empty_slots();
        if empty.is_empty() || self.deck.is_empty() {
            self.table.set_ready(true);
            return 0;
        }

        self.table.set_ready(false);
        self.rng.shuffle(&mut empty);
        let mut placed = 0;
        for slot in empty {
            let Some(card) = self.deck.draw() else { break };
            if self.table.place_card(card, slot) {
                placed += 1;
            } else {
                warn!(%card, %slot, "deal refused by table");
                self.deck.set_aside(card);
            }
        }
        self.table.set_ready(true);

        debug!(placed, deck = self.deck.len(), "dealt");
        if self.hints && placed > 0 {
            self.table.hints(self.oracle.as_ref());
        }
        placed
    }

    /// Retire burned cards that are still on the table.
    fn remove_cards_from_table(&mut self) {
        let stale: Vec<(SlotId, CardId)> = self
            .table
            .cards()
            .into_iter()
            .filter(|card| self.deck.is_burned(*card))
            .filter_map(|card| self.table.slot_of(card).map(|slot| (slot, card)))
            .collect();
        if stale.is_empty() {
            return;
        }

        self.table.set_ready(false);
        for (slot, card) in stale {
            for player in self.players.values() {
                player.burn_cards(&[card]);
            }
            self.table.remove_tokens(slot);
            self.table.remove_card(slot);
        }
        self.table.set_ready(true);
    }

    /// Pop-side of a claim: adjudicate if the player still holds three
    /// cards, then clear its in-flight flag and release it.
    pub fn service_claim(&mut self, claimant: PlayerId) -> Verdict {
        let Some(player) = self.players.get(claimant).cloned() else {
            self.claims.finish(claimant);
            return Verdict::Unset;
        };

        let selection = player.selection();
        let verdict = match <[CardId; SET_SIZE]>::try_from(selection.as_slice()) {
            Ok(cards) => self.check_set(claimant, cards),
            Err(_) => {
                debug!(player = %claimant, held = selection.len(), "claim no longer holds a full selection");
                Verdict::Unset
            }
        };

        self.claims.finish(claimant);
        player.release(verdict);
        verdict
    }

    /// Adjudicate three cards. A legal set is burned from the table and the
    /// deck, the table is topped up and the countdown restarts.
    #[instrument(skip(self), level = "debug", fields(player = %claimant))]
    fn check_set(&mut self, claimant: PlayerId, cards: [CardId; SET_SIZE]) -> Verdict {
        if !self.oracle.is_legal_set(&cards) {
            info!(player = %claimant, ?cards, "illegal set");
            return Verdict::Illegal;
        }

        self.table.set_ready(false);
        for player in self.players.values() {
            player.burn_cards(&cards);
        }
        for card in cards {
            if let Some(slot) = self.table.slot_of(card) {
                self.table.remove_tokens(slot);
                self.table.remove_card(slot);
            }
            self.deck.burn(card);
        }
        info!(player = %claimant, ?cards, "legal set");

        self.place_cards_on_table();
        self.reset_deadline();
        Verdict::Legal
    }

    /// End of round: clear every selection, then every slot. Cleared cards
    /// are set aside, not returned to the deck.
    #[instrument(skip(self), level = "debug")]
    pub fn remove_all_cards_from_table(&mut self) {
        self.table.set_ready(false);
        for player in self.players.values() {
            player.clear_selection();
        }
        for slot in SlotId::all(self.table.size()) {
            if let Some(card) = self.table.remove_card(slot) {
                self.deck.set_aside(card);
            }
        }
        debug!(
            deck = self.deck.len(),
            burned = self.deck.burned_count(),
            set_aside = self.deck.set_aside_count(),
            "table cleared"
        );
    }

    /// Every player whose score equals the highest score.
    fn announce_winners(&self) -> Vec<PlayerId> {
        let max = self.claims.max_score();
        let winners: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|(_, player)| player.score() == max)
            .map(|(id, _)| id)
            .collect();
        info!(?winners, score = max, "game over");
        self.ui.announce_winners(&winners);
        winners
    }
}

impl std::fmt::Debug for Dealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dealer")
            .field("deck", &self.deck.len())
            .field("remaining", &self.remaining())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

fn join_players(handles: Vec<(String, JoinHandle<()>)>) -> Result<()> {
    let mut panicked = None;
    for (name, handle) in handles {
        if handle.join().is_err() {
            error!(thread = %name, "player thread panicked");
            panicked.get_or_insert(name);
        }
    }
    match panicked {
        Some(name) => Err(GameError::Panicked(name)),
        None => Ok(()),
    }
}
