//! One participant: its selection, score, freeze phases and thread loop.
//!
//! A `Player` is shared (`Arc`) between its own thread, the dealer, and the
//! input surface. The player thread turns presses into tokens; the dealer
//! reads the selection, burns cards out of it and releases claims.
//!
//! Lock order: selection, then table slot. The dealer follows the same
//! order when it burns or clears selections.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use smallvec::SmallVec;
use tracing::{debug, error, info, trace};

use super::computer;
use super::input::InputQueue;
use super::verdict::{Verdict, VerdictSlot};
use crate::core::sync::lock;
use crate::core::{CardId, GameRng, PlayerId, PlayerKind, SlotId};
use crate::dealer::ClaimBoard;
use crate::table::{Table, TokenToggle};
use crate::ui::UserInterface;

/// Cards a player has tokens on. Never more than three.
pub type Selection = SmallVec<[CardId; 3]>;

/// Cards needed for a claim.
pub const SET_SIZE: usize = 3;

/// How long the player thread waits for a press before re-checking its
/// state.
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Freeze countdown refresh.
const FREEZE_TICK: Duration = Duration::from_millis(250);

/// Lifecycle of a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerPhase {
    /// Taking presses.
    Idle,
    /// Claimed three cards; blocked until the dealer releases it.
    AwaitingVerdict,
    /// Scored; ignoring input until the deadline.
    FrozenPoint { until: Instant },
    /// Claimed an illegal set; ignoring input until the deadline.
    FrozenPenalty { until: Instant },
    /// The game is over for this player.
    Terminated,
}

impl PlayerPhase {
    /// Freeze deadline, if frozen.
    #[must_use]
    pub fn frozen_until(self) -> Option<Instant> {
        match self {
            PlayerPhase::FrozenPoint { until } | PlayerPhase::FrozenPenalty { until } => Some(until),
            _ => None,
        }
    }
}

/// A player and the state the dealer shares with it.
pub struct Player {
    id: PlayerId,
    kind: PlayerKind,
    name: String,
    table: Arc<Table>,
    claims: Arc<ClaimBoard>,
    ui: Arc<dyn UserInterface>,
    input: InputQueue,
    verdict: VerdictSlot,
    selection: Mutex<Selection>,
    phase: Mutex<PlayerPhase>,
    score: AtomicU32,
    /// Cleared by a penalty; set again by any token removal.
    armed: AtomicBool,
    terminated: AtomicBool,
    point_freeze: Duration,
    penalty_freeze: Duration,
}

impl Player {
    /// Create an idle player with no freezes.
    pub fn new(
        id: PlayerId,
        kind: PlayerKind,
        table: Arc<Table>,
        claims: Arc<ClaimBoard>,
        ui: Arc<dyn UserInterface>,
    ) -> Self {
        Self {
            id,
            kind,
            name: id.to_string(),
            table,
            claims,
            ui,
            input: InputQueue::new(),
            verdict: VerdictSlot::new(),
            selection: Mutex::default(),
            phase: Mutex::new(PlayerPhase::Idle),
            score: AtomicU32::new(0),
            armed: AtomicBool::new(true),
            terminated: AtomicBool::new(false),
            point_freeze: Duration::ZERO,
            penalty_freeze: Duration::ZERO,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the point and penalty freeze durations.
    #[must_use]
    pub fn with_freezes(mut self, point: Duration, penalty: Duration) -> Self {
        self.point_freeze = point;
        self.penalty_freeze = penalty;
        self
    }

    #[must_use]
    pub fn id(&self) -> PlayerId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> PlayerKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn phase(&self) -> PlayerPhase {
        *lock(&self.phase)
    }

    /// Snapshot of the selected cards, in selection order.
    #[must_use]
    pub fn selection(&self) -> Selection {
        lock(&self.selection).clone()
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        lock(&self.selection).len()
    }

    /// Check that the selection is exactly the cards under this player's
    /// tokens.
    ///
    /// Every change to either side happens under the selection lock, which
    /// is held for the whole check.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let selection = lock(&self.selection);
        let mut selected = selection.clone();
        selected.sort_unstable();
        let mut under_tokens: Vec<CardId> = self
            .table
            .slots_with_token(self.id)
            .into_iter()
            .filter_map(|slot| self.table.card_at(slot))
            .collect();
        under_tokens.sort_unstable();
        selected.len() <= SET_SIZE && selected.as_slice() == under_tokens.as_slice()
    }

    /// Whether the player may claim its next full selection.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Queued presses.
    #[must_use]
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// A key for `slot` was pressed. Returns false if the press was dropped
    /// (queue full, player frozen, or game over).
    pub fn key_pressed(&self, slot: SlotId) -> bool {
        self.input.push(slot)
    }

    /// Apply one press: toggle this player's token on `slot`.
    ///
    /// A press on an empty slot, or while the dealer is dealing, does
    /// nothing. A fourth card cannot be selected.
    pub fn press(&self, slot: SlotId) -> TokenToggle {
        let mut selection = lock(&self.selection);
        if !self.table.is_ready() {
            return TokenToggle::Ignored;
        }

        let toggle = self.table.toggle_token(self.id, slot, selection.len() < SET_SIZE);
        match toggle {
            TokenToggle::Placed(card) => selection.push(card),
            TokenToggle::Removed(card) => {
                selection.retain(|c| *c != card);
                self.armed.store(true, Ordering::Release);
            }
            TokenToggle::Ignored => {}
        }
        trace!(player = %self.id, %slot, ?toggle, "press");
        toggle
    }

    /// Whether the next tick would submit a claim.
    #[must_use]
    pub fn ready_to_claim(&self) -> bool {
        self.is_armed() && self.selected_count() == SET_SIZE && !self.claims.is_in_flight(self.id)
    }

    /// Submit the selection and block until the dealer answers.
    ///
    /// Returns `Verdict::Unset` if the claim could not be queued, or if the
    /// player was released without adjudication.
    pub fn claim(&self) -> Verdict {
        self.verdict.arm();
        if !self.claims.submit(self.id) {
            self.verdict.disarm();
            return Verdict::Unset;
        }
        self.set_phase(PlayerPhase::AwaitingVerdict);
        debug!(player = %self.id, "claim submitted, waiting for dealer");

        let verdict = self.verdict.wait();
        self.set_phase(PlayerPhase::Idle);
        verdict
    }

    /// Deliver the dealer's verdict. Called by the dealer only.
    ///
    /// A legal verdict is scored here, on the dealer's thread, so the score
    /// is final before the dealer can announce winners.
    pub fn release(&self, verdict: Verdict) {
        if verdict == Verdict::Legal {
            self.award_point();
        }
        self.verdict.release(verdict);
    }

    fn award_point(&self) {
        let score = self.score.fetch_add(1, Ordering::AcqRel) + 1;
        self.ui.set_score(self.id, score);
        self.claims.record_score(score);
        info!(player = %self.id, score, "point");
    }

    /// React to a released claim: freeze after a point, freeze and disarm
    /// after a penalty, nothing for a silent release.
    pub fn apply_verdict(&self, verdict: Verdict) {
        match verdict {
            Verdict::Legal => self.freeze(PlayerPhase::FrozenPoint {
                until: Instant::now() + self.point_freeze,
            }),
            Verdict::Illegal => self.penalty(),
            Verdict::Unset => {}
        }
    }

    fn penalty(&self) {
        self.armed.store(false, Ordering::Release);
        info!(player = %self.id, "penalty");
        self.freeze(PlayerPhase::FrozenPenalty {
            until: Instant::now() + self.penalty_freeze,
        });
    }

    fn freeze(&self, phase: PlayerPhase) {
        self.input.set_accepting(false);
        if let Some(until) = phase.frozen_until() {
            self.ui.set_freeze(self.id, until.saturating_duration_since(Instant::now()));
        }
        self.set_phase(phase);
    }

    /// End the freeze if its deadline passed. Returns whether the player is
    /// still frozen.
    pub fn thaw_if_due(&self) -> bool {
        let mut phase = lock(&self.phase);
        match phase.frozen_until() {
            Some(until) if Instant::now() >= until => {
                *phase = PlayerPhase::Idle;
                drop(phase);
                self.ui.set_freeze(self.id, Duration::ZERO);
                self.input.set_accepting(true);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Drop tokens and selection on any of `cards`, and any queued presses.
    /// Called by the dealer when those cards leave the table. Losing a
    /// selected card re-arms a penalized player.
    pub fn burn_cards(&self, cards: &[CardId]) {
        let mut selection = lock(&self.selection);
        let held = selection.len();
        for &card in cards {
            self.table.remove_token_from_card(self.id, card);
            selection.retain(|c| *c != card);
        }
        if selection.len() < held {
            self.armed.store(true, Ordering::Release);
        }
        self.input.clear();
    }

    /// Drop every token and the whole selection. Called by the dealer at
    /// the end of a round. A penalized player starts the next round armed.
    pub fn clear_selection(&self) {
        let mut selection = lock(&self.selection);
        for card in selection.drain(..) {
            self.table.remove_token_from_card(self.id, card);
        }
        self.armed.store(true, Ordering::Release);
    }

    /// Stop the player: refuse input and release any pending claim.
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::Release);
        self.input.close();
        self.verdict.close();
    }

    /// One iteration of the player loop.
    pub fn tick(&self) {
        if let Some(until) = self.phase().frozen_until() {
            if self.thaw_if_due() {
                let remaining = until.saturating_duration_since(Instant::now());
                self.ui.set_freeze(self.id, remaining);
                self.input.sleep(remaining.min(FREEZE_TICK));
            }
            return;
        }

        if let Some(slot) = self.input.take_latest(INPUT_POLL) {
            self.press(slot);
        }

        if self.ready_to_claim() {
            let verdict = self.claim();
            if !self.is_terminated() {
                self.apply_verdict(verdict);
            }
        }
    }

    /// Player thread body. Computer players also run a press generator on
    /// a second thread, seeded from `rng`.
    pub fn run(self: &Arc<Self>, rng: GameRng) {
        info!(player = %self.id, name = %self.name, kind = ?self.kind, "player thread starting");

        let generator = match self.kind {
            PlayerKind::Human => None,
            PlayerKind::Computer => {
                let player = Arc::clone(self);
                let spawned = thread::Builder::new()
                    .name(format!("computer-{}", self.id.0))
                    .spawn(move || computer::generate_presses(&player, rng));
                match spawned {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        error!(player = %self.id, error = %e, "failed to start press generator");
                        None
                    }
                }
            }
        };

        while !self.is_terminated() {
            self.tick();
        }
        self.set_phase(PlayerPhase::Terminated);

        if let Some(handle) = generator {
            if handle.join().is_err() {
                error!(player = %self.id, "press generator panicked");
            }
        }
        info!(player = %self.id, score = self.score(), "player thread terminated");
    }

    pub(crate) fn table_size(&self) -> usize {
        self.table.size()
    }

    pub(crate) fn wait_for_room(&self, timeout: Duration) -> bool {
        self.input.wait_for_room(timeout)
    }

    fn set_phase(&self, phase: PlayerPhase) {
        let mut current = lock(&self.phase);
        if *current != PlayerPhase::Terminated {
            *current = phase;
        }
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("score", &self.score())
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{NullInterface, RecordingInterface, UiEvent};

    struct Fixture {
        table: Arc<Table>,
        claims: Arc<ClaimBoard>,
        ui: Arc<RecordingInterface>,
    }

    impl Fixture {
        fn new() -> Self {
            let ui = Arc::new(RecordingInterface::new());
            let table = Arc::new(Table::new(12, 81, Duration::ZERO, ui.clone()));
            for i in 0..12u32 {
                table.place_card(CardId(i), SlotId(i as usize));
            }
            table.set_ready(true);
            Self {
                table,
                claims: Arc::new(ClaimBoard::new()),
                ui,
            }
        }

        fn player(&self, id: u8) -> Arc<Player> {
            Arc::new(
                Player::new(
                    PlayerId(id),
                    PlayerKind::Human,
                    self.table.clone(),
                    self.claims.clone(),
                    self.ui.clone(),
                )
                .with_freezes(Duration::from_millis(30), Duration::from_millis(60)),
            )
        }

        fn token_cards(&self, player: PlayerId) -> Vec<CardId> {
            let mut cards: Vec<_> = self
                .table
                .slots_with_token(player)
                .into_iter()
                .filter_map(|slot| self.table.card_at(slot))
                .collect();
            cards.sort();
            cards
        }
    }

    fn sorted(selection: Selection) -> Vec<CardId> {
        let mut cards = selection.to_vec();
        cards.sort();
        cards
    }

    #[test]
    fn test_press_toggles_token_and_selection() {
        let fx = Fixture::new();
        let player = fx.player(0);

        assert_eq!(player.press(SlotId(4)), TokenToggle::Placed(CardId(4)));
        assert_eq!(player.selection().as_slice(), &[CardId(4)]);
        assert_eq!(fx.token_cards(PlayerId(0)), vec![CardId(4)]);

        assert_eq!(player.press(SlotId(4)), TokenToggle::Removed(CardId(4)));
        assert!(player.selection().is_empty());
        assert!(fx.token_cards(PlayerId(0)).is_empty());
    }

    #[test]
    fn test_fourth_card_is_rejected() {
        let fx = Fixture::new();
        let player = fx.player(0);
        for slot in 0..3 {
            player.press(SlotId(slot));
        }

        assert_eq!(player.press(SlotId(3)), TokenToggle::Ignored);
        assert_eq!(player.selected_count(), 3);
        assert_eq!(sorted(player.selection()), fx.token_cards(PlayerId(0)));
    }

    #[test]
    fn test_press_ignored_while_dealing() {
        let fx = Fixture::new();
        let player = fx.player(0);
        fx.table.set_ready(false);

        assert_eq!(player.press(SlotId(0)), TokenToggle::Ignored);
        assert!(player.selection().is_empty());
    }

    #[test]
    fn test_press_on_empty_slot_is_noop() {
        let fx = Fixture::new();
        let player = fx.player(0);
        fx.table.remove_card(SlotId(5));

        assert_eq!(player.press(SlotId(5)), TokenToggle::Ignored);
        assert!(player.selection().is_empty());
    }

    #[test]
    fn test_ready_to_claim_needs_three_cards() {
        let fx = Fixture::new();
        let player = fx.player(0);
        player.press(SlotId(0));
        player.press(SlotId(1));
        assert!(!player.ready_to_claim());
        player.press(SlotId(2));
        assert!(player.ready_to_claim());
    }

    #[test]
    fn test_point_scores_and_freezes() {
        let fx = Fixture::new();
        let player = fx.player(1);
        player.key_pressed(SlotId(3));

        player.release(Verdict::Legal);
        player.apply_verdict(Verdict::Legal);

        assert_eq!(player.score(), 1);
        assert_eq!(fx.claims.max_score(), 1);
        assert_eq!(fx.ui.last_score(PlayerId(1)), Some(1));
        assert!(matches!(player.phase(), PlayerPhase::FrozenPoint { .. }));
        assert_eq!(player.pending_input(), 0);
        assert!(!player.key_pressed(SlotId(3)));
    }

    #[test]
    fn test_penalty_freezes_and_disarms() {
        let fx = Fixture::new();
        let player = fx.player(0);
        for slot in 0..3 {
            player.press(SlotId(slot));
        }
        player.key_pressed(SlotId(7));

        player.apply_verdict(Verdict::Illegal);

        assert_eq!(player.score(), 0);
        assert!(matches!(player.phase(), PlayerPhase::FrozenPenalty { .. }));
        assert_eq!(player.pending_input(), 0);
        assert!(!player.is_armed());
        assert!(!player.ready_to_claim());
    }

    #[test]
    fn test_token_removal_rearms() {
        let fx = Fixture::new();
        let player = fx.player(0);
        for slot in 0..3 {
            player.press(SlotId(slot));
        }
        player.apply_verdict(Verdict::Illegal);
        thread::sleep(Duration::from_millis(70));
        assert!(!player.thaw_if_due());

        player.press(SlotId(2));
        assert!(player.is_armed());
        player.press(SlotId(3));
        assert!(player.ready_to_claim());
    }

    #[test]
    fn test_selection_matches_tokens() {
        let fx = Fixture::new();
        let player = fx.player(1);
        assert!(player.is_consistent());

        player.press(SlotId(2));
        player.press(SlotId(9));
        assert!(player.is_consistent());

        // a token placed behind the player's back
        fx.table.place_token(PlayerId(1), SlotId(4));
        assert!(!player.is_consistent());
    }

    #[test]
    fn test_round_clear_rearms() {
        let fx = Fixture::new();
        let player = fx.player(0);
        for slot in 0..3 {
            player.press(SlotId(slot));
        }
        player.apply_verdict(Verdict::Illegal);
        assert!(!player.is_armed());

        player.clear_selection();

        assert!(player.is_armed());
        assert!(player.selection().is_empty());
    }

    #[test]
    fn test_burned_selection_rearms() {
        let fx = Fixture::new();
        let player = fx.player(0);
        for slot in 0..3 {
            player.press(SlotId(slot));
        }
        player.apply_verdict(Verdict::Illegal);

        // cards the player does not hold leave it disarmed
        player.burn_cards(&[CardId(6), CardId(7), CardId(8)]);
        assert!(!player.is_armed());

        player.burn_cards(&[CardId(1), CardId(7), CardId(8)]);
        assert!(player.is_armed());
        assert_eq!(player.selection().as_slice(), &[CardId(0), CardId(2)]);
    }

    #[test]
    fn test_silent_release_changes_nothing() {
        let fx = Fixture::new();
        let player = fx.player(0);
        player.apply_verdict(Verdict::Unset);
        assert_eq!(player.score(), 0);
        assert_eq!(player.phase(), PlayerPhase::Idle);
        assert!(player.is_armed());
    }

    #[test]
    fn test_thaw_restores_input() {
        let fx = Fixture::new();
        let player = fx.player(0);
        player.apply_verdict(Verdict::Legal);
        assert!(player.thaw_if_due());

        thread::sleep(Duration::from_millis(40));
        assert!(!player.thaw_if_due());
        assert_eq!(player.phase(), PlayerPhase::Idle);
        assert!(player.key_pressed(SlotId(0)));
        assert!(fx.ui.events().contains(&UiEvent::Freeze(PlayerId(0), Duration::ZERO)));
    }

    #[test]
    fn test_burn_cards_drops_tokens() {
        let fx = Fixture::new();
        let player = fx.player(0);
        player.press(SlotId(0));
        player.press(SlotId(5));

        player.burn_cards(&[CardId(5), CardId(6), CardId(7)]);

        assert_eq!(player.selection().as_slice(), &[CardId(0)]);
        assert_eq!(fx.token_cards(PlayerId(0)), vec![CardId(0)]);
    }

    #[test]
    fn test_clear_selection() {
        let fx = Fixture::new();
        let player = fx.player(2);
        player.press(SlotId(1));
        player.press(SlotId(2));

        player.clear_selection();

        assert!(player.selection().is_empty());
        assert!(fx.table.slots_with_token(PlayerId(2)).is_empty());
    }

    #[test]
    fn test_claim_blocks_until_released() {
        let fx = Fixture::new();
        let player = fx.player(0);
        for slot in 0..3 {
            player.press(SlotId(slot));
        }

        let claimant = Arc::clone(&player);
        let handle = thread::spawn(move || claimant.claim());

        let claimed = fx.claims.next_claim(Duration::from_secs(5));
        assert_eq!(claimed, Some(PlayerId(0)));
        fx.claims.finish(PlayerId(0));
        player.release(Verdict::Illegal);

        assert_eq!(handle.join().unwrap(), Verdict::Illegal);
        assert_eq!(player.phase(), PlayerPhase::Idle);
    }

    #[test]
    fn test_terminate_releases_claim() {
        let fx = Fixture::new();
        let player = fx.player(0);
        for slot in 0..3 {
            player.press(SlotId(slot));
        }

        let claimant = Arc::clone(&player);
        let handle = thread::spawn(move || claimant.claim());
        fx.claims.next_claim(Duration::from_secs(5));
        player.terminate();

        assert_eq!(handle.join().unwrap(), Verdict::Unset);
        assert!(!player.key_pressed(SlotId(0)));
    }

    #[test]
    fn test_run_stops_on_terminate() {
        let table = Arc::new(Table::new(3, 81, Duration::ZERO, Arc::new(NullInterface)));
        let player = Arc::new(Player::new(
            PlayerId(0),
            PlayerKind::Computer,
            table,
            Arc::new(ClaimBoard::new()),
            Arc::new(NullInterface),
        ));

        let runner = Arc::clone(&player);
        let handle = thread::spawn(move || runner.run(GameRng::new(1)));
        thread::sleep(Duration::from_millis(30));
        player.terminate();
        handle.join().unwrap();

        assert_eq!(player.phase(), PlayerPhase::Terminated);
    }
}
