//! Wiring a whole game together and running it on its own threads.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rust_set::cards::FeatureOracle;
//! use rust_set::core::GameConfig;
//! use rust_set::ui::TracingInterface;
//! use rust_set::Game;
//!
//! let config = GameConfig::new().with_players(0, 3).with_seed(42);
//! let oracle = Arc::new(FeatureOracle::from_config(&config));
//! let handle = Game::start(config, oracle, Arc::new(TracingInterface)).unwrap();
//!
//! let winners = handle.join().unwrap();
//! println!("winners: {winners:?}");
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::cards::SetOracle;
use crate::core::{GameConfig, GameError, GameRng, PlayerId, PlayerMap, Result, SlotId};
use crate::dealer::{ClaimBoard, Dealer, Terminator};
use crate::players::Player;
use crate::table::Table;
use crate::ui::UserInterface;

/// Builds the shared state of a game and launches the dealer thread.
pub struct Game;

impl Game {
    /// Validate `config`, build the table, players and dealer, and start
    /// the dealer thread. The dealer starts the player threads itself.
    pub fn start(
        config: GameConfig,
        oracle: Arc<dyn SetOracle>,
        ui: Arc<dyn UserInterface>,
    ) -> Result<GameHandle> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => GameRng::new(seed),
            None => GameRng::from_entropy(),
        };
        info!(
            seed = rng.seed(),
            humans = config.human_players,
            computers = config.computer_players,
            rows = config.rows,
            columns = config.columns,
            "starting game"
        );

        let table = Arc::new(Table::from_config(&config, Arc::clone(&ui)));
        let claims = Arc::new(ClaimBoard::new());
        let players = PlayerMap::new(config.player_count(), |id| {
            Arc::new(
                Player::new(
                    id,
                    config.player_kind(id),
                    Arc::clone(&table),
                    Arc::clone(&claims),
                    Arc::clone(&ui),
                )
                .with_name(config.player_name(id))
                .with_freezes(config.point_freeze(), config.penalty_freeze()),
            )
        });

        let dealer = Dealer::new(&config, Arc::clone(&table), claims, players.clone(), oracle, ui, &rng);
        let terminator = dealer.terminator();

        let dealer = thread::Builder::new()
            .name("dealer".into())
            .spawn(move || dealer.run())
            .map_err(|source| GameError::Spawn {
                name: "dealer".into(),
                source,
            })?;

        Ok(GameHandle {
            players,
            table,
            terminator,
            dealer: Some(dealer),
        })
    }
}

/// A running game. Dropping the handle terminates the game without waiting
/// for it.
pub struct GameHandle {
    players: PlayerMap<Arc<Player>>,
    table: Arc<Table>,
    terminator: Terminator,
    dealer: Option<JoinHandle<Result<Vec<PlayerId>>>>,
}

impl GameHandle {
    /// Forward a key press to a human player. Returns false if the player is
    /// unknown, not human, or not accepting input right now.
    pub fn key_pressed(&self, player: PlayerId, slot: SlotId) -> bool {
        match self.players.get(player) {
            Some(p) if p.kind().is_human() => p.key_pressed(slot),
            Some(_) => {
                warn!(%player, "key press for a computer player ignored");
                false
            }
            None => false,
        }
    }

    #[must_use]
    pub fn player(&self, player: PlayerId) -> Option<&Arc<Player>> {
        self.players.get(player)
    }

    #[must_use]
    pub fn players(&self) -> &PlayerMap<Arc<Player>> {
        &self.players
    }

    #[must_use]
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Whether the game has ended or been stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.terminator.is_terminated()
    }

    /// Stop the game. Blocked players are released and every thread winds
    /// down; use `join` to wait for them.
    pub fn terminate(&self) {
        self.terminator.terminate();
    }

    /// Wait for the game to end and return the winners.
    pub fn join(mut self) -> Result<Vec<PlayerId>> {
        match self.dealer.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| GameError::Panicked("dealer".into()))?,
            None => Ok(Vec::new()),
        }
    }
}

impl Drop for GameHandle {
    fn drop(&mut self) {
        if self.dealer.is_some() {
            self.terminator.terminate();
        }
    }
}

impl std::fmt::Debug for GameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameHandle")
            .field("players", &self.players.player_count())
            .field("table", &self.table)
            .field("finished", &self.is_finished())
            .finish()
    }
}
