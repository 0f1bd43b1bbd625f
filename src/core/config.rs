//! Game configuration.
//!
//! `GameConfig` holds the fixed parameters of a game: grid shape, deck and
//! card features, the turn timer, freeze durations and the players. Build
//! one in code with the `with_*` methods, or load it from TOML:
//!
//! ```
//! use rust_set::core::GameConfig;
//!
//! let config = GameConfig::from_toml_str(
//!     r#"
//!     rows = 3
//!     columns = 4
//!     computer_players = 2
//!     turn_timeout_millis = 30000
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.table_size(), 12);
//! assert_eq!(config.player_count(), 2);
//! assert_eq!(config.turn_timeout().as_secs(), 30);
//! ```
//!
//! Missing keys fall back to `GameConfig::default()`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::player::{PlayerId, PlayerKind};

/// Complete game configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of players fed by the input surface.
    pub human_players: usize,

    /// Number of players driven by a random key-press generator.
    pub computer_players: usize,

    /// Display names, by player index. Missing entries use "Player N".
    pub player_names: Vec<String>,

    /// Table rows.
    pub rows: usize,

    /// Table columns.
    pub columns: usize,

    /// Number of cards in the deck. At most `feature_size ^ feature_count`.
    pub deck_size: usize,

    /// Number of features per card.
    pub feature_count: usize,

    /// Number of values each feature can take.
    pub feature_size: usize,

    /// Time a round lasts without a legal set being found.
    pub turn_timeout_millis: u64,

    /// Remaining time under which the countdown is shown as a warning.
    pub turn_timeout_warning_millis: u64,

    /// Freeze after scoring a point.
    pub point_freeze_millis: u64,

    /// Freeze after claiming an illegal set.
    pub penalty_freeze_millis: u64,

    /// Simulated latency of placing or removing a card.
    pub table_delay_millis: u64,

    /// Log every legal set on the table after each deal.
    pub hints: bool,

    /// Seed for shuffles and computer players. Random when unset.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            human_players: 2,
            computer_players: 0,
            player_names: Vec::new(),
            rows: 3,
            columns: 4,
            deck_size: 81,
            feature_count: 4,
            feature_size: 3,
            turn_timeout_millis: 60_000,
            turn_timeout_warning_millis: 5_000,
            point_freeze_millis: 1_000,
            penalty_freeze_millis: 3_000,
            table_delay_millis: 100,
            hints: false,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check that the parameters describe a playable game.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let players = self.player_count();
        if players == 0 || players > 255 {
            return Err(ConfigError::Invalid(format!(
                "player count must be 1-255, got {players}"
            )));
        }
        if self.table_size() == 0 {
            return Err(ConfigError::Invalid("table must have at least one slot".into()));
        }
        if self.feature_size < 2 || self.feature_count == 0 {
            return Err(ConfigError::Invalid(format!(
                "cards need at least one feature with two values, got {}x{}",
                self.feature_count, self.feature_size
            )));
        }
        if self.feature_size > u8::MAX as usize + 1 {
            return Err(ConfigError::Invalid(format!(
                "feature values must fit a byte, got {} values",
                self.feature_size
            )));
        }
        match self.max_deck_size() {
            Some(max) if self.deck_size <= max => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "deck size {} exceeds {}^{} distinct cards",
                    self.deck_size, self.feature_size, self.feature_count
                )))
            }
        }
        if self.deck_size > u32::MAX as usize {
            return Err(ConfigError::Invalid("deck size does not fit a card id".into()));
        }
        if self.turn_timeout_millis == 0 {
            return Err(ConfigError::Invalid("turn timeout must be positive".into()));
        }
        Ok(())
    }

    fn max_deck_size(&self) -> Option<usize> {
        let exponent = u32::try_from(self.feature_count).ok()?;
        self.feature_size.checked_pow(exponent)
    }

    /// Total number of players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.human_players + self.computer_players
    }

    /// Number of slots on the table.
    #[must_use]
    pub fn table_size(&self) -> usize {
        self.rows * self.columns
    }

    /// Humans take the first ids, computers the rest.
    #[must_use]
    pub fn player_kind(&self, player: PlayerId) -> PlayerKind {
        if player.index() < self.human_players {
            PlayerKind::Human
        } else {
            PlayerKind::Computer
        }
    }

    /// Display name of a player.
    #[must_use]
    pub fn player_name(&self, player: PlayerId) -> String {
        self.player_names
            .get(player.index())
            .cloned()
            .unwrap_or_else(|| player.to_string())
    }

    #[must_use]
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_millis)
    }

    #[must_use]
    pub fn turn_timeout_warning(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_warning_millis)
    }

    #[must_use]
    pub fn point_freeze(&self) -> Duration {
        Duration::from_millis(self.point_freeze_millis)
    }

    #[must_use]
    pub fn penalty_freeze(&self) -> Duration {
        Duration::from_millis(self.penalty_freeze_millis)
    }

    #[must_use]
    pub fn table_delay(&self) -> Duration {
        Duration::from_millis(self.table_delay_millis)
    }

    /// Set the number of human and computer players.
    #[must_use]
    pub fn with_players(mut self, human: usize, computer: usize) -> Self {
        self.human_players = human;
        self.computer_players = computer;
        self
    }

    /// Set the table shape.
    #[must_use]
    pub fn with_grid(mut self, rows: usize, columns: usize) -> Self {
        self.rows = rows;
        self.columns = columns;
        self
    }

    /// Set the deck size.
    #[must_use]
    pub fn with_deck_size(mut self, deck_size: usize) -> Self {
        self.deck_size = deck_size;
        self
    }

    /// Set the turn timeout and its warning threshold.
    #[must_use]
    pub fn with_turn_timeout(mut self, timeout: Duration, warning: Duration) -> Self {
        self.turn_timeout_millis = timeout.as_millis() as u64;
        self.turn_timeout_warning_millis = warning.as_millis() as u64;
        self
    }

    /// Set the point and penalty freeze durations.
    #[must_use]
    pub fn with_freezes(mut self, point: Duration, penalty: Duration) -> Self {
        self.point_freeze_millis = point.as_millis() as u64;
        self.penalty_freeze_millis = penalty.as_millis() as u64;
        self
    }

    /// Set the simulated card placement latency.
    #[must_use]
    pub fn with_table_delay(mut self, delay: Duration) -> Self {
        self.table_delay_millis = delay.as_millis() as u64;
        self
    }

    /// Enable or disable hint logging.
    #[must_use]
    pub fn with_hints(mut self, hints: bool) -> Self {
        self.hints = hints;
        self
    }

    /// Fix the game seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
