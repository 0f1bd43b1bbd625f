//! Set legality.
//!
//! The dealer never interprets cards itself; it asks a `SetOracle`. The
//! crate ships `FeatureOracle`, the classic rule: every card is a vector of
//! features and three cards form a set iff, for each feature, the three
//! values are all equal or all distinct.

use smallvec::SmallVec;

use crate::core::{CardId, GameConfig};

/// Feature values of one card, most significant feature first.
pub type Features = SmallVec<[u8; 4]>;

/// Decides which triples of cards are legal sets.
///
/// Implementations must be pure: the same cards always give the same answer.
/// They are shared by the dealer and the hint logger across threads.
pub trait SetOracle: Send + Sync {
    /// Whether the three cards form a legal set.
    fn is_legal_set(&self, cards: &[CardId; 3]) -> bool;

    /// Feature decomposition of a card, used for diagnostics.
    fn card_features(&self, card: CardId) -> Features;

    /// Find up to `limit` legal sets among `cards`.
    ///
    /// Default implementation tries every triple in order.
    fn find_sets(&self, cards: &[CardId], limit: usize) -> Vec<[CardId; 3]> {
        let mut found = Vec::new();
        if limit == 0 {
            return found;
        }

        for i in 0..cards.len() {
            for j in (i + 1)..cards.len() {
                for k in (j + 1)..cards.len() {
                    let triple = [cards[i], cards[j], cards[k]];
                    if self.is_legal_set(&triple) {
                        found.push(triple);
                        if found.len() >= limit {
                            return found;
                        }
                    }
                }
            }
        }

        found
    }

    /// Whether any legal set exists among `cards`.
    fn has_set(&self, cards: &[CardId]) -> bool {
        !self.find_sets(cards, 1).is_empty()
    }
}

/// Oracle for cards whose id encodes `feature_count` base-`feature_size`
/// digits.
///
/// ```
/// use rust_set::cards::{FeatureOracle, SetOracle};
/// use rust_set::core::CardId;
///
/// let oracle = FeatureOracle::new(4, 3);
///
/// // 0 = [0,0,0,0], 1 = [0,0,0,1], 2 = [0,0,0,2]: last feature all distinct
/// assert!(oracle.is_legal_set(&[CardId(0), CardId(1), CardId(2)]));
///
/// // 3 = [0,0,1,0]: third feature is 0,0,1
/// assert!(!oracle.is_legal_set(&[CardId(0), CardId(1), CardId(3)]));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureOracle {
    feature_count: usize,
    feature_size: usize,
}

impl FeatureOracle {
    /// Create an oracle for cards with `feature_count` features of
    /// `feature_size` values each.
    #[must_use]
    pub fn new(feature_count: usize, feature_size: usize) -> Self {
        assert!(feature_size >= 2, "Features need at least two values");
        assert!(feature_size <= u8::MAX as usize + 1, "Feature values must fit a u8");
        Self {
            feature_count,
            feature_size,
        }
    }

    /// Oracle matching a game configuration.
    #[must_use]
    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.feature_count, config.feature_size)
    }

    fn feature_at(&self, card: CardId, feature: usize) -> usize {
        let shift = self.feature_count - 1 - feature;
        let mut value = card.index();
        for _ in 0..shift {
            value /= self.feature_size;
        }
        value % self.feature_size
    }
}

impl SetOracle for FeatureOracle {
    fn is_legal_set(&self, cards: &[CardId; 3]) -> bool {
        if cards[0] == cards[1] || cards[1] == cards[2] || cards[0] == cards[2] {
            return false;
        }

        (0..self.feature_count).all(|feature| {
            let a = self.feature_at(cards[0], feature);
            let b = self.feature_at(cards[1], feature);
            let c = self.feature_at(cards[2], feature);
            let all_same = a == b && b == c;
            let all_distinct = a != b && b != c && a != c;
            all_same || all_distinct
        })
    }

    fn card_features(&self, card: CardId) -> Features {
        (0..self.feature_count)
            .map(|feature| self.feature_at(card, feature) as u8)
            .collect()
    }
}
