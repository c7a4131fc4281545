//! # Mulligan strategies
//!
//! The `mulligan` module defines a `Mulligan` trait over a synthetic deck, where cards are
//! only known by their role, and the London mulligan implementation used by the simulator.
use rand::prelude::*;

mod london;

pub use london::{ByTurnCheck, ColorCheck, KeepRules, London};

/// SimCard is the role a card plays in a synthetic deck
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimCard {
  Land,
  /// A card the hand is looking for, i.e. a combo piece or a key engine
  Success,
  Ramp,
  Removal,
  Blank,
}

impl SimCard {
  #[inline]
  pub fn is_land(self) -> bool {
    self == SimCard::Land
  }
}

/// MulliganOutcome is the final hand of one mulligan sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulliganOutcome {
  /// The cards kept, after bottoming
  pub hand: Vec<SimCard>,
  /// Number of hands shipped before this one
  pub mulligans: usize,
  /// The hand size this hand was kept at, 7 less any mulligans that were not free
  pub hand_size: usize,
  /// False when the hand failed the keep rules and was kept only because the floor was reached
  pub accepted: bool,
  /// The first hand shipped, if any
  pub first_shipped: Option<Vec<SimCard>>,
}

impl MulliganOutcome {
  pub fn land_count(&self) -> usize {
    self.hand.iter().filter(|c| c.is_land()).count()
  }
}

/// The base trait for any mulligan type
pub trait Mulligan {
  /// Returns the hand kept after a full mulligan sequence
  ///
  /// # Arguments
  ///
  /// * `rng` - A random number generator used to shuffle the deck
  /// * `deck` - The synthetic deck to draw from
  fn simulate_hand(&self, rng: &mut impl Rng, deck: &[SimCard]) -> MulliganOutcome;
}
