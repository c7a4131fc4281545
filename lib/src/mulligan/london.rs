use crate::hypergeometric;
use crate::mulligan::{Mulligan, MulliganOutcome, SimCard};
use rand::prelude::*;

const STARTING_HAND_SIZE: usize = 7;
const MULLIGAN_FLOOR: usize = 5;

/// ByTurnCheck requires `at_least` cards of one role by turn `by_turn`, counting the hand
/// and the draws until then, with probability at least `min_probability`
#[derive(Debug, Clone, PartialEq)]
pub struct ByTurnCheck {
  pub role: SimCard,
  pub cards_in_deck: usize,
  pub by_turn: usize,
  pub at_least: usize,
  pub min_probability: f64,
}

/// ColorCheck requires, for every listed color, `required` sources among the kept lands.
/// The probability is the product over colors of drawing enough sources from the lands
#[derive(Debug, Clone, PartialEq)]
pub struct ColorCheck {
  /// (sources in deck, required) per color
  pub sources: Vec<(usize, usize)>,
  pub min_probability: f64,
}

/// KeepRules decide whether a hand is acceptable
#[derive(Debug, Clone, PartialEq)]
pub struct KeepRules {
  pub min_keep: usize,
  pub min_lands: usize,
  pub max_lands: usize,
  pub on_draw: bool,
  pub deck_size: usize,
  pub lands_in_deck: usize,
  pub by_turn: Vec<ByTurnCheck>,
  pub colors: Option<ColorCheck>,
}

impl Default for KeepRules {
  fn default() -> Self {
    Self {
      min_keep: 0,
      min_lands: 0,
      max_lands: STARTING_HAND_SIZE,
      on_draw: false,
      deck_size: 0,
      lands_in_deck: 0,
      by_turn: Vec::new(),
      colors: None,
    }
  }
}

impl KeepRules {
  /// `seen` are all cards drawn for this attempt, `hand` the cards left after bottoming
  pub fn accepts(&self, hand: &[SimCard], seen: &[SimCard]) -> bool {
    let lands = count(hand, SimCard::Land);
    if lands < self.min_lands || lands > self.max_lands {
      return false;
    }
    if count(hand, SimCard::Success) < self.min_keep {
      return false;
    }
    if !self.by_turn.iter().all(|check| self.passes_by_turn(check, hand, seen)) {
      return false;
    }
    match &self.colors {
      Some(colors) => self.color_probability(colors, lands) >= colors.min_probability,
      None => true,
    }
  }

  fn passes_by_turn(&self, check: &ByTurnCheck, hand: &[SimCard], seen: &[SimCard]) -> bool {
    let need = check.at_least.saturating_sub(count(hand, check.role));
    if need == 0 {
      return true;
    }
    // Bottomed cards are out of reach, so the library is everything not yet seen
    let draws = if self.on_draw {
      check.by_turn
    } else {
      check.by_turn.saturating_sub(1)
    };
    let population = self.deck_size.saturating_sub(seen.len());
    let remaining = check.cards_in_deck.saturating_sub(count(seen, check.role));
    let p = hypergeometric::at_least(
      need as i64,
      remaining as i64,
      population as i64,
      draws as i64,
    );
    p >= check.min_probability
  }

  fn color_probability(&self, colors: &ColorCheck, hand_lands: usize) -> f64 {
    colors
      .sources
      .iter()
      .map(|(sources, required)| {
        hypergeometric::at_least(
          *required as i64,
          *sources as i64,
          self.lands_in_deck as i64,
          hand_lands as i64,
        )
      })
      .product()
  }

  /// Returns the index of the card to put on the bottom
  fn bottom_index(&self, hand: &[SimCard]) -> usize {
    let position = |role: SimCard| hand.iter().rposition(|c| *c == role);
    if count(hand, SimCard::Land) > self.max_lands {
      if let Some(i) = position(SimCard::Land) {
        return i;
      }
    }
    let spare_spell = position(SimCard::Blank)
      .or_else(|| position(SimCard::Removal))
      .or_else(|| position(SimCard::Ramp))
      .or_else(|| {
        if count(hand, SimCard::Success) > self.min_keep {
          position(SimCard::Success)
        } else {
          None
        }
      });
    spare_spell
      .or_else(|| position(SimCard::Land))
      .unwrap_or(hand.len() - 1)
  }
}

fn count(cards: &[SimCard], role: SimCard) -> usize {
  cards.iter().filter(|c| **c == role).count()
}

/// London represents a mulligan strategy that adheres to the
/// [London mulligan rule](https://mtg.gamepedia.com/Mulligan#London_mulligan),
/// optionally with the first mulligan free
#[derive(Debug, Clone, PartialEq)]
pub struct London {
  pub starting_hand_size: usize,
  pub mulligan_down_to: usize,
  pub free_mulligan: bool,
  pub rules: KeepRules,
}

impl London {
  pub fn new(rules: KeepRules, free_mulligan: bool) -> Self {
    Self {
      starting_hand_size: STARTING_HAND_SIZE,
      mulligan_down_to: MULLIGAN_FLOOR,
      free_mulligan,
      rules,
    }
  }
}

impl Mulligan for London {
  fn simulate_hand(&self, mut rng: &mut impl Rng, deck: &[SimCard]) -> MulliganOutcome {
    let cards_to_draw = std::cmp::min(self.starting_hand_size, deck.len());
    // Shuffle an index range rather than the immutable `deck` slice
    let mut index_range: Vec<_> = (0..deck.len()).collect();
    let mut hand_size = self.starting_hand_size;
    let mut mulligans = 0;
    let mut first_shipped = None;
    loop {
      let seen: Vec<SimCard> = index_range
        .partial_shuffle(&mut rng, cards_to_draw)
        .0
        .iter()
        .map(|i| deck[*i])
        .collect();
      let mut hand = seen.clone();
      while hand.len() > hand_size {
        let i = self.rules.bottom_index(&hand);
        hand.remove(i);
      }

      let accepted = self.rules.accepts(&hand, &seen);
      let at_floor = hand_size <= self.mulligan_down_to;
      if accepted || at_floor {
        return MulliganOutcome {
          hand,
          mulligans,
          hand_size,
          accepted,
          first_shipped,
        };
      }
      if first_shipped.is_none() {
        first_shipped = Some(hand);
      }
      let free = self.free_mulligan && mulligans == 0;
      mulligans += 1;
      if !free {
        hand_size -= 1;
      }
    }
  }
}
