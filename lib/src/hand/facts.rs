use crate::categories::CategoryTables;
use crate::color::ColorSet;

/// HandFacts is what a hand contains, as seen through the category tables
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandFacts {
  pub hand_land_count: usize,
  pub colors_available: ColorSet,
  pub has_fast_mana: bool,
  pub has_ramp: bool,
  pub has_draw_engine: bool,
  pub has_interaction: bool,
  pub has_protection: bool,
  pub has_tutor: bool,
}

impl HandFacts {
  /// Extracts facts from a hand of card names. An empty hand yields the default facts
  pub fn from_hand<S: AsRef<str>>(tables: &CategoryTables, hand: &[S]) -> Self {
    let mut facts = Self::default();
    for name in hand {
      let name = name.as_ref();
      let traits = tables.classify(name);
      if traits.land {
        facts.hand_land_count += 1;
        facts.colors_available = facts.colors_available.union(tables.land_colors(name));
        continue;
      }
      facts.has_fast_mana |= traits.fast_mana;
      facts.has_ramp |= traits.ramp;
      facts.has_draw_engine |= traits.draw_engine;
      facts.has_interaction |= traits.interaction;
      facts.has_protection |= traits.protection;
      facts.has_tutor |= traits.tutor;
    }
    facts
  }

  /// Fast mana or ramp
  #[inline]
  pub fn has_acceleration(&self) -> bool {
    self.has_fast_mana || self.has_ramp
  }
}
