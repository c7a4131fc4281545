use crate::categories::CategoryTables;
use crate::hand::HandFacts;
use crate::profile::DeckProfile;

/// Known commanders with at least this many colors need two of them from the opener
const MULTICOLOR_COMMANDER_COLORS: usize = 3;
const FLOOD_LANDS: usize = 5;
const STALL_LANDS: usize = 2;

/// HandTags are tactical flags derived from a hand, its facts and the deck profile
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandTags {
  pub has_turn1_play: bool,
  pub has_turn2_engine: bool,
  pub has_protection_or_silence_effect: bool,
  pub has_tutor_but_no_plan: bool,
  pub is_color_screwed: bool,
  pub is_flood_risk: bool,
  pub is_stall_risk: bool,
}

impl HandTags {
  pub fn compute<S: AsRef<str>>(
    tables: &CategoryTables,
    hand: &[S],
    facts: &HandFacts,
    profile: &DeckProfile,
  ) -> Self {
    let traits: Vec<_> = hand.iter().map(|name| tables.classify(name.as_ref())).collect();
    let lands = facts.hand_land_count;
    let accelerates = facts.has_acceleration();

    let has_one_drop_accelerant = traits.iter().any(|t| t.one_drop_accelerant);
    let has_turn1_play =
      lands >= 1 && (facts.has_fast_mana || (facts.has_ramp && has_one_drop_accelerant));

    let has_turn2_engine = traits.iter().any(|t| t.draw_engine && t.early_engine);

    let is_color_screwed = match profile.color_identity {
      Some(identity) if lands >= 2 && !identity.is_empty() => {
        let required = if profile.commander_known && identity.len() >= MULTICOLOR_COMMANDER_COLORS {
          2
        } else {
          1
        };
        let required = required.min(lands);
        facts.colors_available.intersection(identity).len() < required
      }
      _ => false,
    };

    Self {
      has_turn1_play,
      has_turn2_engine,
      has_protection_or_silence_effect: facts.has_protection,
      has_tutor_but_no_plan: facts.has_tutor && !accelerates && !facts.has_draw_engine,
      is_color_screwed,
      is_flood_risk: lands >= FLOOD_LANDS,
      is_stall_risk: lands <= STALL_LANDS && !accelerates,
    }
  }
}
