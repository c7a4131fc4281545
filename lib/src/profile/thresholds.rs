/// ProfileThresholds holds every tunable constant used to characterize a deck.
/// Missing fields deserialize to their defaults, so a partial JSON override is valid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileThresholds {
  /// Fast mana count worth +3 velocity
  pub velocity_fast_mana: usize,
  /// Tutor count worth +2 velocity
  pub velocity_tutors: usize,
  /// One drop plus two drop count worth +2 velocity
  pub velocity_cheap_drops: usize,
  /// Draw count worth +2 velocity
  pub velocity_draw: usize,
  /// Interaction count worth +1 velocity
  pub velocity_interaction: usize,

  pub combo_velocity: u8,
  pub combo_tutors: usize,
  /// Combo decks with at least this much interaction are combo_control
  pub combo_control_interaction: usize,
  pub control_draw: usize,
  pub control_interaction: usize,
  /// Control decks run strictly fewer tutors than this
  pub control_max_tutors: usize,
  pub midrange_draw_min: usize,
  pub midrange_draw_max: usize,
  pub midrange_ramp_min: usize,
  pub midrange_ramp_max: usize,

  pub ramp_heavy: usize,
  pub lands_matter: usize,
  pub value_engine_ramp: usize,
  pub value_engine_draw: usize,
  pub interaction_heavy: usize,
  pub fast_mana_hint: usize,

  /// (land + ramp) / total at or below which an unclassified deck mulligans aggressively
  pub aggressive_density: f64,
  /// (land + ramp) / total at or above which an unclassified deck mulligans conservatively
  pub conservative_density: f64,

  pub plan_ramp: usize,
  pub plan_tutors: usize,
  pub plan_velocity: u8,

  /// Land sources of one color needed to infer it as part of the identity
  pub identity_min_sources: usize,
  pub identity_max_colors: usize,

  pub incomplete_min_cards: usize,
  /// Land detection is incomplete when a full deck has strictly fewer lands than this
  pub incomplete_max_lands: usize,
}

impl Default for ProfileThresholds {
  fn default() -> Self {
    Self {
      velocity_fast_mana: 5,
      velocity_tutors: 6,
      velocity_cheap_drops: 25,
      velocity_draw: 4,
      velocity_interaction: 8,
      combo_velocity: 7,
      combo_tutors: 4,
      combo_control_interaction: 6,
      control_draw: 5,
      control_interaction: 8,
      control_max_tutors: 4,
      midrange_draw_min: 3,
      midrange_draw_max: 8,
      midrange_ramp_min: 6,
      midrange_ramp_max: 14,
      ramp_heavy: 12,
      lands_matter: 38,
      value_engine_ramp: 8,
      value_engine_draw: 8,
      interaction_heavy: 8,
      fast_mana_hint: 5,
      aggressive_density: 0.38,
      conservative_density: 0.50,
      plan_ramp: 8,
      plan_tutors: 4,
      plan_velocity: 6,
      identity_min_sources: 5,
      identity_max_colors: 2,
      incomplete_min_cards: 90,
      incomplete_max_lands: 20,
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::profile::ProfileThresholds;

  #[test]
  fn partial_override_keeps_defaults() {
    let t: ProfileThresholds = serde_json::from_str(r#"{"rampHeavy": 10}"#).unwrap();
    assert_eq!(t.ramp_heavy, 10);
    assert_eq!(t.lands_matter, 38);
    assert_eq!(t, ProfileThresholds { ramp_heavy: 10, ..Default::default() });
  }
}
