//! # Deck profiles
//!
//! A `DeckProfile` is the aggregate characterization of a decklist: category densities,
//! a coarse archetype, how aggressively the deck should mulligan and what the commander
//! is expected to do. Building a profile is a pure function of the category tables,
//! the thresholds, the cards and the commander name.
mod cache;
mod thresholds;

pub use cache::ProfileCache;
pub use thresholds::ProfileThresholds;

use crate::categories::{CategoryTables, CommanderPlan};
use crate::color::{ColorSet, ManaColor};
use crate::decklist::ParsedCard;
use std::collections::BTreeSet;

/// Archetype is the coarse game plan inferred from category counts
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
  TurboCombo,
  ComboControl,
  MidrangeValue,
  Control,
  Unknown,
}

impl Archetype {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::TurboCombo => "turbo_combo",
      Self::ComboControl => "combo_control",
      Self::MidrangeValue => "midrange_value",
      Self::Control => "control",
      Self::Unknown => "unknown",
    }
  }
}

/// MulliganStyle is how demanding the deck is about its opening hand
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MulliganStyle {
  Aggressive,
  Balanced,
  Conservative,
}

impl MulliganStyle {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Aggressive => "aggressive",
      Self::Balanced => "balanced",
      Self::Conservative => "conservative",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckProfile {
  pub total_cards: usize,
  pub land_count: usize,
  pub land_percent: usize,
  pub fast_mana_count: usize,
  pub ramp_count: usize,
  pub tutor_count: usize,
  pub draw_count: usize,
  pub removal_count: usize,
  pub protection_count: usize,
  pub one_drop_count: usize,
  pub two_drop_count: usize,
  /// 0 to 10
  pub velocity_score: u8,
  pub archetype: Archetype,
  pub archetype_hints: BTreeSet<String>,
  pub mulligan_style: MulliganStyle,
  pub commander: Option<String>,
  /// True when the commander was found in the known commander table
  pub commander_known: bool,
  pub commander_plan: CommanderPlan,
  pub color_identity: Option<ColorSet>,
  pub land_detection_incomplete: bool,
  pub expected_turn1: Vec<String>,
  pub expected_turn2: Vec<String>,
  pub keep_heuristics: Vec<String>,
  pub notes: Vec<String>,
}

#[derive(Debug, Default)]
struct Counts {
  total: usize,
  land: usize,
  fast_mana: usize,
  ramp: usize,
  tutor: usize,
  draw: usize,
  removal: usize,
  protection: usize,
  one_drop: usize,
  two_drop: usize,
  /// Land sources per color in WUBRG order, excluding lands that make any color
  sources: [usize; 5],
}

impl Counts {
  fn tally(tables: &CategoryTables, cards: &[ParsedCard]) -> Self {
    let mut counts = Self::default();
    for card in cards {
      let n = card.count;
      counts.total = counts.total.saturating_add(n);
      let traits = tables.classify(&card.name);
      if traits.land {
        counts.land = counts.land.saturating_add(n);
        let colors = tables.land_colors(&card.name);
        if colors != ColorSet::all() {
          for color in colors.iter() {
            counts.sources[color as usize] = counts.sources[color as usize].saturating_add(n);
          }
        }
        continue;
      }
      let add = |flag: bool, field: &mut usize| {
        if flag {
          *field = field.saturating_add(n);
        }
      };
      add(traits.fast_mana, &mut counts.fast_mana);
      add(traits.ramp, &mut counts.ramp);
      add(traits.tutor, &mut counts.tutor);
      add(traits.draw_engine, &mut counts.draw);
      add(traits.interaction, &mut counts.removal);
      add(traits.protection, &mut counts.protection);
      add(traits.one_drop, &mut counts.one_drop);
      add(traits.two_drop, &mut counts.two_drop);
    }
    counts
  }
}

impl DeckProfile {
  /// Builds a profile with the default thresholds
  pub fn from_cards(tables: &CategoryTables, cards: &[ParsedCard], commander: Option<&str>) -> Self {
    Self::build(tables, &ProfileThresholds::default(), cards, commander)
  }

  pub fn build(
    tables: &CategoryTables,
    t: &ProfileThresholds,
    cards: &[ParsedCard],
    commander: Option<&str>,
  ) -> Self {
    let c = Counts::tally(tables, cards);
    let commander = commander
      .map(|name| name.trim())
      .filter(|name| !name.is_empty())
      .map(|name| name.to_string());

    let land_percent = if c.total == 0 {
      0
    } else {
      ((c.land as f64 / c.total as f64) * 100.0).round() as usize
    };

    let mut velocity_score: u8 = 0;
    if c.fast_mana >= t.velocity_fast_mana {
      velocity_score += 3;
    }
    if c.tutor >= t.velocity_tutors {
      velocity_score += 2;
    }
    if c.one_drop.saturating_add(c.two_drop) >= t.velocity_cheap_drops {
      velocity_score += 2;
    }
    if c.draw >= t.velocity_draw {
      velocity_score += 2;
    }
    if c.removal >= t.velocity_interaction {
      velocity_score += 1;
    }
    let velocity_score = velocity_score.min(10);

    let archetype = if velocity_score >= t.combo_velocity && c.tutor >= t.combo_tutors {
      if c.removal >= t.combo_control_interaction {
        Archetype::ComboControl
      } else {
        Archetype::TurboCombo
      }
    } else if c.draw >= t.control_draw
      && c.removal >= t.control_interaction
      && c.tutor < t.control_max_tutors
    {
      Archetype::Control
    } else if (t.midrange_draw_min..=t.midrange_draw_max).contains(&c.draw)
      && (t.midrange_ramp_min..=t.midrange_ramp_max).contains(&c.ramp)
    {
      Archetype::MidrangeValue
    } else {
      Archetype::Unknown
    };

    let mut archetype_hints = BTreeSet::new();
    if archetype != Archetype::Unknown {
      archetype_hints.insert(archetype.as_str().to_string());
    }
    if c.ramp >= t.ramp_heavy {
      archetype_hints.insert("ramp-heavy".to_string());
    }
    if c.land >= t.lands_matter {
      archetype_hints.insert("lands-matter".to_string());
    }
    if c.ramp >= t.value_engine_ramp && c.draw >= t.value_engine_draw {
      archetype_hints.insert("value-engine".to_string());
    }
    if c.removal >= t.interaction_heavy {
      archetype_hints.insert("interaction-heavy".to_string());
    }
    if c.fast_mana >= t.fast_mana_hint {
      archetype_hints.insert("fast-mana".to_string());
    }

    let mulligan_style = match archetype {
      Archetype::TurboCombo => MulliganStyle::Aggressive,
      Archetype::Control => MulliganStyle::Conservative,
      Archetype::ComboControl | Archetype::MidrangeValue => MulliganStyle::Balanced,
      Archetype::Unknown if c.total == 0 => MulliganStyle::Balanced,
      Archetype::Unknown => {
        let density = c.land.saturating_add(c.ramp) as f64 / c.total as f64;
        if density <= t.aggressive_density {
          MulliganStyle::Aggressive
        } else if density >= t.conservative_density {
          MulliganStyle::Conservative
        } else {
          MulliganStyle::Balanced
        }
      }
    };

    let known = commander.as_deref().and_then(|name| tables.commander(name));
    let commander_known = known.is_some();
    let commander_plan = match known {
      Some(k) => k.plan,
      None if commander.is_some()
        && c.ramp >= t.plan_ramp
        && c.tutor >= t.plan_tutors
        && velocity_score >= t.plan_velocity =>
      {
        CommanderPlan::EarlyEngine
      }
      None => CommanderPlan::Unknown,
    };

    let land_detection_incomplete =
      c.total >= t.incomplete_min_cards && c.land < t.incomplete_max_lands;

    let color_identity = match known {
      Some(k) => Some(k.colors),
      None if land_detection_incomplete => None,
      None => {
        let inferred: ColorSet = ManaColor::ALL
          .iter()
          .copied()
          .filter(|color| c.sources[*color as usize] >= t.identity_min_sources)
          .collect();
        if !inferred.is_empty() && inferred.len() <= t.identity_max_colors {
          Some(inferred)
        } else {
          None
        }
      }
    };

    let mut expected_turn1 = Vec::new();
    if c.fast_mana >= 3 {
      expected_turn1.push("fast mana".to_string());
    }
    if c.ramp >= 6 {
      expected_turn1.push("mana dork".to_string());
    }
    if c.draw >= 3 {
      expected_turn1.push("cantrip".to_string());
    }
    if c.removal >= 6 {
      expected_turn1.push("interaction".to_string());
    }
    if expected_turn1.is_empty() {
      expected_turn1.push("land drop".to_string());
    }

    let mut expected_turn2 = Vec::new();
    if c.draw >= 4 {
      expected_turn2.push("engine".to_string());
    }
    if c.tutor >= 4 {
      expected_turn2.push("tutor".to_string());
    }
    if commander_plan == CommanderPlan::EarlyEngine {
      expected_turn2.push("commander".to_string());
    }
    if c.protection >= 3 || c.removal >= 6 {
      expected_turn2.push("hold up protection".to_string());
    }
    if expected_turn2.is_empty() {
      expected_turn2.push("ramp or value".to_string());
    }

    let mut keep_heuristics = Vec::new();
    match mulligan_style {
      MulliganStyle::Aggressive => {
        keep_heuristics.push("Openers without fast mana or a mana dork are below average".to_string());
        if c.tutor >= 4 {
          keep_heuristics.push("Look for a tutor or a combo piece".to_string());
        }
      }
      MulliganStyle::Balanced => {
        keep_heuristics
          .push("Two or three lands plus one accelerant and one engine or answer".to_string());
        if c.draw >= 4 {
          keep_heuristics.push("A draw engine in the opener smooths later turns".to_string());
        }
      }
      MulliganStyle::Conservative => {
        keep_heuristics.push("Stable mana plus a draw spell or an answer".to_string());
        if c.removal >= 8 {
          keep_heuristics.push("Interaction density carries the deck".to_string());
        }
      }
    }
    if land_percent < 34 && archetype != Archetype::Control {
      keep_heuristics.push(format!(
        "Only {}% of the deck is land, favor land heavy openers",
        land_percent
      ));
    }
    if commander_plan == CommanderPlan::EarlyEngine {
      if mulligan_style == MulliganStyle::Aggressive || velocity_score >= 7 {
        keep_heuristics
          .push("The commander must land on turn two or three, ship hands that cannot".to_string());
      } else {
        keep_heuristics
          .push("Casting the commander early helps, but stable mana is still a keep".to_string());
      }
    }

    let mut notes = vec![
      format!("{}% lands ({})", land_percent, c.land),
      format!(
        "fastMana={} ramp={} tutors={}",
        c.fast_mana, c.ramp, c.tutor
      ),
      format!(
        "draw={} interaction={} protection={}",
        c.draw, c.removal, c.protection
      ),
      format!(
        "velocity={} archetype={} style={}",
        velocity_score,
        archetype.as_str(),
        mulligan_style.as_str()
      ),
    ];
    if let Some(identity) = color_identity {
      notes.push(format!("identity={}", identity));
    }
    if land_detection_incomplete {
      notes.push("land detection looks incomplete".to_string());
    }

    let profile = Self {
      total_cards: c.total,
      land_count: c.land,
      land_percent,
      fast_mana_count: c.fast_mana,
      ramp_count: c.ramp,
      tutor_count: c.tutor,
      draw_count: c.draw,
      removal_count: c.removal,
      protection_count: c.protection,
      one_drop_count: c.one_drop,
      two_drop_count: c.two_drop,
      velocity_score,
      archetype,
      archetype_hints,
      mulligan_style,
      commander,
      commander_known,
      commander_plan,
      color_identity,
      land_detection_incomplete,
      expected_turn1,
      expected_turn2,
      keep_heuristics,
      notes,
    };
    debug!(
      "built deck profile: {} cards, {} lands, archetype {}, style {}",
      profile.total_cards,
      profile.land_count,
      profile.archetype.as_str(),
      profile.mulligan_style.as_str()
    );
    profile
  }

  /// A short one line summary, suitable for logs and advisor context
  pub fn summary(&self) -> String {
    let mut hints: Vec<&str> = self.archetype_hints.iter().map(|h| h.as_str()).collect();
    if hints.is_empty() {
      hints.push("none");
    }
    format!(
      "{} cards, {}% lands, ramp {}, draw {}, interaction {}, style {}, hints {}",
      self.total_cards,
      self.land_percent,
      self.ramp_count,
      self.draw_count,
      self.removal_count,
      self.mulligan_style.as_str(),
      hints.join(",")
    )
  }
}

#[cfg(test)]
mod tests {
  use crate::categories::*;
  use crate::decklist::*;
  use crate::profile::*;

  fn profile(list: &str, commander: Option<&str>) -> DeckProfile {
    let deck = decklist!(list);
    DeckProfile::from_cards(&CategoryTables::standard(), &deck.cards, commander)
  }

  #[test]
  fn total_cards_matches_decklist() {
    let deck = decklist!(
      "
      36 Island
      1 Sol Ring
      1 Rhystic Study
      61 Grizzly Bears
      "
    );
    let p = DeckProfile::from_cards(&CategoryTables::standard(), &deck.cards, None);
    assert_eq!(p.total_cards, deck.len());
    assert_eq!(p.land_count, 36);
    assert_eq!(p.land_percent, 36);
    assert_eq!(p.fast_mana_count, 1);
    assert_eq!(p.draw_count, 1);
  }

  #[test]
  fn oversized_counts_saturate() {
    let cards = vec![
      ParsedCard {
        name: "Island".to_string(),
        count: usize::MAX,
      },
      ParsedCard {
        name: "Cultivate".to_string(),
        count: usize::MAX,
      },
    ];
    let p = DeckProfile::from_cards(&CategoryTables::standard(), &cards, None);
    assert_eq!(p.total_cards, usize::MAX);
    assert_eq!(p.land_count, usize::MAX);
    assert!(p.land_percent <= 100);
  }

  #[test]
  fn empty_deck() {
    let p = profile("", None);
    assert_eq!(p.total_cards, 0);
    assert_eq!(p.land_percent, 0);
    assert_eq!(p.archetype, Archetype::Unknown);
    assert_eq!(p.mulligan_style, MulliganStyle::Balanced);
    assert_eq!(p.commander_plan, CommanderPlan::Unknown);
    assert!(p.color_identity.is_none());
  }

  #[test]
  fn hints_from_thresholds() {
    let p = profile(
      "
      38 Forest
      1 Llanowar Elves
      1 Elvish Mystic
      1 Fyndhorn Elves
      1 Birds of Paradise
      1 Arbor Elf
      1 Rampant Growth
      1 Cultivate
      1 Kodama's Reach
      1 Farseek
      1 Nature's Lore
      1 Three Visits
      1 Arcane Signet
      49 Grizzly Bears
      ",
      None,
    );
    assert_eq!(p.ramp_count, 12);
    assert!(p.archetype_hints.contains("ramp-heavy"));
    assert!(p.archetype_hints.contains("lands-matter"));
    assert!(!p.archetype_hints.contains("value-engine"));
  }

  #[test]
  fn density_fallback_for_unknown_archetype() {
    // (30 + 0) / 99 is below the aggressive density
    let lean = profile("30 Island\n69 Grizzly Bears", None);
    assert_eq!(lean.archetype, Archetype::Unknown);
    assert_eq!(lean.mulligan_style, MulliganStyle::Aggressive);
    let heavy = profile("50 Island\n49 Grizzly Bears", None);
    assert_eq!(heavy.mulligan_style, MulliganStyle::Conservative);
    let mid = profile("40 Island\n59 Grizzly Bears", None);
    assert_eq!(mid.mulligan_style, MulliganStyle::Balanced);
  }

  #[test]
  fn known_commander_sets_plan_and_identity() {
    let p = profile("36 Island\n63 Grizzly Bears", Some("Tatyova, Benthic Druid"));
    assert!(p.commander_known);
    assert_eq!(p.commander_plan, CommanderPlan::EarlyEngine);
    assert_eq!(p.color_identity, Some(crate::color::ColorSet::from_symbols("GU")));
  }

  #[test]
  fn unknown_commander_stays_unknown() {
    let p = profile("36 Island\n63 Grizzly Bears", Some("Some Homebrew Legend"));
    assert!(!p.commander_known);
    assert_eq!(p.commander_plan, CommanderPlan::Unknown);
    assert_eq!(p.commander.as_deref(), Some("Some Homebrew Legend"));
    // Identity is inferred from lands instead
    assert_eq!(p.color_identity, Some(crate::color::ColorSet::from_symbols("U")));
  }

  #[test]
  fn blank_commander_is_no_commander() {
    let p = profile("36 Island\n63 Grizzly Bears", Some("   "));
    assert!(p.commander.is_none());
  }

  #[test]
  fn identity_is_not_inferred_for_three_colors() {
    let p = profile(
      "
      12 Island
      12 Forest
      12 Mountain
      63 Grizzly Bears
      ",
      None,
    );
    assert!(p.color_identity.is_none());
  }

  #[test]
  fn incomplete_land_detection() {
    let p = profile("10 Island\n89 Grizzly Bears", None);
    assert!(p.land_detection_incomplete);
    assert!(p.color_identity.is_none());
    let p = profile("10 Island\n30 Grizzly Bears", None);
    assert!(!p.land_detection_incomplete);
  }

  #[test]
  fn deterministic() {
    let list = "36 Island\n1 Sol Ring\n1 Counterspell\n61 Grizzly Bears";
    assert_eq!(profile(list, Some("Urza")), profile(list, Some("Urza")));
  }
}
