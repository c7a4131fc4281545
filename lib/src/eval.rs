//! # Deterministic hand evaluation
//!
//! Scores an opening hand against its deck profile. The result carries a keep/mulligan bias,
//! a confidence and the reasons behind both, and is the input to the escalation gate in
//! [advisor](../advisor/index.html).
use crate::categories::{CategoryTables, CommanderPlan};
use crate::hand::{HandFacts, HandTags};
use crate::profile::{Archetype, DeckProfile, MulliganStyle};

pub const MIN_SCORE: i32 = -10;
pub const MAX_SCORE: i32 = 10;
/// Scores at or above this keep, scores at or below its negation mulligan
pub const KEEP_THRESHOLD: i32 = 2;

const BASE_CONFIDENCE: i32 = 60;
const CONFIDENCE_PER_POINT: i32 = 5;
const MIN_BASE_CONFIDENCE: i32 = 55;
const MAX_CONFIDENCE: i32 = 95;
const NEUTRAL_CONFIDENCE_CAP: i32 = 80;
const UNCERTAINTY_PENALTY: i32 = 10;
const UNCERTAIN_CONFIDENCE_CAP: i32 = 75;

/// Mulligans taken before one land hands and land-rich hands get a fatigue discount
const FATIGUE_MULLIGANS: u32 = 3;
const HIGH_VELOCITY: u8 = 7;

pub const MIN_REASONS: usize = 2;
pub const MAX_REASONS: usize = 5;
pub const MAX_WARNINGS: usize = 3;
pub const MAX_UNCERTAINTY: usize = 5;

const FALLBACK_REASONS: [&str; 2] = [
  "Verdict driven by land count and available resources",
  "No strong signal toward keeping or shipping this hand",
];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeepBias {
  Keep,
  Mulligan,
  Neutral,
}

impl KeepBias {
  /// The one place a score turns into a verdict
  pub fn from_score(score: i32) -> Self {
    if score >= KEEP_THRESHOLD {
      Self::Keep
    } else if score <= -KEEP_THRESHOLD {
      Self::Mulligan
    } else {
      Self::Neutral
    }
  }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayDraw {
  Play,
  Draw,
}

impl Default for PlayDraw {
  fn default() -> Self {
    Self::Play
  }
}

/// EvalContext is the game state around a hand that is not part of the hand itself
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvalContext {
  pub mulligan_count: u32,
  pub play_draw: PlayDraw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeterministicEval {
  /// -10 to 10
  pub score: i32,
  pub keep_bias: KeepBias,
  /// 0 to 100
  pub confidence: u8,
  pub reasons: Vec<String>,
  pub warnings: Vec<String>,
  pub uncertainty_reasons: Vec<String>,
  /// Recorded for context, does not affect the score
  pub play_draw: PlayDraw,
}

/// HandEvaluation bundles an evaluation with the facts and tags it was computed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandEvaluation {
  pub facts: HandFacts,
  pub tags: HandTags,
  pub eval: DeterministicEval,
}

/// Extracts facts and tags from `hand` and evaluates it
pub fn evaluate_hand<S: AsRef<str>>(
  tables: &CategoryTables,
  profile: &DeckProfile,
  hand: &[S],
  ctx: EvalContext,
) -> HandEvaluation {
  let facts = HandFacts::from_hand(tables, hand);
  let tags = HandTags::compute(tables, hand, &facts, profile);
  let eval = evaluate(profile, &facts, &tags, ctx);
  HandEvaluation { facts, tags, eval }
}

/// Scores a hand from its facts and tags
pub fn evaluate(
  profile: &DeckProfile,
  facts: &HandFacts,
  tags: &HandTags,
  ctx: EvalContext,
) -> DeterministicEval {
  let lands = facts.hand_land_count;
  let accelerates = facts.has_acceleration();
  let fatigued = ctx.mulligan_count >= FATIGUE_MULLIGANS;
  let mut score = 0;
  let mut reasons = Vec::new();
  let mut warnings = Vec::new();
  let mut uncertainty = Vec::new();

  match lands {
    0 => {
      score -= 10;
      reasons.push("No lands in hand".to_string());
    }
    1 if fatigued => {
      score -= 3;
      reasons.push(format!(
        "Only one land, though another mulligan after {} is costly",
        ctx.mulligan_count
      ));
    }
    1 => {
      score -= 6;
      reasons.push("Only one land".to_string());
    }
    2 => match profile.mulligan_style {
      MulliganStyle::Aggressive => {
        score -= 4;
        reasons.push("Two lands is thin for a deck that wants to move fast".to_string());
      }
      MulliganStyle::Balanced => {
        score -= 2;
        reasons.push("Two lands is slightly light".to_string());
      }
      MulliganStyle::Conservative => {}
    },
    3 => {
      score += 2;
      reasons.push("Three lands cover the early land drops".to_string());
    }
    n => {
      score += 1;
      reasons.push(format!("{} lands cover the early land drops", n));
    }
  }

  if facts.has_fast_mana {
    score += 2;
    reasons.push("Fast mana accelerates the opening turns".to_string());
  }
  if facts.has_ramp {
    score += 2;
    reasons.push("Ramp in hand".to_string());
  }
  if facts.has_draw_engine {
    score += 2;
    reasons.push("A draw engine keeps cards flowing".to_string());
  }
  if facts.has_interaction {
    score += 1;
    reasons.push("Holds interaction".to_string());
  }
  if facts.has_protection {
    score += 1;
    reasons.push("Can protect key pieces".to_string());
  }

  if profile.commander_plan == CommanderPlan::EarlyEngine {
    let demanding = profile.mulligan_style == MulliganStyle::Aggressive
      || profile.velocity_score >= HIGH_VELOCITY;
    if lands >= 3 && accelerates {
      score += 1;
      reasons.push("Lands and acceleration to cast the commander early".to_string());
    } else if demanding && !accelerates {
      score -= 2;
      reasons.push("No acceleration to cast the commander on curve".to_string());
    }
  }

  if fatigued && lands >= 2 {
    score += 1;
    reasons.push(format!(
      "After {} mulligans a hand with lands is worth keeping",
      ctx.mulligan_count
    ));
  }

  if tags.has_turn1_play {
    score += 1;
    reasons.push("Has a turn one play".to_string());
  }
  if tags.has_turn2_engine {
    score += 1;
    reasons.push("Can start a draw engine on turn two".to_string());
  }
  if tags.is_flood_risk {
    score -= 1;
    warnings.push(format!("{} lands risks flooding", lands));
  }
  if tags.is_stall_risk {
    score -= 2;
    reasons.push("Light on lands with no acceleration, likely to stall".to_string());
  }
  if tags.is_color_screwed {
    score -= 3;
    reasons.push("Lands do not produce the deck's colors".to_string());
  }

  let score = if lands == 0 {
    MIN_SCORE
  } else {
    score.max(MIN_SCORE).min(MAX_SCORE)
  };
  let keep_bias = KeepBias::from_score(score);

  if profile.archetype == Archetype::Unknown {
    uncertainty.push("Deck archetype could not be determined".to_string());
  }
  if let Some(commander) = &profile.commander {
    if profile.commander_plan == CommanderPlan::Unknown {
      uncertainty.push(format!("Game plan for {} is unknown", commander));
    }
  }
  if profile.land_detection_incomplete {
    uncertainty.push("Land detection looks incomplete for this list".to_string());
  }
  if tags.has_tutor_but_no_plan {
    uncertainty.push("Tutor without acceleration or draw, value depends on the pod".to_string());
  }
  if lands == 1 && (facts.has_fast_mana || facts.has_tutor) {
    uncertainty.push("One land with fast mana or a tutor depends on pod speed".to_string());
  }
  if tags.is_color_screwed && !facts.colors_available.is_empty() {
    uncertainty.push("Color requirements are approximate, the mana may still work".to_string());
  }

  reasons.truncate(MAX_REASONS);
  for fallback in FALLBACK_REASONS.iter() {
    if reasons.len() >= MIN_REASONS {
      break;
    }
    reasons.push(fallback.to_string());
  }
  warnings.truncate(MAX_WARNINGS);
  uncertainty.truncate(MAX_UNCERTAINTY);

  DeterministicEval {
    score,
    keep_bias,
    confidence: confidence(score, keep_bias, uncertainty.len()),
    reasons,
    warnings,
    uncertainty_reasons: uncertainty,
    play_draw: ctx.play_draw,
  }
}

/// Confidence for a score, a bias and a number of uncertainty reasons.
/// Non-increasing in `uncertain_count` with everything else fixed
pub fn confidence(score: i32, keep_bias: KeepBias, uncertain_count: usize) -> u8 {
  let mut confidence = (BASE_CONFIDENCE + CONFIDENCE_PER_POINT * score.abs())
    .max(MIN_BASE_CONFIDENCE)
    .min(MAX_CONFIDENCE);
  if keep_bias == KeepBias::Neutral {
    confidence = confidence.min(NEUTRAL_CONFIDENCE_CAP);
  }
  let penalty = UNCERTAINTY_PENALTY.saturating_mul(uncertain_count.min(100) as i32);
  confidence = (confidence - penalty).max(0);
  if uncertain_count > 0 {
    confidence = confidence.min(UNCERTAIN_CONFIDENCE_CAP);
  }
  confidence as u8
}

#[cfg(test)]
mod tests {
  use crate::categories::CategoryTables;
  use crate::decklist::*;
  use crate::eval::*;
  use crate::profile::DeckProfile;

  fn profile(list: &str, commander: Option<&str>) -> DeckProfile {
    let deck = decklist!(list);
    DeckProfile::from_cards(&CategoryTables::standard(), &deck.cards, commander)
  }

  fn midrange() -> DeckProfile {
    // draw 3 and ramp 6 make this midrange_value with a known commander
    profile(
      "
      36 Island
      1 Llanowar Elves
      1 Birds of Paradise
      1 Cultivate
      1 Kodama's Reach
      1 Rampant Growth
      1 Arcane Signet
      1 Rhystic Study
      1 Sylvan Library
      1 Phyrexian Arena
      54 Grizzly Bears
      ",
      Some("Tatyova, Benthic Druid"),
    )
  }

  fn eval(profile: &DeckProfile, hand: &[&str], mulligans: u32) -> DeterministicEval {
    let ctx = EvalContext {
      mulligan_count: mulligans,
      play_draw: PlayDraw::Draw,
    };
    evaluate_hand(&CategoryTables::standard(), profile, hand, ctx).eval
  }

  #[test]
  fn keep_bias_threshold() {
    assert_eq!(KeepBias::from_score(2), KeepBias::Keep);
    assert_eq!(KeepBias::from_score(1), KeepBias::Neutral);
    assert_eq!(KeepBias::from_score(-1), KeepBias::Neutral);
    assert_eq!(KeepBias::from_score(-2), KeepBias::Mulligan);
  }

  #[test]
  fn landless_hand_is_pinned() {
    let p = midrange();
    let e = eval(
      &p,
      &["Sol Ring", "Mana Crypt", "Rhystic Study", "Llanowar Elves", "Cultivate"],
      0,
    );
    assert_eq!(e.score, -10);
    assert_eq!(e.keep_bias, KeepBias::Mulligan);
    assert_eq!(e.play_draw, PlayDraw::Draw);
  }

  #[test]
  fn one_land_fatigue_discount() {
    let p = midrange();
    let fresh = eval(&p, &["Island", "Grizzly Bears"], 0);
    let tired = eval(&p, &["Island", "Grizzly Bears"], 3);
    // -6 land, -2 stall
    assert_eq!(fresh.score, -8);
    // -3 land, -2 stall
    assert_eq!(tired.score, -5);
  }

  #[test]
  fn two_lands_by_style() {
    let conservative = profile("50 Island\n49 Grizzly Bears", None);
    let aggressive = profile("30 Island\n69 Grizzly Bears", None);
    let hand = ["Island", "Island", "Sol Ring"];
    // +2 fast +2 ramp +1 turn one play
    assert_eq!(eval(&conservative, &hand, 0).score, 5);
    assert_eq!(eval(&aggressive, &hand, 0).score, 1);
  }

  #[test]
  fn strong_keep() {
    let p = midrange();
    let e = eval(
      &p,
      &["Island", "Island", "Island", "Sol Ring", "Rhystic Study", "Counterspell", "Grizzly Bears"],
      0,
    );
    // Counterspell is both interaction and protection, the total clamps at 10
    assert_eq!(e.score, 10);
    assert_eq!(e.keep_bias, KeepBias::Keep);
    assert!(e.uncertainty_reasons.is_empty());
    assert_eq!(e.confidence, 95);
    assert_eq!(e.reasons.len(), MAX_REASONS);
  }

  #[test]
  fn flood_is_a_warning_not_a_reason() {
    let p = midrange();
    let e = eval(&p, &["Island", "Island", "Island", "Island", "Island", "Grizzly Bears"], 0);
    assert_eq!(e.warnings.len(), 1);
    // +1 lands -1 flood
    assert_eq!(e.score, 0);
    assert_eq!(e.keep_bias, KeepBias::Neutral);
    assert!(e.confidence <= 80);
  }

  #[test]
  fn reasons_are_padded() {
    let p = profile("50 Island\n49 Grizzly Bears", None);
    let e = eval(&p, &["Island", "Island", "Grizzly Bears", "Hill Giant"], 0);
    // Two lands cost nothing in a conservative deck, only the stall reason fires
    assert_eq!(e.score, -2);
    assert_eq!(e.reasons.len(), MIN_REASONS);
    assert_eq!(e.reasons[1], FALLBACK_REASONS[0]);
  }

  #[test]
  fn unknown_commander_plan_is_uncertain() {
    let p = profile("36 Island\n63 Grizzly Bears", Some("Some Homebrew Legend"));
    let e = eval(&p, &["Island", "Island", "Island"], 0);
    assert!(e.uncertainty_reasons.len() >= 2);
    assert!(e.confidence <= 75);
  }

  #[test]
  fn confidence_is_non_increasing_in_uncertainty() {
    for score in MIN_SCORE..=MAX_SCORE {
      let bias = KeepBias::from_score(score);
      let mut last = confidence(score, bias, 0);
      for n in 1..=MAX_UNCERTAINTY {
        let c = confidence(score, bias, n);
        assert!(c <= last);
        last = c;
      }
    }
  }

  #[test]
  fn confidence_bounds() {
    assert_eq!(confidence(0, KeepBias::Neutral, 0), 60);
    assert_eq!(confidence(10, KeepBias::Keep, 0), 95);
    assert_eq!(confidence(10, KeepBias::Keep, 1), 75);
    assert_eq!(confidence(3, KeepBias::Keep, 2), 55);
    assert_eq!(confidence(0, KeepBias::Neutral, 9), 0);
  }
}
