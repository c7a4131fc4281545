//! # Escalation to a secondary advisor
//!
//! Runs the deterministic evaluation, decides whether its confidence is high enough to stand
//! on its own and otherwise asks an injected `Advisor` for a second opinion. Any advisor
//! failure falls back to the deterministic verdict, which is always returned unmodified.
use crate::categories::CategoryTables;
use crate::decklist::ParsedCard;
use crate::eval::{evaluate_hand, DeterministicEval, EvalContext, HandEvaluation, KeepBias};
use crate::hand::HandFacts;
use crate::profile::DeckProfile;
use regex::Regex;
use thiserror::Error;

/// Evaluations at or above this confidence may skip the advisor
pub const ESCALATION_CONFIDENCE: u8 = 85;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvisorError {
  #[error("advisor unavailable: {0}")]
  Unavailable(String),
  #[error("advisor timed out after {0} ms")]
  Timeout(u64),
  #[error("advisor rejected the request: {0}")]
  Rejected(String),
}

/// AdvisorOpinion is what an advisor answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorOpinion {
  pub action: KeepBias,
  pub confidence: u8,
  pub reasons: Vec<String>,
}

/// AdviceRequest is the grounding context handed to an advisor
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceRequest<'a> {
  pub profile: &'a DeckProfile,
  pub hand: Vec<&'a str>,
  pub evaluation: &'a HandEvaluation,
  pub context: EvalContext,
}

/// An external second opinion, usually a language model behind a network call.
/// Implementations report their own timeouts as `AdvisorError::Timeout`
pub trait Advisor {
  fn advise(&self, request: &AdviceRequest) -> Result<AdvisorOpinion, AdvisorError>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceSource {
  /// Confident enough, or no advisor was supplied
  Deterministic,
  Advisor,
  /// The advisor was consulted but failed
  Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advice {
  pub action: KeepBias,
  pub confidence: u8,
  pub escalated: bool,
  pub source: AdviceSource,
  pub eval: DeterministicEval,
  pub opinion: Option<AdvisorOpinion>,
}

/// Returns true unless the evaluation is confident, decisive and free of uncertainty
pub fn should_escalate(eval: &DeterministicEval) -> bool {
  !(eval.confidence >= ESCALATION_CONFIDENCE
    && eval.keep_bias != KeepBias::Neutral
    && eval.uncertainty_reasons.is_empty())
}

/// Evaluates a hand and consults `advisor` when the evaluation is not confident enough.
/// `deck` is the decklist the profile was built from; advisor reasons citing deck cards
/// outside the hand are discarded
pub fn advise_hand<S: AsRef<str>>(
  tables: &CategoryTables,
  profile: &DeckProfile,
  deck: &[ParsedCard],
  hand: &[S],
  ctx: EvalContext,
  advisor: Option<&dyn Advisor>,
) -> Advice {
  let evaluation = evaluate_hand(tables, profile, hand, ctx);
  let escalated = should_escalate(&evaluation.eval);
  let deterministic = |source: AdviceSource, eval: DeterministicEval| Advice {
    action: eval.keep_bias,
    confidence: eval.confidence,
    escalated,
    source,
    eval,
    opinion: None,
  };
  let advisor = match advisor {
    Some(advisor) if escalated => advisor,
    _ => return deterministic(AdviceSource::Deterministic, evaluation.eval),
  };

  let request = AdviceRequest {
    profile,
    hand: hand.iter().map(|name| name.as_ref()).collect(),
    evaluation: &evaluation,
    context: ctx,
  };
  let check = OpinionCheck::new(
    &evaluation.facts,
    &request.hand,
    profile.commander.as_deref(),
    deck,
  );
  let opinion = advisor
    .advise(&request)
    .and_then(|opinion| check_opinion(opinion, &check));
  match opinion {
    Ok(opinion) => Advice {
      action: opinion.action,
      confidence: opinion.confidence.min(100),
      escalated,
      source: AdviceSource::Advisor,
      eval: evaluation.eval,
      opinion: Some(opinion),
    },
    Err(e) => {
      warn!("advisor failed, keeping the deterministic verdict: {}", e);
      deterministic(AdviceSource::Fallback, evaluation.eval)
    }
  }
}

/// A reason pattern that is false whenever `applies` holds for the hand
struct Contradiction {
  pattern: Regex,
  applies: fn(&HandFacts) -> bool,
}

impl Contradiction {
  fn new(pattern: &str, applies: fn(&HandFacts) -> bool) -> Self {
    Self {
      pattern: Regex::new(&format!("(?i){}", pattern)).expect("Failed to compile contradiction regex"),
      applies,
    }
  }
}

lazy_static! {
  static ref CONTRADICTIONS: Vec<Contradiction> = vec![
    // Claims that the hand has something it lacks
    Contradiction::new(
      r"\b(?:has|includes?|with|got|provides?)\s+(?:an?\s+)?(?:ramp|acceleration|early mana|mana rock)\b",
      |f| !f.has_ramp
    ),
    Contradiction::new(
      r"\b(?:ramp|acceleration|dork|signet)\s+(?:in|for)\s+(?:hand|opener)\b",
      |f| !f.has_ramp
    ),
    Contradiction::new(r"\b(?:has|includes?|with|got)\s+(?:an?\s+)?tutor\b", |f| !f.has_tutor),
    Contradiction::new(r"\btutor\s+(?:in|for|finds?)\s+(?:hand|opener)\b", |f| !f.has_tutor),
    Contradiction::new(
      r"\b(?:has|includes?|with|got)\s+(?:an?\s+)?(?:draw|engine|rhystic|remora)\b",
      |f| !f.has_draw_engine
    ),
    Contradiction::new(r"\b(?:draw|engine)\s+(?:in|for)\s+(?:hand|opener)\b", |f| !f.has_draw_engine),
    Contradiction::new(
      r"\b(?:has|includes?|with|got)\s+(?:an?\s+)?(?:interaction|counter|removal)\b",
      |f| !f.has_interaction
    ),
    Contradiction::new(r"\b(?:has|includes?|with|got)\s+protection\b", |f| !f.has_protection),
    Contradiction::new(
      r"\b(?:has|includes?|with|got)\s+(?:fast mana|mana crypt|explosive start)\b",
      |f| !f.has_fast_mana
    ),
    // Claims that the hand lacks something it has
    Contradiction::new(
      r"\b(?:no|lacks?|without|missing)\s+(?:acceleration|ramp|early mana|mana rock|fast mana)\b",
      HandFacts::has_acceleration
    ),
    Contradiction::new(
      r"\b(?:doesn't|does not)\s+(?:have|include)\s+(?:ramp|acceleration)\b",
      HandFacts::has_acceleration
    ),
    Contradiction::new(r"\b(?:no|lacks?|without|missing)\s+interaction\b", |f| f.has_interaction),
    Contradiction::new(
      r"\b(?:doesn't|does not)\s+(?:have|include)\s+interaction\b",
      |f| f.has_interaction
    ),
    // Color trouble with three lands across two colors
    Contradiction::new(
      r"\b(?:mana is shaky|mana screw|color screw|color issues|colorless|no colors)\b",
      mana_is_stable
    ),
    Contradiction::new(r"\b(?:shaky|unreliable)\s+mana\b", mana_is_stable),
  ];
  static ref GENERIC_COMMANDER: Regex = Regex::new(
    r"(?i)average (?:for )?commander|typical commander|in commander you usually|commander (?:land )?average|typical (?:land )?count|\b(?:usually|typically|on average)\s+(?:in|for)\s+commander\b"
  )
  .expect("Failed to compile GENERIC_COMMANDER regex");
}

fn mana_is_stable(facts: &HandFacts) -> bool {
  facts.hand_land_count >= 3 && facts.colors_available.len() >= 2
}

/// Shortest card name checked by `OpinionCheck::cites_missing_card`
const MIN_CITED_NAME: usize = 4;

/// OpinionCheck holds what an advisor reason may legitimately talk about
struct OpinionCheck<'a> {
  facts: &'a HandFacts,
  hand: Vec<String>,
  commander: Option<String>,
  deck: &'a [ParsedCard],
}

impl<'a> OpinionCheck<'a> {
  fn new(facts: &'a HandFacts, hand: &[&str], commander: Option<&str>, deck: &'a [ParsedCard]) -> Self {
    Self {
      facts,
      hand: hand.iter().map(|name| name.trim().to_lowercase()).collect(),
      commander: commander.map(|name| name.trim().to_lowercase()),
      deck,
    }
  }

  /// Mentions a deck card that is neither in the hand nor the commander
  fn cites_missing_card(&self, reason: &str) -> bool {
    self.deck.iter().any(|card| {
      let name = card.name.trim().to_lowercase();
      name.chars().count() >= MIN_CITED_NAME
        && !self.hand.contains(&name)
        && self.commander.as_ref() != Some(&name)
        && reason.contains(&name)
    })
  }

  fn rejects(&self, reason: &str) -> bool {
    let lower = reason.to_lowercase();
    self.cites_missing_card(&lower)
      || GENERIC_COMMANDER.is_match(reason)
      || CONTRADICTIONS
        .iter()
        .any(|c| (c.applies)(self.facts) && c.pattern.is_match(reason))
  }
}

/// Drops advisor reasons that contradict the hand facts, cite deck cards the hand does not
/// hold, or lean on generic format averages instead of this deck. An opinion with nothing
/// left is rejected
fn check_opinion(mut opinion: AdvisorOpinion, check: &OpinionCheck) -> Result<AdvisorOpinion, AdvisorError> {
  let before = opinion.reasons.len();
  opinion.reasons.retain(|reason| !check.rejects(reason));
  if opinion.reasons.len() < before {
    debug!(
      "discarded {} advisor reasons not grounded in the hand",
      before - opinion.reasons.len()
    );
  }
  if opinion.reasons.is_empty() {
    return Err(AdvisorError::Rejected(
      "no advisor reason was grounded in the hand".to_string(),
    ));
  }
  Ok(opinion)
}

#[cfg(test)]
mod tests {
  use crate::advisor::*;
  use crate::decklist::*;
  use std::cell::Cell;

  struct Canned {
    answer: Result<AdvisorOpinion, AdvisorError>,
    calls: Cell<usize>,
  }

  impl Canned {
    fn new(answer: Result<AdvisorOpinion, AdvisorError>) -> Self {
      Self {
        answer,
        calls: Cell::new(0),
      }
    }
  }

  impl Advisor for Canned {
    fn advise(&self, _request: &AdviceRequest) -> Result<AdvisorOpinion, AdvisorError> {
      self.calls.set(self.calls.get() + 1);
      self.answer.clone()
    }
  }

  fn opinion(action: KeepBias, reasons: &[&str]) -> AdvisorOpinion {
    AdvisorOpinion {
      action,
      confidence: 70,
      reasons: reasons.iter().map(|r| r.to_string()).collect(),
    }
  }

  fn deck() -> Decklist {
    decklist!("36 Island\n63 Grizzly Bears")
  }

  fn profile() -> DeckProfile {
    DeckProfile::from_cards(&CategoryTables::standard(), &deck().cards, Some("Some Homebrew Legend"))
  }

  fn check<'a>(facts: &'a HandFacts, hand: &[&str], deck: &'a [ParsedCard]) -> OpinionCheck<'a> {
    OpinionCheck::new(facts, hand, Some("Tatyova, Benthic Druid"), deck)
  }

  fn kept(hand: &[&str], deck: &[ParsedCard], reasons: &[&str]) -> Vec<String> {
    let facts = HandFacts::from_hand(&CategoryTables::standard(), hand);
    match check_opinion(opinion(KeepBias::Keep, reasons), &check(&facts, hand, deck)) {
      Ok(opinion) => opinion.reasons,
      Err(_) => vec![],
    }
  }

  const UNSURE_HAND: [&str; 4] = ["Island", "Island", "Island", "Grizzly Bears"];

  #[test]
  fn gate() {
    let mut eval = DeterministicEval {
      score: 8,
      keep_bias: KeepBias::Keep,
      confidence: 95,
      reasons: vec![],
      warnings: vec![],
      uncertainty_reasons: vec![],
      play_draw: Default::default(),
    };
    assert!(!should_escalate(&eval));
    eval.confidence = 84;
    assert!(should_escalate(&eval));
    eval.confidence = 95;
    eval.keep_bias = KeepBias::Neutral;
    assert!(should_escalate(&eval));
    eval.keep_bias = KeepBias::Mulligan;
    eval.uncertainty_reasons.push("unsure".to_string());
    assert!(should_escalate(&eval));
  }

  #[test]
  fn no_advisor_means_deterministic() {
    let advice = advise_hand(
      &CategoryTables::standard(),
      &profile(),
      &deck().cards,
      &UNSURE_HAND,
      EvalContext::default(),
      None,
    );
    assert!(advice.escalated);
    assert_eq!(advice.source, AdviceSource::Deterministic);
    assert_eq!(advice.action, advice.eval.keep_bias);
  }

  #[test]
  fn advisor_opinion_is_used_when_escalating() {
    let advisor = Canned::new(Ok(opinion(KeepBias::Mulligan, &["Too slow for this pod"])));
    let advice = advise_hand(
      &CategoryTables::standard(),
      &profile(),
      &deck().cards,
      &UNSURE_HAND,
      EvalContext::default(),
      Some(&advisor),
    );
    assert_eq!(advisor.calls.get(), 1);
    assert_eq!(advice.source, AdviceSource::Advisor);
    assert_eq!(advice.action, KeepBias::Mulligan);
    assert_eq!(advice.confidence, 70);
    assert_eq!(advice.eval.keep_bias, KeepBias::Keep);
  }

  #[test]
  fn failures_fall_back_unmodified() {
    let tables = CategoryTables::standard();
    let p = profile();
    let d = deck();
    let expected = evaluate_hand(&tables, &p, &UNSURE_HAND, EvalContext::default()).eval;
    for error in vec![
      AdvisorError::Timeout(3000),
      AdvisorError::Unavailable("offline".to_string()),
      AdvisorError::Rejected("bad json".to_string()),
    ] {
      let advisor = Canned::new(Err(error));
      let advice = advise_hand(
        &tables,
        &p,
        &d.cards,
        &UNSURE_HAND,
        EvalContext::default(),
        Some(&advisor),
      );
      assert_eq!(advice.source, AdviceSource::Fallback);
      assert_eq!(advice.eval, expected);
      assert_eq!(advice.action, expected.keep_bias);
      assert!(advice.opinion.is_none());
    }
  }

  #[test]
  fn confident_verdicts_skip_the_advisor() {
    let deck = decklist!(
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
      "
    );
    let tables = CategoryTables::standard();
    let p = DeckProfile::from_cards(&tables, &deck.cards, Some("Tatyova, Benthic Druid"));
    let advisor = Canned::new(Ok(opinion(KeepBias::Keep, &["Looks fine"])));
    let advice = advise_hand(
      &tables,
      &p,
      &deck.cards,
      &["Sol Ring", "Rhystic Study"],
      EvalContext::default(),
      Some(&advisor),
    );
    assert!(!advice.escalated);
    assert_eq!(advisor.calls.get(), 0);
    assert_eq!(advice.source, AdviceSource::Deterministic);
    assert_eq!(advice.action, KeepBias::Mulligan);
  }

  #[test]
  fn contradicting_reasons_are_discarded() {
    let hand = ["Island", "Island", "Sol Ring"];
    assert_eq!(
      kept(
        &hand,
        &[],
        &[
          "No ramp, so this is slow",
          "Sol Ring is strong ramp",
          "Tutor in hand finds the combo",
          "Three spells short on action",
        ],
      ),
      vec!["Sol Ring is strong ramp", "Three spells short on action"]
    );
  }

  #[test]
  fn mentioning_what_the_hand_lacks_is_not_a_claim() {
    let reasons = ["Mulligan to dig for ramp", "Vulnerable to opposing removal"];
    assert_eq!(kept(&UNSURE_HAND, &[], &reasons), reasons);
    let advisor = Canned::new(Ok(opinion(KeepBias::Mulligan, &reasons)));
    let advice = advise_hand(
      &CategoryTables::standard(),
      &profile(),
      &deck().cards,
      &UNSURE_HAND,
      EvalContext::default(),
      Some(&advisor),
    );
    assert_eq!(advice.source, AdviceSource::Advisor);
    assert_eq!(advice.action, KeepBias::Mulligan);
    assert_eq!(advice.opinion.unwrap().reasons.len(), 2);
  }

  #[test]
  fn protection_and_fast_mana_claims_need_the_cards() {
    let hand = ["Island", "Island", "Forest", "Grizzly Bears"];
    assert_eq!(
      kept(
        &hand,
        &[],
        &[
          "Has protection for the commander",
          "Starts with fast mana",
          "Curve is low",
        ],
      ),
      vec!["Curve is low"]
    );
    let hand = ["Island", "Mana Crypt", "Teferi's Protection"];
    assert_eq!(
      kept(&hand, &[], &["Has protection for the commander", "Got Mana Crypt"]),
      vec!["Has protection for the commander", "Got Mana Crypt"]
    );
  }

  #[test]
  fn color_complaints_need_unstable_mana() {
    let reasons = ["Color screw is likely", "Shaky mana on the draw", "Curve is low"];
    let stable = ["Island", "Forest", "Breeding Pool", "Grizzly Bears"];
    assert_eq!(kept(&stable, &[], &reasons), vec!["Curve is low"]);
    let two_lands = ["Island", "Forest", "Grizzly Bears"];
    assert_eq!(kept(&two_lands, &[], &reasons), reasons);
  }

  #[test]
  fn reasons_citing_cards_outside_the_hand_are_discarded() {
    let deck = decklist!(
      "
      1 Tatyova, Benthic Druid
      1 Rhystic Study
      1 Sol Ring
      35 Forest
      "
    );
    let hand = ["Forest", "Forest", "Sol Ring"];
    assert_eq!(
      kept(
        &hand,
        &deck.cards,
        &[
          "Rhystic Study will carry this",
          "Sol Ring into Tatyova, Benthic Druid on two",
          "Forest count is fine",
        ],
      ),
      vec!["Sol Ring into Tatyova, Benthic Druid on two", "Forest count is fine"]
    );
  }

  #[test]
  fn generic_format_averages_are_discarded() {
    let hand = ["Island", "Island", "Grizzly Bears"];
    assert_eq!(
      kept(
        &hand,
        &[],
        &[
          "Below the typical commander land count",
          "Two lands is usually fine in Commander",
          "Short on lands for this deck's 38% land density",
        ],
      ),
      vec![
        "Two lands is usually fine in Commander",
        "Short on lands for this deck's 38% land density",
      ]
    );
  }

  #[test]
  fn opinion_with_only_contradictions_is_rejected() {
    let tables = CategoryTables::standard();
    let hand = ["Island", "Island", "Grizzly Bears"];
    let facts = HandFacts::from_hand(&tables, &hand);
    let checked = check_opinion(
      opinion(KeepBias::Keep, &["Has draw to refill"]),
      &check(&facts, &hand, &[]),
    );
    assert!(matches!(checked, Err(AdvisorError::Rejected(_))));
  }

  #[test]
  fn contradicting_advisor_falls_back() {
    let advisor = Canned::new(Ok(opinion(KeepBias::Keep, &["Has a tutor for the win"])));
    let advice = advise_hand(
      &CategoryTables::standard(),
      &profile(),
      &deck().cards,
      &UNSURE_HAND,
      EvalContext::default(),
      Some(&advisor),
    );
    assert_eq!(advisor.calls.get(), 1);
    assert_eq!(advice.source, AdviceSource::Fallback);
  }
}
