//! # Request/response interface
//!
//! JSON shaped entry points for the web front end, native callers and the command line tool.
//! The `wasm_bindgen` exports take and return `JsValue`s and report errors as strings.
use crate::categories::{CategoryTables, CommanderPlan};
use crate::decklist::{Decklist, ParsedCard};
use crate::eval::{evaluate_hand, DeterministicEval, EvalContext, PlayDraw};
use crate::hand::{HandFacts, HandTags};
use crate::advisor::should_escalate;
use crate::profile::{Archetype, DeckProfile, MulliganStyle, ProfileCache};
use crate::simulation::{
  simulate_with, RunControl, SimulationConfig, SimulationResult, INTERACTIVE_MAX_ITERATIONS,
};
use std::collections::BTreeSet;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;

/// Largest hand the evaluator accepts
pub const MAX_HAND_SIZE: usize = 7;

#[derive(Debug, Error)]
pub enum Error {
  #[error("bad input: {0}")]
  BadInput(String),
  #[error("malformed json: {0}")]
  Json(#[from] serde_json::Error),
}

/// DeckCards accepts either decklist text or an already parsed card list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeckCards {
  Text(String),
  Cards(Vec<ParsedCard>),
}

impl DeckCards {
  pub fn to_decklist(&self) -> Decklist {
    match self {
      DeckCards::Text(text) => Decklist::from_list(text),
      DeckCards::Cards(cards) => Decklist::from_cards(cards.iter().cloned()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckInput {
  pub cards: DeckCards,
  #[serde(default)]
  pub commander: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
  pub deck: DeckInput,
  pub hand: Vec<String>,
  #[serde(default)]
  pub play_draw: PlayDraw,
  #[serde(default)]
  pub mulligan_count: u32,
}

/// ProfileSummary is the part of a deck profile worth showing next to a verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
  pub total_cards: usize,
  pub land_count: usize,
  pub land_percent: usize,
  pub ramp_count: usize,
  pub draw_count: usize,
  pub removal_count: usize,
  pub protection_count: usize,
  pub velocity_score: u8,
  pub archetype: Archetype,
  pub archetype_hints: BTreeSet<String>,
  pub mulligan_style: MulliganStyle,
  pub commander_plan: CommanderPlan,
  pub land_detection_incomplete: bool,
  pub summary: String,
}

impl From<&DeckProfile> for ProfileSummary {
  fn from(p: &DeckProfile) -> Self {
    Self {
      total_cards: p.total_cards,
      land_count: p.land_count,
      land_percent: p.land_percent,
      ramp_count: p.ramp_count,
      draw_count: p.draw_count,
      removal_count: p.removal_count,
      protection_count: p.protection_count,
      velocity_score: p.velocity_score,
      archetype: p.archetype,
      archetype_hints: p.archetype_hints.clone(),
      mulligan_style: p.mulligan_style,
      commander_plan: p.commander_plan,
      land_detection_incomplete: p.land_detection_incomplete,
      summary: p.summary(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
  pub eval: DeterministicEval,
  pub profile_summary: ProfileSummary,
  pub hand_facts: HandFacts,
  pub hand_tags: HandTags,
  /// True when the verdict should be checked by a secondary advisor
  pub escalate: bool,
}

fn validate(request: &EvaluateRequest, deck: &Decklist) -> Result<(), Error> {
  if deck.is_empty() {
    return Err(Error::BadInput("the decklist has no cards".to_string()));
  }
  if request.hand.len() > MAX_HAND_SIZE {
    return Err(Error::BadInput(format!(
      "a hand has at most {} cards, got {}",
      MAX_HAND_SIZE,
      request.hand.len()
    )));
  }
  Ok(())
}

fn respond(profile: &DeckProfile, tables: &CategoryTables, request: &EvaluateRequest) -> EvaluateResponse {
  let ctx = EvalContext {
    mulligan_count: request.mulligan_count,
    play_draw: request.play_draw,
  };
  let evaluation = evaluate_hand(tables, profile, &request.hand, ctx);
  EvaluateResponse {
    escalate: should_escalate(&evaluation.eval),
    eval: evaluation.eval,
    profile_summary: profile.into(),
    hand_facts: evaluation.facts,
    hand_tags: evaluation.tags,
  }
}

/// Profiles the deck and evaluates the hand
pub fn evaluate(tables: &CategoryTables, request: &EvaluateRequest) -> Result<EvaluateResponse, Error> {
  let deck = request.deck.cards.to_decklist();
  validate(request, &deck)?;
  let profile = DeckProfile::from_cards(tables, &deck.cards, request.deck.commander.as_deref());
  Ok(respond(&profile, tables, request))
}

/// Like `evaluate`, reusing cached profiles for decks seen before
pub fn evaluate_cached(cache: &ProfileCache, request: &EvaluateRequest) -> Result<EvaluateResponse, Error> {
  let deck = request.deck.cards.to_decklist();
  validate(request, &deck)?;
  let profile = cache.get_or_build(&deck.cards, request.deck.commander.as_deref());
  Ok(respond(&profile, cache.tables(), request))
}

pub fn evaluate_json(tables: &CategoryTables, input: &str) -> Result<String, Error> {
  let request: EvaluateRequest = serde_json::from_str(input)?;
  let response = evaluate(tables, &request)?;
  Ok(serde_json::to_string(&response)?)
}

pub fn simulate_json(input: &str, control: &RunControl) -> Result<String, Error> {
  let config: SimulationConfig = serde_json::from_str(input)?;
  let result: SimulationResult = simulate_with(&config, control);
  Ok(serde_json::to_string(&result)?)
}

lazy_static! {
  static ref TABLES: CategoryTables = CategoryTables::standard();
}

/// Evaluates a hand for the web front end.
/// Assumes that input deserializes into an `EvaluateRequest`, and returns a serialized `EvaluateResponse`
///
///  ```js
///  const response = mulligan_evaluate({deck: {cards: "1 Sol Ring\n...", commander: "..."}, hand: [...]});
///  ```
#[wasm_bindgen]
pub fn mulligan_evaluate(input: &JsValue) -> JsValue {
  let request: EvaluateRequest = match input.into_serde() {
    Err(e) => return JsValue::from_str(&format!("Error deserializing evaluate request: {}", e)),
    Ok(v) => v,
  };
  match evaluate(&TABLES, &request) {
    Err(e) => JsValue::from_str(&format!("Error evaluating hand: {}", e)),
    Ok(response) => JsValue::from_serde(&response)
      .unwrap_or_else(|e| JsValue::from_str(&format!("Error serializing response: {}", e))),
  }
}

/// Bounds runs started from a UI thread. Only an iteration budget is set, wall-clock time
/// is not available on every wasm target
pub fn interactive_control() -> RunControl {
  RunControl {
    max_iterations: Some(INTERACTIVE_MAX_ITERATIONS),
    sequential: true,
    ..Default::default()
  }
}

/// Runs a mulligan simulation for the web front end, on the calling thread and within
/// `INTERACTIVE_MAX_ITERATIONS` trials
#[wasm_bindgen]
pub fn mulligan_simulate(input: &JsValue) -> JsValue {
  let config: SimulationConfig = match input.into_serde() {
    Err(e) => return JsValue::from_str(&format!("Error deserializing simulation config: {}", e)),
    Ok(v) => v,
  };
  let result = simulate_with(&config, &interactive_control());
  JsValue::from_serde(&result)
    .unwrap_or_else(|e| JsValue::from_str(&format!("Error serializing simulation result: {}", e)))
}
