//! # Monte-Carlo mulligan simulation
//!
//! Estimates keep rates under the London mulligan by running many synthetic trials.
//! Trials run in batches so that long runs can be cancelled or budgeted, and each batch is
//! split into fixed size chunks with their own seeded generator. Results for a fixed seed
//! are identical whether the chunks run in parallel or sequentially.
use crate::color::ManaColor;
use crate::mulligan::{ByTurnCheck, ColorCheck, KeepRules, London, Mulligan, SimCard};
use rand::prelude::*;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use std::convert::TryFrom;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const BATCH_SIZE: usize = 4096;
const CHUNK_SIZE: usize = 512;
const MAX_EXAMPLES: usize = 5;
/// Larger decks are clamped to this many cards
pub const MAX_DECK_SIZE: usize = 1000;
/// Iteration budget applied to interactive runs that do not set their own
pub const INTERACTIVE_MAX_ITERATIONS: usize = 100_000;
/// Floor on p(1 - p) so the interval does not collapse at p = 0 or p = 1
const VARIANCE_FLOOR: f64 = 1e-4;
const Z_95: f64 = 1.96;

fn default_at_least() -> i64 {
  1
}

fn default_min_probability() -> f64 {
  0.5
}

/// ByTurnRequirement asks for `at_least` cards out of `cards_in_deck` by turn `by_turn`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByTurnRequirement {
  pub cards_in_deck: i64,
  pub by_turn: i64,
  #[serde(default = "default_at_least")]
  pub at_least: i64,
  #[serde(default = "default_min_probability")]
  pub min_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorSource {
  pub color: ManaColor,
  pub sources_in_deck: i64,
  #[serde(default = "default_at_least")]
  pub required: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorRequirement {
  pub sources: Vec<ColorSource>,
  #[serde(default = "default_min_probability")]
  pub min_probability: f64,
}

/// SimulationConfig describes the synthetic deck and the keep rules. Every field is
/// optional in JSON. Out of range values are clamped by `normalize`, never rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
  pub deck_size: i64,
  pub success_cards: i64,
  pub lands_in_deck: i64,
  pub min_keep: i64,
  pub min_lands: i64,
  pub max_lands: i64,
  pub iterations: i64,
  pub free_mulligan: bool,
  pub on_draw: bool,
  pub ramp: Option<ByTurnRequirement>,
  pub removal: Option<ByTurnRequirement>,
  pub colors: Option<ColorRequirement>,
  pub seed: Option<u64>,
}

impl Default for SimulationConfig {
  fn default() -> Self {
    Self {
      deck_size: 99,
      success_cards: 10,
      lands_in_deck: 36,
      min_keep: 1,
      min_lands: 2,
      max_lands: 5,
      iterations: 20000,
      free_mulligan: true,
      on_draw: false,
      ramp: None,
      removal: None,
      colors: None,
      seed: None,
    }
  }
}

/// NormalizedConfig is a `SimulationConfig` with every value clamped into range
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedConfig {
  pub deck_size: usize,
  pub lands: usize,
  pub success: usize,
  pub ramp: usize,
  pub removal: usize,
  pub iterations: usize,
  pub free_mulligan: bool,
  pub rules: KeepRules,
}

fn non_negative(v: i64) -> usize {
  usize::try_from(v.max(0)).unwrap_or(usize::MAX)
}

fn probability(p: f64) -> f64 {
  if p.is_nan() {
    0.0
  } else {
    p.max(0.0).min(1.0)
  }
}

impl SimulationConfig {
  /// Clamps negative counts to 0, the deck to `MAX_DECK_SIZE`, subset sizes into the deck,
  /// `max_lands` to at least `min_lands` and `iterations` to at least 1
  pub fn normalize(&self) -> NormalizedConfig {
    let deck_size = non_negative(self.deck_size).min(MAX_DECK_SIZE);
    let lands = non_negative(self.lands_in_deck).min(deck_size);
    let success = non_negative(self.success_cards).min(deck_size - lands);
    let mut spare = deck_size - lands - success;
    let mut by_turn = Vec::new();
    let mut subset = |req: &Option<ByTurnRequirement>, role: SimCard| -> usize {
      match req {
        Some(req) => {
          let cards = non_negative(req.cards_in_deck).min(spare);
          spare -= cards;
          by_turn.push(ByTurnCheck {
            role,
            cards_in_deck: cards,
            by_turn: non_negative(req.by_turn),
            at_least: non_negative(req.at_least),
            min_probability: probability(req.min_probability),
          });
          cards
        }
        None => 0,
      }
    };
    let ramp = subset(&self.ramp, SimCard::Ramp);
    let removal = subset(&self.removal, SimCard::Removal);

    let colors = self.colors.as_ref().map(|req| ColorCheck {
      sources: req
        .sources
        .iter()
        .map(|s| (non_negative(s.sources_in_deck).min(lands), non_negative(s.required)))
        .collect(),
      min_probability: probability(req.min_probability),
    });
    let min_lands = non_negative(self.min_lands);
    NormalizedConfig {
      deck_size,
      lands,
      success,
      ramp,
      removal,
      iterations: non_negative(self.iterations).max(1),
      free_mulligan: self.free_mulligan,
      rules: KeepRules {
        min_keep: non_negative(self.min_keep),
        min_lands,
        max_lands: non_negative(self.max_lands).max(min_lands),
        on_draw: self.on_draw,
        deck_size,
        lands_in_deck: lands,
        by_turn,
        colors,
      },
    }
  }
}

impl NormalizedConfig {
  /// The deck the trials draw from, cards known only by role
  pub fn synthetic_deck(&self) -> Vec<SimCard> {
    let mut deck = Vec::with_capacity(self.deck_size);
    deck.extend(std::iter::repeat(SimCard::Land).take(self.lands));
    deck.extend(std::iter::repeat(SimCard::Success).take(self.success));
    deck.extend(std::iter::repeat(SimCard::Ramp).take(self.ramp));
    deck.extend(std::iter::repeat(SimCard::Removal).take(self.removal));
    deck.resize(self.deck_size, SimCard::Blank);
    deck
  }

  pub fn mulligan(&self) -> London {
    London::new(self.rules.clone(), self.free_mulligan)
  }
}

/// CancelToken is a shared flag checked between batches
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::Relaxed);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Relaxed)
  }
}

/// RunControl bounds a simulation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunControl {
  #[serde(skip)]
  pub cancel: CancelToken,
  /// Stop after this many trials even if more were requested
  pub max_iterations: Option<usize>,
  /// Stop starting new batches after this much wall-clock time
  pub time_budget_ms: Option<u64>,
  /// Run every chunk on the calling thread
  pub sequential: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
  Completed,
  Cancelled,
  IterationBudget,
  TimeBudget,
}

/// Tally accumulates trial outcomes. Tallies merge by addition, in order
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tally {
  pub keep7: usize,
  pub keep6: usize,
  pub keep5: usize,
  pub forced_keeps: usize,
  pub trials: usize,
  pub lands_kept: usize,
  pub example_kept_hands: Vec<Vec<SimCard>>,
  pub example_shipped_hands: Vec<Vec<SimCard>>,
}

impl Tally {
  pub fn successes(&self) -> usize {
    self.keep7 + self.keep6 + self.keep5
  }

  pub fn merge(mut self, other: Tally) -> Self {
    self.keep7 += other.keep7;
    self.keep6 += other.keep6;
    self.keep5 += other.keep5;
    self.forced_keeps += other.forced_keeps;
    self.trials += other.trials;
    self.lands_kept += other.lands_kept;
    extend_examples(&mut self.example_kept_hands, other.example_kept_hands);
    extend_examples(&mut self.example_shipped_hands, other.example_shipped_hands);
    self
  }
}

fn extend_examples(into: &mut Vec<Vec<SimCard>>, from: Vec<Vec<SimCard>>) {
  let room = MAX_EXAMPLES.saturating_sub(into.len());
  into.extend(from.into_iter().take(room));
}

/// Runs `trials` mulligan sequences with the given generator
pub fn run_trials<R: Rng, M: Mulligan>(
  rng: &mut R,
  mulligan: &M,
  deck: &[SimCard],
  trials: usize,
) -> Tally {
  let mut tally = Tally::default();
  for _ in 0..trials {
    let outcome = mulligan.simulate_hand(rng, deck);
    tally.trials += 1;
    tally.lands_kept += outcome.land_count();
    if !outcome.accepted {
      tally.forced_keeps += 1;
    } else {
      match outcome.hand_size {
        7 => tally.keep7 += 1,
        6 => tally.keep6 += 1,
        _ => tally.keep5 += 1,
      }
      if tally.example_kept_hands.len() < MAX_EXAMPLES {
        tally.example_kept_hands.push(outcome.hand);
      }
    }
    if let Some(shipped) = outcome.first_shipped {
      if tally.example_shipped_hands.len() < MAX_EXAMPLES {
        tally.example_shipped_hands.push(shipped);
      }
    }
  }
  tally
}

fn chunk_seed(seed: u64, chunk: u64) -> u64 {
  seed ^ chunk.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
  pub keep7: usize,
  pub keep6: usize,
  pub keep5: usize,
  /// Hands kept at the floor without passing the keep rules, not counted as successes
  pub forced_keeps: usize,
  /// Trials actually run
  pub iterations: usize,
  pub requested_iterations: usize,
  pub success_rate: f64,
  pub confidence_interval: [f64; 2],
  pub example_kept_hands: Vec<Vec<SimCard>>,
  pub example_shipped_hands: Vec<Vec<SimCard>>,
  /// Average land count over every final hand
  pub avg_lands_kept: f64,
  pub stop_reason: StopReason,
  pub seed: u64,
}

impl SimulationResult {
  fn from_tally(tally: Tally, requested_iterations: usize, stop_reason: StopReason, seed: u64) -> Self {
    let n = tally.trials;
    let (success_rate, confidence_interval, avg_lands_kept) = if n == 0 {
      (0.0, [0.0, 1.0], 0.0)
    } else {
      let p = tally.successes() as f64 / n as f64;
      let half_width = Z_95 * (f64::max(p * (1.0 - p), VARIANCE_FLOOR) / n as f64).sqrt();
      (
        p,
        [(p - half_width).max(0.0), (p + half_width).min(1.0)],
        tally.lands_kept as f64 / n as f64,
      )
    };
    Self {
      keep7: tally.keep7,
      keep6: tally.keep6,
      keep5: tally.keep5,
      forced_keeps: tally.forced_keeps,
      iterations: n,
      requested_iterations,
      success_rate,
      confidence_interval,
      example_kept_hands: tally.example_kept_hands,
      example_shipped_hands: tally.example_shipped_hands,
      avg_lands_kept,
      stop_reason,
      seed,
    }
  }

  /// Half the width of the confidence interval
  pub fn margin(&self) -> f64 {
    (self.confidence_interval[1] - self.confidence_interval[0]) / 2.0
  }
}

/// Runs a simulation to completion
pub fn simulate(config: &SimulationConfig) -> SimulationResult {
  simulate_with(config, &RunControl::default())
}

/// Runs a simulation under `control`, returning partial results when it stops early
pub fn simulate_with(config: &SimulationConfig, control: &RunControl) -> SimulationResult {
  let cfg = config.normalize();
  let deck = cfg.synthetic_deck();
  let london = cfg.mulligan();
  let seed = config.seed.unwrap_or_else(random);
  let limit = control
    .max_iterations
    .map_or(cfg.iterations, |budget| budget.min(cfg.iterations));
  let deadline = control
    .time_budget_ms
    .map(|ms| (Instant::now(), Duration::from_millis(ms)));
  info!(
    "simulating {} trials: deck {} lands {} success {} seed {}",
    cfg.iterations, cfg.deck_size, cfg.lands, cfg.success, seed
  );

  let mut tally = Tally::default();
  let mut next_chunk: u64 = 0;
  let mut stop_reason = StopReason::Completed;
  while tally.trials < cfg.iterations {
    if control.cancel.is_cancelled() {
      stop_reason = StopReason::Cancelled;
      break;
    }
    if tally.trials >= limit {
      stop_reason = StopReason::IterationBudget;
      break;
    }
    if let Some((started, budget)) = deadline {
      if started.elapsed() >= budget {
        stop_reason = StopReason::TimeBudget;
        break;
      }
    }
    let batch = std::cmp::min(BATCH_SIZE, limit - tally.trials);
    let chunks: Vec<(u64, usize)> = (0..batch)
      .step_by(CHUNK_SIZE)
      .enumerate()
      .map(|(i, start)| {
        (
          next_chunk + i as u64,
          std::cmp::min(CHUNK_SIZE, batch - start),
        )
      })
      .collect();
    next_chunk += chunks.len() as u64;

    let run_chunk = |&(index, trials): &(u64, usize)| {
      let mut rng = SmallRng::seed_from_u64(chunk_seed(seed, index));
      run_trials(&mut rng, &london, &deck, trials)
    };
    let tallies: Vec<Tally> = if control.sequential {
      chunks.iter().map(run_chunk).collect()
    } else {
      chunks.par_iter().map(run_chunk).collect()
    };
    tally = tallies.into_iter().fold(tally, Tally::merge);
    debug!(
      "batch done: {}/{} trials, {} successes",
      tally.trials,
      cfg.iterations,
      tally.successes()
    );
  }

  let result = SimulationResult::from_tally(tally, cfg.iterations, stop_reason, seed);
  info!(
    "simulation finished ({:?}): {} trials, success rate {:.4}",
    result.stop_reason, result.iterations, result.success_rate
  );
  result
}

#[cfg(test)]
mod tests {
  use crate::color::ManaColor;
  use crate::simulation::*;

  fn scenario(iterations: i64, seed: u64) -> SimulationConfig {
    SimulationConfig {
      deck_size: 99,
      lands_in_deck: 36,
      success_cards: 10,
      min_keep: 1,
      min_lands: 2,
      max_lands: 5,
      iterations,
      free_mulligan: true,
      seed: Some(seed),
      ..Default::default()
    }
  }

  #[test]
  fn commander_baseline_scenario() {
    let result = simulate(&scenario(20000, 42));
    assert_eq!(result.iterations, 20000);
    assert_eq!(result.stop_reason, StopReason::Completed);
    assert!(result.success_rate > 0.75 && result.success_rate < 0.95);
    let successes = result.keep7 + result.keep6 + result.keep5;
    assert_eq!(result.success_rate, successes as f64 / result.iterations as f64);
    assert_eq!(successes + result.forced_keeps, result.iterations);
    assert!(result.confidence_interval[0] <= result.success_rate);
    assert!(result.confidence_interval[1] >= result.success_rate);
    assert!(result.example_kept_hands.len() <= 5);
    assert!(!result.example_shipped_hands.is_empty());
    assert!(result.avg_lands_kept > 2.0 && result.avg_lands_kept < 4.0);
  }

  #[test]
  fn interval_shrinks_with_iterations() {
    let small = simulate(&scenario(2000, 3));
    let large = simulate(&scenario(20000, 3));
    let ratio = small.margin() / large.margin();
    assert!(ratio > 2.8 && ratio < 3.5, "ratio {}", ratio);
  }

  #[test]
  fn fixed_seed_is_reproducible() {
    let a = simulate(&scenario(10000, 99));
    let b = simulate(&scenario(10000, 99));
    assert_eq!(a, b);
  }

  #[test]
  fn sequential_matches_parallel() {
    let config = scenario(9000, 1234);
    let parallel = simulate(&config);
    let sequential = simulate_with(
      &config,
      &RunControl {
        sequential: true,
        ..Default::default()
      },
    );
    assert_eq!(parallel, sequential);
  }

  #[test]
  fn lower_min_keep_is_not_worse() {
    let rates: Vec<f64> = (0..4)
      .map(|min_keep| {
        simulate(&SimulationConfig {
          min_keep,
          ..scenario(20000, 5)
        })
        .success_rate
      })
      .collect();
    for pair in rates.windows(2) {
      assert!(pair[0] >= pair[1], "{:?}", rates);
    }
  }

  #[test]
  fn cancelled_before_start() {
    let control = RunControl::default();
    control.cancel.cancel();
    let result = simulate_with(&scenario(20000, 1), &control);
    assert_eq!(result.stop_reason, StopReason::Cancelled);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.requested_iterations, 20000);
    assert_eq!(result.success_rate, 0.0);
  }

  #[test]
  fn iteration_budget_returns_partial_result() {
    let control = RunControl {
      max_iterations: Some(5000),
      ..Default::default()
    };
    let result = simulate_with(&scenario(20000, 1), &control);
    assert_eq!(result.stop_reason, StopReason::IterationBudget);
    assert_eq!(result.iterations, 5000);
    assert_eq!(
      result.keep7 + result.keep6 + result.keep5 + result.forced_keeps,
      5000
    );
  }

  #[test]
  fn zero_time_budget_stops_immediately() {
    let control = RunControl {
      time_budget_ms: Some(0),
      ..Default::default()
    };
    let result = simulate_with(&scenario(20000, 1), &control);
    assert_eq!(result.stop_reason, StopReason::TimeBudget);
    assert_eq!(result.iterations, 0);
  }

  #[test]
  fn degenerate_config_is_clamped() {
    let config = SimulationConfig {
      deck_size: 10,
      lands_in_deck: 50,
      success_cards: -3,
      min_keep: -1,
      min_lands: 4,
      max_lands: 1,
      iterations: 0,
      ..Default::default()
    };
    let cfg = config.normalize();
    assert_eq!(cfg.lands, 10);
    assert_eq!(cfg.success, 0);
    assert_eq!(cfg.iterations, 1);
    assert_eq!(cfg.rules.min_keep, 0);
    assert_eq!(cfg.rules.max_lands, 4);
    let result = simulate(&config);
    assert_eq!(result.iterations, 1);
  }

  #[test]
  fn oversized_config_is_clamped() {
    let config = SimulationConfig {
      deck_size: i64::MAX,
      lands_in_deck: i64::MAX,
      success_cards: i64::MAX,
      iterations: 1,
      seed: Some(4),
      ..Default::default()
    };
    let cfg = config.normalize();
    assert_eq!(cfg.deck_size, MAX_DECK_SIZE);
    assert_eq!(cfg.lands, MAX_DECK_SIZE);
    assert_eq!(cfg.synthetic_deck().len(), MAX_DECK_SIZE);
    let result = simulate(&config);
    assert_eq!(result.iterations, 1);
  }

  #[test]
  fn tiny_decks_bucket_by_hand_size() {
    let config = SimulationConfig {
      deck_size: 6,
      lands_in_deck: 3,
      success_cards: 3,
      min_keep: 0,
      min_lands: 0,
      max_lands: 7,
      iterations: 50,
      seed: Some(2),
      ..Default::default()
    };
    let result = simulate(&config);
    assert_eq!(result.keep7, 50);
    assert_eq!(result.keep6 + result.keep5 + result.forced_keeps, 0);
  }

  #[test]
  fn subsets_never_exceed_the_deck() {
    let config = SimulationConfig {
      deck_size: 60,
      lands_in_deck: 24,
      success_cards: 30,
      ramp: Some(ByTurnRequirement {
        cards_in_deck: 20,
        by_turn: 2,
        at_least: 1,
        min_probability: 0.5,
      }),
      ..Default::default()
    };
    let cfg = config.normalize();
    assert_eq!(cfg.ramp, 6);
    assert_eq!(cfg.synthetic_deck().len(), 60);
  }

  #[test]
  fn ramp_requirement_lowers_success() {
    let base = simulate(&scenario(20000, 8));
    let with_ramp = simulate(&SimulationConfig {
      ramp: Some(ByTurnRequirement {
        cards_in_deck: 10,
        by_turn: 2,
        at_least: 1,
        min_probability: 0.5,
      }),
      ..scenario(20000, 8)
    });
    assert!(with_ramp.success_rate < base.success_rate);
  }

  #[test]
  fn config_from_json() {
    let config: SimulationConfig = serde_json::from_str(
      r#"{
        "deckSize": 99,
        "successCards": 12,
        "iterations": 100,
        "colors": {"sources": [{"color": "U", "sourcesInDeck": 18}]},
        "removal": {"cardsInDeck": 8, "byTurn": 3}
      }"#,
    )
    .unwrap();
    assert_eq!(config.lands_in_deck, 36);
    let colors = config.colors.as_ref().unwrap();
    assert_eq!(colors.sources[0].color, ManaColor::Blue);
    assert_eq!(colors.sources[0].required, 1);
    assert_eq!(colors.min_probability, 0.5);
    assert_eq!(config.removal.as_ref().unwrap().at_least, 1);
    let result = simulate(&config);
    assert_eq!(result.requested_iterations, 100);
  }
}
