//! # Commander Opening Hand Library
//!
//! keepwise decides whether to keep or mulligan an opening hand in the Commander format. It parses
//! decklists, profiles the deck, scores hands with a deterministic evaluator that reports how sure
//! it is, and estimates keep rates under the London mulligan with a Monte-Carlo simulator.

#[macro_use]
extern crate serde_derive;
extern crate serde;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate rand;
extern crate regex;
extern crate wasm_bindgen;

#[macro_use]
pub mod decklist;
pub mod advisor;
pub mod api;
pub mod categories;
pub mod color;
pub mod eval;
pub mod golden;
pub mod hand;
pub mod hypergeometric;
pub mod mulligan;
pub mod profile;
pub mod simulation;

pub use crate::advisor::{advise_hand, Advice, Advisor, AdvisorError, AdvisorOpinion};
pub use crate::categories::CategoryTables;
pub use crate::decklist::{Decklist, ParsedCard};
pub use crate::eval::{evaluate_hand, DeterministicEval, EvalContext, KeepBias, PlayDraw};
pub use crate::profile::{DeckProfile, ProfileCache};
pub use crate::simulation::{simulate, simulate_with, SimulationConfig, SimulationResult};
