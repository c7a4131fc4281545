extern crate serde;
extern crate serde_json;
#[macro_use]
extern crate log;
extern crate keepwise;

use keepwise::api::{self, DeckCards, DeckInput, EvaluateRequest};
use keepwise::categories::CategoryTables;
use keepwise::decklist::Decklist;
use keepwise::eval::PlayDraw;
use keepwise::golden;
use keepwise::profile::{DeckProfile, ProfileCache, ProfileThresholds};
use keepwise::simulation::{simulate_with, RunControl, SimulationConfig};
use std::env;
use std::fs::File;
use std::io::prelude::*;

const USAGE: &str = "usage:
  mulligan_cli evaluate <decklist> <commander> <hand, comma separated> [play|draw] [mulligans] [--thresholds <json>]
  mulligan_cli profile <decklist> [commander] [--thresholds <json>]
  mulligan_cli simulate <config json> [--sequential]
  mulligan_cli golden";

#[derive(Debug)]
enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    Usage(String),
    Core(api::Error),
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

impl From<api::Error> for Error {
    fn from(error: api::Error) -> Self {
        Self::Core(error)
    }
}

fn read_file(path: &str) -> Result<String, Error> {
    info!("Loading {}", path);
    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Removes `flag` and the value after it from `args`
fn take_option(args: &mut Vec<String>, flag: &str) -> Result<Option<String>, Error> {
    match args.iter().position(|a| a == flag) {
        None => Ok(None),
        Some(i) if i + 1 < args.len() => {
            let value = args.remove(i + 1);
            args.remove(i);
            Ok(Some(value))
        }
        Some(_) => Err(Error::Usage(format!("{} expects a value", flag))),
    }
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}

fn thresholds(path: Option<String>) -> Result<ProfileThresholds, Error> {
    match path {
        Some(path) => Ok(serde_json::from_str(&read_file(&path)?)?),
        None => Ok(ProfileThresholds::default()),
    }
}

fn evaluate(mut args: Vec<String>) -> Result<String, Error> {
    let thresholds = thresholds(take_option(&mut args, "--thresholds")?)?;
    if args.len() < 3 {
        return Err(Error::Usage(USAGE.to_string()));
    }
    let play_draw = match args.get(3).map(|s| s.as_str()) {
        None | Some("play") => PlayDraw::Play,
        Some("draw") => PlayDraw::Draw,
        Some(other) => return Err(Error::Usage(format!("expected play or draw, got {}", other))),
    };
    let mulligan_count = match args.get(4) {
        None => 0,
        Some(n) => n
            .parse::<u32>()
            .map_err(|_| Error::Usage(format!("mulligans must be a number, got {}", n)))?,
    };
    let request = EvaluateRequest {
        deck: DeckInput {
            cards: DeckCards::Text(read_file(&args[0])?),
            commander: Some(args[1].clone()),
        },
        hand: args[2]
            .split(',')
            .map(|card| card.trim().to_string())
            .filter(|card| !card.is_empty())
            .collect(),
        play_draw,
        mulligan_count,
    };
    let cache = ProfileCache::new(CategoryTables::standard(), thresholds);
    let response = api::evaluate_cached(&cache, &request)?;
    Ok(serde_json::to_string_pretty(&response)?)
}

fn profile(mut args: Vec<String>) -> Result<String, Error> {
    let thresholds = thresholds(take_option(&mut args, "--thresholds")?)?;
    let path = args.get(0).ok_or_else(|| Error::Usage(USAGE.to_string()))?;
    let deck = Decklist::from_list(&read_file(path)?);
    let profile = DeckProfile::build(
        &CategoryTables::standard(),
        &thresholds,
        &deck.cards,
        args.get(1).map(|s| s.as_str()),
    );
    info!("{}", profile.summary());
    Ok(serde_json::to_string_pretty(&profile)?)
}

fn simulate(mut args: Vec<String>) -> Result<String, Error> {
    let sequential = take_flag(&mut args, "--sequential");
    let path = args.get(0).ok_or_else(|| Error::Usage(USAGE.to_string()))?;
    let config: SimulationConfig = serde_json::from_str(&read_file(path)?)?;
    let control = RunControl {
        sequential,
        ..RunControl::default()
    };
    let result = simulate_with(&config, &control);
    Ok(serde_json::to_string_pretty(&result)?)
}

fn golden() -> Result<String, Error> {
    let report = golden::run_offline(&CategoryTables::standard(), &golden::cases());
    for failure in &report.failures {
        warn!("{} / {}: {}", failure.case_id, failure.hand, failure.message);
    }
    let output = serde_json::to_string_pretty(&report)?;
    if report.passed() {
        Ok(output)
    } else {
        println!("{}", output);
        Err(Error::Usage(format!(
            "{} golden expectations failed",
            report.failures.len()
        )))
    }
}

fn main() -> Result<(), Error> {
    let _ = env_logger::try_init();
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        return Err(Error::Usage(USAGE.to_string()));
    }
    let command = args.remove(0);
    let output = match command.as_str() {
        "evaluate" => evaluate(args)?,
        "profile" => profile(args)?,
        "simulate" => simulate(args)?,
        "golden" => golden()?,
        other => return Err(Error::Usage(format!("unknown command {}\n{}", other, USAGE))),
    };
    println!("{}", output);
    Ok(())
}
