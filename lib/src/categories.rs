//! # Card category tables
//!
//! Name based classification shared by the deck profile builder and the hand facts
//! extractor. Both sides must classify through the same `CategoryTables` value, otherwise
//! deck level densities and hand level facts drift apart.
//!
//! Matching is case insensitive and bidirectional: a card matches a list entry when the
//! card name contains the entry, or, for names of at least `MIN_REVERSE_MATCH_LEN`
//! characters, when the entry contains the card name.
use crate::color::{ColorSet, ManaColor};
use regex::Regex;

/// Card names shorter than this only match in the forward direction
pub const MIN_REVERSE_MATCH_LEN: usize = 4;

const LAND_PATTERN: &str =
  r"\bland\b|\bisland\b|mountain|forest|plains|swamp|\bdual\b|fetch|shock|triome|pathway|basic\s+land";

const LAND_NAMES: &[&str] = &[
  "command tower",
  "city of brass",
  "mana confluence",
  "exotic orchard",
  "forbidden orchard",
  "reflecting pool",
  "ancient tomb",
  "city of traitors",
  "gemstone caverns",
  "boseiju, who endures",
  "otawara, soaring city",
  "urza's saga",
  "breeding pool",
  "hallowed fountain",
  "watery grave",
  "steam vents",
  "temple garden",
  "overgrown tomb",
  "sacred foundry",
  "godless shrine",
  "blood crypt",
  "stomping ground",
  "polluted delta",
  "flooded strand",
  "bloodstained mire",
  "wooded foothills",
  "windswept heath",
  "marsh flats",
  "scalding tarn",
  "verdant catacombs",
  "arid mesa",
  "misty rainforest",
  "prismatic vista",
  "fabled passage",
  "evolving wilds",
  "terramorphic expanse",
  "tundra",
  "underground sea",
  "badlands",
  "taiga",
  "savannah",
  "scrubland",
  "volcanic island",
  "bayou",
  "plateau",
  "tropical island",
];

/// Lands that tap for (or fetch) any color
const ANY_COLOR_LANDS: &[&str] = &[
  "command tower",
  "city of brass",
  "mana confluence",
  "forbidden orchard",
  "exotic orchard",
  "reflecting pool",
  "gemstone caverns",
  "prismatic vista",
  "fabled passage",
  "evolving wilds",
  "terramorphic expanse",
  "fetch",
  "triome",
];

/// Two color lands by name. Basic land types in a name are handled separately
const DUAL_LANDS: &[(&str, &str)] = &[
  ("breeding pool", "GU"),
  ("hallowed fountain", "WU"),
  ("watery grave", "UB"),
  ("steam vents", "UR"),
  ("temple garden", "GW"),
  ("overgrown tomb", "BG"),
  ("sacred foundry", "RW"),
  ("godless shrine", "WB"),
  ("blood crypt", "BR"),
  ("stomping ground", "RG"),
  ("tundra", "WU"),
  ("underground sea", "UB"),
  ("badlands", "BR"),
  ("taiga", "RG"),
  ("savannah", "GW"),
  ("scrubland", "WB"),
  ("volcanic island", "UR"),
  ("bayou", "BG"),
  ("plateau", "RW"),
  ("tropical island", "GU"),
  ("polluted delta", "UB"),
  ("flooded strand", "WU"),
  ("bloodstained mire", "BR"),
  ("wooded foothills", "RG"),
  ("windswept heath", "GW"),
  ("marsh flats", "WB"),
  ("scalding tarn", "UR"),
  ("verdant catacombs", "BG"),
  ("arid mesa", "RW"),
  ("misty rainforest", "GU"),
  ("otawara, soaring city", "U"),
  ("boseiju, who endures", "G"),
];

const BASIC_TYPES: &[(&str, ManaColor)] = &[
  ("plains", ManaColor::White),
  ("island", ManaColor::Blue),
  ("swamp", ManaColor::Black),
  ("mountain", ManaColor::Red),
  ("forest", ManaColor::Green),
];

const FAST_MANA: &[&str] = &[
  "sol ring",
  "mana crypt",
  "mana vault",
  "lotus petal",
  "mox amber",
  "chrome mox",
  "mox diamond",
  "jeweled lotus",
  "grim monolith",
  "mox opal",
  "lion's eye diamond",
  "mox tantalite",
];

const RAMP: &[&str] = &[
  "sol ring",
  "arcane signet",
  "mind stone",
  "thought vessel",
  "fellwar stone",
  "llanowar elves",
  "elves of deep shadow",
  "birds of paradise",
  "arbor elf",
  "elvish mystic",
  "fyndhorn elves",
  "avacyn's pilgrim",
  "noble hierarch",
  "signet",
  "talisman of",
  "mana crypt",
  "mana vault",
  "grim monolith",
  "rampant growth",
  "cultivate",
  "kodama's reach",
  "farseek",
  "nature's lore",
  "three visits",
  "chromatic lantern",
  "commander's sphere",
  "dark ritual",
  "cabal ritual",
  "lotus petal",
  "simian spirit guide",
  "elvish spirit guide",
  "smothering tithe",
];

/// Ramp that comes down on turn one
const ONE_DROP_ACCELERANTS: &[&str] = &[
  "llanowar elves",
  "elvish mystic",
  "fyndhorn elves",
  "birds of paradise",
  "arbor elf",
  "avacyn's pilgrim",
  "noble hierarch",
  "elves of deep shadow",
  "sol ring",
  "mana crypt",
  "mana vault",
  "lotus petal",
  "dark ritual",
  "simian spirit guide",
  "elvish spirit guide",
];

const TUTORS: &[&str] = &[
  "tutor",
  "imperial seal",
  "gamble",
  "ranger-captain of eos",
  "imperial recruiter",
  "recruiter of the guard",
  "spellseeker",
  "trinket mage",
  "tribute mage",
  "fabricate",
  "whir of invention",
  "muddle the mixture",
  "merchant scroll",
  "green sun's zenith",
  "summoner's pact",
  "natural order",
  "survival of the fittest",
  "birthing pod",
  "wishclaw talisman",
];

const DRAW_ENGINES: &[&str] = &[
  "rhystic study",
  "mystic remora",
  "esper sentinel",
  "faerie mastermind",
  "consecrated sphinx",
  "sylvan library",
  "necropotence",
  "phyrexian arena",
  "dark confidant",
  "kami of the crescent moon",
];

const BURST_DRAW: &[&str] = &[
  "windfall",
  "wheel of fortune",
  "reforge the soul",
  "echo of eons",
  "treasure cruise",
  "dig through time",
  "fact or fiction",
  "chart a course",
  "night's whisper",
  "read the bones",
  "sign in blood",
  "harmonize",
  "brainstorm",
  "ponder",
  "preordain",
  "serum visions",
];

/// Draw engines cheap enough to come down by turn two
const EARLY_ENGINES: &[&str] = &[
  "rhystic study",
  "mystic remora",
  "esper sentinel",
  "faerie mastermind",
  "sylvan library",
  "dark confidant",
];

const INTERACTION: &[&str] = &[
  "force of will",
  "force of negation",
  "swan song",
  "flusterstorm",
  "pact of negation",
  "mana drain",
  "counterspell",
  "an offer you can't refuse",
  "mana tithe",
  "dovin's veto",
  "negate",
  "mana leak",
  "remand",
  "silence",
  "swords to plowshares",
  "path to exile",
  "nature's claim",
  "naturalize",
  "return to nature",
  "cyclonic rift",
  "snapcaster mage",
  "assassin's trophy",
  "abrupt decay",
  "chaos warp",
  "generous gift",
  "beast within",
  "pongify",
  "rapid hybridization",
  "terminate",
  "dreadbore",
  "hero's downfall",
  "vindicate",
  "angrath's fury",
  "lightning bolt",
  "chain lightning",
  "fire // ice",
  "abrade",
];

const PROTECTION: &[&str] = &[
  "slip out the back",
  "teferi's protection",
  "veil of summer",
  "heroic intervention",
  "grand abolisher",
  "teferi, time raveler",
  "lightning greaves",
  "swiftfoot boots",
  "deflecting swat",
  "fierce guardianship",
  "flusterstorm",
  "counterspell",
  "force of will",
  "force of negation",
  "pact of negation",
  "silence",
  "orim's chant",
];

const ONE_DROPS: &[&str] = &[
  "llanowar elves",
  "elvish mystic",
  "fyndhorn elves",
  "birds of paradise",
  "arbor elf",
  "avacyn's pilgrim",
  "noble hierarch",
  "deathrite shaman",
  "mother of runes",
  "giver of runes",
  "sol ring",
  "lotus petal",
  "chrome mox",
  "mox opal",
  "mox diamond",
  "mox amber",
  "mana crypt",
  "jeweled lotus",
  "brainstorm",
  "ponder",
  "preordain",
  "serum visions",
  "thoughtseize",
  "vampiric tutor",
  "path to exile",
  "swords to plowshares",
  "lightning bolt",
  "mystic remora",
  "sylvan library",
  "esper sentinel",
];

const TWO_DROPS: &[&str] = &[
  "arcane signet",
  "mind stone",
  "signet",
  "talisman of",
  "fellwar stone",
  "rampant growth",
  "farseek",
  "nature's lore",
  "three visits",
  "dark confidant",
  "counterspell",
  "mana leak",
  "remand",
  "negate",
  "swan song",
  "cyclonic rift",
  "nature's claim",
  "abrupt decay",
];

/// CommanderPlan describes when the commander is expected to matter
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommanderPlan {
  /// The commander is an engine that wants to be cast by turn two or three
  EarlyEngine,
  Unknown,
}

impl Default for CommanderPlan {
  fn default() -> Self {
    Self::Unknown
  }
}

/// KnownCommander is an entry in the commander lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownCommander {
  pub name: String,
  pub colors: ColorSet,
  pub plan: CommanderPlan,
}

const KNOWN_COMMANDERS: &[(&str, &str)] = &[
  ("tatyova, benthic druid", "GU"),
  ("grand arbiter augustin iv", "WU"),
  ("urza, lord high artificer", "U"),
  ("najeela, the blade-blossom", "WUBRG"),
  ("krenko, mob boss", "R"),
  ("edgar markov", "WBR"),
  ("yuriko, the tiger's shadow", "UB"),
  ("korvold, fae-cursed king", "BRG"),
  ("winota, joiner of forces", "RW"),
  ("derevi, empyrial tactician", "WUG"),
  ("sisay, weatherlight captain", "WUBRG"),
  ("godo, bandit warlord", "R"),
];

/// CardTraits is the classification of a single card name
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CardTraits {
  pub land: bool,
  pub fast_mana: bool,
  pub ramp: bool,
  pub one_drop_accelerant: bool,
  pub tutor: bool,
  pub draw_engine: bool,
  pub early_engine: bool,
  pub interaction: bool,
  pub protection: bool,
  pub one_drop: bool,
  pub two_drop: bool,
}

impl CardTraits {
  /// Returns true if the card accelerates mana, either as fast mana or ramp
  pub fn accelerates(&self) -> bool {
    self.fast_mana || self.ramp
  }
}

/// CategoryTables holds every static name list used for classification.
/// Construct it once and pass it by reference into the pure functions that need it
#[derive(Debug, Clone)]
pub struct CategoryTables {
  land_pattern: Regex,
  land_names: Vec<String>,
  any_color_lands: Vec<String>,
  dual_lands: Vec<(String, ColorSet)>,
  fast_mana: Vec<String>,
  ramp: Vec<String>,
  one_drop_accelerants: Vec<String>,
  tutors: Vec<String>,
  draw_engines: Vec<String>,
  burst_draw: Vec<String>,
  early_engines: Vec<String>,
  interaction: Vec<String>,
  protection: Vec<String>,
  one_drops: Vec<String>,
  two_drops: Vec<String>,
  commanders: Vec<KnownCommander>,
}

fn owned(list: &[&str]) -> Vec<String> {
  list.iter().map(|s| s.to_string()).collect()
}

impl CategoryTables {
  /// Returns the built-in tables
  pub fn standard() -> Self {
    Self {
      land_pattern: Regex::new(LAND_PATTERN).expect("Failed to compile LAND_PATTERN regex"),
      land_names: owned(LAND_NAMES),
      any_color_lands: owned(ANY_COLOR_LANDS),
      dual_lands: DUAL_LANDS
        .iter()
        .map(|(name, colors)| (name.to_string(), ColorSet::from_symbols(colors)))
        .collect(),
      fast_mana: owned(FAST_MANA),
      ramp: owned(RAMP),
      one_drop_accelerants: owned(ONE_DROP_ACCELERANTS),
      tutors: owned(TUTORS),
      draw_engines: owned(DRAW_ENGINES),
      burst_draw: owned(BURST_DRAW),
      early_engines: owned(EARLY_ENGINES),
      interaction: owned(INTERACTION),
      protection: owned(PROTECTION),
      one_drops: owned(ONE_DROPS),
      two_drops: owned(TWO_DROPS),
      commanders: KNOWN_COMMANDERS
        .iter()
        .map(|(name, colors)| KnownCommander {
          name: name.to_string(),
          colors: ColorSet::from_symbols(colors),
          plan: CommanderPlan::EarlyEngine,
        })
        .collect(),
    }
  }

  /// Adds or replaces a commander in the lookup table
  pub fn with_commander(mut self, commander: KnownCommander) -> Self {
    let key = normalize(&commander.name);
    self.commanders.retain(|c| c.name != key);
    self.commanders.push(KnownCommander {
      name: key,
      ..commander
    });
    self
  }

  /// Returns true if the card name looks like a land
  pub fn is_land(&self, name: &str) -> bool {
    let n = normalize(name);
    self.land_pattern.is_match(&n) || matches_any(&n, &self.land_names)
  }

  /// Returns the colors a land can produce. Unrecognized lands produce no color
  pub fn land_colors(&self, name: &str) -> ColorSet {
    let n = normalize(name);
    if matches_any(&n, &self.any_color_lands) {
      return ColorSet::all();
    }
    let mut colors: ColorSet = BASIC_TYPES
      .iter()
      .filter(|(basic, _)| n.contains(basic))
      .map(|(_, color)| *color)
      .collect();
    for (dual, dual_colors) in &self.dual_lands {
      if n.contains(dual.as_str()) {
        colors = colors.union(*dual_colors);
      }
    }
    colors
  }

  /// Classifies a card name against every table. Lands are not classified further
  pub fn classify(&self, name: &str) -> CardTraits {
    let n = normalize(name);
    if self.land_pattern.is_match(&n) || matches_any(&n, &self.land_names) {
      return CardTraits {
        land: true,
        ..CardTraits::default()
      };
    }
    let draw_engine = matches_any(&n, &self.draw_engines) || matches_any(&n, &self.burst_draw);
    CardTraits {
      land: false,
      fast_mana: matches_any(&n, &self.fast_mana),
      ramp: matches_any(&n, &self.ramp),
      one_drop_accelerant: matches_any(&n, &self.one_drop_accelerants),
      tutor: matches_any(&n, &self.tutors),
      draw_engine,
      early_engine: draw_engine && matches_any(&n, &self.early_engines),
      interaction: matches_any(&n, &self.interaction),
      protection: matches_any(&n, &self.protection),
      one_drop: matches_any(&n, &self.one_drops),
      two_drop: matches_any(&n, &self.two_drops),
    }
  }

  /// Looks up a commander by exact (normalized) name
  pub fn commander(&self, name: &str) -> Option<&KnownCommander> {
    let n = normalize(name);
    self.commanders.iter().find(|c| c.name == n)
  }
}

impl Default for CategoryTables {
  fn default() -> Self {
    Self::standard()
  }
}

fn normalize(name: &str) -> String {
  name.trim().to_lowercase()
}

/// `name` must already be normalized
fn matches_any(name: &str, list: &[String]) -> bool {
  if name.is_empty() {
    return false;
  }
  let reverse = name.chars().count() >= MIN_REVERSE_MATCH_LEN;
  list
    .iter()
    .any(|entry| name.contains(entry.as_str()) || (reverse && entry.contains(name)))
}

#[cfg(test)]
mod tests {
  use crate::categories::*;

  #[test]
  fn basic_and_nonbasic_lands() {
    let t = CategoryTables::standard();
    assert!(t.is_land("Island"));
    assert!(t.is_land("Snow-Covered Forest"));
    assert!(t.is_land("Command Tower"));
    assert!(t.is_land("Breeding Pool"));
    assert!(t.is_land("Fetch lands"));
    assert!(!t.is_land("Sol Ring"));
    assert!(!t.is_land("Rhystic Study"));
    assert!(!t.is_land("Tatyova, Benthic Druid"));
  }

  #[test]
  fn land_colors() {
    let t = CategoryTables::standard();
    assert_eq!(t.land_colors("Island"), ColorSet::from_symbols("U"));
    assert_eq!(t.land_colors("Breeding Pool"), ColorSet::from_symbols("GU"));
    assert_eq!(t.land_colors("Command Tower"), ColorSet::all());
    assert_eq!(t.land_colors("Fetch lands"), ColorSet::all());
    assert!(t.land_colors("Ancient Tomb").is_empty());
  }

  #[test]
  fn spells_are_classified_against_every_table() {
    let t = CategoryTables::standard();
    let crypt = t.classify("Mana Crypt");
    assert!(crypt.fast_mana && crypt.ramp && crypt.one_drop_accelerant);
    let study = t.classify("Rhystic Study");
    assert!(study.draw_engine && study.early_engine);
    let sphinx = t.classify("Consecrated Sphinx");
    assert!(sphinx.draw_engine && !sphinx.early_engine);
    let fow = t.classify("Force of Will");
    assert!(fow.interaction && fow.protection);
    assert!(t.classify("Demonic Tutor").tutor);
    assert!(t.classify("Azorius Signet").ramp);
  }

  #[test]
  fn classification_is_case_insensitive() {
    let t = CategoryTables::standard();
    assert_eq!(t.classify("SOL RING"), t.classify("sol ring"));
    assert!(t.classify("  Cultivate ").ramp);
  }

  #[test]
  fn short_names_do_not_reverse_match() {
    let t = CategoryTables::standard();
    // "ice" is contained in "fire // ice" but is too short to reverse match
    assert!(!t.classify("Ice").interaction);
    assert!(t.classify("Fire // Ice").interaction);
  }

  #[test]
  fn lands_are_not_spells() {
    let t = CategoryTables::standard();
    let traits = t.classify("Ancient Tomb");
    assert!(traits.land);
    assert!(!traits.fast_mana);
  }

  #[test]
  fn commander_lookup() {
    let t = CategoryTables::standard();
    let tatyova = t.commander("Tatyova, Benthic Druid").unwrap();
    assert_eq!(tatyova.plan, CommanderPlan::EarlyEngine);
    assert_eq!(tatyova.colors, ColorSet::from_symbols("UG"));
    assert!(t.commander("Kinnan, Bonder Prodigy").is_none());
    let t = t.with_commander(KnownCommander {
      name: "Kinnan, Bonder Prodigy".to_string(),
      colors: ColorSet::from_symbols("GU"),
      plan: CommanderPlan::EarlyEngine,
    });
    assert!(t.commander("kinnan, bonder prodigy").is_some());
  }
}
