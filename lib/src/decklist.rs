//! # Decklist parsing
//!
//! Freeform decklist text in the `"<qty>[x] <name>"` style exported by most deck building
//! sites. Parsing never fails: a line that does not look like a quantified card is kept
//! as a single copy of the whole line.
use regex::Regex;
use std::collections::BTreeMap;

/// Copies of a single card beyond this are dropped
pub const MAX_COPIES: usize = 10_000;

/// ParsedCard is a card name and the number of copies in the deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCard {
  pub name: String,
  pub count: usize,
}

/// Decklist is the merged, name-sorted result of parsing decklist text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decklist {
  pub cards: Vec<ParsedCard>,
  pub card_count: usize,
}

/// DecklistBuilder merges duplicate names, keyed by the normalized name
#[derive(Debug, Clone, Default)]
pub struct DecklistBuilder {
  cards: BTreeMap<String, ParsedCard>,
}

impl DecklistBuilder {
  pub fn new() -> Self {
    Self {
      cards: BTreeMap::new(),
    }
  }

  pub fn insert_count(mut self, name: &str, count: usize) -> Self {
    let name = normalize_name(name);
    if name.is_empty() || count == 0 {
      return self;
    }
    let key = name.to_lowercase();
    let entry = self
      .cards
      .entry(key)
      .or_insert(ParsedCard { name, count: 0 });
    entry.count = entry.count.saturating_add(count).min(MAX_COPIES);
    self
  }

  pub fn build(self) -> Decklist {
    let cards: Vec<ParsedCard> = self.cards.into_iter().map(|(_, card)| card).collect();
    let card_count = cards.iter().fold(0usize, |sum, c| sum.saturating_add(c.count));
    Decklist { cards, card_count }
  }
}

impl Decklist {
  /// Parses decklist text. See the module documentation for the accepted grammar
  pub fn from_list(list: &str) -> Self {
    lazy_static! {
      static ref QUANTITY_LINE_REGEX: Regex =
        Regex::new(r"^(?P<amount>\d+)\s*[xX]?\s+(?P<name>\S.*)$")
          .expect("Failed to compile QUANTITY_LINE_REGEX regex");
    }
    let mut builder = DecklistBuilder::new();
    for line in list.lines() {
      let trimmed = line.trim();
      if trimmed.is_empty() {
        continue;
      }
      // Ignore line comments
      if trimmed.starts_with('#') || trimmed.starts_with("//") {
        continue;
      }
      let trimmed_lower = trimmed.to_lowercase();
      // Ignore reserved words
      match trimmed_lower.trim_end_matches(':') {
        "deck" | "commander" | "mainboard" | "main" | "companion" => continue,
        "sideboard" | "maybeboard" => break,
        _ => {}
      }
      let parsed = QUANTITY_LINE_REGEX.captures(trimmed).and_then(|caps| {
        let amount = caps["amount"].parse::<usize>().ok()?;
        Some((amount, strip_annotations(caps.name("name")?.as_str())))
      });
      builder = match parsed {
        Some((amount, name)) => builder.insert_count(name, amount),
        // A garbled line is worth one copy of itself
        None => builder.insert_count(strip_annotations(trimmed), 1),
      };
    }
    builder.build()
  }

  pub fn from_cards<I>(cards: I) -> Self
  where
    I: IntoIterator<Item = ParsedCard>,
  {
    let mut b = DecklistBuilder::new();
    for card in cards {
      b = b.insert_count(&card.name, card.count);
    }
    b.build()
  }

  /// Serializes back to `"<count> <name>"` lines. Parsing the result yields an equal Decklist
  pub fn to_list(&self) -> String {
    let mut out = String::with_capacity(self.cards.len() * 16);
    for card in &self.cards {
      out.push_str(&card.count.to_string());
      out.push(' ');
      out.push_str(&card.name);
      out.push('\n');
    }
    out
  }

  pub fn card_count_from_name(&self, name: &str) -> Option<&ParsedCard> {
    let key = normalize_name(name).to_lowercase();
    self
      .cards
      .binary_search_by(|probe| probe.name.to_lowercase().cmp(&key))
      .map(|idx| &self.cards[idx])
      .ok()
  }

  pub fn len(&self) -> usize {
    self.card_count
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Collapses internal whitespace and trims
pub fn normalize_name(name: &str) -> String {
  name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes trailing `(SET)` / `[SET]` annotations, with an optional collector number
fn strip_annotations(name: &str) -> &str {
  lazy_static! {
    static ref ANNOTATION_REGEX: Regex =
      Regex::new(r"(?:\s*[\(\[][^\)\]]*[\)\]](?:\s+[0-9A-Za-z★-]+)?)+\s*$")
        .expect("Failed to compile ANNOTATION_REGEX regex");
  }
  match ANNOTATION_REGEX.find(name) {
    // Keep lines that are nothing but an annotation
    Some(m) if m.start() > 0 => name[..m.start()].trim(),
    _ => name.trim(),
  }
}

#[macro_export]
macro_rules! decklist {
  ($list:expr) => {
    $crate::decklist::Decklist::from_list($list)
  };
}

#[cfg(test)]
mod tests {
  use crate::decklist::*;

  #[test]
  fn quantities_and_x_suffix() {
    let deck = decklist!(
      "
      1 Sol Ring
      4x Island
      2 x Forest
      Command Tower
      "
    );
    assert_eq!(deck.len(), 8);
    assert_eq!(deck.card_count_from_name("island").unwrap().count, 4);
    assert_eq!(deck.card_count_from_name("Forest").unwrap().count, 2);
    assert_eq!(deck.card_count_from_name("Command Tower").unwrap().count, 1);
  }

  #[test]
  fn card_names_starting_with_x_are_not_quantity_suffixes() {
    let deck = decklist!("1 Xenagos, God of Revels");
    assert_eq!(deck.cards[0].name, "Xenagos, God of Revels");
  }

  #[test]
  fn comments_and_blank_lines_are_ignored() {
    let deck = decklist!(
      "
      # This is a comment
      1 Sol Ring

      // another comment
      1 Arcane Signet
      "
    );
    assert_eq!(deck.len(), 2);
    assert_eq!(deck.cards.len(), 2);
  }

  #[test]
  fn set_annotations_are_stripped() {
    let deck = decklist!(
      "
      1 Sol Ring (C21) 263
      1 Arcane Signet [CMR]
      1 Llanowar Elves (DAR) 168
      "
    );
    assert!(deck.card_count_from_name("Sol Ring").is_some());
    assert!(deck.card_count_from_name("Arcane Signet").is_some());
    assert!(deck.card_count_from_name("Llanowar Elves").is_some());
  }

  #[test]
  fn duplicates_merge_case_insensitively() {
    let deck = decklist!(
      "
      10 Island
      5 island
      2  ISLAND
      "
    );
    assert_eq!(deck.cards.len(), 1);
    assert_eq!(deck.cards[0].name, "Island");
    assert_eq!(deck.cards[0].count, 17);
  }

  #[test]
  fn garbled_line_becomes_single_copy() {
    let deck = decklist!("%%% not a card %%%");
    assert_eq!(deck.len(), 1);
    assert_eq!(deck.cards[0].name, "%%% not a card %%%");
  }

  #[test]
  fn zero_quantity_is_dropped() {
    let deck = decklist!(
      "
      0 Island
      1 Sol Ring
      "
    );
    assert_eq!(deck.len(), 1);
    assert!(deck.card_count_from_name("Island").is_none());
  }

  #[test]
  fn headers_and_sideboard() {
    let deck = decklist!(
      "
      Commander
      1 Tatyova, Benthic Druid
      Deck
      1 Cultivate
      Sideboard
      1 Craterhoof Behemoth
      "
    );
    assert_eq!(deck.len(), 2);
    assert!(deck.card_count_from_name("Craterhoof Behemoth").is_none());
  }

  #[test]
  fn serialize_then_reparse_is_identity() {
    let deck = decklist!(
      "
      1 Fire // Ice
      36 Island (M21) 264
      1 Sol Ring
      1 Sol Ring
      garbled line
      "
    );
    let reparsed = Decklist::from_list(&deck.to_list());
    assert_eq!(reparsed, deck);
    assert_eq!(reparsed.len(), 40);
  }

  #[test]
  fn huge_quantity_does_not_panic() {
    let deck = decklist!("99999999999999999999999 Island");
    assert_eq!(deck.len(), 1);
  }

  #[test]
  fn quantities_are_capped_per_card() {
    let deck = decklist!(
      "
      18446744073709551615 Island
      1 Island
      20000 Forest
      "
    );
    assert_eq!(deck.card_count_from_name("Island").unwrap().count, MAX_COPIES);
    assert_eq!(deck.card_count_from_name("Forest").unwrap().count, MAX_COPIES);
    assert_eq!(deck.len(), 2 * MAX_COPIES);
    let merged = Decklist::from_cards(vec![
      ParsedCard {
        name: "Island".to_string(),
        count: usize::MAX,
      },
      ParsedCard {
        name: "island".to_string(),
        count: usize::MAX,
      },
    ]);
    assert_eq!(merged.len(), MAX_COPIES);
  }
}
