use crate::categories::CategoryTables;
use crate::decklist::{normalize_name, Decklist, ParsedCard};
use crate::profile::{DeckProfile, ProfileThresholds};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_CAPACITY: usize = 256;

/// ProfileCache memoizes deck profiles by a digest of the normalized decklist and commander.
/// Card names are keyed case-insensitively, the commander by its exact whitespace-normalized
/// spelling since the profile hands it back. The tables and thresholds are fixed for the
/// lifetime of the cache
pub struct ProfileCache {
  tables: CategoryTables,
  thresholds: ProfileThresholds,
  capacity: usize,
  profiles: Mutex<HashMap<[u8; 32], Arc<DeckProfile>>>,
}

impl ProfileCache {
  pub fn new(tables: CategoryTables, thresholds: ProfileThresholds) -> Self {
    Self::with_capacity(tables, thresholds, DEFAULT_CAPACITY)
  }

  /// Once `capacity` profiles are stored the cache is emptied before the next insert
  pub fn with_capacity(tables: CategoryTables, thresholds: ProfileThresholds, capacity: usize) -> Self {
    Self {
      tables,
      thresholds,
      capacity: capacity.max(1),
      profiles: Mutex::new(HashMap::new()),
    }
  }

  pub fn tables(&self) -> &CategoryTables {
    &self.tables
  }

  /// Returns the cached profile for these cards, building it on a miss
  pub fn get_or_build(&self, cards: &[ParsedCard], commander: Option<&str>) -> Arc<DeckProfile> {
    let normalized = Decklist::from_cards(cards.iter().cloned());
    let commander = commander.map(normalize_name);
    let commander = commander.as_deref();
    let key = Self::key(&normalized, commander);
    if let Some(profile) = self.profiles.lock().get(&key) {
      return Arc::clone(profile);
    }
    // Built outside the lock, a racing builder produces an identical profile
    let profile = Arc::new(DeckProfile::build(
      &self.tables,
      &self.thresholds,
      &normalized.cards,
      commander,
    ));
    let mut profiles = self.profiles.lock();
    if profiles.len() >= self.capacity {
      debug!("profile cache full ({} entries), clearing", profiles.len());
      profiles.clear();
    }
    Arc::clone(profiles.entry(key).or_insert(profile))
  }

  pub fn len(&self) -> usize {
    self.profiles.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn clear(&self) {
    self.profiles.lock().clear();
  }

  fn key(deck: &Decklist, commander: Option<&str>) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(deck.to_list().to_lowercase().as_bytes());
    hasher.update(b"\ncommander:");
    if let Some(commander) = commander {
      hasher.update(commander.as_bytes());
    }
    hasher.finalize().into()
  }
}

impl Default for ProfileCache {
  fn default() -> Self {
    Self::new(CategoryTables::standard(), ProfileThresholds::default())
  }
}
