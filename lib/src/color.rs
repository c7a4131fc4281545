//! # Mana colors and color sets
use std::fmt;

/// ManaColor represents one of the five [colors](https://mtg.gamepedia.com/Color)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ManaColor {
  #[serde(rename = "W")]
  White = 0,
  #[serde(rename = "U")]
  Blue = 1,
  #[serde(rename = "B")]
  Black = 2,
  #[serde(rename = "R")]
  Red = 3,
  #[serde(rename = "G")]
  Green = 4,
}

impl ManaColor {
  /// All colors in WUBRG order
  pub const ALL: [ManaColor; 5] = [
    ManaColor::White,
    ManaColor::Blue,
    ManaColor::Black,
    ManaColor::Red,
    ManaColor::Green,
  ];

  /// Returns the color for a WUBRG symbol, ignoring case
  pub fn from_symbol(symbol: char) -> Option<Self> {
    match symbol.to_ascii_uppercase() {
      'W' => Some(Self::White),
      'U' => Some(Self::Blue),
      'B' => Some(Self::Black),
      'R' => Some(Self::Red),
      'G' => Some(Self::Green),
      _ => None,
    }
  }

  pub fn symbol(self) -> char {
    match self {
      Self::White => 'W',
      Self::Blue => 'U',
      Self::Black => 'B',
      Self::Red => 'R',
      Self::Green => 'G',
    }
  }

  #[inline]
  fn bit(self) -> u8 {
    1 << (self as u8)
  }
}

/// ColorSet is a compact set of mana colors, stored as one bit per color.
/// Serializes as a sorted list of color symbols, i.e. `["U", "G"]`
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<ManaColor>", from = "Vec<ManaColor>")]
pub struct ColorSet {
  bits: u8,
}

impl ColorSet {
  const ALL_BITS: u8 = 0b0001_1111;

  /// Returns an empty color set
  pub fn new() -> Self {
    Self { bits: 0 }
  }

  /// Returns the set of all five colors
  pub fn all() -> Self {
    Self {
      bits: Self::ALL_BITS,
    }
  }

  /// Parses a WUBRG string such as "GU". Unknown symbols are ignored
  pub fn from_symbols(symbols: &str) -> Self {
    symbols
      .chars()
      .filter_map(ManaColor::from_symbol)
      .collect()
  }

  pub fn insert(&mut self, color: ManaColor) {
    self.bits |= color.bit();
  }

  pub fn contains(self, color: ManaColor) -> bool {
    self.bits & color.bit() != 0
  }

  pub fn union(self, other: ColorSet) -> Self {
    Self {
      bits: self.bits | other.bits,
    }
  }

  pub fn intersection(self, other: ColorSet) -> Self {
    Self {
      bits: self.bits & other.bits,
    }
  }

  /// Returns the number of colors in the set
  #[inline]
  pub fn len(self) -> usize {
    self.bits.count_ones() as usize
  }

  #[inline]
  pub fn is_empty(self) -> bool {
    self.bits == 0
  }

  pub fn iter(self) -> impl Iterator<Item = ManaColor> {
    ManaColor::ALL.iter().copied().filter(move |c| self.contains(*c))
  }
}

impl std::iter::FromIterator<ManaColor> for ColorSet {
  fn from_iter<I: IntoIterator<Item = ManaColor>>(iter: I) -> Self {
    let mut set = ColorSet::new();
    for color in iter {
      set.insert(color);
    }
    set
  }
}

impl From<Vec<ManaColor>> for ColorSet {
  fn from(colors: Vec<ManaColor>) -> Self {
    colors.into_iter().collect()
  }
}

impl From<ColorSet> for Vec<ManaColor> {
  fn from(set: ColorSet) -> Self {
    set.iter().collect()
  }
}

impl fmt::Display for ColorSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_empty() {
      return write!(f, "C");
    }
    for color in self.iter() {
      write!(f, "{}", color.symbol())?;
    }
    Ok(())
  }
}
