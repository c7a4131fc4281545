//! # Opening hands
//!
//! `HandFacts` is the per-hand feature snapshot extracted through the shared category
//! tables, and `HandTags` are the tactical flags derived from those facts and the deck
//! profile. Both are pure and recomputed for every candidate hand.
mod facts;
mod tags;

pub use facts::HandFacts;
pub use tags::HandTags;
