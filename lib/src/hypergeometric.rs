//! # Hypergeometric probabilities
//!
//! Exact probabilities for drawing without replacement. Arguments follow the usual
//! notation: `N` cards in the population, `K` of them successes, `n` draws and `k`
//! observed successes. Out of range arguments are clamped rather than rejected.

/// Returns the binomial coefficient n choose k, or 0 when k is outside [0, n]
pub fn choose(n: i64, k: i64) -> f64 {
  if k < 0 || n < 0 || k > n {
    return 0.0;
  }
  let k = std::cmp::min(k, n - k);
  let mut result = 1.0;
  for i in 1..=k {
    result = result * (n - k + i) as f64 / i as f64;
  }
  result
}

/// Returns the probability of exactly `k` successes in `n` draws from a population
/// of `population` cards containing `successes` successes
pub fn pmf(k: i64, successes: i64, population: i64, n: i64) -> f64 {
  let (successes, population, n) = clamp(successes, population, n);
  let total = choose(population, n);
  if total == 0.0 {
    return 0.0;
  }
  choose(successes, k) * choose(population - successes, n - k) / total
}

/// Returns the probability of at least `k` successes, clamped to [0, 1]
pub fn at_least(k: i64, successes: i64, population: i64, n: i64) -> f64 {
  let (successes, population, n) = clamp(successes, population, n);
  let p: f64 = (k.max(0)..=n.min(successes))
    .map(|i| pmf(i, successes, population, n))
    .sum();
  p.max(0.0).min(1.0)
}

fn clamp(successes: i64, population: i64, n: i64) -> (i64, i64, i64) {
  let population = population.max(0);
  (
    successes.max(0).min(population),
    population,
    n.max(0).min(population),
  )
}
