//! Static topic list used whenever the generator cannot supply a topic.

use rand::seq::IndexedRandom;
use rand::Rng;

pub const FALLBACK_TOPICS: [&str; 10] = [
    "Artificial intelligence replacing human jobs is desirable",
    "Social media does more harm than good to society",
    "A university education should be essential for everyone",
    "Remote work is more productive than office work",
    "A universal basic income should be introduced",
    "Animal testing is necessary for scientific progress",
    "The death penalty should be abolished",
    "Nuclear power generation should be expanded",
    "Bitcoin will become the currency of the future",
    "English should be adopted as a global official language",
];

pub fn random_topic<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    FALLBACK_TOPICS
        .choose(rng)
        .copied()
        .unwrap_or(FALLBACK_TOPICS[0])
}

/// A fallback topic different from `current` when possible.
pub fn fresh_topic<R: Rng + ?Sized>(current: Option<&str>, rng: &mut R) -> &'static str {
    let candidates: Vec<&'static str> = FALLBACK_TOPICS
        .iter()
        .copied()
        .filter(|t| Some(*t) != current)
        .collect();
    candidates
        .choose(rng)
        .copied()
        .unwrap_or_else(|| random_topic(rng))
}
