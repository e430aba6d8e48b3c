//! Question selection: a pure, unbiased draw from a candidate pool.
//!
//! Selection takes the RNG by argument so callers can seed it for
//! deterministic tests (`StdRng::seed_from_u64`) and use `thread_rng`
//! in production.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{Difficulty, DifficultyDistribution, Question};

/// Draw `count` questions uniformly at random from `pool`.
///
/// Fisher–Yates shuffle, prefix take. When the pool holds `count` or
/// fewer questions the whole pool is returned (shuffled).
pub fn select<R: Rng + ?Sized>(pool: &[Question], count: usize, rng: &mut R) -> Vec<Question> {
    let mut drawn: Vec<Question> = pool.to_vec();
    drawn.shuffle(rng);
    drawn.truncate(count);
    drawn
}

/// Draw `count` questions honoring a per-difficulty distribution.
///
/// Each tier is filled up to its quota from a shuffled per-tier
/// partition; when a tier runs short, the remainder is topped up from
/// whatever is left, so the draw still returns `min(count, pool)` items.
pub fn select_distributed<R: Rng + ?Sized>(
    pool: &[Question],
    count: usize,
    distribution: &DifficultyDistribution,
    rng: &mut R,
) -> Vec<Question> {
    let (easy_quota, medium_quota, hard_quota) = distribution.quotas(count);

    let mut picked: Vec<Question> = Vec::with_capacity(count);
    let mut leftovers: Vec<Question> = Vec::new();

    for (difficulty, quota) in [
        (Difficulty::Easy, easy_quota),
        (Difficulty::Medium, medium_quota),
        (Difficulty::Hard, hard_quota),
    ] {
        let mut tier: Vec<Question> = pool
            .iter()
            .filter(|q| q.difficulty == difficulty)
            .cloned()
            .collect();
        tier.shuffle(rng);
        let take = quota.min(tier.len());
        leftovers.extend(tier.split_off(take));
        picked.extend(tier);
    }

    if picked.len() < count {
        leftovers.shuffle(rng);
        let missing = count - picked.len();
        picked.extend(leftovers.into_iter().take(missing));
    }

    picked
}
