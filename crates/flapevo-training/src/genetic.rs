//! Selection and breeding of decision policies.
//!
//! # Algorithm
//!
//! Each new agent's policy is bred from the previous generation's dead pool:
//!
//! 1. **Selection** - [`select_weighted`] walks the pool, subtracting each
//!    candidate's fitness from a uniform draw in `[0, 1)`
//! 2. **Crossover** - with crossover enabled, two parents are selected and the
//!    child takes the first half of its parameter groups from the first parent
//!    and the rest from the second; otherwise the child copies one parent
//! 3. **Mutation** - the child is mutated with a rate drawn by [`mutation_rate`]
//!
//! # Selection Walk
//!
//! The walk stops as soon as the remaining draw is no longer positive, so with
//! fitness values well above one the first candidate with positive fitness
//! wins almost always. Fitness is usually negative early on (an agent that
//! dies before reaching the first obstacle has traveled less than the
//! obstacle's distance); the walk then runs off the end and the last
//! candidate is chosen.

use rand::{Rng, RngCore};

use flapevo_engine::{BoxedPolicy, PolicyError};

use crate::Retired;

/// Range mutation rates are drawn from, once per breeding call.
pub const MUTATION_RATE_RANGE: std::ops::Range<f32> = 0.05..0.15;

/// Picks a candidate by walking the pool with a uniform draw.
///
/// Returns `None` only for an empty pool. A walk past the end picks the last
/// candidate.
///
/// # Examples
///
/// ```
/// use flapevo_training::genetic::select_weighted;
/// use rand::SeedableRng as _;
///
/// let mut rng = rand_pcg::Pcg32::seed_from_u64(0);
/// let pool = [10.0, 0.0];
/// assert_eq!(select_weighted(&pool, |f| *f, &mut rng), Some(&10.0));
///
/// let empty: [f32; 0] = [];
/// assert_eq!(select_weighted(&empty, |f| *f, &mut rng), None);
/// ```
pub fn select_weighted<'a, T, F, R>(pool: &'a [T], fitness: F, rng: &mut R) -> Option<&'a T>
where
    F: Fn(&T) -> f32,
    R: Rng + ?Sized,
{
    if pool.is_empty() {
        return None;
    }
    let mut r: f32 = rng.random();
    let mut index = 0;
    while r > 0.0 && index < pool.len() {
        r -= fitness(&pool[index]);
        index += 1;
    }
    pool.get(index.saturating_sub(1))
}

/// Draws a mutation rate from [`MUTATION_RATE_RANGE`].
pub fn mutation_rate<R>(rng: &mut R) -> f32
where
    R: Rng + ?Sized,
{
    rng.random_range(MUTATION_RATE_RANGE)
}

/// Breeds one child policy from the dead pool.
///
/// Returns `Ok(None)` if the pool is empty.
pub fn breed(
    pool: &[Retired],
    crossover: bool,
    rng: &mut dyn RngCore,
) -> Result<Option<BoxedPolicy>, PolicyError> {
    let Some(p1) = select_weighted(pool, Retired::fitness, rng) else {
        return Ok(None);
    };
    let mut child = if crossover {
        let p2 = select_weighted(pool, Retired::fitness, rng).unwrap_or(p1);
        let parameters = p1.policy().crossover(p2.policy())?;
        p1.policy().with_parameters(parameters)?
    } else {
        p1.policy().with_parameters(p1.policy().copy())?
    };

    let rate = mutation_rate(rng);
    child.mutate(rate, rng);
    Ok(Some(child))
}

#[cfg(test)]
mod tests {
    use flapevo_engine::{CourseConfig, NodeCounts, Obstacle, Scene};
    use flapevo_policy::MlpPolicy;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn retired(scene: &mut Scene, fitness: f32, rng: &mut Pcg32) -> Retired {
        // Ids only need to be distinct.
        let id = scene.insert(Obstacle::with_gap_top(0.0, 100.0, &CourseConfig::default()));
        Retired::new(id, 0, fitness, Box::new(MlpPolicy::random(NodeCounts::DEFAULT, rng)))
    }

    #[test]
    fn test_fitter_candidate_always_wins_over_zero() {
        let mut rng = Pcg32::seed_from_u64(17);
        let pool = [10.0, 0.0];
        for _ in 0..1_000 {
            assert_eq!(select_weighted(&pool, |f| *f, &mut rng), Some(&10.0));
        }
    }

    #[test]
    fn test_walk_past_end_clamps_to_last() {
        let mut rng = Pcg32::seed_from_u64(17);
        let pool = [-300.0, -200.0, -100.0];
        for _ in 0..100 {
            assert_eq!(select_weighted(&pool, |f| *f, &mut rng), Some(&-100.0));
        }
    }

    #[test]
    fn test_small_fitness_spreads_selection() {
        let mut rng = Pcg32::seed_from_u64(23);
        let pool = [0.5, 0.5];
        let mut first = 0;
        for _ in 0..2_000 {
            if std::ptr::eq(select_weighted(&pool, |f| *f, &mut rng).unwrap(), &pool[0]) {
                first += 1;
            }
        }
        // r <= 0.5 picks the first candidate.
        assert!((800..=1_200).contains(&first), "{first}");
    }

    #[test]
    fn test_mutation_rate_range() {
        let mut rng = Pcg32::seed_from_u64(0);
        for _ in 0..1_000 {
            let rate = mutation_rate(&mut rng);
            assert!(MUTATION_RATE_RANGE.contains(&rate));
        }
    }

    #[test]
    fn test_breed_from_empty_pool() {
        let mut rng = Pcg32::seed_from_u64(0);
        assert!(breed(&[], true, &mut rng).unwrap().is_none());
    }

    #[test]
    fn test_single_parent_child_keeps_shape_and_differs() {
        let mut rng = Pcg32::seed_from_u64(31);
        let mut scene = Scene::new();
        let pool = vec![retired(&mut scene, 10.0, &mut rng)];

        let child = breed(&pool, false, &mut rng).unwrap().unwrap();
        let parent = pool[0].policy().copy();
        assert!(child.copy().has_same_shape(&parent));
        assert_ne!(child.copy(), parent);
        assert_eq!(child.node_counts(), NodeCounts::DEFAULT);
    }

    #[test]
    fn test_crossover_child_comes_from_pool() {
        let mut rng = Pcg32::seed_from_u64(8);
        let mut scene = Scene::new();
        let pool = vec![
            retired(&mut scene, -50.0, &mut rng),
            retired(&mut scene, -20.0, &mut rng),
        ];

        // Negative fitness always walks to the last candidate, so both parents
        // are the same and the child only differs by mutation.
        let child = breed(&pool, true, &mut rng).unwrap().unwrap();
        let parent = pool[1].policy().copy();
        let close = child
            .copy()
            .groups()
            .iter()
            .zip(parent.groups())
            .flat_map(|(c, p)| c.values().iter().zip(p.values()))
            .filter(|(c, p)| c == p)
            .count();
        assert!(close > 0);
        assert!(close < parent.scalar_count());
    }
}
