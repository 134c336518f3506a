//! Parameter vector operations used by the evolutionary loop.
//!
//! # Operations
//!
//! - **Initialization**: [`glorot_uniform`] for kernels
//! - **Crossover**: [`crossover_groups`] splits at the middle parameter group
//! - **Mutation**: [`mutate`] adds standard normal noise to a coin-flipped
//!   subset of values
//!
//! # Mutation Rate
//!
//! [`mutate`] decides per value by rounding a uniform draw to 0 or 1 and
//! comparing that against `rate`. Any rate in `(0, 1]` therefore mutates
//! about half of the values; the rate only matters outside that range.
//! Trained policies depend on this, so it is kept as is.

use rand::Rng;
use rand_distr::StandardNormal;

use flapevo_engine::ParameterGroup;

/// Creates a vector by applying a function to each index.
///
/// # Examples
///
/// ```
/// use flapevo_policy::weights;
///
/// let values = weights::from_fn(|i| i as f32 * 0.5, 3);
/// assert_eq!(values, vec![0.0, 0.5, 1.0]);
/// ```
pub fn from_fn<F>(mut f: F, len: usize) -> Vec<f32>
where
    F: FnMut(usize) -> f32,
{
    let mut values = Vec::with_capacity(len);
    for i in 0..len {
        values.push(f(i));
    }
    values
}

/// Samples a `[fan_in, fan_out]` kernel from the Glorot uniform distribution.
///
/// Values are drawn from `[-limit, limit]` with `limit = sqrt(6 / (fan_in + fan_out))`.
pub fn glorot_uniform<R>(rng: &mut R, fan_in: usize, fan_out: usize) -> ParameterGroup
where
    R: Rng + ?Sized,
{
    #[expect(clippy::cast_precision_loss)]
    let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
    ParameterGroup::from_fn(vec![fan_in, fan_out], |_| rng.random_range(-limit..=limit))
}

/// Perturbs values in place.
///
/// Each value gets standard normal noise added when `round(uniform[0, 1))`
/// is less than `rate`. See the [module documentation](self) for what this
/// means for the effective rate.
pub fn mutate<R>(values: &mut [f32], rate: f32, rng: &mut R)
where
    R: Rng + ?Sized,
{
    for value in values {
        let flip = rng.random::<f32>().round();
        if flip < rate {
            *value += rng.sample::<f32, _>(StandardNormal);
        }
    }
}

/// Combines two parents group by group.
///
/// Groups before `mid = p1.len() / 2` come from `p1`, the rest from `p2`.
/// Callers must make sure both parents have the same shapes.
#[must_use]
pub fn crossover_groups(p1: &[ParameterGroup], p2: &[ParameterGroup]) -> Vec<ParameterGroup> {
    debug_assert_eq!(p1.len(), p2.len());
    let mid = p1.len() / 2;
    p1.iter()
        .zip(p2)
        .enumerate()
        .map(|(i, (g1, g2))| if i < mid { g1.clone() } else { g2.clone() })
        .collect()
}
