use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Number of values an agent senses each frame.
pub const INPUT_COUNT: usize = 5;

/// Number of values a policy produces each frame (flap score, idle score).
pub const OUTPUT_COUNT: usize = 2;

/// Layer sizes of a decision policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCounts {
    pub input: usize,
    pub hidden: usize,
    pub output: usize,
}

impl NodeCounts {
    pub const DEFAULT: Self = Self {
        input: INPUT_COUNT,
        hidden: 8,
        output: OUTPUT_COUNT,
    };
}

impl Default for NodeCounts {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One tensor of policy parameters: a shape and its values in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameterGroup")]
pub struct ParameterGroup {
    shape: Vec<usize>,
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct RawParameterGroup {
    shape: Vec<usize>,
    values: Vec<f32>,
}

impl TryFrom<RawParameterGroup> for ParameterGroup {
    type Error = PolicyError;

    fn try_from(raw: RawParameterGroup) -> Result<Self, Self::Error> {
        Self::new(raw.shape, raw.values)
    }
}

impl ParameterGroup {
    /// Creates a group, checking that the value count matches the shape.
    pub fn new(shape: Vec<usize>, values: Vec<f32>) -> Result<Self, PolicyError> {
        let expected = shape.iter().product::<usize>();
        if values.len() != expected {
            return Err(PolicyError::GroupLength {
                shape,
                expected,
                len: values.len(),
            });
        }
        Ok(Self { shape, values })
    }

    /// Creates a group whose values are `f(index)` in row-major order.
    pub fn from_fn<F>(shape: Vec<usize>, f: F) -> Self
    where
        F: FnMut(usize) -> f32,
    {
        let len = shape.iter().product();
        let values = (0..len).map(f).collect();
        Self { shape, values }
    }

    #[must_use]
    pub fn zeros(shape: Vec<usize>) -> Self {
        Self::from_fn(shape, |_| 0.0)
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Opaque snapshot of a policy's parameters.
///
/// The simulation and the trainer never look inside a blob; they only move it
/// between policies and to storage. Only the backend that produced it
/// interprets the groups.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterBlob {
    groups: Vec<ParameterGroup>,
}

impl ParameterBlob {
    #[must_use]
    pub fn new(groups: Vec<ParameterGroup>) -> Self {
        Self { groups }
    }

    #[must_use]
    pub fn groups(&self) -> &[ParameterGroup] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut [ParameterGroup] {
        &mut self.groups
    }

    /// Number of parameter groups (tensors).
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of scalar parameters across all groups.
    #[must_use]
    pub fn scalar_count(&self) -> usize {
        self.groups.iter().map(ParameterGroup::len).sum()
    }

    #[must_use]
    pub fn shapes(&self) -> Vec<Vec<usize>> {
        self.groups.iter().map(|g| g.shape.clone()).collect()
    }

    /// Returns `true` if both blobs have the same group shapes in the same order.
    #[must_use]
    pub fn has_same_shape(&self, other: &Self) -> bool {
        self.groups.len() == other.groups.len()
            && self
                .groups
                .iter()
                .zip(&other.groups)
                .all(|(a, b)| a.shape == b.shape)
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum PolicyError {
    #[display("parameter shapes {found:?} do not match expected {expected:?}")]
    ShapeMismatch {
        expected: Vec<Vec<usize>>,
        found: Vec<Vec<usize>>,
    },
    #[display("parameter group with shape {shape:?} needs {expected} values, found {len}")]
    GroupLength {
        shape: Vec<usize>,
        expected: usize,
        len: usize,
    },
    #[display("policy parameters already released")]
    Released,
}

/// Capability interface for an agent's decision model.
///
/// Implementations own their numeric parameters. Callers only exchange
/// [`ParameterBlob`]s between policies of the same backend.
pub trait DecisionPolicy: fmt::Debug {
    /// Maps sensed inputs to action scores. Must not change the parameters.
    fn predict(&self, inputs: &[f32; INPUT_COUNT]) -> [f32; OUTPUT_COUNT];

    /// Returns a deep snapshot of the current parameters.
    fn copy(&self) -> ParameterBlob;

    /// Combines this policy's parameters with `other`'s.
    ///
    /// Groups in the first half come from `self`, the rest from `other`.
    fn crossover(&self, other: &dyn DecisionPolicy) -> Result<ParameterBlob, PolicyError>;

    /// Perturbs the parameters in place.
    fn mutate(&mut self, rate: f32, rng: &mut dyn RngCore);

    fn node_counts(&self) -> NodeCounts;

    /// Number of parameter groups.
    fn weight_count(&self) -> usize;

    /// Number of scalar parameters.
    fn parameter_count(&self) -> usize;

    /// Replaces all parameters. The blob must have this policy's shape.
    fn set_parameters(&mut self, parameters: ParameterBlob) -> Result<(), PolicyError>;

    /// Builds a new policy of the same backend and node counts from `parameters`.
    fn with_parameters(&self, parameters: ParameterBlob) -> Result<BoxedPolicy, PolicyError>;

    /// Releases backend resources. Calling it twice is an error.
    fn dispose(&mut self) -> Result<(), PolicyError>;

    fn clone_boxed(&self) -> BoxedPolicy;
}

pub type BoxedPolicy = Box<dyn DecisionPolicy>;

impl Clone for BoxedPolicy {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// Creates freshly initialized policies.
pub trait PolicyFactory: fmt::Debug {
    fn create(&self, rng: &mut dyn RngCore) -> BoxedPolicy;

    /// Builds a policy from stored parameters.
    fn restore(&self, parameters: ParameterBlob) -> Result<BoxedPolicy, PolicyError>;
}
