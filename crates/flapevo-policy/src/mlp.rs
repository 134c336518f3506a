use rand::{Rng, RngCore};

use flapevo_engine::{
    BoxedPolicy, DecisionPolicy, INPUT_COUNT, NodeCounts, OUTPUT_COUNT, ParameterBlob,
    ParameterGroup, PolicyError, PolicyFactory,
};

use crate::weights;

const HIDDEN_KERNEL: usize = 0;
const HIDDEN_BIAS: usize = 1;
const OUTPUT_KERNEL: usize = 2;
const OUTPUT_BIAS: usize = 3;

/// Dense two-layer perceptron: sigmoid hidden layer, softmax output.
///
/// Parameters are stored as four groups, kernels row-major with shape
/// `[inputs, units]`:
///
/// | index | group         | shape              |
/// |-------|---------------|--------------------|
/// | 0     | hidden kernel | `[input, hidden]`  |
/// | 1     | hidden bias   | `[hidden]`         |
/// | 2     | output kernel | `[hidden, output]` |
/// | 3     | output bias   | `[output]`         |
///
/// # Example
///
/// ```
/// use flapevo_engine::{DecisionPolicy, NodeCounts};
/// use flapevo_policy::MlpPolicy;
/// use rand::SeedableRng as _;
///
/// let mut rng = rand_pcg::Pcg32::seed_from_u64(0);
/// let policy = MlpPolicy::random(NodeCounts::DEFAULT, &mut rng);
/// let [flap, idle] = policy.predict(&[0.5, 0.3, 0.6, 0.9, 0.0]);
/// assert!((flap + idle - 1.0).abs() < 1e-5);
/// assert_eq!(policy.weight_count(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct MlpPolicy {
    node_counts: NodeCounts,
    parameters: ParameterBlob,
    released: bool,
}

impl MlpPolicy {
    /// Creates a policy with Glorot-uniform kernels and zero biases, like a
    /// freshly built dense layer stack.
    pub fn random<R>(node_counts: NodeCounts, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let NodeCounts {
            input,
            hidden,
            output,
        } = node_counts;
        let groups = vec![
            weights::glorot_uniform(rng, input, hidden),
            ParameterGroup::zeros(vec![hidden]),
            weights::glorot_uniform(rng, hidden, output),
            ParameterGroup::zeros(vec![output]),
        ];
        Self {
            node_counts,
            parameters: ParameterBlob::new(groups),
            released: false,
        }
    }

    /// Creates a policy from stored parameters, checking their shapes.
    pub fn from_parameters(
        node_counts: NodeCounts,
        parameters: ParameterBlob,
    ) -> Result<Self, PolicyError> {
        check_shapes(node_counts, &parameters)?;
        Ok(Self {
            node_counts,
            parameters,
            released: false,
        })
    }

    /// Group shapes a policy with `node_counts` must have.
    #[must_use]
    pub fn shapes(node_counts: NodeCounts) -> Vec<Vec<usize>> {
        let NodeCounts {
            input,
            hidden,
            output,
        } = node_counts;
        vec![
            vec![input, hidden],
            vec![hidden],
            vec![hidden, output],
            vec![output],
        ]
    }

    #[must_use]
    pub fn parameters(&self) -> &ParameterBlob {
        &self.parameters
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }

    fn group(&self, index: usize) -> &[f32] {
        self.parameters.groups()[index].values()
    }
}

fn check_shapes(node_counts: NodeCounts, parameters: &ParameterBlob) -> Result<(), PolicyError> {
    let expected = MlpPolicy::shapes(node_counts);
    let found = parameters.shapes();
    if expected != found {
        return Err(PolicyError::ShapeMismatch { expected, found });
    }
    Ok(())
}

/// Computes `activation(inputs . kernel + bias)` for one dense layer.
fn dense(inputs: &[f32], kernel: &[f32], bias: &[f32]) -> Vec<f32> {
    let units = bias.len();
    weights::from_fn(
        |j| {
            inputs
                .iter()
                .enumerate()
                .map(|(i, x)| x * kernel[i * units + j])
                .sum::<f32>()
                + bias[j]
        },
        units,
    )
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn softmax(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values {
        *v /= sum;
    }
}

impl DecisionPolicy for MlpPolicy {
    fn predict(&self, inputs: &[f32; INPUT_COUNT]) -> [f32; OUTPUT_COUNT] {
        let mut hidden = dense(
            inputs,
            self.group(HIDDEN_KERNEL),
            self.group(HIDDEN_BIAS),
        );
        for h in &mut hidden {
            *h = sigmoid(*h);
        }
        let mut output = dense(
            &hidden,
            self.group(OUTPUT_KERNEL),
            self.group(OUTPUT_BIAS),
        );
        softmax(&mut output);

        let mut result = [0.0; OUTPUT_COUNT];
        for (r, o) in result.iter_mut().zip(output) {
            *r = o;
        }
        result
    }

    fn copy(&self) -> ParameterBlob {
        self.parameters.clone()
    }

    fn crossover(&self, other: &dyn DecisionPolicy) -> Result<ParameterBlob, PolicyError> {
        if self.released {
            return Err(PolicyError::Released);
        }
        let other = other.copy();
        if !self.parameters.has_same_shape(&other) {
            return Err(PolicyError::ShapeMismatch {
                expected: self.parameters.shapes(),
                found: other.shapes(),
            });
        }
        Ok(ParameterBlob::new(weights::crossover_groups(
            self.parameters.groups(),
            other.groups(),
        )))
    }

    fn mutate(&mut self, rate: f32, rng: &mut dyn RngCore) {
        for group in self.parameters.groups_mut() {
            weights::mutate(group.values_mut(), rate, rng);
        }
    }

    fn node_counts(&self) -> NodeCounts {
        self.node_counts
    }

    fn weight_count(&self) -> usize {
        self.parameters.group_count()
    }

    fn parameter_count(&self) -> usize {
        self.parameters.scalar_count()
    }

    fn set_parameters(&mut self, parameters: ParameterBlob) -> Result<(), PolicyError> {
        check_shapes(self.node_counts, &parameters)?;
        self.parameters = parameters;
        Ok(())
    }

    fn with_parameters(&self, parameters: ParameterBlob) -> Result<BoxedPolicy, PolicyError> {
        let policy = Self::from_parameters(self.node_counts, parameters)?;
        Ok(Box::new(policy))
    }

    fn dispose(&mut self) -> Result<(), PolicyError> {
        if self.released {
            return Err(PolicyError::Released);
        }
        self.released = true;
        Ok(())
    }

    fn clone_boxed(&self) -> BoxedPolicy {
        Box::new(self.clone())
    }
}

/// Creates [`MlpPolicy`] instances with fixed node counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct MlpFactory {
    node_counts: NodeCounts,
}

impl PolicyFactory for MlpFactory {
    fn create(&self, rng: &mut dyn RngCore) -> BoxedPolicy {
        Box::new(MlpPolicy::random(self.node_counts, rng))
    }

    fn restore(&self, parameters: ParameterBlob) -> Result<BoxedPolicy, PolicyError> {
        let policy = MlpPolicy::from_parameters(self.node_counts, parameters)?;
        Ok(Box::new(policy))
    }
}
