use std::{collections::VecDeque, time::Duration};

use crate::{
    BoxedPolicy, CourseConfig, DecisionPolicy, Fill, INPUT_COUNT, OUTPUT_COUNT, Obstacle, Rect,
    RenderSurface, Scene,
};

/// Maximum number of predictions kept per agent (oldest are discarded).
pub const PREDICTION_LOG_CAPACITY: usize = 600;

/// What decides when an agent flaps.
#[derive(Debug, derive_more::IsVariant)]
pub enum Controller {
    /// A decision policy consulted every frame an obstacle is in view.
    Policy(BoxedPolicy),
    /// Keyboard input; a queued flap is applied on the next update.
    Manual { flap_requested: bool },
}

impl Controller {
    #[must_use]
    pub fn manual() -> Self {
        Controller::Manual {
            flap_requested: false,
        }
    }
}

/// One policy consultation, kept for inspection only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRecord {
    pub time: Duration,
    pub inputs: [f32; INPUT_COUNT],
    pub outputs: [f32; OUTPUT_COUNT],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Crash {
    #[display("ground")]
    Ground,
    #[display("obstacle")]
    Obstacle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum AgentStatus {
    Alive,
    Crashed(Crash),
}

/// A falling body that flaps to stay airborne.
///
/// The agent's x never changes; the course moves past it. Fitness rewards
/// distance traveled and penalizes remaining distance to the next obstacle.
#[derive(Debug)]
pub struct Agent {
    bounds: Rect,
    velocity: f32,
    gravity: f32,
    traveled_distance: f32,
    score: u32,
    fitness: f32,
    controller: Controller,
    predictions: VecDeque<PredictionRecord>,
}

impl Agent {
    /// Creates an agent at its start position.
    #[must_use]
    pub fn new(config: &CourseConfig, controller: Controller) -> Self {
        Self {
            bounds: Rect::new(
                config.agent_x,
                config.agent_start_y(),
                config.agent_size,
                config.agent_size,
            ),
            velocity: 0.0,
            gravity: config.gravity,
            traveled_distance: 0.0,
            score: 0,
            fitness: 0.0,
            controller,
            predictions: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    #[must_use]
    pub fn x(&self) -> f32 {
        self.bounds.x
    }

    #[must_use]
    pub fn y(&self) -> f32 {
        self.bounds.y
    }

    /// Moves the agent vertically, mainly for setting up scenarios.
    pub fn set_y(&mut self, y: f32) {
        self.bounds.y = y;
    }

    #[must_use]
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    #[must_use]
    pub fn traveled_distance(&self) -> f32 {
        self.traveled_distance
    }

    /// Number of obstacles passed.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    #[must_use]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    #[must_use]
    pub fn policy(&self) -> Option<&dyn DecisionPolicy> {
        match &self.controller {
            Controller::Policy(policy) => Some(policy.as_ref()),
            Controller::Manual { .. } => None,
        }
    }

    pub fn policy_mut(&mut self) -> Option<&mut BoxedPolicy> {
        match &mut self.controller {
            Controller::Policy(policy) => Some(policy),
            Controller::Manual { .. } => None,
        }
    }

    pub fn predictions(&self) -> impl Iterator<Item = &PredictionRecord> + '_ {
        self.predictions.iter()
    }

    /// Sets the velocity to the upward flap impulse.
    pub fn flap(&mut self, impulse: f32) {
        self.velocity = impulse;
    }

    /// Queues a flap for manually controlled agents. Ignored otherwise.
    pub fn request_flap(&mut self) {
        if let Controller::Manual { flap_requested } = &mut self.controller {
            *flap_requested = true;
        }
    }

    pub fn advance(&mut self, distance: f32) {
        self.traveled_distance += distance;
    }

    pub fn record_obstacle_passed(&mut self) {
        self.score += 1;
    }

    /// Builds the normalized policy inputs for the targeted obstacle.
    #[must_use]
    pub fn sense(&self, obstacle: &Obstacle, config: &CourseConfig) -> [f32; INPUT_COUNT] {
        [
            self.bounds.y / config.height,
            obstacle.gap_top() / config.height,
            obstacle.gap_bottom() / config.height,
            obstacle.x() / config.width,
            self.velocity / config.velocity_scale,
        ]
    }

    /// Runs one frame: decide, integrate, and test for collisions.
    pub fn update(&mut self, scene: &Scene, config: &CourseConfig, time: Duration) -> AgentStatus {
        let target = scene
            .upcoming_obstacle(self.bounds.x)
            .filter(|o| o.x() > 0.0)
            .map(|o| (o, self.sense(o, config)));
        match &mut self.controller {
            Controller::Policy(policy) => {
                if let Some((obstacle, inputs)) = target {
                    let outputs = policy.predict(&inputs);
                    if outputs[0] > outputs[1] {
                        self.flap(config.flap_impulse);
                    }
                    self.fitness = self.traveled_distance - obstacle.x();
                    if self.predictions.len() == PREDICTION_LOG_CAPACITY {
                        self.predictions.pop_front();
                    }
                    self.predictions.push_back(PredictionRecord {
                        time,
                        inputs,
                        outputs,
                    });
                }
            }
            Controller::Manual { flap_requested } => {
                if std::mem::take(flap_requested) {
                    self.flap(config.flap_impulse);
                }
            }
        }

        self.velocity += self.gravity;
        self.bounds.y += self.velocity;

        let floor = config.height - self.bounds.height;
        if self.bounds.y > floor {
            self.bounds.y = floor;
            self.velocity = 0.0;
        }
        if self.bounds.y < 0.0 {
            self.bounds.y = 0.0;
            self.velocity = 0.0;
        }

        if self.bounds.bottom() >= config.height - self.bounds.height {
            return AgentStatus::Crashed(Crash::Ground);
        }
        if let Some(obstacle) = scene.blocking_obstacle(self.bounds.x)
            && self.hits(obstacle)
        {
            return AgentStatus::Crashed(Crash::Obstacle);
        }
        AgentStatus::Alive
    }

    /// Returns `true` if the agent overlaps `obstacle` horizontally while its
    /// y is outside the gap band.
    #[must_use]
    pub fn hits(&self, obstacle: &Obstacle) -> bool {
        let overlaps = self.bounds.x <= obstacle.right() && self.bounds.right() >= obstacle.x();
        let in_gap = self.bounds.y >= obstacle.gap_top() && self.bounds.y <= obstacle.gap_bottom();
        overlaps && !in_gap
    }

    pub fn draw(&self, surface: &mut dyn RenderSurface) {
        surface.fill_rect(self.bounds, Fill::Agent);
    }

    /// Consumes the agent, returning its policy if it had one.
    #[must_use]
    pub fn into_policy(self) -> Option<BoxedPolicy> {
        match self.controller {
            Controller::Policy(policy) => Some(policy),
            Controller::Manual { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::RngCore;

    use super::*;
    use crate::{NodeCounts, ParameterBlob, PolicyError, SimObject};

    /// Policy that always returns the same outputs.
    #[derive(Debug, Clone)]
    struct FixedPolicy([f32; OUTPUT_COUNT]);

    impl DecisionPolicy for FixedPolicy {
        fn predict(&self, _inputs: &[f32; INPUT_COUNT]) -> [f32; OUTPUT_COUNT] {
            self.0
        }
        fn copy(&self) -> ParameterBlob {
            ParameterBlob::default()
        }
        fn crossover(&self, _other: &dyn DecisionPolicy) -> Result<ParameterBlob, PolicyError> {
            Ok(ParameterBlob::default())
        }
        fn mutate(&mut self, _rate: f32, _rng: &mut dyn RngCore) {}
        fn node_counts(&self) -> NodeCounts {
            NodeCounts::DEFAULT
        }
        fn weight_count(&self) -> usize {
            0
        }
        fn parameter_count(&self) -> usize {
            0
        }
        fn set_parameters(&mut self, _parameters: ParameterBlob) -> Result<(), PolicyError> {
            Ok(())
        }
        fn with_parameters(&self, _parameters: ParameterBlob) -> Result<BoxedPolicy, PolicyError> {
            Ok(self.clone_boxed())
        }
        fn dispose(&mut self) -> Result<(), PolicyError> {
            Ok(())
        }
        fn clone_boxed(&self) -> BoxedPolicy {
            Box::new(self.clone())
        }
    }

    fn flapper() -> Controller {
        Controller::Policy(Box::new(FixedPolicy([1.0, 0.0])))
    }

    fn glider() -> Controller {
        Controller::Policy(Box::new(FixedPolicy([0.0, 1.0])))
    }

    #[test]
    fn test_gravity_integration() {
        let config = CourseConfig::default();
        let scene = Scene::new();
        let mut agent = Agent::new(&config, glider());
        let y0 = agent.y();

        assert!(agent.update(&scene, &config, Duration::ZERO).is_alive());
        assert_eq!(agent.velocity(), 0.25);
        assert_eq!(agent.y(), y0 + 0.25);
        // no obstacle in view: nothing predicted, fitness untouched
        assert_eq!(agent.predictions().count(), 0);
        assert_eq!(agent.fitness(), 0.0);
    }

    #[test]
    fn test_flap_and_fitness_with_obstacle_in_view() {
        let config = CourseConfig::default();
        let mut scene = Scene::new();
        scene.insert(SimObject::Obstacle(Obstacle::with_gap_top(
            400.0, 200.0, &config,
        )));
        let mut agent = Agent::new(&config, flapper());
        agent.advance(12.0);

        assert!(agent.update(&scene, &config, Duration::from_millis(16)).is_alive());
        assert_eq!(agent.velocity(), -5.0 + 0.25);
        assert_eq!(agent.fitness(), 12.0 - 400.0);

        let record = agent.predictions().next().unwrap();
        assert_eq!(record.time, Duration::from_millis(16));
        assert_eq!(record.outputs, [1.0, 0.0]);
        assert_eq!(record.inputs[0], 300.0 / 600.0);
        assert_eq!(record.inputs[3], 400.0 / 800.0);
    }

    #[test]
    fn test_obstacle_behind_is_not_targeted() {
        let config = CourseConfig::default();
        let mut scene = Scene::new();
        scene.insert(SimObject::Obstacle(Obstacle::with_gap_top(
            90.0, 200.0, &config,
        )));
        scene.insert(SimObject::Obstacle(Obstacle::with_gap_top(
            500.0, 200.0, &config,
        )));
        let mut agent = Agent::new(&config, glider());
        agent.set_y(250.0);

        assert!(agent.update(&scene, &config, Duration::ZERO).is_alive());
        assert_eq!(agent.fitness(), -500.0);
    }

    #[test]
    fn test_ceiling_clamp_zeroes_velocity() {
        let config = CourseConfig::default();
        let scene = Scene::new();
        let mut agent = Agent::new(&config, Controller::manual());
        agent.set_y(1.0);
        agent.request_flap();

        assert!(agent.update(&scene, &config, Duration::ZERO).is_alive());
        assert_eq!(agent.y(), 0.0);
        assert_eq!(agent.velocity(), 0.0);
    }

    #[test]
    fn test_ground_collision() {
        let config = CourseConfig::default();
        let scene = Scene::new();
        let mut agent = Agent::new(&config, glider());
        agent.set_y(config.height - 2.0 * config.agent_size);

        assert_eq!(
            agent.update(&scene, &config, Duration::ZERO),
            AgentStatus::Crashed(Crash::Ground)
        );
    }

    #[test]
    fn test_inside_gap_survives_overlap() {
        let config = CourseConfig::default();
        let mut scene = Scene::new();
        // Overlapping the agent horizontally, gap spanning y 200..380.
        scene.insert(SimObject::Obstacle(Obstacle::with_gap_top(
            90.0, 200.0, &config,
        )));
        let mut agent = Agent::new(&config, glider());
        agent.set_y(250.0);

        assert!(agent.update(&scene, &config, Duration::ZERO).is_alive());
    }

    #[test]
    fn test_outside_gap_crashes_into_obstacle() {
        let config = CourseConfig::default();
        let mut scene = Scene::new();
        scene.insert(SimObject::Obstacle(Obstacle::with_gap_top(
            90.0, 200.0, &config,
        )));
        let mut agent = Agent::new(&config, glider());
        agent.set_y(100.0);

        assert_eq!(
            agent.update(&scene, &config, Duration::ZERO),
            AgentStatus::Crashed(Crash::Obstacle)
        );
    }

    #[test]
    fn test_prediction_log_is_bounded() {
        let config = CourseConfig::default();
        let mut scene = Scene::new();
        scene.insert(SimObject::Obstacle(Obstacle::with_gap_top(
            700.0, 200.0, &config,
        )));
        let mut agent = Agent::new(&config, flapper());
        for _ in 0..PREDICTION_LOG_CAPACITY + 10 {
            agent.set_y(250.0);
            let _ = agent.update(&scene, &config, Duration::ZERO);
        }
        assert_eq!(agent.predictions().count(), PREDICTION_LOG_CAPACITY);
    }
}
