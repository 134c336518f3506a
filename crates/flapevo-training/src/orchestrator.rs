use std::time::Duration;

use serde::{Deserialize, Serialize};

use flapevo_engine::{
    Controller, FrameOutcome, FrameStep, ObjectId, PolicyFactory, SimObject, Simulation, Stage,
};

use crate::{GenerationSummary, Population, genetic};

/// Population settings for a training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingOptions {
    /// Agents spawned per generation.
    pub population: usize,
    /// Breed from two parents instead of one.
    pub crossover: bool,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            population: 10,
            crossover: true,
        }
    }
}

/// Best-ever agent as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestSummary {
    pub score: u32,
    pub fitness: f32,
    pub generation: u32,
    /// Number of parameter groups in the agent's policy.
    pub weight_count: usize,
}

/// Per-frame snapshot of a training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingStats {
    pub alive: usize,
    pub total: usize,
    pub generation: u32,
    /// Time since the current generation started, excluding paused time.
    pub generation_time: Duration,
    pub best: Option<BestSummary>,
}

/// Evolves a population of policy-driven agents across generations.
///
/// Each start spawns a new generation bred from the previous one's dead pool.
/// When the last live agent dies the generation is concluded and a restart
/// is requested at the end of that frame.
#[derive(Debug)]
pub struct Trainer {
    options: TrainingOptions,
    factory: Box<dyn PolicyFactory>,
    population: Population,
    generation_time: Duration,
    last_summary: Option<GenerationSummary>,
}

impl Trainer {
    #[must_use]
    pub fn new(options: TrainingOptions, factory: Box<dyn PolicyFactory>) -> Self {
        Self {
            options,
            factory,
            population: Population::new(),
            generation_time: Duration::ZERO,
            last_summary: None,
        }
    }

    #[must_use]
    pub fn options(&self) -> &TrainingOptions {
        &self.options
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Summary of the most recently concluded generation.
    #[must_use]
    pub fn last_summary(&self) -> Option<&GenerationSummary> {
        self.last_summary.as_ref()
    }

    #[must_use]
    pub fn stats(&self) -> TrainingStats {
        let population = &self.population;
        TrainingStats {
            alive: population.live_count(),
            total: population.spawned(),
            generation: population.generation(),
            generation_time: self.generation_time,
            best: population.best().map(|best| BestSummary {
                score: best.score(),
                fitness: best.fitness(),
                generation: best.generation(),
                weight_count: best.policy().weight_count(),
            }),
        }
    }

    fn spawn_generation(&mut self, stage: &mut Stage) {
        let TrainingOptions {
            population: size,
            crossover,
        } = self.options;
        let elite_slots = size.div_ceil(2);

        for slot in 0..size {
            let bred = genetic::breed(self.population.dead(), crossover, stage.rng_mut());
            let mut policy = match bred {
                Ok(Some(policy)) => policy,
                Ok(None) => self.factory.create(stage.rng_mut()),
                Err(err) => {
                    log::warn!("breeding failed, using a fresh policy: {err}");
                    self.factory.create(stage.rng_mut())
                }
            };
            if slot < elite_slots
                && let Some(best) = self.population.best()
                && let Err(err) = policy.set_parameters(best.policy().copy())
            {
                log::warn!("failed to copy best-ever parameters: {err}");
            }
            let id = stage.spawn_agent(Controller::Policy(policy));
            self.population.track(id);
        }
    }
}

impl Simulation for Trainer {
    fn on_start(&mut self, stage: &mut Stage) {
        self.population.begin_generation();
        self.spawn_generation(stage);
        stage.spawn_obstacle(stage.config().width / 2.0);
        self.population.clear_dead_pool();
        self.generation_time = Duration::ZERO;
        log::debug!(
            "generation {} spawned with {} agents",
            self.population.generation(),
            self.population.spawned()
        );
    }

    fn on_update(&mut self, stage: &mut Stage, step: FrameStep) {
        stage.advance_course();
        self.generation_time = step.total;
    }

    fn on_destroyed(&mut self, _stage: &mut Stage, id: ObjectId, object: SimObject) {
        if let SimObject::Agent(agent) = object
            && !self.population.retire(id, agent)
        {
            log::debug!("agent {id} was not part of the current generation");
        }
    }

    fn after_frame(&mut self, _stage: &mut Stage, _step: FrameStep) -> FrameOutcome {
        if !self.population.is_extinct() {
            return FrameOutcome::Continue;
        }
        let summary = self.population.conclude_generation();
        log::info!(
            "generation {} extinct after {:.1}s: fitness min {:.1} / mean {:.1} / max {:.1}, best score {}{}",
            summary.generation,
            self.generation_time.as_secs_f64(),
            summary.min_fitness,
            summary.mean_fitness,
            summary.max_fitness,
            summary.max_score,
            if summary.improved { " (new best)" } else { "" },
        );
        self.last_summary = Some(summary);
        FrameOutcome::Restart
    }
}
