use flapevo_engine::{Agent, BoxedPolicy, DecisionPolicy, ObjectId};

/// A dead agent kept as breeding material.
#[derive(Debug, Clone)]
pub struct Retired {
    id: ObjectId,
    score: u32,
    fitness: f32,
    policy: BoxedPolicy,
}

impl Retired {
    #[must_use]
    pub fn new(id: ObjectId, score: u32, fitness: f32, policy: BoxedPolicy) -> Self {
        Self {
            id,
            score,
            fitness,
            policy,
        }
    }

    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    #[must_use]
    pub fn policy(&self) -> &dyn DecisionPolicy {
        self.policy.as_ref()
    }
}

/// The fittest agent seen across all generations so far.
#[derive(Debug, Clone)]
pub struct BestEver {
    id: ObjectId,
    score: u32,
    fitness: f32,
    generation: u32,
    policy: BoxedPolicy,
}

impl BestEver {
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    /// Generation the agent lived in.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[must_use]
    pub fn policy(&self) -> &dyn DecisionPolicy {
        self.policy.as_ref()
    }
}

/// Fitness summary of a finished generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSummary {
    pub generation: u32,
    pub agents: usize,
    pub min_fitness: f32,
    pub mean_fitness: f32,
    pub max_fitness: f32,
    pub max_score: u32,
    /// Whether this generation produced a new best-ever agent.
    pub improved: bool,
}

/// Live and dead agents of the current generation plus the best-ever record.
///
/// Every spawned agent is tracked as live until the engine hands it back, at
/// which point it joins the dead pool; `live + dead == spawned` holds until the
/// next generation starts.
#[derive(Debug, Default)]
pub struct Population {
    live: Vec<ObjectId>,
    dead: Vec<Retired>,
    spawned: usize,
    generation: u32,
    best: Option<BestEver>,
}

impl Population {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn live(&self) -> &[ObjectId] {
        &self.live
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn dead(&self) -> &[Retired] {
        &self.dead
    }

    #[must_use]
    pub fn spawned(&self) -> usize {
        self.spawned
    }

    /// Index of the current generation, starting at 0.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[must_use]
    pub fn best(&self) -> Option<&BestEver> {
        self.best.as_ref()
    }

    /// Returns `true` once every agent spawned this generation has died.
    #[must_use]
    pub fn is_extinct(&self) -> bool {
        self.spawned > 0 && self.live.is_empty()
    }

    /// Resets the live set and spawn count. The dead pool is kept for breeding.
    pub fn begin_generation(&mut self) {
        self.live.clear();
        self.spawned = 0;
    }

    pub fn track(&mut self, id: ObjectId) {
        self.live.push(id);
        self.spawned += 1;
    }

    /// Moves a dead agent from the live set to the dead pool.
    ///
    /// Returns `false` if the agent was not tracked as live or has no policy.
    pub fn retire(&mut self, id: ObjectId, agent: Agent) -> bool {
        let Some(index) = self.live.iter().position(|live| *live == id) else {
            return false;
        };
        let (score, fitness) = (agent.score(), agent.fitness());
        let Some(policy) = agent.into_policy() else {
            return false;
        };
        self.live.remove(index);
        self.dead.push(Retired::new(id, score, fitness, policy));
        true
    }

    /// Releases the dead pool's policies, except the best-ever agent's.
    ///
    /// Release failures are logged and ignored.
    pub fn clear_dead_pool(&mut self) {
        let best_id = self.best.as_ref().map(|best| best.id);
        for mut retired in self.dead.drain(..) {
            if Some(retired.id) == best_id {
                continue;
            }
            if let Err(err) = retired.policy.dispose() {
                log::warn!("failed to release policy of agent {}: {err}", retired.id);
            }
        }
    }

    /// Closes the current generation: promotes its fittest agent if it beats
    /// the best-ever record and advances the generation index.
    pub fn conclude_generation(&mut self) -> GenerationSummary {
        let mut summary = GenerationSummary {
            generation: self.generation,
            agents: self.dead.len(),
            min_fitness: 0.0,
            mean_fitness: 0.0,
            max_fitness: 0.0,
            max_score: 0,
            improved: false,
        };

        // The first maximum wins ties.
        let mut candidate: Option<&Retired> = None;
        for retired in &self.dead {
            if candidate.is_none_or(|c| retired.fitness > c.fitness) {
                candidate = Some(retired);
            }
        }

        if let Some(candidate) = candidate {
            let fitness = self.dead.iter().map(Retired::fitness);
            summary.min_fitness = fitness.clone().fold(f32::INFINITY, f32::min);
            #[expect(clippy::cast_precision_loss)]
            let mean = fitness.sum::<f32>() / self.dead.len() as f32;
            summary.mean_fitness = mean;
            summary.max_fitness = candidate.fitness;
            summary.max_score = self.dead.iter().map(Retired::score).max().unwrap_or(0);

            if self
                .best
                .as_ref()
                .is_none_or(|best| candidate.fitness > best.fitness)
            {
                self.best = Some(BestEver {
                    id: candidate.id,
                    score: candidate.score,
                    fitness: candidate.fitness,
                    generation: self.generation,
                    policy: candidate.policy.clone(),
                });
                summary.improved = true;
            }
        }

        self.generation += 1;
        summary
    }
}

#[cfg(test)]
mod tests {
    use flapevo_engine::{Controller, CourseConfig, NodeCounts, Scene};
    use flapevo_policy::MlpPolicy;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    struct Fixture {
        scene: Scene,
        config: CourseConfig,
        rng: Pcg32,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                scene: Scene::new(),
                config: CourseConfig::default(),
                rng: Pcg32::seed_from_u64(99),
            }
        }

        fn agent(&mut self) -> (ObjectId, Agent) {
            let policy = MlpPolicy::random(NodeCounts::DEFAULT, &mut self.rng);
            let agent = Agent::new(&self.config, Controller::Policy(Box::new(policy)));
            // Only used to allocate a distinct id.
            let id = self.scene.insert(flapevo_engine::Obstacle::with_gap_top(
                0.0,
                100.0,
                &self.config,
            ));
            (id, agent)
        }
    }

    /// Agents only recompute fitness with an obstacle in view, so set it on
    /// the dead pool entry directly.
    fn retire_with_fitness(
        population: &mut Population,
        id: ObjectId,
        fitness: f32,
        f: &mut Fixture,
    ) {
        let policy = MlpPolicy::random(NodeCounts::DEFAULT, &mut f.rng);
        population.live.retain(|live| *live != id);
        population
            .dead
            .push(Retired::new(id, 0, fitness, Box::new(policy)));
    }

    #[test]
    fn test_conservation_through_a_generation() {
        let mut f = Fixture::new();
        let mut population = Population::new();
        let agents: Vec<_> = (0..4).map(|_| f.agent()).collect();
        for (id, _) in &agents {
            population.track(*id);
        }
        assert_eq!(population.spawned(), 4);

        for (id, agent) in agents {
            assert!(population.retire(id, agent));
            assert_eq!(
                population.live_count() + population.dead().len(),
                population.spawned()
            );
        }
        assert!(population.is_extinct());
    }

    #[test]
    fn test_retire_ignores_untracked_agents() {
        let mut f = Fixture::new();
        let mut population = Population::new();
        let (id, agent) = f.agent();
        assert!(!population.retire(id, agent));
        assert!(population.dead().is_empty());
        assert!(!population.is_extinct());
    }

    #[test]
    fn test_best_ever_is_monotone() {
        let mut f = Fixture::new();
        let mut population = Population::new();
        let mut last_best = f32::NEG_INFINITY;

        for fitness in [[-300.0, -100.0], [-500.0, -400.0], [20.0, 10.0], [15.0, 20.0]] {
            population.begin_generation();
            for value in fitness {
                let (id, _) = f.agent();
                population.track(id);
                retire_with_fitness(&mut population, id, value, &mut f);
            }
            population.conclude_generation();
            let best = population.best().unwrap().fitness();
            assert!(best >= last_best);
            last_best = best;
            population.clear_dead_pool();
        }

        let best = population.best().unwrap();
        assert_eq!(best.fitness(), 20.0);
        // Equal fitness in a later generation does not replace the record.
        assert_eq!(best.generation(), 2);
        assert_eq!(population.generation(), 4);
    }

    #[test]
    fn test_conclude_summarizes_fitness() {
        let mut f = Fixture::new();
        let mut population = Population::new();
        for value in [-10.0, 30.0, 30.0, 10.0] {
            let (id, _) = f.agent();
            population.track(id);
            retire_with_fitness(&mut population, id, value, &mut f);
        }
        let first_max = population.dead()[1].id();

        let summary = population.conclude_generation();
        assert_eq!(summary.generation, 0);
        assert_eq!(summary.agents, 4);
        assert_eq!(summary.min_fitness, -10.0);
        assert_eq!(summary.mean_fitness, 15.0);
        assert_eq!(summary.max_fitness, 30.0);
        assert!(summary.improved);
        assert_eq!(population.best.as_ref().unwrap().id, first_max);
    }

    #[test]
    fn test_clear_dead_pool_keeps_best_policy_usable() {
        let mut f = Fixture::new();
        let mut population = Population::new();
        for value in [5.0, 1.0] {
            let (id, _) = f.agent();
            population.track(id);
            retire_with_fitness(&mut population, id, value, &mut f);
        }
        population.conclude_generation();
        population.clear_dead_pool();

        assert!(population.dead().is_empty());
        let best = population.best().unwrap();
        assert!(best.policy().copy().scalar_count() > 0);
    }

    #[test]
    fn test_clear_dead_pool_skips_release_failures() {
        let mut f = Fixture::new();
        let mut population = Population::new();
        for value in [1.0, 5.0, 2.0] {
            let (id, _) = f.agent();
            population.track(id);
            retire_with_fitness(&mut population, id, value, &mut f);
        }
        population.conclude_generation();

        // Released ahead of the sweep, so releasing it again fails.
        population.dead[0].policy.dispose().unwrap();
        assert!(matches!(
            population.dead[0].policy.dispose(),
            Err(flapevo_engine::PolicyError::Released)
        ));

        population.clear_dead_pool();

        assert!(population.dead().is_empty());
        let best = population.best.as_mut().unwrap();
        assert_eq!(best.fitness, 5.0);
        assert!(best.policy.dispose().is_ok());
    }
}
