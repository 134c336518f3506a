use flapevo_engine::{
    BoxedPolicy, Controller, FrameOutcome, FrameStep, ObjectId, SimObject, Simulation, Stage,
};

/// Who controls the single agent in play mode.
#[derive(Debug, Clone, derive_more::IsVariant)]
pub enum Pilot {
    /// A trained policy; every run gets a fresh copy.
    Policy(BoxedPolicy),
    /// The keyboard.
    Manual,
}

/// Progress of a play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayStats {
    /// Obstacles passed in the current run.
    pub score: u32,
    pub best_score: u32,
    /// Number of runs started, including the current one.
    pub attempts: u32,
}

/// Runs one agent along the course, restarting whenever it crashes.
#[derive(Debug)]
pub struct PlaySimulation {
    pilot: Pilot,
    agent: Option<ObjectId>,
    stats: PlayStats,
}

impl PlaySimulation {
    #[must_use]
    pub fn new(pilot: Pilot) -> Self {
        Self {
            pilot,
            agent: None,
            stats: PlayStats::default(),
        }
    }

    #[must_use]
    pub fn pilot(&self) -> &Pilot {
        &self.pilot
    }

    #[must_use]
    pub fn agent(&self) -> Option<ObjectId> {
        self.agent
    }

    #[must_use]
    pub fn stats(&self) -> PlayStats {
        self.stats
    }

    /// Queues a flap for a manually piloted agent.
    pub fn request_flap(&self, stage: &mut Stage) {
        if let Some(agent) = self
            .agent
            .and_then(|id| stage.scene_mut().get_mut(id))
            .and_then(SimObject::as_agent_mut)
        {
            agent.request_flap();
        }
    }
}

impl Simulation for PlaySimulation {
    fn on_start(&mut self, stage: &mut Stage) {
        let controller = match &self.pilot {
            Pilot::Policy(policy) => Controller::Policy(policy.clone()),
            Pilot::Manual => Controller::manual(),
        };
        self.agent = Some(stage.spawn_agent(controller));
        stage.spawn_obstacle(stage.config().width / 2.0);
        self.stats.score = 0;
        self.stats.attempts += 1;
    }

    fn on_update(&mut self, stage: &mut Stage, _step: FrameStep) {
        stage.advance_course();
        if let Some(agent) = self
            .agent
            .and_then(|id| stage.scene().get(id))
            .and_then(SimObject::as_agent)
        {
            self.stats.score = agent.score();
        }
    }

    fn on_destroyed(&mut self, _stage: &mut Stage, id: ObjectId, object: SimObject) {
        if self.agent != Some(id) {
            return;
        }
        self.agent = None;
        if let Some(agent) = object.as_agent() {
            self.stats.score = agent.score();
            self.stats.best_score = self.stats.best_score.max(agent.score());
            log::info!(
                "run {} ended with score {} (traveled {:.0})",
                self.stats.attempts,
                agent.score(),
                agent.traveled_distance()
            );
        }
    }

    fn after_frame(&mut self, _stage: &mut Stage, _step: FrameStep) -> FrameOutcome {
        if self.agent.is_none() {
            FrameOutcome::Restart
        } else {
            FrameOutcome::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use flapevo_engine::{CourseConfig, Engine, NullSurface};
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_manual_flap_keeps_agent_up() {
        let config = CourseConfig::default();
        let interval = config.frame_interval();
        let mut engine = Engine::new(config, Pcg32::seed_from_u64(0));
        let mut sim = PlaySimulation::new(Pilot::Manual);
        engine.start(Duration::ZERO, &mut sim);
        let id = sim.agent().unwrap();

        sim.request_flap(engine.stage_mut());
        engine.frame(interval, &mut sim, &mut NullSurface).unwrap();

        let agent = engine.stage().scene().get(id).unwrap().as_agent().unwrap();
        assert_eq!(agent.velocity(), -5.0 + 0.25);
        assert_eq!(agent.predictions().count(), 0);
    }

    #[test]
    fn test_crash_restarts_with_new_attempt() {
        let config = CourseConfig::default();
        let interval = config.frame_interval();
        let mut engine = Engine::new(config, Pcg32::seed_from_u64(0));
        let mut sim = PlaySimulation::new(Pilot::Manual);
        let mut now = Duration::ZERO;
        engine.start(now, &mut sim);
        let first = sim.agent().unwrap();

        // Without flapping the agent falls to the ground within a few seconds.
        for _ in 0..600 {
            now += interval;
            engine.frame(now, &mut sim, &mut NullSurface);
            if sim.stats().attempts > 1 {
                break;
            }
        }

        assert_eq!(sim.stats().attempts, 2);
        assert_ne!(sim.agent(), Some(first));
        assert_eq!(engine.stage().scene().agent_count(), 1);
    }
}
