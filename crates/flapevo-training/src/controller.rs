use std::time::Duration;

use chrono::Utc;
use rand_pcg::Pcg32;

use flapevo_engine::{
    CourseConfig, Engine, FrameStep, ParameterBlob, PolicyFactory, RenderSurface,
};
use flapevo_policy::MlpFactory;

use crate::{
    PlaySimulation, PlayStats, Pilot, SavedPolicy, Trainer, TrainingOptions, TrainingStats,
};

/// What the controller is currently running.
#[derive(Debug, Default, derive_more::IsVariant)]
pub enum Session {
    #[default]
    Idle,
    Training(Trainer),
    Playing(PlaySimulation),
}

/// Result of [`TrainingController::start_play`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum PlayStatus {
    Started,
    /// No usable trained policy was supplied.
    Unavailable,
}

/// Top-level driver wiring the engine to a training or play session.
///
/// Hosts call the command methods in response to user input and
/// [`frame`](Self::frame) from their main loop.
#[derive(Debug)]
pub struct TrainingController {
    engine: Engine,
    session: Session,
    factory: MlpFactory,
}

impl TrainingController {
    #[must_use]
    pub fn new(config: CourseConfig, rng: Pcg32) -> Self {
        Self {
            engine: Engine::new(config, rng),
            session: Session::Idle,
            factory: MlpFactory::default(),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Training progress, if a training session is active.
    #[must_use]
    pub fn stats(&self) -> Option<TrainingStats> {
        match &self.session {
            Session::Training(trainer) => Some(trainer.stats()),
            Session::Idle | Session::Playing(_) => None,
        }
    }

    #[must_use]
    pub fn play_stats(&self) -> Option<PlayStats> {
        match &self.session {
            Session::Playing(play) => Some(play.stats()),
            Session::Idle | Session::Training(_) => None,
        }
    }

    pub fn start_training(&mut self, now: Duration, options: TrainingOptions) {
        self.stop();
        log::info!(
            "training with population {} ({})",
            options.population,
            if options.crossover {
                "crossover"
            } else {
                "single parent"
            }
        );
        let mut trainer = Trainer::new(options, Box::new(self.factory));
        self.engine.start(now, &mut trainer);
        self.session = Session::Training(trainer);
    }

    /// Starts play mode driven by `parameters`.
    ///
    /// Missing or incompatible parameters leave the controller untouched and
    /// report [`PlayStatus::Unavailable`].
    pub fn start_play(&mut self, now: Duration, parameters: Option<ParameterBlob>) -> PlayStatus {
        let Some(parameters) = parameters else {
            return PlayStatus::Unavailable;
        };
        let policy = match self.factory.restore(parameters) {
            Ok(policy) => policy,
            Err(err) => {
                log::warn!("trained policy cannot be used: {err}");
                return PlayStatus::Unavailable;
            }
        };
        self.start_play_session(now, Pilot::Policy(policy));
        PlayStatus::Started
    }

    pub fn start_manual(&mut self, now: Duration) {
        self.start_play_session(now, Pilot::Manual);
    }

    fn start_play_session(&mut self, now: Duration, pilot: Pilot) {
        self.stop();
        let mut play = PlaySimulation::new(pilot);
        self.engine.start(now, &mut play);
        self.session = Session::Playing(play);
    }

    /// Stops the current session, destroying all objects.
    pub fn stop(&mut self) {
        match &mut self.session {
            Session::Idle => return,
            Session::Training(trainer) => self.engine.stop(trainer),
            Session::Playing(play) => self.engine.stop(play),
        }
        self.session = Session::Idle;
    }

    pub fn pause(&mut self, now: Duration) {
        self.engine.pause(now);
    }

    pub fn resume(&mut self, now: Duration) {
        self.engine.resume(now);
    }

    pub fn toggle_pause(&mut self, now: Duration) {
        if self.engine.is_paused() {
            self.resume(now);
        } else {
            self.pause(now);
        }
    }

    /// Queues a flap in manual play. Ignored in every other mode.
    pub fn request_flap(&mut self) {
        if let Session::Playing(play) = &self.session
            && play.pilot().is_manual()
        {
            play.request_flap(self.engine.stage_mut());
        }
    }

    /// Runs one frame of the active session if one is due.
    pub fn frame(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> Option<FrameStep> {
        match &mut self.session {
            Session::Idle => None,
            Session::Training(trainer) => self.engine.frame(now, trainer, surface),
            Session::Playing(play) => self.engine.frame(now, play, surface),
        }
    }

    #[must_use]
    pub fn time_until_next_frame(&self, now: Duration) -> Option<Duration> {
        self.engine.time_until_next_frame(now)
    }

    /// Snapshot of the best-ever policy, if training has produced one.
    #[must_use]
    pub fn save_best_policy(&self, name: &str) -> Option<SavedPolicy> {
        let Session::Training(trainer) = &self.session else {
            return None;
        };
        let best = trainer.population().best()?;
        Some(SavedPolicy::from_best(name, best, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use flapevo_engine::{DecisionPolicy as _, DisplayList, Fill, NodeCounts};
    use flapevo_policy::MlpPolicy;
    use rand::SeedableRng as _;

    use super::*;

    fn controller(config: CourseConfig) -> TrainingController {
        TrainingController::new(config, Pcg32::seed_from_u64(21))
    }

    #[test]
    fn test_play_without_policy_is_unavailable() {
        let mut controller = controller(CourseConfig::default());
        assert_eq!(
            controller.start_play(Duration::ZERO, None),
            PlayStatus::Unavailable
        );
        assert!(controller.session().is_idle());
    }

    #[test]
    fn test_play_with_incompatible_policy_is_unavailable() {
        let mut controller = controller(CourseConfig::default());
        let mut rng = Pcg32::seed_from_u64(0);
        let narrow = MlpPolicy::random(
            NodeCounts {
                hidden: 3,
                ..NodeCounts::DEFAULT
            },
            &mut rng,
        );
        assert!(
            controller
                .start_play(Duration::ZERO, Some(narrow.copy()))
                .is_unavailable()
        );
    }

    #[test]
    fn test_play_with_saved_policy() {
        let mut controller = controller(CourseConfig::default());
        let mut rng = Pcg32::seed_from_u64(0);
        let policy = MlpPolicy::random(NodeCounts::DEFAULT, &mut rng);

        let status = controller.start_play(Duration::ZERO, Some(policy.copy()));
        assert!(status.is_started());
        assert!(controller.play_stats().is_some());
        assert_eq!(controller.engine().stage().scene().agent_count(), 1);
    }

    #[test]
    fn test_training_then_save_best() {
        let config = CourseConfig {
            height: 41.0,
            ..CourseConfig::default()
        };
        let interval = config.frame_interval();
        let mut controller = controller(config);
        controller.start_training(Duration::ZERO, TrainingOptions::default());
        assert!(controller.save_best_policy("early").is_none());

        let mut surface = DisplayList::new();
        controller.frame(interval, &mut surface).unwrap();

        let saved = controller.save_best_policy("run").unwrap();
        let stats = controller.stats().unwrap();
        assert_eq!(saved.name, "run");
        assert_eq!(saved.generation, 0);
        assert_eq!(Some(saved.fitness), stats.best.map(|b| b.fitness));
        assert_eq!(saved.node_counts, NodeCounts::DEFAULT);
        assert_eq!(saved.parameters.group_count(), 4);
        // Drawing happens before the restart: no agent survived, two obstacles did.
        assert_eq!(surface.iter_fill(Fill::Agent).count(), 0);
        assert_eq!(surface.iter_fill(Fill::Obstacle).count(), 4);
    }

    #[test]
    fn test_pause_resume_and_flap_routing() {
        let config = CourseConfig::default();
        let interval = config.frame_interval();
        let mut controller = controller(config);
        controller.start_manual(Duration::ZERO);

        controller.toggle_pause(Duration::ZERO);
        assert!(controller.engine().is_paused());
        assert!(controller.frame(interval * 10, &mut DisplayList::new()).is_none());

        controller.toggle_pause(interval * 10);
        controller.request_flap();
        controller.frame(interval * 11, &mut DisplayList::new()).unwrap();
        let (_, agent) = controller.engine().stage().scene().agents().next().unwrap();
        assert!(agent.velocity() < 0.0);
    }

    #[test]
    fn test_switching_modes_stops_previous_session() {
        let mut controller = controller(CourseConfig::default());
        controller.start_training(Duration::ZERO, TrainingOptions::default());
        assert_eq!(controller.engine().stage().scene().agent_count(), 10);

        controller.start_manual(Duration::ZERO);
        assert!(controller.session().is_playing());
        assert!(controller.stats().is_none());
        assert_eq!(controller.engine().stage().scene().agent_count(), 1);

        controller.stop();
        assert!(controller.session().is_idle());
        assert!(!controller.engine().is_running());
    }
}
