use std::time::Duration;

use rand_pcg::Pcg32;

use crate::{
    Agent, AgentStatus, Clock, Controller, CourseConfig, EventBus, FrameStep, GameEvent, ObjectId,
    Obstacle, RenderSurface, Scene, SimObject,
};

/// Everything a running simulation reads and mutates: the course settings,
/// live objects, event bus, and the shared random source.
#[derive(Debug)]
pub struct Stage {
    config: CourseConfig,
    scene: Scene,
    bus: EventBus<GameEvent>,
    rng: Pcg32,
}

/// What the course tick did this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CourseTick {
    /// Number of obstacles that left the course.
    pub passed: u32,
    pub spawned: Option<ObjectId>,
}

impl Stage {
    #[must_use]
    pub fn new(config: CourseConfig, rng: Pcg32) -> Self {
        Self {
            config,
            scene: Scene::new(),
            bus: EventBus::new(),
            rng,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CourseConfig {
        &self.config
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn bus_mut(&mut self) -> &mut EventBus<GameEvent> {
        &mut self.bus
    }

    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Publishes `event`, logging and otherwise ignoring handler failures.
    pub fn publish(&mut self, event: &GameEvent) {
        if let Err(err) = self.bus.publish(event) {
            log::warn!("{err} while publishing {event:?}");
        }
    }

    pub fn spawn_agent(&mut self, controller: Controller) -> ObjectId {
        let agent = Agent::new(&self.config, controller);
        self.scene.insert(agent)
    }

    /// Adds an obstacle with a random gap at `x`.
    pub fn spawn_obstacle(&mut self, x: f32) -> ObjectId {
        let obstacle = Obstacle::random(x, &self.config, &mut self.rng);
        self.scene.insert(obstacle)
    }

    /// Removes an object and publishes its `Destroy` event.
    ///
    /// Returns the removed object, or `None` if `id` was not live.
    pub fn destroy(&mut self, id: ObjectId) -> Option<SimObject> {
        let object = self.scene.remove(id)?;
        self.publish(&GameEvent::Destroy {
            id,
            kind: object.kind(),
        });
        Some(object)
    }

    /// Scrolls the course by one frame.
    ///
    /// Every live agent travels `course_speed`, every obstacle moves left by
    /// the same amount, obstacles past the left edge are destroyed (each one
    /// scoring a point for every live agent), and a new obstacle is spawned at
    /// the right edge when fewer than two remain.
    pub fn advance_course(&mut self) -> CourseTick {
        let speed = self.config.course_speed;
        for (_, agent) in self.scene.agents_mut() {
            agent.advance(speed);
        }

        let mut off_course = vec![];
        for (id, obstacle) in self.scene.obstacles_mut() {
            obstacle.set_x(obstacle.x() - speed);
            if obstacle.is_off_course() {
                off_course.push(id);
            }
        }

        let mut tick = CourseTick::default();
        for id in off_course {
            for (_, agent) in self.scene.agents_mut() {
                agent.record_obstacle_passed();
            }
            self.destroy(id);
            tick.passed += 1;
        }

        if self.scene.obstacle_count() < 2 {
            tick.spawned = Some(self.spawn_obstacle(self.config.width));
        }
        tick
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum FrameOutcome {
    Continue,
    /// Stop and start again at the end of this frame.
    Restart,
}

/// Mode-specific behavior plugged into the [`Engine`] lifecycle.
pub trait Simulation {
    /// Populates the stage. Called on every start, including restarts.
    fn on_start(&mut self, stage: &mut Stage);

    /// Runs once per frame before any object updates.
    fn on_update(&mut self, stage: &mut Stage, step: FrameStep) {
        let _ = (stage, step);
    }

    /// Receives every object the engine removes from the scene, by collision
    /// or by stopping.
    fn on_destroyed(&mut self, stage: &mut Stage, id: ObjectId, object: SimObject) {
        let _ = (stage, id, object);
    }

    /// Runs after the frame has been drawn.
    fn after_frame(&mut self, stage: &mut Stage, step: FrameStep) -> FrameOutcome {
        let _ = (stage, step);
        FrameOutcome::Continue
    }

    fn on_stop(&mut self, stage: &mut Stage) {
        let _ = stage;
    }
}

/// Fixed-step frame loop over a [`Stage`].
///
/// The engine is driven by its host: call [`frame`](Self::frame) with the
/// current time as often as convenient and it runs the frames that are due.
#[derive(Debug)]
pub struct Engine {
    clock: Clock,
    stage: Stage,
}

impl Engine {
    #[must_use]
    pub fn new(config: CourseConfig, rng: Pcg32) -> Self {
        Self {
            clock: Clock::new(config.frame_interval()),
            stage: Stage::new(config, rng),
        }
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.clock.state().is_running()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Time until the next frame is due, for hosts that sleep between polls.
    #[must_use]
    pub fn time_until_next_frame(&self, now: Duration) -> Option<Duration> {
        self.clock.time_until_next_frame(now)
    }

    pub fn start<S>(&mut self, now: Duration, sim: &mut S)
    where
        S: Simulation + ?Sized,
    {
        log::debug!("starting simulation");
        self.stage.publish(&GameEvent::Start);
        sim.on_start(&mut self.stage);
        self.clock.start(now);
    }

    /// Stops the loop and destroys every live object, oldest first.
    pub fn stop<S>(&mut self, sim: &mut S)
    where
        S: Simulation + ?Sized,
    {
        log::debug!("stopping simulation");
        self.stage.publish(&GameEvent::Stop);
        sim.on_stop(&mut self.stage);
        for (id, object) in self.stage.scene.drain() {
            self.stage.publish(&GameEvent::Destroy {
                id,
                kind: object.kind(),
            });
            sim.on_destroyed(&mut self.stage, id, object);
        }
        self.clock.stop();
    }

    pub fn restart<S>(&mut self, now: Duration, sim: &mut S)
    where
        S: Simulation + ?Sized,
    {
        self.stage.publish(&GameEvent::Restart);
        self.stop(sim);
        self.start(now, sim);
    }

    pub fn pause(&mut self, now: Duration) {
        self.clock.pause(now);
    }

    pub fn resume(&mut self, now: Duration) {
        self.clock.resume(now);
    }

    /// Polls the clock and runs one frame if it is due.
    ///
    /// Returns the frame that ran, or `None` if none was due (or the engine is
    /// stopped or paused).
    pub fn frame<S>(
        &mut self,
        now: Duration,
        sim: &mut S,
        surface: &mut dyn RenderSurface,
    ) -> Option<FrameStep>
    where
        S: Simulation + ?Sized,
    {
        let tick = self.clock.poll(now)?;
        self.stage.publish(&GameEvent::UpdatePhysics {
            since_last_frame: tick.since_last_frame,
        });
        let step = tick.frame?;

        surface.clear();
        self.stage.publish(&GameEvent::Update(step));
        sim.on_update(&mut self.stage, step);

        for id in self.stage.scene.ids() {
            // Objects destroyed earlier in this frame are skipped.
            let Some(mut object) = self.stage.scene.remove(id) else {
                continue;
            };
            let status = match &mut object {
                SimObject::Agent(agent) => {
                    agent.update(&self.stage.scene, &self.stage.config, step.total)
                }
                SimObject::Obstacle(_) => AgentStatus::Alive,
            };
            match status {
                AgentStatus::Alive => self.stage.scene.restore(id, object),
                AgentStatus::Crashed(crash) => {
                    log::debug!("agent {id} crashed into {crash}");
                    self.stage.publish(&GameEvent::Destroy {
                        id,
                        kind: object.kind(),
                    });
                    sim.on_destroyed(&mut self.stage, id, object);
                }
            }
        }

        self.stage.publish(&GameEvent::Draw(step));
        self.stage.scene.draw(surface);

        if sim.after_frame(&mut self.stage, step).is_restart() {
            self.restart(now, sim);
        }
        Some(step)
    }
}
