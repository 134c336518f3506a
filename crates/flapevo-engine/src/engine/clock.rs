use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum ClockState {
    Stopped,
    Running,
}

/// Timing of one simulation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStep {
    /// Zero-based frame number since the clock started.
    pub index: u64,
    /// Time since the clock started, excluding paused time.
    pub total: Duration,
    /// Time since the previous frame was consumed.
    pub elapsed: Duration,
}

/// Result of polling a running clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub since_last_frame: Duration,
    /// Present when at least one frame interval has accumulated.
    pub frame: Option<FrameStep>,
}

/// Fixed-interval frame clock.
///
/// The clock does not read the system time; hosts pass the current time
/// (any monotonic `Duration`) to every call. Each due frame consumes exactly
/// one interval and the remainder carries over, so the frame count tracks
/// wall-clock time without drift.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use flapevo_engine::Clock;
///
/// let mut clock = Clock::new(Duration::from_millis(10));
/// clock.start(Duration::ZERO);
///
/// assert!(clock.poll(Duration::from_millis(9)).unwrap().frame.is_none());
/// let frame = clock.poll(Duration::from_millis(14)).unwrap().frame.unwrap();
/// assert_eq!(frame.index, 0);
/// // 4ms carried over: the next frame is due at 20ms, not 24ms.
/// assert!(clock.poll(Duration::from_millis(20)).unwrap().frame.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    interval: Duration,
    state: ClockState,
    start_time: Duration,
    last_time: Duration,
    paused_at: Option<Duration>,
    frames: u64,
}

impl Clock {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: ClockState::Stopped,
            start_time: Duration::ZERO,
            last_time: Duration::ZERO,
            paused_at: None,
            frames: 0,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn state(&self) -> ClockState {
        self.state
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Enters `Running` with all timers reset to `now`.
    pub fn start(&mut self, now: Duration) {
        self.state = ClockState::Running;
        self.start_time = now;
        self.last_time = now;
        self.paused_at = None;
        self.frames = 0;
    }

    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
        self.paused_at = None;
    }

    /// Suspends frame production. Has no effect unless running.
    pub fn pause(&mut self, now: Duration) {
        if self.state.is_running() && self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    /// Resumes frame production, shifting the timers past the paused span.
    pub fn resume(&mut self, now: Duration) {
        if let Some(paused_at) = self.paused_at.take() {
            let paused_for = now.saturating_sub(paused_at);
            self.start_time += paused_for;
            self.last_time += paused_for;
        }
    }

    /// Returns the time until the next frame is due, or `None` if no frame
    /// will be produced without a state change.
    #[must_use]
    pub fn time_until_next_frame(&self, now: Duration) -> Option<Duration> {
        if !self.state.is_running() || self.is_paused() {
            return None;
        }
        Some((self.last_time + self.interval).saturating_sub(now))
    }

    /// Polls the clock. Returns `None` while stopped or paused.
    pub fn poll(&mut self, now: Duration) -> Option<ClockTick> {
        if !self.state.is_running() || self.is_paused() {
            return None;
        }

        let elapsed = now.saturating_sub(self.last_time);
        if elapsed < self.interval {
            return Some(ClockTick {
                since_last_frame: elapsed,
                frame: None,
            });
        }

        self.last_time += self.interval;
        let frame = FrameStep {
            index: self.frames,
            total: now.saturating_sub(self.start_time),
            elapsed,
        };
        self.frames += 1;
        Some(ClockTick {
            since_last_frame: elapsed,
            frame: Some(frame),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_stopped_clock_produces_nothing() {
        let mut clock = Clock::new(10 * MS);
        assert!(clock.poll(100 * MS).is_none());
        assert_eq!(clock.time_until_next_frame(100 * MS), None);
    }

    #[test]
    fn test_remainder_carries_over() {
        let mut clock = Clock::new(10 * MS);
        clock.start(Duration::ZERO);

        let frame = clock.poll(25 * MS).unwrap().frame.unwrap();
        assert_eq!(frame.elapsed, 25 * MS);
        assert_eq!(frame.total, 25 * MS);

        // One interval consumed; 15ms remain, so another frame is due at once.
        let frame = clock.poll(25 * MS).unwrap().frame.unwrap();
        assert_eq!(frame.index, 1);
        assert_eq!(frame.elapsed, 15 * MS);

        let tick = clock.poll(25 * MS).unwrap();
        assert_eq!(tick.frame, None);
        assert_eq!(tick.since_last_frame, 5 * MS);
        assert_eq!(clock.time_until_next_frame(25 * MS), Some(5 * MS));
    }

    #[test]
    fn test_pause_excludes_paused_time() {
        let mut clock = Clock::new(10 * MS);
        clock.start(Duration::ZERO);
        clock.pause(5 * MS);
        assert!(clock.poll(50 * MS).is_none());

        clock.resume(100 * MS);
        assert!(clock.poll(104 * MS).unwrap().frame.is_none());
        let frame = clock.poll(105 * MS).unwrap().frame.unwrap();
        assert_eq!(frame.total, 10 * MS);
    }

    #[test]
    fn test_restart_resets_frames() {
        let mut clock = Clock::new(10 * MS);
        clock.start(Duration::ZERO);
        clock.poll(10 * MS);
        clock.poll(20 * MS);
        clock.stop();
        assert!(clock.state().is_stopped());

        clock.start(30 * MS);
        let frame = clock.poll(40 * MS).unwrap().frame.unwrap();
        assert_eq!(frame.index, 0);
        assert_eq!(frame.total, 10 * MS);
    }
}
