use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::event;

use crate::tui::event::TuiEvent;

/// Rendering trigger mode.
#[derive(Debug, Clone, Copy, Default)]
pub enum RenderMode {
    /// Render at fixed intervals.
    Interval(Duration),
    /// Render after state changes (tick or crossterm event).
    #[default]
    OnDirty,
}

impl RenderMode {
    fn as_interval(self) -> Option<Duration> {
        match self {
            RenderMode::Interval(interval) => Some(interval),
            RenderMode::OnDirty => None,
        }
    }
}

/// Ticks run back to back before the loop renders or reads input.
const MAX_TICKS_IN_ROW: u32 = 4;

/// What the loop does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Tick,
    Render,
    /// Wait for input, up to the timeout if one is given.
    Poll(Option<Duration>),
}

/// Event loop state management.
///
/// Tick timing comes from the caller on every [`next`](Self::next) call;
/// render timing is owned by the loop.
#[derive(Debug)]
pub(super) struct EventLoop {
    epoch: Instant,
    render_mode: RenderMode,
    last_render: Duration,
    dirty: bool,
    ticks_in_row: u32,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    pub(super) fn new() -> Self {
        Self {
            epoch: Instant::now(),
            render_mode: RenderMode::default(),
            last_render: Duration::ZERO,
            dirty: true, // Initial render is required on startup
            ticks_in_row: 0,
        }
    }

    pub(super) fn set_render_mode(&mut self, render_mode: RenderMode) {
        self.render_mode = render_mode;
    }

    /// Time elapsed since the loop was created.
    pub(super) fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Returns the next event.
    ///
    /// `time_until_tick` maps the current time to the wait before the next
    /// tick, or `None` when no tick is scheduled. Due ticks go first, but at
    /// most [`MAX_TICKS_IN_ROW`] of them before a due render and an input
    /// check, so a backlog of frames never freezes the screen or the keys.
    pub(super) fn next<F>(&mut self, time_until_tick: F) -> io::Result<TuiEvent>
    where
        F: Fn(Duration) -> Option<Duration>,
    {
        loop {
            let now = self.now();
            match self.step(now, time_until_tick(now)) {
                Step::Tick => return Ok(TuiEvent::Tick(now)),
                Step::Render => return Ok(TuiEvent::Render),
                Step::Poll(timeout) => {
                    if let Some(timeout) = timeout
                        && !event::poll(timeout)?
                    {
                        continue;
                    }
                    self.dirty = true;
                    return Ok(event::read()?.into());
                }
            }
        }
    }

    fn step(&mut self, now: Duration, until_tick: Option<Duration>) -> Step {
        let tick_due = until_tick.is_some_and(|wait| wait.is_zero());
        if tick_due && self.ticks_in_row < MAX_TICKS_IN_ROW {
            self.ticks_in_row += 1;
            self.dirty = true;
            return Step::Tick;
        }

        let do_render = match self.render_mode {
            RenderMode::Interval(interval) => now.saturating_sub(self.last_render) >= interval,
            RenderMode::OnDirty => self.dirty,
        };
        if do_render {
            self.last_render = now;
            self.dirty = false;
            return Step::Render;
        }

        self.ticks_in_row = 0;
        if tick_due {
            return Step::Poll(Some(Duration::ZERO));
        }
        let until_render = self
            .render_mode
            .as_interval()
            .map(|interval| (self.last_render + interval).saturating_sub(now));
        Step::Poll([until_tick, until_render].into_iter().flatten().min())
    }
}
