use std::time::Duration;

use crossterm::event::Event;
use ratatui::Frame;

use crate::tui::Runtime;

/// Trait for TUI applications.
///
/// Applications executed by `Runtime::run()` must implement this trait. Every
/// `now` is the time elapsed since the runtime started.
pub trait App {
    /// Initializes the application.
    ///
    /// Called at the start of `Runtime::run()`. Use this to configure the render mode.
    fn init(&mut self, runtime: &mut Runtime, now: Duration);

    /// Returns whether the application should exit.
    fn should_exit(&self) -> bool;

    /// Returns how long until the application wants [`update`](Self::update),
    /// or `None` if it is idle.
    fn time_until_update(&self, now: Duration) -> Option<Duration>;

    /// Handles terminal events (key input, mouse, resize, etc.).
    fn handle_event(&mut self, runtime: &mut Runtime, event: &Event, now: Duration);

    /// Draws the screen (called on each `Event::Render`).
    fn draw(&self, frame: &mut Frame);

    /// Updates application state (called when `time_until_update` reaches zero).
    fn update(&mut self, runtime: &mut Runtime, now: Duration);
}
