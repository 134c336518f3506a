use std::time::Duration;

use crossterm::event::Event as CrosstermEvent;

/// Events processed by TUI applications.
#[derive(Debug, Clone, derive_more::IsVariant)]
pub(super) enum TuiEvent {
    /// The application asked to be updated at this time.
    Tick(Duration),
    /// Screen render timing.
    Render,
    /// Terminal events such as key input, mouse, and resize.
    Crossterm(CrosstermEvent),
}

impl From<CrosstermEvent> for TuiEvent {
    fn from(event: CrosstermEvent) -> Self {
        Self::Crossterm(event)
    }
}
