use std::time::Duration;

use crate::{FrameStep, Keyed, ObjectId, ObjectKind};

/// Routing key of a [`GameEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    Start,
    UpdatePhysics,
    Update,
    Draw,
    Destroy,
    Restart,
    Stop,
}

/// Lifecycle events published by the [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Start,
    /// Published on every poll while running, whether or not a frame is due.
    UpdatePhysics {
        since_last_frame: Duration,
    },
    /// Published at the start of a frame, before any object updates.
    Update(FrameStep),
    /// Published after all objects updated, before they draw.
    Draw(FrameStep),
    Destroy {
        id: ObjectId,
        kind: ObjectKind,
    },
    Restart,
    Stop,
}

impl Keyed for GameEvent {
    type Key = EventKey;

    fn key(&self) -> EventKey {
        match self {
            GameEvent::Start => EventKey::Start,
            GameEvent::UpdatePhysics { .. } => EventKey::UpdatePhysics,
            GameEvent::Update(_) => EventKey::Update,
            GameEvent::Draw(_) => EventKey::Draw,
            GameEvent::Destroy { .. } => EventKey::Destroy,
            GameEvent::Restart => EventKey::Restart,
            GameEvent::Stop => EventKey::Stop,
        }
    }
}
