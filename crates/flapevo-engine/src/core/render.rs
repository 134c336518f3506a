use crate::Rect;

/// What a filled rectangle represents, so hosts can pick their own styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::IsVariant)]
pub enum Fill {
    Agent,
    Obstacle,
}

/// Drawing target for scene objects.
pub trait RenderSurface {
    /// Erases everything drawn since the last clear.
    fn clear(&mut self);

    fn fill_rect(&mut self, rect: Rect, fill: Fill);
}

/// A [`RenderSurface`] that records the rectangles drawn in the last frame.
///
/// Terminal hosts render the recorded list after each frame, and tests inspect it.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    items: Vec<(Rect, Fill)>,
}

impl DisplayList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[(Rect, Fill)] {
        &self.items
    }

    pub fn iter_fill(&self, fill: Fill) -> impl Iterator<Item = &Rect> + '_ {
        self.items
            .iter()
            .filter(move |(_, f)| *f == fill)
            .map(|(rect, _)| rect)
    }
}

impl RenderSurface for DisplayList {
    fn clear(&mut self) {
        self.items.clear();
    }

    fn fill_rect(&mut self, rect: Rect, fill: Fill) {
        self.items.push((rect, fill));
    }
}

/// A surface that discards everything, for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn clear(&mut self) {}

    fn fill_rect(&mut self, _rect: Rect, _fill: Fill) {}
}
