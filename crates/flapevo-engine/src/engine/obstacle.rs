use rand::Rng;

use crate::{CourseConfig, Fill, Rect, RenderSurface};

/// A pair of solid segments with a gap between them.
///
/// The upper segment runs from the top of the course to the gap, the lower one
/// from the gap to the bottom. Both always share the obstacle's x. The
/// obstacle never moves itself; the course tick moves it with [`set_x`].
///
/// [`set_x`]: Self::set_x
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    upper: Rect,
    lower: Rect,
}

impl Obstacle {
    /// Creates an obstacle at `x` with a random gap position.
    ///
    /// The gap top is drawn uniformly so that both segments are at least
    /// `min_segment_height` tall, then floored to a whole unit.
    pub fn random<R>(x: f32, config: &CourseConfig, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let min = config.min_segment_height;
        let max = f32::max(min, config.height - config.gap_height - min);
        let gap_top = rng.random_range(min..=max).floor().max(min);
        Self::with_gap_top(x, gap_top, config)
    }

    /// Creates an obstacle at `x` whose gap starts at `gap_top`.
    #[must_use]
    pub fn with_gap_top(x: f32, gap_top: f32, config: &CourseConfig) -> Self {
        let width = config.obstacle_width;
        let gap_bottom = gap_top + config.gap_height;
        Self {
            upper: Rect::new(x, 0.0, width, gap_top),
            lower: Rect::new(x, gap_bottom, width, config.height - gap_bottom),
        }
    }

    #[must_use]
    pub fn x(&self) -> f32 {
        self.upper.x
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.upper.width
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.upper.right()
    }

    /// Moves both segments to `x`.
    pub fn set_x(&mut self, x: f32) {
        self.upper.x = x;
        self.lower.x = x;
    }

    /// Y of the gap's upper edge (bottom of the upper segment).
    #[must_use]
    pub fn gap_top(&self) -> f32 {
        self.upper.bottom()
    }

    /// Y of the gap's lower edge (top of the lower segment).
    #[must_use]
    pub fn gap_bottom(&self) -> f32 {
        self.lower.y
    }

    #[must_use]
    pub fn segments(&self) -> [Rect; 2] {
        [self.upper, self.lower]
    }

    /// Bounding box of both segments and the gap.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.upper.x,
            self.upper.y,
            self.upper.width,
            self.lower.bottom() - self.upper.y,
        )
    }

    /// Returns `true` once the obstacle is fully past the left boundary.
    #[must_use]
    pub fn is_off_course(&self) -> bool {
        self.x() < -self.width()
    }

    pub fn draw(&self, surface: &mut dyn RenderSurface) {
        surface.fill_rect(self.upper, Fill::Obstacle);
        surface.fill_rect(self.lower, Fill::Obstacle);
    }
}
