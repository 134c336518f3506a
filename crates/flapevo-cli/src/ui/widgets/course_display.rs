use flapevo_engine::{CourseConfig, DisplayList, Fill, Rect as CourseRect};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        Block, Widget,
        canvas::{Canvas, Painter, Shape},
    },
};

use crate::ui::widgets::color;

/// Draws the rectangles recorded in the last simulation frame.
///
/// Course coordinates grow downwards while the canvas grows upwards, so every
/// rectangle is flipped on the way in.
#[derive(Debug)]
pub struct CourseDisplay<'a> {
    display: &'a DisplayList,
    width: f32,
    height: f32,
    block: Option<Block<'a>>,
}

impl<'a> CourseDisplay<'a> {
    pub fn new(display: &'a DisplayList, config: &CourseConfig) -> Self {
        Self {
            display,
            width: config.width,
            height: config.height,
            block: None,
        }
    }

    pub fn block(self, block: Block<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }
}

fn fill_color(fill: Fill) -> Color {
    match fill {
        Fill::Agent => color::YELLOW,
        Fill::Obstacle => color::GREEN,
    }
}

impl Widget for CourseDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Self {
            display,
            width,
            height,
            block,
        } = self;

        let canvas = Canvas::default()
            .marker(Marker::HalfBlock)
            .background_color(color::SKY)
            .x_bounds([0.0, f64::from(width)])
            .y_bounds([0.0, f64::from(height)])
            .paint(|ctx| {
                for (rect, fill) in display.items() {
                    ctx.draw(&FilledRect {
                        rect: *rect,
                        width,
                        height,
                        color: fill_color(*fill),
                    });
                }
            });
        match block {
            Some(block) => canvas.block(block).render(area, buf),
            None => canvas.render(area, buf),
        }
    }
}

/// Solid rectangle in course coordinates, clipped to the course.
#[derive(Debug, Clone, Copy)]
struct FilledRect {
    rect: CourseRect,
    width: f32,
    height: f32,
    color: Color,
}

impl FilledRect {
    /// Returns `(left, top, right, bottom)` in canvas coordinates, or `None`
    /// if nothing of the rectangle is on the course.
    fn clipped(&self) -> Option<(f64, f64, f64, f64)> {
        let left = self.rect.x.max(0.0);
        let right = self.rect.right().min(self.width);
        let top = self.rect.y.max(0.0);
        let bottom = self.rect.bottom().min(self.height);
        if left >= right || top >= bottom {
            return None;
        }
        Some((
            f64::from(left),
            f64::from(self.height - top),
            f64::from(right),
            f64::from(self.height - bottom),
        ))
    }
}

impl Shape for FilledRect {
    fn draw(&self, painter: &mut Painter) {
        let Some((left, top, right, bottom)) = self.clipped() else {
            return;
        };
        let (Some((col0, row0)), Some((col1, row1))) =
            (painter.get_point(left, top), painter.get_point(right, bottom))
        else {
            return;
        };
        for row in row0..=row1 {
            for col in col0..=col1 {
                painter.paint(col, row, self.color);
            }
        }
    }
}
