use ratatui::{layout::Rect, widgets::Block};

pub use self::{course_display::*, stats_display::*};

mod course_display;
mod stats_display;

mod color {
    use ratatui::style::Color;

    pub const SKY: Color = Color::Rgb(24, 28, 48);
    pub const YELLOW: Color = Color::Rgb(255, 220, 0);
    pub const GREEN: Color = Color::Rgb(40, 200, 70);
    pub const GRAY: Color = Color::Rgb(127, 127, 127);
    pub const BLACK: Color = Color::Rgb(0, 0, 0);
    pub const WHITE: Color = Color::Rgb(255, 255, 255);
}

pub mod style {
    use ratatui::style::{Color, Style};

    use crate::ui::widgets::color;

    const fn fg_bg(fg: Color, bg: Color) -> Style {
        Style::new().fg(fg).bg(bg)
    }

    pub const DEFAULT: Style = fg_bg(color::WHITE, color::BLACK);
    pub const HELP: Style = Style::new().fg(color::GRAY);
    pub const NOTICE: Style = Style::new().fg(color::YELLOW);
}

fn block_vertical_margin(block: Option<&Block>) -> u16 {
    let dummy_rect = Rect::new(0, 0, 100, 100);
    let inner_rect = block.map_or(dummy_rect, |block| block.inner(dummy_rect));
    dummy_rect.height - inner_rect.height
}

fn block_horizontal_margin(block: Option<&Block>) -> u16 {
    let dummy_rect = Rect::new(0, 0, 100, 100);
    let inner_rect = block.map_or(dummy_rect, |block| block.inner(dummy_rect));
    dummy_rect.width - inner_rect.width
}
