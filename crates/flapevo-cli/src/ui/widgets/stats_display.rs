use std::{iter, time::Duration};

use flapevo_training::{PlayStats, TrainingStats};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{Block, BlockExt as _, Widget},
};

use crate::ui::widgets::style;

#[derive(Debug, Clone)]
enum Row {
    Empty,
    FullLabel(&'static str),
    LabelValue(&'static str, String),
}

/// Side panel listing the progress of the current session.
#[derive(Debug)]
pub struct StatsDisplay<'a> {
    rows: Vec<Row>,
    block: Option<Block<'a>>,
}

impl<'a> StatsDisplay<'a> {
    pub fn training(stats: &TrainingStats) -> Self {
        let mut rows = vec![
            Row::FullLabel("POPULATION"),
            Row::LabelValue("ALIVE:", format!("{}/{}", stats.alive, stats.total)),
            Row::LabelValue("GENERATION:", stats.generation.to_string()),
            Row::LabelValue("TIME:", format_duration(stats.generation_time)),
            Row::Empty,
            Row::FullLabel("BEST EVER"),
        ];
        match &stats.best {
            Some(best) => rows.extend([
                Row::LabelValue("SCORE:", best.score.to_string()),
                Row::LabelValue("FITNESS:", format!("{:.1}", best.fitness)),
                Row::LabelValue("GENERATION:", best.generation.to_string()),
                Row::LabelValue("WEIGHTS:", best.weight_count.to_string()),
            ]),
            None => rows.push(Row::LabelValue("", "-".to_owned())),
        }
        Self { rows, block: None }
    }

    pub fn play(stats: &PlayStats) -> Self {
        let rows = vec![
            Row::LabelValue("SCORE:", stats.score.to_string()),
            Row::LabelValue("BEST SCORE:", stats.best_score.to_string()),
            Row::LabelValue("ATTEMPT:", stats.attempts.to_string()),
        ];
        Self { rows, block: None }
    }

    pub fn idle() -> Self {
        Self {
            rows: vec![Row::FullLabel("IDLE")],
            block: None,
        }
    }

    pub fn block(self, block: Block<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        24 + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        u16::try_from(self.rows.len()).unwrap_or(u16::MAX)
            + super::block_vertical_margin(self.block.as_ref())
    }
}

fn format_duration(duration: Duration) -> String {
    format!(
        "{:0}:{:0>2}.{:0>2}",
        duration.as_secs() / 60,
        duration.as_secs() % 60,
        duration.subsec_millis() / 10
    )
}

impl Widget for StatsDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let style = style::DEFAULT;

        let rows_areas =
            Layout::vertical((0..self.rows.len()).map(|_| Constraint::Length(1))).split(area);

        for (row, area) in iter::zip(self.rows, rows_areas.iter().copied()) {
            match row {
                Row::Empty => {}
                Row::FullLabel(label) => {
                    Line::styled(label, style).left_aligned().render(area, buf);
                }
                Row::LabelValue(label, value) => {
                    let [label_area, value_area] = area.layout(&Layout::horizontal([
                        Constraint::Fill(1),
                        Constraint::Fill(1),
                    ]));
                    Line::styled(label, style)
                        .left_aligned()
                        .render(label_area, buf);
                    Line::styled(value, style)
                        .right_aligned()
                        .render(value_area, buf);
                }
            }
        }
    }
}
