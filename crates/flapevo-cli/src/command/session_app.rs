use std::{path::PathBuf, time::Duration};

use crossterm::event::{Event, KeyCode, KeyEventKind};
use flapevo_engine::{DisplayList, ParameterBlob};
use flapevo_training::{PlayStatus, Session, TrainingController, TrainingOptions};
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout},
    style::Color,
    text::{Line, Text},
    widgets::{Block, Padding},
};

use crate::{
    tui::{App, RenderMode, Runtime},
    ui::widgets::{CourseDisplay, StatsDisplay, style},
    util::{FileKind, Output},
};

const RENDER_INTERVAL: Duration = Duration::from_millis(33);

/// Session the app starts when the runtime comes up.
#[derive(Debug)]
pub enum Launch {
    Training(TrainingOptions),
    Play(Option<ParameterBlob>),
    Manual,
}

/// Where the `s` key writes the best policy.
#[derive(Debug, Clone)]
pub struct SaveTarget {
    pub path: PathBuf,
    pub name: String,
}

/// Terminal front end shared by training, policy play and manual play.
#[derive(Debug)]
pub struct SessionApp {
    controller: TrainingController,
    launch: Option<Launch>,
    save_target: Option<SaveTarget>,
    display: DisplayList,
    notice: Option<String>,
    is_exiting: bool,
}

impl SessionApp {
    pub fn new(controller: TrainingController, launch: Launch) -> Self {
        Self {
            controller,
            launch: Some(launch),
            save_target: None,
            display: DisplayList::new(),
            notice: None,
            is_exiting: false,
        }
    }

    pub fn save_target(self, save_target: SaveTarget) -> Self {
        Self {
            save_target: Some(save_target),
            ..self
        }
    }

    fn save_best_policy(&mut self) {
        let Some(target) = &self.save_target else {
            return;
        };
        let Some(saved) = self.controller.save_best_policy(&target.name) else {
            self.notice = Some("No generation has finished yet".to_owned());
            return;
        };
        let result = Output::open(target.path.clone())
            .and_then(|output| output.write_json(FileKind::SavedPolicy, &saved));
        self.notice = Some(match result {
            Ok(()) => {
                log::info!("saved best policy to {}", target.path.display());
                format!(
                    "Saved generation {} (fitness {:.1}) to {}",
                    saved.generation,
                    saved.fitness,
                    target.path.display()
                )
            }
            Err(err) => {
                log::warn!("failed to save best policy: {err:#}");
                format!("Save failed: {err:#}")
            }
        });
    }

    fn help_text(&self) -> &'static str {
        let paused = self.controller.engine().is_paused();
        match self.controller.session() {
            Session::Idle => "Controls: Q (Quit)",
            Session::Training(_) if paused => "Controls: P (Resume) | S (Save Best) | Q (Quit)",
            Session::Training(_) => "Controls: P (Pause) | S (Save Best) | Q (Quit)",
            Session::Playing(play) if play.pilot().is_manual() && !paused => {
                "Controls: Space (Flap) | P (Pause) | Q (Quit)"
            }
            Session::Playing(_) if paused => "Controls: P (Resume) | Q (Quit)",
            Session::Playing(_) => "Controls: P (Pause) | Q (Quit)",
        }
    }
}

impl App for SessionApp {
    fn init(&mut self, runtime: &mut Runtime, now: Duration) {
        runtime.set_render_mode(RenderMode::Interval(RENDER_INTERVAL));
        match self.launch.take() {
            Some(Launch::Training(options)) => self.controller.start_training(now, options),
            Some(Launch::Play(parameters)) => {
                if self.controller.start_play(now, parameters) == PlayStatus::Unavailable {
                    self.notice = Some("No trained policy available".to_owned());
                }
            }
            Some(Launch::Manual) => self.controller.start_manual(now),
            None => {}
        }
    }

    fn should_exit(&self) -> bool {
        self.is_exiting
    }

    fn time_until_update(&self, now: Duration) -> Option<Duration> {
        self.controller.time_until_next_frame(now)
    }

    fn handle_event(&mut self, _runtime: &mut Runtime, event: &Event, now: Duration) {
        let Some(key) = event.as_key_event() else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        let is_running = self.controller.engine().is_running();
        match key.code {
            KeyCode::Char(' ') | KeyCode::Up => self.controller.request_flap(),
            KeyCode::Char('p') if is_running => self.controller.toggle_pause(now),
            KeyCode::Char('s') => self.save_best_policy(),
            KeyCode::Char('q') | KeyCode::Esc => {
                self.controller.stop();
                self.is_exiting = true;
            }
            _ => {}
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let engine = self.controller.engine();
        let border_color = if !engine.is_running() {
            Color::DarkGray
        } else if engine.is_paused() {
            Color::Yellow
        } else {
            Color::White
        };

        let course = CourseDisplay::new(&self.display, engine.stage().config()).block(
            Block::bordered()
                .title(Line::from("COURSE").centered())
                .border_style(border_color),
        );
        let stats = match (self.controller.stats(), self.controller.play_stats()) {
            (Some(stats), _) => StatsDisplay::training(&stats),
            (None, Some(stats)) => StatsDisplay::play(&stats),
            (None, None) => StatsDisplay::idle(),
        }
        .block(
            Block::bordered()
                .title(Line::from("STATS").centered())
                .padding(Padding::horizontal(1))
                .border_style(border_color)
                .style(style::DEFAULT),
        );

        let [main_area, notice_area, help_area] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());
        let [course_area, stats_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(stats.width())])
                .spacing(1)
                .areas(main_area);
        let [stats_area] = Layout::vertical([Constraint::Length(stats.height())])
            .flex(Flex::Start)
            .areas(stats_area);

        frame.render_widget(course, course_area);
        frame.render_widget(stats, stats_area);
        if let Some(notice) = &self.notice {
            frame.render_widget(
                Text::from(notice.as_str()).style(style::NOTICE).centered(),
                notice_area,
            );
        }
        frame.render_widget(
            Text::from(self.help_text()).style(style::HELP).centered(),
            help_area,
        );
    }

    fn update(&mut self, _runtime: &mut Runtime, now: Duration) {
        self.controller.frame(now, &mut self.display);
    }
}
