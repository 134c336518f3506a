use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use flapevo_engine::CourseConfig;
use log::LevelFilter;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use self::{play::AutoPlayArg, train::TrainArg};
use crate::util;

mod play;
mod session_app;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(flatten)]
    course: CourseArgs,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, clap::Args)]
struct CourseArgs {
    /// Course configuration file (JSON); missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Seed for obstacle placement and policy initialization
    #[arg(long, global = true)]
    seed: Option<u64>,
}

impl CourseArgs {
    fn load_config(&self) -> anyhow::Result<CourseConfig> {
        let config = match &self.config {
            Some(path) => util::read_config_file(path)?,
            None => CourseConfig::default(),
        };
        config.validate().with_context(|| match &self.config {
            Some(path) => format!("Invalid course config: {}", path.display()),
            None => "Invalid default course config".to_owned(),
        })?;
        Ok(config)
    }

    fn rng(&self) -> Pcg32 {
        match self.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_rng(&mut rand::rng()),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve a population of agents
    Train(#[clap(flatten)] TrainArg),
    /// Watch a saved policy fly the course
    #[command(name = "play")]
    AutoPlay(#[clap(flatten)] AutoPlayArg),
    /// Fly the course with the keyboard
    #[command(name = "manual")]
    ManualPlay,
}

impl Mode {
    /// Terminal UIs own the screen, so only warnings get through by default.
    fn default_log_level(&self) -> LevelFilter {
        match self {
            Mode::Train(arg) if arg.is_headless() => LevelFilter::Info,
            Mode::Train(_) | Mode::AutoPlay(_) | Mode::ManualPlay => LevelFilter::Warn,
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    let mode = args.mode.unwrap_or(Mode::ManualPlay);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(mode.default_log_level().as_str()),
    )
    .init();

    let config = args.course.load_config()?;
    let rng = args.course.rng();
    match mode {
        Mode::Train(arg) => train::run(&arg, config, rng)?,
        Mode::AutoPlay(arg) => play::run_auto(&arg, config, rng)?,
        Mode::ManualPlay => play::run_manual(config, rng)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn load(json: &str) -> anyhow::Result<CourseConfig> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("course.json");
        fs::write(&path, json).unwrap();
        let args = CourseArgs {
            config: Some(path),
            seed: None,
        };
        args.load_config()
    }

    #[test]
    fn test_load_config_accepts_partial_file() {
        let config = load(r#"{ "course_speed": 6.0 }"#).unwrap();
        assert_eq!(config.course_speed, 6.0);
    }

    #[test]
    fn test_load_config_rejects_unusable_course() {
        for json in [
            r#"{ "frame_rate": 1e-320 }"#,
            r#"{ "frame_rate": 0.0 }"#,
            r#"{ "width": 0.0 }"#,
            r#"{ "height": 100.0 }"#,
        ] {
            let err = load(json).unwrap_err();
            assert!(format!("{err:#}").contains("Invalid course config"), "{err:#}");
        }
    }
}
