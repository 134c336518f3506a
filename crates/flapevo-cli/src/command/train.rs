use std::{path::PathBuf, time::Duration};

use chrono::Utc;
use flapevo_engine::{CourseConfig, NullSurface};
use flapevo_training::{TrainingController, TrainingOptions};
use rand_pcg::Pcg32;

use crate::{
    command::session_app::{Launch, SaveTarget, SessionApp},
    tui::Runtime,
    util::{FileKind, Output},
};

const DEFAULT_SAVE_DIR: &str = "./data/policies/";

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Number of agents per generation
    #[arg(long, default_value_t = TrainingOptions::default().population)]
    population: usize,
    /// Breed each agent from a single parent instead of two
    #[arg(long)]
    no_crossover: bool,
    /// Train without the terminal UI, as fast as possible
    #[arg(long)]
    headless: bool,
    /// Number of generations to run in headless mode
    #[arg(long, default_value_t = 50)]
    generations: u32,
    /// Stop headless training after this many frames even if the current
    /// generation is still alive
    #[arg(long)]
    max_frames: Option<u64>,
    /// Output file path for the best policy (headless: stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Name stored in the saved policy
    #[arg(long, default_value = "flapevo")]
    name: String,
}

impl TrainArg {
    pub(crate) fn is_headless(&self) -> bool {
        self.headless
    }

    fn options(&self) -> TrainingOptions {
        TrainingOptions {
            population: self.population,
            crossover: !self.no_crossover,
        }
    }
}

pub(crate) fn run(arg: &TrainArg, config: CourseConfig, rng: Pcg32) -> anyhow::Result<()> {
    anyhow::ensure!(arg.population > 0, "population must be at least 1");
    let controller = TrainingController::new(config, rng);
    if arg.headless {
        run_headless(arg, controller)
    } else {
        run_tui(arg, controller)
    }
}

fn run_tui(arg: &TrainArg, controller: TrainingController) -> anyhow::Result<()> {
    let path = arg.output.clone().unwrap_or_else(|| {
        PathBuf::from(DEFAULT_SAVE_DIR).join(format!(
            "{}-{}.json",
            arg.name,
            Utc::now().format("%Y%m%d-%H%M%S")
        ))
    });
    let mut app = SessionApp::new(controller, Launch::Training(arg.options())).save_target(
        SaveTarget {
            path,
            name: arg.name.clone(),
        },
    );
    Runtime::new().run(&mut app)?;
    Ok(())
}

/// Drives the trainer on a synthetic clock, one frame interval per step.
fn run_headless(arg: &TrainArg, mut controller: TrainingController) -> anyhow::Result<()> {
    let TrainArg {
        generations,
        max_frames,
        output,
        name,
        ..
    } = arg;
    let interval = controller.engine().stage().config().frame_interval();

    let mut now = Duration::ZERO;
    let mut frames = 0_u64;
    controller.start_training(now, arg.options());
    eprintln!(
        "Training {} generations of {} agents...",
        generations, arg.population
    );
    while controller
        .stats()
        .is_some_and(|stats| stats.generation < *generations)
    {
        if max_frames.is_some_and(|max| frames >= max) {
            log::warn!("frame limit reached after {frames} frames");
            break;
        }
        now += interval;
        if controller.frame(now, &mut NullSurface).is_some() {
            frames += 1;
        }
    }

    let stats = controller.stats();
    let Some(saved) = controller.save_best_policy(name) else {
        anyhow::bail!("no generation finished; nothing to save");
    };
    controller.stop();
    Output::save_json(FileKind::SavedPolicy, &saved, output.clone())?;

    eprintln!();
    eprintln!("Policy saved successfully");
    if let Some(path) = output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Name: {}", saved.name);
    eprintln!("  Trained at: {}", saved.trained_at);
    if let Some(stats) = stats {
        eprintln!("  Generations: {}", stats.generation);
    }
    eprintln!("  Best generation: {}", saved.generation);
    eprintln!("  Best score: {}", saved.score);
    eprintln!("  Best fitness: {:.3}", saved.fitness);
    eprintln!(
        "  Parameters: {} groups, {} values",
        saved.parameters.group_count(),
        saved.parameters.scalar_count()
    );

    Ok(())
}
