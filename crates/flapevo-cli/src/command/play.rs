use std::path::PathBuf;

use flapevo_engine::CourseConfig;
use flapevo_training::TrainingController;
use rand_pcg::Pcg32;

use crate::{
    command::session_app::{Launch, SessionApp},
    tui::Runtime,
    util,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AutoPlayArg {
    /// Path to the saved policy file (JSON format)
    #[arg(long)]
    model: PathBuf,
}

pub(crate) fn run_auto(arg: &AutoPlayArg, config: CourseConfig, rng: Pcg32) -> anyhow::Result<()> {
    let AutoPlayArg { model } = arg;

    // An unreadable file is reported inside the UI instead of aborting.
    let parameters = match util::read_saved_policy_file(model) {
        Ok(saved) => {
            log::info!(
                "loaded policy {:?} (generation {}, fitness {:.1})",
                saved.name,
                saved.generation,
                saved.fitness
            );
            Some(saved.parameters)
        }
        Err(err) => {
            log::warn!("{err:#}");
            None
        }
    };

    let controller = TrainingController::new(config, rng);
    let mut app = SessionApp::new(controller, Launch::Play(parameters));
    Runtime::new().run(&mut app)?;
    Ok(())
}

pub(crate) fn run_manual(config: CourseConfig, rng: Pcg32) -> anyhow::Result<()> {
    let controller = TrainingController::new(config, rng);
    let mut app = SessionApp::new(controller, Launch::Manual);
    Runtime::new().run(&mut app)?;
    Ok(())
}
