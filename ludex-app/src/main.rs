mod app;
mod config;
mod cues;

use std::path::Path;

use app::App;
use config::StudyConfig;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => StudyConfig::from_file(Path::new(&path))?,
        None => StudyConfig::default(),
    };

    App::new(config).run()
}
