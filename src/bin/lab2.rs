use std::path::Path;

use anyhow::Result;
use lab_charts::chart::OutputDir;
use lab_charts::config::{Settings, SETTINGS_FILE};
use lab_charts::pipeline::energy;

fn main() -> Result<()> {
    env_logger::init();

    let settings = Settings::load(Path::new(SETTINGS_FILE))?;
    let out = OutputDir::create(&settings)?;
    energy::run(&settings, &out)
}
