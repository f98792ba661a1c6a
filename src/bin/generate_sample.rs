use std::path::Path;

use anyhow::Result;
use lab_charts::config::{Settings, SETTINGS_FILE};
use lab_charts::sample::write_lab_datasets;

fn main() -> Result<()> {
    env_logger::init();

    let settings = Settings::load(Path::new(SETTINGS_FILE))?;
    write_lab_datasets(&settings.data_dir, 42)?;
    println!(
        "Wrote lab1_data.xlsx and lab2_data.xlsx to {}",
        settings.data_dir.display()
    );
    Ok(())
}
