use std::path::Path;

use chrono::NaiveDate;
use lab_charts::chart::OutputDir;
use lab_charts::config::{ImageKind, Settings};
use lab_charts::data::transform::column_means;
use lab_charts::data::{load_table, LoadOptions, Table};
use lab_charts::pipeline::{energy, voltage};
use lab_charts::sample::write_lab_datasets;

fn settings(root: &Path, lab: &str, image_format: ImageKind) -> Settings {
    Settings {
        data_dir: root.join("data"),
        images_dir: root.join(lab),
        image_format,
        ..Settings::default()
    }
}

fn assert_figure(out: &OutputDir, name: &str, size: (u32, u32)) {
    let path = out.figure_path(name);
    assert!(path.is_file(), "{} was not written", path.display());
    let decoded = image::open(&path).unwrap().to_rgb8();
    assert_eq!(
        decoded.dimensions(),
        size,
        "{} has the wrong size",
        path.display()
    );
}

#[test]
fn voltage_pipeline_writes_three_figures() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path(), "lab1", ImageKind::Png);
    write_lab_datasets(&settings.data_dir, 42).unwrap();
    let out = OutputDir::create(&settings).unwrap();

    voltage::run(&settings, &out).unwrap();

    assert_figure(&out, "fig1", (800, 900));
    assert_figure(&out, "fig2", (640, 480));
    assert_figure(&out, "fig3", (640, 480));
}

#[test]
fn energy_pipeline_writes_six_figures() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path(), "lab2", ImageKind::Jpeg);
    write_lab_datasets(&settings.data_dir, 42).unwrap();
    let out = OutputDir::create(&settings).unwrap();

    energy::run(&settings, &out).unwrap();

    assert_figure(&out, "fig1", (640, 480));
    assert_figure(&out, "fig2", (640, 480));
    assert_figure(&out, "fig3", (640, 480));
    assert_figure(&out, "fig4", (750, 1000));
    assert_figure(&out, "fig5", (1800, 600));
    assert_figure(&out, "fig6", (800, 600));
}

#[test]
fn figures_chain_their_tables() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path(), "images", ImageKind::Png);
    write_lab_datasets(&settings.data_dir, 7).unwrap();
    let out = OutputDir::create(&settings).unwrap();

    let voltage_data = load_table(&settings.data_file(voltage::DATA_FILE), LoadOptions::sheet(0)).unwrap();
    let measured = voltage::individual_measures(&voltage_data, 5.0, &out, false).unwrap();
    assert_eq!(measured, voltage_data);
    let deviation = voltage::deviation_ref_5v(&measured, 5.0, &out, false).unwrap();
    let shares = voltage::stacked_deviation_ref_5v(&deviation, 5.0, &out, false).unwrap();
    assert_eq!(shares.index(), voltage_data.index());

    let lab2 = settings.data_file(energy::DATA_FILE);
    let rain_price = load_table(&lab2, LoadOptions::sheet(0).with_dates()).unwrap();
    let boundary = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();

    let rain = energy::valencian_rainfall(&rain_price, &out, false).unwrap();
    let price = energy::energy_price(&rain_price, &out, false).unwrap();
    let trends = energy::rainfall_energy_price_trends(&rain_price, boundary, &out, false).unwrap();
    assert_eq!(trends, rain_price);

    let by_year = energy::rainfall_energy_price_by_year(&rain_price, boundary, &out, false).unwrap();
    assert_eq!(by_year, Table::from_columns(&[rain, price]).unwrap());
    assert_eq!(by_year, rain_price);

    let technologies = load_table(&lab2, LoadOptions::sheet(1).with_dates()).unwrap();
    let coverage = energy::energy_demand_coverage_area(&technologies, boundary, &out, false).unwrap();
    assert_eq!(coverage, technologies);
    let means = energy::energy_demand_coverage_pie(&coverage, &out, false).unwrap();
    assert_eq!(means, column_means(&technologies));

    // Nothing is written when saving is off.
    assert!(!out.figure_path("fig1").exists());
}
