//! Voltage stability of five nominal 5 V power sources (lab 1).

use anyhow::{Context, Result};
use log::info;
use plotters::prelude::*;

use crate::chart::style::{self, arange, multiples, percent_label, tick_label};
use crate::chart::{series, Figure, Frame, OutputDir};
use crate::config::Settings;
use crate::data::transform::{deviation_from, normalize_rows_percent};
use crate::data::{load_table, LoadOptions, Table};

pub const DATA_FILE: &str = "lab1_data.xlsx";

/// Load the measurements and render figures 1-3.
pub fn run(settings: &Settings, out: &OutputDir) -> Result<()> {
    let path = settings.data_file(DATA_FILE);
    let voltage = load_table(&path, LoadOptions::sheet(0))
        .with_context(|| format!("loading {}", path.display()))?;

    let voltage = individual_measures(&voltage, settings.reference_voltage, out, true)?;
    let deviation = deviation_ref_5v(&voltage, settings.reference_voltage, out, true)?;
    stacked_deviation_ref_5v(&deviation, settings.reference_voltage, out, true)?;
    info!("voltage charts written to {}", out.path().display());
    Ok(())
}

fn reference_caption(what: &str, reference: f64) -> String {
    format!("{what} from reference value ({reference}V)")
}

/// Figure 1: one line subplot per source around the reference voltage.
pub fn individual_measures(
    voltage: &Table,
    reference: f64,
    out: &OutputDir,
    save: bool,
) -> Result<Table> {
    let mut figure = Figure::new("fig1", (800, 900));
    {
        let root = figure.root();
        root.fill(&WHITE)?;
        let root = root.titled("Individual measures from power sources", ("sans-serif", 22))?;

        let frame = Frame::over_rows(voltage.len(), 4.2..5.8)
            .y_ticks(multiples(4.2, 5.8, 0.4))
            .y_minor(multiples(4.2, 5.8, 0.2));
        let colors = style::cycle(voltage.width());
        let panels = root.split_evenly((voltage.width().max(1), 1));

        for ((panel, source), color) in panels.iter().zip(voltage.columns()).zip(colors) {
            let mut builder = ChartBuilder::on(panel);
            builder.margin(6).y_label_area_size(40).x_label_area_size(0);
            let mut plane = frame.build(&mut builder)?;

            plane
                .configure_mesh()
                .disable_x_mesh()
                .disable_x_axis()
                .bold_line_style(style::light_gray())
                .light_line_style(style::light_gray())
                .axis_style(style::light_gray())
                .y_label_formatter(&|v| tick_label(*v))
                .draw()?;

            series::hline(&mut plane, &frame, reference, BLACK.stroke_width(2))?;
            series::line(&mut plane, &source.values, color.stroke_width(1), None)?;
        }
        root.present()?;
    }

    if save {
        figure.save(out)?;
    }
    Ok(voltage.clone())
}

/// Figure 2: absolute deviation of every sample from the reference voltage.
pub fn deviation_ref_5v(
    voltage: &Table,
    reference: f64,
    out: &OutputDir,
    save: bool,
) -> Result<Table> {
    let deviation = deviation_from(voltage, reference);

    let mut figure = Figure::new("fig2", Figure::DEFAULT_SIZE);
    {
        let root = figure.root();
        root.fill(&WHITE)?;

        let frame = Frame::over_rows(deviation.len(), 0.0..0.8).y_ticks(arange(0.0, 1.0, 0.2));
        let mut builder = ChartBuilder::on(&root);
        builder
            .caption(
                reference_caption("Deviation", reference),
                ("sans-serif", 20),
            )
            .margin(10)
            .y_label_area_size(40)
            .x_label_area_size(0);
        let mut plane = frame.build(&mut builder)?;

        plane
            .configure_mesh()
            .disable_x_mesh()
            .disable_x_axis()
            .bold_line_style(style::light_gray())
            .y_label_formatter(&|v| tick_label(*v))
            .draw()?;

        let colors = style::cycle(deviation.width());
        for (source, color) in deviation.columns().iter().zip(colors) {
            series::line(
                &mut plane,
                &source.values,
                color.mix(0.6).stroke_width(1),
                Some(source.name.as_str()),
            )?;
        }

        plane
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(style::light_gray())
            .draw()?;
        root.present()?;
    }

    if save {
        figure.save(out)?;
    }
    Ok(deviation)
}

/// Figure 3: deviations stacked as shares of each sample's total deviation.
pub fn stacked_deviation_ref_5v(
    deviation: &Table,
    reference: f64,
    out: &OutputDir,
    save: bool,
) -> Result<Table> {
    let shares = normalize_rows_percent(deviation);

    let mut figure = Figure::new("fig3", Figure::DEFAULT_SIZE);
    {
        let root = figure.root();
        root.fill(&WHITE)?;

        let frame = Frame::over_rows(shares.len(), 0.0..100.0).y_ticks(multiples(0.0, 100.0, 20.0));
        let mut builder = ChartBuilder::on(&root);
        builder
            .caption(
                reference_caption("Stacked deviation", reference),
                ("sans-serif", 20),
            )
            .margin(10)
            .y_label_area_size(50)
            .x_label_area_size(0);
        let mut plane = frame.build(&mut builder)?;

        plane
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .disable_x_axis()
            .y_label_formatter(&|v| percent_label(*v))
            .draw()?;

        series::stacked_area(&mut plane, &shares, &style::cycle(shares.width()), 0.5)?;

        plane
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(style::light_gray())
            .draw()?;
        root.present()?;
    }

    if save {
        figure.save(out)?;
    }
    Ok(shares)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captions_name_the_configured_reference() {
        assert_eq!(
            reference_caption("Deviation", 5.0),
            "Deviation from reference value (5V)"
        );
        assert_eq!(
            reference_caption("Stacked deviation", 3.3),
            "Stacked deviation from reference value (3.3V)"
        );
    }
}
