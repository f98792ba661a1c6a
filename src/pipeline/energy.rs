//! Rainfall in the Valencian Community, energy price, and the coverage of
//! energy demand by technology (lab 2).

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, info};
use plotters::prelude::*;
use plotters::style::FontTransform;

use crate::chart::style::{self, arange, month_year_label, multiples, thousands_label, tick_label};
use crate::chart::{pie, series, Figure, Frame, OutputDir};
use crate::config::Settings;
use crate::data::transform::{column_means, concat_columns, concat_rows, split_at};
use crate::data::{load_table, LoadOptions, RowKey, Series, Table};

pub const DATA_FILE: &str = "lab2_data.xlsx";

/// Load both sheets and render figures 1-6.
pub fn run(settings: &Settings, out: &OutputDir) -> Result<()> {
    let path = settings.data_file(DATA_FILE);
    let boundary = settings.year_boundary;

    let rain_price = load_table(&path, LoadOptions::sheet(0).with_dates())
        .with_context(|| format!("loading {} (sheet 0)", path.display()))?;
    valencian_rainfall(&rain_price, out, true)?;
    energy_price(&rain_price, out, true)?;
    rainfall_energy_price_trends(&rain_price, boundary, out, true)?;
    rainfall_energy_price_by_year(&rain_price, boundary, out, true)?;

    let technologies = load_table(&path, LoadOptions::sheet(1).with_dates())
        .with_context(|| format!("loading {} (sheet 1)", path.display()))?;
    energy_demand_coverage_area(&technologies, boundary, out, true)?;
    energy_demand_coverage_pie(&technologies, out, true)?;

    info!("rainfall / energy charts written to {}", out.path().display());
    Ok(())
}

fn rainfall(table: &Table) -> Result<Series> {
    table.column(0).context("rainfall column (0) missing")
}

fn price(table: &Table) -> Result<Series> {
    table.column(1).context("energy price column (1) missing")
}

/// Month labels for a date index; other keys print as-is.
fn row_labels(index: &[RowKey]) -> Vec<String> {
    index
        .iter()
        .map(|key| match key.as_date() {
            Some(d) => month_year_label(d),
            None => key.to_string(),
        })
        .collect()
}

/// Every `step`-th row position, so long date axes stay readable.
fn sparse_ticks(n: usize, max_ticks: usize) -> Vec<f64> {
    let step = n.div_ceil(max_ticks.max(1)).max(1);
    (0..n).step_by(step).map(|i| i as f64).collect()
}

// ---------------------------------------------------------------------------
// Figures 1 and 2: monthly bars
// ---------------------------------------------------------------------------

fn monthly_bars(
    name: &str,
    values: &Series,
    color: RGBColor,
    y_max: f64,
    y_step: f64,
    out: &OutputDir,
    save: bool,
) -> Result<()> {
    let labels = row_labels(&values.index);
    let mut figure = Figure::new(name, Figure::DEFAULT_SIZE);
    {
        let root = figure.root();
        root.fill(&WHITE)?;

        let frame = Frame::over_bars(values.len(), 0.0..y_max).y_ticks(multiples(0.0, y_max, y_step));
        let mut builder = ChartBuilder::on(&root);
        builder
            .caption(&values.name, ("sans-serif", 20))
            .margin(10)
            .y_label_area_size(40)
            .x_label_area_size(70);
        let mut plane = frame.build(&mut builder)?;

        let label_at = |x: &f64| {
            labels
                .get(x.round().max(0.0) as usize)
                .cloned()
                .unwrap_or_default()
        };
        plane
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(style::light_gray())
            .axis_style(style::light_gray())
            .x_labels(values.len())
            .x_label_formatter(&label_at)
            .x_label_style(
                ("sans-serif", 11)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .y_label_formatter(&|v| tick_label(*v))
            .draw()?;

        series::bars(&mut plane, &values.values, color)?;
        root.present()?;
    }

    if save {
        figure.save(out)?;
    }
    Ok(())
}

/// Figure 1: monthly rainfall bars.
pub fn valencian_rainfall(table: &Table, out: &OutputDir, save: bool) -> Result<Series> {
    let rain = rainfall(table)?;
    monthly_bars("fig1", &rain, style::TAB_BLUE, 180.0, 20.0, out, save)?;
    Ok(rain)
}

/// Figure 2: monthly energy price bars.
pub fn energy_price(table: &Table, out: &OutputDir, save: bool) -> Result<Series> {
    let price = price(table)?;
    monthly_bars("fig2", &price, style::TAB_GREEN, 100.0, 10.0, out, save)?;
    Ok(price)
}

// ---------------------------------------------------------------------------
// Figure 3: trends
// ---------------------------------------------------------------------------

/// Figure 3: rainfall and price as lines, with the year boundary marked.
pub fn rainfall_energy_price_trends(
    table: &Table,
    boundary: NaiveDate,
    out: &OutputDir,
    save: bool,
) -> Result<Table> {
    let labels = row_labels(table.index());
    let mut figure = Figure::new("fig3", Figure::DEFAULT_SIZE);
    {
        let root = figure.root();
        root.fill(&WHITE)?;

        let frame = Frame::over_rows(table.len(), 0.0..200.0)
            .x_ticks(sparse_ticks(table.len(), 8))
            .y_ticks(multiples(0.0, 200.0, 20.0));
        let mut builder = ChartBuilder::on(&root);
        builder
            .caption("Trends in rainfall and energy price", ("sans-serif", 20))
            .margin(10)
            .y_label_area_size(10)
            .x_label_area_size(30);
        let mut plane = frame.build(&mut builder)?;

        let label_at = |x: &f64| labels.get(*x as usize).cloned().unwrap_or_default();
        plane
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(style::light_gray())
            .axis_style(WHITE)
            .x_label_formatter(&label_at)
            .y_label_formatter(&|_| String::new())
            .draw()?;

        for (column, color) in table.columns().iter().zip([style::TAB_BLUE, style::TAB_GREEN]) {
            series::line(
                &mut plane,
                &column.values,
                color.stroke_width(2),
                Some(column.name.as_str()),
            )?;
        }
        if let Some(x) = series::boundary_position(table.index(), &RowKey::Date(boundary)) {
            series::vline(&mut plane, &frame, x, style::dark_gray().stroke_width(2))?;
        }

        plane
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(style::light_gray())
            .draw()?;
        root.present()?;
    }

    if save {
        figure.save(out)?;
    }
    Ok(table.clone())
}

// ---------------------------------------------------------------------------
// Figure 4: per-year grid
// ---------------------------------------------------------------------------

struct Panel<'s> {
    part: &'s Series,
    color: RGBColor,
    y_max: f64,
    y_step: f64,
    /// Year caption, drawn on the top row only.
    caption: bool,
    /// Axis description, drawn on the left column only.
    y_desc: Option<&'s str>,
}

/// Figure 4: rainfall and price, split at the year boundary into a 2x2 grid.
///
/// Returns the parts joined back together, which equals the two source
/// columns.
pub fn rainfall_energy_price_by_year(
    table: &Table,
    boundary: NaiveDate,
    out: &OutputDir,
    save: bool,
) -> Result<Table> {
    let boundary_key = RowKey::Date(boundary);
    let rain = rainfall(table)?;
    let price = price(table)?;
    let (rain_before, rain_after) = split_at(&rain, &boundary_key);
    let (price_before, price_after) = split_at(&price, &boundary_key);
    debug!(
        "split at {boundary}: {} + {} rows",
        rain_before.len(),
        rain_after.len()
    );

    let layout = [
        Panel {
            part: &rain_before,
            color: style::TAB_BLUE,
            y_max: 180.0,
            y_step: 50.0,
            caption: true,
            y_desc: Some(rain.name.as_str()),
        },
        Panel {
            part: &rain_after,
            color: style::TAB_ORANGE,
            y_max: 180.0,
            y_step: 50.0,
            caption: true,
            y_desc: None,
        },
        Panel {
            part: &price_before,
            color: style::TAB_BLUE,
            y_max: 85.0,
            y_step: 20.0,
            caption: false,
            y_desc: Some(price.name.as_str()),
        },
        Panel {
            part: &price_after,
            color: style::TAB_ORANGE,
            y_max: 85.0,
            y_step: 20.0,
            caption: false,
            y_desc: None,
        },
    ];

    let mut figure = Figure::new("fig4", (750, 1000));
    {
        let root = figure.root();
        root.fill(&WHITE)?;
        let root = root.margin(40, 10, 10, 10);
        let areas = root.split_evenly((2, 2));

        for (area, panel) in areas.iter().zip(layout.iter()) {
            let mut builder = ChartBuilder::on(area);
            builder
                .margin(4)
                .x_label_area_size(0)
                .y_label_area_size(if panel.y_desc.is_some() { 60 } else { 0 });
            if panel.caption {
                let year = panel
                    .part
                    .index
                    .first()
                    .and_then(RowKey::year)
                    .map(|y| y.to_string())
                    .unwrap_or_default();
                builder.caption(year, ("sans-serif", 18).into_font().color(&style::dark_gray()));
            }

            let frame = Frame::over_bars(panel.part.len(), 0.0..panel.y_max)
                .y_ticks(multiples(0.0, panel.y_max, panel.y_step));
            let mut plane = frame.build(&mut builder)?;

            let mut mesh = plane.configure_mesh();
            mesh.disable_x_mesh()
                .disable_x_axis()
                .bold_line_style(style::light_gray())
                .axis_style(style::dark_gray())
                .y_label_style(("sans-serif", 11).into_font().color(&style::dark_gray()));
            if let Some(desc) = panel.y_desc {
                mesh.y_desc(desc);
            }
            mesh.draw()?;

            series::bars(&mut plane, &panel.part.values, panel.color)?;
        }
        root.present()?;
    }

    if save {
        figure.save(out)?;
    }

    Ok(concat_columns(&[
        concat_rows(&[rain_before, rain_after]),
        concat_rows(&[price_before, price_after]),
    ])?)
}

// ---------------------------------------------------------------------------
// Figures 5 and 6: demand coverage by technology
// ---------------------------------------------------------------------------

/// Figure 5: demand coverage per technology as a stacked area.
pub fn energy_demand_coverage_area(
    technologies: &Table,
    boundary: NaiveDate,
    out: &OutputDir,
    save: bool,
) -> Result<Table> {
    let labels = row_labels(technologies.index());
    let mut figure = Figure::new("fig5", (1800, 600));
    {
        let root = figure.root();
        root.fill(&WHITE)?;

        let frame = Frame::over_rows(technologies.len(), 0.0..25000.0)
            .x_ticks(sparse_ticks(technologies.len(), 12))
            .y_ticks(arange(0.0, 30000.0, 5000.0));
        let mut builder = ChartBuilder::on(&root);
        builder
            .caption(
                "Evolution in coverage of energy demand by technologies",
                ("sans-serif", 22),
            )
            .margin(10)
            .y_label_area_size(50)
            .x_label_area_size(30);
        let mut plane = frame.build(&mut builder)?;

        let label_at = |x: &f64| labels.get(*x as usize).cloned().unwrap_or_default();
        plane
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(style::light_gray())
            .axis_style(style::light_gray())
            .x_label_formatter(&label_at)
            .y_label_formatter(&|v| thousands_label(*v))
            .draw()?;

        let colors = style::set2(technologies.width());
        series::stacked_area(&mut plane, technologies, &colors, 0.5)?;
        if let Some(x) = series::boundary_position(technologies.index(), &RowKey::Date(boundary)) {
            series::vline(&mut plane, &frame, x, BLACK.stroke_width(2))?;
        }

        plane
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerLeft)
            .background_style(WHITE.mix(0.2))
            .border_style(style::light_gray())
            .draw()?;
        root.present()?;
    }

    if save {
        figure.save(out)?;
    }
    Ok(technologies.clone())
}

/// Figure 6: average demand coverage per technology as a pie.
pub fn energy_demand_coverage_pie(technologies: &Table, out: &OutputDir, save: bool) -> Result<Series> {
    let means = column_means(technologies);
    let labels: Vec<String> = means.index.iter().map(RowKey::to_string).collect();

    let mut figure = Figure::new("fig6", (800, 600));
    {
        let root = figure.root();
        root.fill(&WHITE)?;
        let root = root.titled("Coverage of energy demand by technologies", ("sans-serif", 22))?;
        pie::draw(&root, &means.values, &labels, &style::set2(means.len()))?;
        root.present()?;
    }

    if save {
        figure.save(out)?;
    }
    Ok(means)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_labels_for_dates_only() {
        let index = vec![
            RowKey::Date(NaiveDate::from_ymd_opt(2016, 1, 1).unwrap()),
            RowKey::Ordinal(7),
        ];
        assert_eq!(row_labels(&index), vec!["Jan-2016", "7"]);
    }

    #[test]
    fn sparse_ticks_cap_the_count() {
        assert_eq!(sparse_ticks(24, 8), vec![0.0, 3.0, 6.0, 9.0, 12.0, 15.0, 18.0, 21.0]);
        assert_eq!(sparse_ticks(3, 8), vec![0.0, 1.0, 2.0]);
        assert!(sparse_ticks(0, 8).is_empty());
    }
}
