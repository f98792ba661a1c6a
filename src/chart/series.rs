use anyhow::Result;
use plotters::prelude::*;

use super::{Frame, Plane};
use crate::data::transform::stack_layers;
use crate::data::Table;

/// Legend swatch drawn next to a series label.
fn swatch(color: RGBColor) -> impl Fn((i32, i32)) -> Rectangle<(i32, i32)> {
    move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled())
}

/// One line through `values` at positions `0..n`; NaN points are skipped.
pub fn line(
    plane: &mut Plane<'_, '_>,
    values: &[f64],
    style: ShapeStyle,
    label: Option<&str>,
) -> Result<()> {
    let points = values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, &v)| (i as f64, v));
    let color = style.color;
    let anno = plane.draw_series(LineSeries::new(points, style))?;
    if let Some(label) = label {
        anno.label(label).legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 15, y)], color.stroke_width(2))
        });
    }
    Ok(())
}

/// Horizontal rule across the whole frame.
pub fn hline(plane: &mut Plane<'_, '_>, frame: &Frame, y: f64, style: ShapeStyle) -> Result<()> {
    plane.draw_series(LineSeries::new(
        [(frame.x.start, y), (frame.x.end, y)],
        style,
    ))?;
    Ok(())
}

/// Vertical rule across the whole frame.
pub fn vline(plane: &mut Plane<'_, '_>, frame: &Frame, x: f64, style: ShapeStyle) -> Result<()> {
    plane.draw_series(LineSeries::new(
        [(x, frame.y.start), (x, frame.y.end)],
        style,
    ))?;
    Ok(())
}

/// Vertical bars centred on positions `0..n`.
pub fn bars(plane: &mut Plane<'_, '_>, values: &[f64], color: RGBColor) -> Result<()> {
    const HALF_WIDTH: f64 = 0.25;
    plane.draw_series(
        values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .map(|(i, &v)| {
                let x = i as f64;
                Rectangle::new([(x - HALF_WIDTH, 0.0), (x + HALF_WIDTH, v)], color.filled())
            }),
    )?;
    Ok(())
}

/// Columns of `table` stacked on top of each other as filled bands.
pub fn stacked_area(
    plane: &mut Plane<'_, '_>,
    table: &Table,
    colors: &[RGBColor],
    alpha: f64,
) -> Result<()> {
    for ((layer, name), &color) in stack_layers(table)
        .iter()
        .zip(table.column_names())
        .zip(colors)
    {
        let upper = layer.iter().enumerate().map(|(i, &(_, hi))| (i as f64, hi));
        let lower = layer
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &(lo, _))| (i as f64, lo));
        let outline: Vec<(f64, f64)> = upper.chain(lower).collect();

        plane
            .draw_series(std::iter::once(Polygon::new(
                outline,
                color.mix(alpha).filled(),
            )))?
            .label(name.as_str())
            .legend(swatch(color));

        plane.draw_series(LineSeries::new(
            layer.iter().enumerate().map(|(i, &(_, hi))| (i as f64, hi)),
            color.stroke_width(1),
        ))?;
    }
    Ok(())
}

/// Position of the first row whose key is at or after `boundary`.
pub fn boundary_position<K: PartialOrd>(index: &[K], boundary: &K) -> Option<f64> {
    index
        .iter()
        .position(|k| k >= boundary)
        .map(|i| i as f64)
}
