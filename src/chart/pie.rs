use std::f64::consts::TAU;

use anyhow::Result;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::Canvas;

/// Angular extent of one slice, in radians counter-clockwise from 3 o'clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wedge {
    pub start: f64,
    pub end: f64,
}

impl Wedge {
    pub fn mid(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    /// Share of the full circle, in percent.
    pub fn percent(&self) -> f64 {
        (self.end - self.start) / TAU * 100.0
    }
}

/// Slices proportional to `values`.  NaN and negative values get no area.
pub fn wedges(values: &[f64]) -> Vec<Wedge> {
    let clean: Vec<f64> = values
        .iter()
        .map(|&v| if v.is_nan() || v < 0.0 { 0.0 } else { v })
        .collect();
    let total: f64 = clean.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut start = 0.0;
    clean
        .iter()
        .map(|v| {
            let end = start + v / total * TAU;
            let wedge = Wedge { start, end };
            start = end;
            wedge
        })
        .collect()
}

/// Turn a slice percentage back into the value it represents, rounded up.
pub fn autopct_value(percent: f64, total: f64) -> i64 {
    (percent / 100.0 * total).ceil() as i64
}

fn polar(center: (i32, i32), radius: f64, angle: f64) -> (i32, i32) {
    (
        center.0 + (radius * angle.cos()).round() as i32,
        center.1 - (radius * angle.sin()).round() as i32,
    )
}

/// Draw a pie with a name outside every slice and its value inside.
pub fn draw(
    area: &Canvas<'_>,
    values: &[f64],
    labels: &[String],
    colors: &[RGBColor],
) -> Result<()> {
    let (w, h) = area.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = w.min(h) as f64 * 0.38;
    let total: f64 = values.iter().filter(|v| !v.is_nan()).sum();

    let centered = Pos::new(HPos::Center, VPos::Center);
    let label_style = TextStyle::from(("sans-serif", 16).into_font()).pos(centered);
    let value_style = TextStyle::from(("sans-serif", 14).into_font()).pos(centered);

    for ((wedge, label), &color) in wedges(values).iter().zip(labels).zip(colors) {
        // One vertex per degree keeps the arc smooth at this size.
        let steps = ((wedge.end - wedge.start).to_degrees().ceil() as usize).max(1);
        let mut outline = vec![center];
        outline.extend((0..=steps).map(|s| {
            let angle = wedge.start + (wedge.end - wedge.start) * s as f64 / steps as f64;
            polar(center, radius, angle)
        }));
        area.draw(&Polygon::new(outline, color.filled()))?;

        area.draw(&Text::new(
            label.clone(),
            polar(center, radius * 1.1, wedge.mid()),
            label_style.clone(),
        ))?;
        area.draw(&Text::new(
            autopct_value(wedge.percent(), total).to_string(),
            polar(center, radius * 0.6, wedge.mid()),
            value_style.clone(),
        ))?;
    }
    Ok(())
}
