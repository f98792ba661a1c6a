use std::ops::Range;

use plotters::coord::ranged1d::{
    KeyPointHint, KeyPointWeight, NoDefaultFormatting, Ranged, ValueFormatter,
};
use plotters::coord::types::RangedCoordf64;

use super::style::tick_label;

/// A numeric axis whose grid lines and labels sit at fixed positions.
///
/// Bold key points (labels and the bold grid) come from `major`, light key
/// points from `minor`. An axis with no major ticks falls back to the
/// automatic placement of a plain `f64` range.
#[derive(Clone)]
pub struct TickedAxis {
    inner: RangedCoordf64,
    major: Vec<f64>,
    minor: Vec<f64>,
}

impl TickedAxis {
    pub fn new(range: Range<f64>, major: &[f64], minor: &[f64]) -> Self {
        let inside = |ticks: &[f64]| -> Vec<f64> {
            let eps = (range.end - range.start).abs() * 1e-9;
            ticks
                .iter()
                .copied()
                .filter(|t| *t >= range.start - eps && *t <= range.end + eps)
                .collect()
        };
        TickedAxis {
            major: inside(major),
            minor: inside(minor),
            inner: RangedCoordf64::from(range),
        }
    }

    pub fn major(&self) -> &[f64] {
        &self.major
    }

    pub fn minor(&self) -> &[f64] {
        &self.minor
    }
}

impl Ranged for TickedAxis {
    type FormatOption = NoDefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.inner.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        if self.major.is_empty() {
            return self.inner.key_points(hint);
        }
        match hint.weight() {
            KeyPointWeight::Bold => self.major.clone(),
            KeyPointWeight::Any => self.minor.clone(),
        }
    }

    fn range(&self) -> Range<f64> {
        self.inner.range()
    }
}

impl ValueFormatter<f64> for TickedAxis {
    fn format(value: &f64) -> String {
        tick_label(*value)
    }
}
