//! Chart primitives shared by both pipelines.
//!
//! Every figure is drawn into an in-memory RGB canvas with `plotters` and
//! encoded with `image` when it is saved.

pub mod axis;
pub mod output;
pub mod pie;
pub mod series;
pub mod style;

use std::ops::Range;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;

pub use axis::TickedAxis;
pub use output::OutputDir;

/// A cartesian chart whose axes carry explicit tick positions.
pub type Plane<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<TickedAxis, TickedAxis>>;

/// Drawing root of a [`Figure`].
pub type Canvas<'b> = DrawingArea<BitMapBackend<'b>, Shift>;

// ---------------------------------------------------------------------------
// Figure – a named, fixed-size canvas
// ---------------------------------------------------------------------------

pub struct Figure {
    name: String,
    size: (u32, u32),
    buffer: Vec<u8>,
}

impl Figure {
    /// Matplotlib-style default size: 6.4 x 4.8 inches at 100 dpi.
    pub const DEFAULT_SIZE: (u32, u32) = (640, 480);

    pub fn new(name: &str, size: (u32, u32)) -> Self {
        Figure {
            name: name.to_string(),
            size,
            buffer: vec![255; size.0 as usize * size.1 as usize * 3],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Root drawing area over the figure's pixels.
    pub fn root(&mut self) -> Canvas<'_> {
        BitMapBackend::with_buffer(&mut self.buffer, self.size).into_drawing_area()
    }

    /// Encode the canvas into the output directory as `<name>.<ext>`.
    pub fn save(&self, out: &OutputDir) -> Result<PathBuf> {
        let (w, h) = self.size;
        let image = image::RgbImage::from_raw(w, h, self.buffer.clone())
            .with_context(|| format!("{}: canvas does not match {w}x{h}", self.name))?;
        let path = out.figure_path(&self.name);
        image
            .save_with_format(&path, out.kind().format())
            .with_context(|| format!("writing {}", path.display()))?;
        info!("saved {}", path.display());
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Frame – axis ranges and tick positions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub x: Range<f64>,
    pub y: Range<f64>,
    pub x_ticks: Vec<f64>,
    /// Major y ticks: labelled, drawn with the bold grid style.
    pub y_ticks: Vec<f64>,
    /// Minor y ticks: drawn with the light grid style.
    pub y_minor: Vec<f64>,
}

impl Frame {
    pub fn new(x: Range<f64>, y: Range<f64>) -> Self {
        Frame {
            x,
            y,
            x_ticks: Vec::new(),
            y_ticks: Vec::new(),
            y_minor: Vec::new(),
        }
    }

    /// Frame for `n` points placed at positions `0..n`.
    pub fn over_rows(n: usize, y: Range<f64>) -> Self {
        Frame::new(0.0..n.saturating_sub(1).max(1) as f64, y)
    }

    /// Frame for `n` bars centred on positions `0..n`.
    pub fn over_bars(n: usize, y: Range<f64>) -> Self {
        Frame::new(-0.5..n.max(1) as f64 - 0.5, y).x_ticks((0..n).map(|i| i as f64).collect())
    }

    pub fn x_ticks(mut self, ticks: Vec<f64>) -> Self {
        self.x_ticks = ticks;
        self
    }

    pub fn y_ticks(mut self, ticks: Vec<f64>) -> Self {
        self.y_ticks = ticks;
        self
    }

    pub fn y_minor(mut self, ticks: Vec<f64>) -> Self {
        self.y_minor = ticks;
        self
    }

    /// Build the cartesian coordinate system on a configured builder.
    pub fn build<'a, 'b>(
        &self,
        builder: &mut ChartBuilder<'a, '_, BitMapBackend<'b>>,
    ) -> Result<Plane<'a, 'b>> {
        let x = TickedAxis::new(self.x.clone(), &self.x_ticks, &[]);
        let y = TickedAxis::new(self.y.clone(), &self.y_ticks, &self.y_minor);
        Ok(builder.build_cartesian_2d(x, y)?)
    }
}
