//! Voltage stability and rainfall / energy-price charts rendered from
//! spreadsheet datasets.
//!
//! ```text
//!   data/*.xlsx ──► data::loader ──► Table ──► data::transform
//!                                                  │
//!                                                  ▼
//!                 images/figN.jpg ◄── chart ◄── pipeline::{voltage, energy}
//! ```

pub mod chart;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod sample;
