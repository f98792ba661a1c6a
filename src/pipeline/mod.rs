//! The two chart pipelines.  Each loads its dataset, derives what it plots
//! and renders a fixed sequence of figures into the output directory.

pub mod energy;
pub mod voltage;
