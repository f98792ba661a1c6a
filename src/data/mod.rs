/// Data layer: core types, loading, and transforms.
///
/// Architecture:
/// ```text
///  .xlsx / .ods / .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse sheet → Table (first column = index)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  RowKey index, named f64 columns
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ transform  │  deviation, percentages, slices, concat, means
///   └───────────┘
/// ```

pub mod error;
pub mod loader;
pub mod model;
pub mod transform;

pub use error::DataError;
pub use loader::{load_table, IndexKind, LoadOptions};
pub use model::{RowKey, Series, Table};
