use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate};

use super::DataError;

// ---------------------------------------------------------------------------
// RowKey – a single value of a table index
// ---------------------------------------------------------------------------

/// One entry of a row index: a sample number, a date, or a free label.
///
/// Keys are totally ordered (dates, then ordinals, then labels) so that
/// label-based range slicing works on any index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Date(NaiveDate),
    Ordinal(i64),
    Label(String),
}

impl PartialOrd for RowKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RowKey {
    fn cmp(&self, other: &Self) -> Ordering {
        use RowKey::*;
        fn discriminant(k: &RowKey) -> u8 {
            match k {
                Date(_) => 0,
                Ordinal(_) => 1,
                Label(_) => 2,
            }
        }
        match (self, other) {
            (Date(a), Date(b)) => a.cmp(b),
            (Ordinal(a), Ordinal(b)) => a.cmp(b),
            (Label(a), Label(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            RowKey::Ordinal(i) => write!(f, "{i}"),
            RowKey::Label(s) => write!(f, "{s}"),
        }
    }
}

impl From<NaiveDate> for RowKey {
    fn from(d: NaiveDate) -> Self {
        RowKey::Date(d)
    }
}

impl From<i64> for RowKey {
    fn from(i: i64) -> Self {
        RowKey::Ordinal(i)
    }
}

impl From<&str> for RowKey {
    fn from(s: &str) -> Self {
        RowKey::Label(s.to_string())
    }
}

impl RowKey {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            RowKey::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Calendar year of a date key.
    pub fn year(&self) -> Option<i32> {
        self.as_date().map(|d| d.year())
    }
}

// ---------------------------------------------------------------------------
// Series – one named column
// ---------------------------------------------------------------------------

/// A single named column of values with its own index.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub index: Vec<RowKey>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(
        name: impl Into<String>,
        index: Vec<RowKey>,
        values: Vec<f64>,
    ) -> Result<Self, DataError> {
        let name = name.into();
        if index.len() != values.len() {
            return Err(DataError::Shape(format!(
                "series '{name}': index has {} rows but values have {}",
                index.len(),
                values.len()
            )));
        }
        Ok(Series {
            name,
            index,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of the non-NaN values.
    pub fn sum(&self) -> f64 {
        self.values.iter().filter(|v| !v.is_nan()).sum()
    }

    /// Iterate `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&RowKey, f64)> + '_ {
        self.index.iter().zip(self.values.iter().copied())
    }
}

// ---------------------------------------------------------------------------
// Table – aligned columns sharing one index
// ---------------------------------------------------------------------------

/// A column-major table: every column has exactly `index.len()` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index: Vec<RowKey>,
    columns: Vec<String>,
    data: Vec<Vec<f64>>,
}

impl Table {
    /// Build a table, checking that the shape is consistent.
    pub fn new(
        index: Vec<RowKey>,
        columns: Vec<String>,
        data: Vec<Vec<f64>>,
    ) -> Result<Self, DataError> {
        if columns.len() != data.len() {
            return Err(DataError::Shape(format!(
                "{} column names for {} columns",
                columns.len(),
                data.len()
            )));
        }
        if let Some((name, col)) = columns
            .iter()
            .zip(data.iter())
            .find(|(_, col)| col.len() != index.len())
        {
            return Err(DataError::Shape(format!(
                "column '{name}' has {} values but the index has {} rows",
                col.len(),
                index.len()
            )));
        }
        Ok(Table {
            index,
            columns,
            data,
        })
    }

    /// Build a table from series that share the same index.
    pub fn from_columns(series: &[Series]) -> Result<Self, DataError> {
        let index = series.first().map(|s| s.index.clone()).unwrap_or_default();
        if let Some(bad) = series.iter().find(|s| s.index != index) {
            return Err(DataError::Shape(format!(
                "series '{}' does not share the table index",
                bad.name
            )));
        }
        Table::new(
            index,
            series.iter().map(|s| s.name.clone()).collect(),
            series.iter().map(|s| s.values.clone()).collect(),
        )
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn index(&self) -> &[RowKey] {
        &self.index
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self, column: usize) -> Option<&[f64]> {
        self.data.get(column).map(Vec::as_slice)
    }

    /// Positional column selection.
    pub fn column(&self, i: usize) -> Option<Series> {
        let values = self.data.get(i)?;
        Some(Series {
            name: self.columns[i].clone(),
            index: self.index.clone(),
            values: values.clone(),
        })
    }

    pub fn column_by_name(&self, name: &str) -> Option<Series> {
        let i = self.columns.iter().position(|c| c == name)?;
        self.column(i)
    }

    /// All columns as series.
    pub fn columns(&self) -> Vec<Series> {
        (0..self.width()).filter_map(|i| self.column(i)).collect()
    }

    pub fn row(&self, i: usize) -> Option<Vec<f64>> {
        if i >= self.len() {
            return None;
        }
        Some(self.data.iter().map(|col| col[i]).collect())
    }

    /// Elementwise map; index and column names are kept.
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Table {
        Table {
            index: self.index.clone(),
            columns: self.columns.clone(),
            data: self
                .data
                .iter()
                .map(|col| col.iter().map(|&v| f(v)).collect())
                .collect(),
        }
    }

    /// Row-wise map: `f` receives every row and returns a row of equal width.
    pub(crate) fn map_rows(&self, f: impl Fn(&[f64]) -> Vec<f64>) -> Table {
        let mut data = vec![Vec::with_capacity(self.len()); self.width()];
        for i in 0..self.len() {
            let row: Vec<f64> = self.data.iter().map(|col| col[i]).collect();
            for (col, v) in data.iter_mut().zip(f(&row)) {
                col.push(v);
            }
        }
        Table {
            index: self.index.clone(),
            columns: self.columns.clone(),
            data,
        }
    }
}
