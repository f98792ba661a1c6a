use std::collections::HashMap;

use super::error::DataError;
use super::model::{RowKey, Series, Table};

// ---------------------------------------------------------------------------
// Elementwise / row-wise transforms
// ---------------------------------------------------------------------------

/// Absolute deviation of every cell from a fixed reference value.
pub fn deviation_from(table: &Table, reference: f64) -> Table {
    table.map_values(|v| (v - reference).abs())
}

/// Express every row as percentages of its row sum.
///
/// A zero row sum yields NaN cells; this is not special-cased.
pub fn normalize_rows_percent(table: &Table) -> Table {
    table.map_rows(|row| {
        let sum: f64 = row.iter().filter(|v| !v.is_nan()).sum();
        row.iter().map(|v| v / sum * 100.0).collect()
    })
}

// ---------------------------------------------------------------------------
// Label-based slicing
// ---------------------------------------------------------------------------

/// Inclusive slice on index labels; `None` leaves that end open.
pub fn slice_range(series: &Series, start: Option<&RowKey>, end: Option<&RowKey>) -> Series {
    filter_keys(series, |key| {
        start.map_or(true, |s| key >= s) && end.map_or(true, |e| key <= e)
    })
}

/// Partition into `key < boundary` and `key >= boundary`.
pub fn split_at(series: &Series, boundary: &RowKey) -> (Series, Series) {
    (
        filter_keys(series, |key| key < boundary),
        filter_keys(series, |key| key >= boundary),
    )
}

/// One partition per calendar year, in index order.  Rows whose key is not
/// a date are dropped.
pub fn split_by_year(series: &Series) -> Vec<(i32, Series)> {
    let mut parts: Vec<(i32, Series)> = Vec::new();
    for (key, value) in series.iter() {
        let Some(year) = key.year() else { continue };
        if let Some((y, part)) = parts.last_mut() {
            if *y == year {
                part.index.push(key.clone());
                part.values.push(value);
                continue;
            }
        }
        parts.push((
            year,
            Series {
                name: series.name.clone(),
                index: vec![key.clone()],
                values: vec![value],
            },
        ));
    }
    parts
}

fn filter_keys(series: &Series, keep: impl Fn(&RowKey) -> bool) -> Series {
    let (index, values) = series
        .iter()
        .filter(|&(key, _)| keep(key))
        .map(|(key, value)| (key.clone(), value))
        .unzip();
    Series {
        name: series.name.clone(),
        index,
        values,
    }
}

// ---------------------------------------------------------------------------
// Concatenation / aggregation
// ---------------------------------------------------------------------------

/// Append series end to end.  The result takes the first series' name.
pub fn concat_rows(parts: &[Series]) -> Series {
    let name = parts.first().map(|s| s.name.clone()).unwrap_or_default();
    let mut out = Series {
        name,
        index: Vec::new(),
        values: Vec::new(),
    };
    for part in parts {
        out.index.extend(part.index.iter().cloned());
        out.values.extend(part.values.iter().copied());
    }
    out
}

/// Outer join on the index: keys appear in order of first appearance and
/// cells a series has no value for are NaN.
pub fn concat_columns(series: &[Series]) -> Result<Table, DataError> {
    let mut index: Vec<RowKey> = Vec::new();
    let mut position: HashMap<RowKey, usize> = HashMap::new();
    for key in series.iter().flat_map(|s| s.index.iter()) {
        if !position.contains_key(key) {
            position.insert(key.clone(), index.len());
            index.push(key.clone());
        }
    }

    let data = series
        .iter()
        .map(|s| {
            let mut col = vec![f64::NAN; index.len()];
            for (key, value) in s.iter() {
                col[position[key]] = value;
            }
            col
        })
        .collect();

    Table::new(index, series.iter().map(|s| s.name.clone()).collect(), data)
}

/// Mean of every column, skipping NaN.  Indexed by column name.
pub fn column_means(table: &Table) -> Series {
    let values = (0..table.width())
        .map(|i| {
            let col = table.values(i).unwrap_or_default();
            let (sum, n) = col
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0.0_f64, 0usize), |(s, n), v| (s + v, n + 1));
            if n == 0 {
                f64::NAN
            } else {
                sum / n as f64
            }
        })
        .collect();

    Series {
        name: String::from("mean"),
        index: table
            .column_names()
            .iter()
            .map(|c| RowKey::Label(c.clone()))
            .collect(),
        values,
    }
}

/// Lower and upper bound of every column when the columns are stacked in
/// order.  NaN cells contribute zero height.
pub fn stack_layers(table: &Table) -> Vec<Vec<(f64, f64)>> {
    let mut base = vec![0.0; table.len()];
    (0..table.width())
        .map(|i| {
            let col = table.values(i).unwrap_or_default();
            col.iter()
                .zip(base.iter_mut())
                .map(|(&v, lower)| {
                    let upper = *lower + if v.is_nan() { 0.0 } else { v };
                    let layer = (*lower, upper);
                    *lower = upper;
                    layer
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const EPS: f64 = 1e-9;

    fn ordinal_table(columns: &[&str], data: Vec<Vec<f64>>) -> Table {
        let n = data.first().map(Vec::len).unwrap_or(0);
        Table::new(
            (1..=n as i64).map(RowKey::Ordinal).collect(),
            columns.iter().map(|c| c.to_string()).collect(),
            data,
        )
        .unwrap()
    }

    fn monthly(name: &str, from_year: i32, months: u32, values: Vec<f64>) -> Series {
        let index = (0..months)
            .map(|m| {
                let year = from_year + (m / 12) as i32;
                RowKey::Date(NaiveDate::from_ymd_opt(year, m % 12 + 1, 1).unwrap())
            })
            .collect();
        Series::new(name, index, values).unwrap()
    }

    fn boundary() -> RowKey {
        RowKey::Date(NaiveDate::from_ymd_opt(2017, 1, 1).unwrap())
    }

    #[test]
    fn deviation_is_absolute() {
        let table = ordinal_table(&["v"], vec![vec![5.3, 4.7, 5.0]]);
        let dev = deviation_from(&table, 5.0);
        let v = dev.values(0).unwrap();
        assert!((v[0] - 0.3).abs() < EPS);
        assert!((v[1] - 0.3).abs() < EPS);
        assert_eq!(v[2], 0.0);
        assert_eq!(dev.index(), table.index());
    }

    #[test]
    fn rows_normalize_to_percentages() {
        let table = ordinal_table(&["a", "b"], vec![vec![1.0, 2.0], vec![3.0, 2.0]]);
        let pct = normalize_rows_percent(&table);
        let row = pct.row(0).unwrap();
        assert!((row[0] - 25.0).abs() < EPS);
        assert!((row[1] - 75.0).abs() < EPS);
        assert!((row.iter().sum::<f64>() - 100.0).abs() < EPS);
        assert_eq!(pct.row(1).unwrap(), vec![50.0, 50.0]);
    }

    #[test]
    fn zero_row_sum_yields_nan() {
        let table = ordinal_table(&["a", "b"], vec![vec![0.0], vec![0.0]]);
        let pct = normalize_rows_percent(&table);
        assert!(pct.row(0).unwrap().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn transforms_are_stable_on_their_own_output() {
        let table = ordinal_table(&["a", "b"], vec![vec![1.0, 4.0], vec![3.0, 1.0]]);
        let once = normalize_rows_percent(&table);
        let twice = normalize_rows_percent(&once);
        for i in 0..table.len() {
            for (a, b) in once.row(i).unwrap().iter().zip(twice.row(i).unwrap()) {
                assert!((a - b).abs() < EPS);
            }
        }

        let dev = deviation_from(&table, 5.0);
        let dev_again = deviation_from(&dev, 5.0);
        assert_eq!(dev_again, deviation_from(&dev, 5.0));
        assert_eq!(dev_again.width(), table.width());
    }

    #[test]
    fn split_at_year_boundary_has_no_gap_or_overlap() {
        let series = monthly("Rain", 2016, 24, (0..24).map(f64::from).collect());
        let (before, after) = split_at(&series, &boundary());

        assert_eq!(before.len(), 12);
        assert_eq!(after.len(), 12);
        assert!(before.index.iter().all(|k| k.year() == Some(2016)));
        assert!(after.index.iter().all(|k| k.year() == Some(2017)));
        assert_eq!(concat_rows(&[before, after]), series);
    }

    #[test]
    fn slice_range_is_inclusive() {
        let series = monthly("Rain", 2016, 24, (0..24).map(f64::from).collect());
        let dec = RowKey::Date(NaiveDate::from_ymd_opt(2016, 12, 1).unwrap());
        let head = slice_range(&series, None, Some(&dec));
        assert_eq!(head.len(), 12);
        assert_eq!(head.index.last(), Some(&dec));

        let tail = slice_range(&series, Some(&boundary()), None);
        assert_eq!(tail.values.first(), Some(&12.0));
        assert_eq!(slice_range(&series, Some(&dec), Some(&boundary())).len(), 2);
    }

    #[test]
    fn split_by_year_groups_consecutive_rows() {
        let series = monthly("Price", 2016, 18, vec![1.0; 18]);
        let parts = split_by_year(&series);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].0, 2016);
        assert_eq!(parts[0].1.len(), 12);
        assert_eq!(parts[1].0, 2017);
        assert_eq!(parts[1].1.len(), 6);
    }

    #[test]
    fn concat_columns_outer_joins() {
        let key = RowKey::Ordinal;
        let a = Series::new("a", vec![key(1), key(2)], vec![1.0, 2.0]).unwrap();
        let b = Series::new("b", vec![key(2), key(3)], vec![20.0, 30.0]).unwrap();
        let table = concat_columns(&[a, b]).unwrap();

        assert_eq!(table.index(), [key(1), key(2), key(3)]);
        assert_eq!(table.column_names(), ["a", "b"]);
        assert!(table.values(0).unwrap()[2].is_nan());
        assert!(table.values(1).unwrap()[0].is_nan());
        assert_eq!(table.row(1), Some(vec![2.0, 20.0]));
    }

    #[test]
    fn split_then_concat_reproduces_columns() {
        let rain = monthly("Rain", 2016, 24, (0..24).map(f64::from).collect());
        let price = monthly("Price", 2016, 24, (0..24).map(|v| v as f64 * 2.0).collect());
        let original = Table::from_columns(&[rain.clone(), price.clone()]).unwrap();

        let (r0, r1) = split_at(&rain, &boundary());
        let (p0, p1) = split_at(&price, &boundary());
        let rebuilt = concat_columns(&[concat_rows(&[r0, r1]), concat_rows(&[p0, p1])]).unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn column_means_skip_nan() {
        let table = ordinal_table(&["solar", "wind"], vec![vec![1.0, 3.0], vec![f64::NAN, 4.0]]);
        let means = column_means(&table);
        assert_eq!(means.values, vec![2.0, 4.0]);
        assert_eq!(means.index, vec![RowKey::from("solar"), RowKey::from("wind")]);
    }

    #[test]
    fn stacked_layers_accumulate() {
        let table = ordinal_table(&["a", "b"], vec![vec![1.0, 2.0], vec![3.0, f64::NAN]]);
        let layers = stack_layers(&table);
        assert_eq!(layers[0], vec![(0.0, 1.0), (0.0, 2.0)]);
        assert_eq!(layers[1], vec![(1.0, 4.0), (2.0, 2.0)]);
    }
}
