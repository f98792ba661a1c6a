use std::path::Path;

use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::error::DataError;
use super::model::{RowKey, Table};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How the first column of a sheet is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexKind {
    /// Integers become ordinals, anything else a text label.
    #[default]
    Auto,
    /// Every index cell must be a date (native or text).
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Zero-based sheet position within the workbook.
    pub sheet: usize,
    pub index: IndexKind,
}

impl LoadOptions {
    pub fn sheet(sheet: usize) -> Self {
        LoadOptions {
            sheet,
            ..Default::default()
        }
    }

    pub fn with_dates(mut self) -> Self {
        self.index = IndexKind::Date;
        self
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load one sheet of a tabular file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – spreadsheet workbooks
/// * `.csv`     – `;`-delimited text, decimal comma
/// * `.parquet` – first column is the index
/// * `.json`    – pandas `to_json(orient="split")`
///
/// In every format the first column is the index and the header row names
/// the data columns.  Text cells are numbers written with a decimal comma.
pub fn load_table(path: &Path, options: LoadOptions) -> Result<Table, DataError> {
    if !path.exists() {
        return Err(DataError::Missing(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path, options.sheet)?,
        other => {
            if options.sheet != 0 {
                return Err(DataError::SheetOutOfRange {
                    index: options.sheet,
                    count: 1,
                });
            }
            match other {
                "csv" => read_csv(path)?,
                "parquet" | "pq" => read_parquet(path)?,
                "json" => read_json(path, options.index)?,
                _ => return Err(DataError::UnsupportedExtension(other.to_string())),
            }
        }
    };

    let table = raw.into_table(options.index)?;
    info!(
        "loaded {} rows x {} columns from {} (sheet {})",
        table.len(),
        table.width(),
        path.display(),
        options.sheet
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Raw sheet: header + untyped cells, shared by every format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Empty,
}

#[derive(Debug, Default)]
struct RawSheet {
    /// 0-based sheet row holding the header.
    first_row: usize,
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    fn into_table(self, kind: IndexKind) -> Result<Table, DataError> {
        if self.header.is_empty() {
            return Err(DataError::Empty);
        }
        let index_name = self.header[0].clone();
        let columns: Vec<String> = self.header[1..].to_vec();
        let mut index = Vec::with_capacity(self.rows.len());
        let mut data = vec![Vec::with_capacity(self.rows.len()); columns.len()];

        // Errors name the 1-based row a spreadsheet shows, header included.
        let data_start = self.first_row + 2;
        let rows = self
            .rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| (data_start + i, row))
            .filter(|(_, row)| row.iter().any(|c| *c != Cell::Empty));

        for (position, (sheet_row, row)) in rows.enumerate() {
            let mut cells = row.into_iter();
            let key_cell = cells.next().unwrap_or(Cell::Empty);
            index.push(parse_key(key_cell, kind, sheet_row, position, &index_name)?);

            for (col_no, column) in columns.iter().enumerate() {
                let cell = cells.next().unwrap_or(Cell::Empty);
                data[col_no].push(parse_value(cell, sheet_row, column)?);
            }
        }

        Table::new(index, columns, data)
    }
}

fn parse_key(
    cell: Cell,
    kind: IndexKind,
    row: usize,
    position: usize,
    column: &str,
) -> Result<RowKey, DataError> {
    let parse_error = |value: String| DataError::Parse {
        row,
        column: column.to_string(),
        value,
    };

    match (kind, cell) {
        (_, Cell::Date(d)) => Ok(RowKey::Date(d)),
        (IndexKind::Date, Cell::Text(s)) => parse_date(&s).map(RowKey::Date).ok_or(parse_error(s)),
        (IndexKind::Date, Cell::Number(n)) => Err(parse_error(n.to_string())),
        (IndexKind::Date, Cell::Empty) => Err(parse_error(String::new())),
        (IndexKind::Auto, Cell::Number(n)) if n.fract() == 0.0 => Ok(RowKey::Ordinal(n as i64)),
        (IndexKind::Auto, Cell::Number(n)) => Ok(RowKey::Label(n.to_string())),
        (IndexKind::Auto, Cell::Text(s)) => Ok(s
            .trim()
            .parse::<i64>()
            .map(RowKey::Ordinal)
            .unwrap_or_else(|_| RowKey::Label(s))),
        // Unlabelled rows fall back to their position.
        (IndexKind::Auto, Cell::Empty) => Ok(RowKey::Ordinal(position as i64)),
    }
}

fn parse_value(cell: Cell, row: usize, column: &str) -> Result<f64, DataError> {
    match cell {
        Cell::Number(n) => Ok(n),
        Cell::Empty => Ok(f64::NAN),
        Cell::Text(s) => parse_decimal_comma(&s).ok_or_else(|| DataError::Parse {
            row,
            column: column.to_string(),
            value: s,
        }),
        Cell::Date(d) => Err(DataError::Parse {
            row,
            column: column.to_string(),
            value: d.to_string(),
        }),
    }
}

/// Parse a number written with a decimal comma (`"5,23"`).  Blank text is
/// a missing value.
pub fn parse_decimal_comma(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(f64::NAN);
    }
    s.replace(',', ".").parse::<f64>().ok()
}

/// Parse an index date in any of the accepted text forms.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

// ---------------------------------------------------------------------------
// Workbook loader
// ---------------------------------------------------------------------------

fn read_workbook(path: &Path, sheet: usize) -> Result<RawSheet, DataError> {
    let mut workbook = open_workbook_auto(path)?;
    let count = workbook.sheet_names().len();
    debug!("{} has {count} sheet(s)", path.display());

    let range = workbook
        .worksheet_range_at(sheet)
        .ok_or(DataError::SheetOutOfRange {
            index: sheet,
            count,
        })??;

    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows = range.rows();
    let header = match rows.next() {
        Some(cells) => cells.iter().map(|c| c.to_string()).collect(),
        None => return Ok(RawSheet::default()),
    };
    let rows = rows
        .map(|cells| cells.iter().map(workbook_cell).collect())
        .collect();

    Ok(RawSheet {
        first_row,
        header,
        rows,
    })
}

fn workbook_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => Cell::Date(d.date()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::Empty => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Semicolon-separated export of a single sheet.
fn read_csv(path: &Path) -> Result<RawSheet, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)?;

    let header = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawSheet {
        header,
        rows,
        ..RawSheet::default()
    })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by both **pandas** (`df.reset_index().to_parquet()`)
/// and **polars**: the first column is the index, the rest are numeric.
fn read_parquet(path: &Path) -> Result<RawSheet, DataError> {
    let file = std::fs::File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut sheet = RawSheet::default();
    for batch in reader {
        let batch = batch?;
        if sheet.header.is_empty() {
            sheet.header = batch
                .schema()
                .fields()
                .iter()
                .map(|f| f.name().clone())
                .collect();
        }

        let columns: Vec<Vec<Cell>> = batch
            .columns()
            .iter()
            .enumerate()
            .map(|(i, col)| {
                if i == 0 {
                    arrow_index_cells(col)
                } else {
                    arrow_value_cells(col)
                }
            })
            .collect::<Result<_, _>>()?;

        for row in 0..batch.num_rows() {
            sheet
                .rows
                .push(columns.iter().map(|col| col[row].clone()).collect());
        }
    }

    Ok(sheet)
}

fn arrow_index_cells(col: &ArrayRef) -> Result<Vec<Cell>, DataError> {
    match col.data_type() {
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            let dates = cast(col, &DataType::Date32)?;
            let arr = downcast::<Date32Array>(&dates)?;
            Ok((0..arr.len())
                .map(|i| arr.value_as_date(i).filter(|_| !arr.is_null(i)))
                .map(|d| d.map(Cell::Date).unwrap_or(Cell::Empty))
                .collect())
        }
        DataType::Utf8 | DataType::LargeUtf8 => {
            let text = cast(col, &DataType::Utf8)?;
            let arr = downcast::<StringArray>(&text)?;
            Ok((0..arr.len())
                .map(|i| {
                    if arr.is_null(i) {
                        Cell::Empty
                    } else {
                        Cell::Text(arr.value(i).to_string())
                    }
                })
                .collect())
        }
        dt if dt.is_integer() => {
            let ints = cast(col, &DataType::Int64)?;
            let arr = downcast::<Int64Array>(&ints)?;
            Ok(arr
                .iter()
                .map(|v| v.map(|i| Cell::Number(i as f64)).unwrap_or(Cell::Empty))
                .collect())
        }
        _ => arrow_value_cells(col),
    }
}

fn arrow_value_cells(col: &ArrayRef) -> Result<Vec<Cell>, DataError> {
    let floats = cast(col, &DataType::Float64)?;
    let arr = downcast::<Float64Array>(&floats)?;
    Ok(arr
        .iter()
        .map(|v| v.map(Cell::Number).unwrap_or(Cell::Empty))
        .collect())
}

fn downcast<T: 'static>(col: &ArrayRef) -> Result<&T, DataError> {
    col.as_any().downcast_ref::<T>().ok_or_else(|| {
        DataError::Shape(format!("unexpected arrow type {:?}", col.data_type()))
    })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (split-oriented, `df.to_json(orient='split')`):
///
/// ```json
/// {
///   "columns": ["Source 1", "Source 2"],
///   "index":   [1, 2],
///   "data":    [[5.02, 4.97], [5.10, 4.88]]
/// }
/// ```
///
/// Numeric index values of a date-indexed frame are epoch milliseconds.
#[derive(Debug, Deserialize)]
struct SplitFrame {
    #[serde(default)]
    index_name: Option<String>,
    columns: Vec<String>,
    index: Vec<JsonValue>,
    data: Vec<Vec<JsonValue>>,
}

fn read_json(path: &Path, kind: IndexKind) -> Result<RawSheet, DataError> {
    let text = std::fs::read_to_string(path)?;
    let frame: SplitFrame = serde_json::from_str(&text)?;
    if frame.index.len() != frame.data.len() {
        return Err(DataError::Shape(format!(
            "index has {} entries but data has {} rows",
            frame.index.len(),
            frame.data.len()
        )));
    }

    let mut header = vec![frame.index_name.unwrap_or_default()];
    header.extend(frame.columns);

    let rows = frame
        .index
        .iter()
        .zip(frame.data.iter())
        .map(|(key, values)| {
            let key = match (kind, key) {
                (IndexKind::Date, JsonValue::Number(n)) => n
                    .as_i64()
                    .and_then(DateTime::<Utc>::from_timestamp_millis)
                    .map(|dt| Cell::Date(dt.date_naive()))
                    .unwrap_or_else(|| json_cell(key)),
                _ => json_cell(key),
            };
            std::iter::once(key)
                .chain(values.iter().map(json_cell))
                .collect()
        })
        .collect();

    Ok(RawSheet {
        header,
        rows,
        ..RawSheet::default()
    })
}

fn json_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
        JsonValue::String(s) => Cell::Text(s.clone()),
        JsonValue::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        JsonValue::Null => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(header: &[&str], rows: Vec<Vec<Cell>>) -> RawSheet {
        RawSheet {
            first_row: 0,
            header: header.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn decimal_comma_text_is_numeric() {
        assert_eq!(parse_decimal_comma("5,3"), Some(5.3));
        assert_eq!(parse_decimal_comma(" 4,75 "), Some(4.75));
        assert_eq!(parse_decimal_comma("12"), Some(12.0));
        assert!(parse_decimal_comma("").unwrap().is_nan());
        assert_eq!(parse_decimal_comma("n/a"), None);
    }

    #[test]
    fn accepted_date_forms() {
        let d = NaiveDate::from_ymd_opt(2016, 12, 31).unwrap();
        assert_eq!(parse_date("2016-12-31"), Some(d));
        assert_eq!(parse_date("31/12/2016"), Some(d));
        assert_eq!(parse_date("2016-12-31 00:00:00"), Some(d));
        assert_eq!(parse_date("2016-12-31T00:00:00"), Some(d));
        assert_eq!(parse_date("Dec 2016"), None);
    }

    #[test]
    fn first_column_becomes_the_index() {
        let table = sheet(
            &["Sample", "Source 1", "Source 2"],
            vec![
                vec![Cell::Number(1.0), text("5,1"), Cell::Number(4.9)],
                vec![Cell::Number(2.0), text("5,2"), Cell::Empty],
            ],
        )
        .into_table(IndexKind::Auto)
        .unwrap();

        assert_eq!(table.column_names(), ["Source 1", "Source 2"]);
        assert_eq!(table.index(), [RowKey::Ordinal(1), RowKey::Ordinal(2)]);
        assert_eq!(table.values(0).unwrap(), [5.1, 5.2]);
        assert!(table.values(1).unwrap()[1].is_nan());
    }

    #[test]
    fn short_rows_are_padded_and_blank_rows_skipped() {
        let table = sheet(
            &["", "a", "b"],
            vec![
                vec![text("x"), Cell::Number(1.0)],
                vec![Cell::Empty, Cell::Empty, Cell::Empty],
            ],
        )
        .into_table(IndexKind::Auto)
        .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.index(), [RowKey::Label("x".into())]);
        assert!(table.values(1).unwrap()[0].is_nan());
    }

    #[test]
    fn date_index_accepts_text_and_native_dates() {
        let jan = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2016, 2, 1).unwrap();
        let table = sheet(
            &["Date", "Rain"],
            vec![
                vec![Cell::Date(jan), Cell::Number(10.0)],
                vec![text("01/02/2016"), Cell::Number(20.0)],
            ],
        )
        .into_table(IndexKind::Date)
        .unwrap();

        assert_eq!(table.index(), [RowKey::Date(jan), RowKey::Date(feb)]);
    }

    #[test]
    fn bad_cells_name_row_and_column() {
        let err = sheet(&["i", "v"], vec![vec![Cell::Number(1.0), text("abc")]])
            .into_table(IndexKind::Auto)
            .unwrap_err();
        match err {
            DataError::Parse { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "v");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = sheet(&["d", "v"], vec![vec![text("soon"), Cell::Number(1.0)]])
            .into_table(IndexKind::Date)
            .unwrap_err();
        assert!(matches!(err, DataError::Parse { .. }));
    }

    #[test]
    fn parse_errors_count_blank_rows_and_header_offset() {
        let mut raw = sheet(
            &["i", "v"],
            vec![
                vec![Cell::Number(1.0), Cell::Number(5.0)],
                vec![Cell::Empty, Cell::Empty],
                vec![Cell::Number(3.0), text("5,x")],
            ],
        );
        raw.first_row = 3;
        match raw.into_table(IndexKind::Auto).unwrap_err() {
            // Header on sheet row 4, so the third data row is row 7.
            DataError::Parse { row, .. } => assert_eq!(row, 7),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unlabelled_rows_use_position_after_blank_rows() {
        let table = sheet(
            &["i", "v"],
            vec![
                vec![Cell::Empty, Cell::Number(1.0)],
                vec![Cell::Empty, Cell::Empty],
                vec![Cell::Empty, Cell::Number(2.0)],
            ],
        )
        .into_table(IndexKind::Auto)
        .unwrap();
        assert_eq!(table.index(), [RowKey::Ordinal(0), RowKey::Ordinal(1)]);
    }

    #[test]
    fn headerless_sheet_is_empty_error() {
        let err = RawSheet::default().into_table(IndexKind::Auto).unwrap_err();
        assert!(matches!(err, DataError::Empty));
    }

    #[test]
    fn missing_file_and_unknown_extension() {
        let err = load_table(Path::new("does/not/exist.xlsx"), LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::Missing(_)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.txt");
        std::fs::write(&path, "x").unwrap();
        let err = load_table(&path, LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedExtension(ext) if ext == "txt"));
    }

    #[test]
    fn csv_with_semicolons_and_decimal_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab.csv");
        std::fs::write(&path, "Date;Rain;Price\n2016-01-01;12,5;40\n2016-02-01;;41,25\n").unwrap();

        let table = load_table(&path, LoadOptions::default().with_dates()).unwrap();
        assert_eq!(table.column_names(), ["Rain", "Price"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.values(0).unwrap()[0], 12.5);
        assert!(table.values(0).unwrap()[1].is_nan());
        assert_eq!(table.values(1).unwrap()[1], 41.25);

        let err = load_table(&path, LoadOptions::sheet(1)).unwrap_err();
        assert!(matches!(err, DataError::SheetOutOfRange { index: 1, count: 1 }));
    }

    #[test]
    fn json_split_frame_with_epoch_millis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab.json");
        std::fs::write(
            &path,
            r#"{"columns":["Solar","Wind"],"index":[1451606400000,1454284800000],"data":[[1.0,2.0],[3.0,null]]}"#,
        )
        .unwrap();

        let table = load_table(&path, LoadOptions::default().with_dates()).unwrap();
        assert_eq!(
            table.index()[1],
            RowKey::Date(NaiveDate::from_ymd_opt(2016, 2, 1).unwrap())
        );
        assert_eq!(table.values(0).unwrap(), [1.0, 3.0]);
        assert!(table.values(1).unwrap()[1].is_nan());
    }
}
