//! Deterministic synthetic datasets in the layout both pipelines expect.

use std::f64::consts::PI;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Months, NaiveDate};
use log::info;
use rust_xlsxwriter::{Format, Workbook};

use crate::data::{RowKey, Table};

pub const TECHNOLOGIES: [&str; 6] = ["Nuclear", "Coal", "Combined cycle", "Hydro", "Wind", "Solar"];

/// Seeded noise source for the sample tables: xoshiro256** seeded through
/// splitmix64, with normal deviates from the polar Box-Muller method.
pub struct SampleRng {
    s: [u64; 4],
    spare: Option<f64>,
}

impl SampleRng {
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        let mut splitmix = || {
            sm = sm.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = sm;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^ (z >> 31)
        };
        SampleRng {
            s: [splitmix(), splitmix(), splitmix(), splitmix()],
            spare: None,
        }
    }

    fn next_u64(&mut self) -> u64 {
        let [a, b, c, d] = &mut self.s;
        let out = b.wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let shifted = *b << 17;
        *c ^= *a;
        *d ^= *b;
        *b ^= *c;
        *a ^= *d;
        *c ^= shifted;
        *d = d.rotate_left(45);
        out
    }

    /// Uniform in `[-1, 1)`.
    fn signed_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }

    /// Normal deviate; every second call reuses the pair's spare value.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        if let Some(z) = self.spare.take() {
            return mean + std_dev * z;
        }
        loop {
            let (u, v) = (self.signed_unit(), self.signed_unit());
            let r2 = u * u + v * v;
            if r2 > 0.0 && r2 < 1.0 {
                let scale = (-2.0 * r2.ln() / r2).sqrt();
                self.spare = Some(v * scale);
                return mean + std_dev * u * scale;
            }
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// First day of `count` consecutive months starting at `start`.
fn months(start: NaiveDate, count: u32) -> Vec<RowKey> {
    (0..count)
        .filter_map(|m| start.checked_add_months(Months::new(m)))
        .map(RowKey::Date)
        .collect()
}

fn jan_2016() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 1, 1).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// 100 samples of five nominal 5 V sources with increasing noise.
pub fn voltage_table(rng: &mut SampleRng) -> Result<Table> {
    let samples = 100;
    let index = (1..=samples).map(RowKey::Ordinal).collect();
    let columns = (1..=5).map(|i| format!("Source {i}")).collect();
    let data = (0..5)
        .map(|s| {
            let sigma = 0.05 + 0.05 * s as f64;
            (0..samples)
                .map(|_| round2(rng.normal(5.0, sigma).clamp(4.3, 5.7)))
                .collect()
        })
        .collect();
    Ok(Table::new(index, columns, data)?)
}

/// Monthly rainfall and energy price over 2016-2017.
pub fn rain_price_table(rng: &mut SampleRng) -> Result<Table> {
    let index = months(jan_2016(), 24);
    let phase = |m: usize| 2.0 * PI * (m % 12) as f64 / 12.0;
    let rain = (0..24)
        .map(|m| round2((45.0 + 40.0 * phase(m).cos() + rng.normal(0.0, 20.0)).clamp(0.0, 170.0)))
        .collect();
    let price = (0..24)
        .map(|m| {
            let trend = if m >= 12 { 12.0 } else { 0.0 };
            round2((40.0 + trend + 10.0 * phase(m).sin() + rng.normal(0.0, 4.0)).clamp(20.0, 95.0))
        })
        .collect();
    Ok(Table::new(
        index,
        vec![
            "Rainfall in Valencian Community (l/m2)".to_string(),
            "Energy price (EUR/MWh)".to_string(),
        ],
        vec![rain, price],
    )?)
}

/// Monthly demand coverage (MWh) per generation technology.
pub fn technology_table(rng: &mut SampleRng) -> Result<Table> {
    let index = months(jan_2016(), 24);
    let base = [5000.0, 3000.0, 4000.0, 2500.0, 4500.0, 1500.0];
    let data = base
        .iter()
        .map(|&b| {
            (0..24)
                .map(|_| round2(rng.normal(b, b * 0.1).max(0.0)))
                .collect()
        })
        .collect();
    Ok(Table::new(
        index,
        TECHNOLOGIES.iter().map(|t| t.to_string()).collect(),
        data,
    )?)
}

// ---------------------------------------------------------------------------
// Workbook writer
// ---------------------------------------------------------------------------

/// One worksheet to write: the index goes in column A, values after it.
/// Date keys are stored as Excel dates, the way spreadsheet exports hold them.
pub struct Sheet<'a> {
    pub name: &'a str,
    pub index_name: &'a str,
    pub table: &'a Table,
    /// Write values as text with a decimal comma instead of numbers.
    pub decimal_comma: bool,
}

pub fn write_workbook(path: &Path, sheets: &[Sheet<'_>]) -> Result<()> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    for sheet in sheets {
        let ws = workbook.add_worksheet();
        ws.set_name(sheet.name)?;
        ws.write_string(0, 0, sheet.index_name)?;
        for (c, name) in sheet.table.column_names().iter().enumerate() {
            ws.write_string(0, c as u16 + 1, name.as_str())?;
        }

        for (r, key) in sheet.table.index().iter().enumerate() {
            let row = r as u32 + 1;
            match key {
                RowKey::Ordinal(i) => ws.write_number(row, 0, *i as f64)?,
                RowKey::Date(d) => ws.write_datetime_with_format(row, 0, d, &date_format)?,
                RowKey::Label(label) => ws.write_string(row, 0, label)?,
            };
            for c in 0..sheet.table.width() {
                let v = sheet.table.values(c).map(|col| col[r]).unwrap_or(f64::NAN);
                if v.is_nan() {
                    continue;
                }
                let col = c as u16 + 1;
                if sheet.decimal_comma {
                    ws.write_string(row, col, v.to_string().replace('.', ","))?;
                } else {
                    ws.write_number(row, col, v)?;
                }
            }
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

/// Write `lab1_data.xlsx` and `lab2_data.xlsx` into `dir`.
pub fn write_lab_datasets(dir: &Path, seed: u64) -> Result<()> {
    let mut rng = SampleRng::new(seed);
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let voltage = voltage_table(&mut rng)?;
    write_workbook(
        &dir.join("lab1_data.xlsx"),
        &[Sheet {
            name: "Voltage",
            index_name: "Sample",
            table: &voltage,
            decimal_comma: true,
        }],
    )?;

    let rain_price = rain_price_table(&mut rng)?;
    let technologies = technology_table(&mut rng)?;
    write_workbook(
        &dir.join("lab2_data.xlsx"),
        &[
            Sheet {
                name: "Rainfall and price",
                index_name: "Date",
                table: &rain_price,
                decimal_comma: true,
            },
            Sheet {
                name: "Demand coverage",
                index_name: "Date",
                table: &technologies,
                decimal_comma: false,
            },
        ],
    )
}
