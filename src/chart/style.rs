use chrono::NaiveDate;
use palette::{named, Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Named colours
// ---------------------------------------------------------------------------

pub const TAB_BLUE: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
pub const TAB_ORANGE: RGBColor = RGBColor(0xff, 0x7f, 0x0e);
pub const TAB_GREEN: RGBColor = RGBColor(0x2c, 0xa0, 0x2c);

/// Default colour cycle for multi-series charts.
const TAB10: [RGBColor; 10] = [
    TAB_BLUE,
    TAB_ORANGE,
    TAB_GREEN,
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];

/// Qualitative "Set2" colormap.
const SET2: [RGBColor; 8] = [
    RGBColor(0x66, 0xc2, 0xa5),
    RGBColor(0xfc, 0x8d, 0x62),
    RGBColor(0x8d, 0xa0, 0xcb),
    RGBColor(0xe7, 0x8a, 0xc3),
    RGBColor(0xa6, 0xd8, 0x54),
    RGBColor(0xff, 0xd9, 0x2f),
    RGBColor(0xe5, 0xc4, 0x94),
    RGBColor(0xb3, 0xb3, 0xb3),
];

fn from_palette(c: Srgb<u8>) -> RGBColor {
    RGBColor(c.red, c.green, c.blue)
}

pub fn light_gray() -> RGBColor {
    from_palette(named::LIGHTGRAY)
}

pub fn dark_gray() -> RGBColor {
    from_palette(named::DARKGRAY)
}

// ---------------------------------------------------------------------------
// Palettes
// ---------------------------------------------------------------------------

/// `n` colours spread evenly around the hue wheel, keeping tab:blue's
/// saturation and lightness so generated series sit beside the cycle.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    let base: Hsl = Srgb::new(TAB_BLUE.0, TAB_BLUE.1, TAB_BLUE.2)
        .into_format::<f32>()
        .into_color();
    let step = 360.0 / n.max(1) as f32;
    (0..n)
        .map(|i| {
            let hue = base.hue.into_degrees() + step * i as f32;
            let rgb: Srgb = Hsl::new(hue, base.saturation, base.lightness).into_color();
            from_palette(rgb.into_format())
        })
        .collect()
}

/// Colours for `n` series from the default cycle; falls back to generated
/// hues once the cycle would repeat.
pub fn cycle(n: usize) -> Vec<RGBColor> {
    if n <= TAB10.len() {
        TAB10[..n].to_vec()
    } else {
        generate_palette(n)
    }
}

/// Sample the Set2 colormap at `n` evenly spaced points in `[0, 1]`.
pub fn set2(n: usize) -> Vec<RGBColor> {
    let last = SET2.len() - 1;
    (0..n)
        .map(|i| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            SET2[((t * SET2.len() as f64) as usize).min(last)]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Ticks and tick labels
// ---------------------------------------------------------------------------

fn snap(v: f64) -> f64 {
    (v * 1e9).round() / 1e9
}

/// Evenly spaced values in `[start, stop)`.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || stop <= start {
        return Vec::new();
    }
    let n = ((stop - start) / step).ceil() as usize;
    (0..n).map(|i| snap(start + i as f64 * step)).collect()
}

/// Every multiple of `step` inside `[lo, hi]`.
pub fn multiples(lo: f64, hi: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || hi < lo {
        return Vec::new();
    }
    let first = (lo / step - 1e-9).ceil() as i64;
    let last = (hi / step + 1e-9).floor() as i64;
    (first..=last).map(|k| snap(k as f64 * step)).collect()
}

/// Plain numeric label without trailing zeros (`4.4`, `5`).
pub fn tick_label(v: f64) -> String {
    format!("{}", snap(v))
}

pub fn percent_label(v: f64) -> String {
    format!("{}%", snap(v))
}

/// `25000` → `"25k"`.
pub fn thousands_label(v: f64) -> String {
    format!("{}k", (v / 1000.0) as i64)
}

/// `2016-03-01` → `"Mar-2016"`.
pub fn month_year_label(d: NaiveDate) -> String {
    d.format("%b-%Y").to_string()
}
