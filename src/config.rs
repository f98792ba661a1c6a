use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, info};
use serde::Deserialize;

/// Default settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "lab-charts.json";

/// Encoding used for saved figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    #[default]
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
}

impl ImageKind {
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
        }
    }

    pub fn format(self) -> image::ImageFormat {
        match self {
            ImageKind::Jpeg => image::ImageFormat::Jpeg,
            ImageKind::Png => image::ImageFormat::Png,
        }
    }
}

/// Paths and constants shared by both chart pipelines.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub images_dir: PathBuf,
    pub image_format: ImageKind,
    /// Nominal supply voltage the lab 1 deviations are measured against.
    pub reference_voltage: f64,
    /// First day of the second year in the lab 2 datasets.
    pub year_boundary: NaiveDate,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: PathBuf::from("data"),
            images_dir: PathBuf::from("images"),
            image_format: ImageKind::Jpeg,
            reference_voltage: 5.0,
            year_boundary: NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or_default(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file.  A missing file gives the defaults;
    /// fields absent from the file keep their default values.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("{} not found, using default settings", path.display());
            return Ok(Settings::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&text)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let settings = Settings::load(Path::new("no/such/lab-charts.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.data_file("lab1_data.xlsx"), Path::new("data/lab1_data.xlsx"));
        assert_eq!(
            settings.year_boundary,
            NaiveDate::from_ymd_opt(2017, 1, 1).unwrap()
        );
    }

    #[test]
    fn partial_file_overrides_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            r#"{"images_dir": "out", "image_format": "png", "year_boundary": "2018-01-01"}"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.images_dir, PathBuf::from("out"));
        assert_eq!(settings.image_format, ImageKind::Png);
        assert_eq!(settings.image_format.extension(), "png");
        assert_eq!(settings.data_dir, PathBuf::from("data"));
        assert_eq!(settings.reference_voltage, 5.0);
        assert_eq!(
            settings.year_boundary,
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn jpg_alias() {
        let kind: ImageKind = serde_json::from_str(r#""jpg""#).unwrap();
        assert_eq!(kind, ImageKind::Jpeg);
    }
}
