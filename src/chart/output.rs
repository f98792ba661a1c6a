use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use crate::config::{ImageKind, Settings};

/// Directory that receives the rendered figures, plus their encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDir {
    path: PathBuf,
    kind: ImageKind,
}

impl OutputDir {
    /// Create the configured images directory if it does not exist yet.
    pub fn create(settings: &Settings) -> Result<Self> {
        let out = OutputDir {
            path: settings.images_dir.clone(),
            kind: settings.image_format,
        };
        if out.path.is_dir() {
            debug!("output directory {} already present", out.path.display());
        } else {
            create_dir(&out.path)
                .with_context(|| format!("creating output directory {}", out.path.display()))?;
            debug!("created output directory {}", out.path.display());
        }
        Ok(out)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    /// `<dir>/<name>.<ext>`
    pub fn figure_path(&self, name: &str) -> PathBuf {
        self.path.join(format!("{name}.{}", self.kind.extension()))
    }
}

#[cfg(unix)]
fn create_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o740)
        .create(path)
}

#[cfg(not(unix))]
fn create_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            images_dir: dir.path().join("images"),
            ..Settings::default()
        };

        let first = OutputDir::create(&settings).unwrap();
        assert!(first.path().is_dir());
        std::fs::write(first.path().join("keep.txt"), "x").unwrap();

        let second = OutputDir::create(&settings).unwrap();
        assert_eq!(first, second);
        assert!(second.path().join("keep.txt").exists());
    }

    #[test]
    fn figure_paths_use_the_format_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings {
            images_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let jpeg = OutputDir::create(&settings).unwrap();
        assert_eq!(jpeg.figure_path("fig1"), dir.path().join("fig1.jpg"));

        settings.image_format = ImageKind::Png;
        let png = OutputDir::create(&settings).unwrap();
        assert_eq!(png.figure_path("fig6"), dir.path().join("fig6.png"));
    }
}
