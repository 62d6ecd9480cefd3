//! Runtime settings.
//!
//! Settings come from a TOML file (explicit path, or `picscan/config.toml`
//! under the user config directory) and are then overridden by `PICSCAN_*`
//! environment variables. Every field has a default, so a missing file is
//! not an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub ocr: OcrSettings,
    pub detector: DetectorSettings,
    pub display: DisplaySettings,
    pub overlay: OverlaySettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OcrSettings {
    pub language: String,
    pub detection_model: PathBuf,
    pub recognition_model: PathBuf,
    /// Number of text lines recognised between progress reports
    pub lines_per_batch: usize,
}

impl Default for OcrSettings {
    fn default() -> Self {
        let cache_dir = ocrs_cache_dir();
        Self {
            language: "eng".to_string(),
            detection_model: cache_dir.join("text-detection.rten"),
            recognition_model: cache_dir.join("text-recognition.rten"),
            lines_per_batch: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorSettings {
    pub model: PathBuf,
    pub min_score: f32,
    pub max_detections: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            model: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("picscan")
                .join("ssd-mobilenet-coco.rten"),
            min_score: 0.5,
            max_detections: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplaySettings {
    /// Width of the image element the preview is shown in
    pub width: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { width: 500 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlaySettings {
    pub color: [u8; 3],
    pub line_width: u32,
    pub font: Option<PathBuf>,
    pub font_size: f32,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            color: [255, 0, 0],
            line_width: 2,
            font: None,
            font_size: 14.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `~/.cache/ocrs`, where `ocrs-cli` downloads its models.
fn ocrs_cache_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cache")
        .join("ocrs")
}

/// Default location of the settings file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("picscan").join("config.toml"))
}

impl Settings {
    /// Load settings from `path` if given, else from the default location
    /// when it exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        settings.with_env_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.display.width == 0 {
            anyhow::bail!("display width must be greater than 0");
        }
        Ok(())
    }

    /// Apply `PICSCAN_*` overrides using `lookup` to read variables.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(language) = lookup("PICSCAN_LANGUAGE") {
            self.ocr.language = language;
        }
        if let Some(dir) = lookup("PICSCAN_OCR_MODEL_DIR") {
            let dir = PathBuf::from(dir);
            self.ocr.detection_model = dir.join("text-detection.rten");
            self.ocr.recognition_model = dir.join("text-recognition.rten");
        }
        if let Some(model) = lookup("PICSCAN_DETECTOR_MODEL") {
            self.detector.model = PathBuf::from(model);
        }
        if let Some(width) = lookup("PICSCAN_DISPLAY_WIDTH") {
            self.display.width = width
                .parse()
                .with_context(|| format!("PICSCAN_DISPLAY_WIDTH is not a number: {width}"))?;
            self.validate()
                .with_context(|| format!("PICSCAN_DISPLAY_WIDTH is invalid: {width}"))?;
        }
        if let Some(level) = lookup("PICSCAN_LOG") {
            self.log.level = level;
        }
        Ok(self)
    }
}
