use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// Resampling filter used when a frame is rendered at a size other than its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderSettings {
    pub version: u32,
    /// Apply EXIF orientation when the backend can read it.
    #[serde(default = "default_true")]
    pub auto_orientation: bool,
    /// Floor for reported frame delays; keeps zero-delay frames from spinning.
    #[serde(default = "default_min_frame_delay_ms")]
    pub min_frame_delay_ms: u32,
    #[serde(default)]
    pub resize_filter: ResizeFilter,
}

fn default_true() -> bool {
    true
}

fn default_min_frame_delay_ms() -> u32 {
    20
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            version: 1,
            auto_orientation: true,
            min_frame_delay_ms: default_min_frame_delay_ms(),
            resize_filter: ResizeFilter::default(),
        }
    }
}

impl DecoderSettings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("frameseq").join("settings.json"))
    }

    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Missing or malformed files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed settings at {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) {
        if let Some(path) = Self::default_path() {
            self.save_to(&path);
        }
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Ok(json) = serde_json::to_string_pretty(self) {
            if let Err(e) = std::fs::write(path, json) {
                log::warn!("Failed to save settings to {}: {e}", path.display());
            }
        }
    }
}
