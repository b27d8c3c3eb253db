use anyhow::{Context, Result};
use relic_vision::{CropRegion, PageSegMode, PreprocessConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// User-tunable scan settings, stored as JSON. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub contrast: f32,
    pub threshold: f32,
    pub blur: f32,
    pub scale: f32,
    pub invert: bool,
    /// Largest normalized edit distance accepted for an effect match
    pub match_threshold: f64,
    pub psm: u8,
    pub ocr_timeout_secs: u64,
    /// Card area within the full frame
    pub crop: CropRegion,
}

impl Default for ScanSettings {
    fn default() -> Self {
        let card = PreprocessConfig::CARD;
        Self {
            contrast: card.contrast,
            threshold: card.threshold,
            blur: card.blur_radius,
            scale: card.scale,
            invert: card.invert,
            match_threshold: 0.35,
            psm: PageSegMode::default().value(),
            ocr_timeout_secs: 30,
            crop: CropRegion::CARD,
        }
    }
}

impl ScanSettings {
    /// Load settings from a JSON file. No path, or a missing file, gives defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            warn!("Settings file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings: ScanSettings = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        settings.validate()?;
        info!("Loaded scan settings from {}", path.display());
        Ok(settings)
    }

    /// Check every field that feeds a later stage
    pub fn validate(&self) -> Result<()> {
        self.preprocess().validate().context("Invalid preprocess settings")?;
        self.crop.validate().context("Invalid crop settings")?;
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.match_threshold),
            "match_threshold must be within 0..=1, got {}",
            self.match_threshold
        );
        anyhow::ensure!(
            PageSegMode::new(self.psm).is_some(),
            "psm must be 0-13, got {}",
            self.psm
        );
        anyhow::ensure!(self.ocr_timeout_secs > 0, "ocr_timeout_secs must be positive");
        Ok(())
    }

    pub fn preprocess(&self) -> PreprocessConfig {
        PreprocessConfig {
            contrast: self.contrast,
            threshold: self.threshold,
            blur_radius: self.blur,
            scale: self.scale,
            invert: self.invert,
        }
    }

    pub fn page_seg_mode(&self) -> PageSegMode {
        PageSegMode::new(self.psm).unwrap_or_default()
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_secs(self.ocr_timeout_secs)
    }
}
