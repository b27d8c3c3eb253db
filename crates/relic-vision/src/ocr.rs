use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::OcrError;

/// Raw recognition result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrOutput {
    pub text: String,
    /// Mean word confidence, 0-100
    pub confidence: f32,
}

/// Tesseract page segmentation mode (0-13)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSegMode(u8);

impl PageSegMode {
    /// Assume a single uniform block of text
    pub const SINGLE_BLOCK: PageSegMode = PageSegMode(6);
    /// Treat the image as a single text line
    pub const SINGLE_LINE: PageSegMode = PageSegMode(7);

    pub fn new(mode: u8) -> Option<Self> {
        (mode <= 13).then_some(Self(mode))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for PageSegMode {
    fn default() -> Self {
        Self::SINGLE_BLOCK
    }
}

/// Anything that turns a bitmap into text
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, bitmap: &RgbaImage, mode: PageSegMode) -> Result<OcrOutput, OcrError>;
}

/// Runs the `tesseract` executable, one process per call.
pub struct TesseractEngine {
    executable: PathBuf,
    language: String,
    available: bool,
}

impl TesseractEngine {
    /// Use `tesseract` from PATH with English data
    pub fn new() -> Self {
        Self::with_executable("tesseract")
    }

    pub fn with_executable(executable: impl AsRef<Path>) -> Self {
        let executable = executable.as_ref().to_path_buf();
        let available = check_tesseract(&executable);
        if available {
            debug!("Tesseract OCR available at {}", executable.display());
        } else {
            warn!(
                "Tesseract not found at {}. OCR disabled. Install with: brew install tesseract",
                executable.display()
            );
        }
        Self {
            executable,
            language: "eng".to_string(),
            available,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Check if OCR is available
    pub fn is_available(&self) -> bool {
        self.available
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, bitmap: &RgbaImage, mode: PageSegMode) -> Result<OcrOutput, OcrError> {
        if !self.available {
            return Err(OcrError::Unavailable);
        }

        // Per-call temp file so concurrent scans don't collide
        let input = NamedTempFile::with_suffix(".png")?;
        bitmap.save_with_format(input.path(), ImageFormat::Png)?;

        let output = Command::new(&self.executable)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(mode.value().to_string())
            .arg("tsv")
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OcrError::Unavailable,
                _ => OcrError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(stderr.trim().to_string()));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let result = parse_tsv_output(&tsv)?;
        debug!(
            "OCR result: {} lines, confidence {:.0}",
            result.text.lines().count(),
            result.confidence
        );
        Ok(result)
    }
}

/// Regroup Tesseract TSV word rows into text lines.
///
/// TSV fields: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Only level 5 (word) rows carry text.
pub fn parse_tsv_output(tsv: &str) -> Result<OcrOutput, OcrError> {
    let mut rows = tsv.lines();
    match rows.next() {
        Some(header) if header.starts_with("level") => {}
        _ => return Err(OcrError::Output("missing TSV header".to_string())),
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current_key: Option<(u32, u32, u32)> = None;
    let mut current_words: Vec<&str> = Vec::new();
    let mut conf_sum = 0.0f32;
    let mut conf_count = 0usize;

    for row in rows {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }
        if fields[0] != "5" {
            continue;
        }
        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let key = (
            fields[2].parse().unwrap_or(0),
            fields[3].parse().unwrap_or(0),
            fields[4].parse().unwrap_or(0),
        );
        if current_key != Some(key) {
            if !current_words.is_empty() {
                lines.push(current_words.join(" "));
                current_words.clear();
            }
            current_key = Some(key);
        }
        current_words.push(text);

        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        if conf >= 0.0 {
            conf_sum += conf;
            conf_count += 1;
        }
    }
    if !current_words.is_empty() {
        lines.push(current_words.join(" "));
    }

    let confidence = if conf_count > 0 {
        conf_sum / conf_count as f32
    } else {
        0.0
    };

    Ok(OcrOutput {
        text: lines.join("\n"),
        confidence,
    })
}

/// Check if Tesseract is installed and accessible
fn check_tesseract(executable: &Path) -> bool {
    Command::new(executable)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
