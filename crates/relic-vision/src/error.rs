use thiserror::Error;

/// Caller-side input problems. Reported as-is, never corrected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VisionError {
    #[error("Image has zero area: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failures of the external OCR engine
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine is not available")]
    Unavailable,

    #[error("OCR engine failed: {0}")]
    Failed(String),

    #[error("Unreadable OCR output: {0}")]
    Output(String),

    #[error("Failed to encode OCR input image: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
