use relic_vision::{OcrError, VisionError};
use std::time::Duration;
use thiserror::Error;

/// Why a scan produced no result
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid input: {0}")]
    Input(#[from] VisionError),

    #[error("OCR engine error: {0}")]
    Engine(#[from] OcrError),

    #[error("OCR engine timed out after {0:?}")]
    EngineTimeout(Duration),

    #[error("Scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
