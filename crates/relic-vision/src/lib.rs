pub mod attributes;
pub mod color;
pub mod effect_matcher;
pub mod error;
pub mod fuzzy;
pub mod ocr;
pub mod preprocess;
pub mod region;
pub mod text;

pub use attributes::{get_relic_name, AttributeInferencer, InferredAttributes, NameSource};
pub use color::{color_from_hue, detect_color};
pub use effect_matcher::{EffectMatcher, MatchCandidate, MIN_MATCH_SCORE};
pub use error::{OcrError, VisionError};
pub use ocr::{OcrEngine, OcrOutput, PageSegMode, TesseractEngine};
pub use preprocess::PreprocessConfig;
pub use region::{crop_frame, CropRegion};
pub use text::{clean_line, normalize_name};
