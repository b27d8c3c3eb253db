use image::RgbaImage;
use relic_data::KnowledgeBase;
use relic_state::{MatchedEffect, ScanResult};
use relic_vision::{
    crop_frame, detect_color, preprocess, AttributeInferencer, EffectMatcher, InferredAttributes,
    MatchCandidate, OcrEngine, OcrOutput,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::ScanSettings;
use crate::error::ScanError;

/// Runs color sampling, preprocessing, OCR, matching and inference for
/// one card at a time. Cheap to share: every scan only reads.
pub struct ScanPipeline {
    engine: Arc<dyn OcrEngine>,
    matcher: Arc<EffectMatcher>,
    inferencer: Arc<AttributeInferencer>,
    settings: ScanSettings,
    ocr_timeout: Duration,
}

impl ScanPipeline {
    pub fn new(kb: &KnowledgeBase, engine: Arc<dyn OcrEngine>, settings: ScanSettings) -> Self {
        let matcher = EffectMatcher::new(kb);
        let inferencer = AttributeInferencer::new(kb);
        info!(
            "Scan pipeline ready: {} effects, {} relic names",
            matcher.effect_count(),
            kb.relic_names().len()
        );
        let ocr_timeout = settings.ocr_timeout();
        Self {
            engine,
            matcher: Arc::new(matcher),
            inferencer: Arc::new(inferencer),
            settings,
            ocr_timeout,
        }
    }

    /// Override the engine timeout from the settings
    pub fn with_ocr_timeout(mut self, timeout: Duration) -> Self {
        self.ocr_timeout = timeout;
        self
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Crop the card out of the full frame with the configured box, then scan.
    pub async fn scan_frame(&self, full_frame: Arc<RgbaImage>) -> Result<ScanResult, ScanError> {
        let cropped = crop_frame(&full_frame, &self.settings.crop)?;
        self.scan(full_frame, Arc::new(cropped)).await
    }

    /// Scan one card. Color sampling reads the full frame; OCR reads the
    /// cropped card. Both run on blocking threads in parallel.
    pub async fn scan(
        &self,
        full_frame: Arc<RgbaImage>,
        cropped: Arc<RgbaImage>,
    ) -> Result<ScanResult, ScanError> {
        let started = Instant::now();

        let color_task = tokio::task::spawn_blocking(move || detect_color(&full_frame));

        let engine = self.engine.clone();
        let config = self.settings.preprocess();
        let mode = self.settings.page_seg_mode();
        let ocr_task = tokio::task::spawn_blocking(move || -> Result<OcrOutput, ScanError> {
            let processed = preprocess::process(&cropped, &config)?;
            Ok(engine.recognize(&processed, mode)?)
        });

        // A timed-out engine call keeps its blocking thread until it returns
        let (sampled, ocr) = tokio::join!(
            color_task,
            tokio::time::timeout(self.ocr_timeout, ocr_task)
        );
        let sampled = sampled??;
        let ocr = match ocr {
            Ok(joined) => joined??,
            Err(_) => return Err(ScanError::EngineTimeout(self.ocr_timeout)),
        };
        debug!(
            "Sampled color {:?}, OCR confidence {:.0} after {:?}",
            sampled,
            ocr.confidence,
            started.elapsed()
        );

        let matched = self
            .matcher
            .match_effects(&ocr.text, self.settings.match_threshold);
        let attrs = self
            .inferencer
            .detect_from_text(&ocr.text, &matched)
            .with_sampled_color(sampled, matched.len());

        info!(
            "Scanned card in {:?}: {} effects, color {:?}, name {:?}",
            started.elapsed(),
            matched.len(),
            attrs.color,
            attrs.relic_name
        );
        Ok(build_result(matched, attrs, ocr.confidence))
    }
}

fn build_result(
    matched: Vec<MatchCandidate>,
    attrs: InferredAttributes,
    ocr_confidence: f32,
) -> ScanResult {
    ScanResult {
        matched_effects: matched
            .into_iter()
            .map(|m| MatchedEffect {
                id: m.id,
                name: m.name,
                score: m.score,
            })
            .collect(),
        color: attrs.color,
        is_deep_night: attrs.is_deep_night,
        quality: attrs.quality,
        relic_name: attrs.relic_name,
        ocr_confidence,
    }
}
