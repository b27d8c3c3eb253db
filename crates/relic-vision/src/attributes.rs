use regex::Regex;
use relic_data::{ColorCategory, KnowledgeBase, QualityTier, RelicNameRecord};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

use crate::effect_matcher::MatchCandidate;
use crate::fuzzy::{self, FuzzyKey};
use crate::text::clean_line;

/// A unique relic name must score above this to be trusted
pub const MIN_RELIC_NAME_SCORE: f64 = 0.55;

/// Search threshold (normalized edit distance) for unique relic names
const RELIC_NAME_THRESHOLD: f64 = 0.35;

/// The relic name is printed at the top of the card
const RELIC_NAME_LINES: usize = 5;

/// Cleaned lines this short or shorter are skipped when looking for a name
const MAX_SKIPPED_NAME_LINE_LEN: usize = 3;

/// Scene keyword rules. Every rule is checked; the last one that matches wins.
static SCENE_RULES: LazyLock<Vec<(Regex, ColorCategory)>> = LazyLock::new(|| {
    [
        (r"(?i)burning", ColorCategory::Red),
        (r"(?i)tranquil", ColorCategory::Green),
        (r"(?i)drizzly", ColorCategory::Blue),
        (r"(?i)luminous", ColorCategory::Yellow),
    ]
    .into_iter()
    .map(|(p, c)| (Regex::new(p).expect("static regex"), c))
    .collect()
});

/// Quality keyword rules. Every rule is checked; the last one that matches wins.
static QUALITY_RULES: LazyLock<Vec<(Regex, QualityTier)>> = LazyLock::new(|| {
    [
        (r"(?i)\bgrand\b", QualityTier::Grand),
        (r"(?i)\bpolished\b", QualityTier::Polished),
        (r"(?i)\bdelicate\b", QualityTier::Delicate),
    ]
    .into_iter()
    .map(|(p, q)| (Regex::new(p).expect("static regex"), q))
    .collect()
});

static DEEP_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bdeep\b").expect("static regex"));

/// Where `relic_name` came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameSource {
    /// A unique relic name read from the card
    UniqueName,
    /// Built from color, variant and quality
    Synthesized,
}

/// Attributes inferred for one card. `None` means unknown, not false.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferredAttributes {
    pub color: Option<ColorCategory>,
    pub is_deep_night: Option<bool>,
    pub quality: Option<QualityTier>,
    pub relic_name: Option<String>,
    pub name_source: Option<NameSource>,
}

impl InferredAttributes {
    /// Fill an unknown color from pixel sampling. A synthesized name is
    /// rebuilt for the new color; a unique name is left alone.
    pub fn with_sampled_color(
        mut self,
        sampled: Option<ColorCategory>,
        effect_count: usize,
    ) -> Self {
        if self.color.is_some() || sampled.is_none() {
            return self;
        }
        self.color = sampled;
        if self.name_source != Some(NameSource::UniqueName) {
            self.relic_name = get_relic_name(
                self.color,
                self.is_deep_night.unwrap_or(false),
                effect_count,
                self.quality,
            );
            self.name_source = self.relic_name.as_ref().map(|_| NameSource::Synthesized);
        }
        self
    }
}

/// Infers color, deep-night variant and quality from OCR text
pub struct AttributeInferencer {
    relic_names: Vec<(FuzzyKey, RelicNameRecord)>,
}

impl AttributeInferencer {
    pub fn new(kb: &KnowledgeBase) -> Self {
        let relic_names = kb
            .relic_names()
            .iter()
            .map(|r| (FuzzyKey::new(&r.name), r.clone()))
            .collect();
        Self { relic_names }
    }

    /// Signals, strongest first:
    /// 1. a unique relic name in the top lines (sets color and variant)
    /// 2. scene keyword for color, if still unknown
    /// 3. the word "deep" for the variant, if still unknown (never sets false)
    /// 4. quality keyword, independently
    ///
    /// Without a unique name, the name is synthesized when the color is known.
    pub fn detect_from_text(
        &self,
        raw_text: &str,
        matched_effects: &[MatchCandidate],
    ) -> InferredAttributes {
        let mut attrs = InferredAttributes::default();

        if let Some((relic, score)) = self.match_relic_name(raw_text) {
            debug!("Unique relic name {:?} ({:.2})", relic.name, score);
            attrs.color = Some(relic.color);
            attrs.is_deep_night = Some(relic.is_deep_night);
            attrs.relic_name = Some(relic.name.clone());
            attrs.name_source = Some(NameSource::UniqueName);
        }

        if attrs.color.is_none() {
            attrs.color = last_matching_rule(&SCENE_RULES, raw_text);
        }

        if attrs.is_deep_night.is_none() && DEEP_WORD.is_match(raw_text) {
            attrs.is_deep_night = Some(true);
        }

        attrs.quality = last_matching_rule(&QUALITY_RULES, raw_text);

        if attrs.relic_name.is_none() {
            attrs.relic_name = get_relic_name(
                attrs.color,
                attrs.is_deep_night.unwrap_or(false),
                matched_effects.len(),
                attrs.quality,
            );
            attrs.name_source = attrs.relic_name.as_ref().map(|_| NameSource::Synthesized);
        }

        attrs
    }

    /// Best unique relic name among the first non-trivial lines, if it
    /// scores above `MIN_RELIC_NAME_SCORE`
    pub fn match_relic_name(&self, raw_text: &str) -> Option<(&RelicNameRecord, f64)> {
        let mut best: Option<(&RelicNameRecord, f64)> = None;

        let top_lines = raw_text
            .lines()
            .map(clean_line)
            .filter(|l| l.chars().count() > MAX_SKIPPED_NAME_LINE_LEN)
            .take(RELIC_NAME_LINES);

        for line in top_lines {
            let query = FuzzyKey::new(&line);
            let mut line_best: Option<(&RelicNameRecord, f64)> = None;
            for (key, relic) in &self.relic_names {
                let dist = fuzzy::distance(&query, key);
                if dist <= RELIC_NAME_THRESHOLD
                    && line_best.map_or(true, |(_, d)| dist < d)
                {
                    line_best = Some((relic, dist));
                }
            }

            if let Some((relic, dist)) = line_best {
                let score = 1.0 - dist;
                if score > MIN_RELIC_NAME_SCORE && best.map_or(true, |(_, s)| score > s) {
                    best = Some((relic, score));
                }
            }
        }

        best
    }
}

/// Evaluate every rule in order and keep the result of the last match
fn last_matching_rule<T: Copy>(rules: &[(Regex, T)], text: &str) -> Option<T> {
    let mut result = None;
    for (pattern, value) in rules {
        if pattern.is_match(text) {
            result = Some(*value);
        }
    }
    result
}

/// Quality guessed from how many effects the relic has. Weaker than reading
/// the quality word off the card.
pub fn quality_from_effect_count(is_deep_night: bool, effect_count: usize) -> QualityTier {
    let (delicate_max, polished_max) = if is_deep_night { (2, 4) } else { (1, 2) };
    if effect_count <= delicate_max {
        QualityTier::Delicate
    } else if effect_count <= polished_max {
        QualityTier::Polished
    } else {
        QualityTier::Grand
    }
}

/// Generic relic name, e.g. "Deep Polished Tranquil Scene".
/// `None` when the color is unknown.
pub fn get_relic_name(
    color: Option<ColorCategory>,
    is_deep_night: bool,
    effect_count: usize,
    detected_quality: Option<QualityTier>,
) -> Option<String> {
    let scene = color?.scene();
    let quality = detected_quality
        .unwrap_or_else(|| quality_from_effect_count(is_deep_night, effect_count));
    let prefix = if is_deep_night { "Deep " } else { "" };
    Some(format!("{}{} {}", prefix, quality, scene))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::from_records(
            [(12, "Attack Power +5".to_string())],
            vec![
                RelicNameRecord {
                    name: "Old Pocketwatch".to_string(),
                    color: ColorCategory::Blue,
                    is_deep_night: false,
                },
                RelicNameRecord {
                    name: "Night of the Baron".to_string(),
                    color: ColorCategory::Yellow,
                    is_deep_night: true,
                },
            ],
        )
    }

    fn candidate(id: i64) -> MatchCandidate {
        MatchCandidate {
            id,
            name: format!("effect {}", id),
            score: 1.0,
            source_line_index: id as usize,
            line: String::new(),
        }
    }

    #[test]
    fn test_scene_keyword_sets_color() {
        let inf = AttributeInferencer::new(&kb());
        let attrs = inf.detect_from_text("Burning Scene\nAttac k Power +5\n", &[candidate(12)]);
        assert_eq!(attrs.color, Some(ColorCategory::Red));
        assert_eq!(attrs.is_deep_night, None);
        assert_eq!(attrs.quality, None);
        assert_eq!(attrs.relic_name.as_deref(), Some("Delicate Burning Scene"));
        assert_eq!(attrs.name_source, Some(NameSource::Synthesized));
    }

    #[test]
    fn test_last_scene_rule_wins() {
        let inf = AttributeInferencer::new(&kb());
        // Rule order decides, not position in the text
        let attrs = inf.detect_from_text("Luminous\nBurning Scene", &[]);
        assert_eq!(attrs.color, Some(ColorCategory::Yellow));
        let attrs = inf.detect_from_text("tranquil drizzly", &[]);
        assert_eq!(attrs.color, Some(ColorCategory::Blue));
    }

    #[test]
    fn test_last_quality_rule_wins() {
        let inf = AttributeInferencer::new(&kb());
        let attrs = inf.detect_from_text("Grand Burning Scene\nDelicate", &[]);
        assert_eq!(attrs.quality, Some(QualityTier::Delicate));
        let attrs = inf.detect_from_text("Delicate\nGrand Burning Scene", &[]);
        assert_eq!(attrs.quality, Some(QualityTier::Delicate));
        let attrs = inf.detect_from_text("Grand and Polished", &[]);
        assert_eq!(attrs.quality, Some(QualityTier::Polished));
    }

    #[test]
    fn test_quality_needs_whole_word() {
        let inf = AttributeInferencer::new(&kb());
        let attrs = inf.detect_from_text("Grandiose Tranquil Scene", &[]);
        assert_eq!(attrs.quality, None);
    }

    #[test]
    fn test_deep_word() {
        let inf = AttributeInferencer::new(&kb());
        let attrs = inf.detect_from_text("DEEP Grand Drizzly Scene", &[]);
        assert_eq!(attrs.is_deep_night, Some(true));
        assert_eq!(attrs.relic_name.as_deref(), Some("Deep Grand Drizzly Scene"));

        let attrs = inf.detect_from_text("Deepened Grand Drizzly Scene", &[]);
        assert_eq!(attrs.is_deep_night, None);
    }

    #[test]
    fn test_unique_name_takes_precedence() {
        let inf = AttributeInferencer::new(&kb());
        let attrs = inf.detect_from_text("0ld Pocketwatch\nBurning\nDeep", &[]);
        assert_eq!(attrs.color, Some(ColorCategory::Blue));
        // Set by the name, so "Deep" in the text does not override it
        assert_eq!(attrs.is_deep_night, Some(false));
        assert_eq!(attrs.relic_name.as_deref(), Some("Old Pocketwatch"));
        assert_eq!(attrs.name_source, Some(NameSource::UniqueName));
    }

    #[test]
    fn test_unique_name_only_in_top_lines() {
        let inf = AttributeInferencer::new(&kb());
        let text = "line one\nline two\nline three\nline four\nline five\nNight of the Baron";
        assert!(inf.match_relic_name(text).is_none());

        let (relic, score) = inf.match_relic_name("x\nNight of the Barn").unwrap();
        assert_eq!(relic.name, "Night of the Baron");
        assert!(score > MIN_RELIC_NAME_SCORE);
    }

    #[test]
    fn test_nothing_known() {
        let inf = AttributeInferencer::new(&kb());
        let attrs = inf.detect_from_text("nothing useful here", &[candidate(1)]);
        assert_eq!(attrs, InferredAttributes::default());
    }

    #[test]
    fn test_with_sampled_color() {
        let inf = AttributeInferencer::new(&kb());
        let attrs = inf
            .detect_from_text("Polished", &[])
            .with_sampled_color(Some(ColorCategory::Green), 2);
        assert_eq!(attrs.color, Some(ColorCategory::Green));
        assert_eq!(attrs.relic_name.as_deref(), Some("Polished Tranquil Scene"));

        // Text color is not overridden by the sample
        let attrs = inf
            .detect_from_text("Burning Scene", &[])
            .with_sampled_color(Some(ColorCategory::Blue), 0);
        assert_eq!(attrs.color, Some(ColorCategory::Red));
    }

    #[test]
    fn test_get_relic_name() {
        assert_eq!(
            get_relic_name(Some(ColorCategory::Green), true, 3, None).as_deref(),
            Some("Deep Polished Tranquil Scene")
        );
        assert_eq!(
            get_relic_name(Some(ColorCategory::Red), false, 3, None).as_deref(),
            Some("Grand Burning Scene")
        );
        assert_eq!(
            get_relic_name(Some(ColorCategory::Yellow), false, 5, Some(QualityTier::Delicate))
                .as_deref(),
            Some("Delicate Luminous Scene")
        );
        assert_eq!(get_relic_name(None, true, 3, None), None);
    }

    #[test]
    fn test_quality_from_effect_count() {
        let deep: Vec<QualityTier> = (0..=5).map(|n| quality_from_effect_count(true, n)).collect();
        assert_eq!(
            deep,
            vec![
                QualityTier::Delicate,
                QualityTier::Delicate,
                QualityTier::Delicate,
                QualityTier::Polished,
                QualityTier::Polished,
                QualityTier::Grand,
            ]
        );
        let normal: Vec<QualityTier> = (0..=3).map(|n| quality_from_effect_count(false, n)).collect();
        assert_eq!(
            normal,
            vec![
                QualityTier::Delicate,
                QualityTier::Delicate,
                QualityTier::Polished,
                QualityTier::Grand,
            ]
        );
    }
}
