use relic_data::{ColorCategory, QualityTier};
use serde::{Deserialize, Serialize};

/// Everything recognized on one relic card
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Matched effects in card order (top to bottom)
    pub matched_effects: Vec<MatchedEffect>,
    pub color: Option<ColorCategory>,
    pub is_deep_night: Option<bool>,
    pub quality: Option<QualityTier>,
    pub relic_name: Option<String>,
    /// Engine-reported confidence (0-100); informational only
    pub ocr_confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedEffect {
    pub id: i64,
    pub name: String,
    pub score: f64,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effect ids in card order
    pub fn effect_ids(&self) -> Vec<i64> {
        self.matched_effects.iter().map(|e| e.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_camel_case_with_nulls() {
        let result = ScanResult {
            matched_effects: vec![MatchedEffect {
                id: 12,
                name: "Attack Power +5".to_string(),
                score: 0.9,
            }],
            color: Some(ColorCategory::Red),
            ..ScanResult::new()
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "matchedEffects": [{ "id": 12, "name": "Attack Power +5", "score": 0.9 }],
                "color": "Red",
                "isDeepNight": null,
                "quality": null,
                "relicName": null,
                "ocrConfidence": 0.0,
            })
        );
    }

    #[test]
    fn test_deserializes_from_json() {
        let result: ScanResult = serde_json::from_value(json!({
            "matchedEffects": [],
            "color": "Green",
            "isDeepNight": true,
            "quality": "Polished",
            "relicName": "Deep Polished Tranquil Scene",
            "ocrConfidence": 71.5,
        }))
        .unwrap();
        assert_eq!(result.color, Some(ColorCategory::Green));
        assert_eq!(result.quality, Some(QualityTier::Polished));
        assert_eq!(result.is_deep_night, Some(true));
        assert!(result.effect_ids().is_empty());
    }
}
