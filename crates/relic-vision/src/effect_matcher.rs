use relic_data::KnowledgeBase;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::fuzzy::{self, FuzzyKey};
use crate::text::clean_line;

/// Matches scoring below this are discarded whatever the search threshold
pub const MIN_MATCH_SCORE: f64 = 0.35;

/// Cleaned lines this short or shorter carry no usable effect text
const MAX_DISCARDED_LINE_LEN: usize = 4;

/// Lines shorter than this are also tried joined with the next line
const JOIN_BELOW_LEN: usize = 25;

/// Best match of one effect on the card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub id: i64,
    pub name: String,
    pub score: f64,
    /// Index into the candidate lines (joined lines included), top to bottom
    pub source_line_index: usize,
    /// The cleaned OCR line that produced the match
    pub line: String,
}

/// Effect with both match keys prepared
struct IndexedEffect {
    id: i64,
    name: String,
    raw_key: FuzzyKey,
    normalized_key: FuzzyKey,
}

/// Fuzzy matcher over the effect table. Build once, share read-only.
pub struct EffectMatcher {
    effects: Vec<IndexedEffect>,
}

impl EffectMatcher {
    pub fn new(kb: &KnowledgeBase) -> Self {
        let effects: Vec<IndexedEffect> = kb
            .effects()
            .iter()
            .map(|e| IndexedEffect {
                id: e.id,
                name: e.name.clone(),
                raw_key: FuzzyKey::new(&e.name),
                normalized_key: FuzzyKey::new(&e.normalized_name),
            })
            .collect();
        info!("EffectMatcher indexed {} effects", effects.len());
        Self { effects }
    }

    /// Number of indexed effects
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Match OCR text against the effect table.
    ///
    /// `threshold` is the largest normalized edit distance a search accepts.
    /// Each effect id appears at most once (its best-scoring line), and the
    /// result is ordered by line position on the card, not by score.
    pub fn match_effects(&self, raw_text: &str, threshold: f64) -> Vec<MatchCandidate> {
        let lines = candidate_lines(raw_text);
        let mut best: HashMap<i64, MatchCandidate> = HashMap::new();

        for (line_idx, line) in lines.iter().enumerate() {
            let query = FuzzyKey::new(line);
            let Some((effect, dist)) = self.best_match(&query) else {
                continue;
            };
            if dist > threshold {
                continue;
            }
            let score = 1.0 - dist;
            if score < MIN_MATCH_SCORE {
                continue;
            }
            debug!(
                "Line {} {:?} -> effect {} ({:.2})",
                line_idx, line, effect.id, score
            );

            let replace = best.get(&effect.id).map_or(true, |prev| score > prev.score);
            if replace {
                best.insert(
                    effect.id,
                    MatchCandidate {
                        id: effect.id,
                        name: effect.name.clone(),
                        score,
                        source_line_index: line_idx,
                        line: line.clone(),
                    },
                );
            }
        }

        let mut matches: Vec<MatchCandidate> = best.into_values().collect();
        matches.sort_by_key(|m| m.source_line_index);
        matches
    }

    /// Closest effect over both keys; the earlier table entry wins a tie
    fn best_match(&self, query: &FuzzyKey) -> Option<(&IndexedEffect, f64)> {
        let mut best: Option<(&IndexedEffect, f64)> = None;
        for effect in &self.effects {
            let dist = fuzzy::distance(query, &effect.raw_key)
                .min(fuzzy::distance(query, &effect.normalized_key));
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((effect, dist));
            }
        }
        best
    }
}

/// Clean and filter OCR lines, then add each short line joined with its
/// successor. OCR often wraps one effect over two visual lines.
pub fn candidate_lines(raw_text: &str) -> Vec<String> {
    let cleaned: Vec<String> = raw_text
        .lines()
        .map(clean_line)
        .filter(|l| l.chars().count() > MAX_DISCARDED_LINE_LEN)
        .collect();

    let mut lines = Vec::with_capacity(cleaned.len() * 2);
    for (i, line) in cleaned.iter().enumerate() {
        lines.push(line.clone());
        if line.chars().count() < JOIN_BELOW_LEN {
            if let Some(next) = cleaned.get(i + 1) {
                lines.push(format!("{} {}", line, next));
            }
        }
    }
    lines
}
