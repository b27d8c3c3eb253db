use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// Relic color. Every hue on the color wheel maps to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorCategory {
    Red,
    Green,
    Blue,
    Yellow,
}

impl ColorCategory {
    pub const ALL: [ColorCategory; 4] = [
        ColorCategory::Red,
        ColorCategory::Green,
        ColorCategory::Blue,
        ColorCategory::Yellow,
    ];

    /// Scene name printed on generic relics of this color
    pub fn scene(self) -> &'static str {
        match self {
            ColorCategory::Red => "Burning Scene",
            ColorCategory::Green => "Tranquil Scene",
            ColorCategory::Blue => "Drizzly Scene",
            ColorCategory::Yellow => "Luminous Scene",
        }
    }

    /// Case-insensitive parse of "Red" / "green" / ...
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for ColorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColorCategory::Red => "Red",
            ColorCategory::Green => "Green",
            ColorCategory::Blue => "Blue",
            ColorCategory::Yellow => "Yellow",
        };
        f.write_str(s)
    }
}

/// Relic quality, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    Delicate,
    Polished,
    Grand,
}

impl QualityTier {
    pub fn parse(s: &str) -> Option<Self> {
        [QualityTier::Delicate, QualityTier::Polished, QualityTier::Grand]
            .into_iter()
            .find(|q| q.to_string().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QualityTier::Delicate => "Delicate",
            QualityTier::Polished => "Polished",
            QualityTier::Grand => "Grand",
        };
        f.write_str(s)
    }
}

/// A known relic effect with its matchable form precomputed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRecord {
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
}

impl EffectRecord {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        let name = name.into();
        let normalized_name = normalize_name(&name);
        Self {
            id,
            name,
            normalized_name,
        }
    }
}

/// A uniquely named relic. Its name pins down color and deep-night variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelicNameRecord {
    pub name: String,
    pub color: ColorCategory,
    #[serde(rename = "dn")]
    pub is_deep_night: bool,
}

/// Raw effects.json entry
#[derive(Debug, Deserialize)]
struct EffectEntry {
    id: i64,
    name: String,
}

static BRACKET_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]\s*").expect("static regex"));
static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("static regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Matchable form of an effect name: drops `[Class]` prefixes, unifies quote
/// glyphs, spells out `+`, spaces digit runs off from letters, lowercases.
///
/// `"[Wylder] Attack Power +5"` becomes `"attack power plus 5"`.
pub fn normalize_name(name: &str) -> String {
    let stripped = BRACKET_PREFIX.replace_all(name, "");
    let quoted: String = stripped
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' | '`' | '\u{00B4}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' => '"',
            other => other,
        })
        .collect();
    let plus = quoted.replace('+', " plus ");
    let spaced = DIGIT_RUN.replace_all(&plus, " $0 ");
    WHITESPACE
        .replace_all(&spaced, " ")
        .trim()
        .to_lowercase()
}

/// Immutable effect and relic-name tables, built once and shared read-only
/// (typically behind an `Arc`) by every scan.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    effects: Vec<EffectRecord>,
    relic_names: Vec<RelicNameRecord>,
}

impl KnowledgeBase {
    /// Build from in-memory records. Effect names are normalized here, once.
    pub fn from_records<I>(effects: I, relic_names: Vec<RelicNameRecord>) -> Self
    where
        I: IntoIterator<Item = (i64, String)>,
    {
        let effects = effects
            .into_iter()
            .map(|(id, name)| EffectRecord::new(id, name))
            .collect();
        Self {
            effects,
            relic_names,
        }
    }

    /// Load tables from the data directory.
    /// Expects:
    ///   - data_dir/effects.json (`[{"id": 12, "name": "Attack Power +5"}]`)
    ///   - data_dir/relic_names.json (`[{"name": "...", "color": "Red", "dn": false}]`)
    ///
    /// A missing file leaves its table empty.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let effects_path = data_dir.join("effects.json");
        let effects: Vec<EffectEntry> = if effects_path.exists() {
            let content = std::fs::read_to_string(&effects_path)
                .context("Failed to read effects.json")?;
            serde_json::from_str(&content).context("Failed to parse effects.json")?
        } else {
            tracing::warn!(
                "No effects.json found at {}. Effect matching disabled",
                effects_path.display()
            );
            Vec::new()
        };

        let names_path = data_dir.join("relic_names.json");
        let relic_names: Vec<RelicNameRecord> = if names_path.exists() {
            let content = std::fs::read_to_string(&names_path)
                .context("Failed to read relic_names.json")?;
            serde_json::from_str(&content).context("Failed to parse relic_names.json")?
        } else {
            tracing::warn!(
                "No relic_names.json found at {}. Unique-name detection disabled",
                names_path.display()
            );
            Vec::new()
        };

        let kb = Self::from_records(
            effects.into_iter().map(|e| (e.id, e.name)),
            relic_names,
        );
        tracing::info!(
            "Loaded {} effects and {} unique relic names",
            kb.effects.len(),
            kb.relic_names.len()
        );
        Ok(kb)
    }

    pub fn effects(&self) -> &[EffectRecord] {
        &self.effects
    }

    pub fn relic_names(&self) -> &[RelicNameRecord] {
        &self.relic_names
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.relic_names.is_empty()
    }
}
